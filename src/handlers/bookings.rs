use axum::{extract::State, Extension};
use chrono::Utc;

use crate::entities::booking::BookingStatus;
use crate::error::AppResult;
use crate::services::access::Principal;
use crate::services::booking::{
    self as bookings, BookingListItem, CreateBookingRequest, CreatedBooking, UpdateBookingRequest,
    UpdatedBooking,
};
use crate::utils::extract::{AppJson, AppPath};
use crate::utils::response::{created, ok, ApiReply};
use crate::AppState;

/// Create a booking
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    AppJson(payload): AppJson<CreateBookingRequest>,
) -> AppResult<ApiReply<CreatedBooking>> {
    let booking = bookings::create_booking(&state.db, &principal, payload).await?;
    Ok(created("Booking created successfully", booking))
}

/// List bookings visible to the caller
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<ApiReply<Vec<BookingListItem>>> {
    let items = bookings::list_bookings(&state.db, &principal).await?;
    let message = if principal.is_admin() {
        "Bookings retrieved successfully"
    } else {
        "Your bookings retrieved successfully"
    };
    Ok(ok(message, items))
}

/// Cancel or return a booking
pub async fn update_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateBookingRequest>,
) -> AppResult<ApiReply<UpdatedBooking>> {
    let today = Utc::now().date_naive();
    let updated = bookings::update_booking_status(&state.db, &principal, id, payload, today).await?;

    let message = match updated.booking.status {
        BookingStatus::Cancelled => "Booking cancelled successfully",
        BookingStatus::Returned => "Booking marked as returned. Vehicle is now available",
        BookingStatus::Active => "Booking updated successfully",
    };
    Ok(ok(message, updated))
}
