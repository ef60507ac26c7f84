//! Booking lifecycle.
//!
//! A booking starts `active` and ends either `cancelled` or `returned`. The
//! vehicle's availability flag mirrors whether it has an active booking, so
//! every status change and the flag flip are written in one transaction. The
//! writes are conditional on the state read beforehand, so two racing
//! requests cannot both win.

use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entities::booking::{self, BookingStatus};
use crate::entities::user::{self, UserRole};
use crate::entities::vehicle::{self, AvailabilityStatus, VehicleType};
use crate::error::{AppError, AppResult};
use crate::services::access::Principal;
use crate::utils::validation::parse_calendar_day;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CreateBookingRequest {
    pub customer_id: Option<i32>,
    pub vehicle_id: Option<i32>,
    pub rent_start_date: Option<String>,
    pub rent_end_date: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateBookingRequest {
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VehiclePriceSummary {
    pub vehicle_name: String,
    pub daily_rent_price: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedBooking {
    #[serde(flatten)]
    pub booking: booking::Model,
    pub vehicle: VehiclePriceSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VehicleSummary {
    pub vehicle_name: String,
    pub registration_number: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub vehicle_type: Option<VehicleType>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookingListItem {
    #[serde(flatten)]
    pub booking: booking::Model,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub customer: Option<CustomerSummary>,
    pub vehicle: VehicleSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VehicleAvailability {
    pub availability_status: AvailabilityStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatedBooking {
    #[serde(flatten)]
    pub booking: booking::Model,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vehicle: Option<VehicleAvailability>,
}

/// Whole calendar days between two already-normalized dates.
pub fn rental_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Price snapshot stored with the booking.
pub fn total_price(days: i64, daily_rent_price: i32) -> AppResult<i32> {
    days.checked_mul(i64::from(daily_rent_price))
        .and_then(|total| i32::try_from(total).ok())
        .filter(|total| *total > 0)
        .ok_or_else(|| AppError::InvalidInput("total_price: is out of range".to_string()))
}

/// Checks whether `actor` may move a booking from its current state to `target`.
///
/// `today` is the caller's calendar date, used for the cancellation window.
pub fn check_transition(
    actor: &Principal,
    booking: &booking::Model,
    target: BookingStatus,
    today: NaiveDate,
) -> AppResult<()> {
    if actor.role == UserRole::Customer {
        if target != BookingStatus::Cancelled {
            return Err(AppError::Forbidden(
                "Customers can only cancel bookings".to_string(),
            ));
        }
        if booking.customer_id != actor.id {
            return Err(AppError::Forbidden(
                "Cannot cancel another customer's booking".to_string(),
            ));
        }
        if today >= booking.rent_start_date {
            return Err(AppError::Conflict(
                "Cannot cancel booking on or after start date".to_string(),
            ));
        }
    }

    if target == BookingStatus::Returned && !actor.is_admin() {
        return Err(AppError::Forbidden(
            "Only admin can mark booking as returned".to_string(),
        ));
    }

    if booking.status.is_terminal() {
        return Err(AppError::InvalidTransition(format!(
            "Booking is already {}",
            booking.status.as_str()
        )));
    }

    if target == BookingStatus::Active {
        return Err(AppError::InvalidTransition(
            "Booking is already active".to_string(),
        ));
    }

    Ok(())
}

/// Create a booking and mark its vehicle booked
pub async fn create_booking(
    db: &DatabaseConnection,
    actor: &Principal,
    payload: CreateBookingRequest,
) -> AppResult<CreatedBooking> {
    // Customers always book for themselves.
    let customer_id = match actor.role {
        UserRole::Customer => actor.id,
        UserRole::Admin => payload.customer_id.ok_or_else(|| {
            AppError::InvalidInput("customer_id: admin must specify customer_id".to_string())
        })?,
    };
    let vehicle_id = payload
        .vehicle_id
        .ok_or_else(|| AppError::InvalidInput("vehicle_id: is required".to_string()))?;
    let start = payload
        .rent_start_date
        .ok_or_else(|| AppError::InvalidInput("rent_start_date: is required".to_string()))?;
    let end = payload
        .rent_end_date
        .ok_or_else(|| AppError::InvalidInput("rent_end_date: is required".to_string()))?;

    user::Entity::find_by_id(customer_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

    let vehicle = vehicle::Entity::find_by_id(vehicle_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    let start = parse_calendar_day("rent_start_date", &start)?;
    let end = parse_calendar_day("rent_end_date", &end)?;
    if end <= start {
        return Err(AppError::InvalidInput(
            "rent_end_date: End date must be after start date".to_string(),
        ));
    }

    if vehicle.availability_status != AvailabilityStatus::Available {
        return Err(AppError::Conflict(
            "Vehicle is not available for booking".to_string(),
        ));
    }

    let days = rental_days(start, end);
    let total = total_price(days, vehicle.daily_rent_price)?;

    let txn = db.begin().await?;

    let claimed = vehicle::Entity::update_many()
        .col_expr(
            vehicle::Column::AvailabilityStatus,
            Expr::value(AvailabilityStatus::Booked),
        )
        .filter(vehicle::Column::Id.eq(vehicle.id))
        .filter(vehicle::Column::AvailabilityStatus.eq(AvailabilityStatus::Available))
        .exec(&txn)
        .await?;

    if claimed.rows_affected == 0 {
        txn.rollback().await?;
        return Err(AppError::Conflict(
            "Vehicle is not available for booking".to_string(),
        ));
    }

    let booking = booking::ActiveModel {
        customer_id: Set(customer_id),
        vehicle_id: Set(vehicle.id),
        rent_start_date: Set(start),
        rent_end_date: Set(end),
        total_price: Set(total),
        status: Set(BookingStatus::Active),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(
        booking_id = booking.id,
        customer_id,
        vehicle_id = vehicle.id,
        days,
        total_price = total,
        "Booking created"
    );

    Ok(CreatedBooking {
        booking,
        vehicle: VehiclePriceSummary {
            vehicle_name: vehicle.vehicle_name,
            daily_rent_price: vehicle.daily_rent_price,
        },
    })
}

/// Admins see every booking; customers see their own. Newest first.
pub async fn list_bookings(
    db: &DatabaseConnection,
    actor: &Principal,
) -> AppResult<Vec<BookingListItem>> {
    let mut query = booking::Entity::find().order_by_desc(booking::Column::Id);
    if !actor.is_admin() {
        query = query.filter(booking::Column::CustomerId.eq(actor.id));
    }
    let bookings = query.all(db).await?;

    let vehicle_ids: Vec<i32> = bookings.iter().map(|b| b.vehicle_id).collect();
    let vehicles: HashMap<i32, vehicle::Model> = vehicle::Entity::find()
        .filter(vehicle::Column::Id.is_in(vehicle_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();

    let customers: HashMap<i32, user::Model> = if actor.is_admin() {
        let customer_ids: Vec<i32> = bookings.iter().map(|b| b.customer_id).collect();
        user::Entity::find()
            .filter(user::Column::Id.is_in(customer_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect()
    } else {
        HashMap::new()
    };

    let items = bookings
        .into_iter()
        .filter_map(|b| {
            let vehicle = vehicles.get(&b.vehicle_id)?;
            let customer = if actor.is_admin() {
                let c = customers.get(&b.customer_id)?;
                Some(CustomerSummary {
                    name: c.name.clone(),
                    email: c.email.clone(),
                })
            } else {
                None
            };

            Some(BookingListItem {
                booking: b,
                customer,
                vehicle: VehicleSummary {
                    vehicle_name: vehicle.vehicle_name.clone(),
                    registration_number: vehicle.registration_number.clone(),
                    vehicle_type: (!actor.is_admin()).then_some(vehicle.vehicle_type),
                },
            })
        })
        .collect();

    Ok(items)
}

/// Move a booking to `cancelled` or `returned` and release its vehicle
pub async fn update_booking_status(
    db: &DatabaseConnection,
    actor: &Principal,
    booking_id: i32,
    payload: UpdateBookingRequest,
    today: NaiveDate,
) -> AppResult<UpdatedBooking> {
    let raw = payload
        .status
        .ok_or_else(|| AppError::InvalidInput("status: Status field is required".to_string()))?;
    let target = BookingStatus::parse(&raw).ok_or_else(|| {
        AppError::InvalidInput("status: must be active, cancelled, or returned".to_string())
    })?;

    let booking = booking::Entity::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    check_transition(actor, &booking, target, today)?;

    let txn = db.begin().await?;

    let moved = booking::Entity::update_many()
        .col_expr(booking::Column::Status, Expr::value(target))
        .filter(booking::Column::Id.eq(booking.id))
        .filter(booking::Column::Status.eq(BookingStatus::Active))
        .exec(&txn)
        .await?;

    if moved.rows_affected == 0 {
        txn.rollback().await?;
        return Err(AppError::InvalidTransition(
            "Booking is no longer active".to_string(),
        ));
    }

    vehicle::Entity::update_many()
        .col_expr(
            vehicle::Column::AvailabilityStatus,
            Expr::value(AvailabilityStatus::Available),
        )
        .filter(vehicle::Column::Id.eq(booking.vehicle_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        booking_id = booking.id,
        vehicle_id = booking.vehicle_id,
        actor_id = actor.id,
        status = target.as_str(),
        "Booking status changed"
    );

    let updated = booking::Entity::find_by_id(booking.id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let vehicle = if target == BookingStatus::Returned {
        vehicle::Entity::find_by_id(booking.vehicle_id)
            .one(db)
            .await?
            .map(|v| VehicleAvailability {
                availability_status: v.availability_status,
            })
    } else {
        None
    };

    Ok(UpdatedBooking {
        booking: updated,
        vehicle,
    })
}
