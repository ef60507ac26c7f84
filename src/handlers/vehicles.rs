use axum::{extract::State, Json};

use crate::entities::vehicle;
use crate::error::AppResult;
use crate::services::vehicle::{self as vehicles, CreateVehicleRequest, UpdateVehicleRequest};
use crate::utils::extract::{AppJson, AppPath};
use crate::utils::response::{created, ok, ApiReply, ApiResponse};
use crate::AppState;

/// Create a vehicle (admin)
pub async fn create_vehicle(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateVehicleRequest>,
) -> AppResult<ApiReply<vehicle::Model>> {
    let vehicle = vehicles::create_vehicle(&state.db, payload).await?;
    Ok(created("Vehicle created successfully", vehicle))
}

/// List all vehicles (public)
pub async fn list_vehicles(
    State(state): State<AppState>,
) -> AppResult<ApiReply<Vec<vehicle::Model>>> {
    let vehicles = vehicles::list_vehicles(&state.db).await?;
    let message = if vehicles.is_empty() {
        "No vehicles found"
    } else {
        "Vehicles retrieved successfully"
    };
    Ok(ok(message, vehicles))
}

/// Get vehicle details (public)
pub async fn get_vehicle(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<ApiReply<vehicle::Model>> {
    let vehicle = vehicles::get_vehicle(&state.db, id).await?;
    Ok(ok("Vehicle retrieved successfully", vehicle))
}

/// Update a vehicle (admin)
pub async fn update_vehicle(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateVehicleRequest>,
) -> AppResult<ApiReply<vehicle::Model>> {
    let vehicle = vehicles::update_vehicle(&state.db, id, payload).await?;
    Ok(ok("Vehicle updated successfully", vehicle))
}

/// Delete a vehicle (admin)
pub async fn delete_vehicle(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<ApiResponse<()>>> {
    vehicles::delete_vehicle(&state.db, id).await?;
    Ok(Json(ApiResponse::message(true, "Vehicle deleted successfully")))
}
