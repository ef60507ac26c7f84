use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entities::booking::{self, BookingStatus};
use crate::entities::vehicle::{self, AvailabilityStatus, VehicleType};
use crate::error::{AppError, AppResult};
use crate::utils::validation::{
    max_len, non_blank, require, MAX_NAME_LEN, MAX_REGISTRATION_LEN,
};

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CreateVehicleRequest {
    pub vehicle_name: Option<String>,
    #[serde(rename = "type")]
    pub vehicle_type: Option<String>,
    pub registration_number: Option<String>,
    pub daily_rent_price: Option<i64>,
    pub availability_status: Option<String>,
}

/// Fields a vehicle update may carry; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateVehicleRequest {
    pub vehicle_name: Option<String>,
    #[serde(rename = "type")]
    pub vehicle_type: Option<String>,
    pub registration_number: Option<String>,
    pub daily_rent_price: Option<i64>,
    pub availability_status: Option<String>,
}

fn parse_type(raw: &str) -> AppResult<VehicleType> {
    VehicleType::parse(raw).ok_or_else(|| {
        AppError::InvalidInput("type: must be car, bike, van, or SUV".to_string())
    })
}

fn parse_availability(raw: &str) -> AppResult<AvailabilityStatus> {
    AvailabilityStatus::parse(raw).ok_or_else(|| {
        AppError::InvalidInput(
            "availability_status: must be available or booked".to_string(),
        )
    })
}

fn check_widths(vehicle_name: Option<&str>, registration_number: Option<&str>) -> AppResult<()> {
    if let Some(vehicle_name) = vehicle_name {
        max_len("vehicle_name", vehicle_name, MAX_NAME_LEN)?;
    }
    if let Some(registration_number) = registration_number {
        max_len("registration_number", registration_number, MAX_REGISTRATION_LEN)?;
    }
    Ok(())
}

fn parse_price(price: i64) -> AppResult<i32> {
    if price <= 0 {
        return Err(AppError::InvalidInput(
            "daily_rent_price: must be greater than 0".to_string(),
        ));
    }
    i32::try_from(price)
        .map_err(|_| AppError::InvalidInput("daily_rent_price: is too large".to_string()))
}

async fn registration_taken<C: ConnectionTrait>(
    db: &C,
    registration_number: &str,
    exclude_id: Option<i32>,
) -> AppResult<bool> {
    let mut query = vehicle::Entity::find()
        .filter(vehicle::Column::RegistrationNumber.eq(registration_number));
    if let Some(id) = exclude_id {
        query = query.filter(vehicle::Column::Id.ne(id));
    }
    Ok(query.one(db).await?.is_some())
}

pub(crate) async fn count_active_bookings<C: ConnectionTrait>(
    db: &C,
    vehicle_id: i32,
) -> AppResult<u64> {
    Ok(booking::Entity::find()
        .filter(booking::Column::VehicleId.eq(vehicle_id))
        .filter(booking::Column::Status.eq(BookingStatus::Active))
        .count(db)
        .await?)
}

/// Create a new vehicle (admin)
pub async fn create_vehicle(
    db: &DatabaseConnection,
    payload: CreateVehicleRequest,
) -> AppResult<vehicle::Model> {
    let vehicle_name = require("vehicle_name", payload.vehicle_name)?;
    let vehicle_type = parse_type(&require("type", payload.vehicle_type)?)?;
    let registration_number = require("registration_number", payload.registration_number)?;
    check_widths(Some(&vehicle_name), Some(&registration_number))?;
    let daily_rent_price = parse_price(payload.daily_rent_price.ok_or_else(|| {
        AppError::InvalidInput("daily_rent_price: is required".to_string())
    })?)?;
    let availability_status = match payload.availability_status.as_deref() {
        Some(raw) => parse_availability(raw)?,
        None => AvailabilityStatus::Available,
    };

    // A new vehicle has no bookings, so it cannot start out booked.
    if availability_status != AvailabilityStatus::Available {
        return Err(AppError::InvalidInput(
            "availability_status: a new vehicle must be available".to_string(),
        ));
    }

    if registration_taken(db, &registration_number, None).await? {
        return Err(AppError::Conflict(
            "Registration number already exists".to_string(),
        ));
    }

    let vehicle = vehicle::ActiveModel {
        vehicle_name: Set(vehicle_name),
        vehicle_type: Set(vehicle_type),
        registration_number: Set(registration_number),
        daily_rent_price: Set(daily_rent_price),
        availability_status: Set(availability_status),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(vehicle_id = vehicle.id, "Vehicle created");
    Ok(vehicle)
}

pub async fn list_vehicles(db: &DatabaseConnection) -> AppResult<Vec<vehicle::Model>> {
    Ok(vehicle::Entity::find()
        .order_by_asc(vehicle::Column::Id)
        .all(db)
        .await?)
}

pub async fn get_vehicle(db: &DatabaseConnection, id: i32) -> AppResult<vehicle::Model> {
    vehicle::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))
}

/// Update a vehicle (admin)
///
/// The availability flag may only be set to the value its active bookings
/// already imply. It is validated but never written here; booking
/// transitions are what move it.
pub async fn update_vehicle(
    db: &DatabaseConnection,
    id: i32,
    payload: UpdateVehicleRequest,
) -> AppResult<vehicle::Model> {
    let vehicle = get_vehicle(db, id).await?;

    let vehicle_name = non_blank("vehicle_name", payload.vehicle_name)?;
    let registration_number = non_blank("registration_number", payload.registration_number)?;
    check_widths(vehicle_name.as_deref(), registration_number.as_deref())?;
    let vehicle_type = match payload.vehicle_type.as_deref() {
        Some(raw) => Some(parse_type(raw)?),
        None => None,
    };
    let daily_rent_price = match payload.daily_rent_price {
        Some(price) => Some(parse_price(price)?),
        None => None,
    };
    let availability_status = match payload.availability_status.as_deref() {
        Some(raw) => Some(parse_availability(raw)?),
        None => None,
    };

    if let Some(registration_number) = &registration_number {
        if registration_taken(db, registration_number, Some(id)).await? {
            return Err(AppError::Conflict(
                "Registration number already exists".to_string(),
            ));
        }
    }

    if let Some(status) = availability_status {
        let implied = if count_active_bookings(db, id).await? > 0 {
            AvailabilityStatus::Booked
        } else {
            AvailabilityStatus::Available
        };
        if status != implied {
            return Err(AppError::Conflict(
                "availability_status must match the vehicle's active bookings".to_string(),
            ));
        }
    }

    let mut active: vehicle::ActiveModel = vehicle.into();
    if let Some(vehicle_name) = vehicle_name {
        active.vehicle_name = Set(vehicle_name);
    }
    if let Some(vehicle_type) = vehicle_type {
        active.vehicle_type = Set(vehicle_type);
    }
    if let Some(registration_number) = registration_number {
        active.registration_number = Set(registration_number);
    }
    if let Some(daily_rent_price) = daily_rent_price {
        active.daily_rent_price = Set(daily_rent_price);
    }

    if !active.is_changed() {
        return get_vehicle(db, id).await;
    }

    Ok(active.update(db).await?)
}

/// Delete a vehicle (admin)
///
/// The row is locked before the active-booking check, so a booking that
/// commits first is seen and one that starts later waits on the lock.
pub async fn delete_vehicle(db: &DatabaseConnection, id: i32) -> AppResult<()> {
    let txn = db.begin().await?;

    let vehicle = vehicle::Entity::find_by_id(id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    if count_active_bookings(&txn, vehicle.id).await? > 0 {
        txn.rollback().await?;
        return Err(AppError::Conflict(
            "Cannot delete vehicle with active bookings".to_string(),
        ));
    }

    vehicle::Entity::delete_by_id(vehicle.id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(vehicle_id = vehicle.id, "Vehicle deleted");
    Ok(())
}
