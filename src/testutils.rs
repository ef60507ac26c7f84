//! Test utilities shared by the service and HTTP tests.

use axum::Router;
use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, Set};
use sea_orm_migration::MigratorTrait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower::ServiceExt;

use crate::config::Config;
use crate::entities::booking::{self, BookingStatus};
use crate::entities::user::{self, UserRole};
use crate::entities::vehicle::{self, AvailabilityStatus, VehicleType};
use crate::routes::create_router;
use crate::services::access::Principal;
use crate::utils::jwt::create_token;
use crate::utils::password::hash_password;
use crate::utils::response::ApiResponse;
use crate::AppState;

pub(crate) const TEST_PASSWORD: &str = "password123";

const MAX_BODY_SIZE: usize = 64 * 1024;

pub(crate) fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn principal(user: &user::Model) -> Principal {
    Principal { id: user.id, role: user.role }
}

pub(crate) struct TestContext {
    state: AppState,
}

impl TestContext {
    pub(crate) async fn setup() -> Self {
        // A single connection keeps every query on the same in-memory database.
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();

        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 1,
            jwt_secret: "test-secret".to_string(),
            jwt_expiration_hours: 168,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            request_timeout_secs: 5,
            bootstrap_admin: None,
        };

        Self { state: AppState { db, config } }
    }

    pub(crate) fn db(&self) -> &DatabaseConnection {
        &self.state.db
    }

    pub(crate) fn config(&self) -> &Config {
        &self.state.config
    }

    pub(crate) fn app(&self) -> Router {
        create_router(self.state.clone())
    }

    pub(crate) fn token_for(&self, user: &user::Model) -> String {
        create_token(
            user.id,
            &user.email,
            user.role,
            &self.state.config.jwt_secret,
            self.state.config.jwt_expiration_hours,
        )
        .unwrap()
    }

    pub(crate) async fn insert_user(&self, name: &str, email: &str, role: UserRole) -> user::Model {
        user::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.to_lowercase()),
            password: Set(hash_password(TEST_PASSWORD).unwrap()),
            phone: Set("01700000000".to_string()),
            role: Set(role),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .unwrap()
    }

    pub(crate) async fn insert_vehicle(&self, registration: &str, daily_rent_price: i32) -> vehicle::Model {
        vehicle::ActiveModel {
            vehicle_name: Set(format!("Vehicle {}", registration)),
            vehicle_type: Set(VehicleType::Car),
            registration_number: Set(registration.to_string()),
            daily_rent_price: Set(daily_rent_price),
            availability_status: Set(AvailabilityStatus::Available),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .unwrap()
    }

    /// Inserts an active booking and marks the vehicle booked, bypassing the service rules.
    pub(crate) async fn insert_active_booking(
        &self,
        customer: &user::Model,
        vehicle: &vehicle::Model,
        start: NaiveDate,
        end: NaiveDate,
    ) -> booking::Model {
        let booking = booking::ActiveModel {
            customer_id: Set(customer.id),
            vehicle_id: Set(vehicle.id),
            rent_start_date: Set(start),
            rent_end_date: Set(end),
            total_price: Set(((end - start).num_days() as i32) * vehicle.daily_rent_price),
            status: Set(BookingStatus::Active),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .unwrap();

        let mut active: vehicle::ActiveModel = self.vehicle(vehicle.id).await.into();
        active.availability_status = Set(AvailabilityStatus::Booked);
        active.update(self.db()).await.unwrap();

        booking
    }

    pub(crate) async fn vehicle(&self, id: i32) -> vehicle::Model {
        vehicle::Entity::find_by_id(id).one(self.db()).await.unwrap().unwrap()
    }

    pub(crate) async fn booking(&self, id: i32) -> booking::Model {
        booking::Entity::find_by_id(id).one(self.db()).await.unwrap().unwrap()
    }

    pub(crate) async fn user(&self, id: i32) -> Option<user::Model> {
        user::Entity::find_by_id(id).one(self.db()).await.unwrap()
    }

    /// Asserts the vehicle's flag matches the number of active bookings on it.
    pub(crate) async fn assert_availability_consistent(&self, vehicle_id: i32) {
        use sea_orm::{ColumnTrait, PaginatorTrait, QueryFilter};

        let active = booking::Entity::find()
            .filter(booking::Column::VehicleId.eq(vehicle_id))
            .filter(booking::Column::Status.eq(BookingStatus::Active))
            .count(self.db())
            .await
            .unwrap();
        let expected = if active == 1 {
            AvailabilityStatus::Booked
        } else {
            assert_eq!(0, active, "more than one active booking on vehicle {}", vehicle_id);
            AvailabilityStatus::Available
        };
        assert_eq!(expected, self.vehicle(vehicle_id).await.availability_status);
    }
}

/// Builder for a single request against the app router.
#[must_use]
pub(crate) struct OneShot {
    app: Router,
    builder: http::request::Builder,
}

impl OneShot {
    pub(crate) fn new<U: AsRef<str>>(app: Router, method: http::Method, uri: U) -> Self {
        let builder = Request::builder().method(method).uri(uri.as_ref());
        Self { app, builder }
    }

    pub(crate) fn with_bearer(mut self, token: &str) -> Self {
        self.builder = self
            .builder
            .header(http::header::AUTHORIZATION, format!("Bearer {}", token));
        self
    }

    pub(crate) async fn send_empty(self) -> Reply {
        let request = self.builder.body(Body::empty()).unwrap();
        Reply::read(self.app.oneshot(request).await.unwrap()).await
    }

    pub(crate) async fn send_json<T: Serialize>(self, body: T) -> Reply {
        let request = self
            .builder
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        Reply::read(self.app.oneshot(request).await.unwrap()).await
    }
}

/// Status and decoded JSON body of a response.
pub(crate) struct Reply {
    pub(crate) status: StatusCode,
    pub(crate) body: serde_json::Value,
}

impl Reply {
    async fn read(response: http::Response<Body>) -> Self {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), MAX_BODY_SIZE).await.unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        Self { status, body }
    }

    pub(crate) fn expect_status(self, status: StatusCode) -> Self {
        assert_eq!(status, self.status, "unexpected status; body: {}", self.body);
        self
    }

    pub(crate) fn envelope<T: DeserializeOwned>(self) -> ApiResponse<T> {
        serde_json::from_value(self.body).unwrap()
    }

    pub(crate) fn data<T: DeserializeOwned>(self) -> T {
        self.envelope::<T>().data.unwrap()
    }
}
