use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};

use crate::handlers::{auth, bookings, health, users, vehicles};
use crate::middleware::auth::{auth_middleware, require_admin};
use crate::utils::response::ApiResponse;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Public routes
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin));

    let public_vehicle_routes = Router::new()
        .route("/", get(vehicles::list_vehicles))
        .route("/{id}", get(vehicles::get_vehicle));

    // Admin routes (requires auth + admin role)
    let admin_vehicle_routes = Router::new()
        .route("/", post(vehicles::create_vehicle))
        .route("/{id}", put(vehicles::update_vehicle))
        .route("/{id}", delete(vehicles::delete_vehicle))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_user_routes = Router::new()
        .route("/", get(users::list_users))
        .route("/{id}", delete(users::delete_user))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Authenticated routes (admin or customer; ownership checked per handler)
    let self_user_routes = Router::new()
        .route("/{id}", put(users::update_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let booking_routes = Router::new()
        .route("/", post(bookings::create_booking))
        .route("/", get(bookings::list_bookings))
        .route("/{id}", put(bookings::update_booking))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", admin_user_routes.merge(self_user_routes))
        .nest("/vehicles", public_vehicle_routes.merge(admin_vehicle_routes))
        .nest("/bookings", booking_routes);

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1", api)
        .fallback(route_not_found)
        .with_state(state)
}

async fn route_not_found() -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::message(false, "Route not found")),
    )
}
