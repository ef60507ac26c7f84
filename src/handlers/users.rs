use axum::{extract::State, Extension, Json};

use crate::entities::user::{self, UserRole};
use crate::error::AppResult;
use crate::services::access::{check_access, Principal};
use crate::services::user::{self as users, UpdateUserRequest};
use crate::utils::extract::{AppJson, AppPath};
use crate::utils::response::{ok, ApiReply, ApiResponse};
use crate::AppState;

/// List all users (admin)
pub async fn list_users(State(state): State<AppState>) -> AppResult<ApiReply<Vec<user::Model>>> {
    let users = users::list_users(&state.db).await?;
    Ok(ok("Users retrieved successfully", users))
}

/// Update a user (admin, or the user themselves)
pub async fn update_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> AppResult<ApiReply<user::Model>> {
    check_access(&principal, &[UserRole::Customer], Some(id))?;
    let user = users::update_user(&state.db, &principal, id, payload).await?;
    Ok(ok("User updated successfully", user))
}

/// Delete a user (admin)
pub async fn delete_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<ApiResponse<()>>> {
    users::delete_user(&state.db, id).await?;
    Ok(Json(ApiResponse::message(true, "User deleted successfully")))
}
