use axum::extract::State;

use crate::entities::user;
use crate::error::AppResult;
use crate::services::auth::{self, AuthResponse, SigninRequest, SignupRequest};
use crate::utils::extract::AppJson;
use crate::utils::response::{created, ok, ApiReply};
use crate::AppState;

/// Register a new account
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> AppResult<ApiReply<user::Model>> {
    let user = auth::signup(&state.db, payload).await?;
    Ok(created("User registered successfully", user))
}

/// Login with email and password
pub async fn signin(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SigninRequest>,
) -> AppResult<ApiReply<AuthResponse>> {
    let response = auth::signin(&state.db, &state.config, payload).await?;
    Ok(ok("Login successful", response))
}
