use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::entities::user::UserRole;
use crate::error::{AppError, AppResult};
use crate::services::access::{authenticate, authorize, Principal};
use crate::AppState;

/// Verify the bearer token, refresh the role from storage and attach the `Principal`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let bearer = request.headers().typed_get::<Authorization<Bearer>>();
    let claimed = authenticate(
        bearer.as_ref().map(|auth| auth.token()),
        &state.config.jwt_secret,
    )?;

    let principal = authorize(
        &state.db,
        &claimed,
        &[UserRole::Admin, UserRole::Customer],
        None,
    )
    .await?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Require admin role
pub async fn require_admin(request: Request, next: Next) -> AppResult<Response> {
    let principal = request
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| AppError::Unauthenticated("No authentication found".to_string()))?;

    if !principal.is_admin() {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    Ok(next.run(request).await)
}
