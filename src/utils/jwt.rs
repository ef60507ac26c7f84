use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::entities::user::UserRole;
use crate::error::{AppError, AppResult};

/// Token payload. `sub` is the user id; `exp` and `iat` are Unix seconds.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i32,
    pub email: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

pub fn create_token(
    user_id: i32,
    email: &str,
    role: UserRole,
    secret: &str,
    expiration_hours: i64,
) -> AppResult<String> {
    let now = Utc::now();
    let exp = now + Duration::hours(expiration_hours);

    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
}

/// Checks signature and expiry; any failure is reported as `Unauthenticated`.
pub fn verify_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthenticated(format!("Invalid token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_carries_identity() {
        let token = create_token(42, "a@b.com", UserRole::Customer, SECRET, 168).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(42, claims.sub);
        assert_eq!("a@b.com", claims.email);
        assert_eq!(UserRole::Customer, claims.role);
        assert_eq!(168 * 3600, claims.exp - claims.iat);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = create_token(1, "a@b.com", UserRole::Admin, SECRET, -2).unwrap();
        let err = verify_token(&token, SECRET).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = create_token(1, "a@b.com", UserRole::Admin, SECRET, 1).unwrap();
        let err = verify_token(&token, "other-secret").unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = verify_token("not.a.token", SECRET).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }
}
