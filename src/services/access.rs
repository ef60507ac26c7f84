use sea_orm::{ConnectionTrait, EntityTrait};
use serde::{Deserialize, Serialize};

use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::utils::jwt::verify_token;

/// Identity attached to an authenticated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: i32,
    pub role: UserRole,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Verifies a bearer token and returns the identity it was issued for.
pub fn authenticate(token: Option<&str>, secret: &str) -> AppResult<Principal> {
    let token = token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthenticated("You have no access token".to_string()))?;
    let claims = verify_token(token, secret)?;
    Ok(Principal {
        id: claims.sub,
        role: claims.role,
    })
}

/// Re-reads the principal's role from storage, then applies `check_access`.
///
/// Roles can change after a token is issued, so the stored role wins over the
/// one embedded in the token.
pub async fn authorize<C: ConnectionTrait>(
    db: &C,
    principal: &Principal,
    allowed: &[UserRole],
    owner_id: Option<i32>,
) -> AppResult<Principal> {
    let stored = user::Entity::find_by_id(principal.id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let current = Principal {
        id: stored.id,
        role: stored.role,
    };
    check_access(&current, allowed, owner_id)?;
    Ok(current)
}

/// Admin always passes. Anyone else needs an allowed role and, when `owner_id`
/// is given, must be that owner.
pub fn check_access(
    principal: &Principal,
    allowed: &[UserRole],
    owner_id: Option<i32>,
) -> AppResult<()> {
    if principal.is_admin() {
        return Ok(());
    }

    if !allowed.contains(&principal.role) {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    match owner_id {
        Some(owner) if owner != principal.id => Err(AppError::Forbidden(
            "You can only access your own resources".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::TestContext;
    use crate::utils::jwt::create_token;

    const SECRET: &str = "access-secret";

    #[test]
    fn test_authenticate_missing_token() {
        assert!(matches!(authenticate(None, SECRET), Err(AppError::Unauthenticated(_))));
        assert!(matches!(authenticate(Some(""), SECRET), Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn test_authenticate_valid_token() {
        let token = create_token(7, "c@x.com", UserRole::Customer, SECRET, 1).unwrap();
        let principal = authenticate(Some(&token), SECRET).unwrap();
        assert_eq!(Principal { id: 7, role: UserRole::Customer }, principal);
    }

    #[test]
    fn test_check_access() {
        let admin = Principal { id: 1, role: UserRole::Admin };
        let customer = Principal { id: 2, role: UserRole::Customer };

        assert!(check_access(&admin, &[], Some(99)).is_ok());
        assert!(check_access(&customer, &[UserRole::Customer], None).is_ok());
        assert!(check_access(&customer, &[UserRole::Customer], Some(2)).is_ok());
        assert!(matches!(
            check_access(&customer, &[UserRole::Customer], Some(3)),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            check_access(&customer, &[UserRole::Admin], None),
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_authorize_uses_stored_role() {
        let context = TestContext::setup().await;
        let user = context.insert_user("Ann", "ann@x.com", UserRole::Customer).await;

        // The token claims admin but storage says customer.
        let stale = Principal { id: user.id, role: UserRole::Admin };
        let err = authorize(context.db(), &stale, &[UserRole::Customer], Some(user.id + 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let current = authorize(context.db(), &stale, &[UserRole::Customer], None)
            .await
            .unwrap();
        assert_eq!(UserRole::Customer, current.role);
    }

    #[tokio::test]
    async fn test_authorize_deleted_user() {
        let context = TestContext::setup().await;
        let ghost = Principal { id: 404, role: UserRole::Admin };
        let err = authorize(context.db(), &ghost, &[UserRole::Admin], None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
