use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

use crate::config::{BootstrapAdmin, Config};
use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::utils::jwt::create_token;
use crate::utils::password::{hash_password, validate_password, verify_password};
use crate::utils::validation::{
    max_len, normalize_email, require, MAX_NAME_LEN, MAX_PHONE_LEN,
};

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SigninRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: user::Model,
}

/// Register a new account with the requested role
pub async fn signup(db: &DatabaseConnection, payload: SignupRequest) -> AppResult<user::Model> {
    let name = require("name", payload.name)?;
    let email = require("email", payload.email)?;
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::InvalidInput("password: is required".to_string()))?;
    let phone = require("phone", payload.phone)?;
    let role = require("role", payload.role)?;

    max_len("name", &name, MAX_NAME_LEN)?;
    max_len("phone", &phone, MAX_PHONE_LEN)?;
    validate_password(&password)?;
    let email = normalize_email(&email)?;
    let role = UserRole::parse(&role).ok_or_else(|| {
        AppError::InvalidInput("role: must be either admin or customer".to_string())
    })?;

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Email already in use".to_string()));
    }

    let new_user = user::ActiveModel {
        name: Set(name),
        email: Set(email),
        password: Set(hash_password(&password)?),
        phone: Set(phone),
        role: Set(role),
        ..Default::default()
    };

    let user = new_user.insert(db).await?;
    tracing::info!(user_id = user.id, role = ?user.role, "User signed up");
    Ok(user)
}

/// Login with email and password
pub async fn signin(
    db: &DatabaseConnection,
    config: &Config,
    payload: SigninRequest,
) -> AppResult<AuthResponse> {
    let (email, password) = match (payload.email, payload.password) {
        (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
            (email, password)
        }
        _ => {
            return Err(AppError::InvalidInput(
                "Email and password are required".to_string(),
            ));
        }
    };

    let invalid = || AppError::Unauthenticated("Invalid email or password".to_string());

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&password, &user.password)? {
        return Err(invalid());
    }

    let token = create_token(
        user.id,
        &user.email,
        user.role,
        &config.jwt_secret,
        config.jwt_expiration_hours,
    )?;

    Ok(AuthResponse { token, user })
}

/// Seed the admin account if it doesn't exist
pub async fn seed_admin(db: &DatabaseConnection, admin: &BootstrapAdmin) -> AppResult<()> {
    let email = normalize_email(&admin.email)?;

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    validate_password(&admin.password)?;
    max_len("ADMIN_NAME", &admin.name, MAX_NAME_LEN)?;
    max_len("ADMIN_PHONE", &admin.phone, MAX_PHONE_LEN)?;
    let admin_user = user::ActiveModel {
        name: Set(admin.name.clone()),
        email: Set(email.clone()),
        password: Set(hash_password(&admin.password)?),
        phone: Set(admin.phone.clone()),
        role: Set(UserRole::Admin),
        ..Default::default()
    };

    admin_user.insert(db).await?;
    tracing::info!("Admin account created: {}", email);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::*;
    use crate::utils::jwt::verify_token;

    fn signup_request(email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            name: Some("John Doe".to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            phone: Some("01711111111".to_string()),
            role: Some("customer".to_string()),
        }
    }

    #[tokio::test]
    async fn test_signup_password_length_boundary() {
        let context = TestContext::setup().await;

        let err = signup(context.db(), signup_request("a@x.com", "12345")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let user = signup(context.db(), signup_request("a@x.com", "123456")).await.unwrap();
        assert_eq!("a@x.com", user.email);
        assert_eq!(UserRole::Customer, user.role);
        assert_ne!("123456", user.password);
    }

    #[tokio::test]
    async fn test_signup_duplicate_email_is_case_insensitive() {
        let context = TestContext::setup().await;

        signup(context.db(), signup_request("John@Example.com", "secret1")).await.unwrap();
        let err = signup(context.db(), signup_request("john@EXAMPLE.com", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_signup_requires_every_field() {
        let context = TestContext::setup().await;

        let mut request = signup_request("a@x.com", "secret1");
        request.phone = None;
        match signup(context.db(), request).await {
            Err(AppError::InvalidInput(msg)) => assert!(msg.starts_with("phone")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_signup_rejects_unknown_role_and_bad_email() {
        let context = TestContext::setup().await;

        let mut request = signup_request("a@x.com", "secret1");
        request.role = Some("driver".to_string());
        assert!(matches!(signup(context.db(), request).await, Err(AppError::InvalidInput(_))));

        let request = signup_request("not-an-email", "secret1");
        assert!(matches!(signup(context.db(), request).await, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_signup_rejects_values_wider_than_columns() {
        let context = TestContext::setup().await;

        let mut request = signup_request("a@x.com", "secret1");
        request.phone = Some("0".repeat(21));
        match signup(context.db(), request).await {
            Err(AppError::InvalidInput(msg)) => assert!(msg.starts_with("phone")),
            other => panic!("unexpected {:?}", other),
        }

        let mut request = signup_request("a@x.com", "secret1");
        request.name = Some("n".repeat(251));
        assert!(matches!(signup(context.db(), request).await, Err(AppError::InvalidInput(_))));

        let long_email = format!("{}@example.com", "a".repeat(95));
        let request = signup_request(&long_email, "secret1");
        assert!(matches!(signup(context.db(), request).await, Err(AppError::InvalidInput(_))));

        assert!(user::Entity::find().one(context.db()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_signin_issues_token() {
        let context = TestContext::setup().await;
        let user = context.insert_user("Ann", "ann@x.com", UserRole::Admin).await;

        let response = signin(
            context.db(),
            context.config(),
            SigninRequest {
                email: Some("ANN@x.com".to_string()),
                password: Some(TEST_PASSWORD.to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(user.id, response.user.id);
        let claims = verify_token(&response.token, &context.config().jwt_secret).unwrap();
        assert_eq!(user.id, claims.sub);
        assert_eq!("ann@x.com", claims.email);
        assert_eq!(UserRole::Admin, claims.role);
    }

    #[tokio::test]
    async fn test_signin_bad_credentials() {
        let context = TestContext::setup().await;
        context.insert_user("Ann", "ann@x.com", UserRole::Customer).await;

        for (email, password) in [("ann@x.com", "wrong-password"), ("bob@x.com", TEST_PASSWORD)] {
            let err = signin(
                context.db(),
                context.config(),
                SigninRequest {
                    email: Some(email.to_string()),
                    password: Some(password.to_string()),
                },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, AppError::Unauthenticated(_)));
        }

        let err = signin(
            context.db(),
            context.config(),
            SigninRequest { email: Some("ann@x.com".to_string()), password: None },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_seed_admin_is_idempotent() {
        let context = TestContext::setup().await;
        let admin = BootstrapAdmin {
            name: "Root".to_string(),
            email: "root@x.com".to_string(),
            password: "rootpass".to_string(),
            phone: "0".to_string(),
        };

        seed_admin(context.db(), &admin).await.unwrap();
        seed_admin(context.db(), &admin).await.unwrap();

        let admins = user::Entity::find()
            .filter(user::Column::Role.eq(UserRole::Admin))
            .all(context.db())
            .await
            .unwrap();
        assert_eq!(1, admins.len());
        assert_eq!("root@x.com", admins[0].email);
    }
}
