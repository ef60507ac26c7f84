use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entities::booking::{self, BookingStatus};
use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::services::access::Principal;
use crate::utils::password::{hash_password, validate_password};
use crate::utils::validation::{
    max_len, non_blank, normalize_email, MAX_NAME_LEN, MAX_PHONE_LEN,
};

/// Fields a user update may carry; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
}

impl UpdateUserRequest {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.phone.is_none()
            && self.role.is_none()
    }
}

pub async fn list_users(db: &DatabaseConnection) -> AppResult<Vec<user::Model>> {
    Ok(user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?)
}

pub async fn get_user(db: &DatabaseConnection, id: i32) -> AppResult<user::Model> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Apply a partial update. Only an admin may change a role.
pub async fn update_user(
    db: &DatabaseConnection,
    actor: &Principal,
    id: i32,
    payload: UpdateUserRequest,
) -> AppResult<user::Model> {
    if payload.is_empty() {
        return Err(AppError::InvalidInput("No fields to update".to_string()));
    }

    let role = match payload.role.as_deref() {
        Some(raw) => Some(UserRole::parse(raw).ok_or_else(|| {
            AppError::InvalidInput("role: must be either admin or customer".to_string())
        })?),
        None => None,
    };

    let user = get_user(db, id).await?;

    if let Some(role) = role {
        if !actor.is_admin() && role != user.role {
            return Err(AppError::Forbidden(
                "Customers cannot change their own role".to_string(),
            ));
        }
    }

    let name = non_blank("name", payload.name)?;
    let phone = non_blank("phone", payload.phone)?;
    if let Some(name) = &name {
        max_len("name", name, MAX_NAME_LEN)?;
    }
    if let Some(phone) = &phone {
        max_len("phone", phone, MAX_PHONE_LEN)?;
    }
    let email = match payload.email {
        Some(raw) => Some(normalize_email(&raw)?),
        None => None,
    };
    let password = match payload.password {
        Some(raw) => {
            validate_password(&raw)?;
            Some(hash_password(&raw)?)
        }
        None => None,
    };

    if let Some(email) = &email {
        let taken = user::Entity::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .filter(user::Column::Id.ne(id))
            .one(db)
            .await?;
        if taken.is_some() {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }
    }

    let mut active: user::ActiveModel = user.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(email) = email {
        active.email = Set(email);
    }
    if let Some(password) = password {
        active.password = Set(password);
    }
    if let Some(phone) = phone {
        active.phone = Set(phone);
    }
    if let Some(role) = role {
        active.role = Set(role);
    }

    Ok(active.update(db).await?)
}

/// Delete a user who holds no active booking; past bookings go with the user.
///
/// The user row is locked first. A booking insert holds a key-share lock on it
/// for its foreign key, so the check below sees every committed booking and a
/// later insert fails its foreign key instead of being cascaded away.
pub async fn delete_user(db: &DatabaseConnection, id: i32) -> AppResult<()> {
    let txn = db.begin().await?;

    let user = user::Entity::find_by_id(id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let active_bookings = booking::Entity::find()
        .filter(booking::Column::CustomerId.eq(user.id))
        .filter(booking::Column::Status.eq(BookingStatus::Active))
        .count(&txn)
        .await?;

    if active_bookings > 0 {
        txn.rollback().await?;
        return Err(AppError::Conflict(
            "Cannot delete user with active bookings".to_string(),
        ));
    }

    user::Entity::delete_by_id(user.id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(user_id = user.id, "User deleted");
    Ok(())
}
