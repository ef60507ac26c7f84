use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

/// Uniform JSON envelope returned by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
        }
    }

    pub fn failure(message: impl Into<String>, errors: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors: Some(errors.into()),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            message: message.into(),
            data: None,
            errors: None,
        }
    }
}

pub type ApiReply<T> = (StatusCode, Json<ApiResponse<T>>);

pub fn ok<T>(message: impl Into<String>, data: T) -> ApiReply<T> {
    (StatusCode::OK, Json(ApiResponse::success(message, data)))
}

pub fn created<T>(message: impl Into<String>, data: T) -> ApiReply<T> {
    (StatusCode::CREATED, Json(ApiResponse::success(message, data)))
}
