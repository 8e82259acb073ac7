use api_shared::AuthError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use medrec_core::PatientError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error body returned by every failing API call.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

/// An error on its way to becoming an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal error".into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<PatientError> for ApiError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::InvalidInput(_) => Self::bad_request(err.to_string()),
            PatientError::NotFound(_) => Self {
                status: StatusCode::NOT_FOUND,
                message: err.to_string(),
            },
            PatientError::StorageUnavailable(e) => {
                tracing::error!("Storage error: {:?}", e);
                Self::internal()
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorRes {
                error: self.message,
            }),
        )
            .into_response()
    }
}
