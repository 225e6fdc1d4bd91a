//! API error type and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pacientes_core::DbError;
use serde::Serialize;
use thiserror::Error;

pub const INTERNAL_ERROR: &str = "Error interno del servidor";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{message}")]
    Internal {
        message: String,
        details: Option<String>,
    },
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(details: impl ToString) -> Self {
        Self::Internal {
            message: INTERNAL_ERROR.to_string(),
            details: Some(details.to_string()),
        }
    }

    /// Replace the generic 500 message with `context` and drop the
    /// underlying error text unless `expose_details` is set.
    pub fn with_context(self, context: &str, expose_details: bool) -> Self {
        match self {
            Self::Internal { details, .. } => Self::Internal {
                message: context.to_string(),
                details: details.filter(|_| expose_details),
            },
            other => other,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(msg) => Self::NotFound(msg),
            DbError::Constraint(msg) => Self::Conflict(msg),
            DbError::Validation(msg) | DbError::IdentityMismatch(msg) => Self::BadRequest(msg),
            other => Self::internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }
        let body = match self {
            Self::Internal { message, details } => ErrorResponse {
                error: message,
                details,
            },
            other => ErrorResponse {
                error: other.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_mapping() {
        let e: ApiError = DbError::Constraint("dup".into()).into();
        assert_eq!(e.status(), StatusCode::CONFLICT);

        let e: ApiError = DbError::Validation("blank".into()).into();
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);

        let e: ApiError = DbError::IdentityMismatch("sexo".into()).into();
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);

        let e: ApiError = DbError::NotFound("patient 1".into()).into();
        assert_eq!(e.status(), StatusCode::NOT_FOUND);

        let json = serde_json::from_str::<i64>("x").unwrap_err();
        let e: ApiError = DbError::Json(json).into();
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_context_hides_details_outside_development() {
        let e = ApiError::internal("disk I/O error").with_context("Error al buscar paciente", false);
        match e {
            ApiError::Internal { message, details } => {
                assert_eq!(message, "Error al buscar paciente");
                assert_eq!(details, None);
            }
            other => panic!("unexpected {:?}", other),
        }

        let e = ApiError::internal("disk I/O error").with_context("Error al buscar paciente", true);
        assert!(matches!(e, ApiError::Internal { details: Some(_), .. }));

        let e = ApiError::bad_request("x").with_context("ignored", true);
        assert_eq!(e.to_string(), "x");
    }
}
