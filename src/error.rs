/*
 * Responsibility
 * - Application-wide AppError
 * - IntoResponse (HTTP status + `{ success: false, code, message }` body, Retry-After on 429)
 * - Funnel repo / codec / gate / upload errors into one place
 */
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::middleware::auth::{AuthRejection, GateError};
use crate::repos::error::RepoError;
use crate::services::id_codec::IdCodecError;
use crate::services::upload::UploadError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error(transparent)]
    Auth(#[from] AuthRejection),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("service unavailable")]
    ServiceUnavailable,
    #[error("request timed out")]
    RequestTimeout,
    #[error("rate limited, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: &'static str) -> Self {
        Self::bad_request("VALIDATION_ERROR", message)
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn forbidden() -> Self {
        Self::Auth(AuthRejection::Forbidden)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Auth(r) => r.status(),
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retry_after = match &self {
            AppError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };
        let (code, message) = match self {
            AppError::BadRequest { code, message } => (code, message),
            AppError::Auth(r) => (r.code(), r.to_string()),
            AppError::InvalidCredentials => {
                ("INVALID_CREDENTIALS", "invalid email or password".into())
            }
            AppError::NotFound { resource } => ("NOT_FOUND", format!("{resource} not found.")),
            AppError::ServiceUnavailable => (
                "SERVICE_UNAVAILABLE",
                "a dependency is temporarily unavailable".into(),
            ),
            AppError::RequestTimeout => ("REQUEST_TIMEOUT", "request timed out".into()),
            AppError::RateLimited { .. } => (
                "RATE_LIMITED",
                "too many requests, please try again later".into(),
            ),
            AppError::Internal => ("INTERNAL_SERVER_ERROR", "internal server error".into()),
        };

        let body = ErrorResponse {
            success: false,
            code,
            message,
        };

        let mut res = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            res.headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        res
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => AppError::bad_request("CONFLICT", "duplicate field value"),
            RepoError::MissingReference => AppError::not_found("referenced resource"),
            other => {
                tracing::error!(error = ?other, "repository failure");
                AppError::Internal
            }
        }
    }
}

impl From<IdCodecError> for AppError {
    fn from(e: IdCodecError) -> Self {
        match e {
            // Client supplied a malformed public id (e.g. /posts/{id})
            IdCodecError::DecodeInvalidFormat | IdCodecError::DecodeOutOfRange => {
                AppError::bad_request("INVALID_PUBLIC_ID", "invalid id")
            }
            other => {
                tracing::error!(error = %other, "id codec failure");
                AppError::Internal
            }
        }
    }
}

impl From<GateError> for AppError {
    fn from(e: GateError) -> Self {
        match e {
            GateError::Rejected(r) => AppError::Auth(r),
            GateError::StoreUnavailable(err) => {
                tracing::error!(error = ?err, "credential store lookup failed");
                AppError::Internal
            }
            GateError::StoreTimeout => {
                tracing::error!("credential store lookup timed out");
                AppError::ServiceUnavailable
            }
        }
    }
}

impl From<UploadError> for AppError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::Io(err) => {
                tracing::error!(error = %err, "upload storage failure");
                AppError::Internal
            }
            other => AppError::bad_request(other.code(), other.to_string()),
        }
    }
}

// Extractor rejections keep the JSON error shape instead of axum's plain-text bodies.
impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::bad_request("INVALID_BODY", e.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        AppError::bad_request("INVALID_QUERY", e.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(e: PathRejection) -> Self {
        AppError::bad_request("INVALID_PATH", e.body_text())
    }
}
