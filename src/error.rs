use std::fmt::Debug;
use std::fmt::Display;

use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::components;

/// Failure of a single user action. None of these are fatal to the process.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or malformed input, caught before any store call.
    #[error("{0}")]
    Validation(String),

    /// Action attempted by someone who doesn't own the record, or by nobody.
    #[error("Not allowed: {0}")]
    Authorization(String),

    #[error("{0} not found")]
    NotFound(String),

    /// The backing store or object storage failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ServiceError::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ServiceError::Authorization(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }

    /// Text safe to show the user. Store failures never expose their cause.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Persistence(_) => "Please try again".to_string(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Authorization(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// htmx response header overriding the swap strategy of the request.
pub const HX_RESWAP: &str = "hx-reswap";

pub struct AppError {
    pub inner: ServiceError,
}

// Tell axum how to convert `AppError` into a response.
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.inner.status();
        if status.is_server_error() {
            tracing::error!(error = ?self.inner, "request failed");
        }
        match &self.inner {
            ServiceError::Validation(msg) => {
                (status, components::toast::inline_error(msg)).into_response()
            }
            // Only the out-of-band toast is applied; the target stays as it was.
            ServiceError::Persistence(_) => (
                status,
                [(HX_RESWAP, "none")],
                components::toast::error("Something went wrong", &self.inner.user_message()),
            )
                .into_response(),
            other => (
                status,
                [(HX_RESWAP, "none")],
                components::toast::error("Request failed", &other.user_message()),
            )
                .into_response(),
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.inner, f)
    }
}

impl Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.inner, f)
    }
}

// This enables using `?` on anything that converts into `ServiceError` (including
// `anyhow::Error`) inside handlers returning `Result<_, AppError>`.
impl<E> From<E> for AppError
where
    E: Into<ServiceError>,
{
    fn from(err: E) -> Self {
        Self { inner: err.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_taxonomy() {
        assert_eq!(
            ServiceError::validation("Title is required").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ServiceError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(ServiceError::not_found("Post").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServiceError::from(anyhow::anyhow!("db down")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn failures_other_than_validation_keep_the_target() {
        let res = AppError::from(ServiceError::forbidden("nope")).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(res.headers()[HX_RESWAP], "none");

        let res = AppError::from(ServiceError::validation("Title is required")).into_response();
        assert!(res.headers().get(HX_RESWAP).is_none());
    }

    #[test]
    fn store_failures_are_masked() {
        let err = ServiceError::from(anyhow::anyhow!("connection reset"));
        assert_eq!(err.user_message(), "Please try again");
        assert_eq!(
            ServiceError::validation("Title is required").user_message(),
            "Title is required"
        );
    }

    #[test]
    fn anyhow_converts_through_to_app_error() {
        let err: AppError = anyhow::anyhow!("pool exhausted").into();
        assert!(matches!(err.inner, ServiceError::Persistence(_)));
    }
}
