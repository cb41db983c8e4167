use std::{
    collections::BTreeMap,
    fmt::{self, Display},
};

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use warp::http::StatusCode;

pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Field-level validation messages, keyed by field name.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    inner: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.inner
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.inner.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// `Ok(())` when nothing was collected, otherwise a validation error.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self
            .inner
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect::<Vec<String>>();

        write!(f, "{}", parts.join("; "))
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid input ({0})")]
    Validation(FieldErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found.")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Password hash error: {0}")]
    Hash(argon2::password_hash::Error),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<argon2::password_hash::Error> for ApiError {
    fn from(value: argon2::password_hash::Error) -> Self {
        Self::Hash(value)
    }
}

impl warp::reject::Reject for ApiError {}

impl ApiError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(FieldErrors::single(field, message))
    }

    pub fn unauthorized(detail: &str) -> Self {
        Self::Unauthorized(detail.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Database(_)
            | Self::Migrate(_)
            | Self::Io(_)
            | Self::Hash(_)
            | Self::Token(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing body. Server-side failures never leak their details.
    pub fn body(&self) -> Value {
        match self {
            Self::Validation(errors) => json!(errors),
            Self::Unauthorized(detail) => json!({ "detail": detail }),
            Self::NotFound => json!({ "detail": "Not found." }),
            _ => json!({ "detail": "Internal server error" }),
        }
    }

    pub fn is_internal(&self) -> bool {
        self.status().is_server_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_collect_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("name", "This field may not be blank.");
        errors.add("name", "Ensure this field has no more than 255 characters.");
        errors.add("tags", "Invalid pk \"4\" - object does not exist.");

        assert_eq!(errors.get("name").map(<[String]>::len), Some(2));
        assert_eq!(errors.get("tags").map(<[String]>::len), Some(1));
        assert!(errors.get("title").is_none());
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_empty_field_errors_pass() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_validation_body_is_keyed_by_field() {
        let err = ApiError::validation("name", "This field may not be blank.");

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.body(),
            json!({ "name": ["This field may not be blank."] })
        );
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = ApiError::Internal("connection refused on 10.0.0.3".to_string());

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_internal());
        assert_eq!(err.body(), json!({ "detail": "Internal server error" }));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::unauthorized("Invalid token.").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Database(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_rejection_carries_api_error() {
        let rejection = warp::reject::Rejection::from(ApiError::NotFound);

        assert!(matches!(
            rejection.find::<ApiError>(),
            Some(ApiError::NotFound)
        ));
    }
}
