// src/backend/error.rs
use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::summary::InvalidDueDate;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    InvalidDueDate(String),
    MissingInput(String),
    Validation(String),
    InsufficientFunds,
    Unauthorized,
    NotFound(&'static str),
    Conflict(String),
    Database(sqlx::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidDueDate(_)
            | Self::MissingInput(_)
            | Self::Validation(_)
            | Self::InsufficientFunds => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidDueDate(_) => "invalid_due_date",
            Self::MissingInput(_) => "missing_input",
            Self::Validation(_) => "validation",
            Self::InsufficientFunds => "insufficient_funds",
            Self::Unauthorized => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Database(_) => "internal",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDueDate(value) => {
                write!(f, "invalid due date `{value}`: expected a day of month 1-31")
            }
            Self::MissingInput(field) => write!(f, "missing required input `{field}`"),
            Self::Validation(message) => f.write_str(message),
            Self::InsufficientFunds => f.write_str("pot does not hold enough to withdraw that amount"),
            Self::Unauthorized => f.write_str("missing or unknown x-user-id"),
            Self::NotFound(what) => write!(f, "{what} not found"),
            Self::Conflict(message) => f.write_str(message),
            // the driver message stays in the log
            Self::Database(_) => f.write_str("internal server error"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database(err) => Some(err),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict("a record with the same key already exists".to_string())
            }
            _ => Self::Database(err),
        }
    }
}

impl From<InvalidDueDate> for ApiError {
    fn from(err: InvalidDueDate) -> Self {
        Self::InvalidDueDate(err.value)
    }
}

// serde reports an absent field as "missing field `name`"
fn missing_field(message: &str) -> Option<&str> {
    let (_, rest) = message.split_once("missing field `")?;
    rest.split_once('`').map(|(field, _)| field)
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        match rejection {
            JsonRejection::JsonDataError(_) => {
                if let Some(field) = missing_field(&message) {
                    Self::MissingInput(field.to_string())
                } else if message.contains("invalid type: null") {
                    Self::MissingInput("request body".to_string())
                } else {
                    Self::Validation(message)
                }
            }
            _ => Self::Validation(message),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Database(err) = &self {
            error!(error = %err, "database error");
        }

        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_the_missing_field_name() {
        let message = "Failed to deserialize the JSON body into the target type: missing field `name` at line 1 column 80";
        assert_eq!(missing_field(message), Some("name"));
        assert_eq!(missing_field("invalid type: null, expected struct BillInput"), None);
    }

    #[test]
    fn every_variant_has_a_client_or_server_status() {
        let errors = [
            ApiError::MissingInput("name".to_string()),
            ApiError::Validation("bad".to_string()),
            ApiError::InvalidDueDate("32".to_string()),
            ApiError::InsufficientFunds,
        ];
        for err in errors {
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{err}");
        }
        assert_eq!(ApiError::NotFound("pot").code(), "not_found");
    }
}
