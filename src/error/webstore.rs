use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error as ThisError;
use tracing::error;

pub type WebstoreResult<T> = Result<T, WebstoreError>;

#[derive(Debug, ThisError)]
pub enum WebstoreError {
    #[error("Invalid value: {0}")]
    InvalidParameter(String),

    #[error("Invalid filter: no such column: {0}")]
    UnknownColumn(String),

    #[error("Invalid query: {0}")]
    QueryExecution(String),

    #[error("Invalid row ID: {0}")]
    InvalidRowOrdinal(String),

    #[error("Invalid request body: {0}")]
    MalformedBody(String),

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("No such table: {0}")]
    TableNotFound(String),

    #[error("Table already exists: {table}")]
    TableAlreadyExists { table: String, url: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Database unavailable: {0}")]
    DatabaseUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ractor error: {0}")]
    Actor(String),
}

impl WebstoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebstoreError::InvalidParameter(_)
            | WebstoreError::UnknownColumn(_)
            | WebstoreError::QueryExecution(_)
            | WebstoreError::InvalidRowOrdinal(_)
            | WebstoreError::MalformedBody(_)
            | WebstoreError::MissingArgument(_) => StatusCode::BAD_REQUEST,
            WebstoreError::TableNotFound(_) => StatusCode::NOT_FOUND,
            WebstoreError::TableAlreadyExists { .. } => StatusCode::CONFLICT,
            WebstoreError::UnsupportedFormat(_) => StatusCode::NOT_ACCEPTABLE,
            WebstoreError::DatabaseUnavailable(_) => StatusCode::BAD_GATEWAY,
            WebstoreError::Database(_) | WebstoreError::Json(_) | WebstoreError::Actor(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            WebstoreError::InvalidParameter(_) => "INVALID_PARAMETER",
            WebstoreError::UnknownColumn(_) => "UNKNOWN_COLUMN",
            WebstoreError::QueryExecution(_) => "QUERY_ERROR",
            WebstoreError::InvalidRowOrdinal(_) => "INVALID_ROW",
            WebstoreError::MalformedBody(_) => "MALFORMED_BODY",
            WebstoreError::MissingArgument(_) => "MISSING_ARGUMENT",
            WebstoreError::TableNotFound(_) => "TABLE_NOT_FOUND",
            WebstoreError::TableAlreadyExists { .. } => "TABLE_EXISTS",
            WebstoreError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            WebstoreError::DatabaseUnavailable(_) => "DATABASE_UNAVAILABLE",
            WebstoreError::Database(_) | WebstoreError::Json(_) | WebstoreError::Actor(_) => {
                "INTERNAL_ERROR"
            }
        }
    }

    /// Link to the resource the error refers to, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            WebstoreError::TableAlreadyExists { url, .. } => Some(url.as_str()),
            _ => None,
        }
    }

    /// Message safe to hand to the client. Internal failures are logged and masked.
    pub fn public_message(&self) -> String {
        match self {
            WebstoreError::Database(_) | WebstoreError::Json(_) | WebstoreError::Actor(_) => {
                error!(error = %self, "internal failure while serving request");
                "An internal server error occurred.".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Maps a backend failure on a user-shaped statement.
    ///
    /// Engine-level rejections become `QueryExecution`; pool and I/O failures stay
    /// internal.
    pub fn rejected(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => WebstoreError::QueryExecution(db.message().to_string()),
            other => WebstoreError::Database(other),
        }
    }
}

/// Fallback JSON body for failures that happen before a format is known.
#[derive(Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
}

impl IntoResponse for WebstoreError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = ApiErrorObject {
            code: self.code().to_string(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_bad_request() {
        for err in [
            WebstoreError::InvalidParameter("x".into()),
            WebstoreError::UnknownColumn("x".into()),
            WebstoreError::QueryExecution("x".into()),
            WebstoreError::InvalidRowOrdinal("0".into()),
            WebstoreError::MalformedBody("x".into()),
            WebstoreError::MissingArgument("table"),
        ] {
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{err}");
        }
    }

    #[test]
    fn resource_errors_map_to_their_status() {
        assert_eq!(
            WebstoreError::TableNotFound("t".into()).status(),
            StatusCode::NOT_FOUND
        );
        let exists = WebstoreError::TableAlreadyExists {
            table: "t".into(),
            url: "/db/main/t".into(),
        };
        assert_eq!(exists.status(), StatusCode::CONFLICT);
        assert_eq!(exists.url(), Some("/db/main/t"));
        assert_eq!(
            WebstoreError::UnsupportedFormat("xml".into()).status(),
            StatusCode::NOT_ACCEPTABLE
        );
        assert_eq!(
            WebstoreError::DatabaseUnavailable("main".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn internal_errors_are_masked() {
        let err = WebstoreError::Actor("mailbox closed".into());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "An internal server error occurred.");
    }

    #[test]
    fn rejected_keeps_pool_errors_internal() {
        let err = WebstoreError::rejected(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, WebstoreError::Database(_)));
    }
}
