use std::time::Duration;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

/// Failures raised by the inventory store gateway.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not connect to the inventory store: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("connecting to the inventory store timed out after {0:?}")]
    Timeout(Duration),

    #[error("inventory store query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("inventory data could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// True when the store could not be reached at all, as opposed to a
    /// statement failing on a live connection.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }

    /// Short, stable code that is safe to hand to clients.
    pub fn public_code(&self) -> &'static str {
        if self.is_connectivity() {
            "RDS_CONNECTION_FAILURE"
        } else {
            "RDS_QUERY_FAILURE"
        }
    }

    /// Same as [`StoreError::public_code`], except an unreachable store on the
    /// write path is reported as `RDS_WRITE_FAILURE`.
    pub fn public_write_code(&self) -> &'static str {
        if self.is_connectivity() {
            "RDS_WRITE_FAILURE"
        } else {
            "RDS_QUERY_FAILURE"
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("{0}")]
    BadRequest(String),

    /// Body extraction failed; keeps the status axum chose (400, 413, 415, 422).
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    StoreWrite(StoreError),
}

impl AppError {
    pub fn missing_field(field: &'static str) -> Self {
        Self::Validation {
            field,
            message: format!("missing required field: {field}"),
        }
    }

    pub fn invalid_field(field: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::Validation {
            field,
            message: format!("invalid field {field}: {reason}"),
        }
    }

    /// Store failure raised while writing a record.
    pub fn write(source: StoreError) -> Self {
        Self::StoreWrite(source)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Rejected { status, .. } => *status,
            Self::Store(_) | Self::StoreWrite(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Validation { field, message } => {
                warn!(field = *field, "{message}");
                json!({ "error": message, "field": field })
            }
            Self::BadRequest(message) => {
                warn!("bad request: {message}");
                json!({ "error": message })
            }
            Self::Rejected { status, message } => {
                warn!(status = status.as_u16(), "rejected request body: {message}");
                json!({ "error": message })
            }
            Self::Store(source) => {
                error!(error = %source, "store failure");
                json!({ "error": source.public_code() })
            }
            Self::StoreWrite(source) => {
                error!(error = %source, "store failure on write");
                json!({ "error": source.public_write_code() })
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
