use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// The single error type for all keywarden operations.
///
/// Variants split into two classes with distinct caller-visible treatment:
/// business errors (authentication, authorization, unregistered table,
/// unusable wrapped key) are recovered into the `code: -1` success envelope
/// at the router boundary, while everything else is an internal fault that
/// surfaces as a generic server error without disclosing which dependency
/// failed.
#[derive(Error, Debug, Serialize)]
pub enum WardenError {
    #[error("cannot authenticate the token")]
    Authentication {
        msg: String,
        #[serde(skip)]
        #[source]
        source: Option<anyhow::Error>,
    },
    #[error("do not have permission to access column {column} in table {table}")]
    Authorization { table: String, column: String },
    #[error("table {table} has not been registered yet")]
    TableNotRegistered { table: String },
    #[error("provided data key cannot be unwrapped")]
    InvalidWrappedKey {
        #[serde(skip)]
        #[source]
        source: Option<anyhow::Error>,
    },
    #[error("invalid request: {msg}")]
    InvalidRequest {
        msg: String,
        #[serde(skip)]
        #[source]
        source: Option<anyhow::Error>,
    },
    #[error("stored master key for table {table} failed integrity check")]
    KeyIntegrity {
        table: String,
        #[serde(skip)]
        #[source]
        source: Option<anyhow::Error>,
    },
    #[error("dependency unavailable: {msg}")]
    Dependency {
        msg: String,
        #[serde(skip)]
        #[source]
        source: Option<anyhow::Error>,
    },
    #[error("crypto operation failed")]
    CryptoOperation {
        #[serde(skip)]
        #[source]
        source: Option<anyhow::Error>,
    },
    #[error("repository error: {msg}")]
    Repository {
        msg: String,
        #[serde(skip)]
        #[source]
        source: Option<anyhow::Error>,
    },
    #[error("sqlite database error")]
    SqliteError {
        #[serde(skip)]
        #[from]
        #[source]
        source: libsql::Error,
    },
    #[error("io error")]
    IoError {
        #[serde(skip)]
        #[from]
        #[source]
        source: std::io::Error,
    },
    #[error("serde json error")]
    SerdeSerializationError {
        #[serde(skip)]
        #[from]
        #[source]
        source: serde_json::Error,
    },
}

impl WardenError {
    /// Business errors travel back in the success envelope (`code: -1`);
    /// internal faults become a generic transport-level server error.
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. }
                | Self::Authorization { .. }
                | Self::TableNotRegistered { .. }
                | Self::InvalidWrappedKey { .. }
        )
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Authentication { .. } => "Authentication",
            Self::Authorization { .. } => "Authorization",
            Self::TableNotRegistered { .. } => "TableNotRegistered",
            Self::InvalidWrappedKey { .. } => "InvalidWrappedKey",
            Self::InvalidRequest { .. } => "InvalidRequest",
            Self::KeyIntegrity { .. }
            | Self::Dependency { .. }
            | Self::CryptoOperation { .. }
            | Self::Repository { .. }
            | Self::SqliteError { .. }
            | Self::IoError { .. }
            | Self::SerdeSerializationError { .. } => "InternalServerError",
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    name: String,
    message: String,
}

impl IntoResponse for WardenError {
    fn into_response(self) -> Response {
        let status = match &self {
            WardenError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            WardenError::Authorization { .. } => StatusCode::FORBIDDEN,
            WardenError::TableNotRegistered { .. }
            | WardenError::InvalidWrappedKey { .. }
            | WardenError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            WardenError::KeyIntegrity { .. }
            | WardenError::Dependency { .. }
            | WardenError::CryptoOperation { .. }
            | WardenError::Repository { .. }
            | WardenError::SqliteError { .. }
            | WardenError::IoError { .. }
            | WardenError::SerdeSerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal faults keep their cause out of the response body; the
        // details are available through tracing only.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "internal error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(ErrorResponse {
            name: self.name().to_string(),
            message,
        });

        (status, body).into_response()
    }
}
