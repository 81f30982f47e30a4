//! Gateway error types and their HTTP translation

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Broad class of a request failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    BadRequest,
    Internal,
}

impl ErrorKind {
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Terminal failure of an upload request.
///
/// The `Display` text of each variant is exactly the body sent to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Invalid API Token")]
    InvalidToken,

    #[error("Error retrieving the file")]
    MissingFile,

    #[error("Error opening the file")]
    OpenFile,

    #[error("Error loading AWS configuration")]
    StorageConfig,

    #[error("Error uploading to S3")]
    Upload,
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidToken => ErrorKind::Unauthorized,
            Self::MissingFile => ErrorKind::BadRequest,
            Self::OpenFile | Self::StorageConfig | Self::Upload => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind().http_status()
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
