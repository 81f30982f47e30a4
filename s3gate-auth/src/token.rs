//! Shared-secret token gate

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use s3gate_core::GatewayError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Header carrying the client's token
pub const API_TOKEN_HEADER: &str = "x-api-token";

/// Errors building an [`ApiToken`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("API token must not be empty")]
    Empty,
}

/// The configured shared secret.
///
/// Never empty, so an absent or empty header can never satisfy it.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(secret: impl Into<String>) -> Result<Self, TokenError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(TokenError::Empty);
        }
        Ok(Self(secret))
    }

    /// Byte-for-byte comparison against a presented header value
    pub fn matches(&self, presented: Option<&[u8]>) -> bool {
        match presented {
            Some(value) if !value.is_empty() => value == self.0.as_bytes(),
            _ => false,
        }
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(<redacted>)")
    }
}

/// Middleware rejecting requests whose `X-API-Token` does not match
pub async fn require_api_token(
    State(token): State<Arc<ApiToken>>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(API_TOKEN_HEADER)
        .map(|v| v.as_bytes());

    if !token.matches(presented) {
        debug!(
            path = %request.uri().path(),
            header_present = presented.is_some(),
            "Rejected request with invalid API token"
        );
        return GatewayError::InvalidToken.into_response();
    }

    next.run(request).await
}
