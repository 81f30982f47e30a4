//! Request authentication for s3gate
//!
//! Requests to protected routes must present the configured shared secret in
//! the `X-API-Token` header.

pub mod token;

pub use token::{require_api_token, ApiToken, TokenError, API_TOKEN_HEADER};
