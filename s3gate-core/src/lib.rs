//! Core types for s3gate
//!
//! This crate provides the error taxonomy and request identifiers shared by
//! the gateway crates.

pub mod error;
pub mod request_id;

pub use error::{ErrorKind, GatewayError};
pub use request_id::RequestId;
