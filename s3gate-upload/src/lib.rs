//! Upload handling for s3gate
//!
//! This crate reads the `image` part of a multipart request and relays it to
//! an object store.

pub mod handlers;
pub mod key;
pub mod storage;

pub use handlers::{upload, FileField, UploadState, UPLOAD_FIELD};
pub use key::upload_key;
