//! Object storage backends

mod ephemeral;
mod s3;
mod traits;

pub use ephemeral::EphemeralStore;
pub use s3::{S3Store, S3StoreConfig};
pub use traits::{ObjectMetadata, ObjectStore, PutObjectResult, StorageError, StoredObject};
