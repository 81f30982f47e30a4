//! Amazon S3 storage backend

use super::traits::{ObjectMetadata, ObjectStore, PutObjectResult, StorageError};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::Region,
    error::{DisplayErrorContext, SdkError},
    primitives::ByteStream,
    Client,
};
use bytes::Bytes;
use tracing::{debug, info};

/// Settings used to build the S3 client
#[derive(Debug, Clone, Default)]
pub struct S3StoreConfig {
    /// Region; falls back to the SDK's default provider chain when unset
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
}

/// Storage backend writing to a real S3 bucket.
///
/// One client is built at startup and shared by all requests.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Resolve credentials and region through the default chain and build a client
    pub async fn load(config: &S3StoreConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint_url) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        info!(
            region = ?s3_config.region().map(ToString::to_string),
            endpoint = ?config.endpoint_url,
            "S3 client ready"
        );

        Self::from_client(Client::from_conf(s3_config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        metadata: ObjectMetadata,
    ) -> Result<PutObjectResult, StorageError> {
        let size = data.len();
        let output = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .set_content_type(metadata.content_type)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        debug!(bucket, key, size, etag = ?output.e_tag(), "PutObject succeeded");
        Ok(PutObjectResult {
            etag: output.e_tag().map(str::to_owned),
        })
    }
}

/// Requests the SDK could not even build point at client configuration
/// (missing region, unresolvable endpoint); everything else is an upload failure.
fn classify_sdk_error<E, R>(err: SdkError<E, R>) -> StorageError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let detail = DisplayErrorContext(&err).to_string();
    match err {
        SdkError::ConstructionFailure(_) => StorageError::Config(detail),
        _ => StorageError::Upload(detail),
    }
}
