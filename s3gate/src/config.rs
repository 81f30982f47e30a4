//! Configuration management

use anyhow::Context;
use config::{builder::DefaultState, ConfigBuilder};
use s3gate_auth::{ApiToken, TokenError};
use s3gate_upload::storage::S3StoreConfig;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Config file looked up in the working directory when `--config` is not given
const DEFAULT_CONFIG_NAME: &str = "s3gate";

/// Prefix for environment overrides of every key (`S3GATE_MAX_UPLOAD_SIZE`, ...)
const ENV_PREFIX: &str = "S3GATE";

/// Gateway configuration, read once at startup
#[derive(Clone, Deserialize)]
pub struct GatewayConfig {
    /// Destination bucket (`S3_BUCKET`)
    #[serde(default)]
    pub bucket: String,

    /// Storage region (`AWS_REGION`)
    #[serde(default)]
    pub region: Option<String>,

    /// Shared secret clients send in `X-API-Token` (`GO_S3_API_TOKEN`)
    #[serde(default)]
    pub api_token: String,

    #[serde(default)]
    pub storage: StorageBackend,

    #[serde(default)]
    pub endpoint_url: Option<String>,

    #[serde(default)]
    pub force_path_style: bool,

    /// Largest accepted request body, in bytes; unlimited when unset
    #[serde(default)]
    pub max_upload_size: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    S3,
    Memory,
}

impl GatewayConfig {
    /// Load from the config file, `S3GATE_*` variables and the gateway's
    /// well-known variables, in increasing precedence.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let builder = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .set_override_option("bucket", std::env::var("S3_BUCKET").ok())?
            .set_override_option("region", std::env::var("AWS_REGION").ok())?
            .set_override_option("api_token", std::env::var("GO_S3_API_TOKEN").ok())?;

        Self::from_builder(builder)
    }

    /// Build and validate from prepared sources
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.api_token()
            .context("GO_S3_API_TOKEN must be set to a non-empty value")?;
        if self.bucket.is_empty() {
            anyhow::bail!("S3_BUCKET must be set to a non-empty value");
        }
        if self.max_upload_size == Some(0) {
            anyhow::bail!("max_upload_size must be greater than zero");
        }
        Ok(())
    }

    pub fn api_token(&self) -> Result<ApiToken, TokenError> {
        ApiToken::new(self.api_token.clone())
    }

    pub fn s3_store_config(&self) -> S3StoreConfig {
        S3StoreConfig {
            region: self.region.clone().filter(|r| !r.is_empty()),
            endpoint_url: self.endpoint_url.clone().filter(|u| !u.is_empty()),
            force_path_style: self.force_path_style,
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("api_token", &"<redacted>")
            .field("storage", &self.storage)
            .field("endpoint_url", &self.endpoint_url)
            .field("force_path_style", &self.force_path_style)
            .field("max_upload_size", &self.max_upload_size)
            .finish()
    }
}
