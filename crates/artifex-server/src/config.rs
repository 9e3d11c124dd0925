use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use artifex_overlay::OverlayConfig;
use artifex_types::ImageId;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Server settings. Every field has a default, so a TOML file only needs
/// the keys it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Directory holding one file per stored image.
    pub storage_root: PathBuf,
    /// Where multipart uploads are spooled before ingest.
    pub staging_dir: PathBuf,
    /// Scheme and authority used to build `imageUrl` values.
    pub public_base_url: String,
    /// Path prefix of the image API, e.g. `/api`. Empty mounts it at the root.
    pub api_prefix: String,
    /// Largest accepted request body.
    pub max_upload_bytes: usize,
    pub allow_any_origin: bool,
    pub overlay: OverlayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 5000)),
            storage_root: PathBuf::from("uploads"),
            staging_dir: PathBuf::from("uploads/.staging"),
            public_base_url: "http://localhost:5000".into(),
            api_prefix: "/api".into(),
            max_upload_bytes: 25 * 1024 * 1024,
            allow_any_origin: true,
            overlay: OverlayConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from a TOML file and validate.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), "loaded server config");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn validate(&self) -> ServerResult<()> {
        if !self.api_prefix.is_empty()
            && (!self.api_prefix.starts_with('/') || self.api_prefix.ends_with('/'))
        {
            return Err(ServerError::Config(format!(
                "api_prefix must start with '/' and not end with one, got {:?}",
                self.api_prefix
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(ServerError::Config("max_upload_bytes must be positive".into()));
        }
        self.overlay.validate()?;
        Ok(())
    }

    /// Public URL of an image's fetch endpoint.
    pub fn image_url(&self, id: &ImageId) -> String {
        format!(
            "{}{}/images/{}",
            self.public_base_url.trim_end_matches('/'),
            self.api_prefix,
            id
        )
    }
}
