use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use anyhow::Context;

/// Port the service listens on unless overridden.
pub const DEFAULT_PORT: u16 = 8000;

/// Address the service binds to unless overridden.
pub const DEFAULT_BIND: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// File name of the serialized model weights.
pub const MODEL_FILE: &str = "heart_model.mpk";

/// File name of the serialized column schema.
pub const COLUMNS_FILE: &str = "heart_columns.json";

/// Service configuration.
///
/// The defaults serve from `127.0.0.1:8000` with both artifacts in the
/// working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Directory holding the model and column artifacts.
    pub artifact_dir: PathBuf,

    /// Address to bind the HTTP server to.
    pub bind: IpAddr,

    /// Port to bind the HTTP server to.
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("."),
            bind: DEFAULT_BIND,
            port: DEFAULT_PORT,
        }
    }
}

impl ServiceConfig {
    /// Loads configuration from environment variables, falling back to the
    /// defaults for anything unset.
    ///
    /// Optional environment variables:
    /// - `HEART_ARTIFACT_DIR`: directory holding `heart_model.mpk` and `heart_columns.json`
    /// - `HEART_BIND`: IP address to bind to (default: `127.0.0.1`)
    /// - `HEART_PORT`: port to bind to (default: `8000`)
    ///
    /// # Errors
    ///
    /// Returns an error if `HEART_BIND` or `HEART_PORT` is set but unparsable.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let artifact_dir = lookup("HEART_ARTIFACT_DIR").map_or(defaults.artifact_dir, PathBuf::from);

        let bind = lookup("HEART_BIND")
            .map(|raw| {
                raw.parse::<IpAddr>()
                    .with_context(|| format!("HEART_BIND is not an IP address: {raw}"))
            })
            .transpose()?
            .unwrap_or(defaults.bind);

        let port = lookup("HEART_PORT")
            .map(|raw| {
                raw.parse::<u16>()
                    .with_context(|| format!("HEART_PORT is not a port number: {raw}"))
            })
            .transpose()?
            .unwrap_or(defaults.port);

        Ok(Self {
            artifact_dir,
            bind,
            port,
        })
    }

    /// Path of the serialized model weights.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.artifact_dir.join(MODEL_FILE)
    }

    /// Path of the serialized column schema.
    #[must_use]
    pub fn columns_path(&self) -> PathBuf {
        self.artifact_dir.join(COLUMNS_FILE)
    }

    #[must_use]
    pub fn with_artifact_dir(mut self, dir: &Path) -> Self {
        self.artifact_dir = dir.to_path_buf();
        self
    }
}
