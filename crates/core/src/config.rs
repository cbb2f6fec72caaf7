//! Configuration management
//!
//! This module handles loading, saving, and migrating the bucketwalk
//! configuration file. The file is stored in TOML format at
//! `<config_dir>/bucketwalk/config.toml` unless a path is given explicitly.
//!
//! Connection settings are passed to the backend at construction time; the
//! walkthrough never discovers credentials or regions on its own.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

const DEFAULT_FIRST_PREFIX: &str = "firstrustbucket";
const DEFAULT_SECOND_PREFIX: &str = "secondrustbucket";

/// Bucket names are at most 63 characters; the generated suffix takes 36
const MAX_PREFIX_LEN: usize = 63 - 36;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// How to reach the object store
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Names and local directories used by the walkthrough
    #[serde(default)]
    pub walkthrough: WalkthroughSettings,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            connection: ConnectionConfig::default(),
            walkthrough: WalkthroughSettings::default(),
        }
    }
}

/// Which `ObjectStore` implementation to run against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// A real S3-compatible service via the AWS SDK
    #[default]
    S3,
    /// The in-process store, for offline runs
    Memory,
}

/// Connection settings for the object store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub backend: Backend,

    /// Region of the session; left to the SDK when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Custom endpoint URL (MinIO, RustFS, LocalStack, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Access key ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,

    /// Secret access key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,

    /// Use path-style addressing instead of virtual-hosted buckets
    #[serde(default)]
    pub force_path_style: bool,

    /// Canonical owner id reported in ACLs by the memory backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

impl ConnectionConfig {
    /// Connection to the in-process store in the given region
    pub fn memory(region: impl Into<String>) -> Self {
        Self {
            backend: Backend::Memory,
            region: Some(region.into()),
            ..Default::default()
        }
    }

    /// Static credentials, if both halves are configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key, &self.secret_key) {
            (Some(access), Some(secret)) => Some((access, secret)),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.access_key.is_some() != self.secret_key.is_some() {
            return Err(Error::Config(
                "access_key and secret_key must be set together".into(),
            ));
        }

        if let Some(region) = &self.region
            && region.trim().is_empty()
        {
            return Err(Error::Config("region must not be empty".into()));
        }

        if let Some(endpoint) = &self.endpoint {
            let url = url::Url::parse(endpoint)?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(Error::Config(format!(
                    "endpoint must use http or https, got '{}'",
                    url.scheme()
                )));
            }
        }

        Ok(())
    }
}

/// Settings of the scripted sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkthroughSettings {
    /// Prefix of the bucket created through the operation handle
    #[serde(default = "default_first_prefix")]
    pub first_bucket_prefix: String,

    /// Prefix of the bucket created through the entity handle
    #[serde(default = "default_second_prefix")]
    pub second_bucket_prefix: String,

    /// Directory the temp files are written to
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Directory the first file is downloaded into; system temp dir when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,
}

fn default_first_prefix() -> String {
    DEFAULT_FIRST_PREFIX.to_string()
}

fn default_second_prefix() -> String {
    DEFAULT_SECOND_PREFIX.to_string()
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for WalkthroughSettings {
    fn default() -> Self {
        Self {
            first_bucket_prefix: default_first_prefix(),
            second_bucket_prefix: default_second_prefix(),
            work_dir: default_work_dir(),
            download_dir: None,
        }
    }
}

impl WalkthroughSettings {
    /// Effective download directory
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn validate(&self) -> Result<()> {
        for prefix in [&self.first_bucket_prefix, &self.second_bucket_prefix] {
            if prefix.is_empty() {
                return Err(Error::Config("bucket prefix must not be empty".into()));
            }
            if prefix.len() > MAX_PREFIX_LEN {
                return Err(Error::Config(format!(
                    "bucket prefix '{prefix}' is longer than {MAX_PREFIX_LEN} characters"
                )));
            }
            if !prefix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
            {
                return Err(Error::Config(format!(
                    "bucket prefix '{prefix}' may only contain lowercase letters, digits, '-' and '.'"
                )));
            }
        }
        Ok(())
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.connection.validate()?;
        self.walkthrough.validate()
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        let config_path = config_dir.join("bucketwalk").join("config.toml");
        Ok(Self { config_path })
    }

    /// Create a ConfigManager with a custom path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    /// If the schema version doesn't match, attempts migration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "config file missing, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        if config.schema_version < SCHEMA_VERSION {
            config = self.migrate(config)?;
        } else if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade bucketwalk.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to disk
    ///
    /// Creates parent directories if they don't exist.
    /// Sets file permissions to 600 (owner read/write only).
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        // Credentials may be stored in the file
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        Ok(())
    }

    /// Migrate configuration from older schema version
    fn migrate(&self, mut config: Config) -> Result<Config> {
        tracing::info!(
            from = config.schema_version,
            to = SCHEMA_VERSION,
            "migrating configuration"
        );
        config.schema_version = SCHEMA_VERSION;
        Ok(config)
    }
}
