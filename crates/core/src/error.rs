//! Error types for bw-core
//!
//! Every walkthrough step returns this error type. The walkthrough driver
//! prints `kind()` in the trace and keeps going; fatal startup errors are
//! turned into exit codes by the CLI.

use thiserror::Error;

/// Result type alias for bw-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for bw-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error or missing setting
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid argument passed to an operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Authentication or permission failure
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Bucket, object or version not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Conflict error (bucket exists, bucket not empty)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Feature not supported by backend
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// Provider returned an error code we do not classify
    #[error("Service error {code}: {message}")]
    Service { code: String, message: String },

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Stable name of the error kind, printed in the walkthrough trace
    pub const fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "ConfigError",
            Error::Io(_) => "IoError",
            Error::TomlParse(_) | Error::TomlSerialize(_) => "TomlError",
            Error::Json(_) => "JsonError",
            Error::InvalidUrl(_) => "InvalidUrl",
            Error::InvalidArgument(_) => "InvalidArgument",
            Error::Auth(_) => "AuthError",
            Error::NotFound(_) => "NotFound",
            Error::Network(_) => "NetworkError",
            Error::Conflict(_) => "Conflict",
            Error::UnsupportedFeature(_) => "UnsupportedFeature",
            Error::Service { .. } => "ServiceError",
            Error::General(_) => "Error",
        }
    }

    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_)
            | Error::TomlParse(_)
            | Error::InvalidUrl(_)
            | Error::InvalidArgument(_) => 2, // UsageError
            Error::Conflict(_) => 6,
            _ => 1,
        }
    }
}
