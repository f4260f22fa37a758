use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CensusError {
    #[error("token name does not carry a `#<digits>` id: {0}")]
    TokenName(String),

    #[error("metadata request failed: {0}")]
    MetadataHttp(String),

    #[error("metadata endpoint returned status {status}: {message}")]
    MetadataStatus { status: u16, message: String },

    #[error("total supply request failed: {0}")]
    SupplyHttp(String),

    #[error("total supply endpoint returned status {status}: {message}")]
    SupplyStatus { status: u16, message: String },

    #[error("total supply response has no numeric `{0}` field")]
    SupplyField(String),

    #[error("no total supply endpoint configured (set `supply_url` in the config file)")]
    MissingSupplyEndpoint,

    #[error("missing API key: environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to write snapshot: {0}")]
    SnapshotWrite(String),

    #[error("failed to read snapshot {path}: {message}")]
    SnapshotRead { path: String, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
