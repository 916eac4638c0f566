use std::path::PathBuf;

use thiserror::Error;

/// Field-level failure raised by a normalizer. Never crosses the batch boundary:
/// the record filter turns it into a missing field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{0} is empty")]
    Empty(&'static str),

    #[error("price unavailable: {0}")]
    Unavailable(String),

    #[error("invalid {field}: {value:?}")]
    Invalid { field: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to fetch page {page}: {source}")]
    Http {
        page: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to fetch page {page}: HTTP status {status}")]
    Status { page: u32, status: u16 },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("No data extracted from any page")]
    NoPages,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("Empty batch: nothing to transform")]
    EmptyBatch,
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to save CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Service account JSON not found: {}", .0.display())]
    MissingCredentials(PathBuf),

    #[error("Invalid service account JSON: {0}")]
    Credentials(#[from] serde_json::Error),

    #[error("Failed to sign service account assertion: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Google Sheets request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Google Sheets API error: {message}")]
    Api { message: String },

    #[error("{0} environment variable not set")]
    MissingConnectionString(&'static str),

    #[error("Invalid table name: {0:?}")]
    InvalidTableName(String),

    #[error("Failed to write to Postgres: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Invalid(String),
}

/// Errors that abort a run. Sink failures are not in here: they are reported
/// per sink and never fail the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
