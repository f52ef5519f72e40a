//! Error types for opspulse

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Construction-time misconfiguration (empty repository, bad threshold).
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
