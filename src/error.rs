//! Error types for schema_compare

use thiserror::Error;

use crate::model::ObjectKey;

/// Result type for schema_compare operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for schema_compare
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Dependency cycle detected: {}", format_cycles(cycles))]
    DependencyCycle { cycles: Vec<Vec<ObjectKey>> },

    #[error("Script generation error: {0}")]
    ScriptError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Convert Serde JSON errors to schema_compare errors
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert TOML deserialization errors to schema_compare errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}

fn format_cycles(cycles: &[Vec<ObjectKey>]) -> String {
    cycles
        .iter()
        .map(|cycle| {
            let members: Vec<String> = cycle.iter().map(|key| key.to_string()).collect();
            format!("{{{}}}", members.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ")
}
