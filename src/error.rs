use std::path::PathBuf;

use thiserror::Error;

/// Main application error type that encompasses all fatal failure modes.
///
/// A document failing its schema is not an error: it becomes a
/// [`FileValidationResult`](crate::validator::FileValidationResult) with
/// `success == false`. Everything in this enum aborts the run.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON decoding error: {path} - {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed document: '{field}' field not found: {path}")]
    MalformedDocument { path: PathBuf, field: String },

    #[error("Schema not found for type '{type_tag}': {path}")]
    SchemaNotFound { type_tag: String, path: PathBuf },

    #[error("Failed reading '{label}' schema file: {path} - {source}")]
    SchemaRead {
        label: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema compilation failed: {label} - {details}")]
    SchemaCompile { label: String, details: String },

    #[error("Schema patch failed: {label} - no value at '{pointer}'")]
    SchemaPatch { label: String, pointer: String },

    #[error("Path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Concurrent operation error: {details}")]
    Concurrency { details: String },
}

impl ValidationError {
    /// Errors raised before the pipeline starts (bad schema root, bad schema,
    /// bad input path, bad configuration).
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            ValidationError::SchemaRead { .. }
                | ValidationError::SchemaCompile { .. }
                | ValidationError::SchemaPatch { .. }
                | ValidationError::PathNotFound { .. }
                | ValidationError::Config(_)
        )
    }

    /// Errors that point at a specific input document.
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            ValidationError::Json { .. }
                | ValidationError::MalformedDocument { .. }
                | ValidationError::SchemaNotFound { .. }
        )
    }
}

/// Configuration-specific error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    #[error("Invalid configuration value: {field} = {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

impl From<ConfigError> for ValidationError {
    fn from(err: ConfigError) -> Self {
        ValidationError::Config(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
