//! # validate-article-json Library
//!
//! Validates a corpus of article-json documents against their api-raml JSON
//! Schemas, concurrently, with bounded memory: a single feeder streams
//! documents through a bounded queue into a pool of validation workers,
//! results are summarised, and the first few failures are re-run with full
//! error detail.

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod error_reporter;
pub mod feeder;
pub mod file_discovery;
pub mod output;
pub mod revalidator;
pub mod schema_registry;
pub mod summary;
pub mod validator;
pub mod worker_pool;

pub use cli::{Cli, VerbosityLevel};
pub use config::{Config, ConfigManager, JobConfig, SampleSize, WorkerCount};
pub use document::Document;
pub use error::{ConfigError, ValidationError};
pub use error_reporter::ErrorReporter;
pub use feeder::Feeder;
pub use file_discovery::FileDiscovery;
pub use output::{Output, format_ms};
pub use revalidator::{Revalidation, Revalidator};
pub use schema_registry::{
    CompiledSchema, SchemaPatch, SchemaRegistry, SchemaSpec, ValidationOutcome,
    ValidationViolations, Violation,
};
pub use summary::RunSummary;
pub use validator::{
    BatchRun, FileValidationResult, RunOutcome, StatusCallback, ValidationEngine,
    validate_document,
};
pub use worker_pool::{PoolStrategy, WorkerPool};
