//! Validation pipeline
//!
//! Wires the stages of a run together:
//! - **Feeder**: one async task loads documents in feed order into a bounded queue
//! - **Worker pool**: drains the queue, validating on the blocking thread pool
//! - **Collector**: folds results into a [`RunSummary`] once the pool is done
//! - **Revalidator**: re-runs the first few failures sequentially with full detail
//!
//! A run ends with a summary only if every stage completed; any fatal error
//! aborts the remaining stages and is returned instead.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::task::JoinError;

use crate::config::JobConfig;
use crate::document::Document;
use crate::error::{Result, ValidationError};
use crate::feeder::Feeder;
use crate::file_discovery::FileDiscovery;
use crate::output::Output;
use crate::revalidator::Revalidator;
use crate::schema_registry::{SchemaRegistry, ValidationViolations};
use crate::summary::RunSummary;
use crate::worker_pool::{PoolStrategy, WorkerPool};

/// Result of validating a single document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileValidationResult {
    /// Upper-cased type tag that selected the schema
    pub type_tag: String,
    /// Path the document was read from
    pub path: PathBuf,
    /// Time spent inside the validator
    pub elapsed: Duration,
    pub success: bool,
    /// Structured errors, only when capture was requested and validation failed
    pub detail: Option<ValidationViolations>,
}

impl FileValidationResult {
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }
}

/// Called with each result as soon as a worker produces it
pub type StatusCallback = Arc<dyn Fn(&FileValidationResult) + Send + Sync>;

/// Validate one decoded document against the schema for its type tag.
///
/// A type tag with no registered schema is fatal for the whole run.
pub fn validate_document(
    registry: &SchemaRegistry,
    document: Document,
    capture_errors: bool,
) -> Result<FileValidationResult> {
    let schema = registry
        .get(&document.type_tag)
        .ok_or_else(|| ValidationError::SchemaNotFound {
            type_tag: document.type_tag.clone(),
            path: document.source.clone(),
        })?;

    let outcome = registry.validate(schema, &document.payload);
    let success = outcome.is_valid();

    Ok(FileValidationResult {
        type_tag: document.type_tag,
        path: document.source,
        elapsed: outcome.elapsed,
        success,
        detail: if capture_errors {
            outcome.violations
        } else {
            None
        },
    })
}

/// Results of the concurrent pass, before aggregation
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub results: Vec<FileValidationResult>,
    pub wall_time: Duration,
}

/// What a completed run produced
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The input was a single file
    Single(FileValidationResult),
    /// The input was a directory
    Batch(RunSummary),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        match self {
            RunOutcome::Single(result) => result.success,
            RunOutcome::Batch(summary) => summary.is_success(),
        }
    }
}

/// Runs validation jobs against a loaded schema registry.
pub struct ValidationEngine {
    registry: Arc<SchemaRegistry>,
    config: JobConfig,
    status: Option<StatusCallback>,
}

impl ValidationEngine {
    pub fn new(registry: Arc<SchemaRegistry>, config: JobConfig) -> Self {
        Self {
            registry,
            config,
            status: None,
        }
    }

    /// Load and compile every configured schema, then build the engine.
    pub async fn from_config(config: JobConfig) -> Result<Self> {
        let registry = SchemaRegistry::load(&config.schema_root, &config.schemas).await?;
        Ok(Self::new(Arc::new(registry), config))
    }

    pub fn with_status_callback(mut self, callback: StatusCallback) -> Self {
        self.status = Some(callback);
        self
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Ordered, sampled feed list for a directory input
    pub async fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        FileDiscovery::new()
            .with_extensions(self.config.extensions.clone())
            .with_sample_size(self.config.sample_size)
            .discover_files(dir)
            .await
    }

    /// Run the feeder and the worker pool over `paths`.
    ///
    /// Both are joined before results are returned. A pool failure aborts
    /// the feeder. A feeder failure drops the pool at once, so documents
    /// still queued are never validated.
    pub async fn run_batch(&self, paths: Vec<PathBuf>) -> Result<BatchRun> {
        let start = Instant::now();

        let pool = WorkerPool::new(
            Arc::clone(&self.registry),
            PoolStrategy::from(self.config.workers),
        )
        .with_capture_errors(self.config.capture_errors)
        .with_status_callback(self.status.clone());

        let (mut feeder, queue) = Feeder::new(paths).spawn(self.config.buffer_capacity);
        let draining = pool.run(queue);
        tokio::pin!(draining);

        let (results, fed) = tokio::select! {
            results = &mut draining => match results {
                // the queue is closed, so the feeder has already finished
                Ok(results) => (results, feeder_count((&mut feeder).await)?),
                Err(e) => {
                    feeder.abort();
                    return Err(e);
                }
            },
            fed = &mut feeder => {
                let fed = feeder_count(fed)?;
                (draining.await?, fed)
            }
        };
        let wall_time = start.elapsed();

        if fed != results.len() {
            return Err(ValidationError::Concurrency {
                details: format!("fed {fed} documents but collected {} results", results.len()),
            });
        }

        tracing::info!(
            documents = results.len(),
            wall_time_ms = wall_time.as_millis() as u64,
            "validation pass complete"
        );

        Ok(BatchRun { results, wall_time })
    }

    /// Validate one file with full error detail.
    pub async fn validate_single(&self, path: &Path) -> Result<FileValidationResult> {
        let document = Document::load(path).await?;
        let registry = Arc::clone(&self.registry);

        let result =
            tokio::task::spawn_blocking(move || validate_document(&registry, document, true))
                .await
                .map_err(|e| ValidationError::Concurrency {
                    details: format!("Task join error: {e}"),
                })??;

        if let Some(callback) = &self.status {
            callback(&result);
        }
        Ok(result)
    }

    pub fn revalidator(&self) -> Revalidator {
        Revalidator::new(Arc::clone(&self.registry), self.config.revalidate_limit)
    }

    /// Run the configured job end to end, writing the report to `out`.
    ///
    /// A file input is validated on its own and reported only on failure.
    /// A directory input goes through the concurrent pass, then the summary
    /// is written, then the detailed failure reports.
    pub async fn execute<W: Write>(&self, output: &Output, out: &mut W) -> Result<RunOutcome> {
        let input = &self.config.input_path;
        let metadata = tokio::fs::metadata(input).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ValidationError::PathNotFound {
                path: input.clone(),
            },
            _ => ValidationError::from(e),
        })?;

        if !metadata.is_dir() {
            let result = self.validate_single(input).await?;
            if !result.success {
                writeln!(out, "{}", output.format_failure_detail(&result))?;
            }
            return Ok(RunOutcome::Single(result));
        }

        let paths = self.discover(input).await?;
        tracing::debug!(documents = paths.len(), "feed list ready");

        let batch = self.run_batch(paths).await?;
        let summary = RunSummary::collect(batch.results, batch.wall_time, self.config.workers);
        writeln!(out, "{}", output.format_summary(&summary))?;

        if !summary.failures.is_empty() {
            self.revalidator()
                .run_with(&summary.failures, |report| {
                    writeln!(out, "{}", output.format_failure_header(&report))?;
                    writeln!(out, "{}", output.format_failure_detail(&report.result))?;
                    Ok(())
                })
                .await?;
        }

        Ok(RunOutcome::Batch(summary))
    }
}

fn feeder_count(joined: std::result::Result<Result<usize>, JoinError>) -> Result<usize> {
    joined.map_err(|e| ValidationError::Concurrency {
        details: format!("Feeder task failed: {e}"),
    })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkerCount;
    use serde_json::json;
    use std::collections::HashSet;
    use tempfile::TempDir;

    const SCHEMA: &[u8] = br#"{
        "type": "object",
        "required": ["title"],
        "properties": { "title": { "type": "string" } }
    }"#;

    fn registry() -> Arc<SchemaRegistry> {
        let mut registry = SchemaRegistry::new();
        registry.register("POA", SCHEMA).unwrap();
        registry.register("VOR", SCHEMA).unwrap();
        Arc::new(registry)
    }

    fn write_article(dir: &Path, name: &str, status: &str, valid: bool) -> PathBuf {
        let article = if valid {
            json!({"article": {"status": status, "title": name}})
        } else {
            json!({"article": {"status": status}})
        };
        let path = dir.join(name);
        std::fs::write(&path, article.to_string()).unwrap();
        path
    }

    fn engine(input: &Path, workers: WorkerCount, buffer: usize) -> ValidationEngine {
        let mut config = JobConfig::new("/unused", input);
        config.workers = workers;
        config.buffer_capacity = buffer;
        ValidationEngine::new(registry(), config)
    }

    fn plain_output() -> Output {
        Output::new(crate::cli::VerbosityLevel::Normal).with_colors(false)
    }

    #[test]
    fn test_validate_document() {
        let registry = registry();
        let doc = Document {
            type_tag: "VOR".to_string(),
            source: PathBuf::from("a.json"),
            payload: json!({"status": "vor"}),
        };

        let result = validate_document(&registry, doc.clone(), false).unwrap();
        assert!(!result.success);
        assert!(result.detail.is_none());
        assert_eq!(result.type_tag, "VOR");

        let result = validate_document(&registry, doc, true).unwrap();
        assert_eq!(result.detail.unwrap().schema(), "VOR");
    }

    #[test]
    fn test_unknown_type_tag() {
        let doc = Document {
            type_tag: "XYZ".to_string(),
            source: PathBuf::from("a.json"),
            payload: json!({}),
        };
        let err = validate_document(&registry(), doc, false).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::SchemaNotFound { ref type_tag, .. } if type_tag == "XYZ"
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_batch_results_are_independent_of_concurrency() {
        let temp_dir = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for i in 0..12 {
            let status = if i % 2 == 0 { "poa" } else { "vor" };
            paths.push(write_article(temp_dir.path(), &format!("{i:02}.json"), status, i % 3 != 0));
        }

        let mut expected: Option<HashSet<(PathBuf, bool)>> = None;
        for (workers, buffer) in [
            (WorkerCount::Exact(1), 1),
            (WorkerCount::Exact(4), 2),
            (WorkerCount::Unbounded, 2000),
        ] {
            let engine = engine(temp_dir.path(), workers, buffer);
            let batch = engine.run_batch(paths.clone()).await.unwrap();
            let set: HashSet<(PathBuf, bool)> =
                batch.results.into_iter().map(|r| (r.path, r.success)).collect();
            assert_eq!(set.len(), 12);
            match &expected {
                Some(expected) => assert_eq!(&set, expected),
                None => expected = Some(set),
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unknown_type_aborts_batch() {
        let temp_dir = TempDir::new().unwrap();
        let paths = vec![
            write_article(temp_dir.path(), "b.json", "poa", true),
            write_article(temp_dir.path(), "a.json", "draft", true),
        ];

        let err = engine(temp_dir.path(), WorkerCount::Exact(2), 2)
            .run_batch(paths)
            .await
            .unwrap_err();
        assert!(matches!(err, ValidationError::SchemaNotFound { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_execute_directory_writes_summary_and_reports() {
        let temp_dir = TempDir::new().unwrap();
        write_article(temp_dir.path(), "a.json", "poa", true);
        write_article(temp_dir.path(), "b.json", "vor", false);
        write_article(temp_dir.path(), "c.json", "poa", true);

        let mut out = Vec::new();
        let outcome = engine(temp_dir.path(), WorkerCount::Exact(2), 2)
            .execute(&plain_output(), &mut out)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(!outcome.is_success());
        assert!(text.starts_with("articles:3, failures:1, workers:2, "));
        assert!(text.contains("--- failure 1 of 1: "));
        assert!(text.contains("b.json"));
    }

    #[tokio::test]
    async fn test_execute_single_file() {
        let temp_dir = TempDir::new().unwrap();
        let valid = write_article(temp_dir.path(), "a.json", "vor", true);
        let invalid = write_article(temp_dir.path(), "b.json", "vor", false);

        let mut out = Vec::new();
        let outcome = engine(&valid, WorkerCount::Exact(1), 1)
            .execute(&plain_output(), &mut out)
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert!(out.is_empty());

        let outcome = engine(&invalid, WorkerCount::Exact(1), 1)
            .execute(&plain_output(), &mut out)
            .await
            .unwrap();
        assert!(!outcome.is_success());
        assert!(String::from_utf8(out).unwrap().contains("title"));
    }

    #[tokio::test]
    async fn test_execute_missing_input() {
        let err = engine(Path::new("/nonexistent/articles"), WorkerCount::Exact(1), 1)
            .execute(&plain_output(), &mut Vec::<u8>::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ValidationError::PathNotFound { .. }));
    }
}
