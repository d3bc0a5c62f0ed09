//! Sequential second pass over failures
//!
//! The concurrent pass keeps only pass/fail to stay lean. For the first few
//! failures the document is loaded again and validated on its own, this time
//! keeping the full error detail.

use std::sync::Arc;

use crate::document::Document;
use crate::error::Result;
use crate::schema_registry::SchemaRegistry;
use crate::validator::{FileValidationResult, validate_document};

/// One detailed report
#[derive(Debug, Clone)]
pub struct Revalidation {
    /// 1-based position among the failures
    pub index: usize,
    /// Total number of failures in the pass, not just the revalidated ones
    pub total: usize,
    pub result: FileValidationResult,
}

pub struct Revalidator {
    registry: Arc<SchemaRegistry>,
    limit: usize,
}

impl Revalidator {
    pub fn new(registry: Arc<SchemaRegistry>, limit: usize) -> Self {
        Self { registry, limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Revalidate `failures[..min(limit, len)]`, in order, one at a time.
    pub async fn run(&self, failures: &[FileValidationResult]) -> Result<Vec<Revalidation>> {
        let mut reports = Vec::new();
        self.run_with(failures, |report| {
            reports.push(report);
            Ok(())
        })
        .await?;
        Ok(reports)
    }

    /// As [`run`](Self::run), handing each report over as soon as it exists.
    pub async fn run_with<F>(
        &self,
        failures: &[FileValidationResult],
        mut on_report: F,
    ) -> Result<()>
    where
        F: FnMut(Revalidation) -> Result<()>,
    {
        let total = failures.len();
        let count = self.limit.min(total);

        for (i, failure) in failures.iter().take(count).enumerate() {
            tracing::debug!(path = %failure.path.display(), "revalidating");

            let document = Document::load(&failure.path).await?;
            let result = validate_document(&self.registry, document, true)?;
            if result.success {
                tracing::warn!(
                    path = %result.path.display(),
                    "document passed on revalidation, it may have changed since the first pass"
                );
            }

            on_report(Revalidation {
                index: i + 1,
                total,
                result,
            })?;
        }

        Ok(())
    }
}
