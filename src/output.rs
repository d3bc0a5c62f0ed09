//! Output formatting for status lines, the run summary and failure reports.

use crate::cli::VerbosityLevel;
use crate::revalidator::Revalidation;
use crate::summary::RunSummary;
use crate::validator::FileValidationResult;

/// Human-readable formatter for everything a run prints
///
/// Colour applies to status lines only, which go to stderr. The summary and
/// failure reports are written to stdout and stay plain.
pub struct Output {
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_colors: atty::is(atty::Stream::Stderr),
        }
    }

    pub fn with_colors(mut self, show_colors: bool) -> Self {
        self.show_colors = show_colors;
        self
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    /// `"<TypeTag> <valid|invalid> in <ms>ms: <path>"`
    pub fn format_status_line(&self, result: &FileValidationResult) -> String {
        let status = if result.success {
            self.colorize("valid", "32")
        } else {
            self.colorize("invalid", "31")
        };
        format!(
            "{} {} in {}ms: {}",
            result.type_tag,
            status,
            result.elapsed_ms(),
            result.path.display()
        )
    }

    pub fn format_summary(&self, summary: &RunSummary) -> String {
        let average = match summary.average_ms {
            Some(ms) => format!("{ms}ms"),
            None => "n/a".to_string(),
        };
        format!(
            "articles:{}, failures:{}, workers:{}, wall-time:{}, cpu-time:{}, average:{}",
            summary.total,
            summary.failure_count,
            summary.workers,
            format_ms(summary.wall_time_ms),
            format_ms(summary.cpu_time_ms),
            average
        )
    }

    /// `"--- failure <i> of <F>: <path>"`
    pub fn format_failure_header(&self, report: &Revalidation) -> String {
        format!(
            "--- failure {} of {}: {}",
            report.index,
            report.total,
            report.result.path.display()
        )
    }

    /// The structured errors of a failed result, one violation per line.
    ///
    /// Verbose output adds the schema location of each violation.
    pub fn format_failure_detail(&self, result: &FileValidationResult) -> String {
        match &result.detail {
            Some(detail) if self.verbosity >= VerbosityLevel::Verbose => detail.detailed(),
            Some(detail) => detail.to_string(),
            None if result.success => "  (valid on revalidation)".to_string(),
            None => "  (no error detail captured)".to_string(),
        }
    }
}

/// Render milliseconds as `Nms` under a second, `Ns` under a minute, else `Nm`.
pub fn format_ms(ms: u64) -> String {
    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{}s", ms / 1_000)
    } else {
        format!("{}m", ms / 60_000)
    }
}
