use crate::cli::VerbosityLevel;
use crate::error::ValidationError;

/// Reports fatal errors on stderr with configurable verbosity
pub struct ErrorReporter {
    verbosity: VerbosityLevel,
    show_timestamps: bool,
}

impl ErrorReporter {
    /// Create a new error reporter with specified verbosity
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_timestamps: verbosity == VerbosityLevel::Debug,
        }
    }

    pub fn with_timestamps(mut self, show_timestamps: bool) -> Self {
        self.show_timestamps = show_timestamps;
        self
    }

    /// Report an error that ended the run
    pub fn report(&self, error: &ValidationError) {
        tracing::error!(error = %error, "run aborted");
        eprintln!("{}", self.format_error(error));
    }

    pub fn format_error(&self, error: &ValidationError) -> String {
        match self.verbosity {
            VerbosityLevel::Quiet => self.format_error_brief(error),
            VerbosityLevel::Normal => self.format_error_normal(error),
            VerbosityLevel::Verbose => self.format_error_verbose(error),
            VerbosityLevel::Debug => self.format_error_debug(error),
        }
    }

    /// Format error for brief output (quiet mode)
    fn format_error_brief(&self, error: &ValidationError) -> String {
        match error {
            ValidationError::SchemaNotFound { type_tag, path } => {
                format!("SCHEMA NOT FOUND: {} ({})", type_tag, path.display())
            }
            ValidationError::MalformedDocument { path, .. }
            | ValidationError::Json { path, .. } => {
                format!("BAD DOCUMENT: {}", path.display())
            }
            _ => format!("ERROR: {}", error),
        }
    }

    /// Format error for normal output
    fn format_error_normal(&self, error: &ValidationError) -> String {
        let timestamp = if self.show_timestamps {
            format!("[{}] ", chrono::Utc::now().format("%H:%M:%S"))
        } else {
            String::new()
        };

        format!("{}{}", timestamp, error)
    }

    /// Format error for verbose output
    fn format_error_verbose(&self, error: &ValidationError) -> String {
        let mut output = self.format_error_normal(error);
        if let Some(suggestion) = self.suggestion(error) {
            output.push_str("\nSuggestion: ");
            output.push_str(&suggestion);
        }
        output
    }

    /// Format error for debug output
    fn format_error_debug(&self, error: &ValidationError) -> String {
        let mut output = self.format_error_verbose(error);
        output.push_str(&format!("\nDebug Info: {:?}", error));

        output.push_str("\nError Chain:");
        let mut current_error: &dyn std::error::Error = error;
        let mut level = 0;
        while let Some(source) = current_error.source() {
            output.push_str(&format!("\n  {}: {}", level + 1, source));
            current_error = source;
            level += 1;
        }

        output
    }

    fn suggestion(&self, error: &ValidationError) -> Option<String> {
        match error {
            ValidationError::SchemaNotFound { type_tag, .. } => Some(format!(
                "Add a schema labelled '{}' to the [[schemas]] configuration",
                type_tag
            )),
            ValidationError::SchemaRead { .. } | ValidationError::PathNotFound { .. } => Some(
                "--schema-root should be the path to the api-raml checkout, \
                 --article-json a file or directory of article-json"
                    .to_string(),
            ),
            ValidationError::SchemaPatch { pointer, .. } => Some(format!(
                "The schema no longer has a value at '{}', update or remove the patch",
                pointer
            )),
            ValidationError::MalformedDocument { field, .. } => Some(format!(
                "Every article-json document needs an '{}' field",
                field
            )),
            ValidationError::Json { .. } => {
                Some("Check the document is well-formed JSON".to_string())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn not_found() -> ValidationError {
        ValidationError::SchemaNotFound {
            type_tag: "RETRACTED".to_string(),
            path: PathBuf::from("a.json"),
        }
    }

    #[test]
    fn test_verbosity_levels() {
        let quiet = ErrorReporter::new(VerbosityLevel::Quiet).format_error(&not_found());
        assert_eq!(quiet, "SCHEMA NOT FOUND: RETRACTED (a.json)");

        let normal = ErrorReporter::new(VerbosityLevel::Normal).format_error(&not_found());
        assert_eq!(normal, not_found().to_string());

        let verbose = ErrorReporter::new(VerbosityLevel::Verbose).format_error(&not_found());
        assert!(verbose.contains("Suggestion: Add a schema labelled 'RETRACTED'"));
    }

    #[test]
    fn test_debug_includes_source_chain() {
        let error = ValidationError::SchemaRead {
            label: "POA".to_string(),
            path: PathBuf::from("/schemas/article-poa.v3.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "File not found"),
        };

        let debug = ErrorReporter::new(VerbosityLevel::Debug)
            .with_timestamps(false)
            .format_error(&error);
        assert!(debug.contains("Error Chain:\n  1: File not found"));
        assert!(debug.contains("Debug Info: SchemaRead"));
    }

    #[test]
    fn test_timestamps() {
        let line = ErrorReporter::new(VerbosityLevel::Normal)
            .with_timestamps(true)
            .format_error(&ValidationError::Config("bad".to_string()));
        assert!(line.starts_with('['));
        assert!(line.ends_with("Configuration error: bad"));
    }
}
