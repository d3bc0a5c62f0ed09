use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only the summary and failures
    Quiet,
    /// Per-document status lines as well
    #[default]
    Normal,
    /// Show detailed information
    Verbose,
    /// Show all available debugging information
    Debug,
}

/// Validate a corpus of article-json files against the api-raml schemas
#[derive(Parser, Debug, Clone)]
#[command(name = "validate-article-json")]
#[command(about = "Validate article-json files against their api-raml schemas, concurrently")]
#[command(version)]
pub struct Cli {
    /// Path to the api-raml schema root
    #[arg(long = "schema-root")]
    pub schema_root: Option<PathBuf>,

    /// Path to an article-json file or a directory of article-json files
    #[arg(long = "article-json")]
    pub article_json: Option<PathBuf>,

    /// Number of article-json files to validate, -1 for all [default: -1]
    #[arg(long = "sample-size", allow_negative_numbers = true)]
    pub sample_size: Option<i64>,

    /// Number of concurrent validations, 0 for one per CPU, -1 for unbounded [default: 0]
    #[arg(long = "num-workers", allow_negative_numbers = true)]
    pub num_workers: Option<i64>,

    /// Maximum number of article-json files to keep in memory at once [default: 2000]
    #[arg(long = "buffer-size", allow_negative_numbers = true)]
    pub buffer_size: Option<i64>,

    /// Number of failures re-validated with full error detail [default: 25]
    #[arg(long = "revalidate-limit")]
    pub revalidate_limit: Option<usize>,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Verbose output, repeat for debug detail
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode, no per-document status lines
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else {
            match self.verbose {
                0 => VerbosityLevel::Normal,
                1 => VerbosityLevel::Verbose,
                _ => VerbosityLevel::Debug,
            }
        }
    }
}
