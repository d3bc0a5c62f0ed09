use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::cli::Cli;
use crate::error::{ConfigError, ConfigResult as Result};
use crate::schema_registry::SchemaSpec;

const CONFIG_DIR_NAME: &str = "validate-article-json";

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// How many of the eligible files to validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleSize {
    /// Everything left after filtering
    All,
    /// At most this many files, `n >= 1`
    Limit(usize),
}

impl SampleSize {
    /// `-1` means all; any other value must be positive.
    pub fn from_raw(raw: i64) -> Result<Self> {
        match raw {
            -1 => Ok(SampleSize::All),
            n if n >= 1 => Ok(SampleSize::Limit(n as usize)),
            n => Err(ConfigError::InvalidValue {
                field: "sample_size".to_string(),
                value: n.to_string(),
                reason: "must be -1 or a value greater than 0".to_string(),
            }),
        }
    }

    /// Number of files actually taken when `available` are eligible.
    pub fn resolve(self, available: usize) -> usize {
        match self {
            SampleSize::All => available,
            SampleSize::Limit(n) => n.min(available),
        }
    }
}

/// Number of concurrent validations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerCount {
    /// One per available CPU, resolved at startup
    Auto,
    /// One task per document, no limit
    Unbounded,
    /// Exactly this many, `n >= 1`
    Exact(usize),
}

impl WorkerCount {
    /// Largest exact count a worker pool can hold permits for.
    pub const MAX: usize = Semaphore::MAX_PERMITS;

    /// `0` means auto, `-1` means unbounded, anything positive is exact.
    pub fn from_raw(raw: i64) -> Result<Self> {
        match raw {
            0 => Ok(WorkerCount::Auto),
            -1 => Ok(WorkerCount::Unbounded),
            n if n >= 1 => match usize::try_from(n) {
                Ok(n) if n <= Self::MAX => Ok(WorkerCount::Exact(n)),
                _ => Err(ConfigError::InvalidValue {
                    field: "num_workers".to_string(),
                    value: n.to_string(),
                    reason: format!("must not exceed {}", Self::MAX),
                }),
            },
            n => Err(ConfigError::InvalidValue {
                field: "num_workers".to_string(),
                value: n.to_string(),
                reason: "must be -1 or greater".to_string(),
            }),
        }
    }

    /// Replace `Auto` with the host's available parallelism.
    pub fn resolve(self) -> Self {
        match self {
            WorkerCount::Auto => WorkerCount::Exact(num_cpus::get().max(1)),
            other => other,
        }
    }

    /// Concurrency bound, `None` when unbounded.
    pub fn limit(self) -> Option<usize> {
        match self.resolve() {
            WorkerCount::Exact(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for WorkerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerCount::Auto => write!(f, "auto"),
            WorkerCount::Unbounded => write!(f, "unbounded"),
            WorkerCount::Exact(n) => write!(f, "{n}"),
        }
    }
}

/// Immutable settings for one run, produced by [`ConfigManager::job_config`].
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    pub schema_root: PathBuf,
    /// An article-json file or a directory of them
    pub input_path: PathBuf,
    pub schemas: Vec<SchemaSpec>,
    pub extensions: Vec<String>,
    pub sample_size: SampleSize,
    /// Never `Auto` once resolved
    pub workers: WorkerCount,
    /// Maximum number of decoded documents held in memory at once
    pub buffer_capacity: usize,
    /// Keep structured error detail on every failed result
    pub capture_errors: bool,
    /// Print a status line as each document finishes
    pub print_status: bool,
    /// Failures re-run with full detail after the main pass
    pub revalidate_limit: usize,
}

impl JobConfig {
    /// A job with default tuning for the given paths.
    pub fn new(schema_root: impl Into<PathBuf>, input_path: impl Into<PathBuf>) -> Self {
        let job = JobSection::default();
        Self {
            schema_root: schema_root.into(),
            input_path: input_path.into(),
            schemas: SchemaSpec::defaults(),
            extensions: job.extensions,
            sample_size: SampleSize::All,
            workers: WorkerCount::Auto.resolve(),
            buffer_capacity: job.buffer_size as usize,
            capture_errors: false,
            print_status: true,
            revalidate_limit: job.revalidate_limit,
        }
    }
}

/// Main application configuration, as read from a file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub job: JobSection,
    pub output: OutputConfig,
    pub schemas: Vec<SchemaSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            job: JobSection::default(),
            output: OutputConfig::default(),
            schemas: SchemaSpec::defaults(),
        }
    }
}

/// Pipeline settings, in their raw (pre-validation) form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JobSection {
    /// Path to the api-raml schema root
    pub schema_root: Option<PathBuf>,
    /// -1 for all files
    pub sample_size: i64,
    /// 0 for one per CPU, -1 for unbounded
    pub num_workers: i64,
    /// Documents kept in memory at once; 1k articles is about ~1.5GiB of RAM
    pub buffer_size: i64,
    pub revalidate_limit: usize,
    pub extensions: Vec<String>,
}

impl Default for JobSection {
    fn default() -> Self {
        Self {
            schema_root: None,
            sample_size: -1,
            num_workers: 0,
            buffer_size: 2000,
            revalidate_limit: 25,
            extensions: vec!["json".to_string()],
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Quiet mode (summary and failures only)
    pub quiet: bool,
    pub verbose: bool,
    /// Per-document status lines
    pub show_status: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quiet: false,
            verbose: false,
            show_status: true,
        }
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        let mut config = match &cli.config {
            Some(config_path) => Self::load_from_file(config_path).await?,
            None => Self::find_config_file().await?.unwrap_or_default(),
        };

        config = Self::apply_environment_overrides(config)?;
        config = Self::merge_with_cli(config, cli);

        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find configuration file in standard locations
    pub async fn find_config_file() -> Result<Option<Config>> {
        let config_names = [
            "validate-article-json.toml",
            "validate-article-json.json",
            ".validate-article-json.toml",
            ".validate-article-json.json",
        ];

        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                tracing::debug!(path = %path.display(), "using configuration file");
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join(CONFIG_DIR_NAME);
            for name in &config_names {
                let path = app_config_dir.join(name);
                if path.exists() {
                    tracing::debug!(path = %path.display(), "using configuration file");
                    return Ok(Some(Self::load_from_file(&path).await?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: Config) -> Result<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        if let Some(schema_root) = env.get("VAJ_SCHEMA_ROOT") {
            config.job.schema_root = Some(PathBuf::from(schema_root));
        }

        if let Some(value) = env.get("VAJ_SAMPLE_SIZE") {
            config.job.sample_size = parse_env("VAJ_SAMPLE_SIZE", &value)?;
        }

        if let Some(value) = env.get("VAJ_NUM_WORKERS") {
            config.job.num_workers = parse_env("VAJ_NUM_WORKERS", &value)?;
        }

        if let Some(value) = env.get("VAJ_BUFFER_SIZE") {
            config.job.buffer_size = parse_env("VAJ_BUFFER_SIZE", &value)?;
        }

        if let Some(value) = env.get("VAJ_REVALIDATE_LIMIT") {
            config.job.revalidate_limit = parse_env("VAJ_REVALIDATE_LIMIT", &value)?;
        }

        if let Some(extensions) = env.get("VAJ_EXTENSIONS") {
            config.job.extensions = extensions
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(value) = env.get("VAJ_QUIET") {
            config.output.quiet = parse_env("VAJ_QUIET", &value)?;
        }

        if let Some(value) = env.get("VAJ_VERBOSE") {
            config.output.verbose = parse_env("VAJ_VERBOSE", &value)?;
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration. Only flags that were given win.
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        if let Some(schema_root) = &cli.schema_root {
            config.job.schema_root = Some(schema_root.clone());
        }
        if let Some(sample_size) = cli.sample_size {
            config.job.sample_size = sample_size;
        }
        if let Some(num_workers) = cli.num_workers {
            config.job.num_workers = num_workers;
        }
        if let Some(buffer_size) = cli.buffer_size {
            config.job.buffer_size = buffer_size;
        }
        if let Some(limit) = cli.revalidate_limit {
            config.job.revalidate_limit = limit;
        }

        if cli.quiet {
            config.output.quiet = true;
        }
        if cli.verbose > 0 {
            config.output.verbose = true;
        }

        config
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        SampleSize::from_raw(config.job.sample_size)?;
        WorkerCount::from_raw(config.job.num_workers)?;

        if config.job.buffer_size < 1 {
            return Err(ConfigError::InvalidValue {
                field: "buffer_size".to_string(),
                value: config.job.buffer_size.to_string(),
                reason: "must be a positive integer".to_string(),
            });
        }

        if config.job.extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "extensions".to_string(),
                value: "[]".to_string(),
                reason: "at least one file extension must be specified".to_string(),
            });
        }

        if config.schemas.is_empty() {
            return Err(ConfigError::MissingField {
                field: "schemas".to_string(),
            });
        }

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::InvalidValue {
                field: "output".to_string(),
                value: "verbose + quiet".to_string(),
                reason: "cannot enable both verbose and quiet modes".to_string(),
            });
        }

        Ok(())
    }

    /// Resolve a validated configuration into the settings for one run.
    pub fn job_config(config: Config, input_path: Option<&Path>) -> Result<JobConfig> {
        Self::validate_config(&config)?;

        let schema_root = config
            .job
            .schema_root
            .ok_or_else(|| ConfigError::MissingField {
                field: "schema_root (--schema-root)".to_string(),
            })?;
        let input_path = input_path
            .map(Path::to_path_buf)
            .ok_or_else(|| ConfigError::MissingField {
                field: "article_json (--article-json)".to_string(),
            })?;

        Ok(JobConfig {
            schema_root,
            input_path,
            schemas: config.schemas,
            extensions: config.job.extensions,
            sample_size: SampleSize::from_raw(config.job.sample_size)?,
            workers: WorkerCount::from_raw(config.job.num_workers)?.resolve(),
            buffer_capacity: config.job.buffer_size as usize,
            capture_errors: false,
            print_status: config.output.show_status && !config.output.quiet,
            revalidate_limit: config.job.revalidate_limit,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Environment(format!("Invalid {key} value: {value}")))
}
