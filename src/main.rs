use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use clap::error::ErrorKind;
use tracing_subscriber::EnvFilter;

use validate_article_json::{
    Cli, ConfigManager, ErrorReporter, FileValidationResult, Output, RunOutcome, StatusCallback,
    ValidationEngine, ValidationError, VerbosityLevel,
};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    let reporter = ErrorReporter::new(cli.verbosity());
    match run(&cli).await {
        Ok(outcome) if outcome.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            reporter.report(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<RunOutcome, ValidationError> {
    let config = ConfigManager::load_config(cli).await?;

    let verbosity = if cli.verbose > 1 {
        VerbosityLevel::Debug
    } else if config.output.quiet {
        VerbosityLevel::Quiet
    } else if config.output.verbose {
        VerbosityLevel::Verbose
    } else {
        VerbosityLevel::Normal
    };

    let job = ConfigManager::job_config(config, cli.article_json.as_deref())?;
    tracing::debug!(?job, "job configuration resolved");

    let print_status = job.print_status;
    let output = Arc::new(Output::new(verbosity));
    let mut engine = ValidationEngine::from_config(job).await?;
    tracing::info!(schemas = ?engine.registry().labels(), "schemas compiled");

    if print_status {
        let status_output = Arc::clone(&output);
        let callback: StatusCallback = Arc::new(move |result: &FileValidationResult| {
            eprintln!("{}", status_output.format_status_line(result));
        });
        engine = engine.with_status_callback(callback);
    }

    let mut stdout = std::io::stdout();
    engine.execute(&output, &mut stdout).await
}
