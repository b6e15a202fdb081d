//! Argument parsing, configuration assembly and the run loop.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::warn;
use trollkit_app::{AppError, Pipeline, RunReport};
use trollkit_config::{PipelineConfig, load_from_path};
use trollkit_events::EventBus;
use trollkit_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, TelemetryError, init_logging};

use crate::error::{CliError, CliResult};
use crate::output::render_events;

#[derive(Parser, Debug)]
#[command(
    name = "trollkit",
    version,
    about = "Clone LeviLamina, fetch the Bedrock dedicated server and generate Troll.pdb"
)]
pub(crate) struct Cli {
    /// External symbol list forwarded to the patch tool.
    #[arg(long, env = "TROLLKIT_SYMBOL_LIST")]
    symbol_list: Option<PathBuf>,
    /// Workspace directory; destroyed and recreated on every run.
    #[arg(long, env = "TROLLKIT_WORK_DIR")]
    work_dir: Option<PathBuf>,
    /// YAML file overriding built-in endpoints and file names.
    #[arg(long, env = "TROLLKIT_CONFIG")]
    config: Option<PathBuf>,
    /// Program the patch tool is launched through (e.g. `wine`).
    #[arg(long, env = "TROLLKIT_PATCH_RUNNER")]
    patch_runner: Option<String>,
    /// Log level or filter directive; `RUST_LOG` takes precedence.
    #[arg(long, env = "TROLLKIT_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
    /// Log output format.
    #[arg(long, env = "TROLLKIT_LOG_FORMAT", value_enum, default_value_t = LogFormatArg::Pretty)]
    log_format: LogFormatArg,
    /// Do not draw download progress bars.
    #[arg(long)]
    no_progress: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// Parses CLI arguments, runs the pipeline and reports the outcome.
/// Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    if let Err(err) = init_telemetry(&cli) {
        eprintln!("error: {}", err.display_message());
        return err.exit_code();
    }

    match execute(cli).await {
        Ok(report) => {
            println!("PDB generated at {}", report.artifact.display());
            0
        }
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

fn init_telemetry(cli: &Cli) -> CliResult<()> {
    if cli.log_level.trim().is_empty() {
        return Err(CliError::validation("--log-level must not be empty"));
    }
    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.into(),
    };
    init_logging(&logging).map_err(|err| match err {
        TelemetryError::InvalidFilter { directive, .. } => {
            CliError::validation(format!("invalid log level '{directive}'"))
        }
        other => CliError::failure(other),
    })
}

async fn execute(cli: Cli) -> CliResult<RunReport> {
    let config = build_config(&cli)?;
    let show_progress = !cli.no_progress && io::stdout().is_terminal();

    let events = EventBus::new();
    let renderer = tokio::spawn(render_events(events.subscribe(), show_progress));
    let pipeline = Pipeline::new(config, events)?;
    let result = pipeline.run().await;
    drop(pipeline);

    if let Err(err) = renderer.await {
        warn!(error = %err, "progress renderer stopped unexpectedly");
    }
    Ok(result?)
}

/// Defaults, then the YAML file, then command-line and environment overrides.
fn build_config(cli: &Cli) -> CliResult<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => load_from_path(path).map_err(|source| AppError::Config {
            operation: "config.load",
            source,
        })?,
        None => PipelineConfig::default(),
    };
    if let Some(work_dir) = &cli.work_dir {
        config.work_dir.clone_from(work_dir);
    }
    if let Some(symbol_list) = &cli.symbol_list {
        config.symbol_list = Some(symbol_list.clone());
    }
    if let Some(runner) = &cli.patch_runner {
        if runner.trim().is_empty() {
            return Err(CliError::validation("--patch-runner must not be empty"));
        }
        config.patch.runner = Some(runner.clone());
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("trollkit").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn defaults_apply_without_arguments() -> anyhow::Result<()> {
        let cli = parse(&[]);
        assert_eq!(cli.log_format, LogFormatArg::Pretty);
        assert!(!cli.no_progress);

        let config = build_config(&cli).map_err(|err| anyhow::anyhow!(err.display_message()))?;
        assert_eq!(config, PipelineConfig::default());
        Ok(())
    }

    #[test]
    fn flags_override_configuration_file() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("trollkit.yaml");
        fs::write(&file, "work_dir: from-file\npatch:\n  runner: box64\n")?;
        let file_arg = file.to_string_lossy().into_owned();

        let cli = parse(&[
            "--config",
            &file_arg,
            "--work-dir",
            "from-flag",
            "--patch-runner",
            "wine",
            "--symbol-list",
            "symbols.txt",
        ]);
        let config = build_config(&cli).map_err(|err| anyhow::anyhow!(err.display_message()))?;

        assert_eq!(config.work_dir, PathBuf::from("from-flag"));
        assert_eq!(config.patch.runner.as_deref(), Some("wine"));
        assert_eq!(config.symbol_list, Some(PathBuf::from("symbols.txt")));
        Ok(())
    }

    #[test]
    fn configuration_file_values_survive_without_flags() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("trollkit.yaml");
        fs::write(&file, "work_dir: from-file\n")?;
        let file_arg = file.to_string_lossy().into_owned();

        let config = build_config(&parse(&["--config", &file_arg]))
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;
        assert_eq!(config.work_dir, PathBuf::from("from-file"));
        Ok(())
    }

    #[test]
    fn malformed_configuration_maps_to_argument_exit_code() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("broken.yaml");
        fs::write(&file, "endpoints: [\n")?;
        let file_arg = file.to_string_lossy().into_owned();

        let err = build_config(&parse(&["--config", &file_arg])).expect_err("yaml is invalid");
        assert_eq!(err.exit_code(), 2);
        Ok(())
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let result = Cli::try_parse_from(["trollkit", "--log-format", "xml"]);
        assert!(result.is_err());
    }
}
