use anyhow::{bail, Context, Result};
use clap::Parser;
use flow_runner::config::{CliConfig, FileConfig, RunnerConfig};
use flow_runner::flow::{FlowRunner, Session};
use flow_runner::suite::FlowDocument;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the flow document to run.
    #[clap(value_parser = parse_path)]
    pub flow: Option<PathBuf>,

    /// Base URL of the API under test.
    #[clap(long)]
    pub base_url: Option<String>,

    /// Timeout in seconds for each request. Defaults to the transport's own.
    #[clap(long)]
    pub timeout_sec: Option<u64>,

    /// Path to a TOML config file; its values override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    info!("flow-runner {} starting", env!("GIT_HASH"));

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;

    let cli_config = CliConfig {
        base_url: cli_args.base_url,
        flow_path: cli_args.flow,
        timeout_sec: cli_args.timeout_sec,
    };
    let config = RunnerConfig::resolve(&cli_config, file_config)?;

    let document = FlowDocument::load_from_path(&config.flow_path)?;
    info!(
        "Running flow '{}' ({} steps) against {}",
        document.name,
        document.steps.len(),
        config.base_url
    );

    let mut runner = FlowRunner::new(config.base_url);
    if let Some(timeout_sec) = config.timeout_sec {
        runner = runner.with_timeout(Duration::from_secs(timeout_sec));
    }

    // Steps can reference {runId} to register a unique client per run.
    let mut session = Session::new();
    session.set("runId", json!(uuid::Uuid::new_v4().simple().to_string()));

    let results = runner.run_with_session(&document.steps, session).await;

    let failed = results.iter().filter(|result| !result.passed).count();
    for result in &results {
        if !result.passed {
            warn!(
                "step '{}': {}",
                result.name,
                serde_json::to_string(&result.failures)?
            );
        }
    }

    if failed > 0 {
        bail!("{} of {} steps failed", failed, results.len());
    }
    info!("All {} steps passed", results.len());
    Ok(())
}
