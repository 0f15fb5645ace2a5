mod file_config;

pub use file_config::FileConfig;

use anyhow::{bail, Result};
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub base_url: Option<String>,
    pub flow_path: Option<PathBuf>,
    pub timeout_sec: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub base_url: String,
    pub flow_path: PathBuf,
    pub timeout_sec: Option<u64>,
}

impl RunnerConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let base_url = file
            .base_url
            .or_else(|| cli.base_url.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("base_url must be specified via --base-url or in config file")
            })?;

        let flow_path = file
            .flow_path
            .map(PathBuf::from)
            .or_else(|| cli.flow_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("flow_path must be specified via --flow or in config file")
            })?;

        // Validate flow document exists
        if !flow_path.exists() {
            bail!("Flow document does not exist: {:?}", flow_path);
        }
        if !flow_path.is_file() {
            bail!("flow_path is not a file: {:?}", flow_path);
        }

        let timeout_sec = file.timeout_sec.or(cli.timeout_sec);
        if timeout_sec == Some(0) {
            bail!("timeout_sec must be greater than zero");
        }

        Ok(Self {
            base_url,
            flow_path,
            timeout_sec,
        })
    }
}
