//! Configuration file commands
//!
//! `config init` writes a starting configuration, `config show` prints the
//! effective one with the secret key masked.

use std::fmt;
use std::path::PathBuf;

use clap::Subcommand;
use serde::Serialize;

use bw_core::{Config, ConfigManager, Error};

use super::run::BackendArg;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

const REDACTED: &str = "********";

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a new configuration file
    Init(InitArgs),

    /// Print the effective configuration
    Show,
}

/// Arguments for the `config init` command
#[derive(clap::Args, Debug, Default)]
pub struct InitArgs {
    /// Storage backend
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    /// Session region
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3 endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Access key ID
    #[arg(long, requires = "secret_key")]
    pub access_key: Option<String>,

    /// Secret access key
    #[arg(long, requires = "access_key")]
    pub secret_key: Option<String>,

    /// Use path-style bucket addressing
    #[arg(long)]
    pub force_path_style: bool,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    fn into_config(self) -> Config {
        let mut config = Config::default();
        if let Some(backend) = self.backend {
            config.connection.backend = backend.into();
        }
        config.connection.region = self.region;
        config.connection.endpoint = self.endpoint;
        config.connection.access_key = self.access_key;
        config.connection.secret_key = self.secret_key;
        config.connection.force_path_style = self.force_path_style;
        config
    }
}

/// JSON output for config operations
#[derive(Serialize)]
struct ConfigOperationOutput {
    success: bool,
    path: PathBuf,
    message: String,
}

/// The effective configuration as printed by `config show`
#[derive(Serialize)]
struct ConfigView {
    path: PathBuf,
    exists: bool,
    config: Config,
}

impl ConfigView {
    fn new(manager: &ConfigManager, mut config: Config) -> Self {
        if config.connection.secret_key.is_some() {
            config.connection.secret_key = Some(REDACTED.to_string());
        }
        Self {
            path: manager.config_path().to_path_buf(),
            exists: manager.config_path().exists(),
            config,
        }
    }
}

impl fmt::Display for ConfigView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.exists { "" } else { " (not found, defaults)" };
        writeln!(f, "# {}{state}", self.path.display())?;
        let body = toml::to_string_pretty(&self.config).map_err(|_| fmt::Error)?;
        write!(f, "{}", body.trim_end())
    }
}

/// Execute a config subcommand
pub fn execute(cmd: ConfigCommands, manager: &ConfigManager, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let result = match cmd {
        ConfigCommands::Init(args) => execute_init(args, manager, &formatter),
        ConfigCommands::Show => execute_show(manager, &formatter),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from_error(&e)
        }
    }
}

fn execute_init(args: InitArgs, manager: &ConfigManager, formatter: &Formatter) -> bw_core::Result<ExitCode> {
    let path = manager.config_path().to_path_buf();
    if path.exists() && !args.force {
        return Err(Error::Conflict(format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        )));
    }

    let config = args.into_config();
    config.validate()?;
    manager.save(&config)?;
    tracing::debug!(path = %path.display(), "configuration written");

    if formatter.is_json() {
        formatter.json(&ConfigOperationOutput {
            success: true,
            message: format!("Configuration written to {}", path.display()),
            path,
        });
    } else {
        formatter.success(&format!("Configuration written to {}", path.display()));
    }
    Ok(ExitCode::Success)
}

fn execute_show(manager: &ConfigManager, formatter: &Formatter) -> bw_core::Result<ExitCode> {
    let config = manager.load()?;
    formatter.output(&ConfigView::new(manager, config));
    Ok(ExitCode::Success)
}
