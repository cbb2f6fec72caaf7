//! CLI command definitions and execution
//!
//! `run` is the default command: invoking the binary with no subcommand
//! performs the walkthrough.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use bw_core::ConfigManager;

use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

mod config;
mod run;

/// bucketwalk - object storage walkthrough
///
/// Creates two buckets, moves files through upload, download, copy, ACL,
/// encryption, storage class and versioning operations, then deletes
/// everything it created.
#[derive(Parser, Debug)]
#[command(name = "bucketwalk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (default: <config dir>/bucketwalk/config.toml)
    #[arg(long, global = true, env = "BUCKETWALK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the walkthrough (default)
    Run(run::RunArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    };

    let manager = match config_manager(cli.config) {
        Ok(manager) => manager,
        Err(e) => {
            crate::output::Formatter::new(output_config).error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };

    match cli.command {
        None => run::execute(run::RunArgs::default(), &manager, output_config).await,
        Some(Commands::Run(args)) => run::execute(args, &manager, output_config).await,
        Some(Commands::Config(cmd)) => config::execute(cmd, &manager, output_config),
    }
}

fn config_manager(path: Option<PathBuf>) -> bw_core::Result<ConfigManager> {
    match path {
        Some(path) => Ok(ConfigManager::with_path(path)),
        None => ConfigManager::new(),
    }
}
