//! The walkthrough command
//!
//! Loads the configuration, builds the object store for the configured
//! backend, and drives the scripted sequence with the formatter as the trace.

use std::path::PathBuf;
use std::sync::Arc;

use bw_core::{
    Backend, Config, ConfigManager, ConnectionConfig, MemoryStore, ObjectStore, Resource,
    Walkthrough,
};
use bw_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Backend selectable on the command line
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendArg {
    S3,
    Memory,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::S3 => Backend::S3,
            BackendArg::Memory => Backend::Memory,
        }
    }
}

/// Arguments for the `run` command
///
/// Each flag overrides the matching value from the configuration file.
#[derive(clap::Args, Debug, Default)]
pub struct RunArgs {
    /// Storage backend
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    /// Session region
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3 endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Directory the generated files are written to
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Directory the downloaded file is written to
    #[arg(long)]
    pub download_dir: Option<PathBuf>,
}

impl RunArgs {
    fn apply(self, config: &mut Config) {
        if let Some(backend) = self.backend {
            config.connection.backend = backend.into();
        }
        if let Some(region) = self.region {
            config.connection.region = Some(region);
        }
        if let Some(endpoint) = self.endpoint {
            config.connection.endpoint = Some(endpoint);
        }
        if let Some(work_dir) = self.work_dir {
            config.walkthrough.work_dir = work_dir;
        }
        if let Some(download_dir) = self.download_dir {
            config.walkthrough.download_dir = Some(download_dir);
        }
    }
}

/// Build the operation handle for the configured backend
async fn build_store(connection: &ConnectionConfig) -> bw_core::Result<Arc<dyn ObjectStore>> {
    match connection.backend {
        Backend::S3 => Ok(Arc::new(S3Client::new(connection).await?)),
        Backend::Memory => {
            let store = match &connection.owner_id {
                Some(owner) => MemoryStore::with_owner(connection.region.clone(), owner),
                None => MemoryStore::new(connection.region.clone()),
            };
            Ok(Arc::new(store))
        }
    }
}

fn load_config(args: RunArgs, manager: &ConfigManager) -> bw_core::Result<Config> {
    let mut config = manager.load()?;
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Execute the walkthrough
///
/// Step failures are reported in the trace and do not affect the exit code.
pub async fn execute(args: RunArgs, manager: &ConfigManager, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let config = match load_config(args, manager) {
        Ok(config) => config,
        Err(e) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let store = match build_store(&config.connection).await {
        Ok(store) => store,
        Err(e) => {
            formatter.error(&format!("Failed to create client: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    tracing::info!(
        backend = ?config.connection.backend,
        region = ?store.region(),
        work_dir = %config.walkthrough.work_dir.display(),
        "starting walkthrough"
    );

    let walkthrough = Walkthrough::new(Resource::new(store), config.walkthrough, &formatter);
    let report = tokio::select! {
        report = walkthrough.run() => report,
        _ = tokio::signal::ctrl_c() => {
            formatter.error("Interrupted; buckets created so far were not deleted");
            return ExitCode::Interrupted;
        }
    };

    if formatter.is_json() {
        formatter.json(&report);
    } else if report.failures() > 0 {
        formatter.warning(&format!(
            "{} of {} steps failed",
            report.failures(),
            report.steps.len()
        ));
    }

    ExitCode::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        let args = RunArgs {
            backend: Some(BackendArg::Memory),
            region: Some("eu-west-1".into()),
            work_dir: Some(PathBuf::from("/tmp/work")),
            ..Default::default()
        };
        args.apply(&mut config);

        assert_eq!(config.connection.backend, Backend::Memory);
        assert_eq!(config.connection.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.walkthrough.work_dir, PathBuf::from("/tmp/work"));
        assert!(config.connection.endpoint.is_none());
    }

    #[test]
    fn test_load_config_validates_overrides() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.toml"));
        let args = RunArgs {
            endpoint: Some("ftp://example.com".into()),
            ..Default::default()
        };
        let err = load_config(args, &manager).unwrap_err();
        assert_eq!(ExitCode::from_error(&err), ExitCode::UsageError);
    }

    #[tokio::test]
    async fn test_memory_backend_uses_configured_owner() {
        let mut connection = ConnectionConfig::memory("us-west-2");
        connection.owner_id = Some("walker".into());
        let store = build_store(&connection).await.unwrap();
        assert_eq!(store.region().as_deref(), Some("us-west-2"));
    }

    #[tokio::test]
    async fn test_run_against_memory_backend_succeeds() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.toml"));
        let args = RunArgs {
            backend: Some(BackendArg::Memory),
            region: Some("us-west-2".into()),
            work_dir: Some(dir.path().to_path_buf()),
            download_dir: Some(dir.path().join("downloads")),
            ..Default::default()
        };
        let output = OutputConfig {
            quiet: true,
            ..Default::default()
        };
        assert_eq!(execute(args, &manager, output).await, ExitCode::Success);
    }
}
