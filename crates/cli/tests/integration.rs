//! Integration tests against a live S3-compatible service
//!
//! Run with:
//! ```bash
//! # Start a local S3-compatible server, e.g. RustFS
//! docker run -d --name rustfs -p 9000:9000 \
//!     -e RUSTFS_ACCESS_KEY=accesskey \
//!     -e RUSTFS_SECRET_KEY=secretkey \
//!     rustfs/rustfs:latest
//!
//! TEST_S3_ENDPOINT=http://localhost:9000 \
//! TEST_S3_ACCESS_KEY=accesskey \
//! TEST_S3_SECRET_KEY=secretkey \
//!     cargo test -p bucketwalk --features integration
//! ```

#![cfg(feature = "integration")]

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Get S3 test configuration from environment
fn get_test_config() -> Option<(String, String, String)> {
    let endpoint = std::env::var("TEST_S3_ENDPOINT").ok()?;
    let access_key = std::env::var("TEST_S3_ACCESS_KEY").ok()?;
    let secret_key = std::env::var("TEST_S3_SECRET_KEY").ok()?;
    Some((endpoint, access_key, secret_key))
}

fn run_bucketwalk(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bucketwalk"))
        .args(args)
        .env_remove("BUCKETWALK_CONFIG")
        .output()
        .expect("Failed to execute bucketwalk")
}

/// Test helper: write a config for the live service into `dir`
fn setup_config(dir: &Path) -> Option<String> {
    let (endpoint, access_key, secret_key) = get_test_config()?;
    let region = std::env::var("TEST_S3_REGION").unwrap_or_else(|_| "us-east-1".to_string());
    let path = dir.join("config.toml").to_string_lossy().to_string();

    let output = run_bucketwalk(&[
        "config",
        "init",
        "--config",
        &path,
        "--backend",
        "s3",
        "--region",
        &region,
        "--endpoint",
        &endpoint,
        "--access-key",
        &access_key,
        "--secret-key",
        &secret_key,
        "--force-path-style",
    ]);

    if !output.status.success() {
        eprintln!(
            "Failed to write config: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        return None;
    }

    Some(path)
}

#[test]
fn test_walkthrough_against_live_service() {
    let dir = TempDir::new().unwrap();
    let Some(config) = setup_config(dir.path()) else {
        eprintln!("Skipping: S3 test config not available");
        return;
    };
    let work_dir = dir.path().to_string_lossy().to_string();

    let output = run_bucketwalk(&[
        "run",
        "--config",
        &config,
        "--work-dir",
        &work_dir,
        "--download-dir",
        &work_dir,
        "--json",
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let steps = report["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 27);

    for step in [
        "create_first_bucket",
        "create_second_bucket",
        "upload_first_file",
        "download_first_file",
        "delete_first_bucket",
        "delete_second_bucket",
    ] {
        let outcome = steps.iter().find(|s| s["step"] == step).unwrap();
        assert_eq!(outcome["status"], "ok", "{step}: {outcome}");
    }
}

#[test]
fn test_unreachable_endpoint_still_exits_zero() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "schema_version = 1\n[connection]\nregion = \"us-east-1\"\nendpoint = \"http://127.0.0.1:1\"\naccess_key = \"a\"\nsecret_key = \"b\"\nforce_path_style = true\n",
    )
    .unwrap();
    let work_dir = dir.path().to_string_lossy().to_string();

    let output = run_bucketwalk(&[
        "--config",
        &path.to_string_lossy(),
        "run",
        "--work-dir",
        &work_dir,
        "--no-color",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().next().unwrap().starts_with("exception: "));
}
