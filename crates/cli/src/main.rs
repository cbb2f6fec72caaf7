//! bucketwalk - object storage walkthrough
//!
//! Runs a fixed sequence of bucket and object operations against an
//! S3-compatible service (or the in-memory backend) and prints a trace.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use bucketwalk::commands::{self, Cli};

fn init_tracing(debug: bool, no_color: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // stdout carries the trace, logs go to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_ansi(!no_color))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug, cli.no_color);

    let exit_code = commands::execute(cli).await;

    std::process::exit(exit_code.as_i32());
}
