use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use logsweep_cloudwatch::{CloudWatchConfig, CloudWatchLogsClient};

mod handler;

/// Logsweep - deletes empty CloudWatch log streams older than 14 days
#[derive(Parser, Debug)]
#[command(name = "logsweep")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// AWS region (defaults to the standard AWS provider chain)
    #[arg(long)]
    region: Option<String>,

    /// Named profile from the shared AWS config files
    #[arg(long)]
    profile: Option<String>,

    /// Custom CloudWatch Logs endpoint, e.g. a local emulator
    #[arg(long, value_name = "URL")]
    endpoint_url: Option<String>,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .with_writer(std::io::stderr)
        .init();

    let result = run(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

/// Used when RUST_LOG is unset or empty
const DEFAULT_LOG_FILTER: &str = "info,aws_config=warn";

fn log_filter(rust_log: Option<String>) -> EnvFilter {
    match rust_log.filter(|directives| !directives.trim().is_empty()) {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::new(DEFAULT_LOG_FILTER),
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = CloudWatchConfig {
        region: args.region,
        profile: args.profile,
        endpoint_url: args.endpoint_url,
    };
    let client = CloudWatchLogsClient::new(config).await;

    let report = handler::purge_log_streams(Arc::new(client)).await;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
    } else {
        println!("{}", report.summary_message);
    }

    // The report already logged its error; only the exit status is left
    Ok(if report.error.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
