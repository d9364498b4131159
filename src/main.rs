//! CLI entry point for the contest tally service.
//!
//! Provides subcommands for running the vote submission service, computing
//! the leaderboard from stored records, and submitting or checking vote
//! payloads by hand.

use anyhow::{Context, Result, bail};
use bytes::Bytes;
use chrono::Utc;
use clap::{Parser, Subcommand};
use contest_tally::client::{BasicClient, fetch_leaderboard, submit_vote};
use contest_tally::config::Config;
use contest_tally::output::{write_csv, write_json_output};
use contest_tally::server::{self, AppState};
use contest_tally::store::naming::list_prefix;
use contest_tally::store::{WriteMode, load_records};
use contest_tally::tally::aggregate;
use contest_tally::tally::validate::{parse_submission, validate_submission};
use serde_json::Value;
use std::ffi::OsStr;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "contest_tally")]
#[command(about = "Collects judge votes and ranks contest participants", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service accepting submissions and serving the leaderboard
    Serve {
        #[command(flatten)]
        config: Config,

        /// Address to listen on
        #[arg(long, env = "TALLY_BIND", default_value = "0.0.0.0:8080")]
        bind: String,
    },
    /// Aggregate every stored vote record into a leaderboard
    Aggregate {
        #[command(flatten)]
        config: Config,

        /// Write the leaderboard JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Also write a flattened CSV (one row per judge vote)
        #[arg(long)]
        csv: Option<String>,

        /// Also upload the leaderboard JSON to the store under this key
        #[arg(long)]
        upload_key: Option<String>,

        /// Emit compact JSON instead of pretty-printed
        #[arg(long, default_value_t = false)]
        compact: bool,
    },
    /// Fetch the leaderboard from a running service
    Results {
        /// Base URL of the service
        #[arg(long, env = "TALLY_URL", default_value = "http://localhost:8080")]
        url: String,

        /// Write the leaderboard JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Submit a vote payload to a running service
    Submit {
        /// Path to the JSON payload, or "-" for stdin
        #[arg(value_name = "FILE")]
        source: String,

        /// Base URL of the service
        #[arg(long, env = "TALLY_URL", default_value = "http://localhost:8080")]
        url: String,
    },
    /// Check a vote payload locally without submitting it
    Validate {
        /// Path to the JSON payload, or "-" for stdin
        #[arg(value_name = "FILE")]
        source: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/contest_tally.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("contest_tally.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, bind } => {
            let store = config.open_store().await?;
            server::serve(&bind, AppState::new(config, store)).await?;
        }
        Commands::Aggregate {
            config,
            output,
            csv,
            upload_key,
            compact,
        } => {
            run_aggregate(&config, output, csv, upload_key, compact).await?;
        }
        Commands::Results { url, output } => {
            let client = BasicClient::new()?;
            let leaderboard = fetch_leaderboard(&client, &url).await?;
            info!(
                participants = leaderboard.participants.len(),
                "Leaderboard fetched"
            );
            write_json_output(output.as_deref(), &leaderboard, true)?;
        }
        Commands::Submit { source, url } => {
            let payload: Value = serde_json::from_str(&read_source(&source)?)
                .with_context(|| format!("'{source}' is not valid JSON"))?;
            validate_submission(payload.clone(), Utc::now())?;

            let client = BasicClient::new()?;
            let response = submit_vote(&client, &url, &payload).await?;
            if !response.ok {
                bail!(
                    "submission rejected: {}",
                    response.error.as_deref().unwrap_or("unknown error")
                );
            }
            info!(path = response.path.as_deref().unwrap_or(""), "Vote submitted");
        }
        Commands::Validate { source } => {
            let submission = parse_submission(read_source(&source)?.as_bytes(), Utc::now())?;
            let entries = submission.payload["results"]
                .as_array()
                .map(Vec::len)
                .unwrap_or(0);
            info!(
                judge_id = %submission.judge_id,
                timestamp = %submission.timestamp,
                entries,
                "Payload is valid"
            );
        }
    }

    Ok(())
}

/// Loads all records, aggregates them, and writes the requested outputs.
#[tracing::instrument(skip(config), fields(prefix = %config.prefix))]
async fn run_aggregate(
    config: &Config,
    output: Option<String>,
    csv: Option<String>,
    upload_key: Option<String>,
    compact: bool,
) -> Result<()> {
    let record_prefix = list_prefix(&config.prefix);
    if let Some(key) = &upload_key {
        if !record_prefix.is_empty() && key.starts_with(&record_prefix) {
            bail!("upload key '{key}' is inside the vote record prefix '{record_prefix}'");
        }
    }

    let store = config.open_store().await?;
    let records = load_records(store.as_ref(), &config.prefix)
        .await
        .context("aggregation failed: vote records could not be loaded")?;

    let leaderboard = aggregate(&records);
    info!(
        records = records.len(),
        participants = leaderboard.participants.len(),
        "Leaderboard computed"
    );
    if leaderboard.participants.is_empty() {
        warn!("No participants with valid votes");
    }

    write_json_output(output.as_deref(), &leaderboard, !compact)?;

    if let Some(path) = csv {
        write_csv(&path, &leaderboard)?;
        info!(path = %path, "Leaderboard CSV written");
    }

    if let Some(key) = upload_key {
        let body = serde_json::to_vec(&leaderboard)?;
        store
            .put(&key, Bytes::from(body), WriteMode::Overwrite)
            .await
            .with_context(|| format!("failed to upload leaderboard to '{key}'"))?;
        info!(key = %key, "Leaderboard uploaded");
    }

    Ok(())
}

/// Reads a payload from a file path, or from stdin when `source` is "-".
fn read_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("failed to read '{source}'"))
    }
}
