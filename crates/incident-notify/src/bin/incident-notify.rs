//! Incident notify CLI - send a single alert event to the incident API.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use incident_notify::{
    AlertHandler, AlertLevel, Config, IncidentKey, IncidentRequest, IncidentService,
};

/// Incident notify CLI - translate alert events into incident API calls.
#[derive(Parser)]
#[command(name = "incident-notify")]
#[command(about = "Send alert events to the incident-management API")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send one alert event
    Alert {
        /// Incident key (properties/<id>/alerts/<id>/breakdown/<pairs>)
        #[arg(long)]
        key: String,

        /// Alert level: ok, info, warning or critical
        #[arg(long)]
        level: AlertLevel,

        /// Event time as RFC3339 or unix seconds (default: now)
        #[arg(long, value_parser = parse_time)]
        time: Option<DateTime<Utc>>,

        /// TOML config file; INCIDENT_* environment variables override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the destination URL and payload without sending
        #[arg(long)]
        dry_run: bool,
    },

    /// Decode an incident key and print its parts as JSON
    Decode {
        /// Incident key to decode
        #[arg(long)]
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("incident_notify=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });

    if cli.log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    match cli.command {
        Commands::Alert {
            key,
            level,
            time,
            config,
            dry_run,
        } => run_alert(&key, level, time.unwrap_or_else(Utc::now), config, dry_run).await,
        Commands::Decode { key } => run_decode(&key),
    }
}

async fn run_alert(
    key: &str,
    level: AlertLevel,
    at: DateTime<Utc>,
    config_path: Option<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    config
        .apply_env()
        .context("Failed to apply environment overrides")?;
    config.validate().context("Invalid configuration")?;

    tracing::debug!(?config, "Loaded configuration");

    let service = IncidentService::new(config).context("Failed to create incident service")?;

    if dry_run {
        let request = service.prepare(key, level, at)?;
        println!("{}", render_request(&request)?);
        return Ok(());
    }

    if !service.enabled() {
        bail!("Incident service is disabled (set enabled = true or INCIDENT_ENABLED=true)");
    }

    service.open()?;
    let result = service.alert(key, level, at).await;
    service.close()?;

    result.with_context(|| format!("Failed to send {level} alert for {key}"))?;
    tracing::info!(key, %level, "Alert delivered");
    Ok(())
}

/// The request line followed by the exact body that would be sent.
fn render_request(request: &IncidentRequest) -> Result<String> {
    let body = String::from_utf8(request.payload.to_json()?)?;
    Ok(format!("POST {}\n{body}", request.url))
}

fn run_decode(key: &str) -> Result<()> {
    let decoded = IncidentKey::decode(key)?;
    println!("{}", serde_json::to_string_pretty(&decoded)?);
    Ok(())
}

/// Accept RFC3339 timestamps or integer unix seconds.
fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(secs) = s.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| format!("timestamp out of range: {s}"));
    }
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid time {s:?}: {e}"))
}
