mod config;
mod source;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use icalsync_core::ics::parse_feed;
use icalsync_core::{IcalSyncError, Reconciler};
use icalsync_provider_google::{GoogleCalendar, Session};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "icalsync", version)]
#[command(about = "Sync an ICS feed into a Google Calendar, one way")]
struct Cli {
    /// ICS feed to sync from: a local path or an http(s)/webcal URL
    #[arg(short, long)]
    file: Option<String>,

    /// Google Calendar id to sync into
    #[arg(short, long)]
    calendar_id: Option<String>,

    /// Cancel every event on the calendar instead of syncing
    #[arg(short, long)]
    purge: bool,

    /// Log every sync decision
    #[arg(short, long)]
    verbose: bool,

    /// Config file (defaults to ~/.config/icalsync/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli).await
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "warn,icalsync=debug,icalsync_core=debug,icalsync_provider_google=debug"
    } else {
        "warn,icalsync=info,icalsync_core=info,icalsync_provider_google=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let calendar_id = cli.calendar_id.as_deref().ok_or_else(|| {
        IcalSyncError::Config("No calendar id given. Pass --calendar-id <ID>".to_string())
    })?;

    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    let cfg = Config::load(&config_path)?;

    // Read the feed before touching the remote side, so a bad feed never reaches it.
    let events = if cli.purge {
        None
    } else {
        let location = cli.file.as_deref().ok_or_else(|| {
            IcalSyncError::Config("No ICS feed given. Pass --file <PATH|URL>".to_string())
        })?;

        let content = source::load_feed(location).await?;
        let calendar =
            parse_feed(&content).with_context(|| format!("Failed to parse ICS feed {location}"))?;

        info!(
            feed = calendar.name.as_deref().unwrap_or(location),
            events = calendar.events.len(),
            "loaded feed"
        );
        Some(calendar.events)
    };

    let session = connect(&cfg).await?;
    let client = GoogleCalendar::new(session.access_token());

    let title = client
        .ensure_calendar(calendar_id)
        .await
        .with_context(|| format!("Calendar {calendar_id} is not accessible"))?;

    let sync_config = cfg.sync_config(calendar_id);
    let reconciler = Reconciler::new(&client, &sync_config);

    match events {
        None => {
            let removed = reconciler.purge().await?;
            println!("Purged {removed} events from {title}");
        }
        Some(events) => {
            let result = reconciler.sync(&events).await?;
            if result.has_changes() {
                println!("{title}: {result}");
            } else {
                println!("{title} is up to date: {result}");
            }
        }
    }

    Ok(())
}

/// Load the stored Google session, or run first-time authorization when there is none.
async fn connect(cfg: &Config) -> Result<Session> {
    let credentials = cfg.credentials();
    let token_path = cfg.token_path()?;

    if token_path.exists() {
        Session::load_valid(&credentials, &token_path).await
    } else {
        info!(path = %token_path.display(), "no stored session, starting authorization");
        Session::authorize_interactive(&credentials, &token_path).await
    }
}
