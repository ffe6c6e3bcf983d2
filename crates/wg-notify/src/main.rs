//! wg-notify CLI - announce IETF working group document events.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wg_notify::{
    CheckpointStore, Config, Credentials, DatatrackerClient, Publisher, Renderer, ResumptionEngine,
    RunController, TemplateSet, TwitterConnector,
};

/// Tweet about recent changes in IETF Working Groups.
#[derive(Parser)]
#[command(name = "wg-notify")]
#[command(about = "Tweet about recent changes in IETF Working Groups")]
#[command(version)]
pub struct Cli {
    /// Working Group's short name; e.g., 'tls', 'httpbis'
    #[arg(short = 'g', long = "group")]
    group: String,

    /// Don't tweet; just log the messages
    #[arg(short = 'd', long)]
    dry_run: bool,

    /// Debug logging, including every event of the group
    #[arg(long)]
    debug: bool,

    /// Last event ID seen (overrides the file)
    #[arg(short = 'l', long = "last-seen")]
    last_seen: Option<u64>,

    /// File to read the last seen ID from and write it back to after processing
    #[arg(short = 'f', long = "file")]
    file: Option<PathBuf>,

    /// JSON file replacing the built-in message templates
    #[arg(long)]
    templates: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.debug {
            EnvFilter::new("wg_notify=debug,info")
        } else {
            EnvFilter::new("wg_notify=info,warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = Config::from_env();
    tracing::debug!(?config, "Loaded configuration");

    let templates = match &cli.templates {
        Some(path) => TemplateSet::from_file(path),
        None => TemplateSet::builtin(),
    }
    .context("Failed to load message templates")?;

    // Credentials are checked before anything touches the network.
    let publisher = if cli.dry_run {
        tracing::info!("Dry run; messages will not be posted");
        Publisher::dry_run()
    } else {
        let credentials = Credentials::from_env().context("Twitter credentials missing")?;
        Publisher::live(TwitterConnector::new(credentials, &config), config.retry_policy())
    };

    let source = DatatrackerClient::new(&config).context("Failed to create Datatracker client")?;
    let store = CheckpointStore::new(cli.file.clone());
    let engine = ResumptionEngine::new(config.request_limit);

    tracing::info!(
        group = %cli.group,
        dry_run = cli.dry_run,
        checkpoint_file = ?store.path(),
        request_limit = engine.request_limit(),
        "Starting run"
    );

    let mut controller = RunController::new(
        source,
        store,
        engine,
        Renderer::new(&cli.group, templates, config.clone()),
        publisher,
    );

    let report = controller.run(cli.last_seen).await.context("Run failed")?;

    tracing::info!(
        fetched = report.fetched,
        skipped = report.skipped,
        published = report.published,
        duplicates = report.duplicates,
        abandoned = report.abandoned,
        stale_checkpoint = report.stale_checkpoint,
        checkpoint = ?report.checkpoint,
        "Run complete"
    );

    if let Some(reason) = &report.stop {
        tracing::error!(error = %reason, "Run stopped early; progress up to the checkpoint was kept");
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
