// src/main.rs

//! jobwatch CLI entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

use jobwatch::catalog::Catalog;
use jobwatch::error::{AppError, Result};
use jobwatch::export;
use jobwatch::models::Config;
use jobwatch::scheduler::Scheduler;
use jobwatch::server::{self, AppState};
use jobwatch::sources;

#[derive(Parser, Debug)]
#[command(name = "jobwatch", version, about = "Job listing aggregator")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll periodically and serve the read API
    Serve,
    /// Run one polling cycle and exit
    Cycle {
        /// Poll only this source
        #[arg(long)]
        source: Option<String>,
        /// Also write the frontend feed after the cycle
        #[arg(long, value_name = "PATH")]
        export: Option<PathBuf>,
    },
    /// Write the frontend feed and exit
    Export {
        #[arg(short, long, default_value = "data/jobs.json")]
        out: PathBuf,
        /// Include withdrawn postings
        #[arg(long)]
        include_inactive: bool,
    },
    /// Check the configuration file and exit
    Validate,
    /// Delete catalog entries (polling never deletes; this does)
    Purge {
        /// Purge only this source
        #[arg(long)]
        source: Option<String>,
        /// Purge every source
        #[arg(long)]
        all: bool,
        /// Keep entries that are still active
        #[arg(long)]
        inactive_only: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Command::Validate = cli.command {
        let config = Config::load(&cli.config)?;
        config.validate()?;
        tracing::info!(
            sources = config.sources.len(),
            enabled = config.enabled_sources().count(),
            "configuration is valid"
        );
        return Ok(());
    }

    let config = Config::load_or_default(&cli.config);
    config.validate()?;

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Cycle { source, export } => cycle(config, source, export).await,
        Command::Export {
            out,
            include_inactive,
        } => {
            let catalog = Catalog::open(&config.storage.path).await?;
            export::write_feed(&catalog, &out, include_inactive).await?;
            Ok(())
        }
        Command::Validate => unreachable!("handled above"),
        Command::Purge {
            source,
            all,
            inactive_only,
        } => purge(config, source, all, inactive_only).await,
    }
}

/// Run the periodic scheduler and the API server until ctrl-c.
async fn serve(config: Config) -> Result<()> {
    let catalog = Arc::new(Catalog::open(&config.storage.path).await?);
    let client = sources::build_client(&config.http)?;
    let adapters = sources::build_adapters(&config, &client)?;
    let scheduler = Arc::new(Scheduler::new(
        catalog.clone(),
        adapters,
        config.scheduler.clone(),
    ));

    let scheduler_stop = Arc::new(Notify::new());
    let server_stop = Arc::new(Notify::new());
    {
        let scheduler_stop = scheduler_stop.clone();
        let server_stop = server_stop.clone();
        tokio::spawn(async move {
            if let Err(error) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %error, "ctrl-c handler failed");
                return;
            }
            tracing::info!("shutdown requested");
            scheduler_stop.notify_one();
            server_stop.notify_one();
        });
    }

    let periodic = tokio::spawn(scheduler.clone().run_periodic(scheduler_stop));

    let state = AppState {
        catalog,
        scheduler,
    };
    server::serve(state, &config.server.bind_addr, async move {
        server_stop.notified().await;
    })
    .await?;

    // Let an in-flight cycle finish; its commits stay committed
    if let Err(error) = periodic.await {
        tracing::error!(error = %error, "scheduler task failed");
    }
    Ok(())
}

/// Run one cycle, print its report, optionally write the feed.
async fn cycle(config: Config, source: Option<String>, feed: Option<PathBuf>) -> Result<()> {
    let catalog = Arc::new(Catalog::open(&config.storage.path).await?);
    let client = sources::build_client(&config.http)?;
    let adapters = sources::build_adapters(&config, &client)?;
    let scheduler = Scheduler::new(catalog.clone(), adapters, config.scheduler.clone());

    let report = scheduler.run_cycle(source.as_deref()).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(path) = feed {
        export::write_feed(&catalog, &path, false).await?;
    }
    Ok(())
}

async fn purge(
    config: Config,
    source: Option<String>,
    all: bool,
    inactive_only: bool,
) -> Result<()> {
    if source.is_some() == all {
        return Err(AppError::validation(
            "purge needs exactly one of --source <name> or --all",
        ));
    }

    let catalog = Catalog::open(&config.storage.path).await?;
    let removed = catalog.purge(source.as_deref(), inactive_only).await?;
    tracing::info!(removed, "purge complete");
    Ok(())
}
