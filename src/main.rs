//! Tic-tac-toe API - command-line entry point.

#![warn(missing_docs)]

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use tictactoe_api::{
    ActiveGamesCounter, AppState, Cache, ChannelTaskQueue, GameRepository, GameService,
    MemoryCache, ReminderJob, ServiceConfig, SpoolMailer, TaskWorker, router,
};
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, reload, util::SubscriberInitExt};

/// Filter in effect until the configuration has been read.
const BOOTSTRAP_FILTER: &str = "info";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Bootstrap filter so config loading is logged; swapped for the
    // configured one once it is known.
    let (filter, filter_handle) = reload::Layer::new(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(BOOTSTRAP_FILTER)),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::load(cli.config.as_deref())?;
    let rust_log = std::env::var("RUST_LOG").ok();
    if let Some(directives) = config.log_filter_override(rust_log.as_deref()) {
        filter_handle.reload(EnvFilter::new(directives))?;
        debug!(filter = directives, "Configured log filter applied");
    }

    match cli.command {
        Command::Serve { port, host } => run_server(config.with_bind(host, port)).await,
        Command::Migrate => run_migrate(&config),
        Command::Remind => run_remind(&config),
        Command::RefreshActive => run_refresh_active(&config),
    }
}

/// Opens the repository and applies pending migrations.
#[instrument(skip(config), fields(database = %config.database_path()))]
fn open_repository(config: &ServiceConfig) -> Result<GameRepository> {
    let repository = GameRepository::new(config.database_path().clone())?;
    let applied = repository.run_migrations()?;
    info!(applied, "Database ready");
    Ok(repository)
}

fn reminder_job(config: &ServiceConfig, repository: GameRepository) -> Result<ReminderJob> {
    let mailer = SpoolMailer::new(config.mail_spool_dir().clone())?;
    Ok(ReminderJob::new(
        repository,
        Arc::new(mailer),
        config.mail_sender().clone(),
        config.public_url().clone(),
    ))
}

/// Run the HTTP game service
#[instrument(skip(config), fields(host = %config.host(), port = config.port()))]
async fn run_server(config: ServiceConfig) -> Result<()> {
    let repository = open_repository(&config)?;

    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
    let (tasks, receiver) = ChannelTaskQueue::new();
    let service = Arc::new(GameService::new(repository.clone(), cache, Arc::new(tasks)));

    let worker = TaskWorker::new(service.active_games_counter().clone());
    tokio::spawn(worker.run(receiver));

    let reminders = Arc::new(reminder_job(&config, repository)?);
    let app = router(AppState::new(service, reminders));

    let listener = tokio::net::TcpListener::bind((config.host().as_str(), *config.port()))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host(), config.port()))?;
    info!("Server ready at http://{}:{}/", config.host(), config.port());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Apply migrations only
fn run_migrate(config: &ServiceConfig) -> Result<()> {
    open_repository(config)?;
    Ok(())
}

/// Send reminders once
fn run_remind(config: &ServiceConfig) -> Result<()> {
    let repository = open_repository(config)?;
    let sent = reminder_job(config, repository)?.run()?;
    info!(sent, spool = %config.mail_spool_dir().display(), "Reminders spooled");
    Ok(())
}

/// Recount active games once
fn run_refresh_active(config: &ServiceConfig) -> Result<()> {
    let repository = open_repository(config)?;
    let counter = ActiveGamesCounter::new(repository, Arc::new(MemoryCache::new()));
    let count = counter.refresh()?;
    println!("{}", ActiveGamesCounter::message(count));
    Ok(())
}
