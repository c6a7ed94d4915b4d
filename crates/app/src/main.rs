use std::sync::Arc;

use chrono::Local;
use clap::Parser;
use engine::{Engine, JsonFileStore, NoopMirror, RemoteMirror};

use crate::{cli::Cli, error::Result};

mod cli;
mod commands;
mod error;
mod mirror;
mod settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = settings::Settings::load(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "jieyou={level},engine={level}",
            level = settings.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());

    let mirror: Arc<dyn RemoteMirror> = match &settings.remote {
        Some(remote) => {
            tracing::info!("Found remote settings, mirroring to {}", remote.base_url);
            Arc::new(mirror::HttpMirror::new(remote)?)
        }
        None => Arc::new(NoopMirror),
    };

    tracing::debug!("using state file {}", settings.state_path);
    let engine = Engine::builder()
        .store(Arc::new(JsonFileStore::new(&settings.state_path)))
        .mirror(mirror)
        .today(today)
        .build()?;

    // Bank the days elapsed since the last run before anything else.
    let command = cli.command.unwrap_or(cli::Command::Status);
    if !matches!(command, cli::Command::Reconcile) {
        commands::reconcile(&engine, today).await;
    }

    let result = commands::run(&engine, command, today).await;
    engine.flush_mirror().await;
    result
}
