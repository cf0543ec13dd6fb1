mod args;
mod configs;

use anyhow::Context;
use args::{Cli, DemoCommand};
use clap::Parser;
use confhub::logger::{LogSettings, Logger};
use confhub::prelude::*;
use configs::{Character, ConsoleTheme, Timestamps, Timings};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::info;

/// Settings file layout: the `[log]` section plus the service and hub sections.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DemoSettings {
    log: LogSettings,
    #[serde(flatten)]
    configs: ServiceSettings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings: DemoSettings = confhub::load_settings(cli.settings.as_deref())
        .context("Critical: Settings are malformed")?;
    let _logger = Logger::from_settings(env!("CARGO_PKG_NAME"), &settings.log)?;

    let fs = open_file_system(cli.root.as_deref()).await?;
    info!(root = %fs.root().display(), "Application directory ready");

    match cli.command.unwrap_or(DemoCommand::Run { cleanup: false }) {
        DemoCommand::Run { cleanup } => run(&settings.configs, fs, cleanup).await,
        DemoCommand::Hub { shards, parallel, template } => {
            hub(&settings.configs, fs, shards, parallel, &template).await
        },
    }
}

async fn open_file_system(root: Option<&Path>) -> anyhow::Result<LocalFileSystem> {
    let builder = LocalFileSystem::builder();
    let builder = match root {
        Some(root) => builder.root(root),
        None => builder.executable_root(),
    };
    Ok(builder.connect().await?)
}

async fn run(
    settings: &ServiceSettings,
    fs: LocalFileSystem,
    cleanup: bool,
) -> anyhow::Result<()> {
    let fs = Arc::new(fs);
    let json = Arc::new(JsonSerializer::new());

    let service = ConfigsService::from_settings(settings, fs.clone(), json.clone())?;
    let character = service.register::<Character>()?;
    let theme = service.register::<ConsoleTheme>()?;
    let timings = service.register::<Timings>()?;
    let stamps = service.register::<Timestamps>()?;

    service.initialize_all_configs(true).await?;

    {
        let theme = theme.read().await;
        info!(foreground = %theme.foreground, background = %theme.background, "Console theme");
    }
    {
        let mut stamps = stamps.write().await;
        info!(started = ?stamps.started_at, stopped = ?stamps.stopped_at, "Previous run");
        stamps.started_at = SystemTime::now();
    }

    let timings = timings.snapshot().await;
    info!("Loading assets...");
    tokio::time::sleep(timings.loading_delay()).await;
    for attempt in 1..=timings.attempts {
        info!(attempt, "Uploading data");
        tokio::time::sleep(timings.loading_delay()).await;
    }

    {
        let character = character.read().await;
        info!(name = %character.name, max_hp = character.max_hp, "Character ready");
    }
    stamps.write().await.stopped_at = SystemTime::now();
    service.save_all_configs_to_files(true).await?;

    let overrides = ConfigsService::builder()
        .file_system(fs)
        .serializer(json)
        .common_directory("services/2")
        .timeouts(settings.timeouts)
        .build()?;
    overrides.register_type(
        ConfigsService::id_of::<Character>(),
        Character::default,
        Some(PathSettings::with_file_name("name_override.txt")?),
    )?;
    overrides.register_type(
        ConfigsService::id_of::<ConsoleTheme>(),
        ConsoleTheme::default,
        None,
    )?;
    overrides.register_type(
        ConfigsService::id_of::<Timings>(),
        Timings::default,
        Some(PathSettings::new(Some("path_override_1"), None)?),
    )?;
    overrides.register_type(
        ConfigsService::id_of::<Timestamps>(),
        Timestamps::default,
        Some(PathSettings::new(Some("path_override_2"), Some("name_override.cfg"))?),
    )?;
    overrides.set_path_override(
        ConfigsService::id_of::<Character>(),
        PathSettings::with_file_name("overridden.json")?,
    )?;

    overrides.initialize_all_configs(true).await?;
    overrides.save_all_configs_to_files(false).await?;
    for id in overrides.registered_ids() {
        let path = overrides.resolve_file_path(&id)?;
        info!(id = %id, path = %path.display(), "Override service file");
    }

    if cleanup {
        overrides.delete_all_config_files().await?;
        info!("Override service files deleted");
    }
    Ok(())
}

async fn hub(
    settings: &ServiceSettings,
    fs: LocalFileSystem,
    shards: Option<usize>,
    parallel: bool,
    template: &str,
) -> anyhow::Result<()> {
    let mut settings = settings.clone();
    if let Some(shards) = shards {
        settings.hub.shards = shards;
    }
    if settings.hub.shards == 0 {
        settings.hub.shards = 3;
    }

    let hub = ConfigsHub::from_settings(&settings, Arc::new(fs), Arc::new(JsonSerializer::new()))?;
    let character_id = ConfigsService::id_of::<Character>();
    let timings_id = ConfigsService::id_of::<Timings>();
    hub.register_type_on_all_shards(character_id, Character::default, template)?;
    hub.register_type_on_all_shards(timings_id, Timings::default, template)?;

    let options = if parallel { BroadcastOptions::parallel() } else { BroadcastOptions::sequential() }
        .with_timeout(hub.broadcast_timeout());
    for id in [character_id, timings_id] {
        hub.broadcast(id, HubOperation::Initialize { check_correctness: true }, options).await?;
    }

    let characters = hub.get_instances_of_type::<Character>(character_id)?;
    for (index, character) in characters.into_iter().enumerate() {
        if let Some(character) = character {
            character.write().await.name = format!("Wanderer #{index}");
        }
    }
    hub.save_for_all(character_id, false, parallel).await?;

    info!(shards = hub.shard_count(), parallel, "Hub instances saved");
    Ok(())
}
