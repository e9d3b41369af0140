use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use windowstore::background::create_background_store;
use windowstore::cli::{Cli, Command};
use windowstore::config::Config;
use windowstore::debug::{ActionLog, ActionLogEnhancer};
use windowstore::persist::{FileStorage, KEY_PREFIX, Storage};
use windowstore::state::{ConnectionType, InstancesState, WindowStoreAction};
use windowstore::window::{BuildMode, ConfiguredStore, PERSIST_KEY, WindowPosition, configure_store};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("{e}"))?;

    debug!(?level, "Logging initialized");
    Ok(())
}

/// Open the window store at `position` against an empty background store
async fn open_store(config: &Config, position: WindowPosition, action_log: Option<ActionLogEnhancer>) -> ConfiguredStore {
    let base = create_background_store(InstancesState::default());
    let mut options = config.store_options();
    if let Some(enhancer) = action_log {
        options = options.with_action_log(enhancer);
    }
    let configured = configure_store(&base, position, options);
    if let Err(e) = configured.persistor.ready().await {
        warn!(error = %e, "Rehydration failed, continuing with defaults");
        println!("{} {}", "!".yellow(), e);
    }
    configured
}

async fn cmd_open(config: &Config, position: WindowPosition, dev: bool) -> Result<()> {
    let enhancer = dev.then(ActionLogEnhancer::new);
    let log: Option<Arc<ActionLog>> = enhancer.as_ref().map(ActionLogEnhancer::log);
    let ConfiguredStore { store, persistor } = open_store(config, position, enhancer).await;
    persistor.flush().await.context("Failed to write state")?;

    let state = store.state();
    println!("{} Window store ready", "✓".green());
    println!("  Position: {}", position.to_string().cyan());
    println!("  Persist key: {}", persistor.key());
    println!("  Status: {:?}", persistor.status());
    println!("  Connection: {}", state.connection.connection_type.to_string().cyan());
    println!("  Socket: {:?}", state.socket.socket_state);
    println!("  Section: {}", state.section);
    println!("  Middleware: {}", store.middleware_names().join(" -> "));

    if let Some(log) = log {
        println!("  Actions:");
        for entry in log.entries() {
            println!(
                "    {} {} {}",
                entry.seq.to_string().dimmed(),
                entry.at.format("%H:%M:%S%.3f").to_string().dimmed(),
                entry.action
            );
        }
    }
    Ok(())
}

async fn cmd_show(config: &Config) -> Result<()> {
    let storage = FileStorage::new(&config.storage_dir);
    let key = format!("{KEY_PREFIX}{PERSIST_KEY}");
    match storage.get_item(&key).await.context("Failed to read persisted state")? {
        Some(blob) => {
            let value: serde_json::Value = serde_json::from_str(&blob).context("Persisted state is not valid JSON")?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        None => println!("No persisted state in {}", config.storage_dir.display()),
    }
    Ok(())
}

async fn cmd_set_connection(config: &Config, connection_type: ConnectionType) -> Result<()> {
    let ConfiguredStore { store, persistor } = open_store(config, WindowPosition::Panel, None).await;

    let mut connection = store.read(|state| state.connection.clone());
    connection.connection_type = connection_type;
    store
        .dispatch(WindowStoreAction::Reconnect(connection))
        .context("Failed to update connection")?;
    persistor.flush().await.context("Failed to write state")?;

    info!(%connection_type, "Connection type persisted");
    println!("{} Connection set to {}", "✓".green(), connection_type.to_string().cyan());
    Ok(())
}

async fn cmd_purge(config: &Config) -> Result<()> {
    let ConfiguredStore { persistor, .. } = open_store(config, WindowPosition::Panel, None).await;
    persistor.pause();
    persistor.purge().await.context("Failed to purge persisted state")?;
    println!("{} Purged {}", "✓".green(), persistor.key());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(storage_dir = %config.storage_dir.display(), build_mode = ?config.build_mode, "windowstore starting");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Open { position, dev } => {
            let dev = dev || config.build_mode == BuildMode::Development;
            cmd_open(&config, position.unwrap_or_default(), dev).await
        }
        Command::Show => cmd_show(&config).await,
        Command::SetConnection { connection_type } => cmd_set_connection(&config, connection_type).await,
        Command::Purge => cmd_purge(&config).await,
    }
}
