//! CLI argument parsing for windowstore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::state::ConnectionType;
use crate::window::WindowPosition;

#[derive(Parser, Debug)]
#[command(name = "ws")]
#[command(author, version, about = "Persisted devtools window stores", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a window store, wait for rehydration, and describe it
    Open {
        /// Window position hash: #popup, #left, #right, #bottom, #panel (omit for the devtools panel)
        #[arg(short, long, allow_hyphen_values = true)]
        position: Option<WindowPosition>,

        /// Compose the store for development, with the action log
        #[arg(short, long)]
        dev: bool,
    },

    /// Print the persisted state blob
    Show,

    /// Persist a new connection type
    SetConnection {
        /// disabled, remotedev, or custom
        #[arg(required = true)]
        connection_type: ConnectionType,
    },

    /// Remove the persisted state
    Purge,
}
