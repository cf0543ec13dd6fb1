//! # CLI Argument Definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "confhub-demo")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Walks through the confhub config lifecycle on the local disk")]
pub(crate) struct Cli {
    /// Settings file (TOML, JSON or YAML); `CONFHUB__*` environment variables apply on top
    #[arg(short, long, global = true)]
    pub(crate) settings: Option<PathBuf>,

    /// Application directory; defaults to the directory of the executable
    #[arg(short, long, global = true)]
    pub(crate) root: Option<PathBuf>,

    #[command(subcommand)]
    pub(crate) command: Option<DemoCommand>,
}

#[derive(Debug, Clone, Subcommand)]
pub(crate) enum DemoCommand {
    /// Initialize, use and save the sample configs (default)
    Run {
        /// Delete the files of the override service afterwards
        #[arg(long)]
        cleanup: bool,
    },
    /// Save the sample configs of several isolated instances
    Hub {
        /// Number of shards; falls back to `hub.shards` from the settings
        #[arg(short, long)]
        shards: Option<usize>,
        /// Run shard operations concurrently
        #[arg(short, long)]
        parallel: bool,
        /// File name template, `{id}` is required
        #[arg(long, default_value = "{n}_{id}{ex}")]
        template: String,
    },
}
