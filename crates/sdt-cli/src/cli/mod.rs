//! CLI for the SDT stream detection toolkit.

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sdt_core::command::Tool;
use sdt_core::config;
use sdt_core::store::sqlite::SqliteStore;

use commands::{run_copy, run_delete, run_import_har, run_list, run_reset};

/// Top-level CLI for the SDT stream detection toolkit.
#[derive(Debug, Parser)]
#[command(name = "sdt")]
#[command(about = "SDT: detect downloadable media in captured traffic and build downloader commands", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Scan a HAR capture for downloadable media and store detections.
    ImportHar {
        /// Path to the HAR file.
        path: PathBuf,
    },

    /// List stored detections, most recent first.
    List {
        /// Show the previous-session list instead of the live one.
        #[arg(long)]
        previous: bool,
        /// Only show entries whose filename, title, type, or hostname
        /// contains this text.
        #[arg(long)]
        filter: Option<String>,
    },

    /// Build downloader command lines for stored detections.
    Copy {
        /// Request ids to copy (see `sdt list`).
        ids: Vec<String>,
        /// Copy every stored detection.
        #[arg(long)]
        all: bool,
        /// Use the previous-session list instead of the live one.
        #[arg(long)]
        previous: bool,
        /// Override the configured tool (url, ffmpeg, streamlink,
        /// youtubedl, ytdlp, hlsdl, nm3u8dl, kodiUrl, tableForm, user).
        #[arg(long)]
        tool: Option<Tool>,
    },

    /// Delete stored detections by request id.
    Delete {
        /// Request ids to delete.
        ids: Vec<String>,
        /// Delete from the previous-session list instead of the live one.
        #[arg(long)]
        previous: bool,
    },

    /// Wipe all stored detections and reseed default preferences.
    Reset,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let prefs = config::load_or_init()?;
        tracing::debug!("loaded preferences: {:?}", prefs);
        let store = Arc::new(SqliteStore::open_default().await?);

        match cli.command {
            CliCommand::ImportHar { path } => run_import_har(store, prefs, &path).await?,
            CliCommand::List { previous, filter } => {
                run_list(store, prefs, previous, filter.as_deref()).await?;
            }
            CliCommand::Copy {
                ids,
                all,
                previous,
                tool,
            } => run_copy(store, prefs, &ids, all, previous, tool).await?,
            CliCommand::Delete { ids, previous } => {
                run_delete(store, prefs, &ids, previous).await?;
            }
            CliCommand::Reset => run_reset(store, prefs).await?,
        }

        Ok(())
    }
}
