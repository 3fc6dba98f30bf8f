use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::display::{Column, SortOrder};

#[derive(Debug, Parser)]
#[command(name = "mediasync")]
#[command(about = "Keep music folders and iPod-style devices in sync", long_about = None)]
pub struct Cli {
    /// Place copied files under Artist/Album/ instead of the source layout.
    #[arg(long, global = true)]
    pub organize: bool,

    /// Do not copy album artwork onto devices.
    #[arg(long, global = true)]
    pub no_artwork: bool,

    /// Comma separated sort columns, primary first (e.g. artist,year,title).
    #[arg(long, global = true, value_name = "COLS")]
    pub sort: Option<String>,

    #[arg(long, global = true)]
    pub descending: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the tracks of a folder or device.
    List { path: PathBuf },
    /// Make DEST hold exactly the tracks of SOURCE.
    Sync {
        source: PathBuf,
        dest: PathBuf,
        /// Only print what would be deleted and copied.
        #[arg(long)]
        dry_run: bool,
    },
    /// Show what kind of collection PATH is and how many tracks it holds.
    Info { path: PathBuf },
    /// Lay out an empty device database under MOUNT.
    InitDevice { mount: PathBuf },
}

/// Parse a `--sort` value into columns.
pub fn parse_columns(list: &str) -> Result<Vec<Column>, String> {
    let mut columns = Vec::new();
    for name in list.split(',').filter(|n| !n.trim().is_empty()) {
        match Column::parse(name) {
            Some(c) => columns.push(c),
            None => return Err(format!("unknown column '{}'", name.trim())),
        }
    }
    if columns.is_empty() {
        return Err("no sort columns given".to_string());
    }
    Ok(columns)
}

impl Cli {
    /// Fold the global flags into the loaded settings.
    pub fn apply(&self, settings: &mut Settings) -> Result<(), String> {
        if self.organize {
            settings.sync.auto_organize = true;
        }
        if self.no_artwork {
            settings.sync.album_artwork = false;
        }
        if let Some(list) = &self.sort {
            settings.display.sort_columns = parse_columns(list)?;
        }
        if self.descending {
            settings.display.sort_order = SortOrder::Descending;
        }
        Ok(())
    }
}
