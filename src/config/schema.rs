use std::path::PathBuf;

use serde::Deserialize;

use crate::display::DisplayDescriptor;

/// Top-level settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/mediasync/config.toml` or `~/.config/mediasync/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `MEDIASYNC__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub display: DisplayDescriptor,
    pub sync: SyncSettings,
    pub logging: LoggingSettings,
    pub state: StateSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: ["mp3", "m4a", "aac", "flac", "ogg", "wav", "aiff"]
                .into_iter()
                .map(String::from)
                .collect(),
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Copy into folders as `Artist/Album/NN Title.ext`.
    pub auto_organize: bool,
    /// Attach cover art when copying onto a device.
    pub album_artwork: bool,
    /// Leading words dropped from device sort fields (matched case-insensitively).
    ///
    /// Example: ["the ", "a "]
    pub sort_prefixes: Vec<String>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            auto_organize: false,
            album_artwork: true,
            sort_prefixes: vec!["the ".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StateSettings {
    /// Where open collections are saved between runs. Unset disables sessions.
    pub session_path: Option<PathBuf>,
}
