//! On-device track database.
//!
//! A JSON document at `<mount>/iPod_Control/iTunes/mediasync.json` holding
//! one entry per media file and the playlists referencing them by id.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CollectionError, Result};
use crate::track::{Track, TrackMetadata, TrackOrigin};

/// Highest database version this build understands.
pub const DATABASE_VERSION: u32 = 1;

pub const CONTROL_DIR: &str = "iPod_Control";
/// Number of `Fnn` music folders a fresh device gets.
pub const MUSIC_FOLDERS: u32 = 20;

const DATABASE_FILE: &str = "mediasync.json";

pub fn database_dir(mount: &Path) -> PathBuf {
    mount.join(CONTROL_DIR).join("iTunes")
}

pub fn database_path(mount: &Path) -> PathBuf {
    database_dir(mount).join(DATABASE_FILE)
}

pub fn music_dir(mount: &Path) -> PathBuf {
    mount.join(CONTROL_DIR).join("Music")
}

pub fn artwork_dir(mount: &Path) -> PathBuf {
    mount.join(CONTROL_DIR).join("Artwork")
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaKind {
    Audio,
    Video,
    Podcast,
    Audiobook,
}

/// Lowercased, prefix-stripped copies of the display fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortFields {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub album_artist: String,
    pub composer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub id: u32,
    pub media_kind: MediaKind,
    /// Colon-separated path relative to the mount point, e.g. `:iPod_Control:Music:F03:ABCD.mp3`.
    pub device_path: String,
    #[serde(flatten)]
    pub meta: TrackMetadata,
    #[serde(default)]
    pub sort: SortFields,
    /// Device path of the attached cover art, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub name: String,
    /// The default playlist holding every track. There is exactly one.
    #[serde(default)]
    pub master: bool,
    #[serde(default)]
    pub tracks: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDatabase {
    pub version: u32,
    #[serde(default)]
    next_id: u32,
    #[serde(default)]
    pub entries: Vec<DeviceEntry>,
    #[serde(default)]
    pub playlists: Vec<Playlist>,
}

/// `:iPod_Control:Music:F00:X.mp3` -> `iPod_Control/Music/F00/X.mp3`.
pub fn device_path_to_relative(device_path: &str) -> PathBuf {
    device_path.split(':').filter(|c| !c.is_empty()).collect()
}

/// Inverse of [`device_path_to_relative`].
pub fn relative_to_device_path(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .fold(String::new(), |mut acc, part| {
            acc.push(':');
            acc.push_str(&part);
            acc
        })
}

impl DeviceDatabase {
    /// An empty database with only the master playlist.
    pub fn empty(name: &str) -> Self {
        Self {
            version: DATABASE_VERSION,
            next_id: 1,
            entries: Vec::new(),
            playlists: vec![Playlist {
                name: name.to_string(),
                master: true,
                tracks: Vec::new(),
            }],
        }
    }

    /// Lay out a blank device under `mount` and write its empty database.
    pub fn create(mount: &Path) -> Result<Self> {
        fs::create_dir_all(database_dir(mount))?;
        fs::create_dir_all(artwork_dir(mount))?;
        let music = music_dir(mount);
        for n in 0..MUSIC_FOLDERS {
            fs::create_dir_all(music.join(format!("F{n:02}")))?;
        }

        let name = mount
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "iPod".to_string());
        let db = Self::empty(&name);
        db.write(mount)?;
        Ok(db)
    }

    /// Parse the database of the device mounted at `mount`.
    pub fn open(mount: &Path) -> Result<Self> {
        let path = database_path(mount);
        let file = File::open(&path).map_err(|_| CollectionError::SourceUnavailable {
            path: path.clone(),
        })?;
        let mut db: DeviceDatabase = serde_json::from_reader(BufReader::new(file))?;
        if db.version > DATABASE_VERSION {
            return Err(CollectionError::UnsupportedVersion {
                found: db.version,
                supported: DATABASE_VERSION,
            });
        }
        db.ensure_master();
        let max_id = db.entries.iter().map(|e| e.id).max().unwrap_or(0);
        let after_max = max_id
            .checked_add(1)
            .ok_or_else(|| CollectionError::Malformed {
                path: path.clone(),
                message: format!("entry id {max_id} leaves no room for new entries"),
            })?;
        db.next_id = db.next_id.max(after_max);
        debug!(
            "opened device database {} ({} entries)",
            path.display(),
            db.entries.len()
        );
        Ok(db)
    }

    /// Write through a temporary file so a failed write leaves the old database intact.
    pub fn write(&self, mount: &Path) -> Result<()> {
        let path = database_path(mount);
        let tmp = path.with_extension("json.tmp");
        {
            let mut out = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut out, self)?;
            out.flush()?;
        }
        fs::rename(&tmp, &path)?;
        debug!("wrote device database {}", path.display());
        Ok(())
    }

    fn ensure_master(&mut self) {
        if !self.playlists.iter().any(|p| p.master) {
            self.playlists.insert(
                0,
                Playlist {
                    name: "Library".to_string(),
                    master: true,
                    tracks: Vec::new(),
                },
            );
        }
    }

    pub fn entry(&self, id: u32) -> Option<&DeviceEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Append an entry under a fresh id and return that id.
    ///
    /// Fails once the id space is used up.
    pub fn add_entry(&mut self, mut entry: DeviceEntry) -> Result<u32> {
        let id = self.next_id;
        self.next_id = id
            .checked_add(1)
            .ok_or_else(|| CollectionError::Malformed {
                path: PathBuf::from(DATABASE_FILE),
                message: "no entry ids left".to_string(),
            })?;
        entry.id = id;
        self.entries.push(entry);
        Ok(id)
    }

    pub fn remove_entry(&mut self, id: u32) -> Option<DeviceEntry> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(pos))
    }

    pub fn master(&self) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.master)
    }

    pub fn add_to_master(&mut self, id: u32) {
        self.ensure_master();
        if let Some(master) = self.playlists.iter_mut().find(|p| p.master) {
            master.tracks.push(id);
        }
    }

    /// Remove `id` from every playlist. Non-master playlists that held it and
    /// end up empty are dropped; ones that were already empty stay.
    pub fn detach(&mut self, id: u32) {
        self.playlists.retain_mut(|playlist| {
            let before = playlist.tracks.len();
            playlist.tracks.retain(|&t| t != id);
            let emptied = before > 0 && playlist.tracks.is_empty();
            playlist.master || !emptied
        });
    }
}

impl Track {
    /// Build a device-backed track. Its path is relative to the mount point.
    pub fn from_device(entry: &DeviceEntry) -> Self {
        Track::new(
            device_path_to_relative(&entry.device_path),
            entry.meta.clone(),
            None,
            TrackOrigin::Device,
        )
    }
}
