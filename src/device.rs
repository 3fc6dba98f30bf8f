//! Collection backed by an iPod-style device database.
//!
//! Track metadata is cached by the database itself, so loading and
//! refreshing both just parse it again; nothing per-track is persisted here.

mod artwork;
mod database;
mod persist;
mod sortkey;

use std::collections::HashMap;
use std::fs;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::collection::{Collection, CollectionKind, CollectionState};
use crate::error::{CollectionError, Result};
use crate::job::JobRun;
use crate::track::{TagReader, Track};

pub use artwork::{Artwork, find_artwork, sibling_cover};
pub use database::{
    DATABASE_VERSION, DeviceDatabase, DeviceEntry, MUSIC_FOLDERS, MediaKind, Playlist, SortFields,
    database_path, device_path_to_relative, music_dir, relative_to_device_path,
};
pub use persist::DEVICE_STATE_VERSION;
pub use sortkey::{sort_fields, sort_key};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceOptions {
    /// Attach cover art to copied-in tracks.
    pub album_artwork: bool,
    /// Leading words stripped from sort fields.
    pub sort_prefixes: Vec<String>,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            album_artwork: true,
            sort_prefixes: vec!["the ".to_string()],
        }
    }
}

pub struct DeviceCollection {
    state: CollectionState,
    mount: PathBuf,
    options: DeviceOptions,
    db: Option<DeviceDatabase>,
    /// Track key -> database entry id.
    ids: HashMap<String, u32>,
    tags: Arc<dyn TagReader>,
}

/// `F07/K2QX.mp3`-style location for a key; `attempt` varies it on collision.
fn candidate_path(key: &str, ext: &str, attempt: u32) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    attempt.hash(&mut hasher);
    let mut v = hasher.finish();

    let folder = v % u64::from(MUSIC_FOLDERS);
    v /= u64::from(MUSIC_FOLDERS);
    let mut name = String::with_capacity(4);
    for _ in 0..4 {
        let digit = char::from_digit((v % 36) as u32, 36).unwrap_or('0');
        name.push(digit.to_ascii_uppercase());
        v /= 36;
    }
    let file = if ext.is_empty() {
        name
    } else {
        format!("{name}.{}", ext.to_ascii_lowercase())
    };
    PathBuf::from(format!("F{folder:02}")).join(file)
}

impl DeviceCollection {
    pub fn new(
        name: impl Into<String>,
        mount: impl Into<PathBuf>,
        options: DeviceOptions,
        tags: Arc<dyn TagReader>,
    ) -> Self {
        Self {
            state: CollectionState::new(name),
            mount: mount.into(),
            options,
            db: None,
            ids: HashMap::new(),
            tags,
        }
    }

    pub fn options(&self) -> &DeviceOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: DeviceOptions) {
        self.options = options;
    }

    /// The parsed database, once loaded.
    pub fn database(&self) -> Option<&DeviceDatabase> {
        self.db.as_ref()
    }

    /// Database entry id for a track key.
    pub fn entry_id(&self, key: &str) -> Option<u32> {
        self.ids.get(key).copied()
    }

    fn import(db: &DeviceDatabase, job: &mut JobRun) -> Result<(Vec<Track>, HashMap<String, u32>)> {
        let mut tracks = Vec::with_capacity(db.entries.len());
        let mut ids = HashMap::with_capacity(db.entries.len());
        for entry in &db.entries {
            if job.is_cancelled() {
                return Err(CollectionError::Interrupted);
            }
            if entry.media_kind == MediaKind::Audio {
                let track = Track::from_device(entry);
                ids.entry(track.key().to_string()).or_insert(entry.id);
                tracks.push(track);
            }
            job.advance();
        }
        Ok((tracks, ids))
    }

    fn db_mut(&mut self) -> Result<&mut DeviceDatabase> {
        let mount = &self.mount;
        self.db
            .as_mut()
            .ok_or_else(|| CollectionError::SourceUnavailable {
                path: database_path(mount),
            })
    }

    fn free_media_path(&self, key: &str, ext: &str) -> PathBuf {
        let music = music_dir(&self.mount);
        let mut attempt = 0;
        loop {
            let rel = candidate_path(key, ext, attempt);
            if !music.join(&rel).exists() {
                return music.join(rel);
            }
            attempt += 1;
        }
    }
}

impl Collection for DeviceCollection {
    fn state(&self) -> &CollectionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CollectionState {
        &mut self.state
    }

    fn kind(&self) -> CollectionKind {
        CollectionKind::Device
    }

    fn load_from_path(&mut self, path: &Path, flush_first: bool) -> Result<()> {
        if flush_first {
            self.flush()?;
        }
        let db = DeviceDatabase::open(path)?;

        let description = format!("Reading device database at {}", path.display());
        let mut job = self.state.start_job(&description, true, db.entries.len());
        self.state.set_enabled(false);

        let result = Self::import(&db, &mut job).map(|(tracks, ids)| {
            info!(collection = %self.state.name(), tracks = tracks.len(), "loaded device");
            self.mount = path.to_path_buf();
            self.db = Some(db);
            self.ids = ids;
            self.state.replace_tracks(tracks);
            self.state.set_modified(false);
        });
        self.state.finish_load(job, result)
    }

    /// Pending changes are written first, then the database is parsed again.
    fn refresh(&mut self) -> Result<()> {
        let mount = self.mount.clone();
        self.load_from_path(&mount, true)
    }

    fn mount_point(&self) -> &Path {
        &self.mount
    }

    fn relative_path(&self, key: &str) -> Option<PathBuf> {
        self.state.track(key).map(|t| t.path().to_path_buf())
    }

    fn flush(&mut self) -> Result<()> {
        if !self.state.is_modified() {
            return Ok(());
        }
        if let Some(db) = &self.db {
            db.write(&self.mount)?;
        }
        self.state.set_modified(false);
        Ok(())
    }

    /// Removes the media file and artwork, detaches the entry from every
    /// playlist and drops playlists that end up empty.
    fn quiet_delete_track(&mut self, key: &str) -> Result<()> {
        let id = self
            .ids
            .get(key)
            .copied()
            .ok_or_else(|| CollectionError::TrackNotFound { key: key.into() })?;
        let media = self.absolute_path(key);
        if let Some(media) = media {
            fs::remove_file(media)?;
        }

        let mount = self.mount.clone();
        let db = self.db_mut()?;
        db.detach(id);
        let artwork = db.remove_entry(id).and_then(|entry| entry.artwork);
        if let Some(art) = artwork {
            let art = mount.join(device_path_to_relative(&art));
            if let Err(e) = fs::remove_file(&art) {
                debug!("could not remove artwork {}: {e}", art.display());
            }
        }

        self.ids.remove(key);
        self.state.remove(key);
        self.state.set_modified(true);
        Ok(())
    }

    fn quiet_copy_track(&mut self, source: &dyn Collection, key: &str) -> Result<()> {
        if self.state.contains(key) {
            debug!(key, "already on device");
            return Ok(());
        }
        let not_found = || CollectionError::TrackNotFound { key: key.into() };
        let track = source.state().track(key).ok_or_else(not_found)?;
        let from = source.absolute_path(key).ok_or_else(not_found)?;
        let meta = track.meta().clone();

        let ext = from.extension().and_then(|e| e.to_str()).unwrap_or("");
        let dest = self.free_media_path(key, ext);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&from, &dest)?;

        let art = if self.options.album_artwork {
            let embedded = self.tags.read(&from).ok().and_then(|info| info.cover_art);
            find_artwork(embedded, &from)
        } else {
            None
        };

        let rel = dest.strip_prefix(&self.mount).unwrap_or(dest.as_path());
        let entry = DeviceEntry {
            id: 0,
            media_kind: MediaKind::Audio,
            device_path: relative_to_device_path(rel),
            sort: sort_fields(&meta, &self.options.sort_prefixes),
            meta,
            artwork: None,
        };

        let mount = self.mount.clone();
        let added = self.db_mut().and_then(|db| db.add_entry(entry));
        let id = match added {
            Ok(id) => id,
            Err(e) => {
                let _ = fs::remove_file(&dest);
                return Err(e);
            }
        };
        let db = self.db_mut()?;
        if let Some(art) = art {
            match artwork::store(&mount, id, &art) {
                Ok(device_path) => {
                    if let Some(e) = db.entries.iter_mut().find(|e| e.id == id) {
                        e.artwork = Some(device_path);
                    }
                }
                Err(e) => warn!("could not store artwork for entry {id}: {e}"),
            }
        }
        db.add_to_master(id);

        let copied = db.entry(id).map(Track::from_device).ok_or_else(not_found)?;
        self.ids.insert(copied.key().to_string(), id);
        self.state.insert(copied);
        self.state.set_modified(true);
        Ok(())
    }

    fn save_state(&self, mut writer: &mut dyn Write) -> Result<()> {
        self.write_state(&mut writer)
    }
}

impl Drop for DeviceCollection {
    fn drop(&mut self) {
        if self.state.is_modified() {
            match self.flush() {
                Ok(()) => debug!(collection = %self.state.name(), "flushed device on close"),
                Err(e) => warn!(collection = %self.state.name(), "could not write device database: {e}"),
            }
        }
    }
}
