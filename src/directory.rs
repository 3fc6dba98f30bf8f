//! Collection backed by a plain folder of audio files.

mod organize;
mod persist;
mod scan;

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::collection::{Collection, CollectionKind, CollectionState};
use crate::config::LibrarySettings;
use crate::error::{CollectionError, Result};
use crate::job::JobRun;
use crate::track::{TagReader, Track};

pub use organize::{organized_path, sanitize_component};
pub use persist::DIRECTORY_STATE_VERSION;
pub use scan::audio_files;

/// Per-collection options, persisted with the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryOptions {
    pub recursive: bool,
    /// Copy-ins go to `Artist/Album/NN Title.ext` instead of the source's relative path.
    pub auto_organize: bool,
}

impl Default for DirectoryOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            auto_organize: false,
        }
    }
}

pub struct DirectoryCollection {
    state: CollectionState,
    root: PathBuf,
    options: DirectoryOptions,
    scan: LibrarySettings,
    tags: Arc<dyn TagReader>,
}

impl DirectoryCollection {
    pub fn new(
        name: impl Into<String>,
        root: impl Into<PathBuf>,
        options: DirectoryOptions,
        scan: LibrarySettings,
        tags: Arc<dyn TagReader>,
    ) -> Self {
        Self {
            state: CollectionState::new(name),
            root: root.into(),
            options,
            scan,
            tags,
        }
    }

    pub fn options(&self) -> DirectoryOptions {
        self.options
    }

    pub fn set_options(&mut self, options: DirectoryOptions) {
        self.options = options;
    }

    fn load_files(&self, files: &[PathBuf], job: &mut JobRun) -> Result<Vec<Track>> {
        let mut loaded = Vec::with_capacity(files.len());
        for file in files {
            if job.is_cancelled() {
                return Err(CollectionError::Interrupted);
            }
            match Track::from_file(file, self.tags.as_ref()) {
                Ok(track) => loaded.push(track),
                Err(e) => debug!("skipping {}: {e}", file.display()),
            }
            job.advance();
        }
        Ok(loaded)
    }

    fn refresh_files(&self, files: &[PathBuf], job: &mut JobRun) -> Result<Vec<Track>> {
        let cached: HashMap<&Path, &Track> =
            self.state.tracks().map(|t| (t.path(), t)).collect();

        let mut next = Vec::with_capacity(files.len());
        for file in files {
            if job.is_cancelled() {
                return Err(CollectionError::Interrupted);
            }
            let fresh = match (cached.get(file.as_path()), fs::metadata(file)) {
                (Some(track), Ok(stat)) if !track.is_stale(stat.len(), stat.modified().ok()) => {
                    Some((*track).clone())
                }
                (Some(track), Ok(_)) => {
                    let mut track = (*track).clone();
                    track.refresh(self.tags.as_ref()).ok().map(|_| track)
                }
                (None, Ok(_)) => Track::from_file(file, self.tags.as_ref()).ok(),
                (_, Err(_)) => None,
            };
            next.extend(fresh);
            job.advance();
        }
        Ok(next)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)?;
        organize::prune_empty_dirs(path.parent(), &self.root);
        Ok(())
    }
}

impl Collection for DirectoryCollection {
    fn state(&self) -> &CollectionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CollectionState {
        &mut self.state
    }

    fn kind(&self) -> CollectionKind {
        CollectionKind::Directory
    }

    fn load_from_path(&mut self, path: &Path, flush_first: bool) -> Result<()> {
        if flush_first {
            self.flush()?;
        }
        if !path.is_dir() {
            return Err(CollectionError::SourceUnavailable {
                path: path.to_path_buf(),
            });
        }

        let files = audio_files(path, &self.scan, self.options.recursive);
        let description = format!("Loading {}", path.display());
        let mut job = self.state.start_job(&description, true, files.len());
        self.state.set_enabled(false);

        let result = self.load_files(&files, &mut job).map(|tracks| {
            info!(collection = %self.state.name(), tracks = tracks.len(), "loaded folder");
            self.root = path.to_path_buf();
            self.state.replace_tracks(tracks);
            self.state.set_modified(false);
        });
        self.state.finish_load(job, result)
    }

    /// Incremental: unchanged files keep their snapshot, changed ones are
    /// re-read, vanished ones dropped and new ones added.
    fn refresh(&mut self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(CollectionError::SourceUnavailable {
                path: self.root.clone(),
            });
        }

        let files = audio_files(&self.root, &self.scan, self.options.recursive);
        let description = format!("Refreshing {}", self.root.display());
        let mut job = self.state.start_job(&description, true, files.len());
        self.state.set_enabled(false);

        let result = self.refresh_files(&files, &mut job).map(|tracks| {
            debug!(collection = %self.state.name(), tracks = tracks.len(), "refreshed folder");
            self.state.replace_tracks(tracks);
        });
        self.state.finish_load(job, result)
    }

    fn mount_point(&self) -> &Path {
        &self.root
    }

    fn relative_path(&self, key: &str) -> Option<PathBuf> {
        let track = self.state.track(key)?;
        let rel = track.path().strip_prefix(&self.root).unwrap_or(track.path());
        Some(rel.to_path_buf())
    }

    fn absolute_path(&self, key: &str) -> Option<PathBuf> {
        self.state.track(key).map(|t| t.path().to_path_buf())
    }

    fn flush(&mut self) -> Result<()> {
        self.state.set_modified(false);
        Ok(())
    }

    fn quiet_delete_track(&mut self, key: &str) -> Result<()> {
        let path = self
            .state
            .track(key)
            .map(|t| t.path().to_path_buf())
            .ok_or_else(|| CollectionError::TrackNotFound { key: key.into() })?;
        self.remove_file(&path)?;
        self.state.remove(key);
        self.state.set_modified(true);
        Ok(())
    }

    fn quiet_copy_track(&mut self, source: &dyn Collection, key: &str) -> Result<()> {
        let not_found = || CollectionError::TrackNotFound { key: key.into() };
        let track = source.state().track(key).ok_or_else(not_found)?;
        let from = source.absolute_path(key).ok_or_else(not_found)?;

        let rel = if self.options.auto_organize {
            let ext = from.extension().and_then(|e| e.to_str()).unwrap_or("");
            organized_path(track.meta(), ext)
        } else {
            source.relative_path(key).ok_or_else(not_found)?
        };
        let dest = organize::unique_path(&self.root.join(rel));
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&from, &dest)?;

        match Track::from_file(&dest, self.tags.as_ref()) {
            Ok(copied) => {
                let copied_key = copied.key().to_string();
                if !self.state.insert(copied) {
                    self.remove_file(&dest)?;
                    debug!(key = %copied_key, "copy already present, discarded");
                }
                self.state.set_modified(true);
                Ok(())
            }
            Err(e) => {
                self.remove_file(&dest)?;
                Err(e)
            }
        }
    }

    fn save_state(&self, mut writer: &mut dyn Write) -> Result<()> {
        self.write_state(&mut writer)
    }
}

#[cfg(test)]
mod tests;
