//! Named set of open collections.
//!
//! The registry decides which backend a path needs, keeps names unique,
//! hands every collection the same display descriptor and saves the open
//! set between runs.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::collection::{Collection, CollectionExt, CollectionKind, SyncPlan};
use crate::config::Settings;
use crate::device::{DeviceCollection, DeviceOptions};
use crate::directory::{DirectoryCollection, DirectoryOptions};
use crate::display::DisplayDescriptor;
use crate::error::{CollectionError, Result};
use crate::job::{CancellationToken, EventSink, JobOutcome, SilentSink};
use crate::track::{TagReader, read_version};

/// Highest session file version this build writes and reads.
pub const SESSION_VERSION: u32 = 1;

/// Which backend `path` needs, if any.
///
/// A directory holding `iPod_Control/iTunes` is a device; any other directory
/// is a plain folder.
pub fn detect_kind(path: &Path) -> Option<CollectionKind> {
    if !path.is_dir() {
        return None;
    }
    if path.join("iPod_Control").join("iTunes").is_dir() {
        Some(CollectionKind::Device)
    } else {
        Some(CollectionKind::Directory)
    }
}

fn kind_tag(kind: CollectionKind) -> u8 {
    match kind {
        CollectionKind::Directory => 0,
        CollectionKind::Device => 1,
    }
}

pub struct Registry {
    collections: Vec<Box<dyn Collection>>,
    display: Arc<DisplayDescriptor>,
    settings: Settings,
    tags: Arc<dyn TagReader>,
    events: Arc<dyn EventSink>,
}

impl Registry {
    pub fn new(settings: Settings, tags: Arc<dyn TagReader>) -> Self {
        Self {
            collections: Vec::new(),
            display: Arc::new(settings.display.clone()),
            settings,
            tags,
            events: Arc::new(SilentSink),
        }
    }

    /// Route every collection's events, current and future, to `events`.
    pub fn set_events(&mut self, events: Arc<dyn EventSink>) {
        for c in &mut self.collections {
            c.state_mut().set_events(events.clone());
        }
        self.events = events;
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn display(&self) -> Arc<DisplayDescriptor> {
        self.display.clone()
    }

    fn directory_options(&self) -> DirectoryOptions {
        DirectoryOptions {
            recursive: self.settings.library.recursive,
            auto_organize: self.settings.sync.auto_organize,
        }
    }

    fn device_options(&self) -> DeviceOptions {
        DeviceOptions {
            album_artwork: self.settings.sync.album_artwork,
            sort_prefixes: self.settings.sync.sort_prefixes.clone(),
        }
    }

    fn instantiate(&self, name: &str, path: &Path, kind: CollectionKind) -> Box<dyn Collection> {
        match kind {
            CollectionKind::Directory => Box::new(DirectoryCollection::new(
                name,
                path,
                self.directory_options(),
                self.settings.library.clone(),
                self.tags.clone(),
            )),
            CollectionKind::Device => Box::new(DeviceCollection::new(
                name,
                path,
                self.device_options(),
                self.tags.clone(),
            )),
        }
    }

    fn attach(&self, collection: &mut dyn Collection) {
        let state = collection.state_mut();
        state.set_events(self.events.clone());
        state.set_display(Some(self.display.clone()));
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.collections
            .iter()
            .position(|c| c.state().name() == name)
            .ok_or_else(|| CollectionError::UnknownCollection { name: name.into() })
    }

    fn ensure_unique(&self, name: &str) -> Result<()> {
        if self.contains(name) {
            return Err(CollectionError::DuplicateName { name: name.into() });
        }
        Ok(())
    }

    fn ensure_enabled(collection: &dyn Collection) -> Result<()> {
        if collection.state().is_enabled() {
            Ok(())
        } else {
            Err(CollectionError::Disabled {
                name: collection.state().name().to_string(),
            })
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.collections.iter().any(|c| c.state().name() == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collections.iter().map(|c| c.state().name())
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Collection> {
        self.collections
            .iter()
            .find(|c| c.state().name() == name)
            .map(|c| &**c)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn Collection + 'static)> {
        let idx = self.index_of(name).ok()?;
        Some(self.collections[idx].as_mut())
    }

    /// Open `path` under `name`, picking the backend from what is on disk.
    ///
    /// Nothing is registered unless the initial load succeeds.
    pub fn open(&mut self, name: &str, path: &Path) -> Result<&mut (dyn Collection + 'static)> {
        self.open_with(name, path, |_, _| {})
    }

    /// Like [`open`](Self::open), but hands the new collection's interrupt
    /// token to `on_token` before the initial load starts.
    pub fn open_with<F>(
        &mut self,
        name: &str,
        path: &Path,
        on_token: F,
    ) -> Result<&mut (dyn Collection + 'static)>
    where
        F: FnOnce(&str, CancellationToken),
    {
        self.ensure_unique(name)?;
        let kind = detect_kind(path).ok_or_else(|| CollectionError::UnrecognizedPath {
            path: path.to_path_buf(),
        })?;

        let mut collection = self.instantiate(name, path, kind);
        self.attach(collection.as_mut());
        on_token(name, collection.state().interrupt_handle());
        collection.load_from_path(path, false)?;
        info!(name, %kind, path = %path.display(), tracks = collection.state().len(), "opened collection");

        self.collections.push(collection);
        let last = self.collections.len() - 1;
        Ok(self.collections[last].as_mut())
    }

    /// Flush and forget `name`. A failed flush keeps it open.
    pub fn close(&mut self, name: &str) -> Result<()> {
        let idx = self.index_of(name)?;
        self.collections[idx].flush()?;
        self.collections.remove(idx);
        info!(name, "closed collection");
        Ok(())
    }

    pub fn refresh(&mut self, name: &str) -> Result<()> {
        let idx = self.index_of(name)?;
        let collection = self.collections[idx].as_mut();
        Self::ensure_enabled(collection)?;
        collection.refresh()
    }

    /// What `sync(source, dest)` would do, without doing it.
    pub fn plan(&self, source: &str, dest: &str) -> Result<SyncPlan> {
        let src = self.collections[self.index_of(source)?].state();
        let dst = self.collections[self.index_of(dest)?].state();
        Ok(SyncPlan::between(dst, src))
    }

    fn pair_mut(
        &mut self,
        source: &str,
        dest: &str,
    ) -> Result<Option<(&mut Box<dyn Collection>, &mut Box<dyn Collection>)>> {
        let s = self.index_of(source)?;
        let d = self.index_of(dest)?;
        if s == d {
            return Ok(None);
        }
        let (src, dst) = if s < d {
            let (left, right) = self.collections.split_at_mut(d);
            (&mut left[s], &mut right[0])
        } else {
            let (left, right) = self.collections.split_at_mut(s);
            (&mut right[0], &mut left[d])
        };
        Self::ensure_enabled(&**src)?;
        Self::ensure_enabled(&**dst)?;
        Ok(Some((src, dst)))
    }

    /// Make `dest` hold exactly the tracks of `source`.
    pub fn sync(&mut self, source: &str, dest: &str) -> Result<JobOutcome> {
        match self.pair_mut(source, dest)? {
            Some((src, dst)) => Ok(dst.sync_from(&mut **src)),
            None => Ok(JobOutcome::Completed),
        }
    }

    pub fn copy(&mut self, source: &str, dest: &str, keys: &[String]) -> Result<JobOutcome> {
        match self.pair_mut(source, dest)? {
            Some((src, dst)) => Ok(dst.copy_tracks(&**src, keys)),
            None => Ok(JobOutcome::Completed),
        }
    }

    pub fn delete(&mut self, name: &str, keys: &[String]) -> Result<JobOutcome> {
        let idx = self.index_of(name)?;
        let collection = self.collections[idx].as_mut();
        Self::ensure_enabled(collection)?;
        Ok(collection.delete_tracks(keys))
    }

    /// Swap in a new descriptor for every collection.
    pub fn set_display(&mut self, display: DisplayDescriptor) {
        self.display = Arc::new(display);
        for c in &mut self.collections {
            c.state_mut().set_display(Some(self.display.clone()));
        }
    }

    pub fn interrupt_handles(&self) -> Vec<(String, CancellationToken)> {
        self.collections
            .iter()
            .map(|c| (c.state().name().to_string(), c.state().interrupt_handle()))
            .collect()
    }

    /// Flush every collection, reporting the first failure after trying all.
    pub fn flush_all(&mut self) -> Result<()> {
        let mut first = None;
        for c in &mut self.collections {
            if let Err(e) = c.flush() {
                warn!(collection = %c.state().name(), "flush failed: {e}");
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }

    /// Write every collection marked save-on-exit to `path`.
    pub fn save_session(&self, path: &Path) -> Result<()> {
        let saved: Vec<&dyn Collection> = self
            .collections
            .iter()
            .map(|c| &**c)
            .filter(|c| c.state().save_on_exit())
            .collect();

        let mut out = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut out, &SESSION_VERSION)?;
        bincode::serialize_into(&mut out, &(saved.len() as u64))?;
        for c in &saved {
            bincode::serialize_into(&mut out, &kind_tag(c.kind()))?;
            c.save_state(&mut out)?;
        }
        out.flush()?;
        info!(collections = saved.len(), path = %path.display(), "saved session");
        Ok(())
    }

    /// Re-open what `save_session` wrote.
    ///
    /// Folders come back from their cached tracks; devices are re-read and
    /// skipped with a warning when absent. Names already open are skipped too.
    /// An unreadable file registers nothing.
    pub fn restore_session(&mut self, path: &Path) -> Result<Vec<String>> {
        let mut reader = BufReader::new(File::open(path)?);
        read_version(&mut reader, SESSION_VERSION)?;
        let count: u64 = bincode::deserialize_from(&mut reader)?;

        let mut restored: Vec<Box<dyn Collection>> = Vec::new();
        for _ in 0..count {
            let tag: u8 = bincode::deserialize_from(&mut reader)?;
            let collection: Box<dyn Collection> = match tag {
                0 => {
                    let mut dir = DirectoryCollection::restore(
                        &mut reader,
                        self.settings.library.clone(),
                        self.tags.clone(),
                    )?;
                    // Options given for this run beat the ones saved with it.
                    dir.set_options(self.directory_options());
                    Box::new(dir)
                }
                1 => Box::new(DeviceCollection::restore(
                    &mut reader,
                    self.device_options(),
                    self.tags.clone(),
                )?),
                other => {
                    return Err(CollectionError::Malformed {
                        path: path.to_path_buf(),
                        message: format!("unknown collection kind tag {other}"),
                    });
                }
            };
            restored.push(collection);
        }

        let mut names = Vec::new();
        for mut collection in restored {
            let name = collection.state().name().to_string();
            if self.contains(&name) {
                warn!(name = %name, "already open, not restored");
                continue;
            }
            self.attach(collection.as_mut());
            if collection.kind() == CollectionKind::Device {
                let mount = collection.mount_point().to_path_buf();
                if let Err(e) = collection.load_from_path(&mount, false) {
                    warn!(name = %name, "device not restored: {e}");
                    continue;
                }
            }
            names.push(name);
            self.collections.push(collection);
        }
        info!(collections = names.len(), "restored session");
        Ok(names)
    }
}

#[cfg(test)]
mod tests;
