use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::trace;

use crate::display::DisplayDescriptor;
use crate::error::Result;
use crate::job::{CancellationToken, CollectionEvent, EventSink, JobRun, SilentSink};
use crate::track::Track;

/// Track set and flags every collection variant carries.
///
/// `tracks` is keyed by hash key; `order` is the sorted view. Both are only
/// touched together, through `insert`/`remove`/`replace_tracks`/`clear`.
/// Removed keys stay in `order` as tombstones until the next compaction, so
/// a bulk delete does not shift the view once per track.
pub struct CollectionState {
    name: String,
    tracks: HashMap<String, Track>,
    order: Vec<String>,
    removed: HashSet<String>,
    enabled: bool,
    modified: bool,
    save_on_exit: bool,
    interrupt: CancellationToken,
    display: Option<Arc<DisplayDescriptor>>,
    events: Arc<dyn EventSink>,
}

impl CollectionState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tracks: HashMap::new(),
            order: Vec::new(),
            removed: HashSet::new(),
            enabled: true,
            modified: false,
            save_on_exit: true,
            interrupt: CancellationToken::new(),
            display: None,
            events: Arc::new(SilentSink),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_events(&mut self, events: Arc<dyn EventSink>) {
        self.events = events;
    }

    pub fn events(&self) -> Arc<dyn EventSink> {
        self.events.clone()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.tracks.contains_key(key)
    }

    pub fn track(&self, key: &str) -> Option<&Track> {
        self.tracks.get(key)
    }

    /// Keys in sorted-view order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order
            .iter()
            .filter(|k| !self.removed.contains(k.as_str()))
            .map(String::as_str)
    }

    /// Tracks in sorted-view order.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.order.iter().filter_map(|k| self.tracks.get(k))
    }

    /// Add a track. Returns false, keeping the existing track, when the key is taken.
    pub fn insert(&mut self, track: Track) -> bool {
        if self.tracks.contains_key(track.key()) {
            trace!(collection = %self.name, key = track.key(), "duplicate key ignored");
            return false;
        }
        if self.removed.contains(track.key()) {
            self.compact();
        }
        self.order.push(track.key().to_string());
        self.tracks.insert(track.key().to_string(), track);
        true
    }

    pub fn remove(&mut self, key: &str) -> Option<Track> {
        let track = self.tracks.remove(key)?;
        self.removed.insert(key.to_string());
        if self.removed.len() > self.tracks.len() {
            self.compact();
        }
        Some(track)
    }

    /// Drop tombstoned keys from the sorted view.
    fn compact(&mut self) {
        if self.removed.is_empty() {
            return;
        }
        let removed = std::mem::take(&mut self.removed);
        self.order.retain(|k| !removed.contains(k));
    }

    /// Swap in a freshly built track set and re-sort it.
    pub fn replace_tracks(&mut self, tracks: impl IntoIterator<Item = Track>) {
        self.clear();
        for t in tracks {
            self.insert(t);
        }
        self.sort();
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.order.clear();
        self.removed.clear();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.events.emit(CollectionEvent::EnabledChanged {
                collection: self.name.clone(),
                enabled,
            });
        }
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    pub fn save_on_exit(&self) -> bool {
        self.save_on_exit
    }

    pub fn set_save_on_exit(&mut self, save: bool) {
        self.save_on_exit = save;
    }

    /// Handle other threads use to interrupt this collection's jobs.
    pub fn interrupt_handle(&self) -> CancellationToken {
        self.interrupt.clone()
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupt.is_cancelled()
    }

    pub fn display(&self) -> Option<&Arc<DisplayDescriptor>> {
        self.display.as_ref()
    }

    /// Replace the shared descriptor and re-sort.
    pub fn set_display(&mut self, display: Option<Arc<DisplayDescriptor>>) {
        self.display = display;
        self.sort();
        self.notify_contents_changed();
    }

    /// Re-order the sorted view by the display descriptor.
    ///
    /// Without a descriptor the current order is kept. The sort is stable, so
    /// sorting twice gives the same order as sorting once.
    pub fn sort(&mut self) {
        self.compact();
        let Some(display) = self.display.as_ref() else {
            return;
        };
        if self.order.len() <= 1 {
            return;
        }
        let tracks = &self.tracks;
        self.order.sort_by(|a, b| match (tracks.get(a), tracks.get(b)) {
            (Some(ta), Some(tb)) => display.compare(ta, tb),
            _ => std::cmp::Ordering::Equal,
        });
    }

    pub fn notify_contents_changed(&self) {
        self.events.emit(CollectionEvent::ContentsChanged {
            collection: self.name.clone(),
        });
    }

    /// Begin a job: clears any stale interruption and emits start/bounds.
    pub fn start_job(&mut self, description: &str, interruptible: bool, total: usize) -> JobRun {
        self.interrupt.reset();
        JobRun::start(
            &self.name,
            self.events.clone(),
            self.interrupt.clone(),
            description,
            interruptible,
            total,
        )
    }

    /// Close a load or refresh job: re-enable, then either announce the new
    /// contents or report the job as cancelled and hand the error back.
    pub fn finish_load(&mut self, job: JobRun, result: Result<()>) -> Result<()> {
        self.set_enabled(true);
        match result {
            Ok(()) => {
                self.notify_contents_changed();
                job.finish();
                Ok(())
            }
            Err(e) => {
                job.cancel();
                Err(e)
            }
        }
    }

    pub(crate) fn order_index(&self, row: usize) -> Option<&Track> {
        if self.removed.is_empty() {
            self.order.get(row).and_then(|k| self.tracks.get(k))
        } else {
            self.tracks().nth(row)
        }
    }
}
