use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Result;
use crate::job::{JobOutcome, JobRun};
use crate::track::Track;

use super::plan::SyncPlan;
use super::state::CollectionState;

/// Which backend a collection lives on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CollectionKind {
    Directory,
    Device,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKind::Directory => f.write_str("directory"),
            CollectionKind::Device => f.write_str("device"),
        }
    }
}

/// Backend primitives a collection variant supplies.
///
/// Bulk operations built on these live in [`CollectionExt`] and cannot be
/// overridden.
pub trait Collection: Send {
    fn state(&self) -> &CollectionState;
    fn state_mut(&mut self) -> &mut CollectionState;
    fn kind(&self) -> CollectionKind;

    /// Rebuild the track set from `path`.
    ///
    /// Polls the interruption flag once per item. On any failure, interruption
    /// included, the previously committed tracks are left as they were.
    fn load_from_path(&mut self, path: &Path, flush_first: bool) -> Result<()>;

    /// Bring the track set up to date with the backing store.
    fn refresh(&mut self) -> Result<()>;

    fn mount_point(&self) -> &Path;
    fn relative_path(&self, key: &str) -> Option<PathBuf>;

    fn absolute_path(&self, key: &str) -> Option<PathBuf> {
        self.relative_path(key).map(|rel| self.mount_point().join(rel))
    }

    /// Commit pending external writes and clear the modified flag.
    fn flush(&mut self) -> Result<()>;

    fn quiet_delete_track(&mut self, key: &str) -> Result<()>;
    fn quiet_copy_track(&mut self, source: &dyn Collection, key: &str) -> Result<()>;

    /// Persist collection identity (and, where cheap to reuse, its tracks).
    fn save_state(&self, writer: &mut dyn Write) -> Result<()>;
}

/// Bulk operations every collection gets.
pub trait CollectionExt: Collection {
    fn delete_tracks(&mut self, keys: &[String]) -> JobOutcome;
    fn copy_tracks(&mut self, source: &dyn Collection, keys: &[String]) -> JobOutcome;

    /// Make this collection's key set equal to `source`'s: delete first, then copy.
    ///
    /// `source` is disabled for the duration and its track set is never changed.
    fn sync_from(&mut self, source: &mut dyn Collection) -> JobOutcome;

    fn sort(&mut self);

    /// Ask the running job to stop at its next item.
    fn interrupt(&self);
}

fn describe(track: Option<&Track>, key: &str) -> String {
    match track {
        Some(t) if t.artist().is_empty() => format!("'{}'", t.title()),
        Some(t) => format!("'{}' by {}", t.title(), t.artist()),
        None => key.to_string(),
    }
}

/// Run `step` over `items` under the job template. Returns false when interrupted.
fn process<T, F>(target: &mut T, job: &mut JobRun, items: &[(String, String)], mut step: F) -> bool
where
    T: Collection + ?Sized,
    F: FnMut(&mut T, &str) -> Result<()>,
{
    for (key, label) in items {
        if job.is_cancelled() {
            return false;
        }
        let result = step(target, key);
        job.record(result, || label.clone());
        job.advance();
    }
    true
}

fn labelled(state: &CollectionState, keys: &[String], verb: &str) -> Vec<(String, String)> {
    keys.iter()
        .map(|k| (k.clone(), format!("Failed to {verb} {}", describe(state.track(k), k))))
        .collect()
}

impl<T: Collection + ?Sized> CollectionExt for T {
    fn delete_tracks(&mut self, keys: &[String]) -> JobOutcome {
        let items = labelled(self.state(), keys, "delete");
        let description = format!("Deleting {} tracks from {}", keys.len(), self.state().name());
        let mut job = self.state_mut().start_job(&description, true, items.len());
        self.state_mut().set_enabled(false);

        let completed = process(self, &mut job, &items, |c, k| c.quiet_delete_track(k));
        flush_after(self, &mut job, completed);
        end_bulk(self, job, completed)
    }

    fn copy_tracks(&mut self, source: &dyn Collection, keys: &[String]) -> JobOutcome {
        let items = labelled(source.state(), keys, "copy");
        let description = format!(
            "Copying {} tracks from {} to {}",
            keys.len(),
            source.state().name(),
            self.state().name()
        );
        let mut job = self.state_mut().start_job(&description, true, items.len());
        self.state_mut().set_enabled(false);

        let completed = process(self, &mut job, &items, |c, k| c.quiet_copy_track(source, k));
        flush_after(self, &mut job, completed);
        end_bulk(self, job, completed)
    }

    fn sync_from(&mut self, source: &mut dyn Collection) -> JobOutcome {
        source.state_mut().set_enabled(false);
        self.state_mut().set_enabled(false);

        let plan = SyncPlan::between(self.state(), source.state());
        info!(
            dest = %self.state().name(),
            source = %source.state().name(),
            delete = plan.to_delete.len(),
            copy = plan.to_copy.len(),
            "sync plan"
        );
        let deletes = labelled(self.state(), &plan.to_delete, "delete");
        let copies = labelled(source.state(), &plan.to_copy, "copy");
        let description = format!(
            "Synchronizing {} from {}",
            self.state().name(),
            source.state().name()
        );
        let mut job = self.state_mut().start_job(&description, true, plan.len());

        let src: &dyn Collection = &*source;
        let completed = process(self, &mut job, &deletes, |c, k| c.quiet_delete_track(k))
            && process(self, &mut job, &copies, |c, k| c.quiet_copy_track(src, k));

        source.state_mut().set_enabled(true);
        // Interrupted or not, whatever was already transferred is kept.
        flush_after(self, &mut job, completed);
        end_bulk(self, job, completed)
    }

    fn sort(&mut self) {
        self.state_mut().sort();
        self.state().notify_contents_changed();
    }

    fn interrupt(&self) {
        self.state().interrupt_handle().cancel();
    }
}

fn flush_after<T: Collection + ?Sized>(target: &mut T, job: &mut JobRun, completed: bool) {
    let flushed = target.flush();
    if completed {
        job.record(flushed, || "Failed to write collection".to_string());
    } else if let Err(e) = flushed {
        warn!(collection = %target.state().name(), "flush after interrupted job failed: {e}");
    }
}

fn end_bulk<T: Collection + ?Sized>(target: &mut T, job: JobRun, completed: bool) -> JobOutcome {
    let state = target.state_mut();
    state.sort();
    state.notify_contents_changed();
    state.set_enabled(true);
    if completed { job.finish() } else { job.cancel() }
}
