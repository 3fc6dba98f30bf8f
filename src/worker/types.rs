//! Commands, events and handles of the worker thread.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use crate::collection::{CollectionKind, CollectionState, SyncPlan};
use crate::display::DisplayDescriptor;
use crate::job::{CancellationToken, CollectionEvent, EventSink, JobOutcome};

#[derive(Debug)]
pub enum WorkerCmd {
    /// Open `path` as a new collection named `name`.
    Open { name: String, path: PathBuf },
    /// Flush and close a collection.
    Close { name: String },
    Refresh { name: String },
    /// Make `dest` hold exactly the tracks of `source`.
    Sync { source: String, dest: String },
    /// Compute what `Sync` would do without doing it.
    PlanSync { source: String, dest: String },
    Delete { name: String, keys: Vec<String> },
    Copy {
        source: String,
        dest: String,
        keys: Vec<String>,
    },
    /// Ask for the tabular view of a collection.
    Table { name: String },
    /// Replace the display descriptor of every collection.
    SetDisplay(DisplayDescriptor),
    SaveSession { path: PathBuf },
    RestoreSession { path: PathBuf },
    /// Flush everything and stop the thread.
    Quit,
}

/// Rendered rows of one collection, in sorted-view order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Track key of each row.
    pub keys: Vec<String>,
}

impl Table {
    pub fn of(state: &CollectionState) -> Self {
        Self {
            headers: state.headers(),
            rows: (0..state.row_count()).map(|r| state.row(r)).collect(),
            keys: state.keys().map(str::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// Forwarded from a collection.
    Collection(CollectionEvent),
    Opened {
        name: String,
        kind: CollectionKind,
        tracks: usize,
    },
    Closed { name: String },
    Refreshed { name: String },
    Plan {
        source: String,
        dest: String,
        plan: SyncPlan,
    },
    /// A bulk job on `name` ended.
    Finished { name: String, outcome: JobOutcome },
    Table { name: String, table: Table },
    DisplayChanged,
    SessionSaved { path: PathBuf },
    SessionRestored { names: Vec<String> },
    /// A command could not run.
    Failed { command: String, error: String },
    /// The thread has flushed everything and is about to exit.
    Stopped,
}

/// Interruption tokens by collection name, readable while the worker is busy.
pub type InterruptHandles = Arc<Mutex<HashMap<String, CancellationToken>>>;

impl EventSink for Sender<WorkerEvent> {
    fn emit(&self, event: CollectionEvent) {
        let _ = self.send(WorkerEvent::Collection(event));
    }
}
