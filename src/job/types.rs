//! Job-related small types and handles.
//!
//! This module defines the cancellation token, the events a collection
//! emits while it works and the sinks those events are delivered to.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;

/// Shared, lock-free interruption flag polled between job items.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request interruption. The running job stops at its next item.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub(crate) fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionEvent {
    /// A long-running operation started.
    JobStarted {
        collection: String,
        description: String,
        /// Advisory: whether cancelling is safe. Never enforced.
        interruptible: bool,
    },
    /// Progress range of the running job.
    ProgressBounds {
        collection: String,
        min: usize,
        max: usize,
    },
    /// Items processed so far.
    Progress { collection: String, value: usize },
    /// Job ended. An empty report means success or cancellation.
    JobFinished { collection: String, report: String },
    EnabledChanged { collection: String, enabled: bool },
    ContentsChanged { collection: String },
}

impl CollectionEvent {
    pub fn collection(&self) -> &str {
        match self {
            CollectionEvent::JobStarted { collection, .. }
            | CollectionEvent::ProgressBounds { collection, .. }
            | CollectionEvent::Progress { collection, .. }
            | CollectionEvent::JobFinished { collection, .. }
            | CollectionEvent::EnabledChanged { collection, .. }
            | CollectionEvent::ContentsChanged { collection } => collection,
        }
    }
}

/// Receiver of collection events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: CollectionEvent);
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl EventSink for SilentSink {
    fn emit(&self, _event: CollectionEvent) {}
}

impl EventSink for Sender<CollectionEvent> {
    fn emit(&self, event: CollectionEvent) {
        // Nobody listening is fine.
        let _ = self.send(event);
    }
}

/// How a bulk operation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    CompletedWithErrors { report: String },
    Cancelled,
}

impl JobOutcome {
    /// The report string as carried by `JobFinished`.
    pub fn report(&self) -> &str {
        match self {
            JobOutcome::CompletedWithErrors { report } => report,
            JobOutcome::Completed | JobOutcome::Cancelled => "",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, JobOutcome::Cancelled)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Completed)
    }
}
