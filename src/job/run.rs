use std::fmt::Display;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::types::{CancellationToken, CollectionEvent, EventSink, JobOutcome};

/// One running job: emits start/bounds/progress/finish and collects the report.
///
/// Bulk operations drive it item by item: check `is_cancelled`, do the work,
/// `record` the result, `advance`. Already-processed items are never rolled back.
pub struct JobRun {
    collection: String,
    sink: Arc<dyn EventSink>,
    token: CancellationToken,
    report: Vec<String>,
    done: usize,
}

impl JobRun {
    pub fn start(
        collection: &str,
        sink: Arc<dyn EventSink>,
        token: CancellationToken,
        description: &str,
        interruptible: bool,
        total: usize,
    ) -> Self {
        info!(collection, total, "{description}");
        sink.emit(CollectionEvent::JobStarted {
            collection: collection.to_string(),
            description: description.to_string(),
            interruptible,
        });
        sink.emit(CollectionEvent::ProgressBounds {
            collection: collection.to_string(),
            min: 0,
            max: total,
        });
        Self {
            collection: collection.to_string(),
            sink,
            token,
            report: Vec::new(),
            done: 0,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Append a report line when `result` is an error.
    pub fn record<E: Display>(&mut self, result: Result<(), E>, what: impl FnOnce() -> String) {
        if let Err(e) = result {
            let line = format!("{}: {e}", what());
            warn!(collection = %self.collection, "{line}");
            self.report.push(line);
        }
    }

    pub fn advance(&mut self) {
        self.done += 1;
        self.sink.emit(CollectionEvent::Progress {
            collection: self.collection.clone(),
            value: self.done,
        });
    }

    /// End as cancelled: finished with an empty report.
    pub fn cancel(self) -> JobOutcome {
        debug!(collection = %self.collection, done = self.done, "job interrupted");
        self.sink.emit(CollectionEvent::JobFinished {
            collection: self.collection,
            report: String::new(),
        });
        JobOutcome::Cancelled
    }

    pub fn finish(self) -> JobOutcome {
        let report = self.report.join("\n");
        self.sink.emit(CollectionEvent::JobFinished {
            collection: self.collection.clone(),
            report: report.clone(),
        });
        if report.is_empty() {
            debug!(collection = %self.collection, done = self.done, "job completed");
            JobOutcome::Completed
        } else {
            JobOutcome::CompletedWithErrors { report }
        }
    }
}
