//! Job and progress protocol shared by every long-running collection operation.

mod run;
mod types;

pub use run::JobRun;
pub use types::{CancellationToken, CollectionEvent, EventSink, JobOutcome, SilentSink};
