//! Track value objects.
//!
//! A `Track` is a metadata snapshot of one media item plus its derived hash
//! key. File-backed tracks are built through a `TagReader` and can be
//! persisted; device-backed ones come straight from the device database.

mod display;
mod model;
mod persist;
mod tags;

pub use display::{cell_text, format_length};
pub use model::{ColumnValue, Track, TrackMetadata, TrackOrigin};
pub use persist::TRACK_RECORD_VERSION;
pub(crate) use persist::read_version;
pub use tags::{LoftyTagReader, TagInfo, TagReader};

#[cfg(test)]
mod tests;
