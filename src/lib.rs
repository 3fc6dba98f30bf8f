//! Keep music collections in sync: plain folders and iPod-style devices.

pub mod collection;
pub mod config;
pub mod device;
pub mod directory;
pub mod display;
pub mod error;
pub mod job;
pub mod logging;
pub mod registry;
pub mod runtime;
pub mod track;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use collection::{Collection, CollectionExt, CollectionKind, CollectionState, SyncPlan};
pub use error::{CollectionError, Result};
