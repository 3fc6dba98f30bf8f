//! The collection abstraction.
//!
//! A collection owns a set of tracks keyed by hash key plus a sorted view of
//! them. Variants (`DirectoryCollection`, `DeviceCollection`) implement the
//! backend primitives of [`Collection`]; the bulk operations and the sync
//! algorithm come from [`CollectionExt`].

mod ops;
mod plan;
mod state;
mod table;

pub use ops::{Collection, CollectionExt, CollectionKind};
pub use plan::SyncPlan;
pub use state::CollectionState;
