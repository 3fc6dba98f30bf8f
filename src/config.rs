//! Settings schema and loader.
//!
//! Settings come from an optional TOML file overlaid with `MEDIASYNC__*`
//! environment variables.

mod load;
mod schema;

pub use load::{default_config_path, resolve_config_path};
pub use schema::*;
