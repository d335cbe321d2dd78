//! ringsync core library: domain types, configuration loading, errors.
//!
//! Public API surface:
//! - [`types`]: newtypes, [`Client`], [`ClientTable`], [`WatchList`]
//! - [`error`]: [`ConfigError`]
//! - [`config`]: YAML daemon configuration and validation
//! - [`plain`]: the line-oriented client table / watch list formats

pub mod config;
pub mod error;
pub mod plain;
pub mod types;

pub use config::{MirrorConfig, ReplicatorKind, ResolvedConfig, DEFAULT_CONFIG_PATH};
pub use error::ConfigError;
pub use types::{Client, ClientName, ClientTable, TrackedPath, WatchList};
