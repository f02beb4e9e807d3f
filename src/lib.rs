//! # hal-prefs - Scoped preference store
//!
//! Persists key/value settings tagged with up to four scope dimensions
//! (user, channel, broker, plugin) and resolves the most specific value
//! for a lookup.
//!
//! hal-prefs provides:
//! - `Pref` / `PrefSet` records with filtering and table projection
//! - SQLite-backed storage keyed by (user, channel, broker, plugin, key)
//! - Exact, scoped multi-get and union ("find") queries
//! - Single-query resolution plus an explicit precedence cascade
//! - The broker contract consumed by the surrounding bot framework

pub mod scope;
pub mod pref;
pub mod storage;
pub mod query;
pub mod broker;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use scope::{Scope, ScopeLevel};
pub use pref::{Pref, PrefSet};
pub use storage::SqliteStore;
pub use query::{PrefEngine, Resolution, Resolver};
pub use broker::{Broker, BrokerConfig, Evt, IdTranslator};

/// Result type alias for hal-prefs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for hal-prefs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// More than one stored row for a key tuple that the primary key makes unique.
    #[error("Storage corruption: {count} rows stored for {scope} key={key:?}")]
    Corruption {
        scope: Scope,
        key: String,
        count: usize,
    },

    #[error("Invalid preference key: {0:?}")]
    InvalidKey(String),

    #[error("Broker error: {0}")]
    Broker(String),
}

impl Error {
    /// True for the multiplicity violation that must be escalated to operators
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Corruption { .. })
    }
}
