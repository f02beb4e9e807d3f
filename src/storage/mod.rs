//! Storage Layer - SQLite-backed persistence
//!
//! System of record is a single SQLite table:
//! - prefs(user, channel, broker, plugin, pkey, value)
//!
//! (user, channel, broker, plugin, pkey) is the primary key, so there is at
//! most one stored value per exact scope and key.

pub mod schema;
pub mod sqlite;

pub use sqlite::{SqliteStore, Column, Predicate, RowResult, DbStats};
