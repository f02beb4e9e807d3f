//! Preference query engine
//!
//! Provides the matching operations over the prefs table:
//! - Exact match: all four scope fields AND (optionally) the key
//! - Scoped multi-get: exact match on scope, every key
//! - Union find: any of the non-empty fields (OR)
//! - Writes, re-read through the exact matcher

use crate::{Error, Result};
use crate::pref::{Pref, PrefSet};
use crate::scope::Scope;
use crate::storage::{Predicate, RowResult, SqliteStore};

/// Query engine for preference lookups and writes
pub struct PrefEngine<'a> {
    store: &'a SqliteStore,
}

impl<'a> PrefEngine<'a> {
    /// Create a new engine over a store handle
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    /// Fetch the single record stored for the handle's exact scope and key.
    ///
    /// A miss returns a copy of the handle with `found=false` and the
    /// default as value. More than one row means the primary key invariant
    /// is broken and yields `Error::Corruption`.
    pub fn get(&self, handle: &Pref) -> Result<Pref> {
        let scope = handle.scope();
        let mut rows = self.store.query(&Predicate::exact(&scope, &handle.key));

        match rows.len() {
            0 => Ok(handle.not_found()),
            1 => Ok(match rows.remove(0) {
                Ok(stored) => Pref {
                    default: handle.default.clone(),
                    ..stored
                },
                Err(e) => {
                    tracing::warn!("Returning default due to row decode failure: {}", e);
                    handle.failed(e)
                }
            }),
            count => {
                tracing::error!(%scope, key = %handle.key, count, "Multiple prefs stored for a unique key");
                Err(Error::Corruption {
                    scope,
                    key: handle.key.clone(),
                    count,
                })
            }
        }
    }

    /// All keys stored for exactly this scope.
    ///
    /// Empty dimensions match only rows where that column is empty too:
    /// `get_many(&Scope::global().with_plugin("uptime"))` does not return a
    /// row for user "pford" and plugin "uptime".
    pub fn get_many(&self, scope: &Scope) -> PrefSet {
        let handle = Pref::new(scope, "");
        let rows = self.store.query(&Predicate::exact(scope, ""));
        collect_rows(rows, &handle)
    }

    /// Prefs scoped to `user` alone (every other dimension empty)
    pub fn get_user_prefs(&self, user: &str) -> PrefSet {
        self.get_many(&Scope::global().with_user(user))
    }

    pub fn get_channel_prefs(&self, channel: &str) -> PrefSet {
        self.get_many(&Scope::global().with_channel(channel))
    }

    pub fn get_broker_prefs(&self, broker: &str) -> PrefSet {
        self.get_many(&Scope::global().with_broker(broker))
    }

    pub fn get_plugin_prefs(&self, plugin: &str) -> PrefSet {
        self.get_many(&Scope::global().with_plugin(plugin))
    }

    /// Every record matching ANY non-empty field of the handle
    /// (user=x, broker=y becomes `WHERE user = x OR broker = y`).
    ///
    /// Empty fields are left out of the predicate, so a handle with no
    /// fields set returns the whole table. Rows that fail to decode are kept,
    /// flagged with the error and the handle's default as value.
    pub fn find(&self, handle: &Pref) -> PrefSet {
        let fallback = Pref {
            default: handle.default.clone(),
            ..Default::default()
        };
        let rows = self.store.query(&Predicate::any_of(&handle.scope(), &handle.key));
        collect_rows(rows, &fallback)
    }

    /// Write the record and return it as stored.
    ///
    /// A backend failure is logged and reported on the returned record
    /// (`found=false`, `error` set) rather than as an `Err`.
    pub fn set(&self, pref: &Pref) -> Result<Pref> {
        if pref.key.is_empty() {
            return Err(Error::InvalidKey(pref.key.clone()));
        }

        if let Err(e) = self.store.upsert(pref) {
            tracing::warn!(scope = %pref.scope(), key = %pref.key, "Failed to write pref: {}", e);
            return Ok(Pref {
                found: false,
                error: Some(e.to_string()),
                ..pref.clone()
            });
        }

        self.get(pref)
    }
}

/// Turn gateway rows into a result set, substituting `fallback` for rows
/// that could not be decoded
fn collect_rows(rows: Vec<RowResult>, fallback: &Pref) -> PrefSet {
    rows.into_iter()
        .map(|row| match row {
            Ok(pref) => Pref {
                default: fallback.default.clone(),
                ..pref
            },
            Err(e) => {
                tracing::warn!("Fetching a pref row failed: {}", e);
                fallback.failed(e)
            }
        })
        .collect()
}
