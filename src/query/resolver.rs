//! Preference Resolver
//!
//! `resolve` issues exactly one exact-match lookup for the scope it is
//! given and falls back to the caller's default. It never widens the scope
//! on its own.
//!
//! `cascade` walks the precedence order explicitly. Each level is tried as
//! the tuple it leads (broader dimensions kept) and then as that dimension
//! alone:
//! 1. User (the full scope as given, then the user alone)
//! 2. Channel (user cleared, then the channel alone)
//! 3. Broker (user and channel cleared, then the broker alone)
//! 4. Plugin (only plugin kept)
//! 5. Global (all dimensions cleared)
//! 6. The caller's default

use crate::Result;
use crate::pref::Pref;
use crate::scope::{Scope, ScopeLevel};
use crate::storage::SqliteStore;
use super::engine::PrefEngine;

/// Outcome of a precedence cascade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The resolved record; `found=false` means the default was used
    pub pref: Pref,
    /// Level that produced the value, `None` for the default
    pub level: Option<ScopeLevel>,
}

impl Resolution {
    pub fn is_default(&self) -> bool {
        self.level.is_none()
    }
}

/// Resolves preferences against a store
pub struct Resolver<'a> {
    engine: PrefEngine<'a>,
}

impl<'a> Resolver<'a> {
    /// Create a new resolver
    pub fn new(store: &'a SqliteStore) -> Self {
        Self {
            engine: PrefEngine::new(store),
        }
    }

    /// Look up `key` for exactly `scope`.
    ///
    /// On a miss the returned record keeps the requested scope, carries
    /// `value == default` and `found=false`.
    pub fn resolve(&self, scope: &Scope, key: &str, default: &str) -> Result<Pref> {
        let handle = Pref::new(scope, key).with_default(default);
        let pref = self.engine.get(&handle)?;
        if pref.found {
            return Ok(pref);
        }

        // no match, return the default
        Ok(handle.not_found())
    }

    /// Most specific stored value for `key`, trying each cascade level in
    /// order. The returned record carries the scope it was stored under.
    pub fn cascade(&self, scope: &Scope, key: &str, default: &str) -> Result<Resolution> {
        for (level, candidate) in scope.cascade() {
            let pref = self.resolve(&candidate, key, default)?;
            if pref.found {
                tracing::debug!(%level, key, "Resolved pref");
                return Ok(Resolution {
                    pref,
                    level: Some(level),
                });
            }
        }

        tracing::debug!(%scope, key, "No pref stored at any level, using default");
        Ok(Resolution {
            pref: Pref::new(scope, key).with_default(default).not_found(),
            level: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(store: &SqliteStore, scope: Scope, value: &str) {
        store.upsert(&Pref::new(&scope, "foo").with_value(value)).unwrap();
    }

    #[test]
    fn test_resolve_single_query() {
        let store = SqliteStore::open_in_memory().unwrap();
        seed(&store, Scope::global().with_plugin("uptime"), "plugin");
        let resolver = Resolver::new(&store);

        // a fuller scope is not widened to the plugin-level row
        let scope = Scope::new("tobert", "", "", "uptime");
        let pref = resolver.resolve(&scope, "foo", "dflt").unwrap();
        assert!(!pref.found);
        assert_eq!(pref.value, "dflt");
        assert_eq!(pref.scope(), scope);

        let pref = resolver
            .resolve(&Scope::global().with_plugin("uptime"), "foo", "dflt")
            .unwrap();
        assert!(pref.found);
        assert_eq!(pref.value, "plugin");
    }

    #[test]
    fn test_cascade_precedence() {
        let store = SqliteStore::open_in_memory().unwrap();
        seed(&store, Scope::global(), "global");
        seed(&store, Scope::global().with_plugin("uptime"), "plugin");
        seed(&store, Scope::new("", "", "slack", "uptime"), "broker");
        seed(&store, Scope::new("", "CORE", "slack", "uptime"), "channel");
        seed(&store, Scope::new("tobert", "CORE", "slack", "uptime"), "user");
        let resolver = Resolver::new(&store);

        let cases = [
            (Scope::new("tobert", "CORE", "slack", "uptime"), "user", ScopeLevel::User),
            (Scope::new("adent", "CORE", "slack", "uptime"), "channel", ScopeLevel::Channel),
            (Scope::new("adent", "OPS", "slack", "uptime"), "broker", ScopeLevel::Broker),
            (Scope::new("adent", "OPS", "irc", "uptime"), "plugin", ScopeLevel::Plugin),
            (Scope::new("adent", "OPS", "irc", "weather"), "global", ScopeLevel::Global),
        ];

        for (scope, expected, level) in cases {
            let res = resolver.cascade(&scope, "foo", "dflt").unwrap();
            assert_eq!(res.pref.value, expected, "scope {}", scope);
            assert_eq!(res.level, Some(level));
            assert!(res.pref.found);
        }
    }

    #[test]
    fn test_cascade_user_pref_beats_plugin_pref() {
        let store = SqliteStore::open_in_memory().unwrap();
        seed(&store, Scope::global().with_user("alice"), "UTC");
        seed(&store, Scope::global().with_plugin("weather"), "PLUGIN");
        let resolver = Resolver::new(&store);

        let res = resolver
            .cascade(&Scope::new("alice", "CORE", "slack", "weather"), "foo", "unset")
            .unwrap();
        assert_eq!(res.pref.value, "UTC");
        assert_eq!(res.level, Some(ScopeLevel::User));
        assert_eq!(res.pref.scope(), Scope::global().with_user("alice"));

        // no plugin pref for "other", the user pref still applies
        let res = resolver
            .cascade(&Scope::new("alice", "CORE", "slack", "other"), "foo", "unset")
            .unwrap();
        assert!(res.pref.found);
        assert_eq!(res.pref.value, "UTC");

        // other users fall through to the plugin pref
        let res = resolver
            .cascade(&Scope::new("bob", "CORE", "slack", "weather"), "foo", "unset")
            .unwrap();
        assert_eq!(res.pref.value, "PLUGIN");
        assert_eq!(res.level, Some(ScopeLevel::Plugin));
    }

    #[test]
    fn test_cascade_channel_alone() {
        let store = SqliteStore::open_in_memory().unwrap();
        seed(&store, Scope::global().with_channel("CORE"), "channel");
        seed(&store, Scope::global().with_plugin("uptime"), "plugin");
        let resolver = Resolver::new(&store);

        let res = resolver
            .cascade(&Scope::new("adent", "CORE", "slack", "uptime"), "foo", "dflt")
            .unwrap();
        assert_eq!(res.pref.value, "channel");
        assert_eq!(res.level, Some(ScopeLevel::Channel));
    }

    #[test]
    fn test_cascade_falls_back_to_default() {
        let store = SqliteStore::open_in_memory().unwrap();
        seed(&store, Scope::global().with_user("tobert"), "user-only");
        let resolver = Resolver::new(&store);

        let scope = Scope::new("adent", "CORE", "slack", "uptime");
        let res = resolver.cascade(&scope, "foo", "dflt").unwrap();
        assert!(res.is_default());
        assert!(!res.pref.found);
        assert_eq!(res.pref.value, "dflt");
        assert_eq!(res.pref.scope(), scope);
    }
}
