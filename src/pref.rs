//! Preference records and result sets
//!
//! A `Pref` is one key/value setting qualified by a scope. It doubles as the
//! query handle and the query result: the caller fills in scope, key and a
//! default, and the store hands back a copy with `value`/`found`/`error`
//! filled in. Records are plain values with no link back to storage.

use crate::scope::Scope;
use serde::{Deserialize, Serialize};

/// Header row of `PrefSet::table`
pub const TABLE_HEADER: [&str; 6] = ["User", "Channel", "Broker", "Plugin", "Key", "Value"];

/// A key/value pair associated with a combination of user, channel,
/// broker and plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pref {
    pub user: String,
    pub channel: String,
    pub broker: String,
    pub plugin: String,
    pub key: String,
    pub value: String,
    /// Caller-supplied fallback; never persisted
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default: String,
    /// True when the value came from storage
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Pref {
    /// Create a handle for `key` under `scope`
    pub fn new(scope: &Scope, key: impl Into<String>) -> Self {
        Self {
            user: scope.user.clone(),
            channel: scope.channel.clone(),
            broker: scope.broker.clone(),
            plugin: scope.plugin.clone(),
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    /// The scope tuple of this record
    pub fn scope(&self) -> Scope {
        Scope::new(&self.user, &self.channel, &self.broker, &self.plugin)
    }

    /// Copy of this handle reporting a miss: value falls back to the default
    pub fn not_found(&self) -> Self {
        Self {
            value: self.default.clone(),
            found: false,
            error: None,
            ..self.clone()
        }
    }

    /// Copy of this handle reporting a failure: value falls back to the default
    pub fn failed(&self, err: impl ToString) -> Self {
        Self {
            value: self.default.clone(),
            found: false,
            error: Some(err.to_string()),
            ..self.clone()
        }
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.user.clone(),
            self.channel.clone(),
            self.broker.clone(),
            self.plugin.clone(),
            self.key.clone(),
            self.value.clone(),
        ]
    }
}

/// Ordered collection of preferences returned by a query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefSet {
    prefs: Vec<Pref>,
}

impl PrefSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pref: Pref) {
        self.prefs.push(pref);
    }

    pub fn len(&self) -> usize {
        self.prefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pref> {
        self.prefs.iter()
    }

    pub fn as_slice(&self) -> &[Pref] {
        &self.prefs
    }

    /// Preferences whose user equals `user`, e.g. `prefs.user("adent")`
    pub fn user(&self, user: &str) -> PrefSet {
        self.filter(|p| p.user == user)
    }

    /// Preferences whose channel equals `channel`. Filters chain:
    /// `prefs.channel("magrathea").plugin("uptime").broker("slack")`
    pub fn channel(&self, channel: &str) -> PrefSet {
        self.filter(|p| p.channel == channel)
    }

    pub fn broker(&self, broker: &str) -> PrefSet {
        self.filter(|p| p.broker == broker)
    }

    pub fn plugin(&self, plugin: &str) -> PrefSet {
        self.filter(|p| p.plugin == plugin)
    }

    /// Preferences that decoded cleanly
    pub fn found(&self) -> PrefSet {
        self.filter(|p| p.found)
    }

    fn filter(&self, pred: impl Fn(&Pref) -> bool) -> PrefSet {
        self.prefs.iter().filter(|p| pred(*p)).cloned().collect()
    }

    /// Header row followed by one row per preference, ready for display
    pub fn table(&self) -> Vec<Vec<String>> {
        let mut out = Vec::with_capacity(self.prefs.len() + 1);
        out.push(TABLE_HEADER.iter().map(|h| h.to_string()).collect());
        out.extend(self.prefs.iter().map(Pref::row));
        out
    }
}

impl FromIterator<Pref> for PrefSet {
    fn from_iter<I: IntoIterator<Item = Pref>>(iter: I) -> Self {
        Self { prefs: iter.into_iter().collect() }
    }
}

impl IntoIterator for PrefSet {
    type Item = Pref;
    type IntoIter = std::vec::IntoIter<Pref>;

    fn into_iter(self) -> Self::IntoIter {
        self.prefs.into_iter()
    }
}

impl<'a> IntoIterator for &'a PrefSet {
    type Item = &'a Pref;
    type IntoIter = std::slice::Iter<'a, Pref>;

    fn into_iter(self) -> Self::IntoIter {
        self.prefs.iter()
    }
}

impl From<Vec<Pref>> for PrefSet {
    fn from(prefs: Vec<Pref>) -> Self {
        Self { prefs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pref(user: &str, channel: &str, broker: &str, plugin: &str, key: &str, value: &str) -> Pref {
        Pref::new(&Scope::new(user, channel, broker, plugin), key).with_value(value)
    }

    fn sample_set() -> PrefSet {
        PrefSet::from(vec![
            pref("tobert", "", "", "", "foo", "user"),
            pref("tobert", "CORE", "slack", "", "foo", "user-channel-broker"),
            pref("adent", "CORE", "slack", "uptime", "foo", "user-channel-broker-plugin"),
            pref("adent", "", "hipchat", "uptime", "bar", "user-broker-plugin"),
        ])
    }

    #[test]
    fn test_filters_preserve_order() {
        let prefs = sample_set();

        let tobert = prefs.user("tobert");
        assert_eq!(tobert.len(), 2);
        assert_eq!(tobert.as_slice()[0].value, "user");
        assert_eq!(tobert.as_slice()[1].value, "user-channel-broker");

        let chained = prefs.channel("CORE").plugin("uptime").broker("slack");
        assert_eq!(chained.len(), 1);
        assert_eq!(chained.as_slice()[0].user, "adent");

        assert!(prefs.broker("irc").is_empty());
        // the source set is untouched
        assert_eq!(prefs.len(), 4);
    }

    #[test]
    fn test_filter_by_empty_dimension() {
        let prefs = sample_set();
        let unscoped_channel = prefs.channel("");
        assert_eq!(unscoped_channel.len(), 2);
    }

    #[test]
    fn test_table_projection() {
        let table = sample_set().user("adent").table();
        assert_eq!(table.len(), 3);
        assert_eq!(table[0], vec!["User", "Channel", "Broker", "Plugin", "Key", "Value"]);
        assert_eq!(table[2], vec!["adent", "", "hipchat", "uptime", "bar", "user-broker-plugin"]);
    }

    #[test]
    fn test_table_of_empty_set_is_header_only() {
        let table = PrefSet::new().table();
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].len(), 6);
    }

    #[test]
    fn test_not_found_uses_default() {
        let handle = Pref::new(&Scope::global().with_user("bob"), "tz").with_default("unset");
        let miss = handle.not_found();
        assert!(!miss.found);
        assert_eq!(miss.value, "unset");
        assert_eq!(miss.user, "bob");
        assert!(miss.error.is_none());

        let failed = handle.failed("disk on fire");
        assert!(!failed.found);
        assert_eq!(failed.value, "unset");
        assert_eq!(failed.error.as_deref(), Some("disk on fire"));
    }
}
