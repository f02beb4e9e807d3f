//! Scope - the four dimensions that qualify a preference
//!
//! A scope is a (user, channel, broker, plugin) tuple. An empty string in
//! any dimension means "unscoped/global" for that dimension, and is matched
//! literally by exact queries (it is not a wildcard).
//!
//! Precedence, most specific first:
//! user → channel → broker → plugin → global → default

use crate::broker::Evt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scope dimensions of a preference
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub user: String,
    pub channel: String,
    pub broker: String,
    pub plugin: String,
}

impl Scope {
    /// Create a scope from all four dimensions
    pub fn new(
        user: impl Into<String>,
        channel: impl Into<String>,
        broker: impl Into<String>,
        plugin: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            channel: channel.into(),
            broker: broker.into(),
            plugin: plugin.into(),
        }
    }

    /// The fully unscoped tuple
    pub fn global() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn with_broker(mut self, broker: impl Into<String>) -> Self {
        self.broker = broker.into();
        self
    }

    pub fn with_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = plugin.into();
        self
    }

    /// Scope of an inbound event: its user, room and broker. Plugin is left
    /// for the handling plugin to fill in.
    pub fn from_event(evt: &Evt) -> Self {
        Self {
            user: evt.user.clone(),
            channel: evt.room.clone(),
            broker: evt.broker.clone(),
            plugin: String::new(),
        }
    }

    /// True when every dimension is empty
    pub fn is_global(&self) -> bool {
        self.user.is_empty()
            && self.channel.is_empty()
            && self.broker.is_empty()
            && self.plugin.is_empty()
    }

    /// Most significant non-empty dimension, `Global` when there is none
    pub fn leading_level(&self) -> ScopeLevel {
        if !self.user.is_empty() {
            ScopeLevel::User
        } else if !self.channel.is_empty() {
            ScopeLevel::Channel
        } else if !self.broker.is_empty() {
            ScopeLevel::Broker
        } else if !self.plugin.is_empty() {
            ScopeLevel::Plugin
        } else {
            ScopeLevel::Global
        }
    }

    /// The scopes tried by the precedence cascade, most specific first.
    ///
    /// After the full tuple, each non-empty dimension in precedence order
    /// contributes the tuple it leads (broader dimensions kept) followed by
    /// that dimension alone, so `(alice, "", "", "")` is tried before any
    /// tuple without a user. Each scope is labelled with its leading level.
    /// Duplicate tuples are dropped.
    pub fn cascade(&self) -> Vec<(ScopeLevel, Scope)> {
        let mut candidates = vec![self.clone()];
        if !self.user.is_empty() {
            candidates.push(Scope::global().with_user(&self.user));
        }
        if !self.channel.is_empty() {
            candidates.push(Scope { user: String::new(), ..self.clone() });
            candidates.push(Scope::global().with_channel(&self.channel));
        }
        if !self.broker.is_empty() {
            candidates.push(Scope::new("", "", &self.broker, &self.plugin));
            candidates.push(Scope::global().with_broker(&self.broker));
        }
        if !self.plugin.is_empty() {
            candidates.push(Scope::global().with_plugin(&self.plugin));
        }
        candidates.push(Scope::global());

        let mut levels: Vec<(ScopeLevel, Scope)> = Vec::with_capacity(candidates.len());
        for scope in candidates {
            if levels.iter().all(|(_, seen)| *seen != scope) {
                levels.push((scope.leading_level(), scope));
            }
        }
        levels
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "user={:?} channel={:?} broker={:?} plugin={:?}",
            self.user, self.channel, self.broker, self.plugin
        )
    }
}

/// Named level of the precedence cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeLevel {
    User,
    Channel,
    Broker,
    Plugin,
    Global,
}

impl ScopeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeLevel::User => "user",
            ScopeLevel::Channel => "channel",
            ScopeLevel::Broker => "broker",
            ScopeLevel::Plugin => "plugin",
            ScopeLevel::Global => "global",
        }
    }

    /// All levels, most specific first
    pub fn all() -> &'static [ScopeLevel] {
        &[
            ScopeLevel::User,
            ScopeLevel::Channel,
            ScopeLevel::Broker,
            ScopeLevel::Plugin,
            ScopeLevel::Global,
        ]
    }
}

impl fmt::Display for ScopeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(ScopeLevel::User),
            "channel" => Ok(ScopeLevel::Channel),
            "broker" => Ok(ScopeLevel::Broker),
            "plugin" => Ok(ScopeLevel::Plugin),
            "global" => Ok(ScopeLevel::Global),
            _ => Err(format!("unknown scope level: {}", s)),
        }
    }
}
