//! Broker contract
//!
//! A broker is a named messaging endpoint (a Slack team, an IRC network,
//! ...) owned by the surrounding bot framework. Preferences only use the
//! broker's name as a scope dimension; the trait is defined here so that
//! inbound events can be turned into scopes with `Scope::from_event`.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// An event sent to or received from a broker
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evt {
    /// Name of the broker instance the event belongs to
    pub broker: String,
    /// Human-readable room/channel name
    pub room: String,
    #[serde(default)]
    pub room_id: String,
    /// Human-readable user name
    pub user: String,
    #[serde(default)]
    pub user_id: String,
    pub body: String,
}

impl Evt {
    pub fn new(
        broker: impl Into<String>,
        room: impl Into<String>,
        user: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            broker: broker.into(),
            room: room.into(),
            user: user.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    /// A reply in the same room on the same broker
    pub fn reply(&self, body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..self.clone()
        }
    }
}

/// Translation between human-readable names and broker-internal IDs.
/// Not every broker has one.
pub trait IdTranslator: Send + Sync {
    fn room_id_to_name(&self, id: &str) -> String;
    fn room_name_to_id(&self, name: &str) -> String;
    fn user_id_to_name(&self, id: &str) -> String;
    fn user_name_to_id(&self, name: &str) -> String;
}

/// A broker instance that can send and receive events
#[async_trait]
pub trait Broker: Send + Sync {
    /// Instance name, used as the broker scope dimension
    fn name(&self) -> &str;

    /// Deliver an outbound event
    async fn send(&self, evt: Evt) -> Result<()>;

    /// Forward inbound events to `out` until the broker shuts down or the
    /// receiver is dropped
    async fn stream(&self, out: mpsc::Sender<Evt>) -> Result<()>;

    /// Optional ID translation capability
    fn translator(&self) -> Option<&dyn IdTranslator> {
        None
    }
}

/// Creates named broker instances
pub trait BrokerConfig {
    fn new_broker(&self, name: &str) -> Box<dyn Broker>;
}

/// Registry of broker instances, looked up by name
#[derive(Default)]
pub struct BrokerRegistry {
    brokers: Vec<Box<dyn Broker>>,
}

impl BrokerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a broker. A later broker with the same name shadows earlier ones.
    pub fn register(&mut self, broker: Box<dyn Broker>) {
        self.brokers.push(broker);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Broker> {
        self.brokers
            .iter()
            .rev()
            .find(|b| b.name() == name)
            .map(|b| &**b)
    }

    pub fn names(&self) -> Vec<&str> {
        self.brokers.iter().map(|b| b.name()).collect()
    }
}
