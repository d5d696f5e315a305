//! Channel message schema

use serde::{Deserialize, Serialize};
use std::fmt;

use super::action::Action;

/// Reserved message name used in both directions.
pub const GLOBAL_ACTION_CHANNEL: &str = "GLOBAL_ACTION";

/// Host-assigned identifier of a dependent window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window-{}", self.0)
    }
}

/// Addressable end of the distribution channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// The coordinator process
    Coordinator,
    /// One dependent window
    Window(WindowId),
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Coordinator => f.write_str("coordinator"),
            Endpoint::Window(id) => id.fmt(f),
        }
    }
}

/// The single message shape sent over the distribution channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Reserved message name; receivers ignore envelopes on other names
    pub channel: String,

    /// Process that put the envelope on the channel
    pub sender: Endpoint,

    /// Wire copy of the action (markers stripped)
    pub action: Action,
}

impl Envelope {
    pub fn new(channel: impl Into<String>, sender: Endpoint, action: Action) -> Self {
        Self {
            channel: channel.into(),
            sender,
            action,
        }
    }
}
