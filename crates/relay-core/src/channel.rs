//! Channel trait for the distribution relay
//!
//! Abstracts the host's inter-process messaging primitive. Implementations
//! include the tokio process bus and stream transports in `action-relay-ipc`
//! and [`MockChannel`](crate::MockChannel) for tests.

use crate::schema::{Endpoint, Envelope, WindowId};

/// Result type for channel operations
pub type Result<T> = std::result::Result<T, ChannelError>;

/// Channel errors
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Destination existed but has gone away (window closed mid-send)
    #[error("Endpoint closed: {endpoint}")]
    Closed { endpoint: Endpoint },

    /// Destination was never known to the host
    #[error("Unknown endpoint: {endpoint}")]
    Unknown { endpoint: Endpoint },

    /// Transport-level failure
    #[error("Transport error: {message}")]
    Transport { message: String },
}

/// Fire-and-forget messaging between processes
///
/// `send` must not block on the receiver: it either queues the envelope or
/// fails immediately. Implementations must be thread-safe so hosts can share
/// one channel between stores.
pub trait Channel: Send + Sync {
    /// Queue an envelope for a single destination.
    ///
    /// # Errors
    ///
    /// Returns error if the destination is gone or unknown
    fn send(&self, to: Endpoint, envelope: Envelope) -> Result<()>;

    /// Live dependent windows as currently known to the host.
    ///
    /// Queried on every fan-out; implementations must not cache.
    fn windows(&self) -> Vec<WindowId>;
}
