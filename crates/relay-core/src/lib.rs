//! Core types for action-relay
//!
//! Mirrors application actions across the process boundary of a
//! multi-process desktop application. A [`DispatchFilter`] middleware sends a
//! wire copy of every global action through a [`Relay`]; the receiving
//! process's [`Listener`] injects it into its own [`Store`] flagged as
//! already distributed, so no receiver ever sends it again.
//!
//! ```text
//! dependent store ─ filter ─▶ relay ─▶ coordinator listener ─▶ relay ─▶ other windows
//!        │                                   │                             │
//!        ▼                                   ▼                             ▼
//!     reducer                    store (distributed flag)     listener ─▶ store
//! ```
//!
//! Hosts call [`logging::init`] once at process startup, before building the
//! [`RelayScope`]; the library itself never installs a subscriber.

pub mod channel;
pub mod classifier;
pub mod config;
pub mod error;
pub mod filter;
pub mod listener;
pub mod logging;
pub mod mock_channel;
pub mod relay;
pub mod role;
pub mod schema;
pub mod scope;
pub mod store;

pub use channel::{Channel, ChannelError};
pub use classifier::Classifier;
pub use config::{RelayConfig, RoleKind};
pub use error::{ConfigError, DispatchError};
pub use filter::DispatchFilter;
pub use listener::{Listener, Reception};
pub use mock_channel::MockChannel;
pub use relay::{FanOut, Relay, WindowAccessor};
pub use role::ProcessRole;
pub use schema::{
    Action, Endpoint, Envelope, WindowId, GLOBAL_ACTION_CHANNEL, GLOBAL_MARKER, KIND_FIELD,
};
pub use scope::{Installed, RelayBuilder, RelayScope};
pub use store::{Middleware, Next, Reducer, Store};
