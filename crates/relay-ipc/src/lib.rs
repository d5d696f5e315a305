//! Tokio host plumbing for action-relay
//!
//! - [`ProcessBus`]: in-memory stand-in for the host's messaging primitive
//! - [`stream`]: newline-delimited JSON over any async byte stream
//! - [`ProcessLoop`]: one task per process owning its store and listener
//!
//! Log output goes through `tracing`; a host binary enables it with
//! `action_relay_core::logging::init()` before spawning its process loop.

pub mod bus;
pub mod error;
pub mod framing;
pub mod process;
pub mod stream;

pub use bus::{BusChannel, Inbox, Outbox, ProcessBus};
pub use error::IpcError;
pub use framing::{write_envelope, EnvelopeReader, FrameError};
pub use process::{ProcessHandle, ProcessLoop};
pub use stream::{pump_reader, spawn_writer, StreamChannel};
