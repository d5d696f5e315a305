//! Schema types carried through the pipeline and across the channel

pub mod action;
pub mod envelope;

pub use action::{Action, GLOBAL_MARKER, KIND_FIELD};
pub use envelope::{Endpoint, Envelope, WindowId, GLOBAL_ACTION_CHANNEL};
