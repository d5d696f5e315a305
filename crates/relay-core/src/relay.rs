//! Distribution relay
//!
//! Delivers wire copies of global actions to the other processes:
//!
//! - **Coordinator**: one envelope per live dependent window, never to itself.
//!   When forwarding an action that came from a window, that window is skipped
//!   because it already dispatched the action locally.
//! - **Dependent**: one envelope to the coordinator, which fans out further.
//!
//! Delivery is best-effort. A failed send is counted in [`FanOut`] and
//! dropped; nothing is retried.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::channel::Channel;
use crate::role::ProcessRole;
use crate::schema::{Action, Endpoint, Envelope, WindowId};

/// Derives the live window set from current application state.
pub type WindowAccessor<S> = Arc<dyn Fn(&S) -> Vec<WindowId> + Send + Sync>;

/// Outcome of one distribution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Sends attempted (one per destination)
    pub attempted: usize,

    /// Sends the channel accepted
    pub delivered: usize,

    /// Sends the channel refused (destination gone)
    pub dropped: usize,
}

pub struct Relay<S> {
    role: ProcessRole,
    channel_name: String,
    channel: Arc<dyn Channel>,
    windows: Option<WindowAccessor<S>>,
}

impl<S> Relay<S> {
    pub fn new(role: ProcessRole, channel_name: impl Into<String>, channel: Arc<dyn Channel>) -> Self {
        Self {
            role,
            channel_name: channel_name.into(),
            channel,
            windows: None,
        }
    }

    /// Builder: derive coordinator targets from state instead of the channel.
    pub fn with_window_accessor(mut self, accessor: WindowAccessor<S>) -> Self {
        self.windows = Some(accessor);
        self
    }

    pub fn role(&self) -> ProcessRole {
        self.role
    }

    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    /// Send an action that originated in this process to every other process.
    pub fn distribute(&self, state: &S, action: &Action) -> FanOut {
        let wire = action.to_wire();
        match self.role {
            ProcessRole::Coordinator => self.fan_out(state, None, wire),
            ProcessRole::Dependent(_) => {
                let mut out = FanOut::default();
                self.send_one(Endpoint::Coordinator, wire, &mut out);
                out
            }
        }
    }

    /// Coordinator only: pass an action received from `origin` on to the
    /// remaining windows. Dependents never forward.
    pub fn forward(&self, state: &S, origin: Endpoint, action: &Action) -> FanOut {
        if !self.role.is_coordinator() {
            return FanOut::default();
        }
        let exclude = match origin {
            Endpoint::Window(id) => Some(id),
            Endpoint::Coordinator => None,
        };
        self.fan_out(state, exclude, action.to_wire())
    }

    /// Live targets, queried fresh on every call.
    fn targets(&self, state: &S) -> Vec<WindowId> {
        let listed = match &self.windows {
            Some(accessor) => accessor(state),
            None => self.channel.windows(),
        };
        let mut seen = HashSet::new();
        listed.into_iter().filter(|id| seen.insert(*id)).collect()
    }

    fn fan_out(&self, state: &S, exclude: Option<WindowId>, wire: Action) -> FanOut {
        let mut out = FanOut::default();
        for id in self.targets(state) {
            if Some(id) == exclude {
                continue;
            }
            self.send_one(Endpoint::Window(id), wire.clone(), &mut out);
        }
        out
    }

    fn send_one(&self, to: Endpoint, action: Action, out: &mut FanOut) {
        out.attempted += 1;
        let kind = action.label().to_string();
        let envelope = Envelope::new(self.channel_name.clone(), self.role.endpoint(), action);
        match self.channel.send(to, envelope) {
            Ok(()) => {
                out.delivered += 1;
                trace!("Sent {} to {}", kind, to);
            }
            Err(e) => {
                out.dropped += 1;
                debug!("Dropped {} for {}: {}", kind, to, e);
            }
        }
    }
}
