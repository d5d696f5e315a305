//! In-memory process bus
//!
//! Stands in for the host's inter-process messaging primitive. Every endpoint
//! owns an unbounded inbox; the bus keeps the sending halves in a shared
//! registry so any [`BusChannel`] can reach any endpoint without blocking.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use action_relay_core::channel::Result as ChannelResult;
use action_relay_core::{Channel, ChannelError, Endpoint, Envelope, WindowId};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::IpcError;

/// Sending half of an endpoint inbox
pub type Outbox = mpsc::UnboundedSender<Envelope>;

/// Receiving half of an endpoint inbox
pub type Inbox = mpsc::UnboundedReceiver<Envelope>;

#[derive(Debug, Default)]
struct Registry {
    coordinator: Option<Outbox>,
    windows: BTreeMap<WindowId, Outbox>,
    closed: BTreeSet<WindowId>,
    next_window: u32,
}

impl Registry {
    fn allocate(&mut self) -> WindowId {
        self.next_window += 1;
        WindowId(self.next_window)
    }
}

/// Shared registry of endpoint inboxes
#[derive(Debug, Clone, Default)]
pub struct ProcessBus {
    registry: Arc<Mutex<Registry>>,
}

impl ProcessBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        lock(&self.registry)
    }

    /// Create the coordinator inbox.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::CoordinatorAttached`] if a coordinator already exists
    pub fn attach_coordinator(&self) -> Result<Inbox, IpcError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.attach_coordinator_outbox(tx)?;
        Ok(rx)
    }

    /// Route coordinator traffic into an existing outbox, e.g. a stream writer.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::CoordinatorAttached`] if a coordinator already exists
    pub fn attach_coordinator_outbox(&self, outbox: Outbox) -> Result<(), IpcError> {
        let mut registry = self.lock();
        if registry.coordinator.is_some() {
            return Err(IpcError::CoordinatorAttached);
        }
        registry.coordinator = Some(outbox);
        info!("Coordinator attached to process bus");
        Ok(())
    }

    /// Sending half of the coordinator inbox, for stream pumps.
    pub fn coordinator_outbox(&self) -> Option<Outbox> {
        self.lock().coordinator.clone()
    }

    /// Open a new dependent window with its own inbox.
    pub fn open_window(&self) -> (WindowId, Inbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        (self.attach_window(tx), rx)
    }

    /// Register a dependent window whose traffic goes to `outbox`.
    pub fn attach_window(&self, outbox: Outbox) -> WindowId {
        let mut registry = self.lock();
        let id = registry.allocate();
        registry.windows.insert(id, outbox);
        info!("Opened {}", id);
        id
    }

    /// Close a window. Returns `false` if it was not open.
    pub fn close_window(&self, id: WindowId) -> bool {
        let mut registry = self.lock();
        if registry.windows.remove(&id).is_some() {
            registry.closed.insert(id);
            info!("Closed {}", id);
            true
        } else {
            false
        }
    }

    /// Live windows in ascending order
    pub fn windows(&self) -> Vec<WindowId> {
        live_windows(&self.lock())
    }

    /// Channel handle for any process on this bus.
    pub fn channel(&self) -> BusChannel {
        BusChannel {
            registry: self.registry.clone(),
        }
    }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

fn live_windows(registry: &Registry) -> Vec<WindowId> {
    registry
        .windows
        .iter()
        .filter(|(_, tx)| !tx.is_closed())
        .map(|(id, _)| *id)
        .collect()
}

/// [`Channel`] over a [`ProcessBus`]
#[derive(Debug, Clone)]
pub struct BusChannel {
    registry: Arc<Mutex<Registry>>,
}

impl Channel for BusChannel {
    fn send(&self, to: Endpoint, envelope: Envelope) -> ChannelResult<()> {
        let registry = lock(&self.registry);
        let outbox = match to {
            Endpoint::Coordinator => registry.coordinator.as_ref(),
            Endpoint::Window(id) => {
                if registry.closed.contains(&id) {
                    return Err(ChannelError::Closed { endpoint: to });
                }
                registry.windows.get(&id)
            }
        };
        let Some(outbox) = outbox else {
            return Err(ChannelError::Unknown { endpoint: to });
        };

        // Receiver dropped without an explicit close: the process is gone
        outbox.send(envelope).map_err(|_| {
            debug!("Inbox for {} is gone", to);
            ChannelError::Closed { endpoint: to }
        })
    }

    fn windows(&self) -> Vec<WindowId> {
        live_windows(&lock(&self.registry))
    }
}
