//! Per-process event loop
//!
//! One task owns the process's [`Store`] and its [`Listener`]. Inbound
//! envelopes and local dispatch requests are handled one at a time on that
//! task, so relayed actions never interleave with a local dispatch.

use action_relay_core::{Action, Envelope, Listener, Reception, Store};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bus::Inbox;
use crate::error::IpcError;

enum Command<S> {
    Dispatch(Action),
    Snapshot(oneshot::Sender<S>),
}

/// Cloneable handle for talking to a running [`ProcessLoop`]
pub struct ProcessHandle<S> {
    commands: mpsc::UnboundedSender<Command<S>>,
}

impl<S> Clone for ProcessHandle<S> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
        }
    }
}

impl<S> ProcessHandle<S> {
    /// Queue a local dispatch. Does not wait for the reducer.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::ProcessStopped`] if the loop has exited
    pub fn dispatch(&self, action: Action) -> Result<(), IpcError> {
        self.commands
            .send(Command::Dispatch(action))
            .map_err(|_| IpcError::ProcessStopped)
    }

    /// Snapshot of the state once every earlier request has been handled.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::ProcessStopped`] if the loop has exited
    pub async fn state(&self) -> Result<S, IpcError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Snapshot(tx))
            .map_err(|_| IpcError::ProcessStopped)?;
        rx.await.map_err(|_| IpcError::ProcessStopped)
    }
}

pub struct ProcessLoop<S> {
    name: String,
    store: Store<S>,
    listener: Listener<S>,
    inbox: Inbox,
    commands: mpsc::UnboundedReceiver<Command<S>>,
}

impl<S: Clone + Send + 'static> ProcessLoop<S> {
    pub fn new(
        name: impl Into<String>,
        store: Store<S>,
        listener: Listener<S>,
        inbox: Inbox,
    ) -> (Self, ProcessHandle<S>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let process = Self {
            name: name.into(),
            store,
            listener,
            inbox,
            commands: rx,
        };
        (process, ProcessHandle { commands: tx })
    }

    /// Spawn the loop on the current runtime.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<Store<S>> {
        tokio::spawn(self.run(cancel))
    }

    /// Run until cancelled or until both the inbox and every handle are gone.
    ///
    /// Returns the store so callers can inspect the final state.
    pub async fn run(mut self, cancel: CancellationToken) -> Store<S> {
        info!("Starting process loop for {}", self.name);
        let mut inbox_open = true;
        let mut commands_open = true;

        while inbox_open || commands_open {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Process loop for {} cancelled", self.name);
                    break;
                }
                envelope = self.inbox.recv(), if inbox_open => match envelope {
                    Some(envelope) => self.receive(envelope),
                    None => {
                        debug!("Inbox for {} closed", self.name);
                        inbox_open = false;
                    }
                },
                command = self.commands.recv(), if commands_open => match command {
                    Some(Command::Dispatch(action)) => self.dispatch(action),
                    Some(Command::Snapshot(reply)) => {
                        let _ = reply.send(self.store.state().clone());
                    }
                    None => commands_open = false,
                },
            }
        }

        info!("Process loop for {} stopped", self.name);
        self.store
    }

    fn receive(&mut self, envelope: Envelope) {
        let label = envelope.action.label().to_string();
        match self.listener.receive(&mut self.store, envelope) {
            Ok(Reception::Dispatched { .. }) => {}
            Ok(other) => debug!("{} ignored {}: {:?}", self.name, label, other),
            Err(e) => warn!("{} failed to dispatch relayed {}: {}", self.name, label, e),
        }
    }

    fn dispatch(&mut self, action: Action) {
        let label = action.label().to_string();
        if let Err(e) = self.store.dispatch(action) {
            warn!("{} failed to dispatch {}: {}", self.name, label, e);
        }
    }
}
