//! Mock channel implementation for testing
//!
//! Records every accepted send in memory and simulates the host's window
//! set, including windows that close between enumeration and send.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::channel::{Channel, ChannelError, Result};
use crate::schema::{Endpoint, Envelope, WindowId};

#[derive(Debug, Default)]
struct MockState {
    /// Live windows
    windows: BTreeSet<WindowId>,

    /// Windows that existed once and have been closed
    closed: BTreeSet<WindowId>,

    /// Accepted sends in order
    sent: Vec<(Endpoint, Envelope)>,

    /// Simulate transport failure on every send
    fail_sends: bool,
}

/// In-memory channel for tests
#[derive(Debug, Default)]
pub struct MockChannel {
    state: Mutex<MockState>,
}

impl MockChannel {
    /// Create a channel with no windows
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a channel with the given live windows
    pub fn with_windows(ids: impl IntoIterator<Item = u32>) -> Self {
        let channel = Self::new();
        for id in ids {
            channel.open_window(WindowId(id));
        }
        channel
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn open_window(&self, id: WindowId) {
        let mut state = self.lock();
        state.closed.remove(&id);
        state.windows.insert(id);
    }

    /// Close a window; later sends to it fail with [`ChannelError::Closed`]
    pub fn close_window(&self, id: WindowId) {
        let mut state = self.lock();
        if state.windows.remove(&id) {
            state.closed.insert(id);
        }
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.lock().fail_sends = fail;
    }

    /// All accepted sends in order
    pub fn sent(&self) -> Vec<(Endpoint, Envelope)> {
        self.lock().sent.clone()
    }

    /// Accepted envelopes for one destination
    pub fn sent_to(&self, endpoint: Endpoint) -> Vec<Envelope> {
        self.lock()
            .sent
            .iter()
            .filter(|(to, _)| *to == endpoint)
            .map(|(_, envelope)| envelope.clone())
            .collect()
    }

    /// Drain recorded sends
    pub fn take_sent(&self) -> Vec<(Endpoint, Envelope)> {
        std::mem::take(&mut self.lock().sent)
    }
}

impl Channel for MockChannel {
    fn send(&self, to: Endpoint, envelope: Envelope) -> Result<()> {
        let mut state = self.lock();
        if state.fail_sends {
            return Err(ChannelError::Transport {
                message: "simulated send failure".to_string(),
            });
        }
        if let Endpoint::Window(id) = to {
            if state.closed.contains(&id) {
                return Err(ChannelError::Closed { endpoint: to });
            }
            if !state.windows.contains(&id) {
                return Err(ChannelError::Unknown { endpoint: to });
            }
        }
        state.sent.push((to, envelope));
        Ok(())
    }

    fn windows(&self) -> Vec<WindowId> {
        self.lock().windows.iter().copied().collect()
    }
}
