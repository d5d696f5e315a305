//! Reception listener: injects relayed actions into the local pipeline
//!
//! On the coordinator a received action is first forwarded to the remaining
//! windows, then dispatched locally. Either way the local copy carries the
//! distributed flag, so the dispatch filter never sends it again.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::DispatchError;
use crate::relay::{FanOut, Relay};
use crate::schema::Envelope;
use crate::store::Store;

/// What the listener did with one envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reception {
    /// Dispatched locally; `forwarded` counts coordinator fan-out sends
    Dispatched { forwarded: FanOut },
    /// Envelope on a different message name
    ForeignChannel,
    /// Envelope claims to come from this very process
    OwnEcho,
}

pub struct Listener<S> {
    relay: Arc<Relay<S>>,
}

impl<S: 'static> Listener<S> {
    pub(crate) fn new(relay: Arc<Relay<S>>) -> Self {
        Self { relay }
    }

    /// Handle one inbound envelope.
    ///
    /// # Errors
    ///
    /// Returns the local dispatch error. It is never reported to the sender.
    pub fn receive(
        &self,
        store: &mut Store<S>,
        envelope: Envelope,
    ) -> Result<Reception, DispatchError> {
        if envelope.channel != self.relay.channel_name() {
            trace!("Ignoring envelope on channel {}", envelope.channel);
            return Ok(Reception::ForeignChannel);
        }
        if envelope.sender == self.relay.role().endpoint() {
            debug!("Ignoring own echo of {}", envelope.action.label());
            return Ok(Reception::OwnEcho);
        }

        let forwarded = self
            .relay
            .forward(store.state(), envelope.sender, &envelope.action);
        if forwarded.attempted > 0 {
            debug!(
                "Forwarded {} from {} to {} window(s)",
                envelope.action.label(),
                envelope.sender,
                forwarded.delivered
            );
        }

        store.dispatch(envelope.action.into_received())?;
        Ok(Reception::Dispatched { forwarded })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use crate::error::DispatchError;
    use crate::filter::DispatchFilter;
    use crate::mock_channel::MockChannel;
    use crate::role::ProcessRole;
    use crate::schema::{Action, Endpoint, WindowId};

    fn process(
        role: ProcessRole,
        channel: &Arc<MockChannel>,
    ) -> (Store<Vec<Action>>, Listener<Vec<Action>>) {
        let relay = Arc::new(Relay::new(role, "GLOBAL_ACTION", channel.clone()));
        let store = Store::new(Vec::new(), |seen: &mut Vec<Action>, action: &Action| {
            if action.kind().is_none() {
                return Err(DispatchError::MissingKind);
            }
            seen.push(action.clone());
            Ok(())
        })
        .with_middleware(DispatchFilter::new(Classifier::from_fn(|_| true), relay.clone()));
        (store, Listener::new(relay))
    }

    #[test]
    fn test_dependent_dispatches_without_resend() {
        let channel = Arc::new(MockChannel::new());
        let (mut store, listener) = process(ProcessRole::Dependent(WindowId(1)), &channel);

        let envelope = Envelope::new("GLOBAL_ACTION", Endpoint::Coordinator, Action::new("INCREMENT"));
        let reception = listener.receive(&mut store, envelope).unwrap();

        assert_eq!(reception, Reception::Dispatched { forwarded: FanOut::default() });
        assert!(channel.sent().is_empty());
        assert_eq!(store.state().len(), 1);
        assert!(store.state()[0].is_distributed());
    }

    #[test]
    fn test_coordinator_forwards_to_other_windows_then_dispatches() {
        let channel = Arc::new(MockChannel::with_windows([1, 2, 3, 4]));
        let (mut store, listener) = process(ProcessRole::Coordinator, &channel);

        let envelope = Envelope::new(
            "GLOBAL_ACTION",
            Endpoint::Window(WindowId(4)),
            Action::new("INCREMENT"),
        );
        let reception = listener.receive(&mut store, envelope).unwrap();

        assert_eq!(
            reception,
            Reception::Dispatched {
                forwarded: FanOut { attempted: 3, delivered: 3, dropped: 0 }
            }
        );
        assert!(channel.sent_to(Endpoint::Window(WindowId(4))).is_empty());
        // The filter saw the distributed flag: exactly the 3 forwards, nothing more
        assert_eq!(channel.sent().len(), 3);
        assert_eq!(store.state().len(), 1);
    }

    #[test]
    fn test_foreign_channel_ignored() {
        let channel = Arc::new(MockChannel::new());
        let (mut store, listener) = process(ProcessRole::Coordinator, &channel);

        let envelope = Envelope::new("OTHER", Endpoint::Window(WindowId(1)), Action::new("A"));
        assert_eq!(
            listener.receive(&mut store, envelope).unwrap(),
            Reception::ForeignChannel
        );
        assert!(store.state().is_empty());
    }

    #[test]
    fn test_own_echo_ignored() {
        let channel = Arc::new(MockChannel::new());
        let (mut store, listener) = process(ProcessRole::Dependent(WindowId(2)), &channel);

        let envelope = Envelope::new("GLOBAL_ACTION", Endpoint::Window(WindowId(2)), Action::new("A"));
        assert_eq!(listener.receive(&mut store, envelope).unwrap(), Reception::OwnEcho);
        assert!(store.state().is_empty());
    }

    #[test]
    fn test_malformed_payload_fails_locally() {
        let channel = Arc::new(MockChannel::new());
        let (mut store, listener) = process(ProcessRole::Dependent(WindowId(1)), &channel);

        let untyped: Action = serde_json::from_str(r#"{"value":1}"#).unwrap();
        let envelope = Envelope::new("GLOBAL_ACTION", Endpoint::Coordinator, untyped);

        assert_eq!(
            listener.receive(&mut store, envelope),
            Err(DispatchError::MissingKind)
        );
        assert!(channel.sent().is_empty());
    }
}
