//! Dispatch filter: the middleware that decides distribution
//!
//! Every action passes through unchanged to the next stage. Additionally:
//!
//! 1. Already-distributed actions go straight on (loop prevention).
//! 2. Actions the classifier accepts are handed to the relay first.
//!
//! A classifier failure aborts the dispatch before anything is sent.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::classifier::Classifier;
use crate::error::DispatchError;
use crate::relay::Relay;
use crate::schema::Action;
use crate::store::{Middleware, Next};

pub struct DispatchFilter<S> {
    classifier: Classifier,
    relay: Arc<Relay<S>>,
}

impl<S> DispatchFilter<S> {
    pub fn new(classifier: Classifier, relay: Arc<Relay<S>>) -> Self {
        Self { classifier, relay }
    }
}

impl<S> Middleware<S> for DispatchFilter<S> {
    fn handle(&self, action: Action, next: Next<'_, S>) -> Result<(), DispatchError> {
        if action.is_distributed() {
            trace!("{} already distributed, dispatching locally", action.label());
            return next.run(action);
        }

        if self.classifier.is_global(&action)? {
            let out = self.relay.distribute(next.state(), &action);
            debug!(
                "Distributed {}: attempted={}, delivered={}, dropped={}",
                action.label(),
                out.attempted,
                out.delivered,
                out.dropped
            );
        }

        next.run(action)
    }
}
