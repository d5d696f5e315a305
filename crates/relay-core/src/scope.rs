//! Process-scoped relay setup
//!
//! A host creates one [`RelayScope`] at startup and installs the relay into
//! as many stores as it likes. The reception listener, which subscribes to
//! the inbound channel, is handed out only on the first install so repeated
//! middleware construction never registers a second subscriber.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::channel::Channel;
use crate::classifier::Classifier;
use crate::config::RelayConfig;
use crate::error::ConfigError;
use crate::filter::DispatchFilter;
use crate::listener::Listener;
use crate::relay::{Relay, WindowAccessor};
use crate::role::ProcessRole;
use crate::schema::{WindowId, GLOBAL_ACTION_CHANNEL};

#[derive(Debug)]
pub struct RelayScope {
    role: ProcessRole,
    channel_name: String,
    listener_registered: AtomicBool,
}

impl RelayScope {
    pub fn new(role: ProcessRole, channel_name: impl Into<String>) -> Self {
        Self {
            role,
            channel_name: channel_name.into(),
            listener_registered: AtomicBool::new(false),
        }
    }

    /// # Errors
    ///
    /// Returns error if the config names a dependent without a window id
    pub fn from_config(config: &RelayConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.process_role()?, config.channel.clone()))
    }

    pub fn role(&self) -> ProcessRole {
        self.role
    }

    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    pub fn listener_registered(&self) -> bool {
        self.listener_registered.load(Ordering::Acquire)
    }

    /// Start installing the relay over `channel`.
    pub fn install<S>(&self, channel: Arc<dyn Channel>) -> RelayBuilder<'_, S> {
        RelayBuilder {
            scope: self,
            channel,
            classifier: Classifier::default(),
            windows: None,
        }
    }

    fn claim_listener(&self) -> bool {
        !self.listener_registered.swap(true, Ordering::AcqRel)
    }
}

impl Default for RelayScope {
    fn default() -> Self {
        Self::new(ProcessRole::Coordinator, GLOBAL_ACTION_CHANNEL)
    }
}

pub struct RelayBuilder<'a, S> {
    scope: &'a RelayScope,
    channel: Arc<dyn Channel>,
    classifier: Classifier,
    windows: Option<WindowAccessor<S>>,
}

impl<S: 'static> RelayBuilder<'_, S> {
    /// Replace the default `global: true` classifier.
    pub fn classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Derive coordinator targets from current state.
    pub fn windows_from<F>(mut self, accessor: F) -> Self
    where
        F: Fn(&S) -> Vec<WindowId> + Send + Sync + 'static,
    {
        let accessor: WindowAccessor<S> = Arc::new(accessor);
        self.windows = Some(accessor);
        self
    }

    pub fn build(self) -> Installed<S> {
        let mut relay = Relay::new(self.scope.role, self.scope.channel_name.clone(), self.channel);
        if let Some(accessor) = self.windows {
            relay = relay.with_window_accessor(accessor);
        }
        let relay = Arc::new(relay);

        let listener = if self.scope.claim_listener() {
            info!(
                "Registered {} listener on channel {}",
                self.scope.role.endpoint(),
                self.scope.channel_name
            );
            Some(Listener::new(relay.clone()))
        } else {
            debug!("Listener already registered for this process, installing filter only");
            None
        };

        Installed {
            filter: DispatchFilter::new(self.classifier, relay),
            listener,
        }
    }
}

/// Result of installing the relay into one store.
pub struct Installed<S> {
    /// Middleware to add to the store
    pub filter: DispatchFilter<S>,

    /// Present only for the first install in this process
    pub listener: Option<Listener<S>>,
}
