//! Local action pipeline: state, reducer, and an ordered middleware chain
//!
//! ```text
//! dispatch(action)
//!     │
//!     ▼
//! middleware[0] ── next.run(action) ──▶ middleware[1] ── … ──▶ reducer(&mut state, &action)
//! ```
//!
//! Each middleware receives a [`Next`] by value, so it can continue the chain
//! at most once. A middleware may read the current state through
//! [`Next::state`] before continuing.

use std::sync::Arc;

use crate::error::DispatchError;
use crate::schema::Action;

/// Final pipeline stage applying an action to the state.
pub type Reducer<S> = Box<dyn Fn(&mut S, &Action) -> Result<(), DispatchError> + Send + Sync>;

/// A stage in the dispatch pipeline.
pub trait Middleware<S>: Send + Sync {
    /// Process one action, continuing the chain through `next`.
    fn handle(&self, action: Action, next: Next<'_, S>) -> Result<(), DispatchError>;
}

/// Continuation of the pipeline after the current middleware.
pub struct Next<'a, S> {
    rest: &'a [Arc<dyn Middleware<S>>],
    state: &'a mut S,
    reducer: &'a Reducer<S>,
}

impl<'a, S> Next<'a, S> {
    /// Current state, before this action is applied.
    pub fn state(&self) -> &S {
        self.state
    }

    /// Pass the action to the remaining stages.
    pub fn run(self, action: Action) -> Result<(), DispatchError> {
        let Next {
            rest,
            state,
            reducer,
        } = self;
        match rest.split_first() {
            Some((stage, rest)) => stage.handle(
                action,
                Next {
                    rest,
                    state,
                    reducer,
                },
            ),
            None => reducer(state, &action),
        }
    }
}

/// Process-local store.
pub struct Store<S> {
    state: S,
    reducer: Reducer<S>,
    middleware: Vec<Arc<dyn Middleware<S>>>,
}

impl<S: 'static> Store<S> {
    pub fn new<F>(state: S, reducer: F) -> Self
    where
        F: Fn(&mut S, &Action) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        Self {
            state,
            reducer: Box::new(reducer),
            middleware: Vec::new(),
        }
    }

    /// Builder: append a middleware stage (runs after those already added).
    pub fn with_middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware<S> + 'static,
    {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Run an action through the middleware chain and the reducer.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a middleware or the reducer
    pub fn dispatch(&mut self, action: Action) -> Result<(), DispatchError> {
        Next {
            rest: self.middleware.as_slice(),
            state: &mut self.state,
            reducer: &self.reducer,
        }
        .run(action)
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }
}
