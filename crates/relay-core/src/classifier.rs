//! Global-action classifier

use std::fmt;
use std::sync::Arc;

use crate::error::DispatchError;
use crate::schema::Action;

type ClassifyFn = dyn Fn(&Action) -> Result<bool, String> + Send + Sync;

/// Decides whether an action should be distributed to every process.
///
/// The default checks the `global` marker. Custom classifiers may fail; a
/// failure aborts the dispatch that triggered it.
#[derive(Clone)]
pub struct Classifier {
    inner: Arc<ClassifyFn>,
}

impl Classifier {
    /// Classify by the `global: true` marker.
    pub fn marker() -> Self {
        Self::from_fn(Action::has_global_marker)
    }

    /// Infallible custom predicate.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Action) -> bool + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(move |action| Ok(f(action))),
        }
    }

    /// Fallible custom predicate.
    pub fn try_from_fn<F>(f: F) -> Self
    where
        F: Fn(&Action) -> Result<bool, String> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// # Errors
    ///
    /// Returns [`DispatchError::Classifier`] if the predicate fails
    pub fn is_global(&self, action: &Action) -> Result<bool, DispatchError> {
        (self.inner)(action).map_err(|message| DispatchError::Classifier {
            kind: action.label().to_string(),
            message,
        })
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::marker()
    }
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_classifier() {
        let classifier = Classifier::default();
        assert!(classifier.is_global(&Action::new("A").global()).unwrap());
        assert!(!classifier.is_global(&Action::new("A")).unwrap());
    }

    #[test]
    fn test_custom_classifier() {
        let classifier = Classifier::from_fn(|a| a.kind().is_some_and(|k| k.starts_with("SYNC_")));
        assert!(classifier.is_global(&Action::new("SYNC_THEME")).unwrap());
        assert!(!classifier.is_global(&Action::new("LOCAL").global()).unwrap());
    }

    #[test]
    fn test_failing_classifier() {
        let classifier = Classifier::try_from_fn(|_| Err("lookup table missing".to_string()));
        let err = classifier.is_global(&Action::new("A")).unwrap_err();
        assert_eq!(
            err,
            DispatchError::Classifier {
                kind: "A".to_string(),
                message: "lookup table missing".to_string(),
            }
        );
    }
}
