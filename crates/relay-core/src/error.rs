//! Error types for the local pipeline and startup configuration

use thiserror::Error;

/// Failure of a single local dispatch.
///
/// These never cross the process boundary: a receiver that fails to apply a
/// relayed action reports it locally only.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The global classifier failed; the dispatch was aborted before any send
    #[error("Classifier failed for action {kind}: {message}")]
    Classifier { kind: String, message: String },

    /// The action has no `type` discriminant
    #[error("Action has no type discriminant")]
    MissingKind,

    /// A reducer or middleware refused the action
    #[error("Action {kind} rejected: {reason}")]
    Rejected { kind: String, reason: String },
}

/// Startup configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid process role '{0}' (expected 'coordinator' or 'dependent')")]
    InvalidRole(String),

    #[error("Dependent process requires a window id")]
    MissingWindowId,

    #[error("Invalid window id '{0}'")]
    InvalidWindowId(String),

    #[error("Failed to parse relay config: {0}")]
    Parse(#[from] toml::de::Error),
}
