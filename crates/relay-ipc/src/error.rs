//! Host plumbing errors

/// Errors raised by the process bus and process handles
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    #[error("A coordinator is already attached to this bus")]
    CoordinatorAttached,

    #[error("Process loop has stopped")]
    ProcessStopped,
}
