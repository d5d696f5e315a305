//! Byte-stream transport
//!
//! Connects a process to its peer over any `AsyncRead`/`AsyncWrite` pair
//! (pipes, sockets, `tokio::io::duplex`). Outgoing envelopes go through a
//! writer task fed by an [`Outbox`]; incoming lines are pumped into an inbox.

use action_relay_core::channel::Result as ChannelResult;
use action_relay_core::{Channel, ChannelError, Endpoint, Envelope, WindowId};
use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bus::Outbox;
use crate::framing::{write_envelope, EnvelopeReader, FrameError};

/// Spawn a task that writes every envelope queued on the returned outbox.
///
/// The task ends when every outbox clone is dropped or a write fails.
pub fn spawn_writer<W>(mut writer: W) -> (Outbox, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();
    let handle = tokio::spawn(async move {
        let mut written = 0usize;
        while let Some(envelope) = rx.recv().await {
            write_envelope(&mut writer, &envelope)
                .await
                .with_context(|| format!("Failed to write {}", envelope.action.label()))?;
            written += 1;
        }
        debug!("Stream writer finished after {} envelope(s)", written);
        Ok(())
    });
    (tx, handle)
}

/// Read envelopes from `reader` into `inbound` until EOF, cancellation or
/// the inbox closing. Malformed lines are logged and skipped.
///
/// Returns the number of envelopes forwarded.
///
/// # Errors
///
/// Returns error if reading from the stream fails
pub async fn pump_reader<R>(reader: R, inbound: Outbox, cancel: CancellationToken) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut reader = EnvelopeReader::new(reader);
    let mut forwarded = 0usize;

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => {
                info!("Stream pump cancelled");
                break;
            }
            next = reader.next_envelope() => next,
        };

        match next {
            Ok(Some(envelope)) => {
                if inbound.send(envelope).is_err() {
                    debug!("Inbox closed, stopping stream pump");
                    break;
                }
                forwarded += 1;
            }
            Ok(None) => {
                debug!("Stream closed by peer");
                break;
            }
            Err(FrameError::Malformed { line, reason }) => {
                warn!("Skipping malformed envelope: {} ({})", reason, line);
            }
            Err(e) => return Err(e).context("Failed to read envelope stream"),
        }
    }

    Ok(forwarded)
}

/// [`Channel`] for a dependent whose only peer is the coordinator at the
/// other end of a stream.
#[derive(Debug, Clone)]
pub struct StreamChannel {
    outbox: Outbox,
}

impl StreamChannel {
    pub fn new(outbox: Outbox) -> Self {
        Self { outbox }
    }
}

impl Channel for StreamChannel {
    fn send(&self, to: Endpoint, envelope: Envelope) -> ChannelResult<()> {
        if to != Endpoint::Coordinator {
            return Err(ChannelError::Unknown { endpoint: to });
        }
        self.outbox.send(envelope).map_err(|_| ChannelError::Transport {
            message: "stream writer has stopped".to_string(),
        })
    }

    fn windows(&self) -> Vec<WindowId> {
        Vec::new()
    }
}
