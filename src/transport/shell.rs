//! Interactive shell channel over an established SSH connection.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use log::trace;
use russh::client::{Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect};

use super::ssh::ClientHandler;
use crate::channel::DeviceChannel;
use crate::error::{ChannelError, Result};

/// A PTY-backed shell channel on an authenticated SSH connection.
///
/// Owns both the channel and the connection handle: closing the shell
/// tears down the whole connection, matching the one-shell-per-device
/// lifecycle of a batch run.
pub struct ShellChannel {
    handle: Handle<ClientHandler>,
    channel: Channel<Msg>,

    /// Bytes received but not yet handed out by `read_chunk`.
    pending: BytesMut,

    /// Set once the device closes its side of the stream.
    eof: bool,
}

impl ShellChannel {
    pub(crate) fn new(handle: Handle<ClientHandler>, channel: Channel<Msg>) -> Self {
        Self {
            handle,
            channel,
            pending: BytesMut::new(),
            eof: false,
        }
    }

    /// Pull channel messages until data is buffered, EOF is seen, or
    /// the deadline passes.
    ///
    /// A zero `wait` still polls once, so already-queued messages are
    /// picked up by non-blocking drains.
    async fn fill_pending(&mut self, wait: Duration) {
        let deadline = tokio::time::Instant::now() + wait;
        while self.pending.is_empty() && !self.eof {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            match tokio::time::timeout(remaining, self.channel.wait()).await {
                Ok(Some(ChannelMsg::Data { ref data })) => {
                    trace!("shell data: {} bytes", data.len());
                    self.pending.extend_from_slice(data);
                }
                Ok(Some(ChannelMsg::ExtendedData { ref data, ext: 1 })) => {
                    // stderr shares the response stream, as it would on
                    // a real terminal
                    self.pending.extend_from_slice(data);
                }
                Ok(Some(ChannelMsg::Eof | ChannelMsg::Close)) => {
                    trace!("shell eof");
                    self.eof = true;
                }
                Ok(Some(_)) => {}
                Ok(None) => {
                    self.eof = true;
                }
                Err(_) => break,
            }
        }
    }
}

impl DeviceChannel for ShellChannel {
    async fn read_chunk(&mut self, max: usize, wait: Duration) -> Result<Option<Bytes>> {
        if self.pending.is_empty() {
            self.fill_pending(wait).await;
        }

        if self.pending.is_empty() {
            return Ok(None);
        }

        let take = self.pending.len().min(max);
        Ok(Some(self.pending.split_to(take).freeze()))
    }

    async fn send_line(&mut self, line: &str) -> Result<()> {
        if self.eof {
            return Err(ChannelError::Closed.into());
        }

        let data = format!("{line}\n");
        self.channel
            .data(data.as_bytes())
            .await
            .map_err(ChannelError::Ssh)?;
        Ok(())
    }

    async fn close(self) -> Result<()> {
        // The channel may already be gone; the disconnect below is what
        // actually releases the connection.
        let _ = self.channel.eof().await;

        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(ChannelError::Ssh)?;
        Ok(())
    }
}
