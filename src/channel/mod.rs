//! Channel layer for interactive device output.
//!
//! This module handles the read side of an interactive session:
//! marker-based prompt detection, the timing profile, and the adaptive
//! read loop that decides when a response is complete.

mod markers;
mod read;
mod timing;

pub use markers::{MARKER_WINDOW, PromptMarkers};
pub use read::{ReadEnd, ReadOutcome, read_to_idle};
pub use timing::Timing;

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;

/// Largest chunk handed out by a single [`DeviceChannel::read_chunk`] call.
pub const READ_CHUNK_SIZE: usize = 4096;

/// Byte-stream interface to an interactive device shell.
///
/// The production implementation is
/// [`ShellChannel`](crate::transport::ShellChannel); tests substitute
/// scripted channels to drive the read loop deterministically.
pub trait DeviceChannel: Send {
    /// Wait up to `wait` for the next chunk of device output.
    ///
    /// Returns at most `max` bytes. `Ok(None)` means nothing arrived
    /// within `wait`, or the device has closed its side of the stream.
    /// A `wait` of zero is a non-blocking poll for already-queued data.
    fn read_chunk(
        &mut self,
        max: usize,
        wait: Duration,
    ) -> impl Future<Output = Result<Option<Bytes>>> + Send;

    /// Send one line of text, newline-terminated, to the device.
    fn send_line(&mut self, line: &str) -> impl Future<Output = Result<()>> + Send;

    /// Close the channel and tear down the underlying connection.
    fn close(self) -> impl Future<Output = Result<()>> + Send;

    /// Discard whatever output the device has already queued.
    ///
    /// Used before sending a command so stale banner or echo bytes from
    /// a previous exchange cannot leak into the next response.
    fn drain_pending(&mut self) -> impl Future<Output = Result<()>> + Send {
        async move {
            while self
                .read_chunk(READ_CHUNK_SIZE, Duration::ZERO)
                .await?
                .is_some()
            {}
            Ok(())
        }
    }
}
