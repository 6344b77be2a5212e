//! SSH transport layer wrapping russh.
//!
//! This module provides the low-level SSH connection management:
//! connection setup, password authentication, and the interactive
//! shell channel the session layer reads from.

pub mod config;
mod shell;
mod ssh;

pub use config::{DEFAULT_PORT, DEFAULT_TIMEOUT, SshConfig};
pub use shell::ShellChannel;
pub use ssh::SshTransport;

use std::future::Future;

use crate::channel::DeviceChannel;
use crate::error::Result;

/// Factory for authenticated device channels.
///
/// The production implementation is [`SshTransport`]; tests substitute
/// transports that hand out scripted channels.
pub trait Transport: Send + Sync {
    /// Channel type produced by this transport.
    type Channel: DeviceChannel;

    /// Connect, authenticate, and open an interactive shell.
    fn connect(&self, config: &SshConfig) -> impl Future<Output = Result<Self::Channel>> + Send;
}
