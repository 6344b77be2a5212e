//! Error types for sshbatch.

use std::time::Duration;

use thiserror::Error;

/// Main error type for sshbatch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors (connect/authenticate phase)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors (send/receive on an open shell)
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session lifecycle errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Transport layer errors raised while establishing a connection.
///
/// All of these are fatal to a batch: no command can be attempted without
/// an authenticated channel.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Credentials rejected by the device
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// No connection within the configured timeout
    #[error("Connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// SSH handshake, protocol, or I/O error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),
}

/// Channel layer errors raised while talking to an open shell.
///
/// These are per-command: the session records them as that command's
/// response text and continues with the rest of the batch.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The device closed the stream; no further data can be sent
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),
}

/// Session lifecycle errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// `open()` called while a channel is already held
    #[error("Session already connected")]
    AlreadyConnected,

    /// Operation attempted without an open channel
    #[error("Session not connected")]
    NotConnected,
}

/// Result type alias using sshbatch's Error.
pub type Result<T> = std::result::Result<T, Error>;
