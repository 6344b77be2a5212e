//! SSH connection establishment using russh.

use std::sync::Arc;

use log::debug;
use russh::client;
use russh::keys::PublicKey;
use secrecy::ExposeSecret;

use super::Transport;
use super::config::SshConfig;
use super::shell::ShellChannel;
use crate::error::{Result, TransportError};

/// Terminal dimensions requested for the device PTY.
const TERM_WIDTH: u32 = 80;
const TERM_HEIGHT: u32 = 24;

/// SSH transport that opens one PTY shell per connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshTransport;

impl Transport for SshTransport {
    type Channel = ShellChannel;

    async fn connect(&self, config: &SshConfig) -> Result<ShellChannel> {
        debug!("connecting to {}", config.socket_addr());

        let ssh_config = Arc::new(client::Config::default());

        let mut session = tokio::time::timeout(
            config.timeout,
            client::connect(
                ssh_config,
                (config.host.as_str(), config.port),
                ClientHandler,
            ),
        )
        .await
        .map_err(|_| TransportError::ConnectTimeout(config.timeout))?
        .map_err(TransportError::Ssh)?;

        let auth = session
            .authenticate_password(&config.username, config.password.expose_secret())
            .await
            .map_err(TransportError::Ssh)?;

        if !auth.success() {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            }
            .into());
        }

        let channel = session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_pty(true, "xterm", TERM_WIDTH, TERM_HEIGHT, 0, 0, &[])
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        debug!("shell open on {}", config.socket_addr());
        Ok(ShellChannel::new(session, channel))
    }
}

/// Client handler that accepts any server host key.
///
/// Device fleets are reached by address from an inventory rather than
/// a curated known_hosts file, so host keys are not verified.
pub(crate) struct ClientHandler;

impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        Ok(true)
    }
}
