//! Device session layer.
//!
//! A [`Session`] owns one SSH connection to one device and runs the
//! interactive exchange: wake the prompt, send commands, collect the
//! responses the read loop delimits. Per-command failures become
//! response text rather than errors, so one bad command never aborts
//! the rest of a batch.

mod batch;
mod report;

pub use report::{BatchReport, CommandResult};

use std::time::Duration;

use log::{debug, warn};

use crate::channel::{DeviceChannel, PromptMarkers, READ_CHUNK_SIZE, Timing, read_to_idle};
use crate::error::{Result, SessionError};
use crate::transport::{SshConfig, SshTransport, Transport};

/// Placeholder response when no channel is open.
const NO_CONNECTION: &str = "No connection established";

/// Placeholder response when a command produced no output at all.
const NO_RESPONSE: &str = "No response from device";

/// Prompt reported when the device never echoes one back.
const PROMPT_FALLBACK: &str = "Switch>";

/// Interactive session with a single network device.
///
/// Generic over the transport so tests can substitute scripted
/// channels; production code uses the [`SshTransport`] default.
///
/// # Example
///
/// ```rust,no_run
/// use sshbatch::Session;
///
/// # async fn example() {
/// let mut session = Session::builder("192.168.1.1", "admin", "secret").build();
/// let report = session.run("show version\nshow ip interface brief").await;
/// println!("{}", serde_json::to_string_pretty(&report).unwrap());
/// # }
/// ```
pub struct Session<T: Transport = SshTransport> {
    transport: T,
    config: SshConfig,
    markers: PromptMarkers,
    timing: Timing,

    /// Open shell channel (None when disconnected).
    channel: Option<T::Channel>,
}

impl Session {
    /// Create a session over SSH with default markers and timing.
    pub fn new(config: SshConfig) -> Self {
        Self::with_transport(SshTransport, config)
    }

    /// Start building a session for the given device.
    pub fn builder(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> SessionBuilder {
        SessionBuilder::new(host, username, password)
    }
}

impl<T: Transport> Session<T> {
    /// Create a session using a custom transport.
    pub fn with_transport(transport: T, config: SshConfig) -> Self {
        Self {
            transport,
            config,
            markers: PromptMarkers::default(),
            timing: Timing::default(),
            channel: None,
        }
    }

    /// Connect, authenticate, and swallow the login banner.
    ///
    /// # Errors
    ///
    /// Fails if a channel is already open or the transport cannot
    /// produce one.
    pub async fn open(&mut self) -> Result<()> {
        if self.channel.is_some() {
            return Err(SessionError::AlreadyConnected.into());
        }

        let mut channel = self.transport.connect(&self.config).await?;

        // Let the login banner land, then discard it so it cannot leak
        // into the first response.
        tokio::time::sleep(self.timing.banner_delay).await;
        channel.drain_pending().await?;

        self.channel = Some(channel);
        debug!("session open to {}", self.config.socket_addr());
        Ok(())
    }

    /// Close the connection.
    ///
    /// Idempotent, and never fails: teardown errors are logged because
    /// at this point there is nothing left to recover.
    pub async fn close(&mut self) {
        if let Some(channel) = self.channel.take() {
            if let Err(e) = channel.close().await {
                warn!("error closing session to {}: {e}", self.config.socket_addr());
            }
            debug!("session closed to {}", self.config.socket_addr());
        }
    }

    /// Whether a channel is currently open.
    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// Sample the device prompt by sending a bare newline.
    ///
    /// Returns the last non-empty line of whatever comes back, or a
    /// generic fallback when the device stays quiet. Never fails: the
    /// prompt is cosmetic context for the report, not a precondition.
    pub async fn current_prompt(&mut self) -> String {
        let Some(channel) = self.channel.as_mut() else {
            return PROMPT_FALLBACK.to_string();
        };

        if channel.send_line("").await.is_err() {
            return PROMPT_FALLBACK.to_string();
        }

        // Fixed wait rather than an adaptive read: the echo is tiny and
        // a known quantity, and leftovers are drained before the next
        // command anyway.
        tokio::time::sleep(self.timing.prompt_delay).await;
        match channel.read_chunk(READ_CHUNK_SIZE, Duration::ZERO).await {
            Ok(Some(chunk)) => {
                let text = String::from_utf8_lossy(&chunk);
                text.lines()
                    .rev()
                    .map(str::trim)
                    .find(|line| !line.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| PROMPT_FALLBACK.to_string())
            }
            _ => PROMPT_FALLBACK.to_string(),
        }
    }

    /// Send one command and collect its response.
    ///
    /// Never fails: missing connection, silence, and channel errors all
    /// come back as placeholder text so a batch can keep going.
    pub async fn send_command(&mut self, command: &str) -> String {
        if self.channel.is_none() {
            return NO_CONNECTION.to_string();
        }

        match self.exchange(command).await {
            Ok(text) if text.is_empty() => NO_RESPONSE.to_string(),
            Ok(text) => text,
            Err(e) => {
                warn!("command {command:?} failed: {e}");
                format!("Command error: {e}")
            }
        }
    }

    /// Drain stale output, send the command, read until the response
    /// settles.
    async fn exchange(&mut self, command: &str) -> Result<String> {
        let channel = self
            .channel
            .as_mut()
            .ok_or(SessionError::NotConnected)?;

        channel.drain_pending().await?;

        debug!("sending command: {command:?}");
        channel.send_line(command).await?;

        let outcome = read_to_idle(channel, &self.markers, &self.timing).await?;
        Ok(outcome.text)
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        if self.channel.is_some() {
            warn!(
                "session to {} dropped while still connected",
                self.config.socket_addr()
            );
        }
    }
}

/// Builder for configuring a [`Session`].
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use sshbatch::Session;
///
/// let session = Session::builder("10.0.0.1", "admin", "secret")
///     .port(2222)
///     .timeout(Duration::from_secs(5))
///     .markers(["#", ">", "%"])
///     .build();
/// ```
pub struct SessionBuilder {
    config: SshConfig,
    markers: PromptMarkers,
    timing: Timing,
}

impl SessionBuilder {
    /// Create a builder for the given device and credentials.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            config: SshConfig::new(host, username, password),
            markers: PromptMarkers::default(),
            timing: Timing::default(),
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.config = self.config.with_port(port);
        self
    }

    /// Set the connection timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    /// Replace the prompt marker literals.
    pub fn markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.markers = PromptMarkers::from_literals(markers);
        self
    }

    /// Replace the timing profile.
    pub fn timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Build a session over SSH.
    pub fn build(self) -> Session {
        self.build_with(SshTransport)
    }

    /// Build a session over a custom transport.
    pub fn build_with<T: Transport>(self, transport: T) -> Session<T> {
        Session {
            transport,
            config: self.config,
            markers: self.markers,
            timing: self.timing,
            channel: None,
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted transport and channel for session tests.

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use bytes::{Bytes, BytesMut};

    use crate::channel::DeviceChannel;
    use crate::error::{ChannelError, Result, TransportError};
    use crate::transport::{SshConfig, Transport};

    /// Scripted reaction to one `send_line` call.
    pub enum Reply {
        /// Queue this text as readable output.
        Text(&'static str),

        /// Make the next read fail.
        ReadError,
    }

    /// Channel that answers each sent line with the next scripted reply.
    pub struct FakeChannel {
        banner: BytesMut,
        replies: VecDeque<Reply>,
        error_next_read: bool,
        sent: Arc<Mutex<Vec<String>>>,
        closed: Arc<Mutex<bool>>,
    }

    /// Assertion handles shared with a [`FakeChannel`].
    #[derive(Clone)]
    pub struct FakeHandles {
        pub sent: Arc<Mutex<Vec<String>>>,
        pub closed: Arc<Mutex<bool>>,
    }

    impl FakeChannel {
        /// Script a channel: `banner` is readable immediately, each
        /// subsequent send consumes one reply.
        pub fn scripted(banner: &str, replies: Vec<Reply>) -> (Self, FakeHandles) {
            let handles = FakeHandles {
                sent: Arc::new(Mutex::new(Vec::new())),
                closed: Arc::new(Mutex::new(false)),
            };
            let channel = Self {
                banner: BytesMut::from(banner.as_bytes()),
                replies: replies.into(),
                error_next_read: false,
                sent: handles.sent.clone(),
                closed: handles.closed.clone(),
            };
            (channel, handles)
        }

        /// Script a channel whose first read fails.
        pub fn broken_banner() -> (Self, FakeHandles) {
            let (mut channel, handles) = Self::scripted("", vec![]);
            channel.error_next_read = true;
            (channel, handles)
        }
    }

    impl DeviceChannel for FakeChannel {
        async fn read_chunk(&mut self, max: usize, wait: Duration) -> Result<Option<Bytes>> {
            if self.error_next_read {
                self.error_next_read = false;
                return Err(ChannelError::Closed.into());
            }
            if self.banner.is_empty() {
                tokio::time::sleep(wait).await;
                return Ok(None);
            }
            let take = self.banner.len().min(max);
            Ok(Some(self.banner.split_to(take).freeze()))
        }

        async fn send_line(&mut self, line: &str) -> Result<()> {
            self.sent.lock().unwrap().push(line.to_string());
            match self.replies.pop_front() {
                Some(Reply::Text(text)) => self.banner.extend_from_slice(text.as_bytes()),
                Some(Reply::ReadError) => self.error_next_read = true,
                None => {}
            }
            Ok(())
        }

        async fn close(self) -> Result<()> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }

    /// Transport that hands out pre-scripted channels, or refuses.
    pub struct FakeTransport {
        channels: Mutex<VecDeque<FakeChannel>>,
        refuse: bool,
    }

    impl FakeTransport {
        pub fn serving(channel: FakeChannel) -> Self {
            Self {
                channels: Mutex::new(VecDeque::from([channel])),
                refuse: false,
            }
        }

        pub fn refusing() -> Self {
            Self {
                channels: Mutex::new(VecDeque::new()),
                refuse: true,
            }
        }
    }

    impl Transport for FakeTransport {
        type Channel = FakeChannel;

        async fn connect(&self, config: &SshConfig) -> Result<FakeChannel> {
            if self.refuse {
                return Err(TransportError::AuthenticationFailed {
                    user: config.username.clone(),
                }
                .into());
            }
            match self.channels.lock().unwrap().pop_front() {
                Some(channel) => Ok(channel),
                None => Err(TransportError::ConnectTimeout(config.timeout).into()),
            }
        }
    }
}
