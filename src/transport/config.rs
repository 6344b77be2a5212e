//! SSH connection configuration.

use std::time::Duration;

use secrecy::SecretString;

/// Default SSH port.
pub const DEFAULT_PORT: u16 = 22;

/// Default connection timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// SSH connection configuration for a device session.
///
/// The password is held as a [`SecretString`] so it is zeroized on drop
/// and redacted from `Debug` output and logs.
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port (default: 22).
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Password for authentication.
    pub password: SecretString,

    /// Connection timeout.
    pub timeout: Duration,
}

impl SshConfig {
    /// Create a configuration with the default port and timeout.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: username.into(),
            password: SecretString::from(password.into()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the SSH port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the connection timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Socket address string for log messages.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
