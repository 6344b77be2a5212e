//! # sshbatch
//!
//! Batch command runner for network devices over interactive SSH.
//!
//! sshbatch drives the kind of CLI that switches and routers expose:
//! it opens a PTY shell, waits out the login banner, and infers where
//! each response ends from prompt markers and output timing, since
//! interactive shells frame nothing. A batch of commands comes back as
//! a structured report that serializes cleanly to JSON.
//!
//! ## Features
//!
//! - Async SSH connections via russh
//! - Adaptive response reads: prompt markers, idle gaps, and a hard
//!   ceiling for devices that never go quiet
//! - Per-command fault isolation: a failing command becomes report
//!   text, not a batch abort
//! - Scriptable transport seam for testing without a device
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sshbatch::Session;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut session = Session::builder("192.168.1.1", "admin", "secret").build();
//!
//!     let report = session.run("show version\nshow ip interface brief").await;
//!
//!     if report.success {
//!         for result in report.results() {
//!             println!("=== {} ===\n{}", result.command, result.response);
//!         }
//!     } else {
//!         eprintln!("batch failed: {}", report.error.unwrap_or_default());
//!     }
//! }
//! ```

pub mod channel;
pub mod error;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use channel::{PromptMarkers, ReadEnd, ReadOutcome, Timing};
pub use error::Error;
pub use session::{BatchReport, CommandResult, Session, SessionBuilder};
pub use transport::{SshConfig, SshTransport, Transport};
