//! Batch execution: run a block of commands and build the report.

use log::debug;

use super::Session;
use super::report::{BatchReport, CommandResult};
use crate::transport::Transport;

impl<T: Transport> Session<T> {
    /// Run a newline-separated block of commands against the device.
    ///
    /// Connects, samples the initial prompt, sends each non-blank line
    /// in order with a pacing pause in between, then disconnects. The
    /// connection is released on every path, including when individual
    /// commands fail.
    ///
    /// A connection failure is the only thing that fails the batch;
    /// per-command problems are reported inside the matching
    /// [`CommandResult`].
    pub async fn run(&mut self, commands: &str) -> BatchReport {
        // A leftover channel from an earlier run is released first so
        // the batch always starts on a fresh connection.
        self.close().await;

        if let Err(e) = self.open().await {
            return BatchReport::failure(format!("Failed to connect via SSH: {e}"));
        }

        let report = self.run_batch(commands).await;
        self.close().await;
        report
    }

    async fn run_batch(&mut self, commands: &str) -> BatchReport {
        let initial_prompt = self.current_prompt().await;
        debug!("initial prompt: {initial_prompt:?}");

        let commands = split_commands(commands);
        let mut results = Vec::with_capacity(commands.len());
        for command in commands {
            let response = self.send_command(command).await;
            results.push(CommandResult::new(command, response));
            tokio::time::sleep(self.timing.pacing).await;
        }

        BatchReport::completed(results, initial_prompt)
    }
}

/// Split a command block into trimmed, non-blank lines.
fn split_commands(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}
