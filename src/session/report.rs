//! Batch report types.

use serde::{Deserialize, Serialize};

/// Outcome of one command in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    /// The command that was sent.
    pub command: String,

    /// Response text, or a placeholder when nothing came back.
    pub response: String,
}

impl CommandResult {
    /// Create a result for a command.
    pub fn new(command: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            response: response.into(),
        }
    }
}

/// Report for one batch run against a device.
///
/// A batch that connected carries `results` and `initial_prompt`; a
/// batch that never connected carries `error`. Absent fields are
/// omitted from the serialized form rather than emitted as null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Whether a connection was established and the batch ran.
    pub success: bool,

    /// Per-command results, in execution order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<CommandResult>>,

    /// Prompt captured before the first command was sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_prompt: Option<String>,

    /// Why the batch never ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchReport {
    /// Build the report for a batch that connected and ran.
    ///
    /// Commands that individually failed still count as a run batch;
    /// their failure text sits in the matching [`CommandResult`].
    pub fn completed(results: Vec<CommandResult>, initial_prompt: impl Into<String>) -> Self {
        Self {
            success: true,
            results: Some(results),
            initial_prompt: Some(initial_prompt.into()),
            error: None,
        }
    }

    /// Build the report for a batch that never got a connection.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            results: None,
            initial_prompt: None,
            error: Some(error.into()),
        }
    }

    /// Results slice, empty when the batch never ran.
    pub fn results(&self) -> &[CommandResult] {
        self.results.as_deref().unwrap_or_default()
    }
}
