//! Error taxonomy for process runs.
//!
//! Input binding errors stop a run before it launches, algorithm errors end
//! it, publish and attachment errors are contained to a single output.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolboxError {
    #[error("Unknown process: {0}")]
    UnknownProcess(String),

    #[error("Invalid input binding '{name}': {reason}")]
    InputBinding { name: String, reason: String },

    #[error("{process} failed: {message}")]
    AlgorithmExecution { process: String, message: String },

    #[error("Cannot publish output '{output}': {reason}")]
    Publish { output: String, reason: String },

    #[error("Cannot attach '{name}' to the workspace: {reason}")]
    Attachment { name: String, reason: String },

    #[error("Invalid settings: {0}")]
    Settings(String),

    #[error(transparent)]
    Core(#[from] geotoolbox_core::Error),
}

impl ToolboxError {
    pub fn input_binding(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InputBinding {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn publish(output: impl Into<String>, reason: impl ToString) -> Self {
        Self::Publish {
            output: output.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error was raised before the algorithm started
    pub fn is_input_binding(&self) -> bool {
        matches!(self, Self::UnknownProcess(_) | Self::InputBinding { .. })
    }
}

pub type Result<T> = std::result::Result<T, ToolboxError>;
