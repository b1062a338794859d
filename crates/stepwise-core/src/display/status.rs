//! One-line status messages for command feedback.

use std::fmt;

/// How a status message should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Notice,
    Failure,
}

/// A short message reporting what a command did.
#[derive(Debug, Clone)]
pub struct OperationStatus {
    pub message: String,
    pub tone: Tone,
}

impl OperationStatus {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            tone: Tone::Success,
        }
    }

    /// Nothing went wrong, but nothing happened either.
    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            tone: Tone::Notice,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            tone: Tone::Failure,
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.tone {
            Tone::Success => "Done:",
            Tone::Notice => "Note:",
            Tone::Failure => "Error:",
        };
        writeln!(f, "{label} {}", self.message)
    }
}
