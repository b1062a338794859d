//! The external step-generation service as seen by the orchestrator.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::models::{Audience, SupportRole};

/// Produces the micro-steps of one occurrence.
///
/// Implementations talk to whatever content service backs the deployment. The
/// orchestrator only relies on the returned list being ordered and on errors
/// being classified through [`GenerationErrorKind`].
#[async_trait]
pub trait StepGenerator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedStep>, GenerationError>;
}

#[async_trait]
impl<G: StepGenerator + ?Sized> StepGenerator for Arc<G> {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedStep>, GenerationError> {
        (**self).generate(request).await
    }
}

/// Context for generating the steps of one occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub goal_id: u64,
    pub goal_title: String,
    pub category: Option<String>,
    pub description: Option<String>,
    /// Zero-based position in the goal's schedule
    pub occurrence_index: usize,
    pub occurrence_start: Timestamp,
    pub total_occurrences: usize,
    pub week_number: u32,
    pub session_number: u32,
    pub frequency_per_week: Option<u32>,
    pub duration_weeks: u32,
    pub audience: Audience,
    pub support_role: SupportRole,
}

/// Where a generated step sits relative to the occurrence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Done the evening before
    Preparation,
    /// Getting started at the scheduled time
    #[default]
    Activation,
    /// Everything after the start
    FollowUp,
}

/// One step as returned by the generation service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedStep {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "estimatedDurationMinutes")]
    pub estimated_minutes: Option<u32>,
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub week_number: Option<u32>,
}

impl GeneratedStep {
    pub fn new(title: impl Into<String>, phase: Phase) -> Self {
        Self {
            title: title.into(),
            description: None,
            estimated_minutes: None,
            phase,
            week_number: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_estimated_minutes(mut self, minutes: u32) -> Self {
        self.estimated_minutes = Some(minutes);
        self
    }
}

/// Why a generation call failed, which decides how it is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    /// The service asked us to slow down
    RateLimited,
    /// The call did not answer in time
    Timeout,
    /// Connection problems or a server-side outage
    Unavailable,
    /// The service answered with something unusable
    InvalidResponse,
}

impl fmt::Display for GenerationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GenerationErrorKind::RateLimited => "rate limited",
            GenerationErrorKind::Timeout => "timed out",
            GenerationErrorKind::Unavailable => "service unavailable",
            GenerationErrorKind::InvalidResponse => "invalid response",
        };
        f.write_str(label)
    }
}

/// Classified failure of a single generation call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct GenerationError {
    pub kind: GenerationErrorKind,
    pub message: String,
}

impl GenerationError {
    pub fn new(kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::RateLimited, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::Timeout, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::Unavailable, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::InvalidResponse, message)
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self.kind, GenerationErrorKind::InvalidResponse)
    }
}

/// Reject responses the orchestrator cannot turn into steps.
pub fn validate_response(steps: &[GeneratedStep]) -> Result<(), GenerationError> {
    if steps.is_empty() {
        return Err(GenerationError::invalid_response("no steps returned"));
    }
    if let Some(position) = steps.iter().position(|s| s.title.trim().is_empty()) {
        return Err(GenerationError::invalid_response(format!(
            "step {position} has an empty title"
        )));
    }
    Ok(())
}
