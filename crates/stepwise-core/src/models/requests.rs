//! Request types for updating models.

use super::StepStatus;

/// Parameters for updating a step.
#[derive(Debug, Default)]
pub struct UpdateStepRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<StepStatus>,
}

impl UpdateStepRequest {
    /// Request that only changes the status.
    pub fn status(status: StepStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Whether the request would change anything at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }
}

impl TryFrom<crate::params::UpdateStep> for UpdateStepRequest {
    type Error = crate::ProgressError;

    /// Convert an UpdateStep parameter into a validated UpdateStepRequest.
    ///
    /// ```rust
    /// use stepwise_core::{models::{StepStatus, UpdateStepRequest}, params::UpdateStep};
    ///
    /// let params = UpdateStep {
    ///     id: 1,
    ///     status: Some("done".to_string()),
    ///     ..Default::default()
    /// };
    ///
    /// let request: UpdateStepRequest = params.try_into()?;
    /// assert_eq!(request.status, Some(StepStatus::Done));
    /// # stepwise_core::Result::<()>::Ok(())
    /// ```
    fn try_from(params: crate::params::UpdateStep) -> Result<Self, Self::Error> {
        let status = params.validate()?;

        Ok(Self {
            title: params.title,
            description: params.description,
            status,
        })
    }
}
