//! Data models for goals, steps and substeps.
//!
//! This module contains the domain records the engine works on. Display
//! implementations live in [`crate::display::models`] so data structures stay
//! separate from presentation.
//!
//! - [`Goal`]: timing parameters plus [`GoalMetadata`], the versioned
//!   generation bookkeeping
//! - [`Step`]: one actionable unit, optionally chained to earlier steps
//! - [`Substep`]: scaffolding inside a step, tracked for completion
//!
//! # Examples
//!
//! ```rust
//! use stepwise_core::models::{Step, StepStatus, StepType, Substep};
//! use jiff::Timestamp;
//!
//! let step = Step {
//!     id: 1,
//!     goal_id: 1,
//!     title: "Put on walking shoes".to_string(),
//!     status: StepStatus::NotStarted,
//!     // ... other fields
//! #   description: None,
//! #   order_index: 0,
//! #   due_date: None,
//! #   is_required: true,
//! #   is_planned: true,
//! #   is_supporter_step: false,
//! #   dependency_step_ids: vec![],
//! #   step_type: StepType::Action,
//! #   week_number: None,
//! #   session_number: None,
//! #   occurrence_index: None,
//! #   estimated_minutes: None,
//! #   created_at: Timestamp::now(),
//! #   updated_at: Timestamp::now(),
//! };
//! assert!(!step.is_complete(&[]));
//!
//! // With substeps, completion follows the substeps rather than the status
//! let done = Substep {
//!     id: 1,
//!     step_id: 1,
//!     title: "Find the left shoe".to_string(),
//!     completed_at: Some(Timestamp::now()),
//!     initiated_at: None,
//! };
//! assert!(step.is_complete(&[done]));
//! ```

pub mod day;
pub mod goal;
pub mod metadata;
pub mod requests;
pub mod status;
pub mod step;
pub mod summary;


pub use day::Day;
pub use goal::{Goal, NewGoal};
pub use metadata::{
    FailedDay, GenerationState, GenerationStatus, GoalMetadata, OccurrencePlan, TransitionCause,
    METADATA_SCHEMA_VERSION,
};
pub use requests::UpdateStepRequest;
pub use status::{Audience, GoalStatus, StepStatus, StepType, SupportRole};
pub use step::{NewStep, Step, Substep};
pub use summary::GoalSummary;
