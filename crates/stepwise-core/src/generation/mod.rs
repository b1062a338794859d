//! Step generation.
//!
//! - [`client`]: the [`StepGenerator`] seam to the content service and its
//!   request, response and error types
//! - [`throttle`]: token bucket spacing upstream calls
//! - [`timing`]: due dates of generated steps
//! - [`template`]: offline generator used by the command line
//! - [`orchestrator`]: runs generation for a goal's occurrences with retries,
//!   a run timeout and the generation status bookkeeping

pub mod client;
pub mod orchestrator;
pub mod template;
pub mod throttle;
pub mod timing;


pub use client::{
    validate_response, GeneratedStep, GenerationError, GenerationErrorKind, GenerationRequest,
    Phase, StepGenerator,
};
pub use orchestrator::{AdvanceOutcome, GenerationOrchestrator, RunResult};
pub use template::TemplateGenerator;
pub use throttle::{Throttle, ThrottledGenerator};
