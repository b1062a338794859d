//! Display formatting for domain objects and operation results.
//!
//! Domain models implement [`std::fmt::Display`] directly. Collections and
//! operation outcomes are wrapped in newtypes so that the same data can be
//! rendered differently depending on context. Everything renders as markdown,
//! which the command line hands to its terminal renderer.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Domain Models  │    │   Wrappers &    │    │    Markdown     │
//! │  (Goal, Step)   │───▶│  Result Types   │───▶│     Output      │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! - [`collections`]: goal lists, step lists, the goal overview and schedule
//!   previews
//! - [`results`]: create and update results, run reports, daily-check outcomes
//! - [`status`]: one-line confirmations ([`OperationStatus`])
//! - [`datetime`]: timestamps in a goal's time zone
//! - [`models`]: Display implementations for domain models
//!
//! ```rust
//! use stepwise_core::display::OperationStatus;
//!
//! let status = OperationStatus::success("Step 4 marked done");
//! assert_eq!(status.to_string(), "Done: Step 4 marked done\n");
//! ```

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;
pub mod status;

pub use collections::{
    GoalOverview, GoalSummaries, SchedulePreview, Steps, Substeps, UpcomingSteps,
};
pub use datetime::LocalDateTime;
pub use results::{CreateResult, UpdateResult};
pub use status::{OperationStatus, Tone};
