//! Command definitions and their execution.
//!
//! Argument structs carry the clap attributes and convert into the
//! interface-neutral parameter types of `stepwise_core::params`, so the core
//! never depends on clap:
//!
//! ```text
//! User Input → CLI Args (clap) → Core Params → Tracker / Orchestrator
//! ```

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use stepwise_core::{
    display::{
        CreateResult, GoalOverview, GoalSummaries, OperationStatus, SchedulePreview, Substeps,
        UpdateResult,
    },
    generation::{GenerationOrchestrator, TemplateGenerator},
    handlers,
    models::StepStatus,
    params::{AddSubstep, CreateGoal, Id, ListGoals},
    Tracker,
};

use crate::renderer::TerminalRenderer;

/// When and how often a goal happens
#[derive(Args)]
pub struct TimingArgs {
    /// First day of the goal (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub start: Option<String>,
    /// Last day of the goal (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
    /// Weekdays to practise on, comma-separated (mon,wed,fri)
    #[arg(long)]
    pub days: Option<String>,
    /// Sessions per week; defaults to the number of selected days
    #[arg(long)]
    pub per_week: Option<u32>,
    /// How many weeks the habit runs for
    #[arg(long)]
    pub weeks: Option<u32>,
    /// Local time each occurrence starts at (HH:MM, defaults to 09:00)
    #[arg(long)]
    pub at: Option<String>,
}

/// Create a goal and generate its first steps
#[derive(Args)]
pub struct CreateGoalArgs {
    /// What you want to achieve
    pub title: String,
    /// Longer context for the goal
    #[arg(short, long)]
    pub description: Option<String>,
    /// Domain of the goal (exercise, cooking, social, ...)
    #[arg(short, long)]
    pub category: Option<String>,
    /// How a supporter is involved
    #[arg(long, value_enum)]
    pub support: Option<SupportArg>,
    #[command(flatten)]
    pub timing: TimingArgs,
}

impl From<CreateGoalArgs> for CreateGoal {
    fn from(val: CreateGoalArgs) -> Self {
        CreateGoal {
            title: val.title,
            description: val.description,
            category: val.category,
            support_role: val.support.map(|s| s.as_str().to_string()),
            start_date: val.timing.start,
            due_date: val.timing.due,
            frequency_per_week: val.timing.per_week,
            selected_days: val.timing.days,
            duration_weeks: val.timing.weeks,
            time_of_day: val.timing.at,
        }
    }
}

/// Preview occurrences
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub timing: TimingArgs,
}

impl From<ScheduleArgs> for CreateGoal {
    fn from(val: ScheduleArgs) -> Self {
        CreateGoal {
            title: "Preview".to_string(),
            start_date: val.timing.start,
            due_date: val.timing.due,
            frequency_per_week: val.timing.per_week,
            selected_days: val.timing.days,
            duration_weeks: val.timing.weeks,
            time_of_day: val.timing.at,
            ..Default::default()
        }
    }
}

/// List goals
#[derive(Args)]
pub struct ListGoalsArgs {
    /// Include archived goals
    #[arg(long)]
    pub archived: bool,
}

impl From<ListGoalsArgs> for ListGoals {
    fn from(val: ListGoalsArgs) -> Self {
        ListGoals {
            archived: val.archived,
        }
    }
}

/// Identifies a goal, step or substep
#[derive(Args)]
pub struct IdArgs {
    /// Unique identifier
    pub id: u64,
}

impl From<IdArgs> for Id {
    fn from(val: IdArgs) -> Self {
        Id { id: val.id }
    }
}

/// Add a substep to a step
#[derive(Args)]
pub struct AddSubstepArgs {
    /// ID of the step to break down
    pub step_id: u64,
    /// Title of the substep
    pub title: String,
}

impl From<AddSubstepArgs> for AddSubstep {
    fn from(val: AddSubstepArgs) -> Self {
        AddSubstep {
            step_id: val.step_id,
            title: val.title,
        }
    }
}

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Create a goal and generate its first steps
    #[command(alias = "c")]
    Create(CreateGoalArgs),
    /// List goals
    #[command(aliases = ["l", "ls"])]
    List(ListGoalsArgs),
    /// Show a goal with its next steps
    ///
    /// A generation run found abandoned is marked failed and retried.
    #[command(alias = "s")]
    Show(IdArgs),
    /// Retry generation for a goal whose run failed
    #[command(alias = "r")]
    Retry(IdArgs),
    /// Generate the next occurrence of a habit once the last one is done
    Advance(IdArgs),
    /// Archive a goal
    #[command(alias = "a")]
    Archive(IdArgs),
}

#[derive(Subcommand)]
pub enum StepCommands {
    /// Mark a step done
    #[command(alias = "d")]
    Done(IdArgs),
    /// Pass over a step
    Skip(IdArgs),
    /// Mark a step in progress
    Start(IdArgs),
    /// Show a step with its substeps
    #[command(alias = "s")]
    Show(IdArgs),
}

#[derive(Subcommand)]
pub enum SubstepCommands {
    /// Add a substep to a step
    #[command(alias = "a")]
    Add(AddSubstepArgs),
    /// Record that work on a substep began
    Start(IdArgs),
    /// Mark a substep completed
    #[command(alias = "c")]
    Complete(IdArgs),
}

/// Supporter involvement accepted on the command line
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum SupportArg {
    /// No supporter
    None,
    /// Supporter checks in from afar
    Remote,
    /// Supporter is there in person
    HandsOn,
}

impl SupportArg {
    fn as_str(self) -> &'static str {
        match self {
            SupportArg::None => "none",
            SupportArg::Remote => "remote",
            SupportArg::HandsOn => "hands_on",
        }
    }
}

/// Runs parsed commands against a tracker and renders the results.
pub struct Cli {
    tracker: Tracker,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(tracker: Tracker, renderer: TerminalRenderer) -> Self {
        Self { tracker, renderer }
    }

    /// The command line has no content service; steps come from templates.
    fn orchestrator(&self) -> GenerationOrchestrator {
        self.tracker.orchestrator(TemplateGenerator)
    }

    pub async fn handle_goal_command(&self, command: GoalCommands) -> Result<()> {
        match command {
            GoalCommands::Create(args) => self.create_goal(&args.into()).await,
            GoalCommands::List(args) => self.list_goals(&args.into()).await,
            GoalCommands::Show(args) => self.show_goal(&args.into()).await,
            GoalCommands::Retry(args) => self.retry_goal(&args.into()).await,
            GoalCommands::Advance(args) => self.advance_goal(&args.into()).await,
            GoalCommands::Archive(args) => self.archive_goal(&args.into()).await,
        }
    }

    pub async fn handle_step_command(&self, command: StepCommands) -> Result<()> {
        match command {
            StepCommands::Done(args) => self.set_step_status(args.id, StepStatus::Done).await,
            StepCommands::Skip(args) => self.set_step_status(args.id, StepStatus::Skipped).await,
            StepCommands::Start(args) => {
                self.set_step_status(args.id, StepStatus::InProgress).await
            }
            StepCommands::Show(args) => self.show_step(&args.into()).await,
        }
    }

    pub async fn handle_substep_command(&self, command: SubstepCommands) -> Result<()> {
        match command {
            SubstepCommands::Add(args) => {
                let substep = self
                    .tracker
                    .add_substep(&args.into())
                    .await
                    .context("Failed to add substep")?;
                self.renderer
                    .render(&CreateResult::new(substep).to_string())
            }
            SubstepCommands::Start(args) => {
                let substep = self
                    .tracker
                    .start_substep(&args.into())
                    .await
                    .context("Failed to start substep")?;
                self.renderer.render(
                    &UpdateResult::with_changes(substep, vec!["Started".to_string()]).to_string(),
                )
            }
            SubstepCommands::Complete(args) => {
                let substep = self
                    .tracker
                    .complete_substep(&args.into())
                    .await
                    .context("Failed to complete substep")?;
                self.renderer.render(
                    &UpdateResult::with_changes(substep, vec!["Completed".to_string()])
                        .to_string(),
                )
            }
        }
    }

    pub fn preview_schedule(&self, args: ScheduleArgs) -> Result<()> {
        let time_zone = self.tracker.config().time_zone.clone();
        let (start_date, schedule) = handlers::handle_preview_schedule(&args.into(), &time_zone)
            .context("Failed to compute schedule")?;

        let preview = SchedulePreview {
            start_date,
            schedule: &schedule,
            time_zone,
        };
        self.renderer.render(&preview.to_string())
    }

    pub async fn list_goals(&self, params: &ListGoals) -> Result<()> {
        let goals = self
            .tracker
            .list_goals(params)
            .await
            .context("Failed to list goals")?;

        let title = if params.archived {
            "All Goals"
        } else {
            "Active Goals"
        };
        self.renderer
            .render(&format!("# {title}\n\n{}", GoalSummaries(goals)))
    }

    async fn create_goal(&self, params: &CreateGoal) -> Result<()> {
        let created = handlers::handle_create_goal(&self.orchestrator(), params)
            .await
            .context("Failed to create goal")?;

        self.renderer
            .render(&CreateResult::new(created.goal).to_string())?;
        match created.run {
            Ok(run) => self.renderer.render(&format!("\n{run}")),
            Err(e) => self.renderer.status(&OperationStatus::failure(format!(
                "Steps could not be generated: {e}"
            ))),
        }
    }

    async fn show_goal(&self, params: &Id) -> Result<()> {
        let shown = handlers::handle_show_goal(&self.orchestrator(), params)
            .await
            .context("Failed to show goal")?;

        match &shown.retry {
            Some(Ok(run)) => self.renderer.status(&OperationStatus::notice(format!(
                "Generation had stalled and was retried ({})",
                run.status
            )))?,
            Some(Err(e)) => self.renderer.status(&OperationStatus::failure(format!(
                "Generation had stalled and the retry failed: {e}"
            )))?,
            None => {}
        }

        let limit = self.tracker.config().upcoming_limit;
        self.renderer
            .render(&GoalOverview::new(&shown.view, limit).to_string())
    }

    async fn retry_goal(&self, params: &Id) -> Result<()> {
        let run = self
            .orchestrator()
            .retry(params.id)
            .await
            .context("Failed to retry generation")?;
        self.renderer.render(&run.to_string())
    }

    async fn advance_goal(&self, params: &Id) -> Result<()> {
        let outcome = handlers::handle_advance_goal(&self.orchestrator(), params)
            .await
            .context("Failed to advance goal")?;
        self.renderer.render(&outcome.to_string())
    }

    async fn archive_goal(&self, params: &Id) -> Result<()> {
        let goal = self
            .tracker
            .archive_goal(params)
            .await
            .context("Failed to archive goal")?;
        self.renderer.status(&OperationStatus::success(format!(
            "Archived goal '{}' (ID: {})",
            goal.title, goal.id
        )))
    }

    async fn set_step_status(&self, id: u64, status: StepStatus) -> Result<()> {
        let step = self
            .tracker
            .update_step_status(id, status)
            .await
            .context("Failed to update step")?;
        let change = format!("Status: {status}");
        self.renderer
            .render(&UpdateResult::with_changes(step, vec![change]).to_string())
    }

    async fn show_step(&self, params: &Id) -> Result<()> {
        let step = self
            .tracker
            .get_step(params)
            .await
            .context("Failed to get step")?
            .ok_or_else(|| anyhow!("Step with ID {} not found", params.id))?;
        let substeps = self
            .tracker
            .get_substeps(params)
            .await
            .context("Failed to get substeps")?;

        self.renderer.render(&step.to_string())?;
        if !substeps.is_empty() {
            self.renderer
                .render(&format!("#### Substeps\n\n{}", Substeps(substeps)))?;
        }
        Ok(())
    }
}
