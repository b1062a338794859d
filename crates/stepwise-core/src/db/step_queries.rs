//! Step CRUD operations and queries.

use jiff::Timestamp;
use rusqlite::{params, OptionalExtension};

use super::utils::{conversion_error, optional_u32, parse_column, parse_optional_column};
use crate::{
    error::{DatabaseResultExt, ProgressError, Result},
    models::{Audience, NewStep, Step, StepStatus, UpdateStepRequest},
};

const CHECK_GOAL_EXISTS_SQL: &str = "SELECT EXISTS(SELECT 1 FROM goals WHERE id = ?1)";
const CHECK_OCCURRENCE_STEPS_SQL: &str = "SELECT EXISTS(SELECT 1 FROM steps WHERE goal_id = ?1 AND occurrence_index = ?2 AND is_supporter_step = ?3)";
const COUNT_STEPS_SQL: &str = "SELECT COUNT(*) FROM steps WHERE goal_id = ?1";
const INSERT_STEP_SQL: &str = "INSERT INTO steps (goal_id, title, description, order_index, status, due_date, is_required, is_planned, is_supporter_step, dependency_step_ids, step_type, week_number, session_number, occurrence_index, estimated_minutes, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)";
const UPDATE_GOAL_TIMESTAMP_SQL: &str = "UPDATE goals SET updated_at = ?1 WHERE id = ?2";
const UPDATE_GOAL_TIMESTAMP_BY_STEP_SQL: &str =
    "UPDATE goals SET updated_at = ?1 WHERE id = (SELECT goal_id FROM steps WHERE id = ?2)";
const SELECT_STEP_DETAILS_SQL: &str = "SELECT title, description, status FROM steps WHERE id = ?1";
const UPDATE_STEP_SQL: &str =
    "UPDATE steps SET title = ?1, description = ?2, status = ?3, updated_at = ?4 WHERE id = ?5";
const SELECT_STEPS_BY_GOAL_SQL: &str = "SELECT id, goal_id, title, description, order_index, status, due_date, is_required, is_planned, is_supporter_step, dependency_step_ids, step_type, week_number, session_number, occurrence_index, estimated_minutes, created_at, updated_at FROM steps WHERE goal_id = ?1 ORDER BY order_index, id";
const SELECT_STEP_BY_ID_SQL: &str = "SELECT id, goal_id, title, description, order_index, status, due_date, is_required, is_planned, is_supporter_step, dependency_step_ids, step_type, week_number, session_number, occurrence_index, estimated_minutes, created_at, updated_at FROM steps WHERE id = ?1";
const SELECT_OCCURRENCE_STEPS_SQL: &str = "SELECT id, goal_id, title, description, order_index, status, due_date, is_required, is_planned, is_supporter_step, dependency_step_ids, step_type, week_number, session_number, occurrence_index, estimated_minutes, created_at, updated_at FROM steps WHERE goal_id = ?1 AND occurrence_index = ?2 ORDER BY order_index, id";

impl super::Database {
    /// Helper function to construct a Step from a database row
    fn build_step_from_row(row: &rusqlite::Row) -> rusqlite::Result<Step> {
        let dependencies: String = row.get(10)?;
        let dependency_step_ids: Vec<u64> = serde_json::from_str(&dependencies)
            .map_err(|e| conversion_error(10, format!("Invalid dependency list: {e}")))?;

        Ok(Step {
            id: row.get::<_, i64>(0)? as u64,
            goal_id: row.get::<_, i64>(1)? as u64,
            title: row.get(2)?,
            description: row.get(3)?,
            order_index: row.get::<_, i64>(4)? as u32,
            status: parse_column(row, 5)?,
            due_date: parse_optional_column(row, 6)?,
            is_required: row.get(7)?,
            is_planned: row.get(8)?,
            is_supporter_step: row.get(9)?,
            dependency_step_ids,
            step_type: parse_column(row, 11)?,
            week_number: optional_u32(row, 12)?,
            session_number: optional_u32(row, 13)?,
            occurrence_index: optional_u32(row, 14)?,
            estimated_minutes: optional_u32(row, 15)?,
            created_at: parse_column(row, 16)?,
            updated_at: parse_column(row, 17)?,
        })
    }

    /// Persists the generated steps of one occurrence for one audience.
    ///
    /// Steps flagged `depends_on_previous` are chained to the step inserted
    /// just before them. Returns `None`, writing nothing, when steps for the
    /// same `(goal, occurrence, audience)` already exist, so a repeated run
    /// never duplicates an occurrence.
    pub fn insert_occurrence_steps(
        &mut self,
        goal_id: u64,
        occurrence_index: u32,
        audience: Audience,
        steps: &[NewStep],
    ) -> Result<Option<Vec<Step>>> {
        let tx = self.write_transaction()?;

        let goal_exists: bool = tx
            .query_row(CHECK_GOAL_EXISTS_SQL, params![goal_id as i64], |row| row.get(0))
            .db_context("Failed to check goal existence")?;
        if !goal_exists {
            return Err(ProgressError::GoalNotFound { id: goal_id });
        }

        let supporter = audience == Audience::Supporter;
        let already_generated: bool = tx
            .query_row(
                CHECK_OCCURRENCE_STEPS_SQL,
                params![goal_id as i64, i64::from(occurrence_index), supporter],
                |row| row.get(0),
            )
            .db_context("Failed to check existing occurrence steps")?;
        if already_generated {
            return Ok(None);
        }

        let now = Timestamp::now();
        let now_str = now.to_string();
        let mut inserted: Vec<Step> = Vec::with_capacity(steps.len());

        for new_step in steps {
            let dependency_step_ids: Vec<u64> = match inserted.last() {
                Some(previous) if new_step.depends_on_previous => vec![previous.id],
                _ => Vec::new(),
            };

            tx.execute(
                INSERT_STEP_SQL,
                params![
                    goal_id as i64,
                    &new_step.title,
                    &new_step.description,
                    i64::from(new_step.order_index),
                    StepStatus::NotStarted.as_str(),
                    new_step.due_date.map(|d| d.to_string()),
                    new_step.is_required,
                    true,
                    new_step.is_supporter_step,
                    serde_json::to_string(&dependency_step_ids)?,
                    new_step.step_type.as_str(),
                    new_step.week_number.map(i64::from),
                    new_step.session_number.map(i64::from),
                    i64::from(occurrence_index),
                    new_step.estimated_minutes.map(i64::from),
                    &now_str,
                    &now_str
                ],
            )
            .db_context("Failed to insert step")?;

            inserted.push(Step {
                id: tx.last_insert_rowid() as u64,
                goal_id,
                title: new_step.title.clone(),
                description: new_step.description.clone(),
                order_index: new_step.order_index,
                status: StepStatus::NotStarted,
                due_date: new_step.due_date,
                is_required: new_step.is_required,
                is_planned: true,
                is_supporter_step: new_step.is_supporter_step,
                dependency_step_ids,
                step_type: new_step.step_type,
                week_number: new_step.week_number,
                session_number: new_step.session_number,
                occurrence_index: Some(occurrence_index),
                estimated_minutes: new_step.estimated_minutes,
                created_at: now,
                updated_at: now,
            });
        }

        tx.execute(UPDATE_GOAL_TIMESTAMP_SQL, params![&now_str, goal_id as i64])
            .db_context("Failed to update goal timestamp")?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(Some(inserted))
    }

    /// Whether steps for the given occurrence and audience exist.
    pub fn has_occurrence_steps(
        &self,
        goal_id: u64,
        occurrence_index: u32,
        audience: Audience,
    ) -> Result<bool> {
        self.connection
            .query_row(
                CHECK_OCCURRENCE_STEPS_SQL,
                params![
                    goal_id as i64,
                    i64::from(occurrence_index),
                    audience == Audience::Supporter
                ],
                |row| row.get(0),
            )
            .db_context("Failed to check existing occurrence steps")
    }

    /// Number of steps a goal has.
    pub fn count_steps(&self, goal_id: u64) -> Result<usize> {
        let count: i64 = self
            .connection
            .query_row(COUNT_STEPS_SQL, params![goal_id as i64], |row| row.get(0))
            .db_context("Failed to count steps")?;
        Ok(count as usize)
    }

    /// Updates step details. Returns the step as stored afterwards.
    pub fn update_step(&mut self, step_id: u64, request: &UpdateStepRequest) -> Result<Step> {
        if request.is_empty() {
            return self
                .get_step(step_id)?
                .ok_or(ProgressError::StepNotFound { id: step_id });
        }

        let tx = self.write_transaction()?;

        let (current_title, current_desc, current_status): (String, Option<String>, String) = tx
            .query_row(SELECT_STEP_DETAILS_SQL, params![step_id as i64], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .map_err(|e| {
                if matches!(e, rusqlite::Error::QueryReturnedNoRows) {
                    ProgressError::StepNotFound { id: step_id }
                } else {
                    ProgressError::database("Failed to get current step").with_source(e)
                }
            })?;

        let new_title = request.title.clone().unwrap_or(current_title);
        let new_description = request.description.clone().or(current_desc);
        let new_status = request
            .status
            .map(|s| s.as_str().to_string())
            .unwrap_or(current_status);

        let now_str = Timestamp::now().to_string();

        tx.execute(
            UPDATE_STEP_SQL,
            params![
                &new_title,
                &new_description,
                &new_status,
                &now_str,
                step_id as i64
            ],
        )
        .db_context("Failed to update step")?;

        tx.execute(
            UPDATE_GOAL_TIMESTAMP_BY_STEP_SQL,
            params![&now_str, step_id as i64],
        )
        .db_context("Failed to update goal timestamp")?;

        tx.commit().db_context("Failed to commit transaction")?;

        self.get_step(step_id)?
            .ok_or(ProgressError::StepNotFound { id: step_id })
    }

    /// Retrieves all steps of a goal in `order_index` order.
    pub fn get_steps(&self, goal_id: u64) -> Result<Vec<Step>> {
        let mut stmt = self
            .connection
            .prepare(SELECT_STEPS_BY_GOAL_SQL)
            .db_context("Failed to prepare query")?;

        let steps = stmt
            .query_map(params![goal_id as i64], Self::build_step_from_row)
            .db_context("Failed to query steps")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch steps")?;

        Ok(steps)
    }

    /// Retrieves the steps generated for one occurrence, both audiences.
    pub fn get_occurrence_steps(&self, goal_id: u64, occurrence_index: u32) -> Result<Vec<Step>> {
        let mut stmt = self
            .connection
            .prepare(SELECT_OCCURRENCE_STEPS_SQL)
            .db_context("Failed to prepare query")?;

        let steps = stmt
            .query_map(
                params![goal_id as i64, i64::from(occurrence_index)],
                Self::build_step_from_row,
            )
            .db_context("Failed to query occurrence steps")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch occurrence steps")?;

        Ok(steps)
    }

    /// Retrieves a single step by its ID.
    pub fn get_step(&self, step_id: u64) -> Result<Option<Step>> {
        self.connection
            .query_row(
                SELECT_STEP_BY_ID_SQL,
                params![step_id as i64],
                Self::build_step_from_row,
            )
            .optional()
            .db_context("Failed to get step")
    }
}
