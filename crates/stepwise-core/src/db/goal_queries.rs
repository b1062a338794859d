//! Goal CRUD operations and metadata read-merge-write.

use jiff::Timestamp;
use rusqlite::{params, OptionalExtension};

use super::utils::{conversion_error, optional_u32, parse_column, parse_optional_column};
use crate::{
    error::{DatabaseResultExt, ProgressError, Result},
    models::{Day, Goal, GoalMetadata, GoalStatus, GoalSummary, NewGoal},
};

const INSERT_GOAL_SQL: &str = "INSERT INTO goals (title, description, category, start_date, due_date, frequency_per_week, selected_days, duration_weeks, time_of_day, support_role, status, metadata, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)";
const SELECT_GOAL_SQL: &str = "SELECT id, title, description, category, start_date, due_date, frequency_per_week, selected_days, duration_weeks, time_of_day, support_role, status, metadata, created_at, updated_at FROM goals WHERE id = ?1";
const SELECT_GOAL_METADATA_SQL: &str = "SELECT metadata FROM goals WHERE id = ?1";
const UPDATE_GOAL_METADATA_SQL: &str =
    "UPDATE goals SET metadata = ?1, updated_at = ?2 WHERE id = ?3";
const UPDATE_GOAL_STATUS_SQL: &str = "UPDATE goals SET status = ?1, updated_at = ?2 WHERE id = ?3";
const SELECT_GOAL_SUMMARIES_SQL: &str = "SELECT g.id, g.title, g.status, g.metadata, g.start_date, g.due_date, g.frequency_per_week, \
     (SELECT COUNT(*) FROM steps s WHERE s.goal_id = g.id) AS total_steps, \
     (SELECT COUNT(*) FROM steps s WHERE s.goal_id = g.id AND s.status IN ('done', 'skipped')) AS closed_steps \
     FROM goals g";

impl super::Database {
    /// Helper function to construct a Goal from a database row
    fn build_goal_from_row(row: &rusqlite::Row) -> rusqlite::Result<Goal> {
        let days: String = row.get(7)?;
        let selected_days = Day::parse_list(&days).map_err(|e| conversion_error(7, e))?;

        let metadata: String = row.get(12)?;
        let metadata = GoalMetadata::from_json(&metadata)
            .map_err(|e| conversion_error(12, format!("Invalid goal metadata: {e}")))?;

        Ok(Goal {
            id: row.get::<_, i64>(0)? as u64,
            title: row.get(1)?,
            description: row.get(2)?,
            category: row.get(3)?,
            start_date: parse_column(row, 4)?,
            due_date: parse_optional_column(row, 5)?,
            frequency_per_week: optional_u32(row, 6)?,
            selected_days,
            duration_weeks: row.get::<_, i64>(8)? as u32,
            time_of_day: parse_column(row, 9)?,
            support_role: parse_column(row, 10)?,
            status: parse_column(row, 11)?,
            metadata,
            created_at: parse_column(row, 13)?,
            updated_at: parse_column(row, 14)?,
        })
    }

    /// Creates a new goal. Generation bookkeeping starts out empty.
    pub fn create_goal(&mut self, goal: &NewGoal) -> Result<Goal> {
        let tx = self.write_transaction()?;

        let now = Timestamp::now();
        let now_str = now.to_string();
        let metadata = GoalMetadata::default();

        tx.execute(
            INSERT_GOAL_SQL,
            params![
                &goal.title,
                &goal.description,
                &goal.category,
                goal.start_date.to_string(),
                goal.due_date.map(|d| d.to_string()),
                goal.frequency_per_week.map(i64::from),
                Day::join(&goal.selected_days),
                i64::from(goal.duration_weeks),
                goal.time_of_day.to_string(),
                goal.support_role.as_str(),
                GoalStatus::Planned.as_str(),
                metadata.to_json()?,
                &now_str,
                &now_str
            ],
        )
        .db_context("Failed to insert goal")?;

        let id = tx.last_insert_rowid() as u64;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(Goal {
            id,
            title: goal.title.clone(),
            description: goal.description.clone(),
            category: goal.category.clone(),
            start_date: goal.start_date,
            due_date: goal.due_date,
            frequency_per_week: goal.frequency_per_week,
            selected_days: goal.selected_days.clone(),
            duration_weeks: goal.duration_weeks,
            time_of_day: goal.time_of_day,
            support_role: goal.support_role,
            status: GoalStatus::Planned,
            metadata,
            created_at: now,
            updated_at: now,
        })
    }

    /// Retrieves a goal by its ID.
    pub fn get_goal(&self, id: u64) -> Result<Option<Goal>> {
        self.connection
            .query_row(SELECT_GOAL_SQL, params![id as i64], Self::build_goal_from_row)
            .optional()
            .db_context("Failed to query goal")
    }

    /// Retrieves a goal, failing with `GoalNotFound` when it does not exist.
    pub fn require_goal(&self, id: u64) -> Result<Goal> {
        self.get_goal(id)?
            .ok_or(ProgressError::GoalNotFound { id })
    }

    /// Lists goals, newest first, with step counts.
    pub fn list_goals(&self, include_archived: bool) -> Result<Vec<GoalSummary>> {
        let mut query = SELECT_GOAL_SUMMARIES_SQL.to_string();
        if !include_archived {
            query.push_str(" WHERE g.status != 'archived'");
        }
        query.push_str(" ORDER BY g.created_at DESC, g.id DESC");

        let mut stmt = self
            .connection
            .prepare(&query)
            .db_context("Failed to prepare query")?;

        let summaries = stmt
            .query_map([], |row| {
                let metadata: String = row.get(3)?;
                let metadata = GoalMetadata::from_json(&metadata)
                    .map_err(|e| conversion_error(3, format!("Invalid goal metadata: {e}")))?;

                Ok(GoalSummary {
                    id: row.get::<_, i64>(0)? as u64,
                    title: row.get(1)?,
                    status: parse_column(row, 2)?,
                    generation_status: metadata.generation.status(),
                    start_date: parse_column(row, 4)?,
                    due_date: parse_optional_column(row, 5)?,
                    frequency_per_week: optional_u32(row, 6)?,
                    total_steps: row.get::<_, i64>(7)? as u32,
                    completed_steps: row.get::<_, i64>(8)? as u32,
                })
            })
            .db_context("Failed to query goals")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch goals")?;

        Ok(summaries)
    }

    /// Sets the lifecycle status of a goal.
    pub fn set_goal_status(&mut self, id: u64, status: GoalStatus) -> Result<Goal> {
        let tx = self.write_transaction()?;

        let updated = tx
            .execute(
                UPDATE_GOAL_STATUS_SQL,
                params![status.as_str(), Timestamp::now().to_string(), id as i64],
            )
            .db_context("Failed to update goal status")?;

        if updated == 0 {
            return Err(ProgressError::GoalNotFound { id });
        }

        tx.commit().db_context("Failed to commit transaction")?;

        self.require_goal(id)
    }

    /// Reads a goal's metadata, lets `apply` change it and writes the result
    /// back inside one transaction. Keys unknown to this crate survive the
    /// round trip untouched.
    ///
    /// Nothing is written when `apply` fails.
    pub fn update_metadata<F>(&mut self, id: u64, apply: F) -> Result<GoalMetadata>
    where
        F: FnOnce(&mut GoalMetadata) -> Result<()>,
    {
        let tx = self.write_transaction()?;

        let raw: String = tx
            .query_row(SELECT_GOAL_METADATA_SQL, params![id as i64], |row| row.get(0))
            .optional()
            .db_context("Failed to read goal metadata")?
            .ok_or(ProgressError::GoalNotFound { id })?;

        let mut metadata = GoalMetadata::from_json(&raw)?;
        apply(&mut metadata)?;

        tx.execute(
            UPDATE_GOAL_METADATA_SQL,
            params![metadata.to_json()?, Timestamp::now().to_string(), id as i64],
        )
        .db_context("Failed to write goal metadata")?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(metadata)
    }
}
