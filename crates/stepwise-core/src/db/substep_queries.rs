//! Substep operations and queries.

use jiff::Timestamp;
use rusqlite::{params, OptionalExtension};

use super::utils::parse_optional_column;
use crate::{
    error::{DatabaseResultExt, ProgressError, Result},
    gating::SubstepIndex,
    models::Substep,
};

const CHECK_STEP_EXISTS_SQL: &str = "SELECT EXISTS(SELECT 1 FROM steps WHERE id = ?1)";
const INSERT_SUBSTEP_SQL: &str =
    "INSERT INTO substeps (step_id, title, created_at) VALUES (?1, ?2, ?3)";
const SELECT_SUBSTEP_SQL: &str =
    "SELECT id, step_id, title, completed_at, initiated_at FROM substeps WHERE id = ?1";
const SELECT_SUBSTEPS_BY_STEP_SQL: &str =
    "SELECT id, step_id, title, completed_at, initiated_at FROM substeps WHERE step_id = ?1 ORDER BY id";
const SELECT_SUBSTEPS_BY_GOAL_SQL: &str = "SELECT ss.id, ss.step_id, ss.title, ss.completed_at, ss.initiated_at FROM substeps ss JOIN steps s ON s.id = ss.step_id WHERE s.goal_id = ?1 ORDER BY ss.step_id, ss.id";
const MARK_SUBSTEP_INITIATED_SQL: &str =
    "UPDATE substeps SET initiated_at = COALESCE(initiated_at, ?1) WHERE id = ?2";
const MARK_SUBSTEP_COMPLETED_SQL: &str = "UPDATE substeps SET initiated_at = COALESCE(initiated_at, ?1), completed_at = COALESCE(completed_at, ?1) WHERE id = ?2";

impl super::Database {
    /// Helper function to construct a Substep from a database row
    fn build_substep_from_row(row: &rusqlite::Row) -> rusqlite::Result<Substep> {
        Ok(Substep {
            id: row.get::<_, i64>(0)? as u64,
            step_id: row.get::<_, i64>(1)? as u64,
            title: row.get(2)?,
            completed_at: parse_optional_column(row, 3)?,
            initiated_at: parse_optional_column(row, 4)?,
        })
    }

    /// Adds a substep to a step.
    pub fn add_substep(&mut self, step_id: u64, title: &str) -> Result<Substep> {
        let tx = self.write_transaction()?;

        let step_exists: bool = tx
            .query_row(CHECK_STEP_EXISTS_SQL, params![step_id as i64], |row| row.get(0))
            .db_context("Failed to check step existence")?;
        if !step_exists {
            return Err(ProgressError::StepNotFound { id: step_id });
        }

        tx.execute(
            INSERT_SUBSTEP_SQL,
            params![step_id as i64, title, Timestamp::now().to_string()],
        )
        .db_context("Failed to insert substep")?;

        let id = tx.last_insert_rowid() as u64;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(Substep {
            id,
            step_id,
            title: title.to_string(),
            completed_at: None,
            initiated_at: None,
        })
    }

    /// Records that work on a substep began. Keeps an earlier start time.
    pub fn start_substep(&mut self, substep_id: u64, at: Timestamp) -> Result<Substep> {
        self.touch_substep(MARK_SUBSTEP_INITIATED_SQL, substep_id, at)
    }

    /// Marks a substep completed, starting it as well when it never was.
    pub fn complete_substep(&mut self, substep_id: u64, at: Timestamp) -> Result<Substep> {
        self.touch_substep(MARK_SUBSTEP_COMPLETED_SQL, substep_id, at)
    }

    fn touch_substep(&mut self, sql: &str, substep_id: u64, at: Timestamp) -> Result<Substep> {
        let updated = self
            .connection
            .execute(sql, params![at.to_string(), substep_id as i64])
            .db_context("Failed to update substep")?;
        if updated == 0 {
            return Err(ProgressError::SubstepNotFound { id: substep_id });
        }

        self.get_substep(substep_id)?
            .ok_or(ProgressError::SubstepNotFound { id: substep_id })
    }

    /// Retrieves a single substep by its ID.
    pub fn get_substep(&self, substep_id: u64) -> Result<Option<Substep>> {
        self.connection
            .query_row(
                SELECT_SUBSTEP_SQL,
                params![substep_id as i64],
                Self::build_substep_from_row,
            )
            .optional()
            .db_context("Failed to get substep")
    }

    /// Retrieves the substeps of a step.
    pub fn get_substeps(&self, step_id: u64) -> Result<Vec<Substep>> {
        let mut stmt = self
            .connection
            .prepare(SELECT_SUBSTEPS_BY_STEP_SQL)
            .db_context("Failed to prepare query")?;

        let substeps = stmt
            .query_map(params![step_id as i64], Self::build_substep_from_row)
            .db_context("Failed to query substeps")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch substeps")?;

        Ok(substeps)
    }

    /// Retrieves every substep of a goal, grouped by step.
    pub fn get_goal_substeps(&self, goal_id: u64) -> Result<SubstepIndex> {
        let mut stmt = self
            .connection
            .prepare(SELECT_SUBSTEPS_BY_GOAL_SQL)
            .db_context("Failed to prepare query")?;

        let mut index = SubstepIndex::new();
        let rows = stmt
            .query_map(params![goal_id as i64], Self::build_substep_from_row)
            .db_context("Failed to query substeps")?;
        for substep in rows {
            let substep = substep.db_context("Failed to fetch substeps")?;
            index.entry(substep.step_id).or_default().push(substep);
        }

        Ok(index)
    }
}
