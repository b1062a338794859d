//! Database schema initialization and migrations.

use crate::error::{DatabaseResultExt, Result};

impl super::Database {
    /// Initializes the database schema using the embedded SQL file.
    pub(super) fn initialize_schema(&self) -> Result<()> {
        self.connection
            .execute("PRAGMA foreign_keys = ON", [])
            .db_context("Failed to enable foreign keys")?;

        let schema_sql = include_str!("../../assets/schema.sql");
        self.connection
            .execute_batch(schema_sql)
            .db_context("Failed to initialize database schema")?;

        self.apply_migrations()?;

        Ok(())
    }

    /// Apply database migrations for existing databases
    fn apply_migrations(&self) -> Result<()> {
        // estimated_minutes arrived after the first schema
        let has_estimate_column: bool = self
            .connection
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('steps') WHERE name = 'estimated_minutes'",
                [],
                |row| row.get(0),
            )
            .map(|count: i64| count > 0)
            .db_context("Failed to inspect steps table")?;

        if !has_estimate_column {
            self.connection
                .execute("ALTER TABLE steps ADD COLUMN estimated_minutes INTEGER", [])
                .db_context("Failed to add estimated_minutes column to steps table")?;
        }

        Ok(())
    }
}
