//! Database operations and SQLite management for goals, steps and substeps.
//!
//! This module provides the low-level store behind the
//! [`Tracker`](crate::Tracker). It handles SQLite connections and schema
//! management, and splits its queries by record type.

use std::{path::Path, time::Duration};

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::error::{DatabaseResultExt, Result};

pub mod goal_queries;
pub mod migrations;
pub mod step_queries;
pub mod substep_queries;
pub mod utils;

/// How long a writer waits for another connection's write lock.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Database connection and operations handler.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Creates a new database connection and initializes the schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = Connection::open(path).db_context("Failed to open database connection")?;
        connection
            .busy_timeout(BUSY_TIMEOUT)
            .db_context("Failed to set busy timeout")?;

        let db = Self { connection };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Begins a transaction that takes the write lock up front. Other writers
    /// wait up to [`BUSY_TIMEOUT`] for it.
    pub(crate) fn write_transaction(&mut self) -> Result<Transaction<'_>> {
        self.connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .db_context("Failed to begin transaction")
    }
}
