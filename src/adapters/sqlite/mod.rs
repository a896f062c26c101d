//! SQLite adapter: Implementation of `AssessmentStore`.
//!
//! Provides local persistence for per-user assessment history.
//!
//! # Layout
//!
//! One `assessments` table. Scores and levels are stored as columns so the
//! history can be queried directly; the questionnaire is kept as JSON.
//! Timestamps are RFC 3339 UTC with microsecond precision, which sorts
//! chronologically as text.
//!
//! # Mutex Behavior
//!
//! The connection is protected by a `Mutex`. A poisoned mutex (from a panic
//! in another thread) surfaces as `StorageError::Poisoned` on every later call.
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{Assessment, RiskAssessmentInput, RiskResult};
use crate::ports::{AssessmentPage, AssessmentStore};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database connection lock poisoned")]
    Poisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const SELECT_COLUMNS: &str = r"
    SELECT id, user_id, date, diabetes_score, cvd_score, input_json, model_fingerprint
    FROM assessments
";

/// SQLite storage adapter.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`. `:memory:` is accepted.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        tracing::debug!("Opened assessment store at {:?}", path);
        Ok(store)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS assessments (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                diabetes_score REAL NOT NULL,
                diabetes_level TEXT NOT NULL,
                cvd_score REAL NOT NULL,
                cvd_level TEXT NOT NULL,
                overall_score REAL NOT NULL,
                overall_level TEXT NOT NULL,
                input_json TEXT NOT NULL,
                model_fingerprint TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_assessments_user_date
                ON assessments(user_id, date DESC);
            ",
        )?;

        Ok(())
    }

    /// Map a row selected with `SELECT_COLUMNS`.
    ///
    /// Levels are rederived from the stored scores rather than read back.
    fn row_to_assessment(row: &Row<'_>) -> rusqlite::Result<Assessment> {
        let id: String = row.get(0)?;
        let user_id: String = row.get(1)?;
        let date_str: String = row.get(2)?;
        let diabetes_score: f64 = row.get(3)?;
        let cvd_score: f64 = row.get(4)?;
        let input_json: String = row.get(5)?;
        let model_fingerprint: String = row.get(6)?;

        let date = DateTime::parse_from_rfc3339(&date_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
        let input: RiskAssessmentInput = serde_json::from_str(&input_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

        Ok(Assessment {
            id,
            user_id,
            date,
            result: RiskResult::from_scores(diabetes_score, cvd_score),
            input,
            model_fingerprint,
        })
    }

    fn count_where_user(conn: &Connection, user_id: &str) -> Result<usize, StorageError> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM assessments WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

impl AssessmentStore for SqliteStore {
    type Error = StorageError;

    fn save_assessment(&self, assessment: &Assessment) -> Result<(), Self::Error> {
        let input_json = serde_json::to_string(&assessment.input)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let result = &assessment.result;

        let conn = self.conn()?;
        conn.execute(
            r"
            INSERT INTO assessments (
                id, user_id, date,
                diabetes_score, diabetes_level, cvd_score, cvd_level,
                overall_score, overall_level, input_json, model_fingerprint
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ",
            params![
                assessment.id,
                assessment.user_id,
                assessment.date.to_rfc3339_opts(SecondsFormat::Micros, true),
                result.diabetes.score,
                result.diabetes.level.as_str(),
                result.cvd.score,
                result.cvd.level.as_str(),
                result.overall.score,
                result.overall.level.as_str(),
                input_json,
                assessment.model_fingerprint,
            ],
        )?;

        tracing::debug!("Saved assessment {} to storage", assessment.id);
        Ok(())
    }

    fn load_user_assessments(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Assessment>, Self::Error> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY date DESC, rowid DESC LIMIT ?2"
        ))?;

        let assessments = stmt
            .query_map(
                params![user_id, i64::try_from(limit).unwrap_or(i64::MAX)],
                Self::row_to_assessment,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(assessments)
    }

    fn load_user_assessments_paginated(
        &self,
        user_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<AssessmentPage, Self::Error> {
        let conn = self.conn()?;
        let total_count = Self::count_where_user(&conn, user_id)?;

        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY date DESC, rowid DESC LIMIT ?2 OFFSET ?3"
        ))?;

        let assessments = stmt
            .query_map(
                params![
                    user_id,
                    i64::try_from(limit).unwrap_or(i64::MAX),
                    i64::try_from(offset).unwrap_or(i64::MAX)
                ],
                Self::row_to_assessment,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AssessmentPage::new(assessments, total_count, offset, limit))
    }

    fn load_assessment(&self, id: &str, user_id: &str) -> Result<Option<Assessment>, Self::Error> {
        let conn = self.conn()?;

        let assessment = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1 AND user_id = ?2"),
                params![id, user_id],
                Self::row_to_assessment,
            )
            .optional()?;

        Ok(assessment)
    }

    fn count_user_assessments(&self, user_id: &str) -> Result<usize, Self::Error> {
        let conn = self.conn()?;
        Self::count_where_user(&conn, user_id)
    }

    fn delete_assessment(&self, id: &str, user_id: &str) -> Result<bool, Self::Error> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM assessments WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(deleted > 0)
    }

    fn delete_user_assessments(&self, user_id: &str) -> Result<usize, Self::Error> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM assessments WHERE user_id = ?1",
            params![user_id],
        )?;
        tracing::warn!("Deleted {} assessments for one user", deleted);
        Ok(deleted)
    }

    fn count_assessments(&self) -> Result<usize, Self::Error> {
        let conn = self.conn()?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM assessments", [], |row| row.get(0))?;

        Ok(usize::try_from(count).unwrap_or(0))
    }
}
