//! SQLite persistence for feedback.
//!
//! Every operation opens its own connection, so concurrent requests never
//! share a handle. Async callers go through [`FeedbackStore::run`], which
//! moves the work onto the blocking pool.

use crate::feedback::models::{
    AnsweredCount, FeedbackEntry, FeedbackStats, NewFeedback, ProviderCount,
};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS feedback (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
        satisfaction INTEGER NOT NULL,
        clarity INTEGER NOT NULL,
        llm_provider TEXT NOT NULL,
        questions_answered TEXT NOT NULL,
        improvements TEXT,
        conversation TEXT,
        user_agent TEXT,
        ip_address TEXT
    );
"#;

/// Handle to the feedback database file.
#[derive(Debug, Clone)]
pub struct FeedbackStore {
    path: PathBuf,
}

impl FeedbackStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.path)?)
    }

    /// Create the feedback table if it does not exist yet.
    pub fn init_schema(&self) -> Result<(), StoreError> {
        self.connect()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Insert a submission and return its id.
    pub fn insert(&self, feedback: &NewFeedback) -> Result<i64, StoreError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO feedback
                (satisfaction, clarity, llm_provider, questions_answered,
                 improvements, conversation, user_agent, ip_address)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                feedback.satisfaction,
                feedback.clarity,
                feedback.llm_provider,
                feedback.questions_answered,
                feedback.improvements,
                feedback.conversation,
                feedback.user_agent,
                feedback.ip_address,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// All rows, newest first.
    pub fn list(&self) -> Result<Vec<FeedbackEntry>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, satisfaction, clarity, llm_provider, questions_answered,
                    improvements, conversation, user_agent, ip_address
             FROM feedback
             ORDER BY timestamp DESC, id DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(FeedbackEntry {
                id: row.get("id")?,
                timestamp: row.get("timestamp")?,
                satisfaction: row.get("satisfaction")?,
                clarity: row.get("clarity")?,
                llm_provider: row.get("llm_provider")?,
                questions_answered: row.get("questions_answered")?,
                improvements: row.get("improvements")?,
                conversation: row.get("conversation")?,
                user_agent: row.get("user_agent")?,
                ip_address: row.get("ip_address")?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Totals, rounded averages and the two distributions.
    pub fn stats(&self) -> Result<FeedbackStats, StoreError> {
        let conn = self.connect()?;

        let (total_responses, avg_satisfaction, avg_clarity): (i64, Option<f64>, Option<f64>) =
            conn.query_row(
                "SELECT COUNT(*), AVG(satisfaction), AVG(clarity) FROM feedback",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

        let mut stmt = conn.prepare(
            "SELECT llm_provider, COUNT(*) AS count FROM feedback
             GROUP BY llm_provider ORDER BY count DESC, llm_provider ASC",
        )?;
        let llm_providers = stmt
            .query_map([], |row| {
                Ok(ProviderCount {
                    llm_provider: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT questions_answered, COUNT(*) AS count FROM feedback
             GROUP BY questions_answered ORDER BY count DESC, questions_answered ASC",
        )?;
        let questions_answered = stmt
            .query_map([], |row| {
                Ok(AnsweredCount {
                    questions_answered: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FeedbackStats {
            total_responses,
            average_satisfaction: round2(avg_satisfaction),
            average_clarity: round2(avg_clarity),
            llm_providers,
            questions_answered,
        })
    }

    /// Run a store operation on the blocking pool.
    pub async fn run<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&FeedbackStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(&store)).await?
    }
}

fn round2(value: Option<f64>) -> f64 {
    value.map_or(0.0, |v| (v * 100.0).round() / 100.0)
}
