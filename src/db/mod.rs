//! Database module - SQLite document store for programs and workout history

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::model::{HistorySession, WorkoutState, new_id};

const ANONYMOUS_UID_KEY: &str = "anonymous_uid";

/// Write surface used by the save gateway
pub trait DocumentStore: Send {
    /// Merge the program's fields into the user's live document
    fn merge_workouts(&self, user_id: &str, state: &WorkoutState) -> Result<()>;
}

/// Database wrapper
pub struct Database {
    conn: Connection,
    watchers: HashMap<String, watch::Sender<Option<Value>>>,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path))?;
        Self::from_connection(conn)
    }

    /// Throwaway database, used by tests
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn,
            watchers: HashMap::new(),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                user_id TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS history (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                date INTEGER NOT NULL,
                total_volume REAL NOT NULL,
                payload TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS history_user_date ON history (user_id, date DESC);
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Reuse the stored anonymous user, or create one
    pub fn sign_in_anonymously(&self) -> Result<String> {
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![ANONYMOUS_UID_KEY],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(uid) = existing {
            return Ok(uid);
        }

        let uid = format!("anon-{}", new_id(Utc::now()));
        self.conn.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)",
            params![ANONYMOUS_UID_KEY, uid],
        )?;
        info!("Signed in anonymously as {}", uid);
        Ok(uid)
    }

    /// Raw live document of a user, if any
    pub fn load_workouts(&self, user_id: &str) -> Result<Option<Value>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;

        match body {
            Some(text) => match serde_json::from_str(&text) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    warn!("Stored document for {} is not valid JSON: {}", user_id, e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Live view of a user's document; updated after every write
    pub fn subscribe(&mut self, user_id: &str) -> Result<watch::Receiver<Option<Value>>> {
        if let Some(sender) = self.watchers.get(user_id) {
            return Ok(sender.subscribe());
        }
        let current = self.load_workouts(user_id)?;
        let (sender, receiver) = watch::channel(current);
        self.watchers.insert(user_id.to_string(), sender);
        Ok(receiver)
    }

    fn notify(&self, user_id: &str, body: &Value) {
        if let Some(sender) = self.watchers.get(user_id) {
            sender.send_replace(Some(body.clone()));
        }
    }

    /// Append a completed workout; the store assigns date and id
    pub fn append_history(&self, user_id: &str, workouts: &WorkoutState) -> Result<HistorySession> {
        let now = Utc::now();
        let date = millis_to_date(now.timestamp_millis());
        let session = HistorySession {
            id: new_id(now),
            date,
            total_volume: workouts.total_volume(),
            workouts: workouts.clone(),
        };

        self.conn.execute(
            "INSERT INTO history (id, user_id, date, total_volume, payload) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.id,
                user_id,
                session.date.timestamp_millis(),
                session.total_volume,
                serde_json::to_string(&session.workouts)?,
            ],
        )?;
        info!("Workout completed: {} (volume {})", session.id, session.total_volume);
        Ok(session)
    }

    /// Most recent sessions first
    pub fn recent_history(&self, user_id: &str, limit: usize) -> Result<Vec<HistorySession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, total_volume, payload FROM history WHERE user_id = ?1 ORDER BY date DESC LIMIT ?2",
        )?;

        let rows = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut sessions = Vec::with_capacity(rows.len());
        for (id, date, total_volume, payload) in rows {
            match serde_json::from_str::<WorkoutState>(&payload) {
                Ok(workouts) => sessions.push(HistorySession {
                    id,
                    date: millis_to_date(date),
                    total_volume,
                    workouts,
                }),
                Err(e) => warn!("Skipping unreadable history entry {}: {}", id, e),
            }
        }
        Ok(sessions)
    }

    /// Remove one whole session. Returns false if it did not exist.
    pub fn delete_history(&self, user_id: &str, id: &str) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM history WHERE user_id = ?1 AND id = ?2",
            params![user_id, id],
        )?;
        Ok(deleted > 0)
    }
}

impl DocumentStore for Database {
    fn merge_workouts(&self, user_id: &str, state: &WorkoutState) -> Result<()> {
        let mut body = match self.load_workouts(user_id)? {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        if let Value::Object(fields) = serde_json::to_value(state)? {
            for (key, value) in fields {
                body.insert(key, value);
            }
        }
        let body = Value::Object(body);

        self.conn.execute(
            "INSERT INTO documents (user_id, body, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
            params![user_id, serde_json::to_string(&body)?, Utc::now().timestamp_millis()],
        )?;
        debug!("Document for {} written", user_id);

        self.notify(user_id, &body);
        Ok(())
    }
}

fn millis_to_date(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}
