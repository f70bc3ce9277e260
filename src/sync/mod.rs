//! Sync module - debounced saves to the document store and the live read path
//!
//! Saves are coalesced: every call restarts the quiet period and only the
//! latest state is written once it elapses. A failed write is reported as a
//! notice and never rolled back or retried; the next save is the retry.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde_json::Value;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tracing::{debug, error, info};

use crate::db::{Database, DocumentStore};
use crate::model::{HistorySession, WorkoutState};
use crate::sanitize::sanitize;
use crate::workbook::Workbook;

/// Default quiet period before a save is written
pub const SAVE_DELAY: Duration = Duration::from_millis(2000);

/// Transient message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

struct SaveRequest {
    user_id: String,
    state: WorkoutState,
    success_message: Option<String>,
}

enum Command {
    Save(SaveRequest),
    Flush(oneshot::Sender<()>),
}

/// Handle to the background writer
#[derive(Clone)]
pub struct SaveGateway {
    tx: mpsc::UnboundedSender<Command>,
}

impl SaveGateway {
    /// Start the writer task. Notices from writes arrive on the returned receiver.
    pub fn spawn<S>(store: Arc<Mutex<S>>, quiet: Duration) -> (Self, mpsc::UnboundedReceiver<Notice>)
    where
        S: DocumentStore + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(store, quiet, rx, notice_tx));
        (Self { tx }, notice_rx)
    }

    /// Schedule a write of `state` for `user_id`
    pub fn save(&self, user_id: &str, state: &WorkoutState, success_message: Option<&str>) {
        let request = SaveRequest {
            user_id: user_id.to_string(),
            state: state.clone(),
            success_message: success_message.map(str::to_string),
        };
        if self.tx.send(Command::Save(request)).is_err() {
            error!("Save requested after the writer stopped");
        }
    }

    /// Write any pending save now and wait for it
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

async fn run_writer<S: DocumentStore>(
    store: Arc<Mutex<S>>,
    quiet: Duration,
    mut rx: mpsc::UnboundedReceiver<Command>,
    notices: mpsc::UnboundedSender<Notice>,
) {
    let mut pending: Option<SaveRequest> = None;

    loop {
        let command = if pending.is_some() {
            match tokio::time::timeout(quiet, rx.recv()).await {
                Ok(command) => command,
                Err(_) => {
                    if let Some(request) = pending.take() {
                        write(&store, request, &notices).await;
                    }
                    continue;
                }
            }
        } else {
            rx.recv().await
        };

        match command {
            Some(Command::Save(request)) => pending = Some(request),
            Some(Command::Flush(ack)) => {
                if let Some(request) = pending.take() {
                    write(&store, request, &notices).await;
                }
                let _ = ack.send(());
            }
            None => {
                if let Some(request) = pending.take() {
                    write(&store, request, &notices).await;
                }
                debug!("Save writer stopped");
                break;
            }
        }
    }
}

async fn write<S: DocumentStore>(
    store: &Mutex<S>,
    request: SaveRequest,
    notices: &mpsc::UnboundedSender<Notice>,
) {
    let result = store
        .lock()
        .await
        .merge_workouts(&request.user_id, &request.state);

    match result {
        Ok(()) => {
            debug!("Saved program for {}", request.user_id);
            if let Some(message) = request.success_message {
                let _ = notices.send(Notice::Info(message));
            }
        }
        Err(e) => {
            error!("Failed to save program for {}: {:#}", request.user_id, e);
            let _ = notices.send(Notice::Error("Erreur de sauvegarde".to_string()));
        }
    }
}

/// Load the user's program through the sanitizer (seed when there is none)
pub fn open_workbook(db: &Database, user_id: &str) -> Result<Workbook> {
    let raw = db.load_workouts(user_id)?.unwrap_or(Value::Null);
    Ok(Workbook::new(sanitize(&raw)))
}

/// Push every remote document change into the workbook
pub async fn follow_remote(mut rx: watch::Receiver<Option<Value>>, workbook: Arc<Mutex<Workbook>>) {
    while rx.changed().await.is_ok() {
        let value = rx.borrow_and_update().clone();
        if let Some(value) = value {
            let changed = workbook.lock().await.apply_remote(&value);
            debug!("Remote document received (changed: {})", changed);
        }
    }
    info!("Remote subscription closed");
}

/// Append the current program to the workout log. Not debounced.
pub async fn complete_workout(
    db: &Mutex<Database>,
    user_id: &str,
    state: &WorkoutState,
) -> Result<HistorySession> {
    db.lock().await.append_history(user_id, state)
}
