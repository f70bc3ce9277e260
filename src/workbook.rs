//! The single owner of the live program: undo timeline plus view filters

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

use crate::history::{HistoryError, Timeline};
use crate::model::WorkoutState;
use crate::ops::{self, Change, ExerciseEdit, NewExercise, OpError};
use crate::sanitize::sanitize;
use crate::stats::filters::{Filters, project};

/// Live program state. All edits go through here.
#[derive(Debug, Clone)]
pub struct Workbook {
    timeline: Timeline,
    filters: Filters,
}

impl Workbook {
    pub fn new(initial: WorkoutState) -> Self {
        Self {
            timeline: Timeline::new(initial),
            filters: Filters::default(),
        }
    }

    /// Build from an untrusted document (remote read or import)
    pub fn from_raw(raw: &Value) -> Self {
        Self::new(sanitize(raw))
    }

    pub fn state(&self) -> &WorkoutState {
        self.timeline.current()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut Filters {
        &mut self.filters
    }

    /// Filtered, display-only copy of the program
    pub fn visible(&self) -> WorkoutState {
        project(self.state(), &self.filters)
    }

    fn commit(&mut self, result: Result<Change, OpError>) -> Result<String, OpError> {
        let change = result?;
        debug!("commit: {}", change.message);
        self.timeline.record_and_apply(change.state);
        Ok(change.message)
    }

    pub fn add_exercise(
        &mut self,
        day: &str,
        category: &str,
        input: &NewExercise,
    ) -> Result<String, OpError> {
        let result = ops::add_exercise(self.state(), day, category, input, Utc::now());
        self.commit(result)
    }

    pub fn edit_exercise(
        &mut self,
        day: &str,
        category: &str,
        id: &str,
        edit: &ExerciseEdit,
    ) -> Result<String, OpError> {
        let result = ops::edit_exercise(self.state(), day, category, id, edit, Utc::now());
        self.commit(result)
    }

    pub fn delete_exercise(&mut self, day: &str, category: &str, id: &str) -> Result<String, OpError> {
        let result = ops::delete_exercise(self.state(), day, category, id, Utc::now());
        self.commit(result)
    }

    pub fn reactivate_exercise(&mut self, id: &str) -> Result<String, OpError> {
        let result = ops::reactivate_exercise(self.state(), id, Utc::now());
        self.commit(result)
    }

    pub fn purge_exercise(&mut self, day: &str, category: &str, id: &str) -> Result<String, OpError> {
        let result = ops::purge_exercise(self.state(), day, category, id, Utc::now());
        self.commit(result)
    }

    pub fn add_day(&mut self, name: &str) -> Result<String, OpError> {
        let result = ops::add_day(self.state(), name, Utc::now());
        self.commit(result)
    }

    /// Renames a day; an active day filter follows the new name
    pub fn rename_day(&mut self, old: &str, new: &str) -> Result<String, OpError> {
        let result = ops::rename_day(self.state(), old, new, Utc::now());
        let message = self.commit(result)?;
        if self.filters.day.as_deref() == Some(old) {
            self.filters.day = Some(new.trim().to_string());
        }
        Ok(message)
    }

    /// Deletes a day; an active day filter on it is cleared
    pub fn delete_day(&mut self, name: &str) -> Result<String, OpError> {
        let result = ops::delete_day(self.state(), name, Utc::now());
        let message = self.commit(result)?;
        if self.filters.day.as_deref() == Some(name) {
            self.filters.day = None;
        }
        Ok(message)
    }

    pub fn add_category(&mut self, day: &str, name: &str) -> Result<String, OpError> {
        let result = ops::add_category(self.state(), day, name, Utc::now());
        self.commit(result)
    }

    pub fn delete_category(&mut self, day: &str, name: &str) -> Result<String, OpError> {
        let result = ops::delete_category(self.state(), day, name, Utc::now());
        let message = self.commit(result)?;
        if self.filters.category.as_deref() == Some(name) {
            self.filters.category = None;
        }
        Ok(message)
    }

    /// Installs an imported program as a normal undoable edit
    pub fn import(&mut self, incoming: WorkoutState) -> String {
        let change = ops::replace_all(incoming, Utc::now());
        self.timeline.record_and_apply(change.state);
        change.message
    }

    pub fn undo(&mut self) -> Result<&'static str, HistoryError> {
        self.timeline.undo()?;
        Ok("Action annulée")
    }

    pub fn redo(&mut self) -> Result<&'static str, HistoryError> {
        self.timeline.redo()?;
        Ok("Action rétablie")
    }

    /// Installs a remote document. Returns false when it matches the current state.
    pub fn apply_remote(&mut self, raw: &Value) -> bool {
        let incoming = sanitize(raw);
        if &incoming == self.state() {
            return false;
        }
        info!("Remote program changed, updating local state");
        self.timeline.replace_silently(incoming);
        true
    }
}
