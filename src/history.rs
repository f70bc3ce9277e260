//! Undo/redo over whole-program snapshots

use std::collections::VecDeque;

use crate::model::WorkoutState;

/// Maximum number of snapshots kept for undo
pub const UNDO_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("Rien à annuler")]
    NothingToUndo,
    #[error("Rien à rétablir")]
    NothingToRedo,
}

/// Current state plus bounded undo and redo stacks
#[derive(Debug, Clone)]
pub struct Timeline {
    current: WorkoutState,
    undo: VecDeque<WorkoutState>,
    redo: Vec<WorkoutState>,
    limit: usize,
}

impl Timeline {
    pub fn new(initial: WorkoutState) -> Self {
        Self::with_limit(initial, UNDO_LIMIT)
    }

    pub fn with_limit(initial: WorkoutState, limit: usize) -> Self {
        Self {
            current: initial,
            undo: VecDeque::with_capacity(limit),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn current(&self) -> &WorkoutState {
        &self.current
    }

    /// Install a new state as a fresh edit: old state goes on the undo stack,
    /// redo history is discarded
    pub fn record_and_apply(&mut self, next: WorkoutState) {
        let previous = std::mem::replace(&mut self.current, next);
        self.undo.push_back(previous);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    pub fn undo(&mut self) -> Result<(), HistoryError> {
        let previous = self.undo.pop_back().ok_or(HistoryError::NothingToUndo)?;
        let current = std::mem::replace(&mut self.current, previous);
        self.redo.push(current);
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), HistoryError> {
        let next = self.redo.pop().ok_or(HistoryError::NothingToRedo)?;
        let current = std::mem::replace(&mut self.current, next);
        self.undo.push_back(current);
        Ok(())
    }

    /// Install a state without recording it (remote echo). Both stacks stay.
    pub fn replace_silently(&mut self, state: WorkoutState) {
        self.current = state;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DayEntry;
    use crate::seed::seed_state;

    fn with_day(base: &WorkoutState, name: &str) -> WorkoutState {
        let mut next = base.clone();
        next.days.insert(name.to_string(), DayEntry::default());
        next.day_order.push(name.to_string());
        next
    }

    /// Applies n edits, returns every state from initial to last
    fn run_edits(timeline: &mut Timeline, n: usize) -> Vec<WorkoutState> {
        let mut states = vec![timeline.current().clone()];
        for i in 1..=n {
            let next = with_day(timeline.current(), &format!("Jour {}", i));
            timeline.record_and_apply(next.clone());
            states.push(next);
        }
        states
    }

    #[test]
    fn test_empty_stacks() {
        let mut timeline = Timeline::new(seed_state());
        assert_eq!(timeline.undo(), Err(HistoryError::NothingToUndo));
        assert_eq!(timeline.redo(), Err(HistoryError::NothingToRedo));
        assert_eq!(timeline.current(), &seed_state());
    }

    #[test]
    fn test_undo_inverse_law() {
        let mut timeline = Timeline::new(seed_state());
        let states = run_edits(&mut timeline, 7);

        for _ in 0..7 {
            timeline.undo().unwrap();
        }
        assert_eq!(timeline.current(), &states[0]);
        assert_eq!(timeline.undo(), Err(HistoryError::NothingToUndo));
    }

    #[test]
    fn test_undo_then_redo_restores() {
        let mut timeline = Timeline::new(seed_state());
        let states = run_edits(&mut timeline, 3);

        timeline.undo().unwrap();
        assert_eq!(timeline.current(), &states[2]);
        timeline.redo().unwrap();
        assert_eq!(timeline.current(), &states[3]);

        // redo/undo leave the other stack intact
        timeline.undo().unwrap();
        timeline.undo().unwrap();
        assert_eq!(timeline.redo_len(), 2);
        timeline.redo().unwrap();
        assert_eq!(timeline.undo_len(), 2);
        assert_eq!(timeline.current(), &states[2]);

        let a = serde_json::to_string(timeline.current()).unwrap();
        timeline.undo().unwrap();
        timeline.redo().unwrap();
        assert_eq!(serde_json::to_string(timeline.current()).unwrap(), a);
    }

    #[test]
    fn test_new_edit_invalidates_redo() {
        let mut timeline = Timeline::new(seed_state());
        run_edits(&mut timeline, 2);

        timeline.undo().unwrap();
        assert!(timeline.can_redo());

        let next = with_day(timeline.current(), "Autre");
        timeline.record_and_apply(next);
        assert_eq!(timeline.redo(), Err(HistoryError::NothingToRedo));
    }

    #[test]
    fn test_bounded_history() {
        let mut timeline = Timeline::new(seed_state());
        let states = run_edits(&mut timeline, 25);
        assert_eq!(timeline.undo_len(), UNDO_LIMIT);

        for _ in 0..UNDO_LIMIT {
            timeline.undo().unwrap();
        }
        // oldest five pre-states were evicted: we land on the state after the 5th edit
        assert_eq!(timeline.current(), &states[5]);
        assert_ne!(timeline.current(), &seed_state());
        assert_eq!(timeline.undo(), Err(HistoryError::NothingToUndo));
    }

    #[test]
    fn test_replace_silently_keeps_stacks() {
        let mut timeline = Timeline::new(seed_state());
        run_edits(&mut timeline, 2);
        timeline.undo().unwrap();

        let remote = with_day(&seed_state(), "Distant");
        timeline.replace_silently(remote.clone());
        assert_eq!(timeline.current(), &remote);
        assert_eq!(timeline.undo_len(), 1);
        assert_eq!(timeline.redo_len(), 1);
    }
}
