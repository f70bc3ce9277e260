//! Display filters over the live program

use crate::model::{DayEntry, Exercise, WorkoutState, parse_number};

/// What the program view currently shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    /// Case-insensitive substring of the exercise name
    pub search: String,
    pub day: Option<String>,
    pub category: Option<String>,
    /// Only exercises with at least one series of reps > 0
    pub completed_only: bool,
    pub show_deleted: bool,
}

impl Filters {
    fn narrows_exercises(&self) -> bool {
        !self.search.trim().is_empty() || self.completed_only
    }

    fn keeps(&self, exercise: &Exercise, needle: &str) -> bool {
        if exercise.is_deleted && !self.show_deleted {
            return false;
        }
        if !needle.is_empty() && !exercise.name.to_lowercase().contains(needle) {
            return false;
        }
        if self.completed_only && !exercise.series.iter().any(|s| parse_number(&s.reps) > 0.0) {
            return false;
        }
        true
    }
}

/// Builds a filtered copy. The source is only borrowed, never changed.
pub fn project(state: &WorkoutState, filters: &Filters) -> WorkoutState {
    let needle = filters.search.trim().to_lowercase();
    let mut out = WorkoutState {
        last_updated: state.last_updated,
        ..WorkoutState::default()
    };

    for (day_name, day) in state.ordered() {
        if filters.day.as_ref().is_some_and(|d| d != day_name) {
            continue;
        }

        let mut entry = DayEntry::default();
        for (category, exercises) in day.ordered() {
            if filters.category.as_ref().is_some_and(|c| c != category) {
                continue;
            }
            let kept: Vec<Exercise> = exercises
                .iter()
                .filter(|ex| filters.keeps(ex, &needle))
                .cloned()
                .collect();
            if kept.is_empty() && filters.narrows_exercises() {
                continue;
            }
            entry.category_order.push(category.clone());
            entry.categories.insert(category.clone(), kept);
        }

        if entry.categories.is_empty() && filters.narrows_exercises() {
            continue;
        }
        out.day_order.push(day_name.clone());
        out.days.insert(day_name.clone(), entry);
    }
    out
}
