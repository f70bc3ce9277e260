//! Stats module - read-only summaries over the workout log
//!
//! Features:
//! - Volume and frequency
//! - Personal bests per exercise
//! - Chart series and weight progression trend (linfa)
//! - Display filters over the live program

pub mod filters;
pub mod progression;
pub mod records;

pub use filters::{Filters, project};
pub use progression::Progression;
pub use records::{PersonalBest, personal_bests, record_key};

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::model::{HistorySession, parse_number};

/// Totals shown on the stats page
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub sessions: usize,
    pub total_volume: f64,
    pub average_volume: f64,
    pub weekly_frequency: f64,
    /// Exercise present in the most sessions, with its count
    pub most_trained: Option<(String, usize)>,
}

/// Workout log analytics
pub struct Analytics {
    /// Oldest first
    sessions: Vec<HistorySession>,
}

impl Analytics {
    pub fn new(mut sessions: Vec<HistorySession>) -> Self {
        sessions.sort_by_key(|s| s.date);
        Self { sessions }
    }

    /// Volume of one session, recomputed from its snapshot
    pub fn session_volume(session: &HistorySession) -> f64 {
        session.workouts.total_volume()
    }

    /// Volume summed over every session
    pub fn total_volume(&self) -> f64 {
        self.sessions.iter().map(Self::session_volume).sum()
    }

    /// Sessions per week between the oldest and newest session
    pub fn weekly_frequency(&self) -> f64 {
        if self.sessions.len() < 2 {
            return 0.0;
        }

        let (Some(first), Some(last)) = (self.sessions.first(), self.sessions.last()) else {
            return 0.0;
        };
        let days = (last.date - first.date).num_seconds() as f64 / 86_400.0;

        if days <= 0.0 {
            return 0.0;
        }

        (self.sessions.len() as f64 / days) * 7.0
    }

    /// (date, volume) per session, for the volume chart
    pub fn volume_series(&self) -> Vec<(DateTime<Utc>, f64)> {
        self.sessions
            .iter()
            .map(|s| (s.date, Self::session_volume(s)))
            .collect()
    }

    /// (date, best weight) for every session containing the exercise
    pub fn exercise_series(&self, name: &str) -> Vec<(DateTime<Utc>, f64)> {
        let key = record_key(name);
        self.sessions
            .iter()
            .filter_map(|session| {
                session
                    .workouts
                    .exercises()
                    .filter(|(_, _, ex)| !ex.is_deleted && record_key(&ex.name) == key)
                    .flat_map(|(_, _, ex)| ex.series.iter())
                    .map(|s| parse_number(&s.weight))
                    .fold(None, |best: Option<f64>, w| Some(best.map_or(w, |b| b.max(w))))
                    .map(|best| (session.date, best))
            })
            .collect()
    }

    pub fn personal_bests(&self) -> BTreeMap<String, PersonalBest> {
        personal_bests(&self.sessions)
    }

    /// Weight trend for an exercise, needs at least 3 sessions
    pub fn progression(&self, name: &str) -> Option<Progression> {
        Progression::fit(&self.exercise_series(name))
    }

    /// Exercise present in the most sessions
    pub fn most_trained(&self) -> Option<(String, usize)> {
        let mut counts: HashMap<String, (String, usize)> = HashMap::new();
        for session in &self.sessions {
            let mut seen: Vec<String> = Vec::new();
            for (_, _, ex) in session.workouts.exercises() {
                let key = record_key(&ex.name);
                if ex.is_deleted || seen.contains(&key) {
                    continue;
                }
                counts.entry(key.clone()).or_insert_with(|| (ex.name.clone(), 0)).1 += 1;
                seen.push(key);
            }
        }

        counts
            .into_values()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
    }

    pub fn summary(&self) -> Summary {
        let sessions = self.sessions.len();
        let total_volume = self.total_volume();
        let average_volume = if sessions > 0 {
            total_volume / sessions as f64
        } else {
            0.0
        };

        Summary {
            sessions,
            total_volume,
            average_volume,
            weekly_frequency: self.weekly_frequency(),
            most_trained: self.most_trained(),
        }
    }
}
