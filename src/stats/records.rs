//! Personal bests recomputed from the workout log

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::model::{HistorySession, Series, parse_number};

/// One best value and the series that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub value: f64,
    pub series: Series,
    pub achieved: DateTime<Utc>,
}

impl Record {
    fn new(value: f64, series: &Series, achieved: DateTime<Utc>) -> Self {
        Self {
            value,
            series: series.clone(),
            achieved,
        }
    }

    /// Strictly better only: the first session to reach a value keeps it
    fn improve(&mut self, value: f64, series: &Series, achieved: DateTime<Utc>) -> bool {
        if value > self.value {
            *self = Self::new(value, series, achieved);
            true
        } else {
            false
        }
    }
}

/// Best single-series weight, reps and volume for an exercise
#[derive(Debug, Clone, PartialEq)]
pub struct PersonalBest {
    /// Display name as first seen
    pub name: String,
    pub max_weight: Record,
    pub max_reps: Record,
    pub max_volume: Record,
    pub last_achieved: DateTime<Utc>,
}

impl PersonalBest {
    fn first(name: &str, series: &Series, date: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            max_weight: Record::new(parse_number(&series.weight), series, date),
            max_reps: Record::new(parse_number(&series.reps), series, date),
            max_volume: Record::new(series.volume(), series, date),
            last_achieved: date,
        }
    }

    fn update(&mut self, series: &Series, date: DateTime<Utc>) {
        let improved = [
            self.max_weight.improve(parse_number(&series.weight), series, date),
            self.max_reps.improve(parse_number(&series.reps), series, date),
            self.max_volume.improve(series.volume(), series, date),
        ];
        if improved.contains(&true) {
            self.last_achieved = date;
        }
    }
}

/// Key used to merge exercises across sessions
pub fn record_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Personal bests per exercise. Sessions are visited oldest first.
pub fn personal_bests(sessions: &[HistorySession]) -> BTreeMap<String, PersonalBest> {
    let mut ordered: Vec<&HistorySession> = sessions.iter().collect();
    ordered.sort_by_key(|s| s.date);

    let mut bests: BTreeMap<String, PersonalBest> = BTreeMap::new();
    for session in ordered {
        for (_, _, exercise) in session.workouts.exercises() {
            if exercise.is_deleted {
                continue;
            }
            let key = record_key(&exercise.name);
            for series in &exercise.series {
                match bests.get_mut(&key) {
                    Some(best) => best.update(series, session.date),
                    None => {
                        bests.insert(key.clone(), PersonalBest::first(&exercise.name, series, session.date));
                    }
                }
            }
        }
    }
    bests
}
