//! Workout program data model

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One recorded unit of weight x reps, kept as the strings the user typed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub weight: String,
    pub reps: String,
}

impl Series {
    pub fn new(weight: &str, reps: &str) -> Self {
        Self {
            weight: weight.to_string(),
            reps: reps.to_string(),
        }
    }

    /// weight x reps, unparsable values count as 0
    pub fn volume(&self) -> f64 {
        parse_number(&self.weight) * parse_number(&self.reps)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub series: Vec<Series>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl Exercise {
    pub fn new(name: &str, series: Vec<Series>, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(now),
            name: name.to_string(),
            series,
            is_deleted: false,
            deleted_at: None,
            notes: String::new(),
            created_at: now,
        }
    }

    /// Sum of all series volumes
    pub fn volume(&self) -> f64 {
        self.series.iter().map(Series::volume).sum()
    }
}

/// A training day: named categories of exercises
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    pub categories: BTreeMap<String, Vec<Exercise>>,
    pub category_order: Vec<String>,
}

impl DayEntry {
    /// Categories in display order
    pub fn ordered(&self) -> impl Iterator<Item = (&String, &Vec<Exercise>)> {
        self.category_order
            .iter()
            .filter_map(|name| self.categories.get_key_value(name))
    }
}

/// The live, editable program
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutState {
    pub days: BTreeMap<String, DayEntry>,
    pub day_order: Vec<String>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl WorkoutState {
    /// Days in display order
    pub fn ordered(&self) -> impl Iterator<Item = (&String, &DayEntry)> {
        self.day_order
            .iter()
            .filter_map(|name| self.days.get_key_value(name))
    }

    /// All exercises in display order with their day and category
    pub fn exercises(&self) -> impl Iterator<Item = (&String, &String, &Exercise)> {
        self.ordered().flat_map(|(day, entry)| {
            entry.ordered().flat_map(move |(category, exercises)| {
                exercises.iter().map(move |ex| (day, category, ex))
            })
        })
    }

    pub fn find_exercise(&self, day: &str, category: &str, id: &str) -> Option<&Exercise> {
        self.days
            .get(day)?
            .categories
            .get(category)?
            .iter()
            .find(|e| e.id == id)
    }

    /// Total volume over non-deleted exercises
    pub fn total_volume(&self) -> f64 {
        self.exercises()
            .filter(|(_, _, ex)| !ex.is_deleted)
            .map(|(_, _, ex)| ex.volume())
            .sum()
    }

    /// Every map key appears exactly once in its order list and vice versa
    pub fn orders_consistent(&self) -> bool {
        fn same_keys<V>(map: &BTreeMap<String, V>, order: &[String]) -> bool {
            let mut sorted: Vec<&String> = order.iter().collect();
            sorted.sort();
            sorted.dedup();
            sorted.len() == order.len() && sorted.into_iter().eq(map.keys())
        }

        same_keys(&self.days, &self.day_order)
            && self
                .days
                .values()
                .all(|d| same_keys(&d.categories, &d.category_order))
    }
}

/// Completed workout, append-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySession {
    pub id: String,
    pub date: DateTime<Utc>,
    pub total_volume: f64,
    pub workouts: WorkoutState,
}

/// Lenient numeric parse: leading number of the string, 0 otherwise
pub fn parse_number(text: &str) -> f64 {
    let text = text.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (i, c) in text.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }

    if !seen_digit {
        return 0.0;
    }

    text[..end]
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Opaque exercise id: hex millis + random suffix
pub fn new_id(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..0x100000);
    format!("{:x}{:05x}", now.timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("80"), 80.0);
        assert_eq!(parse_number(" 82.5"), 82.5);
        assert_eq!(parse_number("60kg"), 60.0);
        assert_eq!(parse_number("-5"), -5.0);
        assert_eq!(parse_number("abc"), 0.0);
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("."), 0.0);
        assert_eq!(parse_number("12."), 12.0);
    }

    #[test]
    fn test_series_volume() {
        assert_eq!(Series::new("80", "8").volume(), 640.0);
        assert_eq!(Series::new("0", "10").volume(), 0.0);
        assert_eq!(Series::new("x", "10").volume(), 0.0);
    }

    #[test]
    fn test_new_ids_differ() {
        let now = Utc::now();
        let ids: std::collections::HashSet<_> = (0..50).map(|_| new_id(now)).collect();
        assert!(ids.len() > 45);
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let mut state = WorkoutState::default();
        state.days.insert("Lundi".into(), DayEntry::default());
        state.day_order.push("Lundi".into());

        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("dayOrder").is_some());
        assert!(json["days"]["Lundi"].get("categoryOrder").is_some());
        assert!(state.orders_consistent());
    }
}
