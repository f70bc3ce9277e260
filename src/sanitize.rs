//! Normalizes untrusted JSON (remote documents, backup files) into a valid program.
//!
//! This is the only way data from outside enters the live state. It never
//! fails: anything unusable is dropped, anything missing gets a default, and
//! an empty result falls back to the seed program.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::model::{DayEntry, Exercise, Series, WorkoutState, new_id};
use crate::seed::seed_state;

/// Name given to exercises stored without one
pub const UNNAMED_EXERCISE: &str = "Exercice sans nom";

/// Rebuild a `WorkoutState` from arbitrary JSON
pub fn sanitize(raw: &Value) -> WorkoutState {
    sanitize_at(raw, Utc::now())
}

/// Same as [`sanitize`] with an explicit clock for missing timestamps
pub fn sanitize_at(raw: &Value, now: DateTime<Utc>) -> WorkoutState {
    let Some(object) = raw.as_object() else {
        debug!("sanitize: input is not an object, using seed");
        return seed_state();
    };

    // Current shape: {days, dayOrder, lastUpdated}. Legacy shape: bare day map.
    let (day_map, raw_order, last_updated) = match object.get("days").and_then(Value::as_object) {
        Some(days) => (
            days,
            object.get("dayOrder"),
            object.get("lastUpdated").and_then(parse_timestamp),
        ),
        None => (object, None, None),
    };

    let mut days = BTreeMap::new();
    for (name, value) in day_map {
        if let Some(day) = sanitize_day(value, now) {
            days.insert(name.clone(), day);
        }
    }

    if days.is_empty() {
        debug!("sanitize: no usable days, using seed");
        return seed_state();
    }

    let day_order = reconcile_order(raw_order, &days);
    WorkoutState {
        days,
        day_order,
        last_updated,
    }
}

fn sanitize_day(value: &Value, now: DateTime<Utc>) -> Option<DayEntry> {
    let raw_categories = value.get("categories")?.as_object()?;

    let mut categories = BTreeMap::new();
    for (name, list) in raw_categories {
        let Some(items) = list.as_array() else {
            continue;
        };
        let exercises = items
            .iter()
            .filter_map(Value::as_object)
            .map(|ex| sanitize_exercise(ex, now))
            .collect();
        categories.insert(name.clone(), exercises);
    }

    let category_order = reconcile_order(value.get("categoryOrder"), &categories);
    Some(DayEntry {
        categories,
        category_order,
    })
}

fn sanitize_exercise(raw: &Map<String, Value>, now: DateTime<Utc>) -> Exercise {
    let id = match raw.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => new_id(now),
    };

    let name = raw
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNNAMED_EXERCISE)
        .to_string();

    let series: Vec<Series> = match raw.get("series") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|s| Series {
                weight: numeric_string(s.get("weight")),
                reps: numeric_string(s.get("reps")),
            })
            .collect(),
        _ => vec![Series::new("0", "0")],
    };

    let is_deleted = raw.get("isDeleted").is_some_and(truthy);
    let deleted_at = if is_deleted {
        raw.get("deletedAt").and_then(parse_timestamp)
    } else {
        None
    };

    let notes = raw
        .get("notes")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let created_at = raw
        .get("createdAt")
        .and_then(parse_timestamp)
        .unwrap_or(now);

    Exercise {
        id,
        name,
        series,
        is_deleted,
        deleted_at,
        notes,
        created_at,
    }
}

/// Falsy values become "0"; numbers keep their textual form
fn numeric_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) if n.as_f64().is_some_and(|v| v != 0.0) => n.to_string(),
        _ => "0".to_string(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// RFC 3339 string or epoch milliseconds
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|d| d.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

/// Known names from the raw order first (once each), then the rest in key order
fn reconcile_order<V>(raw: Option<&Value>, map: &BTreeMap<String, V>) -> Vec<String> {
    let mut order: Vec<String> = Vec::with_capacity(map.len());

    if let Some(Value::Array(names)) = raw {
        for name in names.iter().filter_map(Value::as_str) {
            if map.contains_key(name) && !order.iter().any(|n| n == name) {
                order.push(name.to_string());
            }
        }
    }

    for key in map.keys() {
        if !order.contains(key) {
            order.push(key.clone());
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn is_valid(state: &WorkoutState) -> bool {
        !state.days.is_empty()
            && state.orders_consistent()
            && state.exercises().all(|(_, _, ex)| {
                !ex.id.is_empty() && !ex.name.is_empty()
            })
    }

    #[test]
    fn test_non_objects_give_seed() {
        for raw in [json!(null), json!([1, 2]), json!("text"), json!(42), json!(true)] {
            assert_eq!(sanitize(&raw), seed_state(), "input: {}", raw);
        }
    }

    #[test]
    fn test_empty_object_gives_seed() {
        assert_eq!(sanitize(&json!({})), seed_state());
        assert_eq!(sanitize(&json!({"days": {}})), seed_state());
    }

    #[test]
    fn test_total_on_odd_shapes() {
        let inputs = [
            json!({"Lundi": 3}),
            json!({"Lundi": {"categories": []}}),
            json!({"Lundi": {"categories": {"Dos": "x", "Bras": [1, null, {}]}}}),
            json!({"days": {"A": {"categories": {"B": [{"series": "nope"}]}}}, "dayOrder": 7}),
            json!({"days": [], "x": {"categories": {}}}),
        ];
        for raw in &inputs {
            let state = sanitize(raw);
            assert!(is_valid(&state), "input: {}", raw);
        }
    }

    #[test]
    fn test_drops_invalid_days_and_categories() {
        let raw = json!({
            "Lundi": {"categories": {"Dos": [{"id": "a", "name": "Tractions"}], "Bras": 5}},
            "Mardi": {"nope": true},
            "Mercredi": "rest"
        });
        let state = sanitize(&raw);
        assert_eq!(state.day_order, vec!["Lundi".to_string()]);
        let lundi = &state.days["Lundi"];
        assert!(lundi.categories.contains_key("Dos"));
        assert!(!lundi.categories.contains_key("Bras"));
    }

    #[test]
    fn test_exercise_defaults() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let raw = json!({"Lundi": {"categories": {"Dos": [{}]}}});
        let state = sanitize_at(&raw, now);
        let ex = &state.days["Lundi"].categories["Dos"][0];

        assert!(!ex.id.is_empty());
        assert_eq!(ex.name, UNNAMED_EXERCISE);
        assert_eq!(ex.series, vec![Series::new("0", "0")]);
        assert!(!ex.is_deleted);
        assert_eq!(ex.notes, "");
        assert_eq!(ex.created_at, now);
    }

    #[test]
    fn test_series_defaults_only_when_missing() {
        let raw = json!({"Lundi": {"categories": {"Dos": [
            {"id": "a", "series": []},
            {"id": "b", "series": {"weight": 10}},
            {"id": "c"}
        ]}}});
        let state = sanitize(&raw);
        let dos = &state.days["Lundi"].categories["Dos"];
        assert!(dos[0].series.is_empty());
        assert_eq!(dos[1].series, vec![Series::new("0", "0")]);
        assert_eq!(dos[2].series, vec![Series::new("0", "0")]);
    }

    #[test]
    fn test_series_coercion() {
        let raw = json!({"Lundi": {"categories": {"Dos": [{
            "id": 17,
            "name": "Rowing",
            "series": [
                {"weight": 80, "reps": "8"},
                {"weight": "", "reps": 0},
                {"weight": null},
                {"weight": 42.5, "reps": false}
            ],
            "isDeleted": 1,
            "deletedAt": "2025-01-02T03:04:05Z"
        }]}}});
        let ex = &sanitize(&raw).days["Lundi"].categories["Dos"][0];

        assert_eq!(ex.id, "17");
        assert_eq!(ex.series[0], Series::new("80", "8"));
        assert_eq!(ex.series[1], Series::new("0", "0"));
        assert_eq!(ex.series[2], Series::new("0", "0"));
        assert_eq!(ex.series[3], Series::new("42.5", "0"));
        assert!(ex.is_deleted);
        assert!(ex.deleted_at.is_some());
    }

    #[test]
    fn test_order_reconciled() {
        let raw = json!({
            "days": {
                "A": {"categories": {"x": [], "y": []}, "categoryOrder": ["y", "ghost", "y"]},
                "B": {"categories": {}},
                "C": {"categories": {}}
            },
            "dayOrder": ["C", "ghost", "A", "C"]
        });
        let state = sanitize(&raw);
        assert_eq!(state.day_order, vec!["C", "A", "B"]);
        assert_eq!(state.days["A"].category_order, vec!["y", "x"]);
        assert!(state.orders_consistent());
    }

    #[test]
    fn test_valid_state_survives() {
        let seed = seed_state();
        let raw = serde_json::to_value(&seed).unwrap();
        assert_eq!(sanitize(&raw), seed);
    }

    #[test]
    fn test_created_at_from_millis() {
        let raw = json!({"Lundi": {"categories": {"Dos": [{"createdAt": 1_700_000_000_000i64}]}}});
        let ex = &sanitize(&raw).days["Lundi"].categories["Dos"][0];
        assert_eq!(ex.created_at.timestamp(), 1_700_000_000);
    }
}
