//! Built-in starting program - programme de départ

use chrono::{DateTime, TimeZone, Utc};

use crate::model::{DayEntry, Exercise, Series, WorkoutState};

/// Day every fresh program starts with
pub const SEED_DAY: &str = "Lundi";

struct SeedExercise {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    sets: usize,
    weight: &'static str,
    reps: &'static str,
}

const SEED_CATEGORIES: &[&str] = &["Pectoraux", "Triceps", "Jambes"];

const SEED_EXERCISES: &[SeedExercise] = &[
    SeedExercise {
        id: "seed-developpe-couche",
        name: "Développé couché",
        category: "Pectoraux",
        sets: 4,
        weight: "60",
        reps: "10",
    },
    SeedExercise {
        id: "seed-dips",
        name: "Dips",
        category: "Triceps",
        sets: 3,
        weight: "0",
        reps: "12",
    },
];

/// Fixed creation date so the seed is identical on every call
fn seed_created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Program used when nothing valid was loaded
pub fn seed_state() -> WorkoutState {
    let created_at = seed_created_at();
    let mut day = DayEntry::default();

    for category in SEED_CATEGORIES {
        day.categories.insert(category.to_string(), Vec::new());
        day.category_order.push(category.to_string());
    }

    for seed in SEED_EXERCISES {
        let exercise = Exercise {
            id: seed.id.to_string(),
            name: seed.name.to_string(),
            series: vec![Series::new(seed.weight, seed.reps); seed.sets],
            is_deleted: false,
            deleted_at: None,
            notes: String::new(),
            created_at,
        };
        day.categories
            .entry(seed.category.to_string())
            .or_default()
            .push(exercise);
    }

    let mut state = WorkoutState::default();
    state.days.insert(SEED_DAY.to_string(), day);
    state.day_order.push(SEED_DAY.to_string());
    state
}
