//! Program mutations.
//!
//! Every operation takes the current state by reference and returns a new
//! state plus a user-facing message. Validation and lookup failures return an
//! [`OpError`] and produce nothing, so the caller never records a no-op edit.

use chrono::{DateTime, Utc};

use crate::model::{DayEntry, Exercise, Series, WorkoutState};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OpError {
    #[error("Le nom de l'exercice est obligatoire")]
    EmptyName,
    #[error("Sélectionnez un jour")]
    NoDaySelected,
    #[error("Sélectionnez une catégorie")]
    NoCategorySelected,
    #[error("Le nom du jour est obligatoire")]
    EmptyDayName,
    #[error("Le nom de la catégorie est obligatoire")]
    EmptyCategoryName,
    #[error("Jour introuvable : {0}")]
    DayNotFound(String),
    #[error("Le jour « {0} » existe déjà")]
    DayExists(String),
    #[error("Catégorie introuvable : {0}")]
    CategoryNotFound(String),
    #[error("La catégorie « {0} » existe déjà")]
    CategoryExists(String),
    #[error("Exercice introuvable")]
    ExerciseNotFound,
}

/// Result of a successful mutation
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub state: WorkoutState,
    pub message: String,
}

impl Change {
    fn new(mut state: WorkoutState, now: DateTime<Utc>, message: String) -> Self {
        state.last_updated = Some(now);
        Self { state, message }
    }
}

/// Form input for a new exercise
#[derive(Debug, Clone, Default)]
pub struct NewExercise {
    pub name: String,
    pub weight: String,
    pub reps: String,
    pub sets: String,
}

/// Form input for editing; empty fields leave the exercise untouched
#[derive(Debug, Clone, Default)]
pub struct ExerciseEdit {
    pub name: String,
    pub weight: String,
    pub reps: String,
    pub sets: String,
    pub notes: Option<String>,
}

/// Requested set count, 1 when missing or invalid
fn set_count(sets: &str) -> usize {
    sets.trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n >= 1)
        .unwrap_or(1)
}

fn or_zero(value: &str) -> &str {
    let value = value.trim();
    if value.is_empty() { "0" } else { value }
}

fn build_series(weight: &str, reps: &str, sets: &str) -> Vec<Series> {
    vec![Series::new(or_zero(weight), or_zero(reps)); set_count(sets)]
}

fn day_mut<'a>(state: &'a mut WorkoutState, day: &str) -> Result<&'a mut DayEntry, OpError> {
    state
        .days
        .get_mut(day)
        .ok_or_else(|| OpError::DayNotFound(day.to_string()))
}

fn exercise_mut<'a>(
    state: &'a mut WorkoutState,
    day: &str,
    category: &str,
    id: &str,
) -> Result<&'a mut Exercise, OpError> {
    day_mut(state, day)?
        .categories
        .get_mut(category)
        .ok_or_else(|| OpError::CategoryNotFound(category.to_string()))?
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or(OpError::ExerciseNotFound)
}

pub fn add_exercise(
    state: &WorkoutState,
    day: &str,
    category: &str,
    input: &NewExercise,
    now: DateTime<Utc>,
) -> Result<Change, OpError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(OpError::EmptyName);
    }
    if day.trim().is_empty() {
        return Err(OpError::NoDaySelected);
    }
    if category.trim().is_empty() {
        return Err(OpError::NoCategorySelected);
    }

    let mut next = state.clone();
    let entry = day_mut(&mut next, day)?;

    // category container is created alongside the exercise
    if !entry.categories.contains_key(category) {
        entry.category_order.push(category.to_string());
    }
    let exercise = Exercise::new(
        name,
        build_series(&input.weight, &input.reps, &input.sets),
        now,
    );
    entry
        .categories
        .entry(category.to_string())
        .or_default()
        .push(exercise);

    Ok(Change::new(next, now, format!("Exercice « {} » ajouté", name)))
}

pub fn edit_exercise(
    state: &WorkoutState,
    day: &str,
    category: &str,
    id: &str,
    edit: &ExerciseEdit,
    now: DateTime<Utc>,
) -> Result<Change, OpError> {
    let mut next = state.clone();
    let exercise = exercise_mut(&mut next, day, category, id)?;

    let name = edit.name.trim();
    if !name.is_empty() {
        exercise.name = name.to_string();
    }

    // all-or-nothing on the series array
    let full_series = [&edit.weight, &edit.sets, &edit.reps]
        .iter()
        .all(|v| !v.trim().is_empty());
    if full_series {
        exercise.series = build_series(&edit.weight, &edit.reps, &edit.sets);
    }

    if let Some(notes) = &edit.notes {
        exercise.notes = notes.clone();
    }

    let message = format!("Exercice « {} » modifié", exercise.name);
    Ok(Change::new(next, now, message))
}

/// Soft delete: the exercise stays in place, flagged
pub fn delete_exercise(
    state: &WorkoutState,
    day: &str,
    category: &str,
    id: &str,
    now: DateTime<Utc>,
) -> Result<Change, OpError> {
    let mut next = state.clone();
    let exercise = exercise_mut(&mut next, day, category, id)?;
    exercise.is_deleted = true;
    exercise.deleted_at = Some(now);

    let message = format!("Exercice « {} » supprimé", exercise.name);
    Ok(Change::new(next, now, message))
}

/// Restores the first exercise with this id, searching every day and category
pub fn reactivate_exercise(
    state: &WorkoutState,
    id: &str,
    now: DateTime<Utc>,
) -> Result<Change, OpError> {
    let location = state
        .exercises()
        .find(|(_, _, ex)| ex.id == id)
        .map(|(day, category, _)| (day.clone(), category.clone()))
        .ok_or(OpError::ExerciseNotFound)?;

    let mut next = state.clone();
    let exercise = exercise_mut(&mut next, &location.0, &location.1, id)?;
    exercise.is_deleted = false;
    exercise.deleted_at = None;

    let message = format!("Exercice « {} » restauré", exercise.name);
    Ok(Change::new(next, now, message))
}

/// Hard delete: removes the exercise from its category
pub fn purge_exercise(
    state: &WorkoutState,
    day: &str,
    category: &str,
    id: &str,
    now: DateTime<Utc>,
) -> Result<Change, OpError> {
    let mut next = state.clone();
    let list = day_mut(&mut next, day)?
        .categories
        .get_mut(category)
        .ok_or_else(|| OpError::CategoryNotFound(category.to_string()))?;
    let index = list
        .iter()
        .position(|e| e.id == id)
        .ok_or(OpError::ExerciseNotFound)?;
    let removed = list.remove(index);

    Ok(Change::new(
        next,
        now,
        format!("Exercice « {} » effacé définitivement", removed.name),
    ))
}

pub fn add_day(state: &WorkoutState, name: &str, now: DateTime<Utc>) -> Result<Change, OpError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(OpError::EmptyDayName);
    }
    if state.days.contains_key(name) {
        return Err(OpError::DayExists(name.to_string()));
    }

    let mut next = state.clone();
    next.days.insert(name.to_string(), DayEntry::default());
    next.day_order.push(name.to_string());

    Ok(Change::new(next, now, format!("Jour « {} » ajouté", name)))
}

/// Moves the day to a new key, keeping its position in `day_order`
pub fn rename_day(
    state: &WorkoutState,
    old: &str,
    new: &str,
    now: DateTime<Utc>,
) -> Result<Change, OpError> {
    let new = new.trim();
    if new.is_empty() {
        return Err(OpError::EmptyDayName);
    }
    if !state.days.contains_key(old) {
        return Err(OpError::DayNotFound(old.to_string()));
    }
    if state.days.contains_key(new) {
        return Err(OpError::DayExists(new.to_string()));
    }

    let mut next = state.clone();
    if let Some(entry) = next.days.remove(old) {
        next.days.insert(new.to_string(), entry);
    }
    for name in next.day_order.iter_mut().filter(|n| n.as_str() == old) {
        *name = new.to_string();
    }

    Ok(Change::new(
        next,
        now,
        format!("Jour « {} » renommé en « {} »", old, new),
    ))
}

pub fn delete_day(state: &WorkoutState, name: &str, now: DateTime<Utc>) -> Result<Change, OpError> {
    if !state.days.contains_key(name) {
        return Err(OpError::DayNotFound(name.to_string()));
    }

    let mut next = state.clone();
    next.days.remove(name);
    next.day_order.retain(|n| n != name);

    Ok(Change::new(next, now, format!("Jour « {} » supprimé", name)))
}

pub fn add_category(
    state: &WorkoutState,
    day: &str,
    name: &str,
    now: DateTime<Utc>,
) -> Result<Change, OpError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(OpError::EmptyCategoryName);
    }

    let mut next = state.clone();
    let entry = day_mut(&mut next, day)?;
    if entry.categories.contains_key(name) {
        return Err(OpError::CategoryExists(name.to_string()));
    }
    entry.categories.insert(name.to_string(), Vec::new());
    entry.category_order.push(name.to_string());

    Ok(Change::new(next, now, format!("Catégorie « {} » ajoutée", name)))
}

/// Removes a category and every exercise in it
pub fn delete_category(
    state: &WorkoutState,
    day: &str,
    name: &str,
    now: DateTime<Utc>,
) -> Result<Change, OpError> {
    let mut next = state.clone();
    let entry = day_mut(&mut next, day)?;
    if entry.categories.remove(name).is_none() {
        return Err(OpError::CategoryNotFound(name.to_string()));
    }
    entry.category_order.retain(|n| n != name);

    Ok(Change::new(next, now, format!("Catégorie « {} » supprimée", name)))
}

/// Replaces the whole program (backup import)
pub fn replace_all(incoming: WorkoutState, now: DateTime<Utc>) -> Change {
    Change::new(incoming, now, "Programme importé".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{SEED_DAY, seed_state};

    fn squat() -> NewExercise {
        NewExercise {
            name: "Squat".into(),
            weight: "100".into(),
            reps: "5".into(),
            sets: "3".into(),
        }
    }

    fn find<'a>(state: &'a WorkoutState, category: &str, name: &str) -> &'a Exercise {
        state.days[SEED_DAY].categories[category]
            .iter()
            .find(|e| e.name == name)
            .unwrap()
    }

    #[test]
    fn test_add_exercise() {
        let seed = seed_state();
        let change = add_exercise(&seed, SEED_DAY, "Jambes", &squat(), Utc::now()).unwrap();

        let ex = find(&change.state, "Jambes", "Squat");
        assert_eq!(ex.series, vec![Series::new("100", "5"); 3]);
        assert!(!ex.is_deleted);
        assert!(change.state.last_updated.is_some());
        assert!(change.message.contains("Squat"));
        // source untouched
        assert_eq!(seed, seed_state());
    }

    #[test]
    fn test_add_exercise_validation() {
        let seed = seed_state();
        let now = Utc::now();
        let mut blank = squat();
        blank.name = "   ".into();

        assert_eq!(add_exercise(&seed, SEED_DAY, "Jambes", &blank, now), Err(OpError::EmptyName));
        assert_eq!(add_exercise(&seed, "", "Jambes", &squat(), now), Err(OpError::NoDaySelected));
        assert_eq!(add_exercise(&seed, SEED_DAY, " ", &squat(), now), Err(OpError::NoCategorySelected));
        assert_eq!(
            add_exercise(&seed, "Dimanche", "Jambes", &squat(), now),
            Err(OpError::DayNotFound("Dimanche".into()))
        );
    }

    #[test]
    fn test_add_exercise_creates_category() {
        let change = add_exercise(&seed_state(), SEED_DAY, "Dos", &squat(), Utc::now()).unwrap();
        let lundi = &change.state.days[SEED_DAY];
        assert_eq!(lundi.category_order.last().unwrap(), "Dos");
        assert_eq!(lundi.categories["Dos"].len(), 1);
        assert!(change.state.orders_consistent());
    }

    #[test]
    fn test_add_exercise_invalid_sets_defaults_to_one() {
        for sets in ["", "abc", "0", "-2"] {
            let mut input = squat();
            input.sets = sets.into();
            let change = add_exercise(&seed_state(), SEED_DAY, "Jambes", &input, Utc::now()).unwrap();
            assert_eq!(find(&change.state, "Jambes", "Squat").series.len(), 1, "sets: {:?}", sets);
        }
    }

    #[test]
    fn test_edit_exercise_partial() {
        let seed = seed_state();
        let edit = ExerciseEdit {
            name: "Développé incliné".into(),
            weight: "70".into(),
            reps: "".into(),
            sets: "5".into(),
            notes: None,
        };
        let change =
            edit_exercise(&seed, SEED_DAY, "Pectoraux", "seed-developpe-couche", &edit, Utc::now()).unwrap();
        let ex = find(&change.state, "Pectoraux", "Développé incliné");
        // reps missing: series untouched
        assert_eq!(ex.series, vec![Series::new("60", "10"); 4]);
    }

    #[test]
    fn test_edit_exercise_replaces_series() {
        let edit = ExerciseEdit {
            weight: "70".into(),
            reps: "8".into(),
            sets: "2".into(),
            notes: Some("lent".into()),
            ..Default::default()
        };
        let change =
            edit_exercise(&seed_state(), SEED_DAY, "Pectoraux", "seed-developpe-couche", &edit, Utc::now())
                .unwrap();
        let ex = find(&change.state, "Pectoraux", "Développé couché");
        assert_eq!(ex.series, vec![Series::new("70", "8"); 2]);
        assert_eq!(ex.notes, "lent");
    }

    #[test]
    fn test_edit_missing_exercise() {
        let result = edit_exercise(
            &seed_state(),
            SEED_DAY,
            "Pectoraux",
            "nope",
            &ExerciseEdit::default(),
            Utc::now(),
        );
        assert_eq!(result, Err(OpError::ExerciseNotFound));
    }

    #[test]
    fn test_soft_delete_and_reactivate_round_trip() {
        let seed = seed_state();
        let original = find(&seed, "Triceps", "Dips").clone();

        let deleted = delete_exercise(&seed, SEED_DAY, "Triceps", "seed-dips", Utc::now()).unwrap();
        let ex = find(&deleted.state, "Triceps", "Dips");
        assert!(ex.is_deleted);
        assert!(ex.deleted_at.is_some());
        assert_eq!(deleted.state.days[SEED_DAY].categories["Triceps"].len(), 1);

        let restored = reactivate_exercise(&deleted.state, "seed-dips", Utc::now()).unwrap();
        let ex = find(&restored.state, "Triceps", "Dips");
        assert_eq!(ex, &original);
        assert!(ex.deleted_at.is_none());
    }

    fn deleted_copy(id: &str, name: &str) -> Exercise {
        let mut ex = Exercise::new(name, vec![Series::new("20", "10")], Utc::now());
        ex.id = id.to_string();
        ex.is_deleted = true;
        ex.deleted_at = Some(Utc::now());
        ex
    }

    #[test]
    fn test_reactivate_searches_every_day_in_order() {
        let mut state = add_day(&seed_state(), "Mardi", Utc::now()).unwrap().state;
        let mardi = state.days.get_mut("Mardi").unwrap();
        mardi.categories.insert("Bras".into(), vec![]);
        mardi.categories.insert("Dos".into(), vec![deleted_copy("dup", "Rowing")]);
        mardi.category_order = vec!["Bras".into(), "Dos".into()];
        state
            .days
            .get_mut(SEED_DAY)
            .unwrap()
            .categories
            .get_mut("Triceps")
            .unwrap()
            .push(deleted_copy("dup", "Extension"));
        // Mardi shown first, although Lundi sorts first in the map
        state.day_order = vec!["Mardi".into(), SEED_DAY.into()];

        let restored = reactivate_exercise(&state, "dup", Utc::now()).unwrap().state;
        let rowing = restored.find_exercise("Mardi", "Dos", "dup").unwrap();
        assert!(!rowing.is_deleted);
        assert!(rowing.deleted_at.is_none());
        let extension = restored.find_exercise(SEED_DAY, "Triceps", "dup").unwrap();
        assert!(extension.is_deleted);

        state.day_order = vec![SEED_DAY.into(), "Mardi".into()];
        let restored = reactivate_exercise(&state, "dup", Utc::now()).unwrap().state;
        assert!(!restored.find_exercise(SEED_DAY, "Triceps", "dup").unwrap().is_deleted);
        assert!(restored.find_exercise("Mardi", "Dos", "dup").unwrap().is_deleted);
    }

    #[test]
    fn test_delete_and_reactivate_missing() {
        let seed = seed_state();
        assert_eq!(
            delete_exercise(&seed, SEED_DAY, "Triceps", "nope", Utc::now()),
            Err(OpError::ExerciseNotFound)
        );
        assert_eq!(reactivate_exercise(&seed, "nope", Utc::now()), Err(OpError::ExerciseNotFound));
    }

    #[test]
    fn test_purge_exercise() {
        let change = purge_exercise(&seed_state(), SEED_DAY, "Triceps", "seed-dips", Utc::now()).unwrap();
        assert!(change.state.days[SEED_DAY].categories["Triceps"].is_empty());
    }

    #[test]
    fn test_add_day() {
        let change = add_day(&seed_state(), " Mardi ", Utc::now()).unwrap();
        assert_eq!(change.state.day_order, vec!["Lundi", "Mardi"]);
        assert!(change.state.days["Mardi"].categories.is_empty());

        assert_eq!(
            add_day(&change.state, "Mardi", Utc::now()),
            Err(OpError::DayExists("Mardi".into()))
        );
        assert_eq!(add_day(&change.state, "", Utc::now()), Err(OpError::EmptyDayName));
    }

    #[test]
    fn test_rename_day_keeps_position() {
        let two = add_day(&seed_state(), "Mardi", Utc::now()).unwrap().state;
        let change = rename_day(&two, "Lundi", "Jour 1", Utc::now()).unwrap();

        assert_eq!(change.state.day_order, vec!["Jour 1", "Mardi"]);
        assert!(!change.state.days.contains_key("Lundi"));
        assert_eq!(change.state.days["Jour 1"], two.days["Lundi"]);
    }

    #[test]
    fn test_rename_day_errors() {
        let two = add_day(&seed_state(), "Mardi", Utc::now()).unwrap().state;
        assert_eq!(
            rename_day(&two, "Jeudi", "X", Utc::now()),
            Err(OpError::DayNotFound("Jeudi".into()))
        );
        assert_eq!(
            rename_day(&two, "Lundi", "Mardi", Utc::now()),
            Err(OpError::DayExists("Mardi".into()))
        );
    }

    #[test]
    fn test_delete_day() {
        let change = delete_day(&seed_state(), SEED_DAY, Utc::now()).unwrap();
        assert!(change.state.days.is_empty());
        assert!(change.state.day_order.is_empty());
        assert_eq!(
            delete_day(&change.state, SEED_DAY, Utc::now()),
            Err(OpError::DayNotFound(SEED_DAY.into()))
        );
    }

    #[test]
    fn test_categories() {
        let change = add_category(&seed_state(), SEED_DAY, "Dos", Utc::now()).unwrap();
        assert!(change.state.orders_consistent());
        assert_eq!(
            add_category(&change.state, SEED_DAY, "Dos", Utc::now()),
            Err(OpError::CategoryExists("Dos".into()))
        );

        let removed = delete_category(&change.state, SEED_DAY, "Pectoraux", Utc::now()).unwrap();
        assert!(!removed.state.days[SEED_DAY].categories.contains_key("Pectoraux"));
        assert!(removed.state.orders_consistent());
    }
}
