//! Modal input forms: new exercise, edit exercise, import

use crossterm::event::KeyCode;
use ratatui::prelude::*;

use crate::model::Exercise;
use crate::ops::{ExerciseEdit, NewExercise};

/// What a submitted form does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormKind {
    NewExercise,
    EditExercise { day: String, category: String, id: String },
    Import,
}

/// Result of one key press inside a form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Continue,
    Cancel,
    Submit,
}

#[derive(Debug, Clone)]
pub struct Form {
    kind: FormKind,
    labels: Vec<&'static str>,
    values: Vec<String>,
    focused: usize,
}

impl Form {
    /// Day and category come prefilled from the selected line; focus starts on the name
    pub fn new_exercise(day: &str, category: &str) -> Self {
        Self {
            kind: FormKind::NewExercise,
            labels: vec!["Jour", "Catégorie", "Nom", "Poids (kg)", "Reps", "Séries"],
            values: vec![
                day.to_string(),
                category.to_string(),
                String::new(),
                String::new(),
                String::new(),
                "1".to_string(),
            ],
            focused: 2,
        }
    }

    /// Series fields start empty: left empty, the series are kept as they are
    pub fn edit_exercise(day: &str, category: &str, exercise: &Exercise) -> Self {
        Self {
            kind: FormKind::EditExercise {
                day: day.to_string(),
                category: category.to_string(),
                id: exercise.id.clone(),
            },
            labels: vec!["Nom", "Poids (kg)", "Reps", "Séries", "Notes"],
            values: vec![
                exercise.name.clone(),
                String::new(),
                String::new(),
                String::new(),
                exercise.notes.clone(),
            ],
            focused: 0,
        }
    }

    pub fn import() -> Self {
        Self {
            kind: FormKind::Import,
            labels: vec!["Fichier"],
            values: vec![String::new()],
            focused: 0,
        }
    }

    pub fn kind(&self) -> &FormKind {
        &self.kind
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            FormKind::NewExercise => "Nouvel exercice",
            FormKind::EditExercise { .. } => "Modifier l'exercice",
            FormKind::Import => "Importer une sauvegarde",
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> FormAction {
        let count = self.values.len();
        match code {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Enter if self.focused + 1 == count => return FormAction::Submit,
            KeyCode::Enter | KeyCode::Tab | KeyCode::Down => self.focused = (self.focused + 1) % count,
            KeyCode::BackTab | KeyCode::Up => self.focused = (self.focused + count - 1) % count,
            KeyCode::Backspace => {
                self.values[self.focused].pop();
            }
            KeyCode::Char(c) => self.values[self.focused].push(c),
            _ => {}
        }
        FormAction::Continue
    }

    fn value(&self, index: usize) -> String {
        self.values.get(index).cloned().unwrap_or_default()
    }

    /// (day, category, input) of a new-exercise form
    pub fn new_exercise_input(&self) -> (String, String, NewExercise) {
        (
            self.value(0),
            self.value(1),
            NewExercise {
                name: self.value(2),
                weight: self.value(3),
                reps: self.value(4),
                sets: self.value(5),
            },
        )
    }

    pub fn exercise_edit(&self) -> ExerciseEdit {
        ExerciseEdit {
            name: self.value(0),
            weight: self.value(1),
            reps: self.value(2),
            sets: self.value(3),
            notes: Some(self.value(4)),
        }
    }

    pub fn path(&self) -> String {
        self.value(0).trim().to_string()
    }

    /// One line per field, the focused one highlighted
    pub fn lines(&self) -> Vec<Line<'static>> {
        self.labels
            .iter()
            .zip(&self.values)
            .enumerate()
            .map(|(i, (label, value))| {
                let text = format!("{:>12} : {}", label, value);
                if i == self.focused {
                    Line::from(Span::styled(format!("{}_", text), Style::default().reversed()))
                } else {
                    Line::from(text)
                }
            })
            .collect()
    }
}

/// Rect centered in `r`, sized in percent
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
