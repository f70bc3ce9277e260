//! carnet - Workout program notebook
//!
//! Days hold categories, categories hold exercises, exercises hold series.
//! Every edit is undoable, autosaved after a quiet period, and a finished
//! workout is appended to the log that feeds stats and personal bests.

pub mod ai;
pub mod backup;
pub mod config;
pub mod db;
pub mod history;
pub mod model;
pub mod ops;
pub mod sanitize;
pub mod seed;
pub mod stats;
pub mod sync;
pub mod timer;
pub mod tui;
pub mod workbook;

pub use db::Database;
pub use model::WorkoutState;
pub use workbook::Workbook;
