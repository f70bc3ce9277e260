//! carnet - Workout program notebook

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::sync::{Mutex, mpsc};

use carnet::ai::AiClient;
use carnet::backup;
use carnet::config::Settings;
use carnet::db::Database;
use carnet::model::WorkoutState;
use carnet::ops::{ExerciseEdit, NewExercise};
use carnet::stats::{Analytics, Filters};
use carnet::sync::{Notice, SaveGateway, complete_workout, follow_remote, open_workbook};
use carnet::timer::{RestTimer, TimerEvent};
use carnet::tui::App;

#[derive(Parser)]
#[command(name = "carnet")]
#[command(author, version, about = "Carnet d'entraînement - programme, séances et records")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open TUI dashboard
    Tui,

    /// Add an exercise (the category is created if needed)
    Add {
        day: String,
        category: String,
        name: String,

        /// Weight per series (kg)
        #[arg(short, long, default_value = "0")]
        weight: String,

        /// Reps per series
        #[arg(short, long, default_value = "0")]
        reps: String,

        /// Number of series
        #[arg(short, long, default_value = "1")]
        sets: String,
    },

    /// Edit an exercise; omitted fields are kept
    Edit {
        day: String,
        category: String,
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        weight: Option<String>,

        #[arg(short, long)]
        reps: Option<String>,

        /// Rebuild with this many series
        #[arg(short, long)]
        sets: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Soft-delete an exercise
    Delete { day: String, category: String, id: String },

    /// Reactivate a soft-deleted exercise
    Restore { id: String },

    /// Remove an exercise for good
    Purge { day: String, category: String, id: String },

    /// Manage days
    Day {
        #[command(subcommand)]
        action: DayAction,
    },

    /// Manage categories
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Print the program
    Show {
        /// Name contains (case-insensitive)
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        day: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// Only exercises with reps logged
        #[arg(long)]
        completed: bool,

        /// Include soft-deleted exercises
        #[arg(long)]
        deleted: bool,
    },

    /// Log the current program as a finished workout
    Complete,

    /// List past workouts
    History,

    /// Delete a past workout
    Forget { id: String },

    /// Show workout statistics
    Stats {
        /// Weight trend for one exercise
        exercise: Option<String>,
    },

    /// Show personal bests
    Records,

    /// Write a JSON backup
    Export {
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },

    /// Replace the program with a JSON backup
    Import { path: PathBuf },

    /// Ask the AI coach for exercise ideas
    Suggest,

    /// Ask the AI coach for a progression report
    Analyze,

    /// Run the rest timer
    Timer {
        /// Seconds (defaults to --rest-secs)
        secs: Option<u32>,
    },
}

#[derive(Subcommand)]
enum DayAction {
    Add { name: String },
    Rename { old: String, new: String },
    Delete { name: String },
}

#[derive(Subcommand)]
enum CategoryAction {
    Add { day: String, name: String },
    Delete { day: String, name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let settings = cli.settings;

    let mut db = Database::open(&settings.db_path)?;
    let user_id = db.sign_in_anonymously()?;
    let mut book = open_workbook(&db, &user_id)?;

    let remote = if matches!(cli.command, None | Some(Commands::Tui)) {
        Some(db.subscribe(&user_id)?)
    } else {
        None
    };
    let db = Arc::new(Mutex::new(db));
    let (gateway, mut notices) = SaveGateway::spawn(db.clone(), settings.save_delay());

    let message = match cli.command {
        None | Some(Commands::Tui) => {
            let workbook = Arc::new(Mutex::new(book));
            if let Some(rx) = remote {
                tokio::spawn(follow_remote(rx, workbook.clone()));
            }
            let mut app = App::new(workbook, db, gateway, notices, user_id, settings.rest_secs);
            return app.run().await;
        }

        Some(Commands::Add { day, category, name, weight, reps, sets }) => {
            let input = NewExercise { name, weight, reps, sets };
            book.add_exercise(&day, &category, &input)?
        }

        Some(Commands::Edit { day, category, id, name, weight, reps, sets, notes }) => {
            let edit = ExerciseEdit {
                name: name.unwrap_or_default(),
                weight: weight.unwrap_or_default(),
                reps: reps.unwrap_or_default(),
                sets: sets.unwrap_or_default(),
                notes,
            };
            book.edit_exercise(&day, &category, &id, &edit)?
        }

        Some(Commands::Delete { day, category, id }) => book.delete_exercise(&day, &category, &id)?,
        Some(Commands::Restore { id }) => book.reactivate_exercise(&id)?,
        Some(Commands::Purge { day, category, id }) => book.purge_exercise(&day, &category, &id)?,

        Some(Commands::Day { action }) => match action {
            DayAction::Add { name } => book.add_day(&name)?,
            DayAction::Rename { old, new } => book.rename_day(&old, &new)?,
            DayAction::Delete { name } => book.delete_day(&name)?,
        },

        Some(Commands::Category { action }) => match action {
            CategoryAction::Add { day, name } => book.add_category(&day, &name)?,
            CategoryAction::Delete { day, name } => book.delete_category(&day, &name)?,
        },

        Some(Commands::Import { path }) => {
            let state = backup::import_from(&path)?;
            book.import(state)
        }

        Some(Commands::Show { search, day, category, completed, deleted }) => {
            *book.filters_mut() = Filters {
                search: search.unwrap_or_default(),
                day,
                category,
                completed_only: completed,
                show_deleted: deleted,
            };
            print_program(&book.visible());
            return Ok(());
        }

        Some(Commands::Complete) => {
            let session = complete_workout(&db, &user_id, book.state()).await?;
            println!(
                "Séance enregistrée : {} ({:.0} kg de volume)",
                session.id, session.total_volume
            );
            return Ok(());
        }

        Some(Commands::History) => {
            let sessions = db.lock().await.recent_history(&user_id, settings.history_limit)?;
            println!("Séances récentes :");
            println!("{:-<60}", "");
            for s in &sessions {
                println!(
                    "{} | {:>10.0} kg | {}",
                    s.date.format("%Y-%m-%d %H:%M"),
                    s.total_volume,
                    s.id
                );
            }
            return Ok(());
        }

        Some(Commands::Forget { id }) => {
            if !db.lock().await.delete_history(&user_id, &id)? {
                bail!("Séance introuvable : {}", id);
            }
            println!("Séance supprimée");
            return Ok(());
        }

        Some(Commands::Stats { exercise }) => {
            let sessions = db.lock().await.recent_history(&user_id, settings.history_limit)?;
            let analytics = Analytics::new(sessions);
            let summary = analytics.summary();

            println!("Statistiques");
            println!("{:-<40}", "");
            println!("Séances : {}", summary.sessions);
            println!("Volume total : {:.0} kg", summary.total_volume);
            println!("Volume moyen : {:.0} kg", summary.average_volume);
            println!("Fréquence : {:.1} séances/semaine", summary.weekly_frequency);
            if let Some((name, count)) = summary.most_trained {
                println!("Exercice le plus fréquent : {} ({} séances)", name, count);
            }

            if let Some(ex) = exercise {
                println!();
                match analytics.progression(&ex) {
                    Some(trend) => println!("{}\n{}", ex, trend.format()),
                    None => println!("{} : pas assez de données pour une tendance", ex),
                }
            }
            return Ok(());
        }

        Some(Commands::Records) => {
            let sessions = db.lock().await.recent_history(&user_id, settings.history_limit)?;
            let bests = Analytics::new(sessions).personal_bests();
            if bests.is_empty() {
                println!("Aucun record pour l'instant");
            }
            for pb in bests.values() {
                println!(
                    "{:24} | {:>6} kg | {:>4} reps | {:>7.0} kg vol | {}",
                    pb.name,
                    pb.max_weight.value,
                    pb.max_reps.value,
                    pb.max_volume.value,
                    pb.last_achieved.format("%Y-%m-%d")
                );
            }
            return Ok(());
        }

        Some(Commands::Export { dir }) => {
            let path = backup::export_to(&dir, book.state(), Utc::now())?;
            println!("Exporté : {}", path.display());
            return Ok(());
        }

        Some(Commands::Suggest) => {
            let history = db.lock().await.recent_history(&user_id, settings.history_limit)?;
            let client = AiClient::new(settings.ai_config());
            for (i, idea) in client.suggest(book.state(), &history).await?.iter().enumerate() {
                println!("{}. {}", i + 1, idea);
            }
            return Ok(());
        }

        Some(Commands::Analyze) => {
            let history = db.lock().await.recent_history(&user_id, settings.history_limit)?;
            let client = AiClient::new(settings.ai_config());
            println!("{}", client.analyze(&history).await?);
            return Ok(());
        }

        Some(Commands::Timer { secs }) => {
            run_timer(secs, settings.rest_secs).await?;
            return Ok(());
        }
    };

    persist(&gateway, &mut notices, &user_id, book.state()).await?;
    println!("{}", message);
    Ok(())
}

/// Write the edited program now; a failed write is an error for one-shot commands
async fn persist(
    gateway: &SaveGateway,
    notices: &mut mpsc::UnboundedReceiver<Notice>,
    user_id: &str,
    state: &WorkoutState,
) -> Result<()> {
    gateway.save(user_id, state, None);
    gateway.flush().await;
    while let Ok(notice) = notices.try_recv() {
        if let Notice::Error(message) = notice {
            bail!(message);
        }
    }
    Ok(())
}

fn print_program(state: &WorkoutState) {
    for (day, entry) in state.ordered() {
        println!("{}", day);
        for (category, exercises) in entry.ordered() {
            println!("  {}", category);
            for ex in exercises {
                let series: Vec<String> = ex
                    .series
                    .iter()
                    .map(|s| format!("{}×{}", s.weight, s.reps))
                    .collect();
                println!(
                    "    {:24} {}  [{}]{}",
                    ex.name,
                    series.join("  "),
                    ex.id,
                    if ex.is_deleted { " (supprimé)" } else { "" }
                );
                if !ex.notes.is_empty() {
                    println!("      {}", ex.notes);
                }
            }
        }
    }
}

async fn run_timer(secs: Option<u32>, default_secs: u32) -> Result<()> {
    let mut timer = RestTimer::new(default_secs);
    timer.start(secs);

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.tick().await;

    let mut out = std::io::stdout();
    while !timer.is_finished() {
        write!(out, "\rRepos {}", timer.display())?;
        out.flush()?;
        if timer.remaining() == 0 {
            break;
        }
        interval.tick().await;
        if timer.tick() == Some(TimerEvent::Finished) {
            writeln!(out, "\rRepos terminé !\x07")?;
        }
    }
    Ok(())
}
