//! TUI module - Terminal dashboard with ratatui

mod form;

use std::io::{Stdout, stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    style::Print,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
};
use tokio::sync::{Mutex, mpsc};
use tracing::error;

use crate::backup;
use crate::db::Database;
use crate::model::WorkoutState;
use crate::sync::{Notice, SaveGateway, complete_workout};
use crate::timer::{RestTimer, TimerEvent, TimerState};
use crate::workbook::Workbook;

use form::{Form, FormAction, FormKind, centered_rect};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// One visible exercise line
struct ExerciseLine {
    day: String,
    category: String,
    id: String,
    name: String,
    series: String,
    deleted: bool,
}

fn lines_of(view: &WorkoutState) -> Vec<ExerciseLine> {
    view.exercises()
        .map(|(day, category, ex)| ExerciseLine {
            day: day.clone(),
            category: category.clone(),
            id: ex.id.clone(),
            name: ex.name.clone(),
            series: ex
                .series
                .iter()
                .map(|s| format!("{}×{}", s.weight, s.reps))
                .collect::<Vec<_>>()
                .join("  "),
            deleted: ex.is_deleted,
        })
        .collect()
}

/// App state for TUI
pub struct App {
    workbook: Arc<Mutex<Workbook>>,
    db: Arc<Mutex<Database>>,
    gateway: SaveGateway,
    notices: mpsc::UnboundedReceiver<Notice>,
    user_id: String,
    timer: RestTimer,
    last_tick: Instant,
    table: TableState,
    status: Option<Notice>,
    form: Option<Form>,
    export_dir: PathBuf,
    should_quit: bool,
}

impl App {
    pub fn new(
        workbook: Arc<Mutex<Workbook>>,
        db: Arc<Mutex<Database>>,
        gateway: SaveGateway,
        notices: mpsc::UnboundedReceiver<Notice>,
        user_id: String,
        rest_secs: u32,
    ) -> Self {
        Self {
            workbook,
            db,
            gateway,
            notices,
            user_id,
            timer: RestTimer::new(rest_secs),
            last_tick: Instant::now(),
            table: TableState::default().with_selected(Some(0)),
            status: None,
            form: None,
            export_dir: PathBuf::from("."),
            should_quit: false,
        }
    }

    /// Run the TUI application
    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        let result = self.event_loop(&mut terminal).await;

        restore_terminal()?;
        self.gateway.flush().await;
        result
    }

    async fn event_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        while !self.should_quit {
            let (lines, undo, redo, show_deleted) = {
                let book = self.workbook.lock().await;
                (
                    lines_of(&book.visible()),
                    book.timeline().undo_len(),
                    book.timeline().redo_len(),
                    book.filters().show_deleted,
                )
            };
            if let Some(selected) = self.table.selected()
                && selected >= lines.len()
            {
                self.table.select(lines.len().checked_sub(1));
            }

            terminal.draw(|frame| self.render(frame, &lines, undo, redo, show_deleted))?;

            while let Ok(notice) = self.notices.try_recv() {
                self.status = Some(notice);
            }
            self.tick_timer()?;
            self.handle_events(&lines).await?;
        }
        Ok(())
    }

    fn tick_timer(&mut self) -> Result<()> {
        if self.timer.state() != TimerState::Running {
            self.last_tick = Instant::now();
            return Ok(());
        }
        while self.last_tick.elapsed() >= Duration::from_secs(1) {
            self.last_tick += Duration::from_secs(1);
            if self.timer.tick() == Some(TimerEvent::Finished) {
                self.status = Some(Notice::Info("Repos terminé !".to_string()));
                // best-effort bell
                let _ = stdout().execute(Print("\x07"));
            }
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame, lines: &[ExerciseLine], undo: usize, redo: usize, show_deleted: bool) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(area);

        // Header
        let header = Paragraph::new(format!(
            "carnet - Programme   (annuler: {}  rétablir: {}{})",
            undo,
            redo,
            if show_deleted { "  supprimés visibles" } else { "" }
        ))
        .style(Style::default().fg(Color::Cyan).bold())
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        // Exercise table
        let rows: Vec<Row> = lines
            .iter()
            .map(|l| {
                let style = if l.deleted {
                    Style::default().fg(Color::DarkGray).crossed_out()
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(l.day.clone()),
                    Cell::from(l.category.clone()),
                    Cell::from(l.name.clone()),
                    Cell::from(l.series.clone()),
                ])
                .style(style)
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(12),
                Constraint::Length(14),
                Constraint::Length(24),
                Constraint::Min(20),
            ],
        )
        .header(Row::new(vec!["Jour", "Catégorie", "Exercice", "Séries (kg×reps)"]).style(Style::default().bold()))
        .row_highlight_style(Style::default().reversed())
        .block(Block::default().borders(Borders::ALL).title("Exercices"));

        frame.render_stateful_widget(table, chunks[1], &mut self.table);

        // Status + timer
        let (text, color) = match &self.status {
            Some(Notice::Info(m)) => (m.clone(), Color::Green),
            Some(Notice::Error(m)) => (m.clone(), Color::Red),
            None => (String::new(), Color::Reset),
        };
        let timer_color = if self.timer.is_finished() { Color::Yellow } else { Color::Reset };
        let status = Paragraph::new(Line::from(vec![
            Span::styled(format!("Repos {} ", self.timer.display()), Style::default().fg(timer_color).bold()),
            Span::styled(text, Style::default().fg(color)),
        ]))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(status, chunks[2]);

        // Footer
        let footer = Paragraph::new(
            "q: quitter | n/m: nouveau/modifier | i: importer | u/r: annuler/rétablir | s: sauver | e: exporter | x/a: suppr/restaurer | h: supprimés | t/0: minuteur | c: terminer",
        )
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[3]);

        if let Some(form) = &self.form {
            let popup = centered_rect(60, 50, area);
            let body = Paragraph::new(form.lines()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(form.title())
                    .title_bottom("Tab: champ suivant | Entrée: valider | Échap: annuler"),
            );
            frame.render_widget(Clear, popup);
            frame.render_widget(body, popup);
        }
    }

    async fn handle_events(&mut self, lines: &[ExerciseLine]) -> Result<()> {
        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            if let Some(form) = self.form.as_mut() {
                match form.handle_key(key.code) {
                    FormAction::Continue => {}
                    FormAction::Cancel => self.form = None,
                    FormAction::Submit => {
                        if let Some(form) = self.form.take() {
                            self.submit_form(form).await;
                        }
                    }
                }
                return Ok(());
            }

            match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Down | KeyCode::Char('j') => self.table.select_next(),
                KeyCode::Up | KeyCode::Char('k') => self.table.select_previous(),
                KeyCode::Char('u') => {
                    let result = self.workbook.lock().await.undo().map(str::to_string);
                    self.after_edit(result.map_err(|e| e.to_string())).await;
                }
                KeyCode::Char('r') => {
                    let result = self.workbook.lock().await.redo().map(str::to_string);
                    self.after_edit(result.map_err(|e| e.to_string())).await;
                }
                KeyCode::Char('n') => {
                    let (day, category) = match self.selected(lines) {
                        Some(line) => (line.day.clone(), line.category.clone()),
                        None => {
                            let book = self.workbook.lock().await;
                            let day = book.state().day_order.first().cloned().unwrap_or_default();
                            let category = book
                                .state()
                                .days
                                .get(&day)
                                .and_then(|d| d.category_order.first().cloned())
                                .unwrap_or_default();
                            (day, category)
                        }
                    };
                    self.form = Some(Form::new_exercise(&day, &category));
                }
                KeyCode::Char('m') => {
                    if let Some(line) = self.selected(lines) {
                        let book = self.workbook.lock().await;
                        if let Some(ex) = book.state().find_exercise(&line.day, &line.category, &line.id) {
                            self.form = Some(Form::edit_exercise(&line.day, &line.category, ex));
                        }
                    }
                }
                KeyCode::Char('i') => self.form = Some(Form::import()),
                KeyCode::Char('x') => {
                    if let Some(line) = self.selected(lines) {
                        let result = self
                            .workbook
                            .lock()
                            .await
                            .delete_exercise(&line.day, &line.category, &line.id);
                        self.after_edit(result.map_err(|e| e.to_string())).await;
                    }
                }
                KeyCode::Char('a') => {
                    if let Some(line) = self.selected(lines) {
                        let result = self.workbook.lock().await.reactivate_exercise(&line.id);
                        self.after_edit(result.map_err(|e| e.to_string())).await;
                    }
                }
                KeyCode::Char('h') => {
                    let mut book = self.workbook.lock().await;
                    let filters = book.filters_mut();
                    filters.show_deleted = !filters.show_deleted;
                }
                KeyCode::Char('s') => {
                    let state = self.workbook.lock().await.state().clone();
                    self.gateway.save(&self.user_id, &state, Some("Programme sauvegardé"));
                    self.gateway.flush().await;
                }
                KeyCode::Char('e') => {
                    let state = self.workbook.lock().await.state().clone();
                    self.status = Some(match backup::export_to(&self.export_dir, &state, Utc::now()) {
                        Ok(path) => Notice::Info(format!("Exporté : {}", path.display())),
                        Err(e) => {
                            error!("Export failed: {}", e);
                            Notice::Error(e.to_string())
                        }
                    });
                }
                KeyCode::Char('c') => {
                    let state = self.workbook.lock().await.state().clone();
                    self.status = Some(match complete_workout(&self.db, &self.user_id, &state).await {
                        Ok(session) => Notice::Info(format!(
                            "Séance enregistrée : {:.0} kg de volume",
                            session.total_volume
                        )),
                        Err(e) => {
                            error!("Failed to complete workout: {:#}", e);
                            Notice::Error("Erreur lors de l'enregistrement de la séance".to_string())
                        }
                    });
                }
                KeyCode::Char('t') => self.timer.toggle(),
                KeyCode::Char('0') => self.timer.reset(),
                _ => {}
            }
        }
        Ok(())
    }

    /// Runs the form's operation through the workbook, so it lands on the undo stack
    async fn submit_form(&mut self, form: Form) {
        let result = match form.kind() {
            FormKind::NewExercise => {
                let (day, category, input) = form.new_exercise_input();
                self.workbook
                    .lock()
                    .await
                    .add_exercise(&day, &category, &input)
                    .map_err(|e| e.to_string())
            }
            FormKind::EditExercise { day, category, id } => self
                .workbook
                .lock()
                .await
                .edit_exercise(day, category, id, &form.exercise_edit())
                .map_err(|e| e.to_string()),
            FormKind::Import => match backup::import_from(Path::new(&form.path())) {
                Ok(state) => Ok(self.workbook.lock().await.import(state)),
                Err(e) => {
                    error!("Import failed: {}", e);
                    Err(e.to_string())
                }
            },
        };
        self.after_edit(result).await;
    }

    fn selected<'a>(&self, lines: &'a [ExerciseLine]) -> Option<&'a ExerciseLine> {
        self.table.selected().and_then(|i| lines.get(i))
    }

    /// Show the outcome; successful edits schedule an autosave
    async fn after_edit(&mut self, result: Result<String, String>) {
        match result {
            Ok(message) => {
                let state = self.workbook.lock().await.state().clone();
                self.gateway.save(&self.user_id, &state, None);
                self.status = Some(Notice::Info(message));
            }
            Err(message) => self.status = Some(Notice::Error(message)),
        }
    }
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
