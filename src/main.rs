use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use tui_textarea::TextArea;

use stamp_hunt::config::DEFAULT_CONFIG_FILE;
use stamp_hunt::{
    load_content, AnswerOutcome, Config, Content, FileStore, GameEvent, ProgressStore,
    ProgressSummary, ProgressionEngine, Session, StopStatus, ENTRANCE,
};

type Hunt = Session<FileStore>;

enum Screen {
    Title,
    CharacterSelect,
    Map,
    Riddle,
    Passport,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MenuOption {
    Continue,
    NewGame,
    Quit,
}

struct App<'a> {
    content: Content,
    session: Option<Hunt>,
    // Held while no run is active
    parts: Option<(ProgressionEngine, ProgressStore<FileStore>)>,
    events_tx: Sender<GameEvent>,
    events_rx: Receiver<GameEvent>,
    screen: Screen,
    menu: Vec<MenuOption>,
    menu_index: usize,
    character_index: usize,
    room_index: usize,
    answer: TextArea<'a>,
    summary: Option<ProgressSummary>,
    message: String,
    message_style: Style,
}

fn answer_box<'a>() -> TextArea<'a> {
    let mut answer = TextArea::default();
    answer.set_block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Your Answer [Enter: Submit | F1: Hint | Esc: Map] "),
    );
    answer.set_placeholder_text("Type your answer...");
    answer
}

impl<'a> App<'a> {
    fn new(content: Content, store: ProgressStore<FileStore>) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        let engine = ProgressionEngine::new(content.route.clone());

        let resumed = if store.has_saved_game() {
            Session::resume(engine, store)
        } else {
            Err((engine, store))
        };
        let (session, parts, menu) = match resumed {
            Ok(session) => (
                Some(session.with_sink(events_tx.clone())),
                None,
                vec![MenuOption::Continue, MenuOption::NewGame, MenuOption::Quit],
            ),
            Err(parts) => (None, Some(parts), vec![MenuOption::NewGame, MenuOption::Quit]),
        };

        App {
            content,
            session,
            parts,
            events_tx,
            events_rx,
            screen: Screen::Title,
            menu,
            menu_index: 0,
            character_index: 0,
            room_index: 0,
            answer: answer_box(),
            summary: None,
            message: String::from("Pick a room on the map to begin."),
            message_style: Style::default().fg(Color::Yellow),
        }
    }

    fn hunt(&self) -> Option<&Hunt> {
        self.session.as_ref()
    }

    /// Room ids in map order, starting with the entrance.
    fn rooms(&self) -> Vec<String> {
        std::iter::once(ENTRANCE.to_string())
            .chain(self.content.route.stops().iter().map(|s| s.room_id.clone()))
            .collect()
    }

    fn set_message(&mut self, message: impl Into<String>, color: Color) {
        self.message = message.into();
        self.message_style = Style::default().fg(color);
    }

    /// Appends a warning when the last write did not reach the save directory.
    fn report_save(&mut self) {
        if self.session.as_ref().is_some_and(|s| !s.last_save_ok()) {
            self.message
                .push_str("\nWarning: progress could not be saved. Press s on the map to retry.");
            self.message_style = Style::default().fg(Color::Red);
        }
    }

    fn retry_save(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.save() {
            self.set_message("Progress saved.", Color::Green);
        } else {
            self.set_message("Still unable to save progress.", Color::Red);
        }
    }

    fn continue_game(&mut self) {
        if let Some(session) = self.session.as_ref() {
            self.summary = Some(session.engine().progress_summary(session.state()));
            self.screen = if session.engine().is_complete(session.state()) {
                Screen::Complete
            } else {
                Screen::Map
            };
        }
    }

    fn start_game(&mut self) {
        // Starting over discards whatever run was saved before
        if let Some(session) = self.session.take() {
            let (_, engine, store) = session.reset();
            self.parts = Some((engine, store));
        }
        let Some((engine, store)) = self.parts.take() else {
            return;
        };
        let character = &self.content.characters[self.character_index];
        let session = Session::start_new(engine, store, &character.id);
        self.summary = Some(session.engine().progress_summary(session.state()));
        let greeting = format!("{} {}: \"{}\"", character.title, character.name, character.greeting);
        self.session = Some(session.with_sink(self.events_tx.clone()));
        self.room_index = 0;
        self.set_message(greeting, Color::Cyan);
        self.report_save();
        self.screen = Screen::Map;
    }

    fn reset_game(&mut self) {
        if let Some(session) = self.session.take() {
            let (cleared, engine, store) = session.reset();
            self.parts = Some((engine, store));
            if !cleared {
                self.set_message("Could not erase the saved passport.", Color::Red);
            }
        }
        self.menu = vec![MenuOption::NewGame, MenuOption::Quit];
        self.menu_index = 0;
        self.summary = None;
        self.screen = Screen::Title;
    }

    fn open_room(&mut self) {
        let rooms = self.rooms();
        let room_id = rooms[self.room_index].clone();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let status = session.engine().stop_status(session.state(), &room_id);
        if !session.enter_room(&room_id) {
            self.set_message("That room is still locked. Solve the earlier riddles first.", Color::DarkGray);
            return;
        }
        match status {
            StopStatus::Active => {
                self.answer = answer_box();
                self.set_message("Read the riddle and type your answer.", Color::Yellow);
                self.screen = Screen::Riddle;
            }
            StopStatus::Completed => {
                self.set_message("You already have this stamp.", Color::Green);
            }
            StopStatus::Locked | StopStatus::None => {
                self.set_message("You are at the entrance.", Color::White);
            }
        }
        self.report_save();
    }

    fn submit_answer(&mut self) {
        let raw = self.answer.lines().join(" ");
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.submit_answer(&raw).outcome {
            AnswerOutcome::Correct {
                points_awarded,
                message,
                ..
            } => {
                self.set_message(format!("{}  +{} points", message, points_awarded), Color::Green);
                self.screen = Screen::Map;
            }
            AnswerOutcome::Incorrect { message } => {
                self.set_message(message, Color::Red);
                self.answer = answer_box();
            }
            AnswerOutcome::EmptyAnswer => {
                self.set_message("Type something first!", Color::DarkGray);
            }
            AnswerOutcome::NoActiveStop => {
                self.set_message("Every riddle is already solved.", Color::Green);
                self.screen = Screen::Map;
            }
        }
        self.drain_events();
        self.report_save();
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                GameEvent::StampCollected(stop) => {
                    self.message.push_str(&format!(
                        "\nStamp collected: {} {}",
                        stop.stamp_icon, stop.stamp_label
                    ));
                }
                GameEvent::ProgressUpdated(summary) => {
                    self.summary = Some(summary);
                }
                GameEvent::RunCompleted(state) => {
                    tracing::info!(points = state.points, "showing completion screen");
                    self.screen = Screen::Complete;
                }
            }
        }
    }

    fn show_hint(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(stop_id) = session.engine().active_stop(session.state()).map(|s| s.id) else {
            return;
        };
        if let Some(hint) = session.use_hint(stop_id) {
            self.set_message(format!("HINT: {}", hint), Color::Cyan);
            self.report_save();
        }
    }
}

fn init_logging(config: &Config) -> Result<()> {
    if let Some(dir) = config.log_file.parent() {
        fs::create_dir_all(dir)?;
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false) // Keep escape codes out of the log file
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = Config::load(&config_path)?;
    init_logging(&config)?;

    let content = load_content(&config.content_dir)?;
    if content.route.is_empty() || content.characters.is_empty() {
        eprintln!("No stops or guides found in {:?}", config.content_dir);
        return Ok(());
    }
    let store = ProgressStore::with_key(FileStore::new(&config.save_dir), &config.storage_key);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(content, store);

    loop {
        terminal.draw(|f| draw_ui(f, &app))?;

        if let Event::Key(key) = event::read()? {
            if !handle_key(&mut app, key) {
                break;
            }
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    if let Some(session) = app.hunt() {
        let summary = session.engine().progress_summary(session.state());
        let saved = if session.last_save_ok() {
            "Your passport is saved."
        } else {
            "WARNING: your latest progress could not be saved."
        };
        println!(
            "\n{} of {} stamps collected, {} points. {}\n",
            summary.completed, summary.total, summary.points, saved
        );
    }

    Ok(())
}

/// Returns false when the player asked to quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    match app.screen {
        Screen::Title => match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                app.menu_index = (app.menu_index + app.menu.len() - 1) % app.menu.len();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.menu_index = (app.menu_index + 1) % app.menu.len();
            }
            KeyCode::Enter => match app.menu[app.menu_index] {
                MenuOption::Continue => app.continue_game(),
                MenuOption::NewGame => app.screen = Screen::CharacterSelect,
                MenuOption::Quit => return false,
            },
            KeyCode::Char('q') => return false,
            _ => {}
        },
        Screen::CharacterSelect => match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                app.character_index = app.character_index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if app.character_index + 1 < app.content.characters.len() {
                    app.character_index += 1;
                }
            }
            KeyCode::Enter => app.start_game(),
            KeyCode::Esc => app.screen = Screen::Title,
            _ => {}
        },
        Screen::Map => match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                app.room_index = app.room_index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if app.room_index + 1 < app.rooms().len() {
                    app.room_index += 1;
                }
            }
            KeyCode::Enter => app.open_room(),
            KeyCode::Char('p') => app.screen = Screen::Passport,
            KeyCode::Char('s') => app.retry_save(),
            KeyCode::Char('R') => app.reset_game(),
            KeyCode::Char('q') => return false,
            _ => {}
        },
        Screen::Riddle => match key.code {
            KeyCode::Enter => app.submit_answer(),
            KeyCode::F(1) => app.show_hint(),
            KeyCode::Esc => app.screen = Screen::Map,
            _ => {
                app.answer.input(key);
            }
        },
        Screen::Passport => app.screen = Screen::Map,
        Screen::Complete => match key.code {
            KeyCode::Char('R') => app.reset_game(),
            KeyCode::Char('p') => app.screen = Screen::Passport,
            _ => return false,
        },
    }
    true
}

fn draw_ui(f: &mut Frame, app: &App) {
    match app.screen {
        Screen::Title => return draw_title_screen(f, app),
        Screen::CharacterSelect => return draw_character_select(f, app),
        _ => {}
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(6),
        ])
        .split(f.area());

    // Status bar
    let (completed, total, points, percentage) = app
        .summary
        .as_ref()
        .map(|s| (s.completed, s.total, s.points, s.percentage))
        .unwrap_or((0, app.content.route.len(), 0, 0));
    let status = Line::from(vec![
        Span::styled(
            " STAMP HUNT ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        ),
        Span::raw("  "),
        Span::styled(
            format!(" Stamps {}/{} ({}%) ", completed, total, percentage),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  "),
        Span::styled(
            format!(" Points: {} ", points),
            Style::default().fg(Color::Yellow),
        ),
    ]);
    let status_block = Paragraph::new(status).block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(status_block, chunks[0]);

    match app.screen {
        Screen::Riddle => draw_riddle(f, app, chunks[1]),
        Screen::Passport => draw_passport(f, app, chunks[1]),
        Screen::Complete => draw_complete(f, app, chunks[1]),
        _ => draw_map(f, app, chunks[1]),
    }

    let message = Paragraph::new(app.message.as_str())
        .block(Block::default().borders(Borders::ALL).title(" Guide "))
        .wrap(Wrap { trim: false })
        .style(app.message_style);
    f.render_widget(message, chunks[2]);
}

fn draw_map(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let Some(session) = app.hunt() else {
        return;
    };
    let engine = session.engine();
    let state = session.state();

    let items: Vec<ListItem> = app
        .rooms()
        .iter()
        .map(|room_id| {
            let (marker, color) = match engine.stop_status(state, room_id) {
                StopStatus::Completed => ("[x]", Color::Green),
                StopStatus::Active => ("[>]", Color::Yellow),
                StopStatus::Locked => ("[#]", Color::DarkGray),
                StopStatus::None => ("   ", Color::White),
            };
            let here = if *room_id == state.current_room_id { " (you are here)" } else { "" };
            let title = engine
                .route()
                .by_room(room_id)
                .map(|(_, stop)| stop.title.as_str())
                .unwrap_or("Entrance");
            ListItem::new(format!("{} {}{}", marker, title, here)).style(Style::default().fg(color))
        })
        .collect();

    let mut list_state = ListState::default();
    list_state.select(Some(app.room_index));
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Museum Map [Enter: Go | p: Passport | s: Save | R: Reset | q: Quit] "),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_riddle(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let Some(session) = app.hunt() else {
        return;
    };
    let Some(stop) = session.engine().active_stop(session.state()) else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(area);

    let riddle = Paragraph::new(stop.riddle_text.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", stop.title)),
        )
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(Color::White));
    f.render_widget(riddle, chunks[0]);
    f.render_widget(&app.answer, chunks[1]);
}

fn draw_passport(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let Some(session) = app.hunt() else {
        return;
    };
    let lines: Vec<Line> = session
        .engine()
        .passport(session.state())
        .into_iter()
        .map(|entry| {
            if entry.collected {
                Line::styled(
                    format!("  {}  {}", entry.stamp_icon, entry.stamp_label),
                    Style::default().fg(Color::Green),
                )
            } else {
                Line::styled(
                    format!("  ?   Stop {}", entry.stop_id),
                    Style::default().fg(Color::DarkGray),
                )
            }
        })
        .collect();
    let passport = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Passport [any key: back] "),
    );
    f.render_widget(passport, area);
}

fn draw_complete(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let Some(session) = app.hunt() else {
        return;
    };
    let state = session.state();
    let finished = state
        .completed_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    let text = format!(
        "=== PASSPORT COMPLETE! ===\n\n\
        Every stamp collected.\n\n\
        Points:      {:>4}\n\
        Hints used:  {:>4}\n\
        Finished:    {}\n\n\
        p: view passport  •  R: start over  •  any other key: exit",
        state.points,
        state.hints_used_stop_ids.len(),
        finished
    );
    let complete = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(complete, area);
}

fn draw_title_screen(f: &mut Frame, app: &App) {
    let area = f.area();

    let title_art = r#"
    ╔═══════════════════════════════════════════════════╗
    ║                                                   ║
    ║            M U S E U M   S T A M P                ║
    ║                                                   ║
    ║                   H U N T                         ║
    ║                                                   ║
    ║        "Every artwork keeps a secret"             ║
    ║                                                   ║
    ╚═══════════════════════════════════════════════════╝
"#;

    let mut constraints = vec![Constraint::Length(12)];
    constraints.extend(app.menu.iter().map(|_| Constraint::Length(3)));
    constraints.push(Constraint::Min(1));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let title = Paragraph::new(title_art)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    for (i, option) in app.menu.iter().enumerate() {
        let label = match option {
            MenuOption::Continue => "  CONTINUE  ",
            MenuOption::NewGame => "  NEW GAME  ",
            MenuOption::Quit => "  QUIT  ",
        };
        let style = if i == app.menu_index {
            Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let item = Paragraph::new(label)
            .style(style)
            .alignment(Alignment::Center);
        f.render_widget(item, chunks[i + 1]);
    }

    let help = Paragraph::new("↑/↓ to select  •  ENTER to confirm  •  q to quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(help, chunks[app.menu.len() + 1]);
}

fn draw_character_select(f: &mut Frame, app: &App) {
    let items: Vec<ListItem> = app
        .content
        .characters
        .iter()
        .map(|c| ListItem::new(format!("{}, {}\n    {}", c.name, c.title, c.greeting)))
        .collect();

    let mut list_state = ListState::default();
    list_state.select(Some(app.character_index));
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Choose Your Guide [Enter: Pick | Esc: Back] "),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    f.render_stateful_widget(list, f.area(), &mut list_state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn shipped_content() -> Content {
        load_content(&Path::new(env!("CARGO_MANIFEST_DIR")).join("content")).unwrap()
    }

    fn store_in(dir: &TempDir) -> ProgressStore<FileStore> {
        ProgressStore::new(FileStore::new(dir.path()))
    }

    fn play_first_stop(dir: &TempDir) {
        let mut app = App::new(shipped_content(), store_in(dir));
        app.start_game();
        app.answer.insert_str("мърквичка");
        app.submit_answer();
        assert_eq!(app.session.as_ref().unwrap().state().active_stop_index, 1);
    }

    #[test]
    fn fresh_install_offers_no_continue() {
        let dir = TempDir::new().unwrap();
        let app = App::new(shipped_content(), store_in(&dir));
        assert!(app.session.is_none());
        assert!(!app.menu.contains(&MenuOption::Continue));
    }

    #[test]
    fn continue_shows_saved_progress_on_map() {
        let dir = TempDir::new().unwrap();
        play_first_stop(&dir);

        let mut app = App::new(shipped_content(), store_in(&dir));
        assert_eq!(app.menu[0], MenuOption::Continue);
        app.continue_game();
        assert!(matches!(app.screen, Screen::Map));
        assert_eq!(app.summary.as_ref().map(|s| s.completed), Some(1));
    }

    #[test]
    fn unwritable_save_dir_warns_the_player() {
        let dir = TempDir::new().unwrap();
        // A plain file where the save directory should be makes every write fail
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, "").unwrap();
        let store = ProgressStore::new(FileStore::new(&blocked));

        let mut app = App::new(shipped_content(), store);
        app.start_game();
        assert!(app.message.contains("could not be saved"));

        app.retry_save();
        assert_eq!(app.message, "Still unable to save progress.");
    }
}
