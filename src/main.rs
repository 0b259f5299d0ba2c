mod ui;

use capquiz::{
    config::{Config, ConfigStore, FileConfigStore},
    dataset,
    run::{Mode, Phase, RunEngine},
    runtime::{CrosstermEventSource, QuizEvent, Runner},
    TICK_RATE_MS,
};
use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::Duration,
};
use webbrowser::Browser;

/// Timed-run lengths offered on the start screen, keyed 1..=3.
pub const TIMER_PRESETS: [usize; 3] = [30, 60, 120];

/// terminal capital-city quiz
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal flashcard quiz over world capitals: free-text answers with \
forgiving matching, shuffled decks, streak tracking, and deck or countdown runs."
)]
pub struct Cli {
    /// mode to preselect on the start screen
    #[clap(short = 'm', long, value_enum)]
    mode: Option<StartMode>,

    /// countdown length in seconds for timed runs
    #[clap(short = 's', long)]
    seconds: Option<usize>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum StartMode {
    Deck,
    Timed,
}

impl StartMode {
    fn as_mode(&self) -> Mode {
        match self {
            StartMode::Deck => Mode::Deck,
            StartMode::Timed => Mode::Timed,
        }
    }

    fn from_mode_name(name: &str) -> Option<Self> {
        match Mode::from_name(name)? {
            Mode::Deck => Some(StartMode::Deck),
            Mode::Timed => Some(StartMode::Timed),
        }
    }
}

/// Launch-time preferences: CLI flags override the stored config, which
/// overrides the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeSettings {
    pub start_mode: StartMode,
    pub seconds: usize,
}

impl RuntimeSettings {
    fn resolve(cli: &Cli, stored: &Config) -> Self {
        let start_mode = cli
            .mode
            .or_else(|| StartMode::from_mode_name(&stored.mode))
            .unwrap_or(StartMode::Timed);
        let seconds = cli.seconds.unwrap_or(stored.seconds).max(1);
        Self {
            start_mode,
            seconds,
        }
    }

    fn to_config(&self) -> Config {
        Config {
            mode: self.start_mode.to_string().to_lowercase(),
            seconds: self.seconds,
        }
    }
}

#[derive(Debug)]
pub struct App {
    pub settings: RuntimeSettings,
    pub engine: RunEngine,
}

impl App {
    pub fn new(records: Vec<dataset::CountryRecord>, settings: RuntimeSettings) -> Self {
        Self {
            settings,
            engine: RunEngine::new(records),
        }
    }

    pub fn start_run(&mut self) {
        let mode = self.settings.start_mode.as_mode();
        let seconds = match mode {
            Mode::Timed => Some(self.settings.seconds as f64),
            Mode::Deck => None,
        };
        self.engine.start(mode, seconds);
    }
}

#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let records = dataset::load_default()?;
    let store = FileConfigStore::new();
    let settings = RuntimeSettings::resolve(&cli, &store.load());

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(records, settings);
    let res = start_tui(&mut terminal, &mut app, &store);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    store: &dyn ConfigStore,
) -> Result<(), Box<dyn Error>> {
    let events = CrosstermEventSource::new();
    let runner = Runner::new(events, Duration::from_millis(TICK_RATE_MS));

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            QuizEvent::Tick => app.engine.on_tick(),
            QuizEvent::Resize => {}
            QuizEvent::Key(key) => {
                if handle_key(app, store, key) == Flow::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, store: &dyn ConfigStore, key: KeyEvent) -> Flow {
    // ctrl+c quits from any screen
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Flow::Quit;
    }

    match app.engine.state.phase {
        Phase::Idle => match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('d') => app.settings.start_mode = StartMode::Deck,
            KeyCode::Char('t') => app.settings.start_mode = StartMode::Timed,
            KeyCode::Char('1') => app.settings.seconds = TIMER_PRESETS[0],
            KeyCode::Char('2') => app.settings.seconds = TIMER_PRESETS[1],
            KeyCode::Char('3') => app.settings.seconds = TIMER_PRESETS[2],
            KeyCode::Enter => {
                let _ = store.save(&app.settings.to_config());
                app.start_run();
            }
            _ => {}
        },
        Phase::Running => match key.code {
            KeyCode::Esc => app.engine.end_run(),
            KeyCode::Enter => app.engine.submit(),
            KeyCode::Backspace => app.engine.backspace(),
            KeyCode::Char(c) => app.engine.type_char(c),
            _ => {}
        },
        Phase::Summary => match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Enter | KeyCode::Char('r') => app.start_run(),
            KeyCode::Char('b') => app.engine.reset(),
            KeyCode::Char('t') => share_results(app),
            _ => {}
        },
    }

    Flow::Continue
}

fn share_results(app: &App) {
    if Browser::is_available() {
        webbrowser::open(&format!(
            "https://twitter.com/intent/tweet?text={}%2F{}%20capitals%20%2F%20{}%25%20acc%20%2F%20best%20streak%20{}",
            app.engine.state.score,
            app.engine.state.attempts,
            app.engine.accuracy(),
            app.engine.state.best_streak
        ))
        .unwrap_or_default();
    }
}
