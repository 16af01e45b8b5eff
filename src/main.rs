pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs,
    io::{self, stdin},
    rc::Rc,
    sync::mpsc::{self, Receiver},
    time::Duration,
};

use typeroids::{
    app_dirs::AppDirs,
    arena::{Arena, Defense},
    config::{Config, ConfigStore, FileConfigStore},
    leaderboard::{clamp_limit, LeaderboardDb, LeaderboardEntry, ScoreSubmitter, DEFAULT_LEADERBOARD_LIMIT},
    runtime::{CrosstermEventSource, FixedTicker, FrameClock, GameEvent, Runner},
    session::{Session, SessionConfig, SessionEvent, SessionPhase},
    words::{ShuffledWordSource, WordSource},
};

const TICK_RATE_MS: u64 = 50;
const MAX_FRAME_STEP: Duration = Duration::from_millis(250);
const BANNER_TTL: Duration = Duration::from_millis(900);
const LEVEL_BANNER_TTL: Duration = Duration::from_millis(2000);
const MISTAKE_FLASH_TTL: Duration = Duration::from_millis(200);

/// type the words on falling asteroids before they hit the earth
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing game: words fall toward the earth on asteroids, type them to shoot them down. Scores are kept on a local leaderboard."
)]
pub struct Cli {
    /// pilot name recorded on the leaderboard
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// words to destroy before the level goes up
    #[clap(long)]
    words_per_level: Option<u32>,

    /// hits the earth can take once the shield is gone
    #[clap(long)]
    health: Option<u32>,

    /// hits the shield absorbs before the earth takes damage
    #[clap(long)]
    shield: Option<u32>,

    /// print the top N scores and exit
    #[clap(long, value_name = "N", num_args = 0..=1, default_missing_value = "10")]
    leaderboard: Option<usize>,

    /// do not record scores for this run
    #[clap(long)]
    no_submit: bool,

    /// verbosity of the log file
    #[clap(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

impl Cli {
    /// Flags given on the command line win over the stored config
    fn apply(&self, mut config: Config) -> Config {
        if let Some(name) = &self.name {
            config.player_name = name.clone();
        }
        if let Some(n) = self.words_per_level {
            config.difficulty.words_per_level = n;
        }
        if let Some(health) = self.health {
            config.health = health;
        }
        if let Some(shield) = self.shield {
            config.shield = shield;
        }
        if self.no_submit {
            config.submit_scores = false;
        }
        config.validated()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

pub struct App {
    pub session: Session<Arena>,
    events: Receiver<SessionEvent>,
    leaderboard: Option<Rc<LeaderboardDb>>,
    pub high_scores: Vec<LeaderboardEntry>,
    pub banner: Option<(String, Duration)>,
    pub mistake_flash: Option<Duration>,
    pub notice: Option<String>,
}

impl App {
    pub fn new(
        config: &Config,
        words: Box<dyn WordSource>,
        arena: Arena,
        leaderboard: Option<Rc<LeaderboardDb>>,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut session =
            Session::new(SessionConfig::from(config), words, arena).with_observer(Box::new(tx));
        if let Some(db) = &leaderboard {
            session = session.with_submitter(Box::new(Rc::clone(db)));
        }

        let mut app = Self {
            session,
            events: rx,
            notice: leaderboard
                .is_none()
                .then(|| "leaderboard unavailable, scores will not be saved".to_string()),
            leaderboard,
            high_scores: Vec::new(),
            banner: None,
            mistake_flash: None,
        };
        app.refresh_high_scores();
        app
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Control {
        // ctrl+c to quit
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Control::Quit;
        }

        match (self.session.phase(), key.code) {
            (SessionPhase::Playing, KeyCode::Char(c))
                if matches!(key.modifiers, KeyModifiers::NONE | KeyModifiers::SHIFT) =>
            {
                self.session.handle_key(c);
            }
            (SessionPhase::Playing, KeyCode::Backspace) => {
                self.session.handle_backspace();
            }
            (SessionPhase::Playing | SessionPhase::Paused, KeyCode::Tab) => {
                self.session.toggle_pause();
            }
            (SessionPhase::Playing | SessionPhase::Paused, KeyCode::Esc) => {
                self.session.stop();
            }
            (SessionPhase::Menu | SessionPhase::GameOver, KeyCode::Enter) => {
                self.session.start();
            }
            (SessionPhase::GameOver, KeyCode::Char('m')) => {
                self.session.return_to_menu();
            }
            (SessionPhase::Menu | SessionPhase::GameOver, KeyCode::Esc | KeyCode::Char('q')) => {
                return Control::Quit;
            }
            _ => {}
        }
        self.drain_events();
        Control::Continue
    }

    /// Advance the game by `dt` of real time
    pub fn update(&mut self, dt: Duration) {
        self.session.update(dt);

        if let Some((_, remaining)) = &mut self.banner {
            *remaining = remaining.saturating_sub(dt);
            if remaining.is_zero() {
                self.banner = None;
            }
        }
        self.mistake_flash = self
            .mistake_flash
            .map(|remaining| remaining.saturating_sub(dt))
            .filter(|remaining| !remaining.is_zero());

        self.drain_events();
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        let (w, h) = ui::arena_size(width, height);
        self.session.entities_mut().resize(w, h);
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                SessionEvent::Destroyed { points, .. } => {
                    self.banner = Some((format!("+{points}"), BANNER_TTL));
                }
                SessionEvent::LevelUp { level } => {
                    self.banner = Some((format!("LEVEL {level}"), LEVEL_BANNER_TTL));
                }
                SessionEvent::TargetLost { .. } => {
                    self.banner = Some(("impact!".to_string(), BANNER_TTL));
                }
                SessionEvent::Mistake { .. } => {
                    self.mistake_flash = Some(MISTAKE_FLASH_TTL);
                }
                SessionEvent::GameOver(_) => {
                    self.banner = None;
                    self.mistake_flash = None;
                    self.refresh_high_scores();
                }
                _ => {}
            }
        }
    }

    fn refresh_high_scores(&mut self) {
        let Some(db) = &self.leaderboard else {
            return;
        };
        match db.fetch_leaderboard(DEFAULT_LEADERBOARD_LIMIT) {
            Ok(entries) => self.high_scores = entries,
            Err(e) => log::warn!("could not load leaderboard: {e}"),
        }
    }
}

fn init_logging(level: LogLevel) {
    let path = AppDirs::log_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if let Err(e) = simple_logging::log_to_file(&path, level.into()) {
        eprintln!("logging disabled ({}): {e}", path.display());
    }
}

fn print_leaderboard(limit: usize) -> Result<(), Box<dyn Error>> {
    let db = LeaderboardDb::new()?;
    let entries = db.top(clamp_limit(limit))?;
    if entries.is_empty() {
        println!("no scores yet");
        return Ok(());
    }
    println!(
        "{:>4}  {:<20} {:>8} {:>6} {:>7} {:>9}  {}",
        "rank", "pilot", "score", "words", "acc", "tier", "date"
    );
    for entry in entries {
        let record = &entry.record;
        println!(
            "{:>4}  {:<20} {:>8} {:>6} {:>7} {:>9}  {}",
            entry.rank,
            record.player_name,
            record.score,
            record
                .words_typed
                .map_or_else(|| "-".to_string(), |w| w.to_string()),
            record
                .accuracy
                .map_or_else(|| "-".to_string(), |a| format!("{a:.1}%")),
            record.difficulty.as_deref().unwrap_or("-"),
            entry.created_at.format("%Y-%m-%d %H:%M"),
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    if let Some(limit) = cli.leaderboard {
        return print_leaderboard(limit);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    if let Err(e) = store.save(&config) {
        log::warn!("could not save config to {}: {e}", store.path().display());
    }

    let leaderboard = match LeaderboardDb::new() {
        Ok(db) => Some(Rc::new(db)),
        Err(e) => {
            log::warn!("leaderboard disabled: {e}");
            None
        }
    };

    let (width, height) = terminal::size()?;
    let (arena_width, arena_height) = ui::arena_size(width, height);
    let arena = Arena::new(
        arena_width,
        arena_height,
        Defense::new(config.shield, config.health),
    );
    let mut app = App::new(
        &config,
        Box::new(ShuffledWordSource::embedded()),
        arena,
        leaderboard,
    );
    log::info!("typeroids started for {}", config.player_name);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let mut clock = FrameClock::new(MAX_FRAME_STEP);

    loop {
        terminal.draw(|f| ui(app, f))?;

        match runner.step() {
            GameEvent::Tick => {}
            GameEvent::Resize(width, height) => app.resize(width, height),
            GameEvent::Key(key) => {
                if app.on_key(key) == Control::Quit {
                    break;
                }
            }
        }
        app.update(clock.lap());
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
