pub mod app_dirs;
pub mod backend;
pub mod clock;
pub mod config;
pub mod controller;
pub mod metrics;
pub mod runtime;
pub mod session;
pub mod snapshot;
pub mod task;
pub mod ui;
pub mod util;
pub mod violations;

use std::sync::Arc;
use std::time::{Duration, Instant};
use std::{
    error::Error,
    io::{self, stdin},
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{
        DisableBracketedPaste, DisableFocusChange, EnableBracketedPaste, EnableFocusChange,
        KeyCode, KeyEvent, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend as TerminalBackend, CrosstermBackend},
    Terminal,
};
use tracing_subscriber::EnvFilter;

use crate::app_dirs::AppDirs;
use crate::backend::{Backend, HttpBackend};
use crate::config::{Config, ConfigStore, FileConfigStore};
use crate::controller::{SessionController, SessionPhase};
use crate::runtime::{
    CrosstermEventSource, EventSource, FixedTicker, Runner, SessionEvent, Ticker,
};
use crate::snapshot::{CommandSnapshotSource, NoCameraSource, SnapshotSource};
use crate::violations::ProctorSignal;

const TICK_RATE_MS: u64 = 100;

/// Delay between the submission and the completion screen.
const COMPLETION_DELAY_MS: u64 = 800;

/// terminal client for proctored skill assessments
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Opens a proctored skill-assessment session for a candidate test link: fetches the personalized task, runs the countdown, tracks focus/copy/paste/idle activity, and submits the answer with its behavior report exactly once."
)]
pub struct Cli {
    /// test-link token identifying this assessment invitation
    test_link: String,

    /// candidate session id issued during the personal-info step
    #[clap(short = 's', long)]
    session_id: String,

    /// backend base URL (overrides the config file)
    #[clap(long)]
    server: Option<String>,

    /// countdown deadline in seconds (overrides the config file)
    #[clap(long)]
    seconds: Option<u64>,

    /// camera capture command writing one JPEG to stdout, e.g. "fswebcam --no-banner -"
    #[clap(long)]
    capture_cmd: Option<String>,

    /// proceed without camera evidence even if a capture command is configured
    #[clap(long)]
    no_camera: bool,
}

impl Cli {
    /// Merge CLI overrides into the stored configuration.
    fn apply_to(&self, config: &mut Config) {
        if let Some(server) = &self.server {
            config.server_url = server.clone();
        }
        if let Some(seconds) = self.seconds {
            config.deadline_secs = seconds;
        }
        if let Some(cmd) = &self.capture_cmd {
            config.capture_command = Some(cmd.clone());
        }
        if self.no_camera {
            config.capture_command = None;
        }
    }
}

pub struct App<B: Backend, S: SnapshotSource> {
    pub controller: SessionController<B, S>,
    pub show_completion: bool,
    completion_ticks: u64,
}

impl<B: Backend, S: SnapshotSource> App<B, S> {
    pub fn new(controller: SessionController<B, S>) -> Self {
        Self {
            controller,
            show_completion: false,
            completion_ticks: 0,
        }
    }

    pub fn on_tick(&mut self, now: Instant) {
        self.controller.on_tick(now);

        // Short pause on the submitted banner, then the completion screen
        if self.controller.phase() == SessionPhase::Submitted && !self.show_completion {
            self.completion_ticks += 1;
            if self.completion_ticks >= COMPLETION_DELAY_MS / TICK_RATE_MS {
                self.show_completion = true;
            }
        }
    }

    /// Returns true when the app should exit.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        // Emergency bail-out; abandons the attempt without submitting
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('q') {
            return true;
        }

        match self.controller.phase() {
            SessionPhase::Failed => {
                matches!(key.code, KeyCode::Esc | KeyCode::Enter)
            }
            SessionPhase::Submitted => {
                self.show_completion
                    && matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q'))
            }
            SessionPhase::Ready | SessionPhase::InProgress => {
                self.handle_session_key(key, now);
                false
            }
            SessionPhase::Loading | SessionPhase::Submitting => false,
        }
    }

    fn handle_session_key(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                // Copy/paste combos are observed, not blocked
                KeyCode::Char(c) if c.eq_ignore_ascii_case(&'c') => {
                    self.controller.on_signal(ProctorSignal::CopyKey, now);
                }
                KeyCode::Char(c) if c.eq_ignore_ascii_case(&'v') => {
                    self.controller.on_signal(ProctorSignal::PasteKey, now);
                }
                KeyCode::Char(c) if c.eq_ignore_ascii_case(&'s') => {
                    self.controller.submit_manual(now);
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Backspace => self.controller.backspace(now),
            KeyCode::Enter => self.controller.push_newline(now),
            // Tabs render unevenly in the answer pane; indent with spaces
            KeyCode::Tab => {
                for _ in 0..4 {
                    self.controller.push_char(' ', now);
                }
            }
            KeyCode::Char(c) => self.controller.push_char(c, now),
            _ => {}
        }
    }
}

fn init_tracing() {
    let path = AppDirs::log_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(Arc::new(file))
            .with_ansi(false)
            .try_init();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_tracing();

    let mut config = FileConfigStore::new().load();
    cli.apply_to(&mut config);

    let backend = HttpBackend::new(&config.server_url);
    let camera: Box<dyn SnapshotSource> = match &config.capture_command {
        Some(cmd) => Box::new(CommandSnapshotSource::new(cmd.clone())),
        None => Box::new(NoCameraSource),
    };
    let controller = SessionController::new(
        cli.test_link.clone(),
        config.session_config(),
        backend,
        camera,
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableFocusChange,
        EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(controller);
    let result = start_tui(&mut terminal, &mut app, &cli);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        DisableFocusChange,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<TB: TerminalBackend, B: Backend, S: SnapshotSource>(
    terminal: &mut Terminal<TB>,
    app: &mut App<B, S>,
    cli: &Cli,
) -> Result<(), Box<dyn Error>> {
    // Show the loading screen before the blocking one-shot task fetch
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    app.controller.load_task(&cli.session_id);
    app.controller.begin(Instant::now());

    let events = CrosstermEventSource::new();
    let ticker = FixedTicker::new(Duration::from_millis(TICK_RATE_MS));
    let runner = Runner::new(events, ticker);

    run_session(terminal, app, &runner)
}

fn run_session<TB, E, T, B, S>(
    terminal: &mut Terminal<TB>,
    app: &mut App<B, S>,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>>
where
    TB: TerminalBackend,
    E: EventSource,
    T: Ticker,
    B: Backend,
    S: SnapshotSource,
{
    loop {
        terminal.draw(|f| {
            let screen = ui::screen::current_screen(app);
            screen.render(app, f);
        })?;

        let now = Instant::now();
        match runner.step() {
            SessionEvent::Tick => app.on_tick(now),
            SessionEvent::Resize => {}
            SessionEvent::FocusGained => {}
            SessionEvent::FocusLost => {
                app.controller.on_signal(ProctorSignal::FocusLost, now);
            }
            SessionEvent::Paste(text) => {
                app.controller.on_paste(&text, now);
            }
            SessionEvent::Key(key) => {
                if app.handle_key(key, now) {
                    break;
                }
            }
        }
    }

    Ok(())
}
