mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use prime_breathing::{
    app_dirs::AppDirs,
    clock::ClockConfig,
    config::{GameConfig, GraceAnchor, ReactionMode},
    input::{self, KeyMap},
    runtime::{BreathEvent, ChannelEventSource, Runner},
    session::Session,
    summary::SessionSummary,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

use crate::ui::StatusView;

const FRAME_RATE_MS: u64 = 50;

/// hold on composites, release on primes
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A reaction game: a counter ticks up once per second. Hold space while it is composite (or 0/1) and release it while it is prime. Mistakes beyond the reaction window cost a life; three and you're out."
)]
pub struct Cli {
    /// how late input is judged
    #[clap(short = 'm', long, value_enum, default_value_t = ModeArg::Debounced)]
    mode: ModeArg,

    /// tick configuration
    #[clap(short = 'c', long, value_enum, default_value_t = ClockArg::Smooth)]
    clock: ClockArg,

    /// reaction delay in milliseconds (debounced mode)
    #[clap(long, default_value_t = prime_breathing::config::DEFAULT_REACTION_DELAY_MS)]
    reaction_ms: u64,

    /// forgiven ticks at the start of each second (window mode)
    #[clap(long, default_value_t = prime_breathing::config::DEFAULT_REACTION_TICKS)]
    reaction_ticks: u32,

    /// where the grace window restarts (window mode)
    #[clap(long, value_enum, default_value_t = AnchorArg::Second)]
    grace_anchor: AnchorArg,

    /// hide the hold/release prompt
    #[clap(long)]
    hard: bool,

    /// space toggles hold instead of needing key release events
    #[clap(long)]
    toggle: bool,

    /// print the final summary as json
    #[clap(long)]
    json: bool,

    /// write logs to this file (defaults to the state dir when RUST_LOG is set)
    #[clap(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum ModeArg {
    Debounced,
    Window,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum ClockArg {
    Classic,
    Smooth,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum AnchorArg {
    Second,
    SecondOrInput,
}

impl Cli {
    /// Convert CLI arguments to the game configuration
    fn to_game_config(&self) -> GameConfig {
        let clock = match self.clock {
            ClockArg::Classic => ClockConfig::classic(),
            ClockArg::Smooth => ClockConfig::smooth(),
        };
        let mode = match self.mode {
            ModeArg::Debounced => ReactionMode::Debounced {
                reaction_delay: Duration::from_millis(self.reaction_ms),
            },
            ModeArg::Window => ReactionMode::Window {
                reaction_ticks: self.reaction_ticks,
                anchor: match self.grace_anchor {
                    AnchorArg::Second => GraceAnchor::SecondStart,
                    AnchorArg::SecondOrInput => GraceAnchor::SecondStartOrInput,
                },
            },
        };
        GameConfig::new(clock, mode).with_hard_mode(self.hard)
    }
}

fn init_logging(cli: &Cli) -> io::Result<()> {
    let path = match (&cli.log_file, std::env::var_os("RUST_LOG")) {
        (Some(path), _) => Some(path.clone()),
        (None, Some(_)) => AppDirs::log_path(),
        (None, None) => None,
    };
    // stderr belongs to the alternate screen, so only ever log to a file
    let Some(path) = path else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    log::info!("logging to {}", path.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config = cli.to_game_config();
    if let Err(e) = config.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, e).exit();
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging(&cli)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    // real holds need key release events; fall back to toggling without them
    let enhanced = !cli.toggle && supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut session = Session::new(config);
    let mut keys = KeyMap::new(!enhanced);
    let result = start_tui(&mut terminal, &mut session, &mut keys);

    if enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result?;

    let summary = SessionSummary::from_session(&session);
    if cli.json {
        println!("{}", summary.to_json()?);
    } else {
        println!("{summary}");
    }

    Ok(())
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    session: &mut Session,
    keys: &mut KeyMap,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        ChannelEventSource::terminal(),
        Duration::from_millis(FRAME_RATE_MS),
    );

    loop {
        let snapshot = session.snapshot();
        terminal.draw(|f| {
            f.render_widget(
                StatusView {
                    snapshot: &snapshot,
                    toggle: keys.is_toggle(),
                },
                f.area(),
            )
        })?;

        match runner.step(session) {
            BreathEvent::Tick | BreathEvent::Resize => {}
            BreathEvent::Closed => {
                // no quit key can arrive any more
                log::warn!("terminal input closed, leaving");
                session.stop();
                break;
            }
            BreathEvent::Key(key) => {
                if let Some(command) = keys.map(key) {
                    if !input::apply(session, command) {
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
