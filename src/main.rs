use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
    tty::IsTty,
};
use pomo::{
    app::{format_clock, App},
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore},
    cue::{Cue, SilentCue, ToneCue},
    engine::{EngineState, SessionEngine},
    logging, report,
    runtime::{CrosstermEventSource, FixedTicker, Runner, IDLE_REDRAW},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Instant,
};

const APP_TITLE: &str = "pomo";
const MAX_REPORT_DAYS: i64 = 36_600;

/// focused pomodoro timer for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A pomodoro timer for the terminal: work and break phases in the classic 4-work-phase cycle, with completed work phases counted per day."
)]
pub struct Cli {
    /// path of the settings and stats document
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// task to pre-fill before the first work phase
    #[clap(short = 't', long)]
    task: Option<String>,

    /// do not play a tone when a phase completes
    #[clap(long)]
    no_sound: bool,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// print completed work phases per day
    Stats {
        /// number of days to show, ending today
        #[clap(
            short = 'd',
            long,
            default_value_t = 7,
            value_parser = clap::value_parser!(u32).range(1..=MAX_REPORT_DAYS)
        )]
        days: u32,

        /// print every recorded day as CSV instead
        #[clap(long)]
        csv: bool,
    },
    /// print the location of the settings and stats document
    Path,
}

impl Cli {
    fn store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    fn cue(&self) -> Box<dyn Cue> {
        if self.no_sound {
            Box::new(SilentCue)
        } else {
            Box::new(ToneCue::default())
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let _log_guard = AppDirs::log_dir().and_then(|dir| logging::init(&dir));
    let store = cli.store();

    match cli.command {
        Some(Command::Path) => {
            println!("{}", store.path().display());
            return Ok(());
        }
        Some(Command::Stats { days, csv }) => {
            let doc = store.load();
            if csv {
                report::write_csv(&doc.session_stats, io::stdout().lock())?;
            } else {
                let today = chrono::Local::now().date_naive();
                let rows = report::daily_rows(&doc.session_stats, today, days as usize);
                print!("{}", report::render_table(&rows));
                println!(
                    "total {}  active days {}  streak {}",
                    doc.session_stats.total(),
                    doc.session_stats.active_days(),
                    doc.session_stats.streak_ending(today)
                );
            }
            return Ok(());
        }
        None => {}
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(SessionEngine::new(store, cli.cue()));
    if let Some(task) = cli.task.clone() {
        app = app.with_task(task);
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = start_tui(&mut terminal, &mut app);
    app.shutdown();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        SetTitle(APP_TITLE)
    )?;
    terminal.show_cursor()?;

    res
}

fn start_tui<B: Backend + io::Write, S: ConfigStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::new(IDLE_REDRAW));
    let mut title = String::new();

    while !app.should_quit {
        let next_title = window_title(app);
        if next_title != title {
            execute!(terminal.backend_mut(), SetTitle(&next_title))?;
            title = next_title;
        }
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let event = runner.step(app.engine.next_deadline());
        app.on_event(event, Instant::now());
    }

    Ok(())
}

fn window_title<S: ConfigStore>(app: &App<S>) -> String {
    match app.engine.state() {
        EngineState::Running | EngineState::Paused => format!(
            "{} - {}",
            format_clock(app.engine.remaining_seconds()),
            APP_TITLE
        ),
        _ => APP_TITLE.to_string(),
    }
}
