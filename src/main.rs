use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
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
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tickclock::{
    app::{App, AppOptions, KeyOutcome},
    app_dirs::AppDirs,
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore},
    history,
    runtime::Runner,
    timer_log,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// terminal desk clock with a logging stopwatch timer and a countdown
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Shows the current time, weekday and date, runs a start/stop timer that appends every interval to a plain-text log, and runs an independent countdown."
)]
pub struct Cli {
    /// file the timer appends records to (default: ./time.txt)
    #[clap(short = 'f', long)]
    timer_file: Option<PathBuf>,

    /// seconds before a notice closes by itself, 0 keeps it open
    #[clap(short = 'n', long)]
    notice_secs: Option<u64>,

    /// log filter, e.g. info or tickclock=debug (RUST_LOG wins if set)
    #[clap(long)]
    log_level: Option<String>,

    /// where to write the application log
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// config file to use instead of the platform default
    #[clap(long)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
    /// print the records of a timer file with totals
    History {
        /// timer file to read (default: the configured timer file)
        path: Option<PathBuf>,
    },
}

impl Cli {
    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    /// Command line flags override the config file
    fn app_options(&self, cfg: &Config) -> AppOptions {
        let mut options = AppOptions::from(cfg);
        if let Some(path) = &self.timer_file {
            options.timer_file = Some(path.clone());
        }
        if let Some(secs) = self.notice_secs {
            options.notice_secs = secs;
        }
        options
    }

    fn log_filter(&self, cfg: &Config) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = self.log_level.as_deref().unwrap_or(cfg.log_level.as_str());
            EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
        })
    }
}

// the terminal is in the alternate screen, so logs go to a file
fn init_logging(cli: &Cli, cfg: &Config) {
    let Some(path) = cli.log_file.clone().or_else(AppDirs::log_path) else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(cli.log_filter(cfg))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn print_history(path: Option<PathBuf>, options: &AppOptions) -> Result<(), Box<dyn Error>> {
    let path = path
        .or_else(|| options.timer_file.clone())
        .unwrap_or_else(timer_log::default_path);
    let entries = timer_log::read_log(&path)?;
    println!("{}", history::render_report(&entries));
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let store = cli.config_store();
    let cfg = store.load();
    let options = cli.app_options(&cfg);

    if let Some(Command::History { path }) = cli.command.clone() {
        return print_history(path, &options);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging(&cli, &cfg);
    info!(version = env!("CARGO_PKG_VERSION"), "starting tickclock");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(Box::new(SystemClock), options);
    let started_with = app.timer_path().to_path_buf();
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    remember_timer_path(&store, cfg, &started_with, &app);
    info!("tickclock exited");

    result
}

/// Keeps a timer file picked during the run for next time. A `-f` flag
/// only applies to its own run.
fn remember_timer_path(
    store: &FileConfigStore,
    mut cfg: Config,
    started_with: &Path,
    app: &App,
) {
    if app.timer_path() == started_with {
        return;
    }
    cfg.timer_file = (app.timer_path() != app.default_timer_path())
        .then(|| app.timer_path().to_path_buf());
    if let Err(e) = store.save(&cfg) {
        warn!(path = %store.path().display(), error = %e, "could not save config");
    }
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::for_terminal();

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    while runner.step(app) == KeyOutcome::Continue {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    }

    Ok(())
}
