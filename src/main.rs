use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    cursor::Show,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
    time::Duration,
};

use typesprint::{
    app::App,
    app_dirs::AppDirs,
    config::{Config, ConfigOverrides, ConfigStore, FileConfigStore},
    corpus::Corpus,
    logging,
    runtime::{EventLoop, TerminalEvents},
    timer::SystemClock,
};

/// Longest the loop sleeps while no countdown is pending
const IDLE_WAIT_MS: u64 = 100;

/// one-minute typing speed test
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A timed typing test: type the passage as far as you can before the clock runs out. Shows mistakes, words per minute and characters per minute as you go."
)]
pub struct Cli {
    /// number of seconds the test runs for
    #[clap(short = 's', long)]
    seconds: Option<u32>,

    /// custom passage to type instead of one from the corpus
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// bundled corpus to draw passages from
    #[clap(short = 'c', long)]
    corpus: Option<String>,

    /// file with passages: JSON corpus, or one passage per line
    #[clap(long)]
    corpus_file: Option<PathBuf>,

    /// list the bundled corpora and exit
    #[clap(long)]
    list_corpora: bool,

    /// log level (off, error, warn, info, debug, trace)
    #[clap(long)]
    log_level: Option<String>,

    /// where to write the log
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// use this config file instead of the default location
    #[clap(long)]
    config: Option<PathBuf>,

    /// write the merged settings back to the config file
    #[clap(long)]
    save_config: bool,

    /// print the final session snapshot as JSON on exit
    #[clap(long)]
    json: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            duration_secs: self.seconds,
            corpus: self.corpus.clone(),
            corpus_file: self.corpus_file.clone(),
            log_level: self.log_level.clone(),
        }
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

fn load_corpus(cli: &Cli, config: &Config) -> typesprint::Result<Corpus> {
    if let Some(prompt) = &cli.prompt {
        return Corpus::single(prompt.clone());
    }
    match &config.corpus_file {
        Some(path) => Corpus::from_file(path),
        None => Corpus::bundled(&config.corpus),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.list_corpora {
        for name in Corpus::bundled_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let store = cli.config_store();
    let (file_config, config_error) = match store.read() {
        Ok(cfg) => (cfg.unwrap_or_default(), None),
        Err(e) => (Config::default(), Some(e)),
    };
    let config = file_config.with_overrides(&cli.overrides());
    config.validate()?;

    let log_path = cli.log_file.clone().unwrap_or_else(AppDirs::log_path);
    logging::init(&log_path, config.log_level_filter()?)?;
    if let Some(e) = config_error {
        log::warn!("ignoring malformed config {}: {e}", store.path().display());
    }

    if cli.save_config {
        store.save(&config)?;
        log::info!("saved config to {}", store.path().display());
    }

    let corpus = load_corpus(&cli, &config)?;

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(corpus, config.duration_secs, SystemClock);
    {
        let _guard = TerminalGuard::enter(io::stdout())?;
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        let events = EventLoop::new(TerminalEvents::spawn(), Duration::from_millis(IDLE_WAIT_MS));
        events.run(&mut app, |app| {
            terminal.draw(|f| f.render_widget(app, f.area()))?;
            Ok(())
        })?;
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&app.session().snapshot())?);
    }

    Ok(())
}

/// Raw mode and the alternate screen, switched back on drop. Every exit
/// after `enter`, including a failed setup step, restores the terminal.
struct TerminalGuard<W: Write> {
    out: W,
}

impl<W: Write> TerminalGuard<W> {
    fn enter(out: W) -> io::Result<Self> {
        enable_raw_mode()?;
        let mut guard = Self { out };
        execute!(guard.out, EnterAlternateScreen)?;
        Ok(guard)
    }

    fn restore(&mut self) -> io::Result<()> {
        let raw = disable_raw_mode();
        execute!(self.out, LeaveAlternateScreen, Show)?;
        raw
    }
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            log::error!("failed to restore terminal: {e}");
        }
    }
}
