use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::corpus::Corpus;
use crate::session::TypingSession;
use crate::timer::{Clock, IntervalTimer};
use crate::typing_policy::{apply_key, KeyInput};

/// One countdown step.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    /// Start over on the same passage.
    Restart,
    /// Start over on a different passage.
    NewText,
    Type(KeyInput),
    Ignore,
}

impl Command {
    pub fn from_key_event(key: &KeyEvent) -> Self {
        match key.code {
            KeyCode::Esc => Command::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Command::Quit,
            KeyCode::Tab => Command::NewText,
            KeyCode::Left => Command::Restart,
            _ => KeyInput::from_key_event(key).map_or(Command::Ignore, Command::Type),
        }
    }
}

/// Owns the session together with the timer that drives it.
#[derive(Debug)]
pub struct App<C: Clock> {
    session: TypingSession,
    timer: IntervalTimer<C>,
    corpus: Corpus,
}

impl<C: Clock> App<C> {
    pub fn new(corpus: Corpus, duration_secs: u32, clock: C) -> Self {
        let session = TypingSession::with_duration(corpus.pick(), duration_secs);
        log::debug!(
            "new session from corpus `{}` ({} chars, {}s)",
            corpus.name,
            session.chars().len(),
            duration_secs
        );
        Self {
            session,
            timer: IntervalTimer::new(clock, TICK_PERIOD),
            corpus,
        }
    }

    pub fn session(&self) -> &TypingSession {
        &self.session
    }

    pub fn timer(&self) -> &IntervalTimer<C> {
        &self.timer
    }

    /// Returns true when the session changed and should be redrawn.
    pub fn on_key(&mut self, key: KeyInput) -> bool {
        let outcome = apply_key(&mut self.session, key);
        if let Some(handle) = outcome.started {
            log::info!("test started");
            self.timer.arm(handle);
        }
        self.stop_timer_if_finished();
        outcome.changed
    }

    /// Feeds every countdown step that has come due into the session.
    pub fn on_tick(&mut self) -> bool {
        let mut changed = false;
        for handle in self.timer.poll() {
            changed |= self.session.tick(handle);
        }
        self.stop_timer_if_finished();
        changed
    }

    /// Applies a command. Returns false once the app should exit.
    pub fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Quit => return false,
            Command::Restart => self.restart(),
            Command::NewText => self.new_text(),
            Command::Type(key) => {
                self.on_key(key);
            }
            Command::Ignore => {}
        }
        true
    }

    pub fn restart(&mut self) {
        let text = self.session.text();
        self.reset_with(text);
    }

    pub fn new_text(&mut self) {
        let text = self.corpus.pick_other(&self.session.text()).to_string();
        self.reset_with(text);
    }

    /// How long the event loop may sleep before the next countdown step.
    pub fn until_next_tick(&self) -> Option<Duration> {
        self.timer.until_next()
    }

    fn reset_with(&mut self, text: String) {
        if self.timer.cancel() {
            log::debug!("cancelled running countdown");
        }
        self.session.reset(text);
        log::info!("session reset");
    }

    fn stop_timer_if_finished(&mut self) {
        if self.session.has_finished() && self.timer.cancel() {
            let metrics = self.session.metrics();
            log::info!(
                "test finished: {:.0} wpm, {:.0} cpm, {} mistakes, {}% acc",
                metrics.words_per_minute,
                metrics.chars_per_minute,
                self.session.mistakes(),
                metrics.accuracy
            );
        }
    }
}
