//! The event loop behind the terminal front end: key presses and resizes
//! come in over a channel, countdown steps come from the app's timer.

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

use crate::app::{App, Command};
use crate::error::{Error, Result};
use crate::timer::Clock;

#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    /// Nothing arrived before the wait ran out.
    Tick,
    /// The input side is gone; no key, including quit, can arrive anymore.
    Closed,
}

/// Where terminal input comes from.
pub trait EventSource: Send + 'static {
    fn recv_timeout(&self, timeout: Duration) -> std::result::Result<AppEvent, RecvTimeoutError>;
}

/// Reads the real terminal on a background thread. Only key presses are
/// forwarded; releases never reach the session. The channel disconnects
/// once the terminal can no longer be read.
pub struct TerminalEvents {
    rx: Receiver<AppEvent>,
}

impl TerminalEvents {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || forward_terminal_events(tx));
        Self { rx }
    }
}

fn forward_terminal_events(tx: Sender<AppEvent>) {
    loop {
        let ev = match event::read() {
            Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
            Ok(CtEvent::Resize(_, _)) => AppEvent::Resize,
            Ok(_) => continue,
            Err(e) => {
                log::error!("cannot read terminal input: {e}");
                return;
            }
        };
        if tx.send(ev).is_err() {
            return;
        }
    }
}

impl EventSource for TerminalEvents {
    fn recv_timeout(&self, timeout: Duration) -> std::result::Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Events pushed in by hand, for headless runs.
pub struct ChannelEvents {
    rx: Receiver<AppEvent>,
}

impl ChannelEvents {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }

    /// A source plus the sender that feeds it.
    pub fn pair() -> (Sender<AppEvent>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self::new(rx))
    }
}

impl EventSource for ChannelEvents {
    fn recv_timeout(&self, timeout: Duration) -> std::result::Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

pub struct EventLoop<E: EventSource> {
    source: E,
    /// Longest sleep while no countdown is pending.
    idle_wait: Duration,
}

impl<E: EventSource> EventLoop<E> {
    pub fn new(source: E, idle_wait: Duration) -> Self {
        Self { source, idle_wait }
    }

    /// Waits for input, but not past the next countdown step.
    pub fn next_event(&self, until_tick: Option<Duration>) -> AppEvent {
        let timeout = until_tick.map_or(self.idle_wait, |d| d.min(self.idle_wait));
        match self.source.recv_timeout(timeout) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => AppEvent::Tick,
            Err(RecvTimeoutError::Disconnected) => AppEvent::Closed,
        }
    }

    /// Applies one event to the app. Returns whether the screen needs a
    /// redraw, or `None` once the app should stop.
    pub fn dispatch<C: Clock>(&self, app: &mut App<C>, event: AppEvent) -> Option<bool> {
        match event {
            AppEvent::Tick => Some(app.on_tick()),
            AppEvent::Resize => Some(true),
            AppEvent::Key(key) => {
                if !app.handle(Command::from_key_event(&key)) {
                    return None;
                }
                // a key may land right on a second boundary
                app.on_tick();
                Some(true)
            }
            AppEvent::Closed => None,
        }
    }

    /// Runs until the user quits. Fails if input stops arriving, since
    /// the user would otherwise have no way out.
    pub fn run<C, F>(&self, app: &mut App<C>, mut draw: F) -> Result<()>
    where
        C: Clock,
        F: FnMut(&App<C>) -> io::Result<()>,
    {
        draw(app)?;
        loop {
            let event = self.next_event(app.until_next_tick());
            let closed = matches!(event, AppEvent::Closed);
            match self.dispatch(app, event) {
                Some(true) => draw(app)?,
                Some(false) => {}
                None if closed => {
                    log::error!("terminal input closed, leaving");
                    return Err(Error::InputClosed);
                }
                None => {
                    log::debug!("quit requested");
                    return Ok(());
                }
            }
        }
    }
}
