use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::typing_policy::is_accepted_char;

/// Length of a test when nothing else is configured.
pub const DEFAULT_DURATION_SECS: u32 = 60;

/// Characters per word when converting cpm to wpm.
const CHARS_PER_WORD: f64 = 5.0;

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// What the user typed at one position of the text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Input {
    pub char: char,
    pub outcome: Outcome,
}

/// Per-position projection of the typed input onto the text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Judgment {
    Unvisited,
    Correct,
    Incorrect,
}

impl From<Outcome> for Judgment {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Correct => Judgment::Correct,
            Outcome::Incorrect => Judgment::Incorrect,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[strum(serialize = "ready")]
    NotStarted,
    #[strum(serialize = "running")]
    Running,
    #[strum(serialize = "finished")]
    Finished,
}

/// Identity of one countdown.
///
/// Handed out by [`TypingSession::start`]; a tick is only applied when it
/// carries the handle of the countdown that is currently running. Handles
/// are unique for the lifetime of the process, so a handle kept from a
/// previous session can never match a new one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    fn next() -> Self {
        Self(NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub chars_per_minute: f64,
    pub words_per_minute: f64,
    pub accuracy: f64,
}

/// Everything a presentation layer needs to draw the session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub cursor: usize,
    pub judgments: Vec<Judgment>,
    pub mistakes: usize,
    pub remaining_secs: u32,
    pub phase: Phase,
    pub finished: bool,
    pub metrics: Metrics,
}

/// A single timed typing test over a fixed text.
#[derive(Debug, Clone)]
pub struct TypingSession {
    text: Vec<char>,
    input: Vec<Input>,
    mistakes: usize,
    duration_secs: u32,
    remaining_secs: u32,
    started: bool,
    finished: bool,
    timer: Option<TimerHandle>,
}

impl TypingSession {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_duration(text, DEFAULT_DURATION_SECS)
    }

    pub fn with_duration(text: impl Into<String>, duration_secs: u32) -> Self {
        let text: Vec<char> = text.into().chars().collect();
        let finished = text.is_empty();
        Self {
            text,
            input: Vec::new(),
            mistakes: 0,
            duration_secs,
            remaining_secs: duration_secs,
            started: false,
            finished,
            timer: None,
        }
    }

    /// Begins the countdown. Returns the handle the caller's timer must
    /// present on every tick, or `None` if the session already started or
    /// cannot start.
    pub fn start(&mut self) -> Option<TimerHandle> {
        if self.started || self.finished {
            return None;
        }
        self.started = true;
        if self.remaining_secs == 0 {
            self.finish();
            return None;
        }
        let handle = TimerHandle::next();
        self.timer = Some(handle);
        Some(handle)
    }

    /// Applies one elapsed second. Returns false (and changes nothing) when
    /// `handle` is not the running countdown.
    pub fn tick(&mut self, handle: TimerHandle) -> bool {
        if self.timer != Some(handle) || self.finished {
            return false;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.finish();
        }
        true
    }

    /// Judges `c` against the character under the cursor and advances.
    pub fn submit_char(&mut self, c: char) -> bool {
        if !self.is_running() || !is_accepted_char(c) {
            return false;
        }
        let Some(expected) = self.expected_char(self.cursor()) else {
            return false;
        };

        let outcome = if c == expected {
            Outcome::Correct
        } else {
            self.mistakes += 1;
            Outcome::Incorrect
        };
        self.input.push(Input { char: c, outcome });

        if self.cursor() == self.text.len() {
            self.finish();
        }
        true
    }

    /// Steps the cursor back one position, forgetting what was typed there.
    pub fn backspace(&mut self) -> bool {
        if self.finished {
            return false;
        }
        match self.input.pop() {
            Some(Input {
                outcome: Outcome::Incorrect,
                ..
            }) => {
                self.mistakes -= 1;
                true
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Replaces this session with a fresh one over `text`. The running
    /// countdown, if any, is stopped and its handle becomes stale.
    pub fn reset(&mut self, text: impl Into<String>) {
        self.stop_timer();
        *self = Self::with_duration(text, self.duration_secs);
    }

    pub fn metrics(&self) -> Metrics {
        let correct = self.correct_count() as f64;
        let typed = self.input.len();
        let accuracy = if typed == 0 {
            100.0
        } else {
            (correct / typed as f64 * 100.0).round()
        };

        let elapsed = self.elapsed_secs();
        if elapsed == 0 {
            return Metrics {
                accuracy,
                ..Metrics::default()
            };
        }

        let chars_per_minute = correct / elapsed as f64 * 60.0;
        Metrics {
            chars_per_minute,
            words_per_minute: chars_per_minute / CHARS_PER_WORD,
            accuracy,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            cursor: self.cursor(),
            judgments: (0..self.text.len()).map(|i| self.judgment(i)).collect(),
            mistakes: self.mistakes,
            remaining_secs: self.remaining_secs,
            phase: self.phase(),
            finished: self.finished,
            metrics: self.metrics(),
        }
    }

    pub fn judgment(&self, idx: usize) -> Judgment {
        self.input
            .get(idx)
            .map_or(Judgment::Unvisited, |i| i.outcome.into())
    }

    pub fn phase(&self) -> Phase {
        if self.finished {
            Phase::Finished
        } else if self.started {
            Phase::Running
        } else {
            Phase::NotStarted
        }
    }

    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    pub fn chars(&self) -> &[char] {
        &self.text
    }

    pub fn input(&self) -> &[Input] {
        &self.input
    }

    pub fn expected_char(&self, idx: usize) -> Option<char> {
        self.text.get(idx).copied()
    }

    pub fn cursor(&self) -> usize {
        self.input.len()
    }

    pub fn mistakes(&self) -> usize {
        self.mistakes
    }

    pub fn correct_count(&self) -> usize {
        self.input
            .iter()
            .filter(|i| i.outcome == Outcome::Correct)
            .count()
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.duration_secs - self.remaining_secs
    }

    pub fn timer(&self) -> Option<TimerHandle> {
        self.timer
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn has_finished(&self) -> bool {
        self.finished
    }

    pub fn is_running(&self) -> bool {
        self.started && !self.finished
    }

    fn finish(&mut self) {
        self.finished = true;
        self.stop_timer();
    }

    fn stop_timer(&mut self) {
        self.timer = None;
    }
}
