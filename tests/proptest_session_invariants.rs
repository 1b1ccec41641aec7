//! Property-based invariant tests for `TypingSession`.
//!
//! Arbitrary key sequences (accepted characters, rejected characters and
//! backspaces), sometimes interleaved with countdown ticks, are fed
//! through `apply_key` against arbitrary passages. After every step:
//!
//! 1. The cursor equals accepted submissions minus effective backspaces
//! 2. The cursor never passes the end of the text
//! 3. Mistakes equal the number of incorrect judgments
//! 4. Backspace then retyping the same character restores the snapshot
//! 5. Rejected characters leave the session untouched
//! 6. Nothing changes once the session has finished

use proptest::prelude::*;

use typesprint::typing_policy::{apply_key, is_accepted_char, KeyInput};
use typesprint::{Judgment, Phase, TimerHandle, TypingSession};

// ── Strategies ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Op {
    Key(KeyInput),
    Tick,
}

fn text_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z., ]{1,40}"
}

fn accepted_char() -> impl Strategy<Value = char> {
    prop::sample::select("abcxyzABCXYZ., ".chars().collect::<Vec<_>>())
}

fn rejected_char() -> impl Strategy<Value = char> {
    prop::sample::select(vec!['1', '9', ';', '-', '\'', '?', '!', '(', 'é'])
}

fn key_strategy() -> impl Strategy<Value = KeyInput> {
    prop_oneof![
        5 => accepted_char().prop_map(KeyInput::Char),
        1 => rejected_char().prop_map(KeyInput::Char),
        2 => Just(KeyInput::Backspace),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        8 => key_strategy().prop_map(Op::Key),
        1 => Just(Op::Tick),
    ]
}

// ── Reference model ─────────────────────────────────────────────────────

/// What a session should look like, tracked independently of its
/// implementation: one flag per typed position, true when it matched.
struct Model {
    text: Vec<char>,
    typed: Vec<bool>,
    remaining: u32,
    started: bool,
}

impl Model {
    fn new(text: &str, duration_secs: u32) -> Self {
        Self {
            text: text.chars().collect(),
            typed: Vec::new(),
            remaining: duration_secs,
            started: false,
        }
    }

    fn finished(&self) -> bool {
        self.typed.len() == self.text.len() || (self.started && self.remaining == 0)
    }

    fn running(&self) -> bool {
        self.started && !self.finished()
    }

    fn key(&mut self, key: KeyInput) {
        if !self.started && matches!(key, KeyInput::Char(c) if is_accepted_char(c)) {
            self.started = true;
        }
        if !self.running() {
            return;
        }
        match key {
            KeyInput::Char(c) if is_accepted_char(c) => {
                let expected = self.text[self.typed.len()];
                self.typed.push(c == expected);
            }
            KeyInput::Char(_) => {}
            KeyInput::Backspace => {
                self.typed.pop();
            }
        }
    }

    fn tick(&mut self) {
        if self.running() {
            self.remaining -= 1;
        }
    }

    fn mistakes(&self) -> usize {
        self.typed.iter().filter(|ok| !**ok).count()
    }
}

/// Applies one op to both, remembering the countdown handle once started.
fn step(session: &mut TypingSession, model: &mut Model, handle: &mut Option<TimerHandle>, op: Op) {
    match op {
        Op::Key(key) => {
            if let Some(started) = apply_key(session, key).started {
                *handle = Some(started);
            }
            model.key(key);
        }
        Op::Tick => {
            if let Some(h) = *handle {
                session.tick(h);
            }
            model.tick();
        }
    }
}

fn assert_matches_model(session: &TypingSession, model: &Model) -> Result<(), TestCaseError> {
    let snapshot = session.snapshot();

    prop_assert_eq!(session.cursor(), model.typed.len());
    prop_assert!(session.cursor() <= model.text.len());
    prop_assert_eq!(session.mistakes(), model.mistakes());

    let incorrect = snapshot
        .judgments
        .iter()
        .filter(|j| **j == Judgment::Incorrect)
        .count();
    prop_assert_eq!(session.mistakes(), incorrect);

    for (idx, judgment) in snapshot.judgments.iter().enumerate() {
        let expected = match model.typed.get(idx) {
            Some(true) => Judgment::Correct,
            Some(false) => Judgment::Incorrect,
            None => Judgment::Unvisited,
        };
        prop_assert_eq!(*judgment, expected, "position {}", idx);
    }

    prop_assert_eq!(snapshot.remaining_secs, model.remaining);
    prop_assert_eq!(snapshot.finished, model.finished());
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
// 1-3. Cursor, bounds and mistakes track the model after every step
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn every_step_matches_the_model(
        text in text_strategy(),
        ops in prop::collection::vec(op_strategy(), 0..200),
    ) {
        let mut session = TypingSession::new(text.as_str());
        let mut model = Model::new(&text, session.duration_secs());
        let mut handle = None;

        for op in ops {
            step(&mut session, &mut model, &mut handle, op);
            assert_matches_model(&session, &model)?;
        }
    }

    #[test]
    fn short_countdowns_match_the_model(
        text in text_strategy(),
        duration in 1u32..8,
        ops in prop::collection::vec(op_strategy(), 0..120),
    ) {
        let mut session = TypingSession::with_duration(text.as_str(), duration);
        let mut model = Model::new(&text, duration);
        let mut handle = None;

        for op in ops {
            step(&mut session, &mut model, &mut handle, op);
            assert_matches_model(&session, &model)?;
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 4. Backspace then retype is reversible
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn backspace_then_retype_restores_snapshot(
        text in text_strategy(),
        keys in prop::collection::vec(key_strategy(), 1..80),
    ) {
        let mut session = TypingSession::new(text.as_str());
        for key in keys {
            apply_key(&mut session, key);

            if session.phase() != Phase::Running || session.cursor() == 0 {
                continue;
            }
            let before = session.snapshot();
            let last = session.input()[session.cursor() - 1].char;

            prop_assert!(apply_key(&mut session, KeyInput::Backspace).changed);
            prop_assert!(apply_key(&mut session, KeyInput::Char(last)).changed);
            prop_assert_eq!(session.snapshot(), before);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 5. Rejected characters are inert
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn rejected_chars_change_nothing(
        text in text_strategy(),
        keys in prop::collection::vec(key_strategy(), 0..60),
        rejected in rejected_char(),
    ) {
        let mut session = TypingSession::new(text.as_str());
        for key in keys {
            apply_key(&mut session, key);
        }
        let before = session.snapshot();

        let outcome = apply_key(&mut session, KeyInput::Char(rejected));

        prop_assert!(!outcome.changed);
        prop_assert!(outcome.started.is_none());
        prop_assert_eq!(session.snapshot(), before);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 6. Finished is terminal
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn finished_session_is_frozen(
        text in "[a-z]{1,12}",
        after in prop::collection::vec(op_strategy(), 1..40),
    ) {
        let mut session = TypingSession::with_duration(text.as_str(), 5);
        let mut handle = None;
        for c in text.chars() {
            if let Some(started) = apply_key(&mut session, KeyInput::Char(c)).started {
                handle = Some(started);
            }
        }
        prop_assert_eq!(session.phase(), Phase::Finished);
        let frozen = session.snapshot();

        for op in after {
            match op {
                Op::Key(key) => {
                    let outcome = apply_key(&mut session, key);
                    prop_assert!(!outcome.changed);
                }
                Op::Tick => {
                    if let Some(h) = handle {
                        prop_assert!(!session.tick(h));
                    }
                }
            }
            prop_assert_eq!(session.snapshot(), frozen.clone());
        }
    }
}
