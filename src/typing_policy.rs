use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::session::{TimerHandle, TypingSession};

/// Letters, comma, period and whitespace. Everything else is dropped
/// without touching the session.
pub fn is_accepted_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == ',' || c == '.' || c.is_whitespace()
}

/// A key press the session understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Backspace,
}

impl KeyInput {
    /// Maps a terminal key press. Releases, repeats from other kinds and
    /// chords with Ctrl/Alt are not typing.
    pub fn from_key_event(key: &KeyEvent) -> Option<Self> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return None;
        }
        match key.code {
            KeyCode::Char(c) => Some(KeyInput::Char(c)),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            _ => None,
        }
    }

    fn starts_session(&self) -> bool {
        matches!(self, KeyInput::Char(c) if is_accepted_char(*c))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyOutcome {
    /// Set when this key began the countdown.
    pub started: Option<TimerHandle>,
    pub changed: bool,
}

/// Routes one key press into the session. The first accepted character
/// starts the test and is judged right away.
pub fn apply_key(session: &mut TypingSession, key: KeyInput) -> KeyOutcome {
    let started = if !session.has_started() && key.starts_session() {
        session.start()
    } else {
        None
    };

    if !session.is_running() {
        return KeyOutcome {
            started,
            changed: started.is_some(),
        };
    }

    let changed = match key {
        KeyInput::Char(c) => session.submit_char(c),
        KeyInput::Backspace => session.backspace(),
    };

    KeyOutcome {
        started,
        changed: changed || started.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_accepted_alphabet() {
        for c in ['a', 'Z', ',', '.', ' ', '\t', '\n'] {
            assert!(is_accepted_char(c), "{c:?} should be accepted");
        }
        for c in ['1', '\'', '-', ':', ';', '!', 'é', '?'] {
            assert!(!is_accepted_char(c), "{c:?} should be rejected");
        }
    }

    #[test]
    fn test_from_key_event() {
        let key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        assert_eq!(KeyInput::from_key_event(&key), Some(KeyInput::Char('a')));

        let key = KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT);
        assert_eq!(KeyInput::from_key_event(&key), Some(KeyInput::Char('A')));

        let key = KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE);
        assert_eq!(KeyInput::from_key_event(&key), Some(KeyInput::Backspace));
    }

    #[test]
    fn test_from_key_event_ignores_non_typing_keys() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(KeyInput::from_key_event(&key), None);

        let key = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(KeyInput::from_key_event(&key), None);

        let mut key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert_eq!(KeyInput::from_key_event(&key), None);
    }

    #[test]
    fn test_first_valid_key_starts_and_is_judged() {
        let mut session = TypingSession::new("hi");

        let outcome = apply_key(&mut session, KeyInput::Char('h'));

        assert_matches!(outcome.started, Some(_));
        assert!(outcome.changed);
        assert_eq!(session.cursor(), 1);
        assert_eq!(session.timer(), outcome.started);
    }

    #[test]
    fn test_invalid_key_does_not_start() {
        let mut session = TypingSession::new("hi");

        let outcome = apply_key(&mut session, KeyInput::Char('1'));
        assert_eq!(outcome, KeyOutcome::default());

        let outcome = apply_key(&mut session, KeyInput::Backspace);
        assert_eq!(outcome, KeyOutcome::default());
        assert!(!session.has_started());
    }

    #[test]
    fn test_invalid_key_while_running_is_dropped() {
        let mut session = TypingSession::new("hi");
        apply_key(&mut session, KeyInput::Char('h'));

        let outcome = apply_key(&mut session, KeyInput::Char('!'));

        assert_matches!(outcome, KeyOutcome { started: None, changed: false });
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn test_keys_after_finish_are_dropped() {
        let mut session = TypingSession::new("a");
        apply_key(&mut session, KeyInput::Char('a'));
        assert!(session.has_finished());

        let outcome = apply_key(&mut session, KeyInput::Backspace);
        assert!(!outcome.changed);
        assert_eq!(session.cursor(), 1);
    }
}
