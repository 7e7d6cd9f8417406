use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    poll, read, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};
use tracing::{debug, trace};

use crate::emu::{Core, Key, KeyState};
use crate::keymap::KeyLayout;
use crate::session::SharedSession;

/// What the host keyboard asked for, before any mapping onto the keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// a key that may belong to the keypad layout
    Key { code: char, state: KeyState },
    /// arm the render pump
    Start,
    /// reset the core
    Reset,
    /// load the last program file again
    Reload,
    /// log the register file
    DumpRegisters,
    Quit,
}

/// Translates host keys and delivers them straight to the core. Keys outside
/// the layout are dropped.
pub struct InputRouter<C> {
    session: SharedSession<C>,
    layout: KeyLayout,
}

impl<C: Core> InputRouter<C> {
    pub fn new(session: SharedSession<C>, layout: KeyLayout) -> Self {
        InputRouter { session, layout }
    }

    pub fn layout(&self) -> KeyLayout {
        self.layout
    }

    /// returns the keypad key the event was delivered as, if any
    pub fn key_event(&self, host: char, state: KeyState) -> Option<Key> {
        let Some(key) = self.layout.map(host) else {
            trace!(?host, "no keypad mapping, dropped");
            return None;
        };
        self.session.lock().core_mut().handle_key_event(key, state);
        Some(key)
    }
}

/// Terminals that can't report key releases only send presses and
/// auto-repeats. A key counts as held until no repeat has arrived for
/// `hold`, then a release is synthesised.
#[derive(Debug)]
pub struct KeyHold {
    hold: Duration,
    held: HashMap<char, Instant>,
}

impl KeyHold {
    pub fn new(hold: Duration) -> Self {
        KeyHold {
            hold,
            held: HashMap::new(),
        }
    }

    /// note a press or repeat; true if the key wasn't already held
    pub fn press(&mut self, code: char, now: Instant) -> bool {
        self.held.insert(code, now).is_none()
    }

    /// keys whose hold ran out, now released
    pub fn expire(&mut self, now: Instant) -> Vec<char> {
        let hold = self.hold;
        let mut expired: Vec<char> = self
            .held
            .iter()
            .filter(|(_, since)| now.saturating_duration_since(**since) >= hold)
            .map(|(code, _)| *code)
            .collect();
        expired.sort_unstable();
        for code in &expired {
            self.held.remove(code);
        }
        expired
    }

    pub fn is_held(&self, code: char) -> bool {
        self.held.contains_key(&code)
    }

    /// forget every held key without releasing it; the core's keypad was
    /// cleared underneath us
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

/// Translate one crossterm key event. `hold` is `None` when the terminal
/// reports releases itself.
pub fn translate_key_event(
    evt: KeyEvent,
    hold: Option<&mut KeyHold>,
    now: Instant,
) -> Option<HostEvent> {
    if evt.kind == KeyEventKind::Release {
        return match (evt.code, hold) {
            (KeyCode::Char(code), None) => Some(HostEvent::Key {
                code,
                state: KeyState::Released,
            }),
            _ => None,
        };
    }
    let repeat = evt.kind == KeyEventKind::Repeat;
    match evt.code {
        KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(HostEvent::Quit)
        }
        KeyCode::Esc => Some(HostEvent::Quit),
        KeyCode::Enter | KeyCode::Char(' ') if !repeat => Some(HostEvent::Start),
        KeyCode::Backspace | KeyCode::F(5) if !repeat => {
            if let Some(hold) = hold {
                hold.clear();
            }
            if evt.code == KeyCode::Backspace {
                Some(HostEvent::Reset)
            } else {
                Some(HostEvent::Reload)
            }
        }
        KeyCode::F(2) if !repeat => Some(HostEvent::DumpRegisters),
        KeyCode::Char(code) => match hold {
            Some(hold) => hold.press(code, now).then_some(HostEvent::Key {
                code,
                state: KeyState::Pressed,
            }),
            None if repeat => None,
            None => Some(HostEvent::Key {
                code,
                state: KeyState::Pressed,
            }),
        },
        _ => {
            trace!(code = ?evt.code, "unhandled key");
            None
        }
    }
}

/// simple keyboard source using crossterm on the controlling terminal
pub struct TermInput {
    hold: Option<KeyHold>,
}

impl TermInput {
    pub fn new(key_hold: Duration) -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        let reports_release = terminal::supports_keyboard_enhancement().unwrap_or(false);
        let hold = if reports_release {
            execute!(
                io::stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            None
        } else {
            Some(KeyHold::new(key_hold))
        };
        debug!(reports_release, "terminal input ready");
        Ok(TermInput { hold })
    }

    /// wait up to `timeout` for input and return everything that arrived,
    /// plus releases for keys whose hold ran out
    pub fn poll_events(&mut self, timeout: Duration) -> Result<Vec<HostEvent>, io::Error> {
        let mut events = Vec::new();
        let mut wait = timeout;
        while poll(wait)? {
            wait = Duration::ZERO;
            match read()? {
                Event::Key(evt) => {
                    let hold = self.hold.as_mut();
                    if let Some(e) = translate_key_event(evt, hold, Instant::now()) {
                        events.push(e);
                    }
                }
                other => trace!(?other, "ignored terminal event"),
            }
        }
        if let Some(hold) = self.hold.as_mut() {
            events.extend(
                hold.expire(Instant::now())
                    .into_iter()
                    .map(|code| HostEvent::Key {
                        code,
                        state: KeyState::Released,
                    }),
            );
        }
        Ok(events)
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        if self.hold.is_none() {
            let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::Chip8Machine;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_router_delivers_mapped_keys() {
        let session = SharedSession::new(Chip8Machine::new(0));
        let router = InputRouter::new(session.clone(), KeyLayout::Conventional);
        assert_eq!(router.key_event('w', KeyState::Pressed), Some(Key::Key5));
        assert_eq!(session.lock().core().key_state(Key::Key5), KeyState::Pressed);
        assert_eq!(router.key_event('w', KeyState::Released), Some(Key::Key5));
        assert_eq!(session.lock().core().key_state(Key::Key5), KeyState::Released);
    }

    #[test]
    fn test_router_drops_unmapped_keys() {
        let session = SharedSession::new(Chip8Machine::new(0));
        let router = InputRouter::new(session.clone(), KeyLayout::Conventional);
        assert_eq!(router.key_event('p', KeyState::Pressed), None);
        let s = session.lock();
        assert!(Key::ALL
            .iter()
            .all(|k| s.core().key_state(*k) == KeyState::Released));
    }

    #[test]
    fn test_key_hold_expires() {
        let start = Instant::now();
        let mut hold = KeyHold::new(Duration::from_millis(100));
        assert!(hold.press('q', start));
        assert!(!hold.press('q', start + Duration::from_millis(50)));
        assert!(hold.expire(start + Duration::from_millis(120)).is_empty());
        assert_eq!(hold.expire(start + Duration::from_millis(150)), vec!['q']);
        assert!(!hold.is_held('q'));
    }

    #[test]
    fn test_translate_with_release_reporting() {
        let now = Instant::now();
        let press = translate_key_event(key(KeyCode::Char('a'), KeyEventKind::Press), None, now);
        assert_eq!(
            press,
            Some(HostEvent::Key {
                code: 'a',
                state: KeyState::Pressed
            })
        );
        let repeat = translate_key_event(key(KeyCode::Char('a'), KeyEventKind::Repeat), None, now);
        assert_eq!(repeat, None);
        let release =
            translate_key_event(key(KeyCode::Char('a'), KeyEventKind::Release), None, now);
        assert_eq!(
            release,
            Some(HostEvent::Key {
                code: 'a',
                state: KeyState::Released
            })
        );
    }

    #[test]
    fn test_translate_with_synthesised_release() {
        let now = Instant::now();
        let mut hold = KeyHold::new(Duration::from_millis(100));
        let first = translate_key_event(
            key(KeyCode::Char('s'), KeyEventKind::Press),
            Some(&mut hold),
            now,
        );
        assert!(matches!(first, Some(HostEvent::Key { code: 's', .. })));
        let again = translate_key_event(
            key(KeyCode::Char('s'), KeyEventKind::Press),
            Some(&mut hold),
            now,
        );
        assert_eq!(again, None);
        assert!(hold.is_held('s'));
    }

    #[test]
    fn test_reset_forgets_held_keys() {
        let now = Instant::now();
        let mut hold = KeyHold::new(Duration::from_millis(100));
        let press = key(KeyCode::Char('w'), KeyEventKind::Press);
        assert!(translate_key_event(press, Some(&mut hold), now).is_some());
        let reset = translate_key_event(
            key(KeyCode::Backspace, KeyEventKind::Press),
            Some(&mut hold),
            now,
        );
        assert_eq!(reset, Some(HostEvent::Reset));
        assert!(!hold.is_held('w'));
        // still held down after the reset: the repeat counts as a fresh press
        let repeat = translate_key_event(press, Some(&mut hold), now);
        assert_eq!(
            repeat,
            Some(HostEvent::Key {
                code: 'w',
                state: KeyState::Pressed
            })
        );

        let reload = translate_key_event(
            key(KeyCode::F(5), KeyEventKind::Press),
            Some(&mut hold),
            now,
        );
        assert_eq!(reload, Some(HostEvent::Reload));
        assert!(!hold.is_held('w'));
    }

    #[test]
    fn test_translate_controls() {
        let now = Instant::now();
        let t = |code| translate_key_event(key(code, KeyEventKind::Press), None, now);
        assert_eq!(t(KeyCode::Esc), Some(HostEvent::Quit));
        assert_eq!(t(KeyCode::Enter), Some(HostEvent::Start));
        assert_eq!(t(KeyCode::Char(' ')), Some(HostEvent::Start));
        assert_eq!(t(KeyCode::Backspace), Some(HostEvent::Reset));
        assert_eq!(t(KeyCode::F(2)), Some(HostEvent::DumpRegisters));
        assert_eq!(t(KeyCode::F(5)), Some(HostEvent::Reload));
        assert_eq!(t(KeyCode::Tab), None);

        let ctrl_c = KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..key(KeyCode::Char('c'), KeyEventKind::Press)
        };
        assert_eq!(translate_key_event(ctrl_c, None, now), Some(HostEvent::Quit));
    }
}
