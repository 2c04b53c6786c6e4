/// Keyboard input tracker.
///
/// The engine only wants edges: "was this direction pressed this tick".
/// Terminals report a held key as a stream of Press/Repeat events, so a
/// key counts as fresh only when it was not already considered held.
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};

use crate::domain::grid::Direction;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// First direction reported by `pressed`, in priority Up, Down, Left, Right.
pub fn first_direction(pressed: impl Fn(Direction) -> bool) -> Option<Direction> {
    Direction::ALL.into_iter().find(|&d| pressed(d))
}

/// Keys bound to each direction: arrows, WASD and vi keys.
fn direction_keys(dir: Direction) -> [KeyCode; 3] {
    match dir {
        Direction::Up => [KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('k')],
        Direction::Down => [KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('j')],
        Direction::Left => [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('h')],
        Direction::Right => [KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('l')],
    }
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the last drain.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Ask the terminal to report key releases. Without support the hold
    /// timeout stays in charge.
    pub fn enable_release_events(&mut self) {
        match terminal::supports_keyboard_enhancement() {
            Ok(true) => {}
            Ok(false) => {
                log::info!("no keyboard enhancement, releases inferred from timeout");
                return;
            }
            Err(e) => {
                log::warn!("keyboard enhancement query failed: {e}");
                return;
            }
        }
        let flags = KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
        match execute!(io::stdout(), PushKeyboardEnhancementFlags(flags)) {
            Ok(()) => self.honor_release = true,
            Err(e) => log::warn!("could not enable key release events: {e}"),
        }
    }

    /// Undo `enable_release_events`. Call before leaving the terminal.
    pub fn disable_release_events(&mut self) {
        if !self.honor_release {
            return;
        }
        self.honor_release = false;
        if let Err(e) = execute!(io::stdout(), PopKeyboardEnhancementFlags) {
            log::warn!("could not restore keyboard mode: {e}");
        }
    }

    /// Drain all pending terminal events. Call once per tick, before `step`.
    pub fn drain_events(&mut self) {
        self.begin_frame();
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.feed(key, Instant::now());
            }
        }
        self.expire(Instant::now());
    }

    fn begin_frame(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
    }

    fn feed(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            // Without enhancement, releases are inferred from the timeout
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held_at(key.code, now);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    fn expire(&mut self, now: Instant) {
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    /// Was this key freshly pressed this tick?
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// The direction freshly pressed this tick, if any.
    pub fn direction(&self) -> Option<Direction> {
        first_direction(|d| self.any_pressed(&direction_keys(d)))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active
            .get(&code)
            .map(|t| now.duration_since(*t) < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}
