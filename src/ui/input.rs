/// Input state tracker.
///
/// The simulation only ever asks "is this logical action held / was it just
/// pressed"; `InputSource` is that seam. `DeviceInput` is the real source:
/// terminal keys and mouse through crossterm, plus an optional gamepad.
///
/// Terminals rarely report key releases, so a key counts as held until
/// `HOLD_TIMEOUT` passes without a Press/Repeat event for it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
};

use crate::domain::entity::FrameInput;
use super::gamepad::GamepadState;

/// After this duration without a Press/Repeat event, consider the key released.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];
const KEYS_DEBUG: &[KeyCode] = &[KeyCode::F(3), KeyCode::Tab];

/// Logical actions the game understands.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Quit,
    ToggleDebug,
}

/// Something the loop can sample once per tick.
pub trait InputSource {
    /// Gather pending device events. Called once per outer loop iteration.
    fn poll(&mut self);

    /// Is the action currently held? (continuous: movement)
    fn is_held(&self, action: Action) -> bool;

    /// Did the action start since the previous poll? (edge: toggles, quit)
    fn was_pressed(&self, action: Action) -> bool;

    /// Last known pointer position, in terminal cells.
    fn pointer(&self) -> Option<(u16, u16)> {
        None
    }

    fn frame_input(&self) -> FrameInput {
        FrameInput {
            up: self.is_held(Action::Up),
            down: self.is_held(Action::Down),
            left: self.is_held(Action::Left),
            right: self.is_held(Action::Right),
        }
    }
}

fn keys_for(action: Action) -> &'static [KeyCode] {
    match action {
        Action::Up => KEYS_UP,
        Action::Down => KEYS_DOWN,
        Action::Left => KEYS_LEFT,
        Action::Right => KEYS_RIGHT,
        Action::Quit => KEYS_QUIT,
        Action::ToggleDebug => KEYS_DEBUG,
    }
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call.
    fresh_presses: Vec<KeyCode>,

    ctrl_c: bool,
    pointer: Option<(u16, u16)>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            ctrl_c: false,
            pointer: None,
        }
    }

    /// Drain all pending terminal events and update key states.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.ctrl_c = false;

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => self.on_key(key, Instant::now()),
                Ok(Event::Mouse(m)) => {
                    if matches!(m.kind, MouseEventKind::Moved | MouseEventKind::Drag(_)) {
                        self.pointer = Some((m.column, m.row));
                    }
                }
                _ => {}
            }
        }

        // Expire keys that have timed out
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn on_key(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            self.ctrl_c = true;
            return;
        }
        match key.kind {
            KeyEventKind::Release => {
                self.last_active.remove(&key.code);
            }
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.ctrl_c
    }

    pub fn pointer(&self) -> Option<(u16, u16)> {
        self.pointer
    }
}

// ── DeviceInput: keyboard + mouse + gamepad ──

pub struct DeviceInput {
    keys: InputState,
    pad: GamepadState,
}

impl DeviceInput {
    pub fn new(pad: GamepadState) -> Self {
        DeviceInput { keys: InputState::new(), pad }
    }
}

impl InputSource for DeviceInput {
    fn poll(&mut self) {
        self.keys.drain_events();
        self.pad.update();
    }

    fn is_held(&self, action: Action) -> bool {
        let pad = self.pad.connected && match action {
            Action::Up => self.pad.up_held(),
            Action::Down => self.pad.down_held(),
            Action::Left => self.pad.left_held(),
            Action::Right => self.pad.right_held(),
            Action::Quit | Action::ToggleDebug => false,
        };
        pad || self.keys.any_held(keys_for(action))
    }

    fn was_pressed(&self, action: Action) -> bool {
        let pad = match action {
            Action::Quit => self.pad.quit_pressed(),
            Action::ToggleDebug => self.pad.debug_pressed(),
            _ => false,
        };
        let ctrl_c = action == Action::Quit && self.keys.ctrl_c_pressed();
        pad || ctrl_c || self.keys.any_pressed(keys_for(action))
    }

    fn pointer(&self) -> Option<(u16, u16)> {
        self.keys.pointer()
    }
}
