//! Keyboard input mapping and held-direction tracking.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Movement keys currently held down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeldDirections {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl HeldDirections {
    #[must_use]
    pub const fn none() -> Self {
        Self {
            up: false,
            down: false,
            left: false,
            right: false,
        }
    }

    pub const fn set(&mut self, direction: Direction, held: bool) {
        match direction {
            Direction::Up => self.up = held,
            Direction::Down => self.down = held,
            Direction::Left => self.left = held,
            Direction::Right => self.right = held,
        }
    }

    #[must_use]
    pub const fn with(mut self, direction: Direction) -> Self {
        self.set(direction, true);
        self
    }

    #[must_use]
    pub const fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    /// Unit step per axis; opposing keys cancel.
    #[must_use]
    pub fn axes(&self) -> (f32, f32) {
        let x = f32::from(u8::from(self.right)) - f32::from(u8::from(self.left));
        let y = f32::from(u8::from(self.down)) - f32::from(u8::from(self.up));
        (x, y)
    }
}

/// Discrete and held inputs the simulation understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Move(Direction),
    Pause,
    Interact,
    /// One-based choice number as printed on the key.
    Choice(u8),
    Acknowledge,
}

impl Key {
    /// Map a `KeyboardEvent.key` style name; case-insensitive.
    #[must_use]
    pub fn from_key_name(name: &str) -> Option<Self> {
        let lowered = name.to_ascii_lowercase();
        let key = match lowered.as_str() {
            "w" | "arrowup" => Self::Move(Direction::Up),
            "s" | "arrowdown" => Self::Move(Direction::Down),
            "a" | "arrowleft" => Self::Move(Direction::Left),
            "d" | "arrowright" => Self::Move(Direction::Right),
            "p" => Self::Pause,
            "e" => Self::Interact,
            " " | "space" | "enter" => Self::Acknowledge,
            other => return numeric_key_to_index(other).map(Self::Choice),
        };
        Some(key)
    }

    /// Map a layout-independent `KeyboardEvent.code` such as `KeyW` or `Digit3`.
    #[must_use]
    pub fn from_key_code(code: &str) -> Option<Self> {
        let key = match code {
            "KeyW" | "ArrowUp" => Self::Move(Direction::Up),
            "KeyS" | "ArrowDown" => Self::Move(Direction::Down),
            "KeyA" | "ArrowLeft" => Self::Move(Direction::Left),
            "KeyD" | "ArrowRight" => Self::Move(Direction::Right),
            "KeyP" => Self::Pause,
            "KeyE" => Self::Interact,
            "Space" | "Enter" | "NumpadEnter" => Self::Acknowledge,
            other => return numeric_code_to_index(other).map(Self::Choice),
        };
        Some(key)
    }
}

/// Single digit key, `Some(0..=9)`.
#[must_use]
pub fn numeric_key_to_index(key: &str) -> Option<u8> {
    let mut chars = key.chars();
    let digit = chars.next()?.to_digit(10)?;
    if chars.next().is_some() {
        return None;
    }
    u8::try_from(digit).ok()
}

/// Digit row or numpad code, `Digit3` or `Numpad5`.
#[must_use]
pub fn numeric_code_to_index(code: &str) -> Option<u8> {
    let digits = code
        .strip_prefix("Digit")
        .or_else(|| code.strip_prefix("Numpad"))?;
    numeric_key_to_index(digits)
}
