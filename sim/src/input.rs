use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Keys the pusher reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PushKey {
    /// `a`: lateral +1.
    Left,
    /// `d`: lateral -1.
    Right,
    /// `w`: depth +1.
    Forward,
    /// `s`: depth -1.
    Back,
    /// Space: toggles the force flag.
    Space,
}

impl PushKey {
    /// Raw keyboard character to key. Anything else is ignored by the caller.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'a' => Some(PushKey::Left),
            'd' => Some(PushKey::Right),
            'w' => Some(PushKey::Forward),
            's' => Some(PushKey::Back),
            ' ' => Some(PushKey::Space),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PushKey::Left => "a",
            PushKey::Right => "d",
            PushKey::Forward => "w",
            PushKey::Back => "s",
            PushKey::Space => "space",
        }
    }
}

impl fmt::Display for PushKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown key `{0}` (expected a, d, w, s or space)")]
pub struct UnknownKey(pub String);

impl FromStr for PushKey {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("space") {
            return Ok(PushKey::Space);
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                PushKey::from_char(c.to_ascii_lowercase()).ok_or_else(|| UnknownKey(s.to_string()))
            }
            _ => Err(UnknownKey(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyState {
    Down,
    Up,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: PushKey,
    pub state: KeyState,
}

impl KeyEvent {
    pub fn down(key: PushKey) -> Self {
        Self {
            key,
            state: KeyState::Down,
        }
    }

    pub fn up(key: PushKey) -> Self {
        Self {
            key,
            state: KeyState::Up,
        }
    }
}
