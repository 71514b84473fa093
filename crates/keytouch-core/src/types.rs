use crate::error::HotkeyError;
use crate::keymap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

/// Screen position in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Inclusive pixel rectangle reported as a contact's area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn around(center: Point, radius: i32) -> Self {
        Self {
            left: center.x - radius,
            top: center.y - radius,
            right: center.x + radius,
            bottom: center.y + radius,
        }
    }
}

/// A configured set of keys that map to one contact while held together.
/// Members are stored sorted and unique so that equality ignores order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Chord {
    members: Vec<String>,
}

impl Chord {
    /// Returns `None` if fewer than two distinct keys remain after normalisation.
    pub fn new<I, S>(keys: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut members: Vec<String> = keys
            .into_iter()
            .map(|k| keymap::normalize_key_name(k.as_ref()))
            .filter(|k| !k.is_empty())
            .collect();
        members.sort();
        members.dedup();
        if members.len() < 2 {
            return None;
        }
        Some(Self { members })
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn contains(&self, key: &str) -> bool {
        self.members.binary_search_by(|m| m.as_str().cmp(key)).is_ok()
    }

    /// Members other than `key`.
    pub fn others<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.members
            .iter()
            .map(String::as_str)
            .filter(move |m| *m != key)
    }
}

/// Logical identity of a contact: one key or one configured chord.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyId {
    Atom(String),
    Chord(Chord),
}

impl KeyId {
    pub fn atom(name: &str) -> Self {
        Self::Atom(keymap::normalize_key_name(name))
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Self::Atom(name) => Some(name),
            Self::Chord(_) => None,
        }
    }

    pub fn as_chord(&self) -> Option<&Chord> {
        match self {
            Self::Atom(_) => None,
            Self::Chord(chord) => Some(chord),
        }
    }

    /// True if `key` is this atom, or one of this chord's members.
    pub fn involves(&self, key: &str) -> bool {
        match self {
            Self::Atom(name) => name == key,
            Self::Chord(chord) => chord.contains(key),
        }
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(name) => write!(f, "{}", name),
            Self::Chord(chord) => write!(f, "({})", chord.members.join("+")),
        }
    }
}

/// Pointer transition bitmask, bit-compatible with the Win32 `POINTER_FLAG_*` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PointerFlags(u32);

impl PointerFlags {
    pub const NONE: Self = Self(0x0000_0000);
    pub const IN_RANGE: Self = Self(0x0000_0002);
    pub const IN_CONTACT: Self = Self(0x0000_0004);
    pub const CANCELED: Self = Self(0x0000_8000);
    pub const DOWN: Self = Self(0x0001_0000);
    pub const UPDATE: Self = Self(0x0002_0000);
    pub const UP: Self = Self(0x0004_0000);

    /// New finger on the surface.
    pub const STARTING: Self = Self(Self::DOWN.0 | Self::IN_RANGE.0 | Self::IN_CONTACT.0);
    /// Finger still down, re-asserted.
    pub const CONTINUING: Self = Self(Self::UPDATE.0 | Self::IN_RANGE.0 | Self::IN_CONTACT.0);
    /// Finger lifted normally.
    pub const NATURAL_END: Self = Self(Self::UP.0 | Self::IN_RANGE.0);
    /// Contact ended without completing a gesture.
    pub const SUPERSEDED_END: Self = Self(Self::UP.0 | Self::CANCELED.0);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_ending(self) -> bool {
        self.0 & Self::UP.0 != 0
    }
}

impl BitOr for PointerFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for PointerFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: &[(PointerFlags, &str)] = &[
            (PointerFlags::DOWN, "DOWN"),
            (PointerFlags::IN_RANGE, "INRANGE"),
            (PointerFlags::IN_CONTACT, "INCONTACT"),
            (PointerFlags::UPDATE, "UPDATE"),
            (PointerFlags::UP, "UP"),
            (PointerFlags::CANCELED, "CANCELED"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            f.write_str("0")
        } else {
            f.write_str(&names.join(" | "))
        }
    }
}

/// One synthesized finger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub key: KeyId,
    pub pointer_id: u32,
    pub point: Point,
    pub flags: PointerFlags,
}

impl Contact {
    pub fn record(&self, radius: i32) -> ContactRecord {
        ContactRecord {
            pointer_id: self.pointer_id,
            flags: self.flags,
            point: self.point,
            area: Rect::around(self.point, radius),
        }
    }
}

/// What the platform receives for one contact in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactRecord {
    pub pointer_id: u32,
    pub flags: PointerFlags,
    pub point: Point,
    pub area: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdge {
    Down,
    Up,
}

/// A physical key transition, named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub edge: KeyEdge,
}

impl KeyEvent {
    pub fn down(key: &str) -> Self {
        Self {
            key: keymap::normalize_key_name(key),
            edge: KeyEdge::Down,
        }
    }

    pub fn up(key: &str) -> Self {
        Self {
            key: keymap::normalize_key_name(key),
            edge: KeyEdge::Up,
        }
    }
}

/// Message from the keyboard listener to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    Key(KeyEvent),
    Quit,
}

/// Modifier keys applied to a keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub win: bool,
}

impl Modifiers {
    pub const fn none() -> Self {
        Self {
            ctrl: false,
            shift: false,
            alt: false,
            win: false,
        }
    }

    pub const fn is_empty(self) -> bool {
        !(self.ctrl || self.shift || self.alt || self.win)
    }

    /// True if every modifier required by `self` is present in `held`.
    pub const fn satisfied_by(self, held: Modifiers) -> bool {
        (!self.ctrl || held.ctrl)
            && (!self.shift || held.shift)
            && (!self.alt || held.alt)
            && (!self.win || held.win)
    }
}

/// Key plus modifiers, written as `ctrl+q`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hotkey {
    pub mods: Modifiers,
    pub key: String,
}

impl Hotkey {
    pub fn matches(&self, key: &str, held: Modifiers) -> bool {
        self.key == key && self.mods.satisfied_by(held)
    }
}

impl Default for Hotkey {
    fn default() -> Self {
        Self {
            mods: Modifiers {
                ctrl: true,
                ..Modifiers::none()
            },
            key: "q".to_string(),
        }
    }
}

impl FromStr for Hotkey {
    type Err = HotkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut mods = Modifiers::none();
        let mut key = None;
        for part in s.split('+').map(str::trim) {
            match part.to_ascii_lowercase().as_str() {
                "" => return Err(HotkeyError::EmptyPart(s.to_string())),
                "ctrl" | "control" => mods.ctrl = true,
                "shift" => mods.shift = true,
                "alt" => mods.alt = true,
                "win" | "windows" | "super" => mods.win = true,
                other => {
                    if key.is_some() {
                        return Err(HotkeyError::MultipleKeys(s.to_string()));
                    }
                    let name = keymap::normalize_key_name(other);
                    if keymap::key_name_to_vk(&name).is_none() {
                        return Err(HotkeyError::UnknownKey(name));
                    }
                    key = Some(name);
                }
            }
        }
        let key = key.ok_or_else(|| HotkeyError::MissingKey(s.to_string()))?;
        Ok(Self { mods, key })
    }
}

impl TryFrom<String> for Hotkey {
    type Error = HotkeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Hotkey> for String {
    fn from(hotkey: Hotkey) -> Self {
        hotkey.to_string()
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mods.ctrl {
            f.write_str("ctrl+")?;
        }
        if self.mods.shift {
            f.write_str("shift+")?;
        }
        if self.mods.alt {
            f.write_str("alt+")?;
        }
        if self.mods.win {
            f.write_str("win+")?;
        }
        f.write_str(&self.key)
    }
}
