//! Hotkey bindings: virtual-key codes plus modifier flags
//!
//! A binding is written `Modifier[+Modifier...]+Key`, e.g. `Ctrl+Alt+F12`.
//! Key codes are Windows virtual-key codes, which is what the native
//! keyboard-hook library expects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HookError;

/// Virtual-key codes for the named keys a binding may use
pub mod vk {
    pub const BACK: u32 = 0x08;
    pub const TAB: u32 = 0x09;
    pub const RETURN: u32 = 0x0D;
    pub const PAUSE: u32 = 0x13;
    pub const ESCAPE: u32 = 0x1B;
    pub const SPACE: u32 = 0x20;
    pub const PRIOR: u32 = 0x21;
    pub const NEXT: u32 = 0x22;
    pub const END: u32 = 0x23;
    pub const HOME: u32 = 0x24;
    pub const LEFT: u32 = 0x25;
    pub const UP: u32 = 0x26;
    pub const RIGHT: u32 = 0x27;
    pub const DOWN: u32 = 0x28;
    pub const SNAPSHOT: u32 = 0x2C;
    pub const INSERT: u32 = 0x2D;
    pub const DELETE: u32 = 0x2E;
    /// `0`..`9` share their ASCII codes
    pub const KEY_0: u32 = 0x30;
    /// `A`..`Z` share their uppercase ASCII codes
    pub const KEY_A: u32 = 0x41;
    /// `F1`..`F24` are contiguous
    pub const F1: u32 = 0x70;
    pub const F24: u32 = 0x87;
}

/// Canonical names for non-alphanumeric keys, first spelling wins on display
const NAMED_KEYS: &[(&str, u32)] = &[
    ("Space", vk::SPACE),
    ("Enter", vk::RETURN),
    ("Return", vk::RETURN),
    ("Escape", vk::ESCAPE),
    ("Esc", vk::ESCAPE),
    ("Tab", vk::TAB),
    ("Backspace", vk::BACK),
    ("Delete", vk::DELETE),
    ("Del", vk::DELETE),
    ("Insert", vk::INSERT),
    ("Ins", vk::INSERT),
    ("Home", vk::HOME),
    ("End", vk::END),
    ("PageUp", vk::PRIOR),
    ("Page_Up", vk::PRIOR),
    ("PageDown", vk::NEXT),
    ("Page_Down", vk::NEXT),
    ("Left", vk::LEFT),
    ("Up", vk::UP),
    ("Right", vk::RIGHT),
    ("Down", vk::DOWN),
    ("Pause", vk::PAUSE),
    ("PrintScreen", vk::SNAPSHOT),
    ("PrtSc", vk::SNAPSHOT),
];

/// Modifier keys that must be held for the hotkey to fire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    /// Either ALT key
    pub alt: bool,
    /// Either CTRL key
    pub control: bool,
    /// Either SHIFT key
    pub shift: bool,
    /// Either Windows logo key
    pub win: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        alt: false,
        control: false,
        shift: false,
        win: false,
    };

    /// Check if no modifier is required
    pub fn is_empty(&self) -> bool {
        !self.alt && !self.control && !self.shift && !self.win
    }

    /// Set the flag named by `name`, rejecting unknown or repeated modifiers
    fn insert(&mut self, name: &str) -> Result<(), HookError> {
        let flag = match name.to_ascii_lowercase().as_str() {
            "alt" => &mut self.alt,
            "ctrl" | "control" => &mut self.control,
            "shift" => &mut self.shift,
            "win" | "super" | "meta" => &mut self.win,
            _ => {
                return Err(HookError::InvalidBinding(format!(
                    "unknown modifier: {name:?}"
                )))
            }
        };
        if *flag {
            return Err(HookError::InvalidBinding(format!(
                "repeated modifier: {name:?}"
            )));
        }
        *flag = true;
        Ok(())
    }
}

/// A global hotkey: one virtual key plus the modifiers held with it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hotkey {
    /// Windows virtual-key code, always within `VALID_KEY_CODES`
    virtual_key: u32,
    modifiers: Modifiers,
}

/// Virtual-key codes the native library accepts
pub const VALID_KEY_CODES: std::ops::RangeInclusive<u32> = 0x01..=0xFE;

impl Hotkey {
    /// Build a hotkey from a raw virtual-key code
    pub fn new(virtual_key: u32, modifiers: Modifiers) -> Result<Self, HookError> {
        if !VALID_KEY_CODES.contains(&virtual_key) {
            return Err(HookError::InvalidBinding(format!(
                "virtual-key code 0x{virtual_key:X} out of range"
            )));
        }
        Ok(Self {
            virtual_key,
            modifiers,
        })
    }

    /// Windows virtual-key code
    pub fn virtual_key(&self) -> u32 {
        self.virtual_key
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }
}

impl FromStr for Hotkey {
    type Err = HookError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(HookError::InvalidBinding("empty binding".into()));
        }

        let parts: Vec<&str> = spec.split('+').map(str::trim).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(HookError::InvalidBinding(format!(
                "empty component in {spec:?}"
            )));
        }

        // Last part is the key, everything before it is a modifier.
        let (modifier_parts, key_part) = parts.split_at(parts.len() - 1);
        let mut modifiers = Modifiers::NONE;
        for name in modifier_parts {
            modifiers.insert(name)?;
        }

        let virtual_key = parse_key(key_part[0])
            .ok_or_else(|| HookError::InvalidBinding(format!("unknown key: {:?}", key_part[0])))?;

        Ok(Self {
            virtual_key,
            modifiers,
        })
    }
}

impl TryFrom<String> for Hotkey {
    type Error = HookError;

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
        let m = &self.modifiers;
        for (held, name) in [
            (m.control, "Ctrl"),
            (m.alt, "Alt"),
            (m.shift, "Shift"),
            (m.win, "Win"),
        ] {
            if held {
                write!(f, "{name}+")?;
            }
        }
        write_key(f, self.virtual_key)
    }
}

/// Map a key name to its virtual-key code
fn parse_key(name: &str) -> Option<u32> {
    if name.len() == 1 {
        let ch = name.chars().next()?;
        if ch.is_ascii_alphabetic() {
            return Some(ch.to_ascii_uppercase() as u32);
        }
        if ch.is_ascii_digit() {
            return Some(ch as u32);
        }
    }

    if let Some(rest) = name.strip_prefix(['F', 'f']) {
        if let Ok(n) = rest.parse::<u32>() {
            return (1..=24).contains(&n).then(|| vk::F1 + n - 1);
        }
    }

    // Raw codes: `0x7B` or `vk123`.
    let raw = if let Some(hex) = name.strip_prefix("0x").or_else(|| name.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(dec) = name.strip_prefix("vk").or_else(|| name.strip_prefix("VK")) {
        dec.parse::<u32>().ok()
    } else {
        None
    };
    if let Some(code) = raw {
        return VALID_KEY_CODES.contains(&code).then_some(code);
    }

    NAMED_KEYS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, code)| code)
}

fn write_key(f: &mut fmt::Formatter<'_>, code: u32) -> fmt::Result {
    match code {
        c if (vk::KEY_A..vk::KEY_A + 26).contains(&c) || (vk::KEY_0..vk::KEY_0 + 10).contains(&c) => {
            // Both ranges are plain ASCII.
            write!(f, "{}", char::from(c as u8))
        }
        c if (vk::F1..=vk::F24).contains(&c) => write!(f, "F{}", c - vk::F1 + 1),
        c => match NAMED_KEYS.iter().find(|&&(_, code)| code == c) {
            Some((name, _)) => f.write_str(name),
            None => write!(f, "0x{c:02X}"),
        },
    }
}
