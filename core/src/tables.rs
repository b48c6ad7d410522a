//! Static translation tables between preset byte codes and the names
//! shown to the user.
//!
//! Forward lookups index directly into const arrays (codes are dense),
//! reverse lookups go through case-insensitive maps built once on first use.

use std::collections::HashMap;
use bitflags::bitflags;
use once_cell::sync::Lazy;

pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"
];

/// Semitones-in-octave of the white keys
pub const WHITE_KEYS: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

pub const MAX_NOTE: u8 = 127;
pub const MIN_OCTAVE: i32 = -1;
pub const MAX_OCTAVE: i32 = 9;

pub const COLORS: [&str; 17] = [
    "Off", "Red", "Orange", "Amber", "Yellow", "Green", "Green_Blue", "Aqua",
    "Light_Blue", "Blue", "Purple", "Pink", "Hot_Pink", "Pastel_Purple",
    "Pastel_Green", "Pastel_Pink", "Grey"
];

pub const KEYS: [&str; 0x54] = [
    // 0x00
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "0",
    // 0x0a
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M",
    "N", "O", "P", "Q", "R", "S", "T", "U", "V", "W", "X", "Y", "Z",
    // 0x24
    "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12",
    // 0x30
    "Backspace", "Return", "Up", "Down", "Left", "Right", "Tab",
    ",", ".", "/", "[", "]", "\\", "'", ";", "-", "=",
    // 0x41
    "Esc", "Insert", "Home", "Page Up", "Delete", "End", "Page Down",
    // 0x48
    "Num 1", "Num 2", "Num 3", "Num 4", "Num 5", "Num 6", "Num 7", "Num 8",
    "Num 9", "Num 0",
    // 0x52
    "(", " "
];

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const CONTROL = 0x01;
        const SHIFT   = 0x02;
        const ALT     = 0x04;
        const OPTION  = 0x08;
    }
}

/// Modifier combinations in preset byte order. Not every combination
/// exists on the device (e.g. Shift-Alt-Option has no code).
pub const MODIFIER_CODES: [Modifiers; 15] = [
    Modifiers::empty(),
    Modifiers::CONTROL,
    Modifiers::SHIFT,
    Modifiers::ALT,
    Modifiers::OPTION,
    Modifiers::CONTROL.union(Modifiers::SHIFT),
    Modifiers::CONTROL.union(Modifiers::ALT),
    Modifiers::CONTROL.union(Modifiers::OPTION),
    Modifiers::SHIFT.union(Modifiers::ALT),
    Modifiers::SHIFT.union(Modifiers::OPTION),
    Modifiers::ALT.union(Modifiers::OPTION),
    Modifiers::CONTROL.union(Modifiers::SHIFT).union(Modifiers::ALT),
    Modifiers::CONTROL.union(Modifiers::OPTION).union(Modifiers::ALT),
    Modifiers::CONTROL.union(Modifiers::SHIFT).union(Modifiers::OPTION),
    Modifiers::all(),
];

pub const MODIFIER_NAMES: [&str; 15] = [
    "None", "Control", "Shift", "Alt", "Option",
    "Control-Shift", "Control-Alt", "Control-Option", "Shift-Alt",
    "Shift-Option", "Alt-Option", "Control-Shift-Alt", "Control-Option-Alt",
    "Control-Shift-Option", "Control-Shift-Alt-Option"
];

pub const AFTERTOUCH: [&str; 3] = ["Off", "Channel", "Poly"];
pub const MODES: [&str; 2] = ["Momentary", "Toggle"];
pub const ON_OFF: [&str; 2] = ["Off", "On"];

fn upper_index(names: &[&'static str]) -> HashMap<String, u8> {
    names.iter().enumerate()
        .map(|(i, name)| (name.to_uppercase(), i as u8))
        .collect()
}

static KEY_CODES: Lazy<HashMap<String, u8>> = Lazy::new(|| upper_index(&KEYS));
static COLOR_CODES: Lazy<HashMap<String, u8>> = Lazy::new(|| upper_index(&COLORS));

/// Case-insensitive reverse lookup in a small dense name table
pub fn code_of(names: &[&str], name: &str) -> Option<u8> {
    names.iter().position(|n| n.eq_ignore_ascii_case(name.trim())).map(|i| i as u8)
}

pub fn name_of(names: &[&'static str], code: u8) -> Option<&'static str> {
    names.get(code as usize).cloned()
}

// channels

pub fn channel_name(code: u8) -> Option<String> {
    match code {
        0 => Some("Common".into()),
        1 ..= 16 => Some(format!("USBA{}", code)),
        17 ..= 32 => Some(format!("USBB{}", code - 16)),
        _ => None
    }
}

/// Accepts "Common", "USBA5" and the long "USB-A 5" spelling
pub fn channel_code(name: &str) -> Option<u8> {
    let name = name.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase();
    if name == "COMMON" {
        return Some(0);
    }
    let (base, num) = if let Some(num) = name.strip_prefix("USBA") {
        (0, num)
    } else if let Some(num) = name.strip_prefix("USBB") {
        (16, num)
    } else {
        return None;
    };
    match num.parse::<u8>().ok()? {
        n @ 1 ..= 16 => Some(base + n),
        _ => None
    }
}

// notes

pub fn note_name(note: u8) -> Option<String> {
    if note > MAX_NOTE {
        return None;
    }
    let octave = (note / 12) as i32 - 1;
    Some(format!("{}{}", NOTE_NAMES[(note % 12) as usize], octave))
}

/// Parse "C3", "c#-1", "G9" into a MIDI note number
pub fn note_number(name: &str) -> Option<u8> {
    let name = name.trim();
    let split = name.find(|c: char| c == '-' || c.is_ascii_digit())?;
    let (pitch, octave) = name.split_at(split);
    let semitone = code_of(&NOTE_NAMES, pitch)? as i32;
    let octave = octave.parse::<i32>().ok()?;
    if !(MIN_OCTAVE ..= MAX_OCTAVE).contains(&octave) {
        return None;
    }
    let note = 12 * (octave + 1) + semitone;
    (0 ..= MAX_NOTE as i32).contains(&note).then(|| note as u8)
}

pub fn is_white_key(note: i32) -> bool {
    WHITE_KEYS.contains(&(note.rem_euclid(12) as u8))
}

// pad LED colors

pub fn color_name(code: u8) -> Option<&'static str> {
    name_of(&COLORS, code)
}

pub fn color_code(name: &str) -> Option<u8> {
    COLOR_CODES.get(&name.trim().to_uppercase()).cloned()
}

// keystrokes

pub fn key_name(code: u8) -> Option<&'static str> {
    name_of(&KEYS, code)
}

pub fn key_code(name: &str) -> Option<u8> {
    // " " is a valid key name, so no trimming here
    KEYS.iter().position(|k| *k == name).map(|i| i as u8)
        .or_else(|| KEY_CODES.get(&name.to_uppercase()).cloned())
}

pub fn modifier_name(code: u8) -> Option<&'static str> {
    name_of(&MODIFIER_NAMES, code)
}

/// Parse a modifier combination in any order, e.g. "Alt-Control".
/// Each modifier may appear once.
pub fn modifier_code(name: &str) -> Option<u8> {
    let name = name.trim();
    if name.eq_ignore_ascii_case("None") {
        return Some(0);
    }
    let mut flags = Modifiers::empty();
    for part in name.split('-') {
        let flag = match part.trim().to_uppercase().as_str() {
            "CONTROL" | "CTRL" => Modifiers::CONTROL,
            "SHIFT" => Modifiers::SHIFT,
            "ALT" => Modifiers::ALT,
            "OPTION" => Modifiers::OPTION,
            _ => return None
        };
        if flags.contains(flag) {
            return None;
        }
        flags |= flag;
    }
    MODIFIER_CODES.iter().position(|m| *m == flags).map(|i| i as u8)
}
