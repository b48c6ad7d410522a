//! Control record codec.
//!
//! Each record starts with a type byte that selects which of the remaining
//! bytes carry which field. The layouts are kept as static tables of
//! (field, offset, format) slots per class and type, so decoding and
//! encoding are the same table walk in opposite directions.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use log::*;
use crate::error::{PresetError, Result};
use crate::model::ControlClass;
use crate::tables::*;

/// Offset of the type byte inside every record
pub const TYPE_ADDR: usize = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Type,
    Channel,
    Cc,
    Note,
    Program,
    Msb,
    Lsb,
    Min,
    Max,
    Mode,
    Aftertouch,
    Invert,
    Velocity,
    OffColor,
    OnColor,
    MidiPassthrough,
    KeyPrimary,
    KeyModifier,
    Value,
}

impl Field {
    pub const ALL: [Field; 19] = [
        Field::Type, Field::Channel, Field::Cc, Field::Note, Field::Program,
        Field::Msb, Field::Lsb, Field::Min, Field::Max, Field::Mode,
        Field::Aftertouch, Field::Invert, Field::Velocity, Field::OffColor,
        Field::OnColor, Field::MidiPassthrough, Field::KeyPrimary,
        Field::KeyModifier, Field::Value
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Type => "type",
            Field::Channel => "channel",
            Field::Cc => "cc",
            Field::Note => "note",
            Field::Program => "program",
            Field::Msb => "msb",
            Field::Lsb => "lsb",
            Field::Min => "min",
            Field::Max => "max",
            Field::Mode => "mode",
            Field::Aftertouch => "aftertouch",
            Field::Invert => "invert",
            Field::Velocity => "velocity",
            Field::OffColor => "off_color",
            Field::OnColor => "on_color",
            Field::MidiPassthrough => "midi_passthrough",
            Field::KeyPrimary => "key_primary",
            Field::KeyModifier => "key_modifier",
            Field::Value => "value",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = PresetError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim().to_lowercase().replace('-', "_");
        let field = match s.as_str() {
            "midi_to_din" => Some(Field::MidiPassthrough),
            "key1" => Some(Field::KeyPrimary),
            "key2" => Some(Field::KeyModifier),
            s => Field::ALL.iter().find(|f| f.name() == s).cloned()
        };
        field.ok_or_else(|| PresetError::invalid("field", format!("unknown field name {:?}", s)))
    }
}

/// A decoded field value. Bytes that have no name in the field's table
/// decode as `Unknown` and encode back to the same byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Number(i32),
    Name(String),
    Unknown(u8),
}

impl Value {
    pub fn as_number(&self) -> Option<i32> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Name(s) => s.trim().parse().ok(),
            Value::Unknown(_) => None
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Name(s) => f.write_str(s),
            Value::Unknown(b) => write!(f, "Unknown({})", b),
        }
    }
}

impl FromStr for Value {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if let Ok(n) = s.trim().parse::<i32>() {
            return Ok(Value::Number(n));
        }
        let unknown = s.trim()
            .strip_prefix("Unknown(")
            .and_then(|s| s.strip_suffix(')'))
            .and_then(|s| s.parse::<u8>().ok());
        Ok(match unknown {
            Some(b) => Value::Unknown(b),
            None => Value::Name(s.to_string())
        })
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n)
    }
}

impl From<u8> for Value {
    fn from(n: u8) -> Self {
        Value::Number(n as i32)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Name(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Name(s)
    }
}

pub type FieldMap = BTreeMap<Field, Value>;

/// Build an update set from user-supplied names. Unknown names are
/// skipped, not errors.
pub fn fields_from_pairs<K, I>(pairs: I) -> FieldMap
    where K: AsRef<str>, I: IntoIterator<Item = (K, Value)>
{
    pairs.into_iter()
        .filter_map(|(name, value)| {
            match name.as_ref().parse::<Field>() {
                Ok(field) => Some((field, value)),
                Err(_) => {
                    warn!("Ignoring unknown field {:?}", name.as_ref());
                    None
                }
            }
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Format {
    Number,
    Note,
    Channel,
    Color,
    Flag,
    Mode,
    Aftertouch,
    Key,
    Modifier,
}

impl Format {
    fn decode(&self, byte: u8) -> Value {
        let name = match self {
            Format::Number => return Value::Number(byte as i32),
            Format::Note => note_name(byte),
            Format::Channel => channel_name(byte),
            Format::Color => color_name(byte).map(String::from),
            Format::Flag => name_of(&ON_OFF, byte).map(String::from),
            Format::Mode => name_of(&MODES, byte).map(String::from),
            Format::Aftertouch => name_of(&AFTERTOUCH, byte).map(String::from),
            Format::Key => key_name(byte).map(String::from),
            Format::Modifier => modifier_name(byte).map(String::from),
        };
        name.map(Value::Name).unwrap_or(Value::Unknown(byte))
    }

    /// Numbers given for named fields are taken as raw codes and must be
    /// in the table, except for keystroke keys where "1" is a key name.
    fn encode(&self, field: Field, value: &Value) -> Result<u8> {
        let invalid = || PresetError::invalid(field, format!("{:?} is not a valid value", value.to_string()));

        let name = match value {
            Value::Unknown(b) => return Ok(*b),
            Value::Number(n) if *self == Format::Key => n.to_string(),
            Value::Number(n) => return self.encode_number(field, *n),
            Value::Name(s) => s.clone()
        };

        let code = match self {
            Format::Number => {
                let n = value.as_number().ok_or_else(invalid)?;
                return self.encode_number(field, n);
            }
            Format::Note => note_number(&name),
            Format::Channel => channel_code(&name),
            Format::Color => color_code(&name),
            Format::Flag => code_of(&ON_OFF, &name),
            Format::Mode => code_of(&MODES, &name),
            Format::Aftertouch => code_of(&AFTERTOUCH, &name),
            Format::Key => key_code(&name),
            Format::Modifier => modifier_code(&name),
        };
        match (code, name.trim().parse::<i32>()) {
            (Some(code), _) => Ok(code),
            (None, Ok(n)) if *self != Format::Key => self.encode_number(field, n),
            _ => Err(invalid())
        }
    }

    fn encode_number(&self, field: Field, n: i32) -> Result<u8> {
        let max = match self {
            Format::Number => 0xff,
            Format::Note => MAX_NOTE as usize,
            Format::Channel => 32,
            Format::Color => COLORS.len() - 1,
            Format::Flag => ON_OFF.len() - 1,
            Format::Mode => MODES.len() - 1,
            Format::Aftertouch => AFTERTOUCH.len() - 1,
            Format::Key => KEYS.len() - 1,
            Format::Modifier => MODIFIER_CODES.len() - 1,
        };
        if n < 0 || n as usize > max {
            return Err(PresetError::invalid(field, format!("{} out of range 0..={}", n, max)));
        }
        Ok(n as u8)
    }
}

#[derive(Debug)]
struct Slot {
    field: Field,
    offset: usize,
    format: Format,
}

const fn slot(field: Field, offset: usize, format: Format) -> Slot {
    Slot { field, offset, format }
}

#[derive(Debug)]
struct Kind {
    code: u8,
    name: &'static str,
    aliases: &'static [&'static str],
    slots: &'static [Slot],
}

impl Kind {
    fn matches(&self, name: &str) -> bool {
        let name = name.trim();
        self.name.eq_ignore_ascii_case(name) ||
            self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

/// Record layout and codec for one control class
#[derive(Debug)]
pub struct RecordCodec {
    class: &'static str,
    size: usize,
    kinds: &'static [Kind],
    common: &'static [Slot],
}

static KNOB_CODEC: RecordCodec = RecordCodec {
    class: "knob",
    size: 9,
    kinds: &[
        Kind { code: 0, name: "CC", aliases: &["MIDI_CC"], slots: &[] },
        Kind { code: 1, name: "Aftertouch", aliases: &[], slots: &[] },
        Kind { code: 2, name: "IncDec1", aliases: &["INC_DEC1"], slots: &[] },
        Kind { code: 3, name: "IncDec2", aliases: &["INC_DEC2"], slots: &[] },
    ],
    common: &[
        slot(Field::Channel, 1, Format::Channel),
        slot(Field::Cc, 2, Format::Number),
        slot(Field::Min, 3, Format::Number),
        slot(Field::Max, 4, Format::Number),
        slot(Field::MidiPassthrough, 5, Format::Flag),
        slot(Field::Msb, 6, Format::Number),
        slot(Field::Lsb, 7, Format::Number),
        slot(Field::Value, 8, Format::Number),
    ]
};

static FADER_CODEC: RecordCodec = RecordCodec {
    class: "fader",
    size: 6,
    kinds: &[
        Kind { code: 0, name: "CC", aliases: &["MIDI_CC"], slots: &[] },
        Kind { code: 1, name: "Aftertouch", aliases: &[], slots: &[] },
    ],
    common: &[
        slot(Field::Channel, 1, Format::Channel),
        slot(Field::Cc, 2, Format::Number),
        slot(Field::Min, 3, Format::Number),
        slot(Field::Max, 4, Format::Number),
        slot(Field::MidiPassthrough, 5, Format::Flag),
    ]
};

static PAD_CODEC: RecordCodec = RecordCodec {
    class: "pad",
    size: 11,
    kinds: &[
        Kind { code: 0, name: "Note", aliases: &[], slots: &[
            slot(Field::Note, 2, Format::Note),
        ] },
        Kind { code: 1, name: "ProgramChange", aliases: &["ProgChange"], slots: &[
            slot(Field::Program, 2, Format::Number),
        ] },
        Kind { code: 2, name: "ProgramBank", aliases: &["ProgBank"], slots: &[
            slot(Field::Program, 6, Format::Number),
            slot(Field::Msb, 7, Format::Number),
            slot(Field::Lsb, 8, Format::Number),
        ] },
    ],
    common: &[
        slot(Field::Channel, 1, Format::Channel),
        slot(Field::MidiPassthrough, 3, Format::Flag),
        slot(Field::Mode, 4, Format::Mode),
        slot(Field::Aftertouch, 5, Format::Aftertouch),
        slot(Field::OffColor, 9, Format::Color),
        slot(Field::OnColor, 10, Format::Color),
    ]
};

// Switches and transport buttons share one record format
const SWITCH_KINDS: &[Kind] = &[
    Kind { code: 0, name: "CC", aliases: &["MIDI_CC"], slots: &[
        slot(Field::MidiPassthrough, 7, Format::Flag),
        slot(Field::Cc, 2, Format::Number),
        slot(Field::Invert, 5, Format::Flag),
    ] },
    Kind { code: 1, name: "Note", aliases: &[], slots: &[
        slot(Field::MidiPassthrough, 7, Format::Flag),
        slot(Field::Note, 8, Format::Note),
        slot(Field::Velocity, 9, Format::Number),
    ] },
    Kind { code: 2, name: "ProgramChange", aliases: &["ProgChange"], slots: &[
        slot(Field::MidiPassthrough, 7, Format::Flag),
        slot(Field::Program, 2, Format::Number),
    ] },
    Kind { code: 3, name: "ProgramBank", aliases: &["ProgBank"], slots: &[
        slot(Field::MidiPassthrough, 7, Format::Flag),
        slot(Field::Program, 4, Format::Number),
        slot(Field::Msb, 5, Format::Number),
        slot(Field::Lsb, 6, Format::Number),
    ] },
    Kind { code: 4, name: "Keystroke", aliases: &[], slots: &[
        slot(Field::KeyPrimary, 11, Format::Key),
        slot(Field::KeyModifier, 12, Format::Modifier),
    ] },
];

const SWITCH_COMMON: &[Slot] = &[
    slot(Field::Channel, 1, Format::Channel),
    slot(Field::Mode, 3, Format::Mode),
];

static SWITCH_CODEC: RecordCodec = RecordCodec {
    class: "switch",
    size: 13,
    kinds: SWITCH_KINDS,
    common: SWITCH_COMMON,
};

static TRANSPORT_CODEC: RecordCodec = RecordCodec {
    class: "transport",
    size: 13,
    kinds: SWITCH_KINDS,
    common: SWITCH_COMMON,
};

pub fn codec(class: ControlClass) -> &'static RecordCodec {
    match class {
        ControlClass::Knob => &KNOB_CODEC,
        ControlClass::Fader => &FADER_CODEC,
        ControlClass::Pad => &PAD_CODEC,
        ControlClass::Switch => &SWITCH_CODEC,
        ControlClass::Transport => &TRANSPORT_CODEC,
    }
}

impl RecordCodec {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn type_names(&self) -> Vec<&'static str> {
        self.kinds.iter().map(|k| k.name).collect()
    }

    /// Name of the record's type, failing on codes this class doesn't define
    pub fn record_type(&self, record: &[u8]) -> Result<&'static str> {
        self.check_size(record)?;
        let code = record[TYPE_ADDR];
        self.kind_for_code(code)
            .map(|k| k.name)
            .ok_or(PresetError::UnknownDiscriminator { class: self.class, code })
    }

    /// Fields present in a record of the named type
    pub fn fields_for_type(&self, type_name: &str) -> Option<Vec<Field>> {
        let kind = self.kinds.iter().find(|k| k.matches(type_name))?;
        let fields = std::iter::once(Field::Type)
            .chain(self.slots(Some(kind)).map(|s| s.field))
            .collect();
        Some(fields)
    }

    pub fn decode(&self, record: &[u8]) -> Result<FieldMap> {
        self.check_size(record)?;

        let code = record[TYPE_ADDR];
        let kind = self.kind_for_code(code);
        let type_value = match kind {
            Some(kind) => Value::Name(kind.name.to_string()),
            None => {
                debug!("{}: unknown type 0x{:02x}", self.class, code);
                Value::Unknown(code)
            }
        };

        let mut map = FieldMap::new();
        map.insert(Field::Type, type_value);
        for slot in self.slots(kind) {
            map.insert(slot.field, slot.format.decode(record[slot.offset]));
        }

        Ok(map)
    }

    /// Apply `updates` to a copy of `record`. A type change is applied
    /// first and the remaining fields are placed according to the new
    /// type; fields the type doesn't have are ignored.
    pub fn encode(&self, record: &[u8], updates: &FieldMap) -> Result<Vec<u8>> {
        self.check_size(record)?;

        let mut block = record.to_vec();
        if let Some(value) = updates.get(&Field::Type) {
            block[TYPE_ADDR] = self.type_code(value)?;
        }

        let kind = self.kind_for_code(block[TYPE_ADDR]);
        for (field, value) in updates.iter().filter(|(f, _)| **f != Field::Type) {
            match self.slots(kind).find(|s| s.field == *field) {
                Some(slot) => {
                    block[slot.offset] = slot.format.encode(*field, value)?;
                }
                None => {
                    debug!("{}: field {} not used by type {}, ignored",
                        self.class, field, kind.map(|k| k.name).unwrap_or("Unknown"));
                }
            }
        }

        Ok(block)
    }

    fn check_size(&self, record: &[u8]) -> Result<()> {
        if record.len() < self.size {
            return Err(PresetError::BufferTooShort { needed: self.size, len: record.len() });
        }
        if record.len() > self.size {
            return Err(PresetError::invalid(self.class,
                format!("record is {} bytes, expected {}", record.len(), self.size)));
        }
        Ok(())
    }

    fn kind_for_code(&self, code: u8) -> Option<&'static Kind> {
        self.kinds.iter().find(|k| k.code == code)
    }

    fn type_code(&self, value: &Value) -> Result<u8> {
        let kind = match value {
            Value::Unknown(code) => return Ok(*code),
            Value::Number(n) => self.kinds.iter().find(|k| k.code as i32 == *n),
            Value::Name(s) => self.kinds.iter().find(|k| k.matches(s)),
        };
        kind.map(|k| k.code).ok_or_else(|| {
            PresetError::invalid(Field::Type, format!("{:?} is not a {} type (expected one of {})",
                value.to_string(), self.class, self.type_names().join(", ")))
        })
    }

    fn slots(&self, kind: Option<&'static Kind>) -> impl Iterator<Item = &'static Slot> {
        let common: &'static [Slot] = self.common;
        let kind_slots: &'static [Slot] = kind.map(|k| k.slots).unwrap_or(&[]);
        common.iter().chain(kind_slots.iter())
    }
}
