use std::fmt;
use std::str::FromStr;
use crate::config::{self, ModelConfig};
use crate::error::PresetError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ControlClass {
    Knob,
    Fader,
    Pad,
    Switch,
    Transport,
}

impl ControlClass {
    pub const ALL: [ControlClass; 5] = [
        ControlClass::Knob, ControlClass::Fader, ControlClass::Pad,
        ControlClass::Switch, ControlClass::Transport
    ];

    pub fn layout(&self) -> &'static Layout {
        config::layout(*self)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ControlClass::Knob => "knob",
            ControlClass::Fader => "fader",
            ControlClass::Pad => "pad",
            ControlClass::Switch => "switch",
            ControlClass::Transport => "transport",
        }
    }

    pub fn count(&self) -> usize {
        self.layout().count
    }

    /// Number of banks, 0 for classes addressed by name
    pub fn banks(&self) -> usize {
        self.layout().bank_count()
    }

    /// Human-readable label for a 1-based index, e.g. "B3"
    pub fn label(&self, index: usize) -> String {
        match self.layout().bank_size {
            Some(bank_size) if index >= 1 => {
                let bank = Bank((index - 1) / bank_size);
                format!("{}{}", bank, (index - 1) % bank_size + 1)
            }
            _ => Transport::from_index(index)
                .map(|t| t.to_string())
                .unwrap_or_else(|| index.to_string())
        }
    }
}

impl fmt::Display for ControlClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ControlClass {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let s = s.strip_suffix("es").filter(|s| *s == "switch")
            .or_else(|| s.strip_suffix('s'))
            .unwrap_or(s.as_str());
        match s {
            "knob" => Ok(ControlClass::Knob),
            "fader" => Ok(ControlClass::Fader),
            "pad" => Ok(ControlClass::Pad),
            "switch" => Ok(ControlClass::Switch),
            "transport" | "daw" => Ok(ControlClass::Transport),
            _ => Err(PresetError::invalid("class", format!("unknown control class {:?}", s)))
        }
    }
}

/// Fixed record layout of one control class inside the preset image
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    pub base: usize,
    pub size: usize,
    pub count: usize,
    pub bank_size: Option<usize>,
}

impl Layout {
    pub fn end(&self) -> usize {
        self.base + self.size * self.count
    }

    pub fn bank_count(&self) -> usize {
        self.bank_size.map(|size| self.count / size).unwrap_or(0)
    }
}

/// 0-based bank, shown to the user as a letter
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Bank(pub usize);

impl Bank {
    pub fn from_letter(c: char) -> Option<Bank> {
        let c = c.to_ascii_uppercase();
        c.is_ascii_uppercase().then(|| Bank((c as u8 - b'A') as usize))
    }

    /// `None` past 'Z'
    pub fn letter(&self) -> Option<char> {
        u8::try_from(self.0).ok()
            .filter(|n| *n < 26)
            .map(|n| (b'A' + n) as char)
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.letter() {
            Some(c) => write!(f, "{}", c),
            None => write!(f, "#{}", self.0)
        }
    }
}

impl FromStr for Bank {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Bank::from_letter(c),
            _ => None
        }.ok_or_else(|| PresetError::invalid("bank", format!("{:?} is not a bank letter", s)))
    }
}

/// Transport (DAW control) buttons, addressed by name
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    Enter,
    Left,
    Right,
    Up,
    Down,
}

impl Transport {
    pub const ALL: [Transport; 5] = [
        Transport::Enter, Transport::Left, Transport::Right, Transport::Up, Transport::Down
    ];

    /// 1-based record index
    pub fn index(&self) -> usize {
        Transport::ALL.iter().position(|t| t == self).unwrap_or(0) + 1
    }

    pub fn from_index(index: usize) -> Option<Transport> {
        index.checked_sub(1).and_then(|i| Transport::ALL.get(i)).cloned()
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for Transport {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Transport::ALL.iter()
            .find(|t| t.to_string().eq_ignore_ascii_case(s.trim()))
            .cloned()
            .ok_or_else(|| PresetError::invalid("transport", format!("unknown transport control {:?}", s)))
    }
}

/// Device model as identified by the model byte of a preset dump
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Model {
    Known(&'static ModelConfig),
    Unknown(u8),
}

impl Model {
    pub fn from_id(id: u8) -> Self {
        config::config_for_id(id)
            .map(Model::Known)
            .unwrap_or(Model::Unknown(id))
    }

    pub fn id(&self) -> u8 {
        match self {
            Model::Known(config) => config.id,
            Model::Unknown(id) => *id
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Known(config) => f.write_str(&config.name),
            Model::Unknown(_) => f.write_str("Unknown")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_names() {
        assert_eq!("Pads".parse::<ControlClass>().unwrap(), ControlClass::Pad);
        assert_eq!("switches".parse::<ControlClass>().unwrap(), ControlClass::Switch);
        assert_eq!("DAW".parse::<ControlClass>().unwrap(), ControlClass::Transport);
        assert!("slider".parse::<ControlClass>().is_err());
    }

    #[test]
    fn banks_and_labels() {
        assert_eq!(ControlClass::Pad.banks(), 4);
        assert_eq!(ControlClass::Knob.banks(), 3);
        assert_eq!(ControlClass::Transport.banks(), 0);
        assert_eq!("c".parse::<Bank>().unwrap(), Bank(2));
        assert!("AB".parse::<Bank>().is_err());
        assert_eq!(ControlClass::Pad.label(17), "B1");
        assert_eq!(ControlClass::Knob.label(24), "C8");
        assert_eq!(ControlClass::Transport.label(3), "Right");
    }

    #[test]
    fn banks_past_z() {
        assert_eq!(Bank(25).letter(), Some('Z'));
        assert_eq!(Bank(26).letter(), None);
        assert_eq!(Bank(200).to_string(), "#200");
        assert_eq!(Bank(usize::MAX).letter(), None);
    }

    #[test]
    fn transport_names() {
        assert_eq!("up".parse::<Transport>().unwrap().index(), 4);
        assert_eq!(Transport::from_index(1), Some(Transport::Enter));
        assert_eq!(Transport::from_index(6), None);
        assert_eq!(Transport::from_index(0), None);
    }

    #[test]
    fn models() {
        assert_eq!(Model::from_id(0x23).to_string(), "MPK225");
        assert_eq!(Model::from_id(0x7f).to_string(), "Unknown");
        assert_eq!(Model::from_id(0x7f).id(), 0x7f);
    }
}
