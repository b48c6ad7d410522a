use std::collections::HashMap;
use maplit::hashmap;
use once_cell::sync::Lazy;
use crate::model::{ControlClass, Layout};

pub const MODEL_ID_ADDR: usize = 3;
pub const PRESET_NUMBER_ADDR: usize = 7;
pub const PRESET_NAME_ADDR: usize = 8;
pub const PRESET_NAME_LENGTH: usize = 8;

/// Presets are stored 0-based, shown to the user as 1..=30
pub const PRESET_NUM: usize = 30;

pub static KNOB_LAYOUT: Layout = Layout { base: 0x2fd, size: 9, count: 24, bank_size: Some(8) };
pub static FADER_LAYOUT: Layout = Layout { base: 0x3d5, size: 6, count: 24, bank_size: Some(8) };
// 0x3d, not 0x3c: 64 pads end exactly at the first knob record
pub static PAD_LAYOUT: Layout = Layout { base: 0x3d, size: 11, count: 64, bank_size: Some(16) };
pub static SWITCH_LAYOUT: Layout = Layout { base: 0x465, size: 13, count: 24, bank_size: Some(8) };
pub static TRANSPORT_LAYOUT: Layout = Layout { base: 0x59d, size: 13, count: 5, bank_size: None };

/// Smallest complete preset dump: all records plus the end-of-exclusive byte
pub const MIN_PRESET_SIZE: usize = 0x59d + 13 * 5 + 1;

pub fn layout(class: ControlClass) -> &'static Layout {
    match class {
        ControlClass::Knob => &KNOB_LAYOUT,
        ControlClass::Fader => &FADER_LAYOUT,
        ControlClass::Pad => &PAD_LAYOUT,
        ControlClass::Switch => &SWITCH_LAYOUT,
        ControlClass::Transport => &TRANSPORT_LAYOUT,
    }
}

#[derive(Debug, PartialEq)]
pub struct ModelConfig {
    pub name: String,
    pub id: u8,
    /// Substring of the MIDI port names used for preset transfer
    pub in_port: String,
    pub out_port: String,
}

macro_rules! model {
    ($id:expr, $name:expr) => (ModelConfig {
        name: ($name).into(),
        id: $id,
        in_port: format!("MIDIIN4 ({})", $name),
        out_port: format!("MIDIOUT4 ({})", $name),
    });
}

pub static MODELS: Lazy<HashMap<u8, ModelConfig>> = Lazy::new(|| {
    hashmap!(
        0x23 => model!(0x23, "MPK225"),
        0x24 => model!(0x24, "MPK249"),
        0x25 => model!(0x25, "MPK261"),
    )
});

pub fn config_for_id(id: u8) -> Option<&'static ModelConfig> {
    MODELS.get(&id)
}

pub fn config_for_name(name: &str) -> Option<&'static ModelConfig> {
    MODELS.values().find(|c| c.name.eq_ignore_ascii_case(name))
}

pub fn configs() -> Vec<&'static ModelConfig> {
    let mut configs = MODELS.values().collect::<Vec<_>>();
    configs.sort_by_key(|c| c.id);
    configs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_are_contiguous() {
        let order = [
            ControlClass::Pad, ControlClass::Knob, ControlClass::Fader,
            ControlClass::Switch, ControlClass::Transport
        ];
        for pair in order.windows(2) {
            assert_eq!(layout(pair[0]).end(), layout(pair[1]).base,
                       "{} -> {}", pair[0], pair[1]);
        }
        assert_eq!(MIN_PRESET_SIZE, TRANSPORT_LAYOUT.end() + 1);
        assert!(PRESET_NAME_ADDR + PRESET_NAME_LENGTH <= PAD_LAYOUT.base);
    }

    #[test]
    fn models() {
        assert_eq!(config_for_id(0x24).map(|c| c.name.as_str()), Some("MPK249"));
        assert_eq!(config_for_name("mpk261").map(|c| c.id), Some(0x25));
        assert_eq!(config_for_id(0x30), None);
        assert_eq!(configs().iter().map(|c| c.id).collect::<Vec<_>>(), vec![0x23, 0x24, 0x25]);
        assert_eq!(config_for_id(0x24).unwrap().in_port, "MIDIIN4 (MPK249)");
    }
}
