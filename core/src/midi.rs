use anyhow::Result;
use crate::config::{MODEL_ID_ADDR, PRESET_NUMBER_ADDR};
use crate::sysex::{SYSEX_END, SYSEX_START};

/// Akai Professional SysEx manufacturer id
pub const AKAI_ID: u8 = 0x47;
pub const DEVICE_ID: u8 = 0x00;

const PRESET_REQUEST: [u8; 3] = [0x31, 0x00, 0x01];

#[derive(Clone, Debug, PartialEq)]
pub enum MidiMessage {
    /// Ask the controller to dump one stored preset (0-based)
    PresetDumpRequest { model: u8, preset: u8 },
    /// A full preset image as sent by the controller
    PresetDump { model: u8, preset: u8, data: Vec<u8> },
}

impl MidiMessage {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            MidiMessage::PresetDumpRequest { model, preset } => {
                let [a, b, c] = PRESET_REQUEST;
                [SYSEX_START, AKAI_ID, DEVICE_ID, *model, a, b, c, *preset, SYSEX_END].to_vec()
            }
            MidiMessage::PresetDump { data, .. } => data.clone()
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let len = bytes.len();
        if len < 1 {
            bail!("Zero-size MIDI message");
        }
        if bytes[0] != SYSEX_START || bytes[len - 1] != SYSEX_END {
            bail!("Not a SysEx message");
        }
        if len < 9 {
            bail!("SysEx message too short ({} bytes)", len);
        }
        if array_ref!(bytes, 1, 2) != &[AKAI_ID, DEVICE_ID] {
            bail!("Not an Akai SysEx message");
        }

        let model = bytes[MODEL_ID_ADDR];
        if len == 9 && array_ref!(bytes, 4, 3) == &PRESET_REQUEST {
            return Ok(MidiMessage::PresetDumpRequest { model, preset: bytes[7] });
        }

        Ok(MidiMessage::PresetDump { model, preset: bytes[PRESET_NUMBER_ADDR], data: bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_request() {
        let msg = MidiMessage::PresetDumpRequest { model: 0x24, preset: 0 };
        assert_eq!(msg.to_bytes(), vec![0xf0, 0x47, 0x00, 0x24, 0x31, 0x00, 0x01, 0x00, 0xf7]);
        assert_eq!(MidiMessage::from_bytes(msg.to_bytes()).unwrap(), msg);
    }

    #[test]
    fn preset_dump() {
        let mut data = vec![0u8; 32];
        data[.. 8].copy_from_slice(&[0xf0, 0x47, 0x00, 0x25, 0x6d, 0x0b, 0x62, 0x07]);
        data[31] = 0xf7;
        match MidiMessage::from_bytes(data.clone()).unwrap() {
            MidiMessage::PresetDump { model, preset, data: d } => {
                assert_eq!(model, 0x25);
                assert_eq!(preset, 7);
                assert_eq!(d, data);
            }
            m => panic!("unexpected {:?}", m),
        }
    }

    #[test]
    fn not_ours() {
        assert!(MidiMessage::from_bytes(vec![]).is_err());
        assert!(MidiMessage::from_bytes(vec![0xb0, 0x07, 0x40]).is_err());
        assert!(MidiMessage::from_bytes(vec![0xf0, 0x7e, 0x7f, 0x06, 0x02, 0x00, 0x01, 0x0c, 0xf7]).is_err());
        assert!(MidiMessage::from_bytes(vec![0xf0, 0x47, 0xf7]).is_err());
    }
}
