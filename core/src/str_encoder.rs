use std::ops::Range;
use crate::config::{PRESET_NAME_ADDR, PRESET_NAME_LENGTH};
use crate::error::{PresetError, Result};

/// Fixed-width, space-padded ASCII string field inside a preset image
#[derive(Clone)]
pub struct StrEncoder {
    address: Range<usize>
}

impl StrEncoder {
    pub fn new(addr: usize, length: usize) -> Self {
        Self { address: addr .. addr + length }
    }

    pub fn preset_name() -> Self {
        Self::new(PRESET_NAME_ADDR, PRESET_NAME_LENGTH)
    }

    pub fn len(&self) -> usize {
        self.address.len()
    }

    pub fn str_from_buffer(&self, buffer: &[u8]) -> String {
        let bytes = self.address.clone()
            .map(|i| buffer.get(i).cloned().unwrap_or(0))
            .collect::<Vec<_>>();
        String::from_utf8_lossy(&bytes).to_string()
            .trim_end_matches(|c: char| c.is_whitespace() || c == '\u{0}')
            .to_string()
    }

    /// Write `str` padded with spaces, truncated to the field width
    pub fn str_to_buffer(&self, str: &str, buffer: &mut [u8]) -> Result<()> {
        if !str.is_ascii() {
            return Err(PresetError::invalid("name", format!("{:?} is not ASCII", str)));
        }
        if buffer.len() < self.address.end {
            return Err(PresetError::BufferTooShort { needed: self.address.end, len: buffer.len() });
        }
        let str_data = str.as_bytes();
        for (i, addr) in self.address.clone().enumerate() {
            buffer[addr] = str_data.get(i).cloned().unwrap_or(0x20);
        }
        Ok(())
    }
}
