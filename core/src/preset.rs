use std::fs;
use std::path::Path;
use log::*;
use crate::address;
use crate::codec::{codec, FieldMap};
use crate::config::*;
use crate::error::{PresetError, Result};
use crate::model::{Bank, ControlClass, Model, Transport};
use crate::str_encoder::StrEncoder;

/// Preset metadata as shown in the header of a dump
#[derive(Clone, Debug, PartialEq)]
pub struct Meta {
    pub model: Model,
    pub name: String,
    /// 0-based
    pub number: u8,
}

/// One complete preset dump, including the SysEx framing bytes.
///
/// The buffer is never resized by edits; every accessor checks that the
/// bytes it needs are present and fails with `BufferTooShort` otherwise.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Preset {
    data: Vec<u8>,
}

impl Preset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes<B: Into<Vec<u8>>>(bytes: B) -> Self {
        Preset { data: bytes.into() }
    }

    /// Replace the whole image
    pub fn load(&mut self, bytes: &[u8]) {
        self.data = bytes.to_vec();
    }

    pub fn raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True if the image is long enough to hold every control record
    pub fn is_complete(&self) -> bool {
        self.data.len() >= MIN_PRESET_SIZE
    }

    fn span(&self, addr: usize, len: usize) -> Result<&[u8]> {
        self.data.get(addr .. addr + len)
            .ok_or(PresetError::BufferTooShort { needed: addr + len, len: self.data.len() })
    }

    fn byte(&self, addr: usize) -> Result<u8> {
        self.span(addr, 1).map(|b| b[0])
    }

    // metadata

    pub fn model(&self) -> Result<Model> {
        self.byte(MODEL_ID_ADDR).map(Model::from_id)
    }

    pub fn name(&self) -> Result<String> {
        let encoder = StrEncoder::preset_name();
        self.span(PRESET_NAME_ADDR, encoder.len())?;
        Ok(encoder.str_from_buffer(&self.data))
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        StrEncoder::preset_name().str_to_buffer(name, &mut self.data)
    }

    /// 0-based preset number
    pub fn number(&self) -> Result<u8> {
        self.byte(PRESET_NUMBER_ADDR)
    }

    pub fn set_number(&mut self, number: usize) -> Result<()> {
        Self::check_number(number)?;
        self.span(PRESET_NUMBER_ADDR, 1)?;
        self.data[PRESET_NUMBER_ADDR] = number as u8;
        Ok(())
    }

    fn check_number(number: usize) -> Result<()> {
        if number >= PRESET_NUM {
            return Err(PresetError::out_of_range("preset number", number, 0, PRESET_NUM - 1));
        }
        Ok(())
    }

    pub fn meta(&self) -> Result<Meta> {
        Ok(Meta {
            model: self.model()?,
            name: self.name()?,
            number: self.number()?,
        })
    }

    /// Set name and number together. Both are validated before either
    /// is written.
    pub fn set_meta(&mut self, name: &str, number: usize) -> Result<()> {
        Self::check_number(number)?;
        if !name.is_ascii() {
            return Err(PresetError::invalid("name", format!("{:?} is not ASCII", name)));
        }
        self.span(PRESET_NAME_ADDR, PRESET_NAME_LENGTH)?;
        self.span(PRESET_NUMBER_ADDR, 1)?;

        self.set_name(name)?;
        self.set_number(number)
    }

    // controls

    /// Raw bytes of one control record
    pub fn record(&self, class: ControlClass, index: usize) -> Result<Vec<u8>> {
        let addr = address::offset(class, index)?;
        self.span(addr, class.layout().size).map(|r| r.to_vec())
    }

    pub fn control(&self, class: ControlClass, index: usize) -> Result<FieldMap> {
        let record = self.record(class, index)?;
        codec(class).decode(&record)
    }

    pub fn set_control(&mut self, class: ControlClass, index: usize, updates: &FieldMap) -> Result<()> {
        let addr = address::offset(class, index)?;
        let size = class.layout().size;
        let record = self.span(addr, size)?;
        let encoded = codec(class).encode(record, updates)?;
        if encoded.as_slice() != record {
            trace!("{} {}: {:02x?} -> {:02x?}", class, class.label(index), record, encoded);
        }
        self.data[addr .. addr + size].copy_from_slice(&encoded);
        Ok(())
    }

    pub fn control_at(&self, class: ControlClass, bank: Bank, slot: usize) -> Result<FieldMap> {
        self.control(class, address::index(class, bank, slot)?)
    }

    pub fn set_control_at(&mut self, class: ControlClass, bank: Bank, slot: usize, updates: &FieldMap) -> Result<()> {
        self.set_control(class, address::index(class, bank, slot)?, updates)
    }

    pub fn transport(&self, transport: Transport) -> Result<FieldMap> {
        self.control(ControlClass::Transport, address::transport_index(transport))
    }

    pub fn set_transport(&mut self, transport: Transport, updates: &FieldMap) -> Result<()> {
        self.set_control(ControlClass::Transport, address::transport_index(transport), updates)
    }

    // storage

    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path.as_ref())?;
        info!("Loaded {} bytes from {:?}", data.len(), path.as_ref());
        if data.len() < MIN_PRESET_SIZE {
            warn!("{:?} is shorter than a full preset ({} < {} bytes)",
                path.as_ref(), data.len(), MIN_PRESET_SIZE);
        }
        Ok(Preset::from_bytes(data))
    }

    pub fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path.as_ref(), &self.data)?;
        info!("Saved {} bytes to {:?}", self.data.len(), path.as_ref());
        Ok(())
    }
}
