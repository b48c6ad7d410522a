extern crate midir;

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate arrayref;

pub mod error;
pub mod tables;
pub mod model;
pub mod config;
pub mod address;
pub mod codec;
pub mod str_encoder;
pub mod preset;
pub mod bulk;
pub mod sysex;
pub mod receiver;
pub mod midi;
pub mod midi_io;
pub mod transfer;

pub use error::PresetError;
pub use preset::Preset;
