use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PresetError {
    #[error("{what} {value} out of range {min}..={max}")]
    OutOfRange { what: &'static str, value: usize, min: usize, max: usize },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Preset image too short: need {needed} bytes, have {len}")]
    BufferTooShort { needed: usize, len: usize },

    #[error("Unknown {class} type 0x{code:02x}")]
    UnknownDiscriminator { class: &'static str, code: u8 },

    #[error("Preset reception abandoned before the end of the message")]
    FrameAbandoned,

    /// A bulk operation failed after `written` records were already modified.
    #[error("Partially applied ({written} records written): {source}")]
    Partial { written: usize, source: Box<PresetError> },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PresetError>;

impl PresetError {
    pub fn out_of_range(what: &'static str, value: usize, min: usize, max: usize) -> Self {
        PresetError::OutOfRange { what, value, min, max }
    }

    pub fn invalid<F: fmt::Display, R: fmt::Display>(field: F, reason: R) -> Self {
        PresetError::InvalidValue { field: field.to_string(), reason: reason.to_string() }
    }

    /// Wrap an error that interrupted a bulk operation. Errors raised
    /// before anything was written are passed through as-is.
    pub fn partial(written: usize, source: PresetError) -> Self {
        if written == 0 {
            return source;
        }
        PresetError::Partial { written, source: Box::new(source) }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, PresetError::Partial { .. })
    }
}
