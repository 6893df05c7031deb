//! Error types for the classification and transformation core.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("MIDI channel {0} out of range (0-15)")]
    ChannelOutOfRange(u8),

    #[error("MIDI data byte {value} at index {index} out of range (0-127)")]
    DataByteOutOfRange { index: usize, value: u8 },

    #[error("MIDI event has no status byte")]
    MissingStatus,

    #[error("Invalid status byte: {0:#04X}")]
    InvalidStatus(u8),

    #[error("Stage '{stage}' rejected its parameters: {reason}")]
    InvalidStage { stage: &'static str, reason: String },

    #[error("Invalid pipeline config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
