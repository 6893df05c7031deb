//! Error types for port management and hardware I/O.

use thiserror::Error;

use crate::port::PortType;

#[derive(Error, Debug)]
pub enum Error {
    #[error("MIDI port error: {0}")]
    MidiPort(String),

    #[error("MIDI device error: {0}")]
    MidiDevice(String),

    #[error("No {0:?} port with index {1}")]
    PortNotFound(PortType, usize),

    #[error("{0:?} port {1} is inactive")]
    PortInactive(PortType, usize),

    #[error("{0} port queue is full")]
    QueueFull(String),

    #[error("{0} thread not running")]
    ThreadNotRunning(&'static str),

    #[error("Hardware MIDI I/O not enabled (use MidiSystem::builder().io())")]
    IoDisabled,

    #[error(transparent)]
    Core(#[from] midiflow_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "midi-io")]
impl From<midir::InitError> for Error {
    fn from(e: midir::InitError) -> Self {
        Error::MidiDevice(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::ConnectError<midir::MidiOutput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiOutput>) -> Self {
        Error::MidiPort(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::ConnectError<midir::MidiInput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiInput>) -> Self {
        Error::MidiPort(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
