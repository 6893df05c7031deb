//! Centralized error type for the midiflow umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] midiflow_core::Error),

    #[cfg(feature = "io")]
    #[error("MIDI I/O: {0}")]
    Io(#[from] midiflow_io::Error),

    #[cfg(feature = "launchpad")]
    #[error("Launchpad: {0}")]
    Launchpad(#[from] midiflow_launchpad::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
