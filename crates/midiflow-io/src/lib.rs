//! MIDI port management, hardware I/O and live routing for midiflow.
//!
//! Ports are bounded event queues. A [`Route`] drains an input port through
//! a [`midiflow_core::Pipeline`] into an output port or any other sink.
//!
//! Feature gates: `midi-io` (hardware devices via midir).

pub mod error;
pub use error::{Error, Result};

mod system;
pub use system::{MidiSystem, MidiSystemBuilder};

pub mod port;
pub use port::{ChannelSink, FnSink, InputHandle, MidiPortManager, OutputHandle, PortInfo, PortType};

pub mod route;
pub use route::{Route, RouteStats};

#[cfg(feature = "midi-io")]
pub(crate) mod io;

#[cfg(feature = "midi-io")]
pub use io::{MidiInputDevice, MidiInputManager, MidiOutputDevice, MidiOutputManager};

pub use midiflow_core::{EventSink, MidiEvent, Pipeline};
