//! Named MIDI ports.
//!
//! Every port is a bounded event queue. Input ports are fed by hardware
//! callbacks or [`InputHandle`]s and drained by a route or the host; output
//! ports are fed by routes or [`OutputHandle`]s and drained by the hardware
//! output thread or the host.

mod handle;
mod manager;

pub use handle::{ChannelSink, FnSink, InputHandle, OutputHandle};
pub use manager::{MidiPortManager, PortInfo, PortType};
