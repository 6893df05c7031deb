//! Hardware MIDI I/O.
//!
//! Device enumeration, connection, and real-time I/O via midir.
//! Requires the `midi-io` feature.

mod input;
mod output;

pub use input::{MidiInputDevice, MidiInputManager};
pub use output::{MidiOutputDevice, MidiOutputManager};

/// Case-insensitive substring match used by the `*_by_name` lookups.
pub(crate) fn name_matches(device_name: &str, query: &str) -> bool {
    device_name.to_lowercase().contains(&query.to_lowercase())
}
