//! # midiflow - Real-time MIDI classification and transformation
//!
//! Umbrella crate over the midiflow subsystems:
//! - **midiflow-core** - classifier, transformation combinators, pipelines
//! - **midiflow-io** - virtual and hardware ports, live routing
//! - **midiflow-launchpad** - Novation Launchpad byte encoder
//!
//! ## Quick Start
//!
//! ```
//! use midiflow::prelude::*;
//!
//! let pipeline = Pipeline::builder()
//!     .stage(filter_channel_voice())
//!     .stage(map_channels([0], [0, 1]))
//!     .stage(transpose(-12))
//!     .build()
//!     .unwrap();
//!
//! let out = pipeline.process_to_vec(MidiEvent::note_on(0, 60, 100));
//! assert_eq!(out.len(), 2);
//! assert_eq!(out[1].as_bytes(), &[0x91, 48, 100]);
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - core plus virtual ports and routing (`io`)
//! - `hardware` - hardware devices via midir
//! - `launchpad` - Launchpad encoder
//! - `full` - everything

/// Re-export of midiflow-core for direct access
pub use midiflow_core as core;

pub use midiflow_core::{
    classify, status, ChannelModeKind, EventSink, Events, MessageKind, MidiEvent, Pipeline,
    PipelineBuilder, PipelineConfig, PipelineIteratorExt, Stage, StageConfig,
};

// Ports & routing
#[cfg(feature = "io")]
pub use midiflow_io as io;

#[cfg(feature = "io")]
pub use midiflow_io::{MidiSystem, MidiSystemBuilder, PortInfo, PortType, Route};

// Launchpad encoder
#[cfg(feature = "launchpad")]
pub use midiflow_launchpad as launchpad;

#[cfg(all(feature = "io", feature = "launchpad"))]
mod launchpad_port;

#[cfg(all(feature = "io", feature = "launchpad"))]
pub use launchpad_port::LaunchpadPort;

pub mod error;
pub use error::{Error, Result};

/// Convenience prelude for common imports
pub mod prelude {
    // Classifier, combinators, filters
    pub use midiflow_core::prelude::*;

    pub use crate::{PipelineConfig, StageConfig};

    // Ports & routing
    #[cfg(feature = "io")]
    pub use crate::io::{ChannelSink, FnSink, MidiSystem, PortType, Route};

    // Launchpad
    #[cfg(feature = "launchpad")]
    pub use crate::launchpad::{Button, Color, Launchpad, Layout};

    #[cfg(all(feature = "io", feature = "launchpad"))]
    pub use crate::LaunchpadPort;

    pub use crate::{Error, Result};
}
