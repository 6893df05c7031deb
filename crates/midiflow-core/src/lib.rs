//! MIDI classification and transformation core for midiflow.
//!
//! - **Classifier** ([`classify`]): pure predicates over an event's status
//!   and data bytes, plus a single-valued [`MessageKind`] taxonomy.
//! - **Combinators** ([`transform`]): channel forcing/remapping, fan-out
//!   across channels, controller renumbering, transposition.
//! - **Pipeline** ([`pipeline`]): ordered, flat-mapping composition of
//!   stages, with drop filters and generic stages in [`filter`].
//! - **Strict mode** ([`validate`]): optional range validation.
//! - **Config** ([`config`]): serde-loadable pipeline descriptions.
//!
//! Nothing here performs I/O or holds state between events.
//!
//! # Example
//!
//! ```
//! use midiflow_core::prelude::*;
//!
//! let pipeline = Pipeline::builder()
//!     .stage(filter_channel_voice())
//!     .stage(map_controller(1, 74))
//!     .stage(force_channel(2))
//!     .build()
//!     .unwrap();
//!
//! let out = pipeline.process_to_vec(MidiEvent::control_change(0, 1, 64));
//! assert_eq!(out[0].as_bytes(), &[0xB2, 74, 64]);
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod event;
pub use event::{status, EventData, MidiEvent};

pub mod classify;
pub use classify::{classify, ChannelModeKind, MessageKind};

pub mod pipeline;
pub use pipeline::{
    EventSink, Events, Pipeline, PipelineBuilder, PipelineIteratorExt, Stage, Through,
};

pub mod filter;
pub mod transform;
pub mod validate;

pub mod config;
pub use config::{FilterKind, PipelineConfig, StageConfig};

// Re-export the structured message types returned by `MidiEvent::to_midi_msg`.
pub use midi_msg::{ChannelModeMsg, ChannelVoiceMsg, MidiMsg};

pub mod prelude {
    pub use crate::classify::*;
    pub use crate::filter::*;
    pub use crate::transform::*;
    pub use crate::{EventSink, MidiEvent, Pipeline, PipelineIteratorExt, Stage};
}
