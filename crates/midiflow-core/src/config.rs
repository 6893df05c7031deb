//! Declarative pipeline description.
//!
//! Lets hosts load a pipeline from any serde format:
//!
//! ```
//! use midiflow_core::{MidiEvent, PipelineConfig};
//!
//! let config: PipelineConfig = serde_json::from_str(r#"{
//!     "strict": true,
//!     "stages": [
//!         { "stage": "filter", "kind": "note" },
//!         { "stage": "transpose", "interval": -12 },
//!         { "stage": "map_channels", "inputs": [0], "outputs": [1, 2] }
//!     ]
//! }"#).unwrap();
//!
//! let pipeline = config.build().unwrap();
//! assert_eq!(pipeline.process_to_vec(MidiEvent::note_on(0, 60, 90)).len(), 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::filter::{self, Filter, Predicate};
use crate::pipeline::{Pipeline, Stage};
use crate::transform;

/// Category for a drop filter stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    NoteOn,
    NoteOff,
    Note,
    PolyPressure,
    HasNote,
    ControlChange,
    ProgramChange,
    ChannelPressure,
    PitchBend,
    ChannelMode,
    ChannelVoice,
    ChannelMessage,
}

impl FilterKind {
    pub fn stage(self) -> Filter<Predicate> {
        match self {
            FilterKind::NoteOn => filter::filter_note_on(),
            FilterKind::NoteOff => filter::filter_note_off(),
            FilterKind::Note => filter::filter_note(),
            FilterKind::PolyPressure => filter::filter_poly_pressure(),
            FilterKind::HasNote => filter::filter_has_note(),
            FilterKind::ControlChange => filter::filter_control_change(),
            FilterKind::ProgramChange => filter::filter_program_change(),
            FilterKind::ChannelPressure => filter::filter_channel_pressure(),
            FilterKind::PitchBend => filter::filter_pitch_bend(),
            FilterKind::ChannelMode => filter::filter_channel_mode(),
            FilterKind::ChannelVoice => filter::filter_channel_voice(),
            FilterKind::ChannelMessage => filter::filter_channel_message(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageConfig {
    Filter { kind: FilterKind },
    FilterChannel { channel: u8 },
    ForceChannel { channel: u8 },
    MapChannel { from: u8, to: u8 },
    MapChannels { inputs: Vec<u8>, outputs: Vec<u8> },
    MapController { from: u8, to: u8 },
    Transpose { interval: i8 },
}

impl StageConfig {
    pub fn to_stage(&self) -> Result<Box<dyn Stage>> {
        let stage: Box<dyn Stage> = match self {
            StageConfig::Filter { kind } => Box::new(kind.stage()),
            StageConfig::FilterChannel { channel } => Box::new(filter::filter_channel(*channel)),
            StageConfig::ForceChannel { channel } => Box::new(transform::force_channel(*channel)),
            StageConfig::MapChannel { from, to } => Box::new(transform::map_channel(*from, *to)),
            StageConfig::MapChannels { inputs, outputs } => {
                if inputs.is_empty() {
                    return Err(Error::InvalidConfig(
                        "map_channels needs at least one input channel".to_string(),
                    ));
                }
                Box::new(transform::map_channels(
                    inputs.iter().copied(),
                    outputs.iter().copied(),
                ))
            }
            StageConfig::MapController { from, to } => {
                Box::new(transform::map_controller(*from, *to))
            }
            StageConfig::Transpose { interval } => Box::new(transform::transpose(*interval)),
        };
        Ok(stage)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub stages: Vec<StageConfig>,
}

impl PipelineConfig {
    pub fn build(&self) -> Result<Pipeline> {
        let mut builder = Pipeline::builder().strict_if(self.strict);
        for config in &self.stages {
            builder = builder.boxed_stage(config.to_stage()?);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MidiEvent;

    #[test]
    fn test_empty_config_is_identity() {
        let pipeline: Pipeline = serde_json::from_str::<PipelineConfig>("{}")
            .unwrap()
            .build()
            .unwrap();
        assert!(pipeline.is_empty());
        assert!(!pipeline.is_strict());
    }

    #[test]
    fn test_stage_tags() {
        let json = r#"[
            { "stage": "filter_channel", "channel": 2 },
            { "stage": "force_channel", "channel": 9 },
            { "stage": "map_channel", "from": 0, "to": 1 },
            { "stage": "map_controller", "from": 1, "to": 74 }
        ]"#;
        let stages: Vec<StageConfig> = serde_json::from_str(json).unwrap();
        assert_eq!(stages[0], StageConfig::FilterChannel { channel: 2 });
        assert_eq!(stages[3], StageConfig::MapController { from: 1, to: 74 });

        let config = PipelineConfig {
            strict: false,
            stages,
        };
        let pipeline = config.build().unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec!["filter_channel", "force_channel", "map_channel", "map_controller"]
        );
        let out = pipeline.process_to_vec(MidiEvent::control_change(2, 1, 64));
        assert_eq!(out[0].as_bytes(), &[0xB9, 74, 64]);
    }

    #[test]
    fn test_unknown_stage_is_a_parse_error() {
        let result = serde_json::from_str::<StageConfig>(r#"{ "stage": "echo" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_strict_config_validates_parameters() {
        let config = PipelineConfig {
            strict: true,
            stages: vec![StageConfig::ForceChannel { channel: 16 }],
        };
        assert_eq!(config.build().unwrap_err(), Error::ChannelOutOfRange(16));
    }

    #[test]
    fn test_map_channels_requires_inputs() {
        let config = PipelineConfig {
            strict: false,
            stages: vec![StageConfig::MapChannels {
                inputs: vec![],
                outputs: vec![1],
            }],
        };
        assert!(matches!(config.build(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_serialize_round_trip() {
        let config = PipelineConfig {
            strict: true,
            stages: vec![
                StageConfig::Filter {
                    kind: FilterKind::ChannelVoice,
                },
                StageConfig::Transpose { interval: 7 },
            ],
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""stage":"filter","kind":"channel_voice""#));
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
