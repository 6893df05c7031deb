//! Transformation combinators.
//!
//! Each combinator is a [`Stage`] closed over its parameters at construction.
//! Single-output combinators rewrite their owned event in place; the fan-out
//! combinator clones before rewriting so copies never share `data`.
//!
//! No range checks are applied to results. A channel above 15 spills into the
//! status nibble and a transposed note can leave 0-127; strict pipelines
//! reject both (see [`crate::validate`]).

use smallvec::SmallVec;

use crate::classify::{has_note, is_channel_message, is_control_change};
use crate::error::{Error, Result};
use crate::event::MidiEvent;
use crate::pipeline::Stage;
use crate::validate::check_channel;

/// Moves every channel message to one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForceChannel {
    pub channel: u8,
}

pub fn force_channel(channel: u8) -> ForceChannel {
    ForceChannel { channel }
}

impl Stage for ForceChannel {
    #[inline]
    fn apply(&self, mut event: MidiEvent, emit: &mut dyn FnMut(MidiEvent)) {
        if is_channel_message(&event) {
            event.set_channel(self.channel);
        }
        emit(event);
    }

    fn name(&self) -> &'static str {
        "force_channel"
    }

    fn check(&self) -> Result<()> {
        check_channel(self.channel)
    }
}

/// Moves channel messages on `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapChannel {
    pub from: u8,
    pub to: u8,
}

pub fn map_channel(from: u8, to: u8) -> MapChannel {
    MapChannel { from, to }
}

impl Stage for MapChannel {
    #[inline]
    fn apply(&self, mut event: MidiEvent, emit: &mut dyn FnMut(MidiEvent)) {
        if is_channel_message(&event) && event.channel() == Some(self.from) {
            event.set_channel(self.to);
        }
        emit(event);
    }

    fn name(&self) -> &'static str {
        "map_channel"
    }

    fn check(&self) -> Result<()> {
        check_channel(self.from)?;
        check_channel(self.to)
    }
}

/// Duplicates channel messages on any of `inputs` onto every channel in `outputs`.
///
/// Copies are emitted in `outputs` order and share the source's
/// `time_stamp`/`delta_time`. A match with no outputs emits nothing.
/// Non-matching events pass through once, unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapChannels {
    pub inputs: SmallVec<[u8; 16]>,
    pub outputs: SmallVec<[u8; 16]>,
}

pub fn map_channels<I, O>(inputs: I, outputs: O) -> MapChannels
where
    I: IntoIterator<Item = u8>,
    O: IntoIterator<Item = u8>,
{
    MapChannels {
        inputs: inputs.into_iter().collect(),
        outputs: outputs.into_iter().collect(),
    }
}

impl MapChannels {
    #[inline]
    fn matches(&self, event: &MidiEvent) -> bool {
        is_channel_message(event)
            && event
                .channel()
                .is_some_and(|channel| self.inputs.contains(&channel))
    }
}

impl Stage for MapChannels {
    fn apply(&self, mut event: MidiEvent, emit: &mut dyn FnMut(MidiEvent)) {
        if !self.matches(&event) {
            emit(event);
            return;
        }

        let Some((&last, rest)) = self.outputs.split_last() else {
            return;
        };
        for &channel in rest {
            let mut copy = event.clone();
            copy.set_channel(channel);
            emit(copy);
        }
        // The source itself becomes the final copy.
        event.set_channel(last);
        emit(event);
    }

    fn name(&self) -> &'static str {
        "map_channels"
    }

    fn check(&self) -> Result<()> {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .try_for_each(|&channel| check_channel(channel))
    }
}

/// Renumbers Control Change `from` to `to`.
///
/// Matches every Control Change, Channel Mode shapes included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapController {
    pub from: u8,
    pub to: u8,
}

pub fn map_controller(from: u8, to: u8) -> MapController {
    MapController { from, to }
}

impl Stage for MapController {
    #[inline]
    fn apply(&self, mut event: MidiEvent, emit: &mut dyn FnMut(MidiEvent)) {
        if is_control_change(&event) && event.data1() == Some(self.from) {
            event.data[1] = self.to;
        }
        emit(event);
    }

    fn name(&self) -> &'static str {
        "map_controller"
    }

    fn check(&self) -> Result<()> {
        for cc in [self.from, self.to] {
            if cc > 0x7F {
                return Err(Error::InvalidStage {
                    stage: self.name(),
                    reason: format!("controller {} out of range (0-127)", cc),
                });
            }
        }
        Ok(())
    }
}

/// Shifts the note number of Note On/Off and Poly Pressure messages.
///
/// Uses wrapping byte arithmetic; the result is not clamped to 0-127.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transpose {
    pub interval: i8,
}

pub fn transpose(interval: i8) -> Transpose {
    Transpose { interval }
}

impl Stage for Transpose {
    #[inline]
    fn apply(&self, mut event: MidiEvent, emit: &mut dyn FnMut(MidiEvent)) {
        if has_note(&event) {
            if let Some(note) = event.data.get_mut(1) {
                *note = note.wrapping_add_signed(self.interval);
            }
        }
        emit(event);
    }

    fn name(&self) -> &'static str {
        "transpose"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply<S: Stage>(stage: &S, event: MidiEvent) -> Vec<MidiEvent> {
        let mut out = Vec::new();
        stage.apply(event, &mut |e| out.push(e));
        out
    }

    fn ev(bytes: &[u8]) -> MidiEvent {
        MidiEvent::from_bytes(bytes)
    }

    #[test]
    fn test_force_channel() {
        let stage = force_channel(3);
        assert_eq!(apply(&stage, ev(&[0x90, 60, 1]))[0].as_bytes(), &[0x93, 60, 1]);
        assert_eq!(apply(&stage, ev(&[0xBF, 123, 0]))[0].as_bytes(), &[0xB3, 123, 0]);
        assert_eq!(apply(&stage, ev(&[0xF8]))[0].as_bytes(), &[0xF8]);
    }

    #[test]
    fn test_force_channel_is_idempotent() {
        let stage = force_channel(3);
        let once = apply(&stage, ev(&[0xE7, 0, 64])).remove(0);
        let twice = apply(&stage, once.clone()).remove(0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_map_channel() {
        let stage = map_channel(0, 5);
        assert_eq!(apply(&stage, ev(&[0xC0, 10]))[0].as_bytes(), &[0xC5, 10]);
        assert_eq!(apply(&stage, ev(&[0xC1, 10]))[0].as_bytes(), &[0xC1, 10]);
        assert_eq!(apply(&stage, ev(&[0xF0, 0x7E, 0xF7]))[0].as_bytes(), &[0xF0, 0x7E, 0xF7]);
    }

    #[test]
    fn test_map_channel_round_trip() {
        let forward = map_channel(0, 5);
        let back = map_channel(5, 0);
        for bytes in [&[0x90, 60, 1][..], &[0x85, 60, 0], &[0xB3, 1, 2]] {
            let event = ev(bytes);
            let there = apply(&forward, event.clone()).remove(0);
            let again = apply(&back, there).remove(0);
            if event.channel() == Some(0) {
                assert_eq!(again, event);
            }
        }
        // Channel 3 is untouched by both stages.
        let other = ev(&[0xB3, 1, 2]);
        assert_eq!(apply(&forward, other.clone())[0], other);
        assert_eq!(apply(&back, other.clone())[0], other);
    }

    #[test]
    fn test_map_channels_fan_out() {
        let stage = map_channels([0, 1], [2, 3, 4]);
        let source = MidiEvent::realtime(42.0, &[0x90, 60, 100]);
        let out = apply(&stage, source);
        assert_eq!(out.len(), 3);
        let channels: Vec<u8> = out.iter().filter_map(|e| e.channel()).collect();
        assert_eq!(channels, vec![2, 3, 4]);
        for event in &out {
            assert_eq!(&event.data[1..], &[60, 100]);
            assert_eq!(event.time_stamp, Some(42.0));
        }
    }

    #[test]
    fn test_map_channels_non_matching_passes_once() {
        let stage = map_channels([0, 1], [2, 3, 4]);
        let event = MidiEvent::realtime(1.0, &[0x95, 60, 100]);
        assert_eq!(apply(&stage, event.clone()), vec![event]);

        let clock = ev(&[0xF8]);
        assert_eq!(apply(&stage, clock.clone()), vec![clock]);
    }

    #[test]
    fn test_map_channels_empty_outputs_drops_match() {
        let stage = map_channels([0], []);
        assert!(apply(&stage, ev(&[0x90, 60, 1])).is_empty());
        assert_eq!(apply(&stage, ev(&[0x91, 60, 1])).len(), 1);
    }

    #[test]
    fn test_map_channels_copies_are_independent() {
        let stage = map_channels([0], [1, 2]);
        let mut out = apply(&stage, ev(&[0xF0, 1, 2, 3, 4, 0xF7]));
        // SysEx has no channel: passes through once.
        assert_eq!(out.len(), 1);

        out = apply(&stage, ev(&[0xB0, 7, 100]));
        out[0].data[2] = 1;
        assert_eq!(out[1].data[2], 100);
    }

    #[test]
    fn test_map_controller() {
        let stage = map_controller(7, 10);
        assert_eq!(apply(&stage, ev(&[0xB0, 7, 100]))[0].as_bytes(), &[0xB0, 10, 100]);
        assert_eq!(apply(&stage, ev(&[0xB0, 8, 100]))[0].as_bytes(), &[0xB0, 8, 100]);
        // Note On with the same data1 is not a controller.
        assert_eq!(apply(&stage, ev(&[0x90, 7, 100]))[0].as_bytes(), &[0x90, 7, 100]);
        // Status-only Control Change passes unchanged.
        assert_eq!(apply(&stage, ev(&[0xB0]))[0].as_bytes(), &[0xB0]);
    }

    #[test]
    fn test_map_controller_matches_channel_mode_shapes() {
        let stage = map_controller(123, 64);
        assert_eq!(apply(&stage, ev(&[0xB2, 123, 0]))[0].as_bytes(), &[0xB2, 64, 0]);
    }

    #[test]
    fn test_transpose() {
        let stage = transpose(12);
        assert_eq!(apply(&stage, ev(&[0x90, 60, 100]))[0].note(), Some(72));
        assert_eq!(apply(&stage, ev(&[0x80, 60, 0]))[0].note(), Some(72));
        assert_eq!(apply(&stage, ev(&[0xA0, 60, 5]))[0].note(), Some(72));
        assert_eq!(apply(&stage, ev(&[0xB0, 60, 5]))[0].as_bytes(), &[0xB0, 60, 5]);
        assert_eq!(apply(&stage, ev(&[0x90]))[0].as_bytes(), &[0x90]);
    }

    #[test]
    fn test_transpose_does_not_clamp() {
        assert_eq!(apply(&transpose(12), ev(&[0x90, 120, 1]))[0].note(), Some(132));
        assert_eq!(apply(&transpose(-12), ev(&[0x90, 5, 1]))[0].note(), Some(249));
    }

    #[test]
    fn test_check_parameters() {
        assert!(force_channel(15).check().is_ok());
        assert_eq!(force_channel(16).check(), Err(Error::ChannelOutOfRange(16)));
        assert_eq!(map_channel(0, 20).check(), Err(Error::ChannelOutOfRange(20)));
        assert_eq!(
            map_channels([0], [1, 99]).check(),
            Err(Error::ChannelOutOfRange(99))
        );
        assert!(map_controller(0, 127).check().is_ok());
        assert!(map_controller(128, 0).check().is_err());
        assert!(transpose(-128).check().is_ok());
    }
}
