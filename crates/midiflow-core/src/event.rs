//! MIDI event record: arrival time plus raw wire bytes.

use midi_msg::MidiMsg;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Raw wire bytes `[status, data1, data2, ...]`.
///
/// Three bytes stay inline; longer payloads (SysEx) spill to the heap.
pub type EventData = SmallVec<[u8; 3]>;

/// Status byte high nibbles (and the system prefix).
pub mod status {
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const POLY_PRESSURE: u8 = 0xA0;
    pub const CONTROL_CHANGE: u8 = 0xB0;
    pub const PROGRAM_CHANGE: u8 = 0xC0;
    pub const CHANNEL_PRESSURE: u8 = 0xD0;
    pub const PITCH_BEND: u8 = 0xE0;
    pub const SYSTEM: u8 = 0xF0;
}

/// A single MIDI event.
///
/// Realtime input carries a `time_stamp` (milliseconds since the port
/// manager's epoch); sequenced events carry a `delta_time` in ticks instead.
/// Cloning deep-copies `data`, so copies never alias.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MidiEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_stamp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_time: Option<u32>,
    pub data: EventData,
}

impl MidiEvent {
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            time_stamp: None,
            delta_time: None,
            data: SmallVec::from_slice(bytes),
        }
    }

    /// Event received from a live port at `time_stamp` milliseconds.
    #[inline]
    pub fn realtime(time_stamp: f64, bytes: &[u8]) -> Self {
        Self {
            time_stamp: Some(time_stamp),
            delta_time: None,
            data: SmallVec::from_slice(bytes),
        }
    }

    /// Event from a sequence, `delta_time` ticks after its predecessor.
    #[inline]
    pub fn sequenced(delta_time: u32, bytes: &[u8]) -> Self {
        Self {
            time_stamp: None,
            delta_time: Some(delta_time),
            data: SmallVec::from_slice(bytes),
        }
    }

    #[inline]
    pub fn with_time_stamp(mut self, time_stamp: f64) -> Self {
        self.time_stamp = Some(time_stamp);
        self
    }

    #[inline]
    pub fn with_delta_time(mut self, delta_time: u32) -> Self {
        self.delta_time = Some(delta_time);
        self
    }

    // Constructors mask channel and data bytes to their wire widths.

    #[inline]
    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        Self::channel_message(status::NOTE_ON, channel, &[note, velocity])
    }

    #[inline]
    pub fn note_off(channel: u8, note: u8, velocity: u8) -> Self {
        Self::channel_message(status::NOTE_OFF, channel, &[note, velocity])
    }

    #[inline]
    pub fn poly_pressure(channel: u8, note: u8, pressure: u8) -> Self {
        Self::channel_message(status::POLY_PRESSURE, channel, &[note, pressure])
    }

    #[inline]
    pub fn control_change(channel: u8, controller: u8, value: u8) -> Self {
        Self::channel_message(status::CONTROL_CHANGE, channel, &[controller, value])
    }

    #[inline]
    pub fn program_change(channel: u8, program: u8) -> Self {
        Self::channel_message(status::PROGRAM_CHANGE, channel, &[program])
    }

    #[inline]
    pub fn channel_pressure(channel: u8, pressure: u8) -> Self {
        Self::channel_message(status::CHANNEL_PRESSURE, channel, &[pressure])
    }

    /// `value`: signed 14-bit (-8192 to 8191), 0 is centre.
    pub fn pitch_bend(channel: u8, value: i16) -> Self {
        let unsigned = (value as i32 + 8192).clamp(0, 16383) as u16;
        let lsb = (unsigned & 0x7F) as u8;
        let msb = ((unsigned >> 7) & 0x7F) as u8;
        Self::channel_message(status::PITCH_BEND, channel, &[lsb, msb])
    }

    fn channel_message(kind: u8, channel: u8, data: &[u8]) -> Self {
        let mut bytes: EventData = SmallVec::new();
        bytes.push(kind | (channel & 0x0F));
        bytes.extend(data.iter().map(|b| b & 0x7F));
        Self {
            time_stamp: None,
            delta_time: None,
            data: bytes,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn status(&self) -> Option<u8> {
        self.data.first().copied()
    }

    /// High nibble of the status byte.
    #[inline]
    pub fn message_type(&self) -> Option<u8> {
        self.status().map(|s| s & 0xF0)
    }

    /// True for status bytes 0x80..=0xEF.
    #[inline]
    pub fn has_channel_status(&self) -> bool {
        matches!(self.status(), Some(0x80..=0xEF))
    }

    /// Channel (0-15) of a channel message, `None` otherwise.
    #[inline]
    pub fn channel(&self) -> Option<u8> {
        if self.has_channel_status() {
            self.status().map(|s| s & 0x0F)
        } else {
            None
        }
    }

    /// Overwrites the channel nibble of a channel message; no-op otherwise.
    ///
    /// `channel` is not range-checked. Values above 15 spill into the
    /// message-type nibble.
    #[inline]
    pub fn set_channel(&mut self, channel: u8) {
        if self.has_channel_status() {
            self.data[0] = (self.data[0] & 0xF0) | channel;
        }
    }

    #[inline]
    pub fn data1(&self) -> Option<u8> {
        self.data.get(1).copied()
    }

    #[inline]
    pub fn data2(&self) -> Option<u8> {
        self.data.get(2).copied()
    }

    /// Note number of Note On/Off and Poly Pressure messages.
    #[inline]
    pub fn note(&self) -> Option<u8> {
        match self.message_type() {
            Some(status::NOTE_OFF | status::NOTE_ON | status::POLY_PRESSURE) => self.data1(),
            _ => None,
        }
    }

    #[inline]
    pub fn velocity(&self) -> Option<u8> {
        match self.message_type() {
            Some(status::NOTE_OFF | status::NOTE_ON) => self.data2(),
            _ => None,
        }
    }

    /// Controller number of a Control Change.
    #[inline]
    pub fn controller(&self) -> Option<u8> {
        match self.message_type() {
            Some(status::CONTROL_CHANGE) => self.data1(),
            _ => None,
        }
    }

    /// Controller value of a Control Change.
    #[inline]
    pub fn value(&self) -> Option<u8> {
        match self.message_type() {
            Some(status::CONTROL_CHANGE) => self.data2(),
            _ => None,
        }
    }

    /// Parses the bytes into a structured `midi_msg::MidiMsg`.
    pub fn to_midi_msg(&self) -> Result<MidiMsg, midi_msg::ParseError> {
        MidiMsg::from_midi(&self.data).map(|(msg, _len)| msg)
    }

    pub fn from_midi_msg(msg: &MidiMsg) -> Self {
        Self::from_bytes(&msg.to_midi())
    }
}

impl From<&[u8]> for MidiEvent {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl<const N: usize> From<[u8; N]> for MidiEvent {
    fn from(bytes: [u8; N]) -> Self {
        Self::from_bytes(&bytes)
    }
}
