//! MIDI message classifier.
//!
//! Pure predicates over a single event's status and data bytes. Predicates
//! that need a data byte the event does not carry return `false`; nothing
//! here panics on short or empty input.
//!
//! Channel Mode messages are the Control Change messages with controller
//! numbers 120-127 in one of nine fixed shapes. Every Channel Mode predicate
//! checks [`is_control_change`] itself, so they stay correct when used alone.
//! A Control Change is Channel Voice only when it is not Channel Mode.

use serde::{Deserialize, Serialize};

use crate::event::{status, MidiEvent};

#[inline]
fn has_type(event: &MidiEvent, kind: u8) -> bool {
    event.message_type() == Some(kind)
}

/// `data1`/`data2` of a Control Change, if both are present.
#[inline]
fn cc_bytes(event: &MidiEvent) -> Option<(u8, u8)> {
    if !is_control_change(event) {
        return None;
    }
    Some((event.data1()?, event.data2()?))
}

#[inline]
fn cc_number(event: &MidiEvent) -> Option<u8> {
    if !is_control_change(event) {
        return None;
    }
    event.data1()
}

// ---------------------------------------------------------------------------
// Channel Voice
// ---------------------------------------------------------------------------

#[inline]
pub fn is_note_on(event: &MidiEvent) -> bool {
    has_type(event, status::NOTE_ON)
}

#[inline]
pub fn is_note_off(event: &MidiEvent) -> bool {
    has_type(event, status::NOTE_OFF)
}

#[inline]
pub fn is_note(event: &MidiEvent) -> bool {
    is_note_on(event) || is_note_off(event)
}

#[inline]
pub fn is_poly_pressure(event: &MidiEvent) -> bool {
    has_type(event, status::POLY_PRESSURE)
}

/// Note On/Off or Poly Pressure: anything whose `data1` is a note number.
#[inline]
pub fn has_note(event: &MidiEvent) -> bool {
    is_note(event) || is_poly_pressure(event)
}

#[inline]
pub fn is_control_change(event: &MidiEvent) -> bool {
    has_type(event, status::CONTROL_CHANGE)
}

#[inline]
pub fn is_program_change(event: &MidiEvent) -> bool {
    has_type(event, status::PROGRAM_CHANGE)
}

#[inline]
pub fn is_channel_pressure(event: &MidiEvent) -> bool {
    has_type(event, status::CHANNEL_PRESSURE)
}

#[inline]
pub fn is_pitch_bend(event: &MidiEvent) -> bool {
    has_type(event, status::PITCH_BEND)
}

// ---------------------------------------------------------------------------
// Channel Mode
// ---------------------------------------------------------------------------

#[inline]
pub fn is_all_sound_off(event: &MidiEvent) -> bool {
    cc_bytes(event) == Some((120, 0))
}

/// Controller 121 with any value.
#[inline]
pub fn is_reset_all_controllers(event: &MidiEvent) -> bool {
    cc_number(event) == Some(121)
}

#[inline]
pub fn is_local_control_off(event: &MidiEvent) -> bool {
    cc_bytes(event) == Some((122, 0))
}

#[inline]
pub fn is_local_control_on(event: &MidiEvent) -> bool {
    cc_bytes(event) == Some((122, 127))
}

#[inline]
pub fn is_all_notes_off(event: &MidiEvent) -> bool {
    cc_bytes(event) == Some((123, 0))
}

#[inline]
pub fn is_omni_off(event: &MidiEvent) -> bool {
    cc_bytes(event) == Some((124, 0))
}

#[inline]
pub fn is_omni_on(event: &MidiEvent) -> bool {
    cc_bytes(event) == Some((125, 0))
}

/// Controller 126 with any value (the value is the channel count).
#[inline]
pub fn is_mono_on(event: &MidiEvent) -> bool {
    cc_number(event) == Some(126)
}

#[inline]
pub fn is_poly_on(event: &MidiEvent) -> bool {
    cc_bytes(event) == Some((127, 0))
}

pub fn is_channel_mode(event: &MidiEvent) -> bool {
    channel_mode_kind(event).is_some()
}

pub fn is_channel_voice(event: &MidiEvent) -> bool {
    has_note(event)
        || (is_control_change(event) && !is_channel_mode(event))
        || is_program_change(event)
        || is_channel_pressure(event)
        || is_pitch_bend(event)
}

pub fn is_channel_message(event: &MidiEvent) -> bool {
    is_channel_mode(event) || is_channel_voice(event)
}

// ---------------------------------------------------------------------------
// Taxonomy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelModeKind {
    AllSoundOff,
    ResetAllControllers,
    LocalControlOff,
    LocalControlOn,
    AllNotesOff,
    OmniOff,
    OmniOn,
    MonoOn,
    PolyOn,
}

/// Single-valued classification of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    NoteOff,
    NoteOn,
    PolyPressure,
    ControlChange,
    ChannelMode(ChannelModeKind),
    ProgramChange,
    ChannelPressure,
    PitchBend,
    /// Status 0xF0-0xFF. Not broken down further.
    System,
    /// Empty data or a leading data byte (running status is not tracked).
    Unknown,
}

impl MessageKind {
    #[inline]
    pub fn is_channel_voice(self) -> bool {
        !matches!(
            self,
            MessageKind::ChannelMode(_) | MessageKind::System | MessageKind::Unknown
        )
    }
}

pub fn channel_mode_kind(event: &MidiEvent) -> Option<ChannelModeKind> {
    const PREDICATES: [(fn(&MidiEvent) -> bool, ChannelModeKind); 9] = [
        (is_all_sound_off, ChannelModeKind::AllSoundOff),
        (is_reset_all_controllers, ChannelModeKind::ResetAllControllers),
        (is_local_control_off, ChannelModeKind::LocalControlOff),
        (is_local_control_on, ChannelModeKind::LocalControlOn),
        (is_all_notes_off, ChannelModeKind::AllNotesOff),
        (is_omni_off, ChannelModeKind::OmniOff),
        (is_omni_on, ChannelModeKind::OmniOn),
        (is_mono_on, ChannelModeKind::MonoOn),
        (is_poly_on, ChannelModeKind::PolyOn),
    ];

    PREDICATES
        .iter()
        .find(|(predicate, _)| predicate(event))
        .map(|&(_, kind)| kind)
}

pub fn classify(event: &MidiEvent) -> MessageKind {
    match event.status() {
        None | Some(0x00..=0x7F) => MessageKind::Unknown,
        Some(0xF0..=0xFF) => MessageKind::System,
        Some(s) => match s & 0xF0 {
            status::NOTE_OFF => MessageKind::NoteOff,
            status::NOTE_ON => MessageKind::NoteOn,
            status::POLY_PRESSURE => MessageKind::PolyPressure,
            status::CONTROL_CHANGE => match channel_mode_kind(event) {
                Some(kind) => MessageKind::ChannelMode(kind),
                None => MessageKind::ControlChange,
            },
            status::PROGRAM_CHANGE => MessageKind::ProgramChange,
            status::CHANNEL_PRESSURE => MessageKind::ChannelPressure,
            _ => MessageKind::PitchBend,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(bytes: &[u8]) -> MidiEvent {
        MidiEvent::from_bytes(bytes)
    }

    #[test]
    fn test_note_predicates() {
        for b in 0x90..=0x9F {
            let event = ev(&[b, 60, 100]);
            assert!(is_note_on(&event));
            assert!(!is_note_off(&event));
            assert!(is_note(&event));
            assert!(has_note(&event));
        }
        for b in 0x80..=0x8F {
            let event = ev(&[b, 60, 0]);
            assert!(is_note_off(&event));
            assert!(!is_note_on(&event));
        }
    }

    #[test]
    fn test_zero_velocity_note_on_is_note_on() {
        assert!(is_note_on(&ev(&[0x90, 60, 0])));
        assert!(!is_note_off(&ev(&[0x90, 60, 0])));
    }

    #[test]
    fn test_poly_pressure_has_note_but_is_not_note() {
        let event = ev(&[0xA2, 64, 30]);
        assert!(is_poly_pressure(&event));
        assert!(has_note(&event));
        assert!(!is_note(&event));
    }

    #[test]
    fn test_status_predicates() {
        assert!(is_control_change(&ev(&[0xB0, 7, 100])));
        assert!(is_program_change(&ev(&[0xC4, 10])));
        assert!(is_channel_pressure(&ev(&[0xD1, 90])));
        assert!(is_pitch_bend(&ev(&[0xEF, 0, 64])));
        assert!(!is_pitch_bend(&ev(&[0xF8])));
    }

    #[test]
    fn test_channel_mode_shapes() {
        assert!(is_all_sound_off(&ev(&[0xB0, 120, 0])));
        assert!(!is_all_sound_off(&ev(&[0xB0, 120, 1])));
        assert!(is_reset_all_controllers(&ev(&[0xB3, 121, 55])));
        assert!(is_local_control_off(&ev(&[0xB0, 122, 0])));
        assert!(is_local_control_on(&ev(&[0xB0, 122, 127])));
        assert!(!is_channel_mode(&ev(&[0xB0, 122, 64])));
        assert!(is_all_notes_off(&ev(&[0xB0, 123, 0])));
        assert!(is_omni_off(&ev(&[0xB0, 124, 0])));
        assert!(is_omni_on(&ev(&[0xB0, 125, 0])));
        assert!(is_mono_on(&ev(&[0xB0, 126, 4])));
        assert!(is_poly_on(&ev(&[0xB0, 127, 0])));
    }

    #[test]
    fn test_channel_mode_requires_control_change() {
        // Same data bytes on a Note On status.
        let event = ev(&[0x90, 123, 0]);
        assert!(!is_all_notes_off(&event));
        assert!(!is_reset_all_controllers(&ev(&[0x90, 121, 0])));
        assert!(!is_mono_on(&ev(&[0xA0, 126, 0])));
        assert!(!is_channel_mode(&event));
        assert!(is_channel_voice(&event));
    }

    #[test]
    fn test_channel_mode_not_channel_voice() {
        let event = ev(&[0xB0, 123, 0]);
        assert!(is_channel_mode(&event));
        assert!(!is_channel_voice(&event));
        assert!(is_channel_message(&event));

        let event = ev(&[0xB0, 123, 5]);
        assert!(!is_channel_mode(&event));
        assert!(is_channel_voice(&event));
    }

    #[test]
    fn test_malformed_events_do_not_match() {
        let empty = ev(&[]);
        assert!(!is_note_on(&empty));
        assert!(!is_channel_message(&empty));

        // Status only: type predicates still match, shape predicates do not.
        let short = ev(&[0xB0]);
        assert!(is_control_change(&short));
        assert!(!is_channel_mode(&short));
        assert!(is_channel_voice(&short));

        let missing_value = ev(&[0xB0, 120]);
        assert!(!is_all_sound_off(&missing_value));
        assert!(!is_reset_all_controllers(&ev(&[0xB0])));
        assert!(is_reset_all_controllers(&ev(&[0xB0, 121])));
    }

    #[test]
    fn test_system_messages_are_not_channel_messages() {
        for bytes in [&[0xF8][..], &[0xFA], &[0xF0, 0x7E, 0xF7], &[0xF2, 0, 0]] {
            assert!(!is_channel_message(&ev(bytes)));
            assert_eq!(classify(&ev(bytes)), MessageKind::System);
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&ev(&[0x80, 60, 0])), MessageKind::NoteOff);
        assert_eq!(classify(&ev(&[0x91, 60, 1])), MessageKind::NoteOn);
        assert_eq!(classify(&ev(&[0xA0, 60, 1])), MessageKind::PolyPressure);
        assert_eq!(classify(&ev(&[0xB0, 1, 1])), MessageKind::ControlChange);
        assert_eq!(
            classify(&ev(&[0xB0, 126, 1])),
            MessageKind::ChannelMode(ChannelModeKind::MonoOn)
        );
        assert_eq!(classify(&ev(&[0xC0, 1])), MessageKind::ProgramChange);
        assert_eq!(classify(&ev(&[0xD0, 1])), MessageKind::ChannelPressure);
        assert_eq!(classify(&ev(&[0xE0, 0, 64])), MessageKind::PitchBend);
        assert_eq!(classify(&ev(&[0x3C, 64])), MessageKind::Unknown);
        assert_eq!(classify(&ev(&[])), MessageKind::Unknown);
    }

    #[test]
    fn test_message_kind_agrees_with_predicates() {
        for s in 0x80..=0xEFu8 {
            for d1 in [0u8, 7, 120, 121, 122, 123, 126, 127] {
                for d2 in [0u8, 1, 127] {
                    let event = ev(&[s, d1, d2]);
                    assert_eq!(
                        classify(&event).is_channel_voice(),
                        is_channel_voice(&event),
                        "{:02X?}",
                        event.as_bytes()
                    );
                }
            }
        }
    }
}
