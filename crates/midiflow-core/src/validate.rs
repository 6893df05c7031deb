//! Range checks used by strict pipelines.
//!
//! Classification and transformation never call into this module on their
//! own; permissive pipelines pass out-of-range bytes through as-is.

use crate::error::{Error, Result};
use crate::event::MidiEvent;

const SYSEX_START: u8 = 0xF0;
const SYSEX_END: u8 = 0xF7;

#[inline]
pub fn check_channel(channel: u8) -> Result<()> {
    if channel > 0x0F {
        return Err(Error::ChannelOutOfRange(channel));
    }
    Ok(())
}

/// Status byte present and >= 0x80, every following byte <= 0x7F.
///
/// The closing 0xF7 of a SysEx message is accepted. Messages shorter than
/// their status implies are not rejected.
pub fn check_event(event: &MidiEvent) -> Result<()> {
    let (&status, data) = event.data.split_first().ok_or(Error::MissingStatus)?;
    if status < 0x80 {
        return Err(Error::InvalidStatus(status));
    }

    let body = match data.split_last() {
        Some((&SYSEX_END, body)) if status == SYSEX_START => body,
        _ => data,
    };
    for (offset, &value) in body.iter().enumerate() {
        if value > 0x7F {
            return Err(Error::DataByteOutOfRange {
                index: offset + 1,
                value,
            });
        }
    }
    Ok(())
}

#[inline]
pub fn is_valid(event: &MidiEvent) -> bool {
    check_event(event).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_events() {
        for bytes in [
            &[0x90, 60, 100][..],
            &[0xC0, 127],
            &[0xF8],
            &[0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7],
            &[0xB0],
        ] {
            assert!(is_valid(&MidiEvent::from_bytes(bytes)), "{:02X?}", bytes);
        }
    }

    #[test]
    fn test_invalid_events() {
        assert_eq!(check_event(&MidiEvent::default()), Err(Error::MissingStatus));
        assert_eq!(
            check_event(&MidiEvent::from_bytes(&[0x3C, 1])),
            Err(Error::InvalidStatus(0x3C))
        );
        assert_eq!(
            check_event(&MidiEvent::from_bytes(&[0x90, 132, 1])),
            Err(Error::DataByteOutOfRange {
                index: 1,
                value: 132
            })
        );
        assert_eq!(
            check_event(&MidiEvent::from_bytes(&[0xB0, 7, 0x80])),
            Err(Error::DataByteOutOfRange {
                index: 2,
                value: 0x80
            })
        );
        // 0xF7 only terminates a SysEx.
        assert!(!is_valid(&MidiEvent::from_bytes(&[0x90, 60, 0xF7])));
    }

    #[test]
    fn test_check_channel() {
        assert!(check_channel(0).is_ok());
        assert!(check_channel(15).is_ok());
        assert_eq!(check_channel(16), Err(Error::ChannelOutOfRange(16)));
    }
}
