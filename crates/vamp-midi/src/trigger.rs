//! Parses the MIDI driver boundary's 32-bit raw word into typed messages
//! and triggers.
//!
//! Word layout (matching the packed-word convention of CoreMIDI-style
//! drivers): the low 24 bits hold a 3-byte MIDI message, most significant
//! byte first — `0x00_STATUS_DATA1_DATA2`. The top byte is reserved for
//! driver-specific framing and ignored here.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A fully parsed channel-voice message, velocity/value included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    PitchBend { channel: u8, value: u16 },
}

impl MidiMessage {
    pub fn channel(&self) -> u8 {
        match *self {
            MidiMessage::NoteOn { channel, .. }
            | MidiMessage::NoteOff { channel, .. }
            | MidiMessage::ControlChange { channel, .. }
            | MidiMessage::ProgramChange { channel, .. }
            | MidiMessage::PitchBend { channel, .. } => channel,
        }
    }

    /// The identity used to key mappings (§4.8 Learn / Control dispatcher);
    /// `None` for messages that are never mapping targets (program change,
    /// pitch bend, note-off).
    pub fn trigger(&self) -> Option<MidiTrigger> {
        match *self {
            MidiMessage::NoteOn { channel, note, .. } => Some(MidiTrigger::NoteOn { channel, note }),
            MidiMessage::ControlChange {
                channel, controller, ..
            } => Some(MidiTrigger::Cc { channel, controller }),
            _ => None,
        }
    }

    /// Raw value scaled to `[0, 1]`, for continuous controls.
    pub fn normalized_value(&self) -> Option<f32> {
        match *self {
            MidiMessage::ControlChange { value, .. } => Some(value as f32 / 127.0),
            MidiMessage::NoteOn { velocity, .. } => Some(velocity as f32 / 127.0),
            MidiMessage::PitchBend { value, .. } => Some(value as f32 / 16383.0),
            _ => None,
        }
    }

    /// Re-encode back to the 3-byte wire form, for output.
    pub fn to_bytes(self) -> [u8; 3] {
        match self {
            MidiMessage::NoteOn { channel, note, velocity } => [0x90 | (channel & 0x0F), note, velocity],
            MidiMessage::NoteOff { channel, note, velocity } => [0x80 | (channel & 0x0F), note, velocity],
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => [0xB0 | (channel & 0x0F), controller, value],
            MidiMessage::ProgramChange { channel, program } => [0xC0 | (channel & 0x0F), program, 0],
            MidiMessage::PitchBend { channel, value } => {
                [0xE0 | (channel & 0x0F), (value & 0x7F) as u8, ((value >> 7) & 0x7F) as u8]
            }
        }
    }
}

/// Identity used to key a persistent mapping (§4.8): a `NoteOn` or `CC` on
/// a given channel. Note-off, program change, and pitch bend are never
/// mapping targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MidiTrigger {
    NoteOn { channel: u8, note: u8 },
    Cc { channel: u8, controller: u8 },
}

/// Parse a driver-supplied 32-bit raw word into a typed [`MidiMessage`].
pub fn parse_word(word: u32) -> Result<MidiMessage> {
    let status = ((word >> 16) & 0xFF) as u8;
    let data1 = ((word >> 8) & 0xFF) as u8;
    let data2 = (word & 0xFF) as u8;
    parse_bytes(status, data1, data2).ok_or(Error::MalformedWord(word))
}

fn parse_bytes(status: u8, data1: u8, data2: u8) -> Option<MidiMessage> {
    let channel = status & 0x0F;
    match status & 0xF0 {
        0x80 => Some(MidiMessage::NoteOff {
            channel,
            note: data1,
            velocity: data2,
        }),
        0x90 => {
            if data2 == 0 {
                Some(MidiMessage::NoteOff {
                    channel,
                    note: data1,
                    velocity: 0,
                })
            } else {
                Some(MidiMessage::NoteOn {
                    channel,
                    note: data1,
                    velocity: data2,
                })
            }
        }
        0xB0 => Some(MidiMessage::ControlChange {
            channel,
            controller: data1,
            value: data2,
        }),
        0xC0 => Some(MidiMessage::ProgramChange { channel, program: data1 }),
        0xE0 => Some(MidiMessage::PitchBend {
            channel,
            value: ((data2 as u16) << 7) | data1 as u16,
        }),
        _ => None,
    }
}

/// Parse a raw 3-byte MIDI message as received from hardware ports (`midir`
/// callbacks deliver bytes, not packed words).
pub fn parse_bytes_slice(bytes: &[u8]) -> Result<MidiMessage> {
    if bytes.len() < 2 {
        return Err(Error::MalformedWord(0));
    }
    let data2 = bytes.get(2).copied().unwrap_or(0);
    parse_bytes(bytes[0], bytes[1], data2).ok_or(Error::MalformedWord(
        ((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | data2 as u32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_note_on() {
        let word = 0x00_90_3C_64; // note on, ch0, note 60, vel 100
        let msg = parse_word(word).unwrap();
        assert_eq!(
            msg,
            MidiMessage::NoteOn {
                channel: 0,
                note: 60,
                velocity: 100
            }
        );
    }

    #[test]
    fn note_on_with_zero_velocity_is_note_off() {
        let word = 0x00_91_3C_00;
        let msg = parse_word(word).unwrap();
        assert_eq!(
            msg,
            MidiMessage::NoteOff {
                channel: 1,
                note: 60,
                velocity: 0
            }
        );
    }

    #[test]
    fn cc_round_trips_through_trigger() {
        let msg = parse_word(0x00_B2_0B_40).unwrap();
        assert_eq!(
            msg.trigger(),
            Some(MidiTrigger::Cc {
                channel: 2,
                controller: 11
            })
        );
        assert!((msg.normalized_value().unwrap() - 64.0 / 127.0).abs() < 1e-6);
    }

    #[test]
    fn note_off_and_pitch_bend_have_no_trigger_identity() {
        assert_eq!(
            MidiMessage::NoteOff {
                channel: 0,
                note: 1,
                velocity: 0
            }
            .trigger(),
            None
        );
        assert_eq!(MidiMessage::PitchBend { channel: 0, value: 0 }.trigger(), None);
    }

    #[test]
    fn malformed_status_byte_is_rejected() {
        assert!(parse_word(0x00_FF_00_00).is_err());
    }

    #[test]
    fn to_bytes_round_trips() {
        let msg = MidiMessage::ControlChange {
            channel: 5,
            controller: 74,
            value: 99,
        };
        let bytes = msg.to_bytes();
        let back = parse_bytes_slice(&bytes).unwrap();
        assert_eq!(back, msg);
    }
}
