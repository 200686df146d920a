//! Running-status MIDI byte-stream decoder
//!
//! Turns raw input bytes into source events (CC, channel aftertouch, pitch
//! bend) and hands every other byte back untouched.

use crate::mapping::SourceSelector;

/// A complete source message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEvent {
    /// Control change: channel (0-15), controller (0-127), value (0-127)
    ControlChange { channel: u8, number: u8, value: u8 },
    /// Channel aftertouch: channel (0-15), pressure (0-127)
    Aftertouch { channel: u8, value: u8 },
    /// Pitch bend: channel (0-15), value (0-16383, center at 8192)
    PitchBend { channel: u8, value: u16 },
}

impl SourceEvent {
    pub fn channel(&self) -> u8 {
        match *self {
            SourceEvent::ControlChange { channel, .. }
            | SourceEvent::Aftertouch { channel, .. }
            | SourceEvent::PitchBend { channel, .. } => channel,
        }
    }

    /// Table slot this event is looked up in
    pub fn source(&self) -> SourceSelector {
        match *self {
            SourceEvent::ControlChange { number, .. } => SourceSelector::Cc(number),
            SourceEvent::Aftertouch { .. } => SourceSelector::Aftertouch,
            SourceEvent::PitchBend { .. } => SourceSelector::PitchBend,
        }
    }

    /// The value carried, 7 or 14 bits
    pub fn value(&self) -> i32 {
        match *self {
            SourceEvent::ControlChange { value, .. } | SourceEvent::Aftertouch { value, .. } => {
                i32::from(value)
            }
            SourceEvent::PitchBend { value, .. } => i32::from(value),
        }
    }

    /// Status byte the event arrived under
    pub fn status(&self) -> u8 {
        let kind = match self {
            SourceEvent::ControlChange { .. } => 0xB0,
            SourceEvent::Aftertouch { .. } => 0xD0,
            SourceEvent::PitchBend { .. } => 0xE0,
        };
        kind | (self.channel() & 0x0F)
    }
}

/// What one input byte produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// A source message is complete
    Event(SourceEvent),
    /// Byte of a message the remapper does not interpret
    Passthrough(u8),
}

/// Parse state between two input bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoderState {
    /// Idle, or inside a message that is forwarded as is
    #[default]
    Passthru,
    /// Control change status seen, waiting for the controller number
    GotCc { channel: u8 },
    /// Controller number seen, waiting for the value
    CcValue { channel: u8, number: u8 },
    /// Aftertouch status seen, waiting for the pressure value
    GotAt { channel: u8 },
    /// Pitch bend status seen, waiting for the LSB
    GotPb { channel: u8 },
    /// Pitch bend LSB seen, waiting for the MSB
    PbMsb { channel: u8, lsb: u8 },
}

impl DecoderState {
    /// State entered on a status byte
    pub fn from_status(status: u8) -> Self {
        let channel = status & 0x0F;
        match status & 0xF0 {
            0xB0 => DecoderState::GotCc { channel },
            0xD0 => DecoderState::GotAt { channel },
            0xE0 => DecoderState::GotPb { channel },
            _ => DecoderState::Passthru,
        }
    }

    /// Advance by one byte.
    ///
    /// A status byte always starts over, dropping any half-received message.
    pub fn next(self, byte: u8) -> (Self, Option<Decoded>) {
        if byte & 0x80 != 0 {
            let state = Self::from_status(byte);
            let output = match state {
                DecoderState::Passthru => Some(Decoded::Passthrough(byte)),
                _ => None,
            };
            return (state, output);
        }

        match self {
            DecoderState::Passthru => (self, Some(Decoded::Passthrough(byte))),
            DecoderState::GotCc { channel } => (DecoderState::CcValue { channel, number: byte }, None),
            DecoderState::CcValue { channel, number } => (
                DecoderState::GotCc { channel },
                Some(Decoded::Event(SourceEvent::ControlChange {
                    channel,
                    number,
                    value: byte,
                })),
            ),
            DecoderState::GotAt { channel } => (
                self,
                Some(Decoded::Event(SourceEvent::Aftertouch { channel, value: byte })),
            ),
            DecoderState::GotPb { channel } => (DecoderState::PbMsb { channel, lsb: byte }, None),
            DecoderState::PbMsb { channel, lsb } => {
                let value = u16::from(lsb) | (u16::from(byte) << 7);
                (
                    DecoderState::GotPb { channel },
                    Some(Decoded::Event(SourceEvent::PitchBend { channel, value })),
                )
            }
        }
    }
}

/// Decoder over a byte stream, remembering the input running status
#[derive(Debug, Clone, Default)]
pub struct StreamDecoder {
    state: DecoderState,
    last_status: Option<u8>,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one input byte
    pub fn feed(&mut self, byte: u8) -> Option<Decoded> {
        if byte & 0x80 != 0 {
            self.last_status = Some(byte);
        }
        let (state, output) = self.state.next(byte);
        self.state = state;
        output
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Last status byte seen on the input
    pub fn last_status(&self) -> Option<u8> {
        self.last_status
    }
}
