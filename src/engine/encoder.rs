//! Output encoder with running-status suppression
//!
//! Each call appends one complete message (or parameter sequence) to the
//! output buffer. A status byte is only written when it differs from the
//! last one written.

use super::SourceEvent;
use crate::mapping::{DestinationType, MappingEntry};

/// NRPN/RPN controller numbers
const NRPN_MSB: u8 = 0x63;
const NRPN_LSB: u8 = 0x62;
const RPN_MSB: u8 = 0x65;
const RPN_LSB: u8 = 0x64;
const DATA_ENTRY_MSB: u8 = 0x06;
const DATA_ENTRY_LSB: u8 = 0x26;

/// Deselects the current parameter so later data entry cannot change it
pub const RPN_NULL: [u8; 4] = [RPN_MSB, 0x7F, RPN_LSB, 0x7F];

/// Encoder state: the output running status
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    last_status: Option<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last status byte written to the output
    pub fn last_status(&self) -> Option<u8> {
        self.last_status
    }

    /// Encode `value` for the entry's destination.
    ///
    /// `value` must already be scaled and clipped. Unmapped entries forward
    /// `event` as it arrived.
    pub fn encode(&mut self, entry: &MappingEntry, value: i32, event: &SourceEvent, out: &mut Vec<u8>) {
        let channel = event.channel() & 0x0F;
        let value = value.clamp(0, i32::from(u16::MAX)) as u16;

        match entry.dest {
            DestinationType::None => self.forward(event, out),
            DestinationType::Cc => {
                self.status(0xB0 | channel, out);
                out.extend_from_slice(&[(entry.number & 0x7F) as u8, (value & 0x7F) as u8]);
            }
            DestinationType::Nrpn => self.parameter(NRPN_MSB, NRPN_LSB, channel, entry.number, value, out),
            DestinationType::Rpn => self.parameter(RPN_MSB, RPN_LSB, channel, entry.number, value, out),
            DestinationType::PitchBend => {
                self.status(0xE0 | channel, out);
                out.extend_from_slice(&[(value & 0x7F) as u8, ((value >> 7) & 0x7F) as u8]);
            }
            DestinationType::Aftertouch => {
                self.status(0xD0 | channel, out);
                out.push((value & 0x7F) as u8);
            }
        }
    }

    /// Re-emit a source message unchanged
    pub fn forward(&mut self, event: &SourceEvent, out: &mut Vec<u8>) {
        self.status(event.status(), out);
        match *event {
            SourceEvent::ControlChange { number, value, .. } => out.extend_from_slice(&[number, value]),
            SourceEvent::Aftertouch { value, .. } => out.push(value),
            SourceEvent::PitchBend { value, .. } => {
                out.extend_from_slice(&[(value & 0x7F) as u8, ((value >> 7) & 0x7F) as u8])
            }
        }
    }

    /// Copy a byte of an uninterpreted message
    pub fn passthrough(&mut self, byte: u8, out: &mut Vec<u8>) {
        if byte & 0x80 != 0 {
            self.last_status = Some(byte);
        }
        out.push(byte);
    }

    /// Parameter number, data entry MSB/LSB, then the null terminator
    fn parameter(&mut self, msb_cc: u8, lsb_cc: u8, channel: u8, number: u16, value: u16, out: &mut Vec<u8>) {
        self.status(0xB0 | channel, out);
        out.extend_from_slice(&[
            msb_cc,
            ((number >> 7) & 0x7F) as u8,
            lsb_cc,
            (number & 0x7F) as u8,
            DATA_ENTRY_MSB,
            ((value >> 7) & 0x7F) as u8,
            DATA_ENTRY_LSB,
            (value & 0x7F) as u8,
        ]);
        // Still under the same control change status
        out.extend_from_slice(&RPN_NULL);
    }

    fn status(&mut self, status: u8, out: &mut Vec<u8>) {
        if self.last_status != Some(status) {
            out.push(status);
            self.last_status = Some(status);
        }
    }
}
