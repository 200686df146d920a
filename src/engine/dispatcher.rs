//! Routes decoded events through the mapping table to the encoder

use tracing::debug;

use super::{Decoded, Encoder};
use crate::mapping::{scale_and_clip, MappingTable};

/// Applies the table to decoded input
pub struct Dispatcher<'t> {
    table: &'t MappingTable,
    encoder: Encoder,
    remapped: u64,
}

impl<'t> Dispatcher<'t> {
    pub fn new(table: &'t MappingTable) -> Self {
        Self {
            table,
            encoder: Encoder::new(),
            remapped: 0,
        }
    }

    /// Append the output for one decoded item to `out`
    pub fn dispatch(&mut self, decoded: Decoded, out: &mut Vec<u8>) {
        let event = match decoded {
            Decoded::Passthrough(byte) => {
                self.encoder.passthrough(byte, out);
                return;
            }
            Decoded::Event(event) => event,
        };

        let source = event.source();
        let entry = self.table.lookup(source);
        if entry.is_passthrough() {
            self.encoder.forward(&event, out);
            return;
        }

        let value = scale_and_clip(event.value(), source.source_max(), entry.from, entry.to, entry.dest);
        debug!(
            "ch{} {}={} -> {} {}",
            event.channel() + 1,
            source,
            event.value(),
            entry.dest,
            value
        );
        self.encoder.encode(entry, value, &event, out);
        self.remapped += 1;
    }

    /// Events rewritten so far
    pub fn remapped(&self) -> u64 {
        self.remapped
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }
}
