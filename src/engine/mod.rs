//! Remapping engine for ccmap
//!
//! Decodes the input stream byte by byte, rewrites sources through the
//! mapping table and writes each output sequence as soon as it is complete.

mod decoder;
mod dispatcher;
mod encoder;

pub use decoder::{Decoded, DecoderState, SourceEvent, StreamDecoder};
pub use dispatcher::Dispatcher;
pub use encoder::{Encoder, RPN_NULL};

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use tracing::{info, trace};

use crate::mapping::MappingTable;
use crate::transport::{ByteSink, ByteSource};

/// Traffic counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub remapped: u64,
}

/// The remapping engine
pub struct Engine<'t> {
    decoder: StreamDecoder,
    dispatcher: Dispatcher<'t>,
    bytes_in: u64,
    bytes_out: u64,
}

impl<'t> Engine<'t> {
    /// Create an engine over a fully loaded table
    pub fn new(table: &'t MappingTable) -> Self {
        Self {
            decoder: StreamDecoder::new(),
            dispatcher: Dispatcher::new(table),
            bytes_in: 0,
            bytes_out: 0,
        }
    }

    /// Process one input byte, appending any completed output to `out`
    pub fn process_byte(&mut self, byte: u8, out: &mut Vec<u8>) {
        self.bytes_in += 1;
        if let Some(decoded) = self.decoder.feed(byte) {
            let before = out.len();
            self.dispatcher.dispatch(decoded, out);
            self.bytes_out += (out.len() - before) as u64;
        }
    }

    /// Process a chunk and return everything it produced
    pub fn process(&mut self, bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(bytes.len());
        for &byte in bytes {
            self.process_byte(byte, &mut out);
        }
        out
    }

    /// Pump `source` into `sink` until the source closes or `shutdown` is set.
    ///
    /// `shutdown` is only checked between chunks, so every output sequence
    /// is written whole.
    pub fn run<S, K>(&mut self, source: &mut S, sink: &mut K, shutdown: &AtomicBool) -> Result<Stats>
    where
        S: ByteSource + ?Sized,
        K: ByteSink + ?Sized,
    {
        let mut out = Vec::new();

        while !shutdown.load(Ordering::SeqCst) {
            let Some(chunk) = source.read()? else {
                info!("input closed");
                break;
            };
            if chunk.is_empty() {
                continue;
            }
            trace!("[{}] {:02X?}", chunk.len(), chunk);

            for &byte in &chunk {
                self.process_byte(byte, &mut out);
                if !out.is_empty() {
                    sink.write(&out)?;
                    out.clear();
                }
            }
        }

        Ok(self.stats())
    }

    pub fn stats(&self) -> Stats {
        Stats {
            bytes_in: self.bytes_in,
            bytes_out: self.bytes_out,
            remapped: self.dispatcher.remapped(),
        }
    }

    /// Input running status
    pub fn input_status(&self) -> Option<u8> {
        self.decoder.last_status()
    }

    /// Output running status
    pub fn output_status(&self) -> Option<u8> {
        self.dispatcher.encoder().last_status()
    }
}
