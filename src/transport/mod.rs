//! Byte transports feeding and draining the engine
//!
//! The engine only sees [`ByteSource`] and [`ByteSink`]. Inputs that produce
//! bytes on another thread (MIDI callbacks, blocking readers) hand chunks
//! over a channel to a [`ChannelSource`].

pub mod midi;
pub mod stream;

use anyhow::Result;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// Where input bytes come from
pub trait ByteSource {
    /// Next chunk of input.
    ///
    /// `Some` with an empty vector means nothing arrived yet, `None` means
    /// the input is closed.
    fn read(&mut self) -> Result<Option<Vec<u8>>>;
}

/// Where output bytes go
pub trait ByteSink {
    /// Write a complete output sequence
    fn write(&mut self, bytes: &[u8]) -> Result<()>;
}

impl ByteSink for Vec<u8> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Source draining chunks sent from another thread
pub struct ChannelSource {
    receiver: Receiver<Vec<u8>>,
    poll: Duration,
}

impl ChannelSource {
    /// `poll` bounds how long a read waits before reporting no input
    pub fn new(receiver: Receiver<Vec<u8>>, poll: Duration) -> Self {
        Self { receiver, poll }
    }
}

impl ByteSource for ChannelSource {
    fn read(&mut self) -> Result<Option<Vec<u8>>> {
        match self.receiver.recv_timeout(self.poll) {
            Ok(chunk) => Ok(Some(chunk)),
            Err(RecvTimeoutError::Timeout) => Ok(Some(Vec::new())),
            Err(RecvTimeoutError::Disconnected) => Ok(None),
        }
    }
}

/// Source replaying fixed chunks, then closing
#[derive(Debug, Clone, Default)]
pub struct ChunkSource {
    chunks: std::collections::VecDeque<Vec<u8>>,
}

impl ChunkSource {
    pub fn new<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        Self {
            chunks: chunks.into_iter().collect(),
        }
    }
}

impl ByteSource for ChunkSource {
    fn read(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.chunks.pop_front())
    }
}
