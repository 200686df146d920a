//! Raw byte-stream transport: stdin/stdout, files, raw MIDI devices

use std::io::{ErrorKind, Read, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, error};

use super::{ByteSink, ChannelSource};

/// Chunk size for blocking reads
const READ_BUFFER: usize = 1024;

/// Read `reader` on a background thread.
///
/// The returned source closes when the reader hits end of file or fails.
pub fn spawn_reader<R>(mut reader: R, poll: Duration) -> Result<ChannelSource>
where
    R: Read + Send + 'static,
{
    let (sender, receiver) = mpsc::channel::<Vec<u8>>();

    thread::Builder::new()
        .name("ccmap-reader".to_string())
        .spawn(move || {
            let mut buffer = [0u8; READ_BUFFER];
            loop {
                match reader.read(&mut buffer) {
                    Ok(0) => {
                        debug!("input reached end of stream");
                        break;
                    }
                    Ok(n) => {
                        if sender.send(buffer[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => {
                        error!("problem reading input: {}", e);
                        break;
                    }
                }
            }
        })
        .context("failed to spawn reader thread")?;

    Ok(ChannelSource::new(receiver, poll))
}

/// Sink writing to any `Write`, flushed after every sequence
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ByteSink for WriterSink<W> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes).context("problem writing output")?;
        self.writer.flush().context("problem flushing output")?;
        Ok(())
    }
}
