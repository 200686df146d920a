//! MIDI port transport via midir.
//!
//! The input callback runs on midir's thread and forwards every message it
//! receives as one chunk; the engine drains them through a
//! [`ChannelSource`]. On the way out, [`MessageSplitter`] turns the engine's
//! running-status output back into one complete message per send.

use std::sync::mpsc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use tracing::info;

use super::{ByteSink, ByteSource, ChannelSource};

/// Which ports to open
#[derive(Debug, Clone)]
pub struct PortSelection {
    /// Client name shown to other MIDI applications
    pub client_name: String,
    /// Substring of an existing input port, or `None` for a virtual port
    pub input: Option<String>,
    /// Substring of an existing output port, or `None` for a virtual port
    pub output: Option<String>,
    /// How long a read waits before reporting no input
    pub poll: Duration,
}

/// Open MIDI input, keeping the midir connection alive
pub struct MidiSource {
    _connection: MidiInputConnection<()>,
    inner: ChannelSource,
    port_name: String,
}

impl MidiSource {
    /// Connect to the selected input port, or create a virtual one
    pub fn open(selection: &PortSelection) -> Result<Self> {
        let mut midi_in = MidiInput::new(&format!("{} input", selection.client_name))?;
        // Forward everything, sysex and clock included
        midi_in.ignore(Ignore::None);

        let (sender, receiver) = mpsc::channel::<Vec<u8>>();
        let callback = move |_timestamp: u64, message: &[u8], _: &mut ()| {
            let _ = sender.send(message.to_vec());
        };

        let (connection, port_name) = match &selection.input {
            Some(pattern) => {
                let ports = midi_in.ports();
                let port = ports
                    .iter()
                    .find(|p| {
                        midi_in
                            .port_name(p)
                            .map(|n| n.contains(pattern.as_str()))
                            .unwrap_or(false)
                    })
                    .ok_or_else(|| anyhow!("MIDI input port '{}' not found", pattern))?
                    .clone();
                let name = midi_in.port_name(&port)?;
                let conn = midi_in
                    .connect(&port, "ccmap-in", callback, ())
                    .map_err(|e| anyhow!("failed to connect to '{}': {}", name, e))?;
                (conn, name)
            }
            None => open_virtual_input(midi_in, &selection.client_name, callback)?,
        };

        info!("MIDI input connected to: {}", port_name);

        Ok(Self {
            _connection: connection,
            inner: ChannelSource::new(receiver, selection.poll),
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl ByteSource for MidiSource {
    fn read(&mut self) -> Result<Option<Vec<u8>>> {
        self.inner.read()
    }
}

/// Open MIDI output
pub struct MidiSink {
    connection: MidiOutputConnection,
    port_name: String,
    splitter: MessageSplitter,
}

impl MidiSink {
    /// Connect to the selected output port, or create a virtual one
    pub fn open(selection: &PortSelection) -> Result<Self> {
        let midi_out = MidiOutput::new(&format!("{} output", selection.client_name))?;

        let (connection, port_name) = match &selection.output {
            Some(pattern) => {
                let ports = midi_out.ports();
                let port = ports
                    .iter()
                    .find(|p| {
                        midi_out
                            .port_name(p)
                            .map(|n| n.contains(pattern.as_str()))
                            .unwrap_or(false)
                    })
                    .ok_or_else(|| anyhow!("MIDI output port '{}' not found", pattern))?
                    .clone();
                let name = midi_out.port_name(&port)?;
                let conn = midi_out
                    .connect(&port, "ccmap-out")
                    .map_err(|e| anyhow!("failed to connect to '{}': {}", name, e))?;
                (conn, name)
            }
            None => open_virtual_output(midi_out, &selection.client_name)?,
        };

        info!("MIDI output connected to: {}", port_name);

        Ok(Self {
            connection,
            port_name,
            splitter: MessageSplitter::new(),
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl ByteSink for MidiSink {
    /// midir sends one complete message per call, so running status is
    /// expanded and multi-message sequences are sent one by one
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        for message in self.splitter.split(bytes) {
            self.connection
                .send(&message)
                .with_context(|| format!("problem writing MIDI output to '{}'", self.port_name))?;
        }
        Ok(())
    }
}

/// Reassembles complete MIDI messages from a running-status byte stream.
///
/// State carries across calls, so a message split over several writes
/// comes out once its last byte arrives.
#[derive(Debug, Clone, Default)]
pub struct MessageSplitter {
    running_status: Option<u8>,
    message: Vec<u8>,
}

impl MessageSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message completed by `bytes`, each with its status byte
    pub fn split(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        bytes.iter().filter_map(|&b| self.push(b)).collect()
    }

    /// Feed one byte, returning the message it completes
    pub fn push(&mut self, byte: u8) -> Option<Vec<u8>> {
        // Realtime bytes may appear anywhere, even inside sysex
        if byte >= 0xF8 {
            return Some(vec![byte]);
        }

        if byte == 0xF7 {
            if self.message.first() == Some(&0xF0) {
                self.message.push(byte);
                return Some(std::mem::take(&mut self.message));
            }
            self.message.clear();
            return None;
        }

        if byte & 0x80 != 0 {
            self.running_status = if byte < 0xF0 { Some(byte) } else { None };
            self.message.clear();
            self.message.push(byte);
            if byte != 0xF0 && data_len(byte) == 0 {
                return Some(std::mem::take(&mut self.message));
            }
            return None;
        }

        if self.message.is_empty() {
            // Data with no status to attach it to
            self.message.push(self.running_status?);
        }
        self.message.push(byte);

        let status = self.message[0];
        if status != 0xF0 && self.message.len() > data_len(status) {
            return Some(std::mem::take(&mut self.message));
        }
        None
    }
}

/// Number of data bytes following a status byte (sysex excluded)
fn data_len(status: u8) -> usize {
    match status & 0xF0 {
        0xC0 | 0xD0 => 1,
        0x80 | 0x90 | 0xA0 | 0xB0 | 0xE0 => 2,
        _ => match status {
            0xF1 | 0xF3 => 1,
            0xF2 => 2,
            _ => 0,
        },
    }
}

#[cfg(unix)]
fn open_virtual_input<F>(midi_in: MidiInput, client: &str, callback: F) -> Result<(MidiInputConnection<()>, String)>
where
    F: FnMut(u64, &[u8], &mut ()) + Send + 'static,
{
    use midir::os::unix::VirtualInput;

    let name = format!("{}-in", client);
    let conn = midi_in
        .create_virtual(&name, callback, ())
        .map_err(|e| anyhow!("failed to create virtual input '{}': {}", name, e))?;
    Ok((conn, name))
}

#[cfg(not(unix))]
fn open_virtual_input<F>(_midi_in: MidiInput, _client: &str, _callback: F) -> Result<(MidiInputConnection<()>, String)>
where
    F: FnMut(u64, &[u8], &mut ()) + Send + 'static,
{
    Err(anyhow!("virtual MIDI ports are not supported here, pass --input"))
}

#[cfg(unix)]
fn open_virtual_output(midi_out: MidiOutput, client: &str) -> Result<(MidiOutputConnection, String)> {
    use midir::os::unix::VirtualOutput;

    let name = format!("{}-out", client);
    let conn = midi_out
        .create_virtual(&name)
        .map_err(|e| anyhow!("failed to create virtual output '{}': {}", name, e))?;
    Ok((conn, name))
}

#[cfg(not(unix))]
fn open_virtual_output(_midi_out: MidiOutput, _client: &str) -> Result<(MidiOutputConnection, String)> {
    Err(anyhow!("virtual MIDI ports are not supported here, pass --output"))
}

/// Names of the available input and output ports
pub fn list_ports() -> Result<(Vec<String>, Vec<String>)> {
    let midi_in = MidiInput::new("ccmap list")?;
    let inputs = midi_in
        .ports()
        .iter()
        .filter_map(|p| midi_in.port_name(p).ok())
        .collect();

    let midi_out = MidiOutput::new("ccmap list")?;
    let outputs = midi_out
        .ports()
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect();

    Ok((inputs, outputs))
}
