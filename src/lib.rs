//! ccmap - MIDI controller remapper
//!
//! Rewrites control change, channel aftertouch and pitch bend messages into
//! NRPN, RPN, CC or pitch bend, with per-source output ranges. Everything
//! else passes through untouched.

pub mod config;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod transport;

pub use config::CcmapConfig;
pub use engine::Engine;
pub use error::{Error, Result};
pub use mapping::MappingTable;
