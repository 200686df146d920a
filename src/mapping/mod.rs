//! Mapping system for rewriting MIDI sources
//!
//! Holds the per-source table and the integer scaling applied to values
//! on their way to the destination.

mod destination;
mod scaling;
mod table;

pub use destination::{
    parse_number, parse_signed, DestinationType, SourceSelector, MAX_14BIT, MAX_7BIT,
    PITCH_BEND_CENTER,
};
pub use scaling::{clip, scale, scale_and_clip};
pub use table::{MappingEntry, MappingTable, MappingWarning, CC_COUNT};
