//! Error type for mapping configuration.
//!
//! Everything here is fatal at load time. Non-fatal conditions are reported
//! as [`MappingWarning`](crate::mapping::MappingWarning) instead.

use thiserror::Error;

use crate::mapping::DestinationType;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid source controller number {0} (expected 0-127)")]
    SourceOutOfRange(u32),

    #[error("invalid destination number {number} for {dest} (expected {expected})")]
    DestinationNumberOutOfRange {
        dest: DestinationType,
        number: u32,
        expected: &'static str,
    },

    #[error("unusable output range {from}..{to} for {dest}: both bounds outside {min}..{max}")]
    UnusableRange {
        dest: DestinationType,
        from: i32,
        to: i32,
        min: i32,
        max: i32,
    },

    #[error("unknown source '{0}' (expected ccN, at or pb)")]
    UnknownSource(String),

    #[error("unknown destination '{0}' (expected cc, nrpn, rpn, pb, at or none)")]
    UnknownDestination(String),

    #[error("invalid map spec '{spec}': {reason}")]
    InvalidMapSpec { spec: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
