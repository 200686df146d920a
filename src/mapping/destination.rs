//! Destination and source kinds with their legal value ranges

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Largest 7-bit value
pub const MAX_7BIT: i32 = 127;

/// Largest 14-bit value
pub const MAX_14BIT: i32 = 16383;

/// Offset between signed pitch bend (-8192..8191) and its unsigned wire value
pub const PITCH_BEND_CENTER: i32 = 8192;

/// What a source gets rewritten into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationType {
    /// Forward unchanged
    #[default]
    #[serde(alias = "thru")]
    None,
    /// Non-registered parameter number (CC 99/98/6/38)
    Nrpn,
    /// Registered parameter number (CC 101/100/6/38)
    Rpn,
    /// Plain control change
    Cc,
    /// Pitch bend
    #[serde(alias = "pb", alias = "pitch_bend")]
    PitchBend,
    /// Channel aftertouch
    #[serde(alias = "at")]
    Aftertouch,
}

impl DestinationType {
    /// Legal output value range, `None` has none
    pub fn value_range(self) -> Option<(i32, i32)> {
        match self {
            DestinationType::None => None,
            DestinationType::Cc | DestinationType::Aftertouch => Some((0, MAX_7BIT)),
            DestinationType::Nrpn | DestinationType::Rpn | DestinationType::PitchBend => {
                Some((0, MAX_14BIT))
            }
        }
    }

    /// Largest destination number this type accepts
    pub fn max_number(self) -> u32 {
        match self {
            DestinationType::Cc => MAX_7BIT as u32,
            DestinationType::Nrpn | DestinationType::Rpn => MAX_14BIT as u32,
            DestinationType::None | DestinationType::PitchBend | DestinationType::Aftertouch => 0,
        }
    }

    /// Offset applied to user-facing bounds to get internal values.
    ///
    /// Pitch bend bounds are written signed, centered on zero.
    pub fn user_offset(self) -> i32 {
        match self {
            DestinationType::PitchBend => PITCH_BEND_CENTER,
            _ => 0,
        }
    }

    /// Whether the destination is addressed by a number
    pub fn is_numbered(self) -> bool {
        self.max_number() > 0
    }
}

impl fmt::Display for DestinationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DestinationType::None => "none",
            DestinationType::Nrpn => "nrpn",
            DestinationType::Rpn => "rpn",
            DestinationType::Cc => "cc",
            DestinationType::PitchBend => "pitchbend",
            DestinationType::Aftertouch => "aftertouch",
        };
        f.write_str(name)
    }
}

impl FromStr for DestinationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "thru" => Ok(DestinationType::None),
            "nrpn" => Ok(DestinationType::Nrpn),
            "rpn" => Ok(DestinationType::Rpn),
            "cc" => Ok(DestinationType::Cc),
            "pb" | "pitchbend" | "pitch_bend" => Ok(DestinationType::PitchBend),
            "at" | "aftertouch" => Ok(DestinationType::Aftertouch),
            other => Err(Error::UnknownDestination(other.to_string())),
        }
    }
}

/// Which slot of the mapping table a configuration line writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SourceSelector {
    /// Control change number (0-127)
    Cc(u8),
    /// Channel aftertouch
    Aftertouch,
    /// Pitch bend
    PitchBend,
}

impl SourceSelector {
    /// Largest value this source can carry
    pub fn source_max(self) -> i32 {
        match self {
            SourceSelector::Cc(_) | SourceSelector::Aftertouch => MAX_7BIT,
            SourceSelector::PitchBend => MAX_14BIT,
        }
    }
}

impl fmt::Display for SourceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSelector::Cc(n) => write!(f, "cc{}", n),
            SourceSelector::Aftertouch => f.write_str("at"),
            SourceSelector::PitchBend => f.write_str("pb"),
        }
    }
}

impl FromStr for SourceSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "at" | "aftertouch" => return Ok(SourceSelector::Aftertouch),
            "pb" | "pitchbend" | "pitch_bend" => return Ok(SourceSelector::PitchBend),
            _ => {}
        }

        let digits = lower
            .strip_prefix("cc")
            .map(str::trim)
            .ok_or_else(|| Error::UnknownSource(s.to_string()))?;
        let number = parse_number(digits).ok_or_else(|| Error::UnknownSource(s.to_string()))?;
        let cc = u8::try_from(number)
            .ok()
            .filter(|n| *n <= MAX_7BIT as u8)
            .ok_or(Error::SourceOutOfRange(number))?;
        Ok(SourceSelector::Cc(cc))
    }
}

impl TryFrom<String> for SourceSelector {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SourceSelector> for String {
    fn from(value: SourceSelector) -> Self {
        value.to_string()
    }
}

/// Parse an unsigned number in decimal or `0x` hex
pub fn parse_number(s: &str) -> Option<u32> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// Parse a signed number in decimal or `0x` hex
pub fn parse_signed(s: &str) -> Option<i32> {
    let s = s.trim();
    match s.strip_prefix('-') {
        Some(rest) => parse_number(rest).and_then(|n| i32::try_from(n).ok()).map(|n| -n),
        None => parse_number(s).and_then(|n| i32::try_from(n).ok()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_ranges() {
        assert_eq!(DestinationType::Cc.value_range(), Some((0, 127)));
        assert_eq!(DestinationType::Aftertouch.value_range(), Some((0, 127)));
        assert_eq!(DestinationType::Nrpn.value_range(), Some((0, 16383)));
        assert_eq!(DestinationType::Rpn.value_range(), Some((0, 16383)));
        assert_eq!(DestinationType::PitchBend.value_range(), Some((0, 16383)));
        assert_eq!(DestinationType::None.value_range(), None);
    }

    #[test]
    fn test_destination_from_str() {
        assert_eq!("NRPN".parse::<DestinationType>().unwrap(), DestinationType::Nrpn);
        assert_eq!("pb".parse::<DestinationType>().unwrap(), DestinationType::PitchBend);
        assert_eq!("at".parse::<DestinationType>().unwrap(), DestinationType::Aftertouch);
        assert!("sysex".parse::<DestinationType>().is_err());
    }

    #[test]
    fn test_destination_names_match_yaml() {
        for name in ["none", "thru", "nrpn", "rpn", "cc", "pb", "pitchbend", "pitch_bend", "at", "aftertouch"] {
            let parsed: DestinationType = name.parse().unwrap();
            let from_yaml: DestinationType = serde_yaml::from_str(name).unwrap();
            assert_eq!(parsed, from_yaml, "{}", name);
        }
    }

    #[test]
    fn test_source_from_str() {
        assert_eq!("cc1".parse::<SourceSelector>().unwrap(), SourceSelector::Cc(1));
        assert_eq!("CC 0x0A".parse::<SourceSelector>().unwrap(), SourceSelector::Cc(10));
        assert_eq!("at".parse::<SourceSelector>().unwrap(), SourceSelector::Aftertouch);
        assert_eq!("pitchbend".parse::<SourceSelector>().unwrap(), SourceSelector::PitchBend);
    }

    #[test]
    fn test_source_out_of_range() {
        assert_eq!(
            "cc128".parse::<SourceSelector>(),
            Err(Error::SourceOutOfRange(128))
        );
        assert!(matches!(
            "knob3".parse::<SourceSelector>(),
            Err(Error::UnknownSource(_))
        ));
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_number("0x7F"), Some(127));
        assert_eq!(parse_number("16383"), Some(16383));
        assert_eq!(parse_number("x"), None);
        assert_eq!(parse_signed("-8192"), Some(-8192));
        assert_eq!(parse_signed("-0x10"), Some(-16));
    }
}
