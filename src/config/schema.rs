//! Configuration schema definitions

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::mapping::{
    parse_number, parse_signed, DestinationType, MappingEntry, MappingTable, MappingWarning,
    SourceSelector,
};

/// Main configuration for ccmap
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CcmapConfig {
    /// MIDI port settings
    #[serde(default)]
    pub midi: MidiConfig,

    /// Mappings, applied in order
    #[serde(default)]
    pub mappings: Vec<MappingConfig>,
}

impl CcmapConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.midi.poll_interval_ms == 0 || self.midi.poll_interval_ms > 10_000 {
            anyhow::bail!("Poll interval must be between 1 and 10000 ms");
        }
        if self.midi.client_name.trim().is_empty() {
            anyhow::bail!("Client name must not be empty");
        }
        self.build_table(&[])?;
        Ok(())
    }

    /// Fill a table from the file's mappings, then `extra` on top.
    ///
    /// Later mappings for the same source override earlier ones.
    pub fn build_table(&self, extra: &[MappingConfig]) -> Result<(MappingTable, Vec<MappingWarning>)> {
        let mut table = MappingTable::new();
        let mut warnings = Vec::new();

        for (index, mapping) in self.mappings.iter().chain(extra).enumerate() {
            let found = mapping
                .entry()
                .and_then(|entry| table.set(mapping.source, entry))
                .with_context(|| format!("invalid mapping #{} ({})", index + 1, mapping))?;
            warnings.extend(found);
        }

        Ok((table, warnings))
    }
}

/// MIDI port configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MidiConfig {
    /// Client name shown to other MIDI applications (default: ccmap)
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Input port name substring (None = create a virtual port)
    pub input_port: Option<String>,

    /// Output port name substring (None = create a virtual port)
    pub output_port: Option<String>,

    /// How often the shutdown flag is checked while idle (default: 50)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            client_name: default_client_name(),
            input_port: None,
            output_port: None,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_client_name() -> String { "ccmap".to_string() }
fn default_poll_interval_ms() -> u64 { 50 }

/// One mapping line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Source: ccN, at or pb
    pub source: SourceSelector,

    /// Destination type
    pub dest: DestinationType,

    /// CC, NRPN or RPN number
    #[serde(default)]
    pub number: u32,

    /// Output for the lowest input (default: destination minimum)
    pub from: Option<i32>,

    /// Output for the highest input (default: destination maximum)
    pub to: Option<i32>,
}

impl MappingConfig {
    pub fn new(source: SourceSelector, dest: DestinationType, number: u32) -> Self {
        Self {
            source,
            dest,
            number,
            from: None,
            to: None,
        }
    }

    pub fn with_range(mut self, from: i32, to: i32) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Table entry in internal units.
    ///
    /// Pitch bend bounds are given signed and shifted up by 8192 here.
    pub fn entry(&self) -> std::result::Result<MappingEntry, Error> {
        let number = u16::try_from(self.number)
            .ok()
            .filter(|n| u32::from(*n) <= self.dest.max_number())
            .ok_or(Error::DestinationNumberOutOfRange {
                dest: self.dest,
                number: self.number,
                expected: match self.dest.max_number() {
                    0 => "0",
                    127 => "0-127",
                    _ => "0-16383",
                },
            })?;

        let mut entry = MappingEntry::new(self.dest, number);
        let offset = self.dest.user_offset();
        if let Some(from) = self.from {
            entry.from = from.saturating_add(offset);
        }
        if let Some(to) = self.to {
            entry.to = to.saturating_add(offset);
        }
        Ok(entry)
    }
}

impl fmt::Display for MappingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.source, self.dest)?;
        if self.dest.is_numbered() {
            write!(f, "{}", self.number)?;
        }
        if let (Some(from), Some(to)) = (self.from, self.to) {
            write!(f, ":{}:{}", from, to)?;
        }
        Ok(())
    }
}

/// Parses `SOURCE=DEST[NUMBER][:FROM:TO]`, e.g. `cc1=nrpn2` or `at=pb:-8192:0`
impl FromStr for MappingConfig {
    type Err = Error;

    fn from_str(spec: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = |reason: &str| Error::InvalidMapSpec {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let (source, rest) = spec.split_once('=').ok_or_else(|| invalid("missing '='"))?;
        let source: SourceSelector = source.parse()?;

        let parts: Vec<&str> = rest.split(':').collect();
        let (target, range) = match parts.as_slice() {
            [target] => (*target, None),
            [target, from, to] => {
                let from = parse_signed(from).ok_or_else(|| invalid("invalid range start"))?;
                let to = parse_signed(to).ok_or_else(|| invalid("invalid range end"))?;
                (*target, Some((from, to)))
            }
            _ => return Err(invalid("expected DEST or DEST:FROM:TO")),
        };

        let target = target.trim();
        let split = target
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(target.len());
        let (dest, number) = target.split_at(split);
        let dest: DestinationType = dest.parse()?;
        let number = if number.trim().is_empty() {
            if dest.is_numbered() {
                return Err(invalid("missing destination number"));
            }
            0
        } else {
            parse_number(number).ok_or_else(|| invalid("invalid destination number"))?
        };

        let mut mapping = MappingConfig::new(source, dest, number);
        if let Some((from, to)) = range {
            mapping = mapping.with_range(from, to);
        }
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_midi_config() {
        let yaml = "input_port: nanoKONTROL";
        let config: MidiConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.input_port.as_deref(), Some("nanoKONTROL"));
        assert_eq!(config.output_port, None);
        assert_eq!(config.client_name, "ccmap"); // default
        assert_eq!(config.poll_interval_ms, 50); // default
    }

    #[test]
    fn test_mapping_config() {
        let yaml = r#"
source: cc11
dest: pitchbend
from: -8192
to: 0
"#;
        let config: MappingConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.source, SourceSelector::Cc(11));
        assert_eq!(config.dest, DestinationType::PitchBend);
        assert_eq!(config.number, 0);

        let entry = config.entry().unwrap();
        assert_eq!((entry.from, entry.to), (0, 8192));
    }

    #[test]
    fn test_mapping_config_aliases() {
        let yaml = "{ source: at, dest: pb }";
        let config: MappingConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.source, SourceSelector::Aftertouch);
        assert_eq!(config.dest, DestinationType::PitchBend);
    }

    #[test]
    fn test_mapping_config_bad_source() {
        let yaml = "{ source: cc200, dest: cc, number: 1 }";
        assert!(serde_yaml::from_str::<MappingConfig>(yaml).is_err());
    }

    #[test]
    fn test_parse_map_spec() {
        let spec: MappingConfig = "cc1=nrpn2".parse().unwrap();
        assert_eq!(spec, MappingConfig::new(SourceSelector::Cc(1), DestinationType::Nrpn, 2));

        let spec: MappingConfig = "cc5=cc6:0:100".parse().unwrap();
        assert_eq!(spec.number, 6);
        assert_eq!((spec.from, spec.to), (Some(0), Some(100)));

        let spec: MappingConfig = "at=pb:-8192:0".parse().unwrap();
        assert_eq!(spec.source, SourceSelector::Aftertouch);
        assert_eq!(spec.dest, DestinationType::PitchBend);
        assert_eq!(spec.from, Some(-8192));

        let spec: MappingConfig = "cc3=rpn0x04".parse().unwrap();
        assert_eq!((spec.dest, spec.number), (DestinationType::Rpn, 4));

        let spec: MappingConfig = "pb=none".parse().unwrap();
        assert_eq!(spec.dest, DestinationType::None);
    }

    #[test]
    fn test_parse_map_spec_errors() {
        assert!(matches!("cc1".parse::<MappingConfig>(), Err(Error::InvalidMapSpec { .. })));
        assert!(matches!("cc1=nrpn".parse::<MappingConfig>(), Err(Error::InvalidMapSpec { .. })));
        assert!(matches!("cc1=cc2:5".parse::<MappingConfig>(), Err(Error::InvalidMapSpec { .. })));
        assert!(matches!("cc1=foo2".parse::<MappingConfig>(), Err(Error::UnknownDestination(_))));
        assert!(matches!("cc999=cc2".parse::<MappingConfig>(), Err(Error::SourceOutOfRange(999))));
    }

    #[test]
    fn test_map_spec_display_round_trips() {
        let spec: MappingConfig = "cc5=cc6:0:100".parse().unwrap();
        assert_eq!(spec.to_string(), "cc5=cc6:0:100");
    }

    #[test]
    fn test_destination_number_out_of_range() {
        let config = MappingConfig::new(SourceSelector::Cc(1), DestinationType::Nrpn, 70000);
        assert!(matches!(config.entry(), Err(Error::DestinationNumberOutOfRange { .. })));
    }

    #[test]
    fn test_build_table_applies_in_order() {
        let config = CcmapConfig {
            midi: MidiConfig::default(),
            mappings: vec![MappingConfig::new(SourceSelector::Cc(2), DestinationType::Nrpn, 3)],
        };
        let extra = vec![MappingConfig::new(SourceSelector::Cc(2), DestinationType::Nrpn, 4)];

        let (table, warnings) = config.build_table(&extra).unwrap();

        assert_eq!(table.lookup_cc(2).number, 4);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], MappingWarning::Duplicate { .. }));
    }

    #[test]
    fn test_unusable_range_fails_validation() {
        let config = CcmapConfig {
            midi: MidiConfig::default(),
            mappings: vec![
                MappingConfig::new(SourceSelector::Cc(5), DestinationType::Cc, 7).with_range(200, 300),
            ],
        };

        let err = config.validate().unwrap_err();
        assert!(format!("{:#}", err).contains("unusable output range"));
    }

    #[test]
    fn test_invalid_poll_interval() {
        let mut config = CcmapConfig::default();
        config.midi.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }
}
