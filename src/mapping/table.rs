//! Per-source mapping table
//!
//! One entry per CC number plus one each for channel aftertouch and pitch
//! bend. Every slot starts out as a pass-through.

use serde::Serialize;
use std::fmt;

use super::{DestinationType, SourceSelector, MAX_7BIT};
use crate::error::{Error, Result};

/// Number of CC slots
pub const CC_COUNT: usize = 128;

/// Where one source goes and over which output range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MappingEntry {
    pub dest: DestinationType,
    /// CC, NRPN or RPN number; zero for the other destinations
    pub number: u16,
    /// Output value for the lowest input value (internal units)
    pub from: i32,
    /// Output value for the highest input value (internal units)
    pub to: i32,
}

impl MappingEntry {
    /// Entry covering the destination's full legal range
    pub fn new(dest: DestinationType, number: u16) -> Self {
        let (from, to) = dest.value_range().unwrap_or((0, MAX_7BIT));
        Self { dest, number, from, to }
    }

    /// Override the output range
    pub fn with_range(mut self, from: i32, to: i32) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Pass-through entry
    pub fn passthrough() -> Self {
        Self::new(DestinationType::None, 0)
    }

    pub fn is_passthrough(&self) -> bool {
        self.dest == DestinationType::None
    }

    /// Output range as written in the configuration (signed for pitch bend)
    pub fn user_range(&self) -> (i32, i32) {
        let offset = self.dest.user_offset();
        (self.from - offset, self.to - offset)
    }
}

impl Default for MappingEntry {
    fn default() -> Self {
        Self::passthrough()
    }
}

impl fmt::Display for MappingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dest {
            DestinationType::None => f.write_str("thru"),
            dest if dest.is_numbered() => {
                write!(f, "{} {} ({}..{})", dest, self.number, self.from, self.to)
            }
            dest => {
                let (from, to) = self.user_range();
                write!(f, "{} ({}..{})", dest, from, to)
            }
        }
    }
}

/// Non-fatal findings while filling the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingWarning {
    /// One bound lies outside the destination range, output will clip
    PartialRange {
        source: SourceSelector,
        dest: DestinationType,
        from: i32,
        to: i32,
    },
    /// A mapping replaced an earlier one for the same source
    Duplicate {
        source: SourceSelector,
        previous: MappingEntry,
    },
}

impl fmt::Display for MappingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingWarning::PartialRange { source, dest, from, to } => write!(
                f,
                "{}: range {}..{} partly outside {} range, output will be clipped",
                source, from, to, dest
            ),
            MappingWarning::Duplicate { source, previous } => {
                write!(f, "{}: duplicate mapping overrides {}", source, previous)
            }
        }
    }
}

/// Mapping for every source the remapper understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTable {
    cc: [MappingEntry; CC_COUNT],
    aftertouch: MappingEntry,
    pitch_bend: MappingEntry,
}

impl MappingTable {
    /// Table with every source passing through
    pub fn new() -> Self {
        Self {
            cc: [MappingEntry::passthrough(); CC_COUNT],
            aftertouch: MappingEntry::passthrough(),
            pitch_bend: MappingEntry::passthrough(),
        }
    }

    /// Map a CC number
    pub fn set_cc(&mut self, cc: u8, entry: MappingEntry) -> Result<Vec<MappingWarning>> {
        if usize::from(cc) >= CC_COUNT {
            return Err(Error::SourceOutOfRange(u32::from(cc)));
        }
        self.set(SourceSelector::Cc(cc), entry)
    }

    /// Map channel aftertouch
    pub fn set_aftertouch(&mut self, entry: MappingEntry) -> Result<Vec<MappingWarning>> {
        self.set(SourceSelector::Aftertouch, entry)
    }

    /// Map pitch bend
    pub fn set_pitch_bend_source(&mut self, entry: MappingEntry) -> Result<Vec<MappingWarning>> {
        self.set(SourceSelector::PitchBend, entry)
    }

    /// Validate `entry` and store it in the slot named by `source`.
    ///
    /// Nothing is written when validation fails.
    pub fn set(&mut self, source: SourceSelector, entry: MappingEntry) -> Result<Vec<MappingWarning>> {
        let mut warnings = validate(source, &entry)?;

        let slot = self.slot_mut(source)?;
        if !slot.is_passthrough() {
            warnings.push(MappingWarning::Duplicate {
                source,
                previous: *slot,
            });
        }
        *slot = entry;

        Ok(warnings)
    }

    /// Entry for a CC number. `cc` comes from a 7-bit data byte.
    pub fn lookup_cc(&self, cc: u8) -> &MappingEntry {
        &self.cc[usize::from(cc & 0x7F)]
    }

    pub fn lookup_aftertouch(&self) -> &MappingEntry {
        &self.aftertouch
    }

    pub fn lookup_pitch_bend_source(&self) -> &MappingEntry {
        &self.pitch_bend
    }

    pub fn lookup(&self, source: SourceSelector) -> &MappingEntry {
        match source {
            SourceSelector::Cc(cc) => self.lookup_cc(cc),
            SourceSelector::Aftertouch => self.lookup_aftertouch(),
            SourceSelector::PitchBend => self.lookup_pitch_bend_source(),
        }
    }

    /// Every source that does not pass through, in table order
    pub fn active(&self) -> impl Iterator<Item = (SourceSelector, &MappingEntry)> + '_ {
        let ccs = (0..CC_COUNT as u8).map(SourceSelector::Cc);
        ccs.chain([SourceSelector::Aftertouch, SourceSelector::PitchBend])
            .map(move |source| (source, self.lookup(source)))
            .filter(|(_, entry)| !entry.is_passthrough())
    }

    fn slot_mut(&mut self, source: SourceSelector) -> Result<&mut MappingEntry> {
        match source {
            SourceSelector::Cc(cc) => self
                .cc
                .get_mut(usize::from(cc))
                .ok_or(Error::SourceOutOfRange(u32::from(cc))),
            SourceSelector::Aftertouch => Ok(&mut self.aftertouch),
            SourceSelector::PitchBend => Ok(&mut self.pitch_bend),
        }
    }
}

impl Default for MappingTable {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(source: SourceSelector, entry: &MappingEntry) -> Result<Vec<MappingWarning>> {
    let dest = entry.dest;
    let number = u32::from(entry.number);
    if number > dest.max_number() {
        let expected = match dest {
            DestinationType::Cc => "0-127",
            DestinationType::Nrpn | DestinationType::Rpn => "0-16383",
            DestinationType::None | DestinationType::PitchBend | DestinationType::Aftertouch => "0",
        };
        return Err(Error::DestinationNumberOutOfRange { dest, number, expected });
    }

    let Some((min, max)) = dest.value_range() else {
        return Ok(Vec::new());
    };

    let (from, to) = (entry.from, entry.to);
    if (from < min && to < min) || (from > max && to > max) {
        return Err(Error::UnusableRange { dest, from, to, min, max });
    }

    let mut warnings = Vec::new();
    if from < min || from > max || to < min || to > max {
        warnings.push(MappingWarning::PartialRange { source, dest, from, to });
    }
    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_range_is_signed_for_pitch_bend() {
        let entry = MappingEntry::new(DestinationType::PitchBend, 0).with_range(0, 8192);
        assert_eq!(entry.user_range(), (-8192, 0));
        assert_eq!(entry.to_string(), "pitchbend (-8192..0)");

        let entry = MappingEntry::new(DestinationType::Nrpn, 2);
        assert_eq!(entry.user_range(), (0, 16383));
    }

    #[test]
    fn test_new_table_passes_through() {
        let table = MappingTable::new();
        for cc in 0..128u8 {
            assert!(table.lookup_cc(cc).is_passthrough());
        }
        assert!(table.lookup_aftertouch().is_passthrough());
        assert!(table.lookup_pitch_bend_source().is_passthrough());
        assert_eq!(table.active().count(), 0);
    }

    #[test]
    fn test_set_cc_to_nrpn() {
        let mut table = MappingTable::new();
        let warnings = table.set_cc(1, MappingEntry::new(DestinationType::Nrpn, 2)).unwrap();

        assert!(warnings.is_empty());
        let entry = table.lookup_cc(1);
        assert_eq!(entry.dest, DestinationType::Nrpn);
        assert_eq!(entry.number, 2);
        assert_eq!((entry.from, entry.to), (0, 16383));
    }

    #[test]
    fn test_source_out_of_range() {
        let mut table = MappingTable::new();
        let result = table.set_cc(128, MappingEntry::new(DestinationType::Cc, 1));
        assert_eq!(result, Err(Error::SourceOutOfRange(128)));
    }

    #[test]
    fn test_destination_number_out_of_range() {
        let mut table = MappingTable::new();
        assert!(matches!(
            table.set_cc(1, MappingEntry::new(DestinationType::Cc, 128)),
            Err(Error::DestinationNumberOutOfRange { .. })
        ));
        assert!(matches!(
            table.set_cc(1, MappingEntry::new(DestinationType::Nrpn, 16384)),
            Err(Error::DestinationNumberOutOfRange { .. })
        ));
        assert!(matches!(
            table.set_aftertouch(MappingEntry::new(DestinationType::PitchBend, 3)),
            Err(Error::DestinationNumberOutOfRange { .. })
        ));
        assert!(table.set_cc(1, MappingEntry::new(DestinationType::Nrpn, 16383)).is_ok());
    }

    #[test]
    fn test_unusable_range_rejected() {
        let mut table = MappingTable::new();
        let entry = MappingEntry::new(DestinationType::Cc, 7).with_range(200, 300);
        let result = table.set_cc(5, entry);

        assert!(matches!(result, Err(Error::UnusableRange { from: 200, to: 300, .. })));
        assert!(table.lookup_cc(5).is_passthrough());

        let below = MappingEntry::new(DestinationType::Nrpn, 7).with_range(-10, -1);
        assert!(matches!(table.set_cc(5, below), Err(Error::UnusableRange { .. })));
    }

    #[test]
    fn test_partial_range_warns() {
        let mut table = MappingTable::new();
        let entry = MappingEntry::new(DestinationType::Cc, 7).with_range(0, 254);
        let warnings = table.set_cc(5, entry).unwrap();

        assert_eq!(
            warnings,
            vec![MappingWarning::PartialRange {
                source: SourceSelector::Cc(5),
                dest: DestinationType::Cc,
                from: 0,
                to: 254,
            }]
        );
        assert_eq!(table.lookup_cc(5).to, 254);
    }

    #[test]
    fn test_duplicate_overrides_with_warning() {
        let mut table = MappingTable::new();
        table.set_cc(2, MappingEntry::new(DestinationType::Nrpn, 3)).unwrap();
        let warnings = table.set_cc(2, MappingEntry::new(DestinationType::Nrpn, 4)).unwrap();

        assert_eq!(table.lookup_cc(2).number, 4);
        assert!(matches!(
            warnings.as_slice(),
            [MappingWarning::Duplicate { previous, .. }] if previous.number == 3
        ));
    }

    #[test]
    fn test_passthrough_override_is_silent() {
        let mut table = MappingTable::new();
        let warnings = table.set_cc(2, MappingEntry::passthrough()).unwrap();
        assert!(warnings.is_empty());
        let warnings = table.set_cc(2, MappingEntry::new(DestinationType::Cc, 3)).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_active_lists_mapped_sources() {
        let mut table = MappingTable::new();
        table.set_cc(9, MappingEntry::new(DestinationType::Rpn, 0)).unwrap();
        table.set_aftertouch(MappingEntry::new(DestinationType::Cc, 1)).unwrap();

        let active: Vec<_> = table.active().map(|(source, _)| source).collect();
        assert_eq!(active, vec![SourceSelector::Cc(9), SourceSelector::Aftertouch]);
    }

    #[test]
    fn test_entry_display() {
        let pb = MappingEntry::new(DestinationType::PitchBend, 0).with_range(0, 8192);
        assert_eq!(pb.to_string(), "pitchbend (-8192..0)");
        let nrpn = MappingEntry::new(DestinationType::Nrpn, 2);
        assert_eq!(nrpn.to_string(), "nrpn 2 (0..16383)");
    }
}
