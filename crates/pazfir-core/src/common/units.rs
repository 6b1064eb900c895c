//! Closed physical-unit taxonomy and the alias table used to classify
//! free-text unit labels.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Displacement,
    Velocity,
    Acceleration,
    Pressure,
    MagneticField,
    Volts,
    Counts,
}

impl Unit {
    pub const ALL: [Unit; 7] = [
        Unit::Displacement,
        Unit::Velocity,
        Unit::Acceleration,
        Unit::Pressure,
        Unit::MagneticField,
        Unit::Volts,
        Unit::Counts,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            Self::Displacement => "M",
            Self::Velocity => "M/S",
            Self::Acceleration => "M/S**2",
            Self::Pressure => "PA",
            Self::MagneticField => "T",
            Self::Volts => "V",
            Self::Counts => "COUNTS",
        }
    }

    /// Physical quantity sensed at the front of the cascade.
    pub const fn is_ground(self) -> bool {
        !matches!(self, Self::Volts | Self::Counts)
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).code())
    }
}

/// Alias table: upper-case label, category, and whether the label is
/// meter-based (as opposed to nanometer-based or not a length at all).
const UNIT_ALIASES: &[(&str, Unit, bool)] = &[
    ("M", Unit::Displacement, true),
    ("METER", Unit::Displacement, true),
    ("METERS", Unit::Displacement, true),
    ("NM", Unit::Displacement, false),
    ("NANOMETER", Unit::Displacement, false),
    ("NANOMETERS", Unit::Displacement, false),
    ("UM", Unit::Displacement, false),
    ("MM", Unit::Displacement, false),
    ("CM", Unit::Displacement, false),
    ("DISPLACEMENT", Unit::Displacement, false),
    ("M/S", Unit::Velocity, true),
    ("M/SEC", Unit::Velocity, true),
    ("M/S**1", Unit::Velocity, true),
    ("NM/S", Unit::Velocity, false),
    ("NM/SEC", Unit::Velocity, false),
    ("UM/S", Unit::Velocity, false),
    ("UM/SEC", Unit::Velocity, false),
    ("MM/S", Unit::Velocity, false),
    ("MM/SEC", Unit::Velocity, false),
    ("CM/S", Unit::Velocity, false),
    ("CM/SEC", Unit::Velocity, false),
    ("VELOCITY", Unit::Velocity, false),
    ("M/S**2", Unit::Acceleration, true),
    ("M/S^2", Unit::Acceleration, true),
    ("M/S2", Unit::Acceleration, true),
    ("M/SEC**2", Unit::Acceleration, true),
    ("M/S/S", Unit::Acceleration, true),
    ("NM/S**2", Unit::Acceleration, false),
    ("NM/S^2", Unit::Acceleration, false),
    ("NM/SEC**2", Unit::Acceleration, false),
    ("NM/S/S", Unit::Acceleration, false),
    ("MM/S**2", Unit::Acceleration, false),
    ("CM/S**2", Unit::Acceleration, false),
    ("G", Unit::Acceleration, false),
    ("GAL", Unit::Acceleration, false),
    ("ACCELERATION", Unit::Acceleration, false),
    ("PA", Unit::Pressure, false),
    ("PASCAL", Unit::Pressure, false),
    ("PASCALS", Unit::Pressure, false),
    ("HPA", Unit::Pressure, false),
    ("KPA", Unit::Pressure, false),
    ("MBAR", Unit::Pressure, false),
    ("BAR", Unit::Pressure, false),
    ("PRESSURE", Unit::Pressure, false),
    ("T", Unit::MagneticField, false),
    ("TESLA", Unit::MagneticField, false),
    ("NT", Unit::MagneticField, false),
    ("NANOTESLA", Unit::MagneticField, false),
    ("GAUSS", Unit::MagneticField, false),
    ("V", Unit::Volts, false),
    ("VOLT", Unit::Volts, false),
    ("VOLTS", Unit::Volts, false),
    ("MV", Unit::Volts, false),
    ("UV", Unit::Volts, false),
    ("COUNTS", Unit::Counts, false),
    ("COUNT", Unit::Counts, false),
    ("DU", Unit::Counts, false),
    ("DIGITAL", Unit::Counts, false),
    ("DIGITAL COUNTS", Unit::Counts, false),
    ("CNT", Unit::Counts, false),
    ("CNTS", Unit::Counts, false),
    ("BITS", Unit::Counts, false),
];

fn lookup(label: &str) -> Option<(Unit, bool)> {
    let normalized = label.trim().to_ascii_uppercase();
    if normalized.is_empty() {
        return None;
    }

    UNIT_ALIASES
        .iter()
        .find(|(alias, _, _)| *alias == normalized)
        .map(|(_, unit, meter_based)| (*unit, *meter_based))
}

pub fn classify_unit(label: &str) -> Option<Unit> {
    lookup(label).map(|(unit, _)| unit)
}

/// True for labels such as `M`, `M/S`, `M/S**2` whose text-format
/// counterpart is nanometer-based.
pub fn is_meter_based(label: &str) -> bool {
    lookup(label).is_some_and(|(_, meter_based)| meter_based)
}

pub fn aliases_for(unit: Unit) -> Vec<&'static str> {
    UNIT_ALIASES
        .iter()
        .filter(|(_, candidate, _)| *candidate == unit)
        .map(|(alias, _, _)| *alias)
        .collect()
}

/// Position of a stage in the acquisition chain, as written in stage headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceRole {
    Instrument,
    Digitizer,
    Preamplifier,
    AntiAlias,
    Unknown,
}

impl SourceRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Instrument => "instrument",
            Self::Digitizer => "digitizer",
            Self::Preamplifier => "preamplifier",
            Self::AntiAlias => "anti-alias",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_token(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "instrument" => Self::Instrument,
            "digitizer" => Self::Digitizer,
            "preamplifier" => Self::Preamplifier,
            "anti-alias" => Self::AntiAlias,
            _ => Self::Unknown,
        }
    }

    pub fn classify(input: Unit, output: Unit) -> Self {
        match (input, output) {
            (input, Unit::Volts | Unit::Counts) if input.is_ground() => Self::Instrument,
            (Unit::Volts, Unit::Volts) => Self::Preamplifier,
            (Unit::Volts, Unit::Counts) => Self::Digitizer,
            (Unit::Counts, Unit::Counts) => Self::AntiAlias,
            _ => Self::Unknown,
        }
    }
}

impl Display for SourceRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Ground units assumed by the reader for the front of the cascade.
/// `Meters` doubles as the nanometers-to-meters conversion flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InputUnits {
    #[default]
    Nanometers,
    Meters,
    Pascals,
}

impl InputUnits {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Nanometers => "NM",
            Self::Meters => "M",
            Self::Pascals => "PA",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Nanometers => "Displacement in Nanometers",
            Self::Meters => "Displacement in Meters",
            Self::Pascals => "Atmospheric Pressure in Pascals",
        }
    }

    pub const fn converts_to_meters(self) -> bool {
        matches!(self, Self::Meters)
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "NM" => Some(Self::Nanometers),
            "M" => Some(Self::Meters),
            "PA" => Some(Self::Pascals),
            _ => None,
        }
    }
}

pub const VOLTS_LABEL: &str = "V";
pub const VOLTS_DESCRIPTION: &str = "Volts of unknown order of magnitude";
pub const COUNTS_LABEL: &str = "COUNTS";
pub const COUNTS_DESCRIPTION: &str = "Digital Counts";
