//! Numeric constants shared by the reader, writer and normalization engine.

pub const PI: f64 = std::f64::consts::PI;
pub const PI2: f64 = 2.0 * PI;

/// Factor between per-meter and per-nanometer ground units.
pub const NM_PER_M: f64 = 1.0e9;

/// Phase values are kept inside [-PHASE_LIMIT_DEGREES, PHASE_LIMIT_DEGREES].
pub const PHASE_LIMIT_DEGREES: f64 = 360.0;

/// Mantissa digits used for every number written to a response file.
pub const OUTPUT_PRECISION: usize = 12;

pub const DEFAULT_A0_FREQUENCY: f64 = 1.0;
