//! Normalization engine: pole-zero normalization factors, calibration gains
//! and complex frequency-response evaluation of a stage cascade.

use crate::common::constants::PI2;
use crate::domain::{
    CoefficientValue, CoefficientsStage, ComplexValue, PolesZerosStage, Response,
    ResponseListStage, ResponseStage, TransferFunctionKind,
};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// `1 / |H(2πif)|` with `H(s) = Π(s - zero) / Π(s - pole)`.
pub fn a0_from_pz(poles: &[Complex64], zeros: &[Complex64], frequency: f64) -> f64 {
    let s = Complex64::new(0.0, PI2 * frequency);
    let numerator = zeros
        .iter()
        .fold(Complex64::new(1.0, 0.0), |product, zero| product * (s - zero));
    let denominator = poles
        .iter()
        .fold(Complex64::new(1.0, 0.0), |product, pole| product * (s - pole));

    1.0 / (numerator / denominator).norm()
}

pub fn a0_from_values(poles: &[ComplexValue], zeros: &[ComplexValue], frequency: f64) -> f64 {
    let poles = poles.iter().map(|pole| pole.value).collect::<Vec<_>>();
    let zeros = zeros.iter().map(|zero| zero.value).collect::<Vec<_>>();
    a0_from_pz(&poles, &zeros, frequency)
}

/// Laplace-hertz poles/zeros expressed in rad/s, with the normalization factor
/// rescaled by `(2π)^(poles - zeros)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RadianPolesZeros {
    pub poles: Vec<ComplexValue>,
    pub zeros: Vec<ComplexValue>,
    pub normalization_factor: f64,
}

pub fn hertz_to_radians(
    poles: &[ComplexValue],
    zeros: &[ComplexValue],
    normalization_factor: f64,
) -> RadianPolesZeros {
    let scale = |value: &ComplexValue| ComplexValue {
        value: value.value * PI2,
        real_uncertainty: value.real_uncertainty.map(|uncertainty| uncertainty * PI2),
        imag_uncertainty: value.imag_uncertainty.map(|uncertainty| uncertainty * PI2),
    };
    let exponent = poles.len() as i32 - zeros.len() as i32;

    RadianPolesZeros {
        poles: poles.iter().map(scale).collect(),
        zeros: zeros.iter().map(scale).collect(),
        normalization_factor: normalization_factor * PI2.powi(exponent),
    }
}

/// Calibration fields of a sensor/instrument row.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CalibrationInput {
    pub calib: Option<f64>,
    pub calper: Option<f64>,
    #[serde(default)]
    pub calratio: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedCalibration {
    /// Gain applied to the first stage.
    pub gain: f64,
    pub reference_frequency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationGap {
    Nothing,
    MissingCalper,
    MissingCalib,
}

impl CalibrationGap {
    pub const fn message(self) -> &'static str {
        match self {
            Self::Nothing => {
                "no calib/calper pair provided; assuming total scaling is provided in the file"
            }
            Self::MissingCalper => {
                "no calper provided with calib; assuming total scaling is provided in the file"
            }
            Self::MissingCalib => {
                "no calib provided with calper; assuming total scaling is provided in the file"
            }
        }
    }
}

impl CalibrationInput {
    pub fn new(calib: f64, calper: f64) -> Self {
        Self {
            calib: Some(calib),
            calper: Some(calper),
            calratio: None,
        }
    }

    pub fn with_calratio(mut self, calratio: f64) -> Self {
        self.calratio = Some(calratio);
        self
    }

    /// Database nulls (`calper <= 0`, `calratio <= 0`) count as absent.
    pub fn resolve(&self) -> Result<ResolvedCalibration, CalibrationGap> {
        let calper = self
            .calper
            .filter(|calper| calper.is_finite() && *calper > 0.0);
        let calib = self.calib.filter(|calib| calib.is_finite() && *calib != 0.0);

        match (calib, calper) {
            (Some(calib), Some(calper)) => {
                let scale = match self
                    .calratio
                    .filter(|ratio| ratio.is_finite() && *ratio > 0.0)
                {
                    Some(calratio) => calib * calratio,
                    None => calib,
                };
                Ok(ResolvedCalibration {
                    gain: 1.0 / scale,
                    reference_frequency: 1.0 / calper,
                })
            }
            (None, None) => Err(CalibrationGap::Nothing),
            (Some(_), None) => Err(CalibrationGap::MissingCalper),
            (None, Some(_)) => Err(CalibrationGap::MissingCalib),
        }
    }
}

impl PolesZerosStage {
    /// Normalized, gain-scaled response at `frequency` Hz. Digital-Z stages
    /// carry no sample rate and cannot be evaluated.
    pub fn evaluate(&self, frequency: f64) -> Option<Complex64> {
        let s = match self.transfer_function_kind {
            TransferFunctionKind::LaplaceRadians => Complex64::new(0.0, PI2 * frequency),
            TransferFunctionKind::LaplaceHertz => Complex64::new(0.0, frequency),
            TransferFunctionKind::DigitalZ => return None,
        };
        let numerator = self
            .zeros
            .iter()
            .fold(Complex64::new(1.0, 0.0), |product, zero| product * (s - zero.value));
        let denominator = self
            .poles
            .iter()
            .fold(Complex64::new(1.0, 0.0), |product, pole| product * (s - pole.value));

        Some(numerator / denominator * self.normalization_factor * self.common.gain)
    }
}

fn polynomial_in_delay(coefficients: &[CoefficientValue], omega: f64) -> Complex64 {
    coefficients
        .iter()
        .enumerate()
        .fold(Complex64::new(0.0, 0.0), |sum, (k, coefficient)| {
            sum + Complex64::from_polar(coefficient.value, -omega * k as f64)
        })
}

impl CoefficientsStage {
    pub fn evaluate(&self, frequency: f64) -> Option<Complex64> {
        let sample_rate = self.decimation.input_sample_rate;
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return None;
        }
        let omega = PI2 * frequency / sample_rate;
        let numerator = if self.numerator.is_empty() {
            Complex64::new(1.0, 0.0)
        } else {
            polynomial_in_delay(&self.numerator, omega)
        };
        let denominator = if self.denominator.is_empty() {
            Complex64::new(1.0, 0.0)
        } else {
            polynomial_in_delay(&self.denominator, omega)
        };

        Some(numerator / denominator * self.common.gain)
    }
}

impl ResponseListStage {
    /// Linear interpolation of amplitude and phase; clamps outside the table.
    pub fn evaluate(&self, frequency: f64) -> Option<Complex64> {
        let first = self.entries.first()?;
        let last = self.entries.last()?;

        let (amplitude, phase_degrees) = if frequency <= first.frequency {
            (first.amplitude, first.phase_degrees)
        } else if frequency >= last.frequency {
            (last.amplitude, last.phase_degrees)
        } else {
            let upper = self
                .entries
                .iter()
                .position(|entry| entry.frequency >= frequency)?;
            let low = &self.entries[upper - 1];
            let high = &self.entries[upper];
            let span = high.frequency - low.frequency;
            let weight = if span > 0.0 {
                (frequency - low.frequency) / span
            } else {
                0.0
            };
            (
                low.amplitude + weight * (high.amplitude - low.amplitude),
                low.phase_degrees + weight * (high.phase_degrees - low.phase_degrees),
            )
        };

        Some(Complex64::from_polar(amplitude, phase_degrees.to_radians()) * self.common.gain)
    }
}

impl ResponseStage {
    pub fn evaluate(&self, frequency: f64) -> Option<Complex64> {
        match self {
            Self::PolesZeros(stage) => stage.evaluate(frequency),
            Self::Coefficients(stage) => stage.evaluate(frequency),
            Self::ResponseList(stage) => stage.evaluate(frequency),
            Self::Dummy(stage) => Some(Complex64::new(stage.common.gain, 0.0)),
            Self::Polynomial(_) | Self::Generic(_) => None,
        }
    }
}

impl Response {
    /// Complex response of the whole cascade at `frequency` Hz, or `None`
    /// when a stage cannot be evaluated.
    pub fn evaluate(&self, frequency: f64) -> Option<Complex64> {
        self.stages()
            .iter()
            .try_fold(Complex64::new(1.0, 0.0), |product, stage| {
                stage.evaluate(frequency).map(|value| product * value)
            })
    }
}
