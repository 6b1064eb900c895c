pub mod diagnostics;
pub mod errors;

pub use diagnostics::{Diagnostic, DiagnosticCode, Diagnostics};
pub use errors::{
    ParserResult, PazfirError, PazfirErrorCategory, PazfirResult, WriterResult,
};

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransferFunctionKind {
    #[default]
    LaplaceRadians,
    LaplaceHertz,
    DigitalZ,
}

impl TransferFunctionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LaplaceRadians => "LAPLACE (RADIANS/SECOND)",
            Self::LaplaceHertz => "LAPLACE (HERTZ)",
            Self::DigitalZ => "DIGITAL (Z-TRANSFORM)",
        }
    }
}

impl Display for TransferFunctionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Pole or zero with optional per-component uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexValue {
    pub value: Complex64,
    #[serde(default)]
    pub real_uncertainty: Option<f64>,
    #[serde(default)]
    pub imag_uncertainty: Option<f64>,
}

impl ComplexValue {
    pub fn new(re: f64, im: f64) -> Self {
        Self {
            value: Complex64::new(re, im),
            real_uncertainty: None,
            imag_uncertainty: None,
        }
    }

    /// Zero uncertainties mean "not given" in the text format.
    pub fn with_uncertainty(mut self, real: f64, imag: f64) -> Self {
        self.real_uncertainty = nonzero(real);
        self.imag_uncertainty = nonzero(imag);
        self
    }

    pub fn has_uncertainty(&self) -> bool {
        self.real_uncertainty.is_some() || self.imag_uncertainty.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoefficientValue {
    pub value: f64,
    #[serde(default)]
    pub uncertainty: Option<f64>,
}

impl CoefficientValue {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            uncertainty: None,
        }
    }

    pub fn with_uncertainty(mut self, uncertainty: f64) -> Self {
        self.uncertainty = nonzero(uncertainty);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseListEntry {
    pub frequency: f64,
    pub amplitude: f64,
    pub phase_degrees: f64,
    #[serde(default)]
    pub amplitude_uncertainty: Option<f64>,
    #[serde(default)]
    pub phase_uncertainty: Option<f64>,
}

impl ResponseListEntry {
    pub fn new(frequency: f64, amplitude: f64, phase_degrees: f64) -> Self {
        Self {
            frequency,
            amplitude,
            phase_degrees,
            amplitude_uncertainty: None,
            phase_uncertainty: None,
        }
    }

    pub fn has_uncertainty(&self) -> bool {
        self.amplitude_uncertainty.is_some() || self.phase_uncertainty.is_some()
    }
}

fn nonzero(value: f64) -> Option<f64> {
    (value != 0.0).then_some(value)
}

/// Fields shared by every stage variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageCommon {
    pub stage_number: u32,
    pub gain: f64,
    pub gain_frequency: f64,
    pub input_units: String,
    pub output_units: String,
    #[serde(default)]
    pub input_units_description: String,
    #[serde(default)]
    pub output_units_description: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl StageCommon {
    pub fn new(
        stage_number: u32,
        gain: f64,
        gain_frequency: f64,
        input_units: impl Into<String>,
        output_units: impl Into<String>,
    ) -> Self {
        Self {
            stage_number,
            gain,
            gain_frequency,
            input_units: input_units.into(),
            output_units: output_units.into(),
            input_units_description: String::new(),
            output_units_description: String::new(),
            name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolesZerosStage {
    #[serde(flatten)]
    pub common: StageCommon,
    #[serde(default)]
    pub transfer_function_kind: TransferFunctionKind,
    pub normalization_factor: f64,
    pub normalization_frequency: f64,
    #[serde(default)]
    pub poles: Vec<ComplexValue>,
    #[serde(default)]
    pub zeros: Vec<ComplexValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decimation {
    pub input_sample_rate: f64,
    pub factor: u32,
    #[serde(default)]
    pub offset: f64,
    #[serde(default)]
    pub delay: f64,
    #[serde(default)]
    pub correction: f64,
}

impl Decimation {
    pub fn new(input_sample_rate: f64, factor: u32) -> Self {
        Self {
            input_sample_rate,
            factor,
            offset: 0.0,
            delay: 0.0,
            correction: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientsStage {
    #[serde(flatten)]
    pub common: StageCommon,
    #[serde(default)]
    pub numerator: Vec<CoefficientValue>,
    #[serde(default)]
    pub denominator: Vec<CoefficientValue>,
    pub decimation: Decimation,
}

impl CoefficientsStage {
    pub fn is_recursive(&self) -> bool {
        !self.denominator.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseListStage {
    #[serde(flatten)]
    pub common: StageCommon,
    #[serde(default)]
    pub entries: Vec<ResponseListEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DummyStage {
    #[serde(flatten)]
    pub common: StageCommon,
    pub decimation: Decimation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialStage {
    #[serde(flatten)]
    pub common: StageCommon,
    #[serde(default)]
    pub coefficients: Vec<CoefficientValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericStage {
    #[serde(flatten)]
    pub common: StageCommon,
}

/// One link of the instrument cascade. `Polynomial` and `Generic` only arrive
/// through the write path; the reader never produces them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseStage {
    PolesZeros(PolesZerosStage),
    Coefficients(CoefficientsStage),
    ResponseList(ResponseListStage),
    Dummy(DummyStage),
    Polynomial(PolynomialStage),
    Generic(GenericStage),
}

impl ResponseStage {
    pub fn common(&self) -> &StageCommon {
        match self {
            Self::PolesZeros(stage) => &stage.common,
            Self::Coefficients(stage) => &stage.common,
            Self::ResponseList(stage) => &stage.common,
            Self::Dummy(stage) => &stage.common,
            Self::Polynomial(stage) => &stage.common,
            Self::Generic(stage) => &stage.common,
        }
    }

    pub fn stage_number(&self) -> u32 {
        self.common().stage_number
    }

    pub fn gain(&self) -> f64 {
        self.common().gain
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::PolesZeros(_) => "paz",
            Self::Coefficients(stage) if stage.is_recursive() => "iir",
            Self::Coefficients(_) => "fir",
            Self::ResponseList(_) => "fap",
            Self::Dummy(_) => "dummy",
            Self::Polynomial(_) => "polynomial",
            Self::Generic(_) => "generic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sensitivity {
    pub value: f64,
    pub frequency: f64,
    pub input_units: String,
    pub output_units: String,
    pub input_units_description: String,
    pub output_units_description: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseSource {
    stages: Vec<ResponseStage>,
    #[serde(default = "default_sensitivity_frequency")]
    sensitivity_frequency: f64,
}

fn default_sensitivity_frequency() -> f64 {
    1.0
}

impl From<ResponseSource> for Response {
    fn from(source: ResponseSource) -> Self {
        Response::new(source.stages, source.sensitivity_frequency)
    }
}

/// Instrument response: the ordered stage cascade plus its derived sensitivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ResponseSource")]
pub struct Response {
    stages: Vec<ResponseStage>,
    sensitivity: Sensitivity,
}

impl Response {
    /// Builds a response; the sensitivity is the product of stage gains and
    /// spans the first stage's input units to the last stage's output units.
    pub fn new(stages: Vec<ResponseStage>, sensitivity_frequency: f64) -> Self {
        let value = stages.iter().fold(1.0, |total, stage| total * stage.gain());
        let (input_units, input_units_description) = stages
            .first()
            .map(|stage| {
                let common = stage.common();
                (
                    common.input_units.clone(),
                    common.input_units_description.clone(),
                )
            })
            .unwrap_or_default();
        let (output_units, output_units_description) = stages
            .last()
            .map(|stage| {
                let common = stage.common();
                (
                    common.output_units.clone(),
                    common.output_units_description.clone(),
                )
            })
            .unwrap_or_default();

        Self {
            stages,
            sensitivity: Sensitivity {
                value,
                frequency: sensitivity_frequency,
                input_units,
                output_units,
                input_units_description,
                output_units_description,
            },
        }
    }

    pub fn stages(&self) -> &[ResponseStage] {
        &self.stages
    }

    pub fn sensitivity(&self) -> &Sensitivity {
        &self.sensitivity
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn stage_numbers(&self) -> Vec<u32> {
        self.stages.iter().map(ResponseStage::stage_number).collect()
    }

    pub fn unit_chain(&self) -> Vec<(String, String)> {
        self.stages
            .iter()
            .map(|stage| {
                let common = stage.common();
                (common.input_units.clone(), common.output_units.clone())
            })
            .collect()
    }
}

/// Identifying fields of one channel as supplied by the station-metadata reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelFields {
    pub network: String,
    pub station: String,
    #[serde(default)]
    pub location: String,
    pub channel: String,
    /// Epoch seconds.
    pub start_time: f64,
    #[serde(default)]
    pub end_time: Option<f64>,
    pub sample_rate: f64,
    #[serde(default)]
    pub sensor_description: Option<String>,
    #[serde(default)]
    pub digitizer_description: Option<String>,
    #[serde(default)]
    pub preamplifier_description: Option<String>,
}
