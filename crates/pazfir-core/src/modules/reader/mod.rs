//! Read path: response-stage text into a normalized [`Response`].
//!
//! Lines flow through the splitter, the numbering repairer, the body
//! extractor, the unit-chain resolver and the stage builders. Every
//! correction made along the way is returned as a [`Diagnostic`] next to
//! the response rather than silently applied.

mod model;
mod numbering;
mod parser;
mod units;

use crate::common::constants::DEFAULT_A0_FREQUENCY;
use crate::common::units::InputUnits;
use crate::domain::{Diagnostic, DiagnosticCode, Diagnostics, ParserResult, PazfirError, Response};
use crate::numerics::CalibrationInput;
use serde::{Deserialize, Serialize};
use std::path::Path;

use model::{BuildContext, StageDraft, build_stages};
use numbering::{StageSlot, repair_numbering};
use parser::{StageType, extract_body, load_lines, source_lines, split_stages};
use units::resolve_unit_chain;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadOptions {
    /// Final instrument sample rate in Hz.
    pub input_sample_rate: f64,
    #[serde(default)]
    pub calibration: CalibrationInput,
    #[serde(default)]
    pub input_units: InputUnits,
    /// Normalization frequency used when no calibration period is available.
    #[serde(default = "default_a0_frequency")]
    pub a0_frequency: f64,
}

fn default_a0_frequency() -> f64 {
    DEFAULT_A0_FREQUENCY
}

impl ReadOptions {
    pub fn new(input_sample_rate: f64) -> Self {
        Self {
            input_sample_rate,
            calibration: CalibrationInput::default(),
            input_units: InputUnits::default(),
            a0_frequency: DEFAULT_A0_FREQUENCY,
        }
    }

    pub fn with_calibration(mut self, calibration: CalibrationInput) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn with_input_units(mut self, input_units: InputUnits) -> Self {
        self.input_units = input_units;
        self
    }

    pub fn with_a0_frequency(mut self, a0_frequency: f64) -> Self {
        self.a0_frequency = a0_frequency;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub response: Response,
    pub diagnostics: Diagnostics,
}

pub fn read_response_file(path: &Path, options: &ReadOptions) -> ParserResult<ParsedResponse> {
    let lines = load_lines(path)?;
    tracing::debug!(path = %path.display(), lines = lines.len(), "loaded response file");
    parse_lines(&lines, options)
}

pub fn parse_response(source: &str, options: &ReadOptions) -> ParserResult<ParsedResponse> {
    parse_lines(&source_lines(source), options)
}

fn parse_lines(lines: &[String], options: &ReadOptions) -> ParserResult<ParsedResponse> {
    let headers = split_stages(lines)?;
    let numbers = headers
        .iter()
        .map(|header| header.stage_number)
        .collect::<Vec<_>>();

    let repair = repair_numbering(&numbers);
    let mut diagnostics = repair.diagnostics;

    let mut drafts = Vec::with_capacity(repair.slots.len());
    for slot in repair.slots {
        let header_index = match slot {
            StageSlot::Dummy { .. } => {
                drafts.push(StageDraft {
                    slot,
                    data_source: None,
                    body: None,
                });
                continue;
            }
            StageSlot::Parsed { header, .. } => header,
        };
        let header = &headers[header_index];
        let Some(stage_type) = StageType::from_token(&header.stage_type) else {
            diagnostics.push(Diagnostic::for_stage(
                DiagnosticCode::UnexpectedStageType,
                i64::from(slot.stage_number()),
                format!(
                    "ignoring unexpected stage type '{}' and every stage after it",
                    header.stage_type
                ),
            ));
            break;
        };
        let end = headers
            .get(header_index + 1)
            .map(|next| next.line_index)
            .unwrap_or(lines.len());
        let body = extract_body(lines, header, stage_type, end, &mut diagnostics)?;
        drafts.push(StageDraft {
            slot,
            data_source: header.data_source.clone(),
            body: Some(body),
        });
    }

    if drafts.iter().all(|draft| draft.body.is_none()) {
        return Err(PazfirError::input_validation(
            "INPUT.PAZFIR_NO_STAGES",
            "response file contains no supported stages",
        ));
    }
    if !drafts.iter().any(StageDraft::is_absolute) {
        diagnostics.push(Diagnostic::new(
            DiagnosticCode::NoAbsoluteStage,
            "file does not contain a paz or fap stage; resulting scaling will not be absolute",
        ));
    }

    let calibration = match options.calibration.resolve() {
        Ok(resolved) => Some(resolved),
        Err(gap) => {
            diagnostics.push(Diagnostic::new(
                DiagnosticCode::CalibrationIncomplete,
                gap.message(),
            ));
            None
        }
    };
    let context = BuildContext {
        sample_rate: options.input_sample_rate,
        calibration,
        reference_frequency: calibration
            .map(|resolved| resolved.reference_frequency)
            .unwrap_or(options.a0_frequency),
        input_units: options.input_units,
    };

    let kinds = drafts
        .iter()
        .map(StageDraft::chain_kind)
        .collect::<Vec<_>>();
    let chain = resolve_unit_chain(&kinds, options.input_units);
    let stages = build_stages(&drafts, &chain, &context, &mut diagnostics);

    Ok(ParsedResponse {
        response: Response::new(stages, context.reference_frequency),
        diagnostics,
    })
}
