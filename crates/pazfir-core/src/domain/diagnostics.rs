use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Non-fatal correction applied while reading or writing a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    ZeroBasedNumbering,
    ShiftedNumbering,
    MissingStage,
    LowStageNumber,
    NumberingIssues,
    NumberingUnresolved,
    UnexpectedStageType,
    PhaseWrapped,
    NoAbsoluteStage,
    CalibrationIncomplete,
    DecimationFallback,
    GenericStageSkipped,
}

impl DiagnosticCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ZeroBasedNumbering => "ZERO_BASED_NUMBERING",
            Self::ShiftedNumbering => "SHIFTED_NUMBERING",
            Self::MissingStage => "MISSING_STAGE",
            Self::LowStageNumber => "LOW_STAGE_NUMBER",
            Self::NumberingIssues => "NUMBERING_ISSUES",
            Self::NumberingUnresolved => "NUMBERING_UNRESOLVED",
            Self::UnexpectedStageType => "UNEXPECTED_STAGE_TYPE",
            Self::PhaseWrapped => "PHASE_WRAPPED",
            Self::NoAbsoluteStage => "NO_ABSOLUTE_STAGE",
            Self::CalibrationIncomplete => "CALIBRATION_INCOMPLETE",
            Self::DecimationFallback => "DECIMATION_FALLBACK",
            Self::GenericStageSkipped => "GENERIC_STAGE_SKIPPED",
        }
    }
}

impl Display for DiagnosticCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub message: String,
    pub stage_number: Option<i64>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            stage_number: None,
        }
    }

    pub fn for_stage(code: DiagnosticCode, stage_number: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            stage_number: Some(stage_number),
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.stage_number {
            Some(stage) => write!(f, "[{}] stage {}: {}", self.code, stage, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// Ordered collection of diagnostics; every push is mirrored as a `tracing` warning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(
            code = diagnostic.code.as_str(),
            stage = diagnostic.stage_number,
            "{}",
            diagnostic.message
        );
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    pub fn codes(&self) -> Vec<DiagnosticCode> {
        self.entries.iter().map(|entry| entry.code).collect()
    }

    pub fn contains(&self, code: DiagnosticCode) -> bool {
        self.entries.iter().any(|entry| entry.code == code)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::{Diagnostic, DiagnosticCode, Diagnostics};

    #[test]
    fn diagnostics_keep_insertion_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::new(
            DiagnosticCode::ZeroBasedNumbering,
            "first stage labeled 0",
        ));
        diagnostics.push(Diagnostic::for_stage(
            DiagnosticCode::MissingStage,
            2,
            "inserted dummy stage",
        ));

        assert_eq!(
            diagnostics.codes(),
            vec![
                DiagnosticCode::ZeroBasedNumbering,
                DiagnosticCode::MissingStage
            ]
        );
        assert!(diagnostics.contains(DiagnosticCode::MissingStage));
        assert!(!diagnostics.contains(DiagnosticCode::PhaseWrapped));
    }

    #[test]
    fn display_mentions_stage_when_present() {
        let diagnostic =
            Diagnostic::for_stage(DiagnosticCode::PhaseWrapped, 3, "phase 370 wrapped to 10");
        assert_eq!(
            diagnostic.to_string(),
            "[PHASE_WRAPPED] stage 3: phase 370 wrapped to 10"
        );
    }
}
