use crate::common::constants::PHASE_LIMIT_DEGREES;
use crate::common::units::SourceRole;
use crate::domain::{
    CoefficientValue, ComplexValue, Diagnostic, DiagnosticCode, Diagnostics, ParserResult,
    PazfirError, ResponseListEntry,
};
use crate::modules::serialization::parse_numeric_token;
use std::fs;
use std::path::Path;

pub(super) fn load_lines(path: &Path) -> ParserResult<Vec<String>> {
    let source = fs::read_to_string(path).map_err(|source| {
        PazfirError::io_system(
            "IO.PAZFIR_READ",
            format!("failed to read response file '{}': {}", path.display(), source),
        )
    })?;
    Ok(source_lines(&source))
}

/// Non-blank lines whose first token does not start with `#`.
pub(super) fn source_lines(source: &str) -> Vec<String> {
    source
        .lines()
        .filter(|line| {
            line.split_whitespace()
                .next()
                .is_some_and(|token| !token.starts_with('#'))
        })
        .map(|line| line.trim().to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct StageHeader {
    pub(super) line_index: usize,
    pub(super) stage_number: i64,
    pub(super) stage_type: String,
    pub(super) source_role: SourceRole,
    pub(super) theoretical_or_measured: String,
    pub(super) data_source: Option<String>,
}

fn parse_header(line_index: usize, line: &str) -> Option<StageHeader> {
    let tokens = line.split_whitespace().collect::<Vec<_>>();
    if tokens.len() < 4 {
        return None;
    }
    if !tokens[0]
        .chars()
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic())
    {
        return None;
    }
    let stage_number = tokens[1].parse::<i64>().ok()?;
    let data_source = tokens[4..].join(" ");

    Some(StageHeader {
        line_index,
        stage_number,
        stage_type: tokens[3].to_ascii_lowercase(),
        source_role: SourceRole::from_token(tokens[2]),
        theoretical_or_measured: tokens[0].to_ascii_lowercase(),
        data_source: (!data_source.is_empty()).then_some(data_source),
    })
}

pub(super) fn split_stages(lines: &[String]) -> ParserResult<Vec<StageHeader>> {
    let headers = lines
        .iter()
        .enumerate()
        .filter_map(|(index, line)| parse_header(index, line))
        .collect::<Vec<_>>();

    if headers.is_empty() {
        return Err(PazfirError::input_validation(
            "INPUT.PAZFIR_NO_STAGES",
            "response file contains no stage header lines",
        ));
    }
    Ok(headers)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum StageType {
    Paz,
    Fir,
    Iir,
    Fap,
}

impl StageType {
    pub(super) fn from_token(token: &str) -> Option<Self> {
        match token {
            "paz" => Some(Self::Paz),
            "fir" => Some(Self::Fir),
            "iir" => Some(Self::Iir),
            "fap" => Some(Self::Fap),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum StageBody {
    PolesZeros {
        scale: f64,
        poles: Vec<ComplexValue>,
        zeros: Vec<ComplexValue>,
    },
    Coefficients {
        sample_rate: f64,
        numerator: Vec<CoefficientValue>,
        denominator: Vec<CoefficientValue>,
        recursive: bool,
    },
    ResponseList {
        entries: Vec<ResponseListEntry>,
    },
}

struct BodyCursor<'a> {
    lines: &'a [String],
    position: usize,
    stage_number: i64,
}

impl<'a> BodyCursor<'a> {
    fn next_line(&mut self, expecting: &str) -> ParserResult<&'a str> {
        let line = self.lines.get(self.position).ok_or_else(|| {
            body_error(
                self.stage_number,
                format!("missing {expecting} line after stage header"),
            )
        })?;
        self.position += 1;
        Ok(line.as_str())
    }

    fn scalar(&mut self, expecting: &str) -> ParserResult<f64> {
        let line = self.next_line(expecting)?;
        line.split_whitespace()
            .next()
            .and_then(parse_numeric_token)
            .ok_or_else(|| {
                body_error(
                    self.stage_number,
                    format!("{expecting} line '{line}' is not numeric"),
                )
            })
    }

    fn count(&mut self, expecting: &str) -> ParserResult<usize> {
        let line = self.next_line(expecting)?;
        line.split_whitespace()
            .next()
            .and_then(|token| {
                token.parse::<usize>().ok().or_else(|| {
                    parse_numeric_token(token)
                        .filter(|value| *value >= 0.0 && value.fract() == 0.0)
                        .map(|value| value as usize)
                })
            })
            .ok_or_else(|| {
                body_error(
                    self.stage_number,
                    format!("{expecting} line '{line}' is not a non-negative integer"),
                )
            })
    }

    fn row(&mut self, expecting: &str, minimum: usize) -> ParserResult<Vec<f64>> {
        let line = self.next_line(expecting)?;
        let values = line
            .split_whitespace()
            .map(parse_numeric_token)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                body_error(
                    self.stage_number,
                    format!("{expecting} row '{line}' contains a non-numeric token"),
                )
            })?;
        if values.len() < minimum {
            return Err(body_error(
                self.stage_number,
                format!("{expecting} row '{line}' needs at least {minimum} values"),
            ));
        }
        Ok(values)
    }

    fn complex_block(&mut self, expecting: &str) -> ParserResult<Vec<ComplexValue>> {
        let count = self.count(expecting)?;
        (0..count)
            .map(|_| {
                let row = self.row(expecting, 2)?;
                let value = ComplexValue::new(row[0], row[1]);
                Ok(match (row.get(2), row.get(3)) {
                    (Some(real), Some(imag)) => value.with_uncertainty(*real, *imag),
                    _ => value,
                })
            })
            .collect()
    }

    fn coefficient_block(&mut self, expecting: &str) -> ParserResult<Vec<CoefficientValue>> {
        let count = self.count(expecting)?;
        (0..count)
            .map(|_| {
                let row = self.row(expecting, 1)?;
                let value = CoefficientValue::new(row[0]);
                Ok(match row.get(1) {
                    Some(uncertainty) => value.with_uncertainty(*uncertainty),
                    None => value,
                })
            })
            .collect()
    }
}

fn body_error(stage_number: i64, message: String) -> PazfirError {
    PazfirError::input_validation(
        "INPUT.PAZFIR_STAGE_BODY",
        format!("stage {stage_number}: {message}"),
    )
}

/// Sign-preserving remainder by 360, so 370 becomes 10 and -400 becomes -40.
pub(super) fn wrap_phase(phase: f64) -> f64 {
    phase % PHASE_LIMIT_DEGREES
}

/// Reads the body that follows `header`; `end` is the index of the next
/// header line (or the number of lines).
pub(super) fn extract_body(
    lines: &[String],
    header: &StageHeader,
    stage_type: StageType,
    end: usize,
    diagnostics: &mut Diagnostics,
) -> ParserResult<StageBody> {
    let mut cursor = BodyCursor {
        lines: &lines[..end.min(lines.len())],
        position: header.line_index + 1,
        stage_number: header.stage_number,
    };

    match stage_type {
        StageType::Paz => {
            let scale = cursor.scalar("scale")?;
            let poles = cursor.complex_block("pole")?;
            let zeros = cursor.complex_block("zero")?;
            Ok(StageBody::PolesZeros {
                scale,
                poles,
                zeros,
            })
        }
        StageType::Fir | StageType::Iir => {
            let sample_rate = cursor.scalar("decimation sample rate")?;
            let numerator = cursor.coefficient_block("numerator")?;
            let denominator = cursor.coefficient_block("denominator")?;
            Ok(StageBody::Coefficients {
                sample_rate,
                numerator,
                denominator,
                recursive: stage_type == StageType::Iir,
            })
        }
        StageType::Fap => {
            let count = cursor.count("frequency-amplitude-phase count")?;
            let entries = (0..count)
                .map(|_| {
                    let row = cursor.row("frequency-amplitude-phase", 3)?;
                    let mut phase = row[2];
                    if !(-PHASE_LIMIT_DEGREES..=PHASE_LIMIT_DEGREES).contains(&phase) {
                        let wrapped = wrap_phase(phase);
                        diagnostics.push(Diagnostic::for_stage(
                            DiagnosticCode::PhaseWrapped,
                            header.stage_number,
                            format!("phase {phase} degrees wrapped to {wrapped}"),
                        ));
                        phase = wrapped;
                    }
                    let mut entry = ResponseListEntry::new(row[0], row[1], phase);
                    if let (Some(amplitude), Some(phase)) = (row.get(3), row.get(4)) {
                        entry.amplitude_uncertainty = (*amplitude != 0.0).then_some(*amplitude);
                        entry.phase_uncertainty = (*phase != 0.0).then_some(*phase);
                    }
                    Ok(entry)
                })
                .collect::<ParserResult<Vec<_>>>()?;
            Ok(StageBody::ResponseList { entries })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{StageBody, StageType, extract_body, source_lines, split_stages, wrap_phase};
    use crate::common::units::SourceRole;
    use crate::domain::{DiagnosticCode, Diagnostics, PazfirErrorCategory};

    fn lines(source: &str) -> Vec<String> {
        source_lines(source)
    }

    #[test]
    fn comments_and_blank_lines_are_dropped() {
        let loaded =
            lines("# header\n\n   # indented comment\ntheoretical 1 instrument paz x\n 1.0\n");
        assert_eq!(loaded, vec!["theoretical 1 instrument paz x", "1.0"]);
    }

    #[test]
    fn headers_require_alphabetic_lead_and_integer_number() {
        let loaded = lines(
            "theoretical 1 instrument paz STS-2 sensor\n\
             1.0\n\
             1 2 3 4\n\
             measured x digitizer fap\n\
             measured 2 anti-alias fap\n",
        );
        let headers = split_stages(&loaded).expect("headers should be found");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].stage_number, 1);
        assert_eq!(headers[0].source_role, SourceRole::Instrument);
        assert_eq!(headers[0].data_source.as_deref(), Some("STS-2 sensor"));
        assert_eq!(headers[1].line_index, 4);
        assert_eq!(headers[1].source_role, SourceRole::AntiAlias);
        assert_eq!(headers[1].data_source, None);
    }

    #[test]
    fn missing_headers_are_an_input_error() {
        let error = split_stages(&lines("1.0\n2\n")).expect_err("no headers should fail");
        assert_eq!(error.category(), PazfirErrorCategory::InputValidationError);
        assert_eq!(error.placeholder(), "INPUT.PAZFIR_NO_STAGES");
    }

    #[test]
    fn pole_zero_body_reads_uncertainties() {
        let loaded = lines(
            "theoretical 1 instrument paz -\n\
             2.5D+00\n\
             2\n\
             -0.037 0.037 0.001 0.0\n\
             -0.037 -0.037\n\
             1\n\
             0.0 0.0 0.0 0.0\n",
        );
        let headers = split_stages(&loaded).expect("header should parse");
        let mut diagnostics = Diagnostics::new();
        let body = extract_body(
            &loaded,
            &headers[0],
            StageType::Paz,
            loaded.len(),
            &mut diagnostics,
        )
        .expect("body should parse");

        let StageBody::PolesZeros {
            scale,
            poles,
            zeros,
        } = body
        else {
            panic!("expected pole-zero body");
        };
        assert_eq!(scale, 2.5);
        assert_eq!(poles.len(), 2);
        assert_eq!(poles[0].real_uncertainty, Some(0.001));
        assert_eq!(poles[0].imag_uncertainty, None);
        assert!(!poles[1].has_uncertainty());
        assert_eq!(zeros.len(), 1);
        assert!(!zeros[0].has_uncertainty());
    }

    #[test]
    fn short_body_is_reported_with_stage_number() {
        let loaded = lines("theoretical 3 digitizer fir -\n40.0\n3\n0.5\n");
        let headers = split_stages(&loaded).expect("header should parse");
        let error = extract_body(
            &loaded,
            &headers[0],
            StageType::Fir,
            loaded.len(),
            &mut Diagnostics::new(),
        )
        .expect_err("truncated numerator block should fail");

        assert_eq!(error.placeholder(), "INPUT.PAZFIR_STAGE_BODY");
        assert!(error.message().contains("stage 3"));
    }

    #[test]
    fn body_does_not_run_into_next_header() {
        let loaded = lines(
            "theoretical 1 digitizer fir -\n40.0\n2\n0.5\n\
             theoretical 2 digitizer fir -\n20.0\n0\n0\n",
        );
        let headers = split_stages(&loaded).expect("headers should parse");
        let result = extract_body(
            &loaded,
            &headers[0],
            StageType::Fir,
            headers[1].line_index,
            &mut Diagnostics::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn out_of_range_phases_are_wrapped() {
        assert_eq!(wrap_phase(370.0), 10.0);
        assert_eq!(wrap_phase(-400.0), -40.0);
        assert_eq!(wrap_phase(725.0), 5.0);

        let loaded = lines(
            "measured 1 instrument fap -\n3\n1.0 2.0 370\n2.0 2.0 -400 0.1 0.2\n3.0 2.0 360\n",
        );
        let headers = split_stages(&loaded).expect("header should parse");
        let mut diagnostics = Diagnostics::new();
        let body = extract_body(
            &loaded,
            &headers[0],
            StageType::Fap,
            loaded.len(),
            &mut diagnostics,
        )
        .expect("fap body should parse");

        let StageBody::ResponseList { entries } = body else {
            panic!("expected response-list body");
        };
        assert_eq!(entries[0].phase_degrees, 10.0);
        assert_eq!(entries[1].phase_degrees, -40.0);
        assert_eq!(entries[1].amplitude_uncertainty, Some(0.1));
        assert_eq!(entries[2].phase_degrees, 360.0);
        assert_eq!(
            diagnostics.codes(),
            vec![DiagnosticCode::PhaseWrapped, DiagnosticCode::PhaseWrapped]
        );
    }
}
