use super::classify::StageUnits;
use crate::common::constants::{NM_PER_M, OUTPUT_PRECISION};
use crate::common::time::timestamp;
use crate::common::units::SourceRole;
use crate::domain::{
    ChannelFields, CoefficientValue, ComplexValue, PazfirError, PolesZerosStage, Response,
    ResponseListEntry, ResponseStage, TransferFunctionKind, WriterResult,
};
use crate::modules::serialization::format_scientific;
use crate::numerics::{a0_from_values, hertz_to_radians};

fn number(value: f64) -> String {
    format_scientific(value, OUTPUT_PRECISION)
}

/// `#` comment block describing the channel and the overall sensitivity.
pub(super) fn header_block(
    response: &Response,
    fields: &ChannelFields,
    skipped: &[&ResponseStage],
) -> String {
    let describe = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    let sensitivity = response.sensitivity();
    let start_time = timestamp(fields.start_time);
    let end_time = fields
        .end_time
        .map(timestamp)
        .unwrap_or_else(|| "open".to_string());

    let mut block = String::new();
    block.push_str(&format!("# network: {}\n", fields.network));
    block.push_str(&format!("# station: {}\n", fields.station));
    block.push_str(&format!("# location: {}\n", fields.location));
    block.push_str(&format!("# channel: {}\n", fields.channel));
    block.push_str(&format!("# start time: {start_time}\n"));
    block.push_str(&format!("# end time: {end_time}\n"));
    block.push_str(&format!("# sample rate: {}\n", number(fields.sample_rate)));
    block.push_str(&format!(
        "# sensor: {}\n",
        describe(&fields.sensor_description)
    ));
    block.push_str(&format!(
        "# digitizer: {}\n",
        describe(&fields.digitizer_description)
    ));
    block.push_str(&format!(
        "# preamplifier: {}\n",
        describe(&fields.preamplifier_description)
    ));
    block.push_str(&format!(
        "# sensitivity: {} {} -> {} at {} Hz\n",
        number(sensitivity.value),
        sensitivity.input_units,
        sensitivity.output_units,
        number(sensitivity.frequency)
    ));
    for stage in skipped {
        let common = stage.common();
        block.push_str(&format!(
            "# skipped generic stage {} ({} -> {}): {}\n",
            common.stage_number,
            common.input_units,
            common.output_units,
            common.name.as_deref().unwrap_or("-")
        ));
    }
    block
}

fn data_source(stage: &ResponseStage, role: SourceRole, fields: &ChannelFields) -> String {
    let description = match role {
        SourceRole::Instrument => fields.sensor_description.as_ref(),
        SourceRole::Digitizer | SourceRole::AntiAlias => fields.digitizer_description.as_ref(),
        SourceRole::Preamplifier => fields.preamplifier_description.as_ref(),
        SourceRole::Unknown => None,
    };
    stage
        .common()
        .name
        .as_ref()
        .or(description)
        .filter(|text| !text.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| "-".to_string())
}

fn stage_header(
    body: &mut String,
    measured: bool,
    stage_number: u32,
    role: SourceRole,
    stage_type: &str,
    source: &str,
) {
    let provenance = if measured { "measured" } else { "theoretical" };
    body.push_str(&format!(
        "{provenance}  {stage_number}  {role}  {stage_type}  {source}\n"
    ));
}

fn complex_rows(body: &mut String, values: &[ComplexValue]) {
    body.push_str(&format!("{}\n", values.len()));
    for value in values {
        let mut row = format!("{} {}", number(value.value.re), number(value.value.im));
        if value.has_uncertainty() {
            row.push_str(&format!(
                " {} {}",
                number(value.real_uncertainty.unwrap_or(0.0)),
                number(value.imag_uncertainty.unwrap_or(0.0))
            ));
        }
        body.push_str(&row);
        body.push('\n');
    }
}

fn coefficient_rows(body: &mut String, values: &[CoefficientValue]) {
    body.push_str(&format!("{}\n", values.len()));
    for value in values {
        match value.uncertainty {
            Some(uncertainty) => {
                body.push_str(&format!("{} {}\n", number(value.value), number(uncertainty)));
            }
            None => body.push_str(&format!("{}\n", number(value.value))),
        }
    }
}

fn response_list_rows(body: &mut String, entries: &[ResponseListEntry]) {
    body.push_str(&format!("{}\n", entries.len()));
    for entry in entries {
        body.push_str(&format!(
            "{} {} {}",
            number(entry.frequency),
            number(entry.amplitude),
            number(entry.phase_degrees)
        ));
        if entry.has_uncertainty() {
            body.push_str(&format!(
                " {} {}",
                number(entry.amplitude_uncertainty.unwrap_or(0.0)),
                number(entry.phase_uncertainty.unwrap_or(0.0))
            ));
        }
        body.push('\n');
    }
}

/// Scale line of a pole-zero stage: gain times the a0 derived at the
/// stage's normalization frequency, per nanometer on a meter-based first stage.
pub(super) fn pole_zero_scale(
    stage: &PolesZerosStage,
    per_nanometer: bool,
) -> WriterResult<(f64, Vec<ComplexValue>, Vec<ComplexValue>)> {
    let (poles, zeros) = match stage.transfer_function_kind {
        TransferFunctionKind::LaplaceRadians => (stage.poles.clone(), stage.zeros.clone()),
        TransferFunctionKind::LaplaceHertz => {
            let converted =
                hertz_to_radians(&stage.poles, &stage.zeros, stage.normalization_factor);
            (converted.poles, converted.zeros)
        }
        TransferFunctionKind::DigitalZ => {
            return Err(PazfirError::computation(
                "RUN.PAZFIR_UNSUPPORTED_TRANSFER",
                format!(
                    "stage {}: {} pole-zero stages cannot be written as analog poles and zeros",
                    stage.common.stage_number, stage.transfer_function_kind
                ),
            ));
        }
    };

    let a0 = a0_from_values(&poles, &zeros, stage.normalization_frequency);
    let mut scale = stage.common.gain * a0;
    if per_nanometer {
        scale /= NM_PER_M;
    }
    Ok((scale, poles, zeros))
}

/// Appends one stage. Returns the file extension it contributes, or `None`
/// for generic stages, which only appear in the header block.
pub(super) fn render_stage(
    body: &mut String,
    stage: &ResponseStage,
    units: &StageUnits,
    first: bool,
    fields: &ChannelFields,
) -> WriterResult<Option<&'static str>> {
    let number_label = stage.stage_number();
    let source = data_source(stage, units.role, fields);

    match stage {
        ResponseStage::PolesZeros(pole_zero) => {
            let (scale, poles, zeros) =
                pole_zero_scale(pole_zero, first && units.meter_based_input)?;
            stage_header(body, false, number_label, units.role, "paz", &source);
            body.push_str(&format!("{}\n", number(scale)));
            complex_rows(body, &poles);
            complex_rows(body, &zeros);
            Ok(Some("paz"))
        }
        ResponseStage::Coefficients(coefficients) => {
            let extension = stage.kind_label();
            stage_header(body, false, number_label, units.role, extension, &source);
            body.push_str(&format!(
                "{}\n",
                number(coefficients.decimation.input_sample_rate)
            ));
            coefficient_rows(body, &coefficients.numerator);
            coefficient_rows(body, &coefficients.denominator);
            Ok(Some(extension))
        }
        ResponseStage::Dummy(dummy) => {
            stage_header(body, false, number_label, units.role, "fir", &source);
            body.push_str(&format!("{}\n", number(dummy.decimation.input_sample_rate)));
            coefficient_rows(body, &[]);
            coefficient_rows(body, &[]);
            Ok(Some("fir"))
        }
        ResponseStage::ResponseList(list) => {
            stage_header(body, true, number_label, units.role, "fap", &source);
            response_list_rows(body, &list.entries);
            Ok(Some("fap"))
        }
        ResponseStage::Polynomial(_) => Err(PazfirError::computation(
            "RUN.PAZFIR_UNSUPPORTED_STAGE",
            format!("stage {number_label}: polynomial response stages have no text encoding"),
        )),
        ResponseStage::Generic(_) => Ok(None),
    }
}
