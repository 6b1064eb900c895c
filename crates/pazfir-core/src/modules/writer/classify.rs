use crate::common::units::{SourceRole, Unit, classify_unit, is_meter_based};
use crate::domain::{PazfirError, ResponseStage, WriterResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct StageUnits {
    pub(super) input: Unit,
    pub(super) output: Unit,
    pub(super) role: SourceRole,
    pub(super) meter_based_input: bool,
}

pub(super) fn classify_stage(stage: &ResponseStage) -> WriterResult<StageUnits> {
    let common = stage.common();
    let input = known_unit(&common.input_units, common.stage_number, "input")?;
    let output = known_unit(&common.output_units, common.stage_number, "output")?;

    Ok(StageUnits {
        input,
        output,
        role: SourceRole::classify(input, output),
        meter_based_input: is_meter_based(&common.input_units),
    })
}

fn known_unit(label: &str, stage_number: u32, side: &str) -> WriterResult<Unit> {
    classify_unit(label).ok_or_else(|| {
        PazfirError::input_validation(
            "INPUT.PAZFIR_UNIT",
            format!("stage {stage_number}: unrecognized {side} unit '{label}'"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::classify_stage;
    use crate::common::units::{SourceRole, Unit};
    use crate::domain::{GenericStage, ResponseStage, StageCommon};

    fn stage(input: &str, output: &str) -> ResponseStage {
        ResponseStage::Generic(GenericStage {
            common: StageCommon::new(4, 1.0, 1.0, input, output),
        })
    }

    #[test]
    fn classifies_units_and_role() {
        let units = classify_stage(&stage("m/s", "V")).expect("units should classify");
        assert_eq!(units.input, Unit::Velocity);
        assert_eq!(units.output, Unit::Volts);
        assert_eq!(units.role, SourceRole::Instrument);
        assert!(units.meter_based_input);
    }

    #[test]
    fn unknown_unit_names_the_stage() {
        let error = classify_stage(&stage("V", "FURLONGS")).expect_err("unknown unit should fail");
        assert_eq!(error.placeholder(), "INPUT.PAZFIR_UNIT");
        assert!(error.message().contains("stage 4"));
        assert!(error.message().contains("FURLONGS"));
    }
}
