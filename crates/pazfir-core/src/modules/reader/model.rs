use super::numbering::StageSlot;
use super::parser::StageBody;
use super::units::{ChainKind, UnitLink};
use crate::common::constants::NM_PER_M;
use crate::common::units::InputUnits;
use crate::domain::{
    CoefficientsStage, Decimation, Diagnostic, DiagnosticCode, Diagnostics, DummyStage,
    PolesZerosStage, ResponseListStage, ResponseStage, StageCommon, TransferFunctionKind,
};
use crate::numerics::{ResolvedCalibration, a0_from_values};

/// A repaired slot together with its extracted body (`None` for dummies).
#[derive(Debug, Clone, PartialEq)]
pub(super) struct StageDraft {
    pub(super) slot: StageSlot,
    pub(super) data_source: Option<String>,
    pub(super) body: Option<StageBody>,
}

impl StageDraft {
    pub(super) fn chain_kind(&self) -> ChainKind {
        match &self.body {
            None => ChainKind::Dummy,
            Some(StageBody::PolesZeros { .. }) => ChainKind::PolesZeros,
            Some(StageBody::Coefficients { .. }) => ChainKind::Coefficients,
            Some(StageBody::ResponseList { .. }) => ChainKind::ResponseList,
        }
    }

    fn fir_sample_rate(&self) -> Option<f64> {
        match &self.body {
            Some(StageBody::Coefficients {
                sample_rate,
                recursive: false,
                ..
            }) => Some(*sample_rate),
            _ => None,
        }
    }

    pub(super) fn is_absolute(&self) -> bool {
        matches!(
            self.body,
            Some(StageBody::PolesZeros { .. } | StageBody::ResponseList { .. })
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub(super) struct BuildContext {
    pub(super) sample_rate: f64,
    pub(super) calibration: Option<ResolvedCalibration>,
    pub(super) reference_frequency: f64,
    pub(super) input_units: InputUnits,
}

impl BuildContext {
    fn calibrated_or(&self, fallback: f64) -> f64 {
        self.calibration
            .map(|calibration| calibration.gain)
            .unwrap_or(fallback)
    }

    fn ground_scale(&self) -> f64 {
        if self.input_units.converts_to_meters() {
            NM_PER_M
        } else {
            1.0
        }
    }
}

pub(super) fn build_stages(
    drafts: &[StageDraft],
    chain: &[UnitLink],
    context: &BuildContext,
    diagnostics: &mut Diagnostics,
) -> Vec<ResponseStage> {
    drafts
        .iter()
        .zip(chain)
        .enumerate()
        .map(|(index, (draft, link))| {
            let stage_number = draft.slot.stage_number();
            let mut common = StageCommon::new(
                stage_number,
                1.0,
                context.reference_frequency,
                link.input.label,
                link.output.label,
            );
            common.input_units_description = link.input.description.to_string();
            common.output_units_description = link.output.description.to_string();
            common.name = draft.data_source.clone();
            let first = stage_number == 1;

            let stage = match &draft.body {
                None => ResponseStage::Dummy(DummyStage {
                    common,
                    decimation: Decimation::new(context.sample_rate, 1),
                }),
                Some(StageBody::PolesZeros {
                    scale,
                    poles,
                    zeros,
                }) => {
                    let a0 = a0_from_values(poles, zeros, context.reference_frequency);
                    if first {
                        common.gain = context.calibrated_or(scale / a0) * context.ground_scale();
                    }
                    ResponseStage::PolesZeros(PolesZerosStage {
                        common,
                        transfer_function_kind: TransferFunctionKind::LaplaceRadians,
                        normalization_factor: a0,
                        normalization_frequency: context.reference_frequency,
                        poles: poles.clone(),
                        zeros: zeros.clone(),
                    })
                }
                Some(StageBody::Coefficients {
                    sample_rate,
                    numerator,
                    denominator,
                    ..
                }) => {
                    if first {
                        common.gain = context.calibrated_or(1.0);
                    }
                    let next_rate = drafts
                        .get(index + 1)
                        .and_then(StageDraft::fir_sample_rate)
                        .unwrap_or(context.sample_rate);
                    let factor =
                        decimation_factor(stage_number, *sample_rate, next_rate, diagnostics);
                    ResponseStage::Coefficients(CoefficientsStage {
                        common,
                        numerator: numerator.clone(),
                        denominator: denominator.clone(),
                        decimation: Decimation::new(*sample_rate, factor),
                    })
                }
                Some(StageBody::ResponseList { entries }) => {
                    if first {
                        common.gain = context.calibrated_or(1.0) * context.ground_scale();
                    }
                    ResponseStage::ResponseList(ResponseListStage {
                        common,
                        entries: entries.clone(),
                    })
                }
            };

            tracing::debug!(
                stage = stage_number,
                kind = stage.kind_label(),
                gain = stage.gain(),
                "built response stage"
            );
            stage
        })
        .collect()
}

fn decimation_factor(
    stage_number: u32,
    sample_rate: f64,
    next_rate: f64,
    diagnostics: &mut Diagnostics,
) -> u32 {
    let ratio = (sample_rate / next_rate).round();
    if next_rate.is_finite() && next_rate > 0.0 && ratio.is_finite() && ratio >= 1.0 {
        return ratio as u32;
    }

    diagnostics.push(Diagnostic::for_stage(
        DiagnosticCode::DecimationFallback,
        i64::from(stage_number),
        format!(
            "cannot derive decimation from input rate {sample_rate} and next rate {next_rate}; using factor 1"
        ),
    ));
    1
}

#[cfg(test)]
mod tests {
    use super::{BuildContext, StageDraft, build_stages};
    use crate::common::units::InputUnits;
    use crate::domain::{
        CoefficientValue, ComplexValue, DiagnosticCode, Diagnostics, ResponseStage,
    };
    use crate::modules::reader::numbering::StageSlot;
    use crate::modules::reader::parser::StageBody;
    use crate::modules::reader::units::resolve_unit_chain;
    use crate::numerics::ResolvedCalibration;

    fn fir(header: usize, stage_number: u32, sample_rate: f64) -> StageDraft {
        StageDraft {
            slot: StageSlot::Parsed {
                header,
                stage_number,
            },
            data_source: None,
            body: Some(StageBody::Coefficients {
                sample_rate,
                numerator: vec![CoefficientValue::new(1.0)],
                denominator: Vec::new(),
                recursive: false,
            }),
        }
    }

    fn context(calibration: Option<ResolvedCalibration>, units: InputUnits) -> BuildContext {
        BuildContext {
            sample_rate: 40.0,
            calibration,
            reference_frequency: 1.0,
            input_units: units,
        }
    }

    fn build(drafts: &[StageDraft], context: &BuildContext) -> (Vec<ResponseStage>, Diagnostics) {
        let kinds = drafts.iter().map(StageDraft::chain_kind).collect::<Vec<_>>();
        let chain = resolve_unit_chain(&kinds, context.input_units);
        let mut diagnostics = Diagnostics::new();
        let stages = build_stages(drafts, &chain, context, &mut diagnostics);
        (stages, diagnostics)
    }

    #[test]
    fn decimation_factor_uses_next_fir_rate_then_sample_rate() {
        let drafts = [fir(0, 1, 2000.0), fir(1, 2, 200.0), fir(2, 3, 80.0)];
        let (stages, diagnostics) = build(&drafts, &context(None, InputUnits::Nanometers));

        let factors = stages
            .iter()
            .map(|stage| match stage {
                ResponseStage::Coefficients(stage) => stage.decimation.factor,
                other => panic!("unexpected stage {other:?}"),
            })
            .collect::<Vec<_>>();
        assert_eq!(factors, vec![10, 3, 2]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn decimation_falls_back_when_next_rate_is_unusable() {
        let drafts = [fir(0, 1, 100.0)];
        let mut context = context(None, InputUnits::Nanometers);
        context.sample_rate = 0.0;
        let (stages, diagnostics) = build(&drafts, &context);

        let ResponseStage::Coefficients(stage) = &stages[0] else {
            panic!("expected coefficient stage");
        };
        assert_eq!(stage.decimation.factor, 1);
        assert_eq!(diagnostics.codes(), vec![DiagnosticCode::DecimationFallback]);
    }

    #[test]
    fn only_first_stage_keeps_calibrated_gain() {
        let pole_zero = StageDraft {
            slot: StageSlot::Parsed {
                header: 0,
                stage_number: 1,
            },
            data_source: Some("STS-2".to_string()),
            body: Some(StageBody::PolesZeros {
                scale: 10.0,
                poles: vec![ComplexValue::new(-1.0, 0.0)],
                zeros: Vec::new(),
            }),
        };
        let drafts = [pole_zero, fir(1, 2, 40.0)];
        let calibration = ResolvedCalibration {
            gain: 0.5,
            reference_frequency: 1.0,
        };
        let (stages, _) = build(&drafts, &context(Some(calibration), InputUnits::Meters));

        assert_eq!(stages[0].gain(), 0.5e9);
        assert_eq!(stages[0].common().name.as_deref(), Some("STS-2"));
        assert_eq!(stages[0].common().input_units, "M");
        assert_eq!(stages[1].gain(), 1.0);
    }

    #[test]
    fn dummy_stage_decimates_at_instrument_rate() {
        let drafts = [
            StageDraft {
                slot: StageSlot::Dummy { stage_number: 1 },
                data_source: None,
                body: None,
            },
            fir(0, 2, 40.0),
        ];
        let (stages, _) = build(&drafts, &context(None, InputUnits::Nanometers));

        let ResponseStage::Dummy(dummy) = &stages[0] else {
            panic!("expected dummy stage");
        };
        assert_eq!(dummy.decimation.input_sample_rate, 40.0);
        assert_eq!(dummy.decimation.factor, 1);
        assert_eq!(dummy.common.gain, 1.0);
    }
}
