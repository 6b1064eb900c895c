use crate::common::units::{
    COUNTS_DESCRIPTION, COUNTS_LABEL, InputUnits, VOLTS_DESCRIPTION, VOLTS_LABEL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChainKind {
    PolesZeros,
    Dummy,
    Coefficients,
    ResponseList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct UnitSpec {
    pub(super) label: &'static str,
    pub(super) description: &'static str,
}

const VOLTS: UnitSpec = UnitSpec {
    label: VOLTS_LABEL,
    description: VOLTS_DESCRIPTION,
};
const COUNTS: UnitSpec = UnitSpec {
    label: COUNTS_LABEL,
    description: COUNTS_DESCRIPTION,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct UnitLink {
    pub(super) input: UnitSpec,
    pub(super) output: UnitSpec,
}

/// Input/output units for every stage. The leading run of pole-zero and
/// dummy stages carries ground units down to counts; everything after it
/// is counts to counts.
pub(super) fn resolve_unit_chain(kinds: &[ChainKind], ground: InputUnits) -> Vec<UnitLink> {
    let ground = UnitSpec {
        label: ground.label(),
        description: ground.description(),
    };
    let leading = kinds
        .iter()
        .take_while(|kind| matches!(kind, ChainKind::PolesZeros | ChainKind::Dummy))
        .count();
    let fap_first = kinds.first() == Some(&ChainKind::ResponseList);

    kinds
        .iter()
        .enumerate()
        .fold(Vec::with_capacity(kinds.len()), |mut chain, (index, _)| {
            let link = match index {
                0 if fap_first => UnitLink {
                    input: ground,
                    output: COUNTS,
                },
                0 if leading == 1 => UnitLink {
                    input: ground,
                    output: COUNTS,
                },
                0 if leading > 1 => UnitLink {
                    input: ground,
                    output: VOLTS,
                },
                index if index + 1 == leading => UnitLink {
                    input: VOLTS,
                    output: COUNTS,
                },
                index if index < leading => UnitLink {
                    input: VOLTS,
                    output: VOLTS,
                },
                _ => UnitLink {
                    input: COUNTS,
                    output: COUNTS,
                },
            };
            chain.push(link);
            chain
        })
}
