use crate::domain::{Diagnostic, DiagnosticCode, Diagnostics};

/// Resource limit on placeholder stages inserted for a single gap. A wider
/// gap is left unrepaired and the file is numbered by position.
const MAX_INSERTED_DUMMIES: i64 = 1_000;

/// One position of the repaired cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum StageSlot {
    /// Header at `header` (index into the splitter output) renumbered to `stage_number`.
    Parsed { header: usize, stage_number: u32 },
    Dummy { stage_number: u32 },
}

impl StageSlot {
    pub(super) fn stage_number(self) -> u32 {
        match self {
            Self::Parsed { stage_number, .. } | Self::Dummy { stage_number } => stage_number,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct NumberingRepair {
    pub(super) slots: Vec<StageSlot>,
    pub(super) diagnostics: Diagnostics,
}

pub(super) fn repair_numbering(numbers: &[i64]) -> NumberingRepair {
    let mut diagnostics = Diagnostics::new();
    let Some(&first) = numbers.first() else {
        return NumberingRepair {
            slots: Vec::new(),
            diagnostics,
        };
    };

    let mut corrected = false;
    let sequence = if first == 0 {
        corrected = true;
        diagnostics.push(Diagnostic::new(
            DiagnosticCode::ZeroBasedNumbering,
            "first stage labeled as stage 0; increasing all stage numbers by one",
        ));
        shift_numbers(numbers, |number| number.checked_add(1))
    } else if first > 1 {
        let shift = first - 1;
        corrected = true;
        diagnostics.push(Diagnostic::new(
            DiagnosticCode::ShiftedNumbering,
            format!("first stage numbered {first}; shifting all stage numbers down by {shift}"),
        ));
        shift_numbers(numbers, |number| number.checked_sub(shift))
    } else {
        Some(numbers.to_vec())
    };

    let walked = match sequence {
        Some(sequence) => walk_sequence(&sequence, &mut diagnostics),
        None => Walk {
            slots: None,
            corrected: true,
        },
    };
    corrected |= walked.corrected;

    if corrected {
        diagnostics.push(Diagnostic::new(
            DiagnosticCode::NumberingIssues,
            "issues found with stage numbering; proceeding with read, consider evaluating the file",
        ));
    }

    match walked.slots {
        Some(slots) if is_consecutive(&slots) => NumberingRepair { slots, diagnostics },
        _ => {
            diagnostics.push(Diagnostic::new(
                DiagnosticCode::NumberingUnresolved,
                "stage numbers could not be made consecutive; numbering stages by file position",
            ));
            NumberingRepair {
                slots: positional_slots(numbers.len()),
                diagnostics,
            }
        }
    }
}

/// `None` when any shifted number leaves the `i64` range.
fn shift_numbers(numbers: &[i64], shift: impl Fn(i64) -> Option<i64>) -> Option<Vec<i64>> {
    numbers.iter().map(|&number| shift(number)).collect()
}

struct Walk {
    slots: Option<Vec<StageSlot>>,
    corrected: bool,
}

fn walk_sequence(sequence: &[i64], diagnostics: &mut Diagnostics) -> Walk {
    let mut slots = Vec::with_capacity(sequence.len());
    let mut corrected = false;
    let mut expected: i64 = 1;

    for (header, &number) in sequence.iter().enumerate() {
        let gap = number.checked_sub(expected);
        if gap.is_none_or(|gap| gap > MAX_INSERTED_DUMMIES) {
            return Walk {
                slots: None,
                corrected: true,
            };
        }
        while number > expected {
            slots.push(StageSlot::Dummy {
                stage_number: expected as u32,
            });
            diagnostics.push(Diagnostic::for_stage(
                DiagnosticCode::MissingStage,
                expected,
                "stage number missing in file; inserting dummy stage",
            ));
            corrected = true;
            expected += 1;
        }
        if number < expected {
            diagnostics.push(Diagnostic::for_stage(
                DiagnosticCode::LowStageNumber,
                number,
                format!("stage number lower than expected; renumbering to {expected}"),
            ));
            corrected = true;
        }
        slots.push(StageSlot::Parsed {
            header,
            stage_number: expected as u32,
        });
        expected += 1;
    }

    Walk {
        slots: Some(slots),
        corrected,
    }
}

fn is_consecutive(slots: &[StageSlot]) -> bool {
    slots
        .iter()
        .enumerate()
        .all(|(index, slot)| slot.stage_number() as usize == index + 1)
}

fn positional_slots(count: usize) -> Vec<StageSlot> {
    (0..count)
        .map(|header| StageSlot::Parsed {
            header,
            stage_number: header as u32 + 1,
        })
        .collect()
}
