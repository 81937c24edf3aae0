//! Fitting cycles into a single idle period.

use crate::passes::dd::timing::CycleTiming;

/// How an idle period is filled with whole cycles.
///
/// `leading_idle + repetitions * cycle_duration + trailing_idle` equals the
/// original idle duration, where `cycle_duration` is the realized length of
/// one expanded cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionPlan {
    /// Number of whole cycles.
    pub repetitions: u64,
    /// Idle time before the first cycle.
    pub leading_idle: u64,
    /// Idle time after the last cycle.
    pub trailing_idle: u64,
}

impl InsertionPlan {
    /// Total time the plan occupies when expanded with `timing`.
    pub fn span(&self, timing: &CycleTiming) -> u64 {
        self.leading_idle + self.repetitions * timing.cycle_duration + self.trailing_idle
    }
}

/// Outcome of planning one idle period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanOutcome {
    /// The idle period is kept as it is.
    Unchanged,
    /// The idle period is replaced by the plan's expansion.
    Insert(InsertionPlan),
}

/// Plan the insertion of whole cycles into an idle period of `idle` dt.
///
/// Cycles are counted against the nominal [`period`](CycleTiming::period);
/// the rounding carry of every repetition is returned to the remainder,
/// which is then split with [`split_remainder`].
pub fn plan(idle: u64, timing: &CycleTiming, eligible: bool) -> PlanOutcome {
    let period = timing.period();
    if !eligible || period == 0 || period > idle {
        return PlanOutcome::Unchanged;
    }

    let repetitions = idle / period;
    let remainder = idle - repetitions * period + repetitions * timing.rounding_carry;
    let (leading_idle, trailing_idle) = split_remainder(remainder);

    if repetitions == 0 && leading_idle == 0 && trailing_idle == 0 {
        return PlanOutcome::Unchanged;
    }

    PlanOutcome::Insert(InsertionPlan {
        repetitions,
        leading_idle,
        trailing_idle,
    })
}

/// Split `remainder` into leading and trailing halves; an odd unit always
/// goes to the trailing half.
pub fn split_remainder(remainder: u64) -> (u64, u64) {
    let leading = remainder / 2;
    (leading, leading + remainder % 2)
}
