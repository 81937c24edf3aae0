//! Per-lane cycle timing.
//!
//! A cycle is always bracketed: for a sequence of `L` pulses the gap
//! schedule has `L + 1` entries, `gap[0]` before the first pulse and
//! `gap[L]` after the last. Three spacing policies fill the schedule:
//!
//! - [`SpacingPolicy::Uniform`]: a fixed cycle duration; the idle budget
//!   is split into `L` equal gaps, with the outer pair halved so that
//!   back-to-back cycles keep uniform spacing.
//! - [`SpacingPolicy::FixedStep`]: the same shape with a fixed step per
//!   pulse, so the cycle grows with the pulse durations.
//! - [`SpacingPolicy::Uhrig`]: a fixed cycle duration with gaps on the
//!   Uhrig sin² schedule.

use std::f64::consts::PI;

use rustc_hash::FxHashMap;
use tracing::debug;

use quiesce_ir::{CircuitDag, QubitId, StandardGate};

use crate::calibration::GateDurationOracle;
use crate::error::{CompileError, CompileResult};

/// How the gaps of a cycle are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpacingPolicy {
    /// Fixed cycle duration, equal gaps.
    Uniform {
        /// Nominal cycle duration in dt.
        cycle_duration: u64,
    },
    /// Fixed gap per pulse.
    FixedStep {
        /// Gap between consecutive pulses in dt.
        step: u64,
    },
    /// Fixed cycle duration, gaps on the Uhrig schedule.
    Uhrig {
        /// Nominal cycle duration in dt.
        cycle_duration: u64,
    },
}

/// Timing of one cycle on one lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleTiming {
    /// Duration of each distinct pulse of the sequence on this lane.
    pub pulse_durations: FxHashMap<StandardGate, u64>,
    /// Idle gaps around and between pulses, `L + 1` entries.
    pub gap_schedule: Vec<u64>,
    /// Realized length of one cycle: pulses plus gaps.
    pub cycle_duration: u64,
    /// Idle time the gap schedule could not place because of integer
    /// division or rounding.
    pub rounding_carry: u64,
}

impl CycleTiming {
    /// Compute the cycle timing of `sequence` on `qubit`.
    pub fn compute(
        qubit: QubitId,
        sequence: &[StandardGate],
        policy: SpacingPolicy,
        oracle: &dyn GateDurationOracle,
    ) -> CompileResult<Self> {
        if sequence.is_empty() {
            return Err(CompileError::InvalidConfiguration(
                "empty pulse sequence".into(),
            ));
        }

        let pulse_durations = pulse_durations(qubit, sequence, oracle)?;
        let pulse_total: u64 = sequence.iter().map(|g| pulse_durations[g]).sum();
        let len = sequence.len() as u64;

        let (gap_schedule, rounding_carry) = match policy {
            SpacingPolicy::Uniform { cycle_duration } => {
                let budget = idle_budget(qubit, pulse_total, cycle_duration)?;
                let gap = budget / len;
                (bracketed(gap, sequence.len()), budget - len * gap)
            }
            SpacingPolicy::FixedStep { step } => (bracketed(step, sequence.len()), 0),
            SpacingPolicy::Uhrig { cycle_duration } => {
                let budget = idle_budget(qubit, pulse_total, cycle_duration)?;
                let gaps = uhrig_gaps(budget, sequence.len());
                let placed: u64 = gaps.iter().sum();
                (gaps, budget.saturating_sub(placed))
            }
        };

        let cycle_duration = pulse_total + gap_schedule.iter().sum::<u64>();
        if cycle_duration + rounding_carry == 0 {
            return Err(CompileError::InvalidConfiguration(format!(
                "zero-length cycle on {qubit}"
            )));
        }

        Ok(Self {
            pulse_durations,
            gap_schedule,
            cycle_duration,
            rounding_carry,
        })
    }

    /// Nominal length of one cycle, the time it is expected to occupy.
    pub fn period(&self) -> u64 {
        self.cycle_duration + self.rounding_carry
    }

    /// Total pulse time of one cycle.
    pub fn pulse_total(&self) -> u64 {
        self.cycle_duration - self.gap_schedule.iter().sum::<u64>()
    }

    /// Duration of one pulse on this lane.
    pub fn duration_of(&self, gate: StandardGate) -> u64 {
        self.pulse_durations.get(&gate).copied().unwrap_or(0)
    }
}

/// Look up the duration of every distinct pulse in `sequence` on `qubit`.
pub fn pulse_durations(
    qubit: QubitId,
    sequence: &[StandardGate],
    oracle: &dyn GateDurationOracle,
) -> CompileResult<FxHashMap<StandardGate, u64>> {
    let mut durations = FxHashMap::default();
    for gate in sequence {
        if !durations.contains_key(gate) {
            durations.insert(*gate, oracle.duration(gate, qubit)?);
        }
    }
    Ok(durations)
}

fn idle_budget(qubit: QubitId, pulse_total: u64, cycle_duration: u64) -> CompileResult<u64> {
    cycle_duration
        .checked_sub(pulse_total)
        .ok_or(CompileError::InsufficientDuration {
            qubit,
            required: pulse_total,
            available: cycle_duration,
        })
}

/// `[g/2, g, ..., g, g - g/2]` with `pulses + 1` entries.
pub(crate) fn bracketed(gap: u64, pulses: usize) -> Vec<u64> {
    let half = gap / 2;
    let mut gaps = Vec::with_capacity(pulses + 1);
    gaps.push(half);
    gaps.extend(std::iter::repeat_n(gap, pulses - 1));
    gaps.push(gap - half);
    gaps
}

/// Uhrig gaps for `pulses` pulses over `budget` dt.
///
/// Each absolute breakpoint `budget·sin²(πi / 2(n+1))` up to the middle is
/// rounded once; the later ones mirror it as `budget - b[i]`, since the
/// exact values satisfy `s(i) + s(n+1-i) = 1`. The schedule is therefore
/// symmetric for even `n` and always sums to `budget`. The gaps are the
/// differences between consecutive breakpoints.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub(crate) fn uhrig_gaps(budget: u64, pulses: usize) -> Vec<u64> {
    let last = pulses + 1;
    let denominator = 2.0 * last as f64;
    let mut breakpoints = vec![0_u64; last + 1];
    for i in 0..=last / 2 {
        let s = (PI * i as f64 / denominator).sin();
        breakpoints[i] = ((budget as f64 * s * s).round() as u64).min(budget);
        if last - i != i {
            breakpoints[last - i] = budget - breakpoints[i];
        }
    }
    breakpoints.windows(2).map(|w| w[1].saturating_sub(w[0])).collect()
}

/// Cycle timings for every lane that carries an idle period.
///
/// Dense table indexed by [`QubitId::index`].
#[derive(Debug, Clone, Default)]
pub struct LaneTimings {
    lanes: Vec<Option<CycleTiming>>,
}

impl LaneTimings {
    /// Compute timings for all lanes of `dag` that contain a `Delay`.
    pub fn for_idle_lanes(
        dag: &CircuitDag,
        sequence: &[StandardGate],
        policy: SpacingPolicy,
        oracle: &dyn GateDurationOracle,
    ) -> CompileResult<Self> {
        let mut lanes: Vec<Option<CycleTiming>> = vec![];
        for qubit in idle_lanes(dag) {
            let timing = CycleTiming::compute(qubit, sequence, policy, oracle)?;
            debug!(
                "{qubit}: cycle {} dt, gaps {:?}, carry {}",
                timing.cycle_duration, timing.gap_schedule, timing.rounding_carry
            );
            if lanes.len() <= qubit.index() {
                lanes.resize(qubit.index() + 1, None);
            }
            lanes[qubit.index()] = Some(timing);
        }
        Ok(Self { lanes })
    }

    /// Timing of one lane, if it has any.
    pub fn get(&self, qubit: QubitId) -> Option<&CycleTiming> {
        self.lanes.get(qubit.index()).and_then(Option::as_ref)
    }

    /// Number of lanes with a timing.
    pub fn len(&self) -> usize {
        self.lanes.iter().filter(|t| t.is_some()).count()
    }

    /// Whether no lane has a timing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lanes that carry at least one `Delay`, ascending.
pub(crate) fn idle_lanes(dag: &CircuitDag) -> Vec<QubitId> {
    let mut lanes: Vec<QubitId> = dag
        .topological_ops()
        .filter(|(_, inst)| inst.is_delay())
        .flat_map(|(_, inst)| inst.qubits.iter().copied())
        .collect();
    lanes.sort_unstable();
    lanes.dedup();
    lanes
}
