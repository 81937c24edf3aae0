//! Oracle stub for unit tests.

use rustc_hash::FxHashMap;

use quiesce_ir::{QubitId, StandardGate};

use crate::calibration::GateDurationOracle;
use crate::error::CompileResult;

/// Every pulse takes `default` dt unless overridden.
pub(crate) struct FixedOracle {
    default: u64,
    per_gate: FxHashMap<StandardGate, u64>,
    per_lane: FxHashMap<(QubitId, StandardGate), u64>,
    step: u64,
}

impl FixedOracle {
    pub(crate) fn new(default: u64) -> Self {
        Self {
            default,
            per_gate: FxHashMap::default(),
            per_lane: FxHashMap::default(),
            step: 10,
        }
    }

    pub(crate) fn with(mut self, gate: StandardGate, duration: u64) -> Self {
        self.per_gate.insert(gate, duration);
        self
    }

    pub(crate) fn with_lane(mut self, qubit: QubitId, gate: StandardGate, duration: u64) -> Self {
        self.per_lane.insert((qubit, gate), duration);
        self
    }

    pub(crate) fn with_step(mut self, step: u64) -> Self {
        self.step = step;
        self
    }
}

impl GateDurationOracle for FixedOracle {
    fn duration(&self, pulse: &StandardGate, qubit: QubitId) -> CompileResult<u64> {
        Ok(self
            .per_lane
            .get(&(qubit, *pulse))
            .or_else(|| self.per_gate.get(pulse))
            .copied()
            .unwrap_or(self.default))
    }

    fn default_step_delay(&self) -> u64 {
        self.step
    }
}
