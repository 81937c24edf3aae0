//! Device calibration and pulse-duration lookup.
//!
//! The DD passes never reason about seconds. Every duration they see comes
//! from a [`GateDurationOracle`], which reports how many device time-steps
//! (`dt`) a pulse occupies on a given lane once it has been broken down into
//! the device's native gates.
//!
//! [`Calibration`] is the serde-backed implementation: per-lane native gate
//! lengths in seconds, the sample time `dt`, and a [`PulseDecomposition`]
//! table describing how abstract pulses map onto native gates.
//!
//! # Example
//!
//! ```
//! use quiesce_compile::{Calibration, GateDurationOracle, PulseDecomposition};
//! use quiesce_ir::{QubitId, StandardGate};
//!
//! let calibration = Calibration::uniform(2, 0.2e-9, [("x", 35.5e-9), ("rz", 0.0)])
//!     .with_decomposition(PulseDecomposition::ibm());
//!
//! // y decomposes into rz + x on this device.
//! let y = calibration.duration(&StandardGate::Y, QubitId(1)).unwrap();
//! assert_eq!(y, 178);
//! assert_eq!(calibration.default_step_delay(), 50);
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use quiesce_ir::{QubitId, StandardGate};

use crate::error::{CompileError, CompileResult};

/// Spacing used between pulses when a family has no calibrated cycle.
pub const DEFAULT_STEP_DELAY_SEC: f64 = 10e-9;

/// Source of native pulse durations, in device time-steps.
///
/// Implementations must tolerate concurrent reads: timing tables for
/// independent timelines may be built from the same oracle in parallel.
pub trait GateDurationOracle: Send + Sync {
    /// Duration of `pulse` on `qubit` after decomposition into native gates.
    fn duration(&self, pulse: &StandardGate, qubit: QubitId) -> CompileResult<u64>;

    /// Fixed spacing between pulses for families that do not derive it
    /// from a cycle duration.
    fn default_step_delay(&self) -> u64;
}

/// Mapping from abstract pulse names to the native gates that realize them.
///
/// Pulses without a rule are native themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PulseDecomposition {
    rules: FxHashMap<String, Vec<String>>,
}

impl PulseDecomposition {
    /// Create an identity decomposition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decomposition for devices whose native single-qubit set is
    /// `rz`, `sx` and `x`.
    pub fn ibm() -> Self {
        Self::new().with_rule("y", ["rz", "x"])
    }

    /// Add or replace the rule for one pulse.
    #[must_use]
    pub fn with_rule(
        mut self,
        pulse: impl Into<String>,
        natives: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.rules
            .insert(pulse.into(), natives.into_iter().map(Into::into).collect());
        self
    }

    /// Native gate names realizing `pulse`.
    pub fn natives<'a>(&'a self, pulse: &'a str) -> Vec<&'a str> {
        match self.rules.get(pulse) {
            Some(natives) => natives.iter().map(String::as_str).collect(),
            None => vec![pulse],
        }
    }
}

/// Calibration snapshot of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Sample time of the device in seconds.
    dt_in_sec: f64,
    /// Native gate lengths in seconds, indexed by lane.
    gate_lengths: Vec<FxHashMap<String, f64>>,
    /// How pulses break down into native gates.
    #[serde(default)]
    decomposition: PulseDecomposition,
}

impl Calibration {
    /// Create a calibration with no lanes.
    pub fn new(dt_in_sec: f64) -> Self {
        Self {
            dt_in_sec,
            gate_lengths: vec![],
            decomposition: PulseDecomposition::new(),
        }
    }

    /// Create a calibration where every lane shares the same gate lengths.
    pub fn uniform<'a>(
        num_qubits: u32,
        dt_in_sec: f64,
        lengths: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> Self {
        let lane: FxHashMap<String, f64> = lengths
            .into_iter()
            .map(|(name, secs)| (name.to_string(), secs))
            .collect();
        Self {
            dt_in_sec,
            gate_lengths: vec![lane; num_qubits as usize],
            decomposition: PulseDecomposition::new(),
        }
    }

    /// Load a calibration from JSON.
    pub fn from_json(json: &str) -> CompileResult<Self> {
        let calibration: Self = serde_json::from_str(json)
            .map_err(|e| CompileError::InvalidConfiguration(format!("calibration: {e}")))?;
        calibration.validate()?;
        Ok(calibration)
    }

    /// Serialize the calibration to JSON.
    pub fn to_json(&self) -> CompileResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CompileError::InvalidConfiguration(format!("calibration: {e}")))
    }

    /// Check that the sample time and every gate length are usable.
    pub fn validate(&self) -> CompileResult<()> {
        if !(self.dt_in_sec.is_finite() && self.dt_in_sec > 0.0) {
            return Err(CompileError::InvalidConfiguration(format!(
                "dt must be positive, got {}",
                self.dt_in_sec
            )));
        }
        for (lane, gates) in self.gate_lengths.iter().enumerate() {
            if let Some((name, secs)) = gates
                .iter()
                .find(|(_, secs)| !(secs.is_finite() && **secs >= 0.0))
            {
                return Err(CompileError::InvalidConfiguration(format!(
                    "gate '{name}' on q{lane} has invalid length {secs}"
                )));
            }
        }
        Ok(())
    }

    /// Set the pulse decomposition table.
    #[must_use]
    pub fn with_decomposition(mut self, decomposition: PulseDecomposition) -> Self {
        self.decomposition = decomposition;
        self
    }

    /// Set one native gate length on one lane, growing the lane table if needed.
    #[must_use]
    pub fn with_gate_length(mut self, qubit: QubitId, gate: impl Into<String>, secs: f64) -> Self {
        self.set_gate_length(qubit, gate, secs);
        self
    }

    /// Set one native gate length on one lane, growing the lane table if needed.
    pub fn set_gate_length(&mut self, qubit: QubitId, gate: impl Into<String>, secs: f64) {
        let index = qubit.index();
        if self.gate_lengths.len() <= index {
            self.gate_lengths.resize_with(index + 1, FxHashMap::default);
        }
        self.gate_lengths[index].insert(gate.into(), secs);
    }

    /// Sample time in seconds.
    pub fn dt_in_sec(&self) -> f64 {
        self.dt_in_sec
    }

    /// Number of calibrated lanes.
    pub fn num_qubits(&self) -> usize {
        self.gate_lengths.len()
    }

    /// The decomposition table in use.
    pub fn decomposition(&self) -> &PulseDecomposition {
        &self.decomposition
    }

    /// Length of a native gate on a lane, in seconds.
    pub fn gate_length(&self, qubit: QubitId, gate: &str) -> Option<f64> {
        self.gate_lengths
            .get(qubit.index())
            .and_then(|lane| lane.get(gate))
            .copied()
    }

    /// Convert seconds to the nearest whole number of time-steps.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_dt(&self, secs: f64) -> u64 {
        (secs / self.dt_in_sec).round() as u64
    }
}

impl GateDurationOracle for Calibration {
    fn duration(&self, pulse: &StandardGate, qubit: QubitId) -> CompileResult<u64> {
        self.decomposition
            .natives(pulse.name())
            .into_iter()
            .map(|native| {
                self.gate_length(qubit, native)
                    .map(|secs| self.to_dt(secs))
                    .ok_or_else(|| CompileError::MissingCalibration {
                        gate: native.to_string(),
                        qubit,
                    })
            })
            .sum()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn default_step_delay(&self) -> u64 {
        (DEFAULT_STEP_DELAY_SEC / self.dt_in_sec) as u64
    }
}
