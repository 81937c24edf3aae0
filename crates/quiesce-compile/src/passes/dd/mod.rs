//! Dynamical-decoupling insertion.
//!
//! Long idle periods on a lane are replaced by whole cycles of a pulse
//! sequence whose effects cancel, separated by shorter idle periods. The
//! total time on every lane is conserved exactly.
//!
//! The engine runs in two phases. Setup validates the [`DdConfig`], builds
//! the pulse sequence and computes per-lane cycle timings from the
//! [`GateDurationOracle`]; any configuration or calibration error aborts
//! here, before the timeline is touched. The rewrite then walks the
//! timeline once and expands each eligible idle period.
//!
//! # Example
//!
//! ```
//! use quiesce_compile::passes::dd::{self, DdConfig, DdFamily};
//! use quiesce_compile::{Calibration, PulseDecomposition};
//! use quiesce_ir::{Circuit, QubitId};
//!
//! let calibration = Calibration::uniform(1, 1e-9, [("x", 320e-9), ("rz", 0.0)])
//!     .with_decomposition(PulseDecomposition::ibm());
//!
//! let mut circuit = Circuit::with_size("idle", 1, 0);
//! circuit.x(QubitId(0)).unwrap();
//! circuit.delay(QubitId(0), 2500).unwrap();
//!
//! let dag = circuit.into_dag();
//! let out = dd::apply(&dag, DdFamily::Cpmg, 1, &DdConfig::default(), &calibration).unwrap();
//! assert_eq!(out.num_ops(), 8);
//! ```

pub mod nested;
pub mod planner;
pub mod rewriter;
pub mod sequence;
pub mod timing;

#[cfg(test)]
pub(crate) mod testing;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use quiesce_ir::{CircuitDag, StandardGate};

use crate::calibration::GateDurationOracle;
use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

pub use nested::{CouplingGroup, NestedStats};
pub use planner::{InsertionPlan, PlanOutcome, plan, split_remainder};
pub use rewriter::{RewriteStats, TimelineRewriter};
pub use sequence::{DdFamily, MAX_CONCATENATION_ORDER, build};
pub use timing::{CycleTiming, LaneTimings, SpacingPolicy};

/// Default cycle duration for CPMG, in dt.
pub const CPMG_CYCLE_DURATION: u64 = 2000;

/// Default UDD cycle duration per pulse, in dt.
pub const UDD_CYCLE_PER_PULSE: u64 = 1000;

/// Options for one decoupling run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DdConfig {
    /// Use a fixed cycle of this many dt.
    pub cycle_duration_override: Option<u64>,
    /// Use this many dt between consecutive pulses.
    pub step_delay_override: Option<u64>,
    /// Gate whose following idle periods the nested families couple.
    pub entangler: StandardGate,
}

impl Default for DdConfig {
    fn default() -> Self {
        Self {
            cycle_duration_override: None,
            step_delay_override: None,
            entangler: StandardGate::CX,
        }
    }
}

impl DdConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed cycle duration.
    #[must_use]
    pub fn with_cycle_duration(mut self, cycle_duration: u64) -> Self {
        self.cycle_duration_override = Some(cycle_duration);
        self
    }

    /// Use a fixed step between pulses.
    #[must_use]
    pub fn with_step_delay(mut self, step: u64) -> Self {
        self.step_delay_override = Some(step);
        self
    }

    /// Couple idle periods that follow `gate` instead of CX.
    #[must_use]
    pub fn with_entangler(mut self, gate: StandardGate) -> Self {
        self.entangler = gate;
        self
    }

    /// Check the configuration on its own.
    pub fn validate(&self) -> CompileResult<()> {
        if let (Some(cycle), Some(step)) = (self.cycle_duration_override, self.step_delay_override)
        {
            return Err(CompileError::ConflictingConfiguration { cycle, step });
        }
        if !self.entangler.is_entangling() {
            return Err(CompileError::InvalidConfiguration(format!(
                "entangler '{}' acts on a single qubit",
                self.entangler
            )));
        }
        Ok(())
    }

    /// Whether either timing override is set.
    pub fn has_overrides(&self) -> bool {
        self.cycle_duration_override.is_some() || self.step_delay_override.is_some()
    }

    /// Spacing policy for a per-lane family.
    pub fn spacing_policy(
        &self,
        family: DdFamily,
        order: u32,
        oracle: &dyn GateDurationOracle,
    ) -> CompileResult<SpacingPolicy> {
        if family.is_nested() {
            return Err(CompileError::InvalidConfiguration(format!(
                "{family} has no per-lane spacing policy"
            )));
        }

        let policy = match (family, self.cycle_duration_override, self.step_delay_override) {
            (DdFamily::Udd, Some(cycle_duration), _) => SpacingPolicy::Uhrig { cycle_duration },
            (DdFamily::Udd, None, Some(_)) => {
                return Err(CompileError::InvalidConfiguration(
                    "udd spacing follows the Uhrig schedule and takes no step delay".into(),
                ));
            }
            (DdFamily::Udd, None, None) => SpacingPolicy::Uhrig {
                cycle_duration: UDD_CYCLE_PER_PULSE.saturating_mul(u64::from(order)),
            },
            (_, Some(cycle_duration), _) => SpacingPolicy::Uniform { cycle_duration },
            (_, None, Some(step)) => SpacingPolicy::FixedStep { step },
            (DdFamily::Cpmg, None, None) => SpacingPolicy::Uniform {
                cycle_duration: CPMG_CYCLE_DURATION,
            },
            (_, None, None) => SpacingPolicy::FixedStep {
                step: oracle.default_step_delay(),
            },
        };
        Ok(policy)
    }
}

/// What a decoupling run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdSummary {
    /// Idle periods (or coupled idle runs) replaced by pulses.
    pub rewritten: usize,
    /// Idle periods passed through.
    pub unchanged: usize,
    /// Pulses added to the timeline.
    pub pulses_inserted: usize,
    /// Coupling groups left unchanged because nesting did not fit.
    pub infeasible_groups: usize,
}

/// Insert `family` at `order` into the idle periods of `dag`.
///
/// Returns a new timeline; `dag` is not modified.
pub fn apply(
    dag: &CircuitDag,
    family: DdFamily,
    order: u32,
    config: &DdConfig,
    oracle: &dyn GateDurationOracle,
) -> CompileResult<CircuitDag> {
    apply_with_summary(dag, family, order, config, oracle).map(|(dag, _)| dag)
}

/// Like [`apply`], also reporting what changed.
#[instrument(skip(dag, config, oracle))]
pub fn apply_with_summary(
    dag: &CircuitDag,
    family: DdFamily,
    order: u32,
    config: &DdConfig,
    oracle: &dyn GateDurationOracle,
) -> CompileResult<(CircuitDag, DdSummary)> {
    config.validate()?;
    let sequence = sequence::build(family, order)?;

    let (new_dag, summary) = if family.is_nested() {
        if config.has_overrides() {
            return Err(CompileError::InvalidConfiguration(format!(
                "{family} derives its timing from the idle window and takes no overrides"
            )));
        }
        let (out, stats) =
            nested::rewrite(dag, &sequence, config.entangler, family.is_uhrig(), oracle)?;
        let summary = DdSummary {
            rewritten: stats.rewrite.rewritten,
            unchanged: stats.rewrite.unchanged,
            pulses_inserted: stats.rewrite.pulses_inserted,
            infeasible_groups: stats.infeasible_groups,
        };
        (out, summary)
    } else {
        let policy = config.spacing_policy(family, order, oracle)?;
        debug!("{} pulses per cycle, {policy:?}", sequence.len());
        let timings = LaneTimings::for_idle_lanes(dag, &sequence, policy, oracle)?;
        let (out, stats) = TimelineRewriter::new(&sequence, &timings).rewrite(dag)?;
        let summary = DdSummary {
            rewritten: stats.rewritten,
            unchanged: stats.unchanged,
            pulses_inserted: stats.pulses_inserted,
            infeasible_groups: 0,
        };
        (out, summary)
    };

    debug!(
        "Rewrote {} idle periods, kept {}, inserted {} pulses",
        summary.rewritten, summary.unchanged, summary.pulses_inserted
    );
    Ok((new_dag, summary))
}

/// Dynamical-decoupling pass.
///
/// Reads the [`Calibration`](crate::Calibration) from the property set and
/// stores a [`DdSummary`] after rewriting.
pub struct DynamicalDecoupling {
    family: DdFamily,
    order: u32,
    config: DdConfig,
}

impl DynamicalDecoupling {
    /// Create the pass with the default configuration.
    pub fn new(family: DdFamily, order: u32) -> Self {
        Self {
            family,
            order,
            config: DdConfig::default(),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: DdConfig) -> Self {
        self.config = config;
        self
    }
}

impl Pass for DynamicalDecoupling {
    fn name(&self) -> &'static str {
        "DynamicalDecoupling"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    /// Nothing to do on a timeline without idle periods.
    fn should_run(&self, dag: &CircuitDag, _properties: &PropertySet) -> bool {
        dag.topological_ops().any(|(_, inst)| inst.is_delay())
    }

    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        let calibration = properties
            .calibration
            .as_ref()
            .ok_or(CompileError::MissingProperty("calibration"))?;

        let (new_dag, summary) =
            apply_with_summary(dag, self.family, self.order, &self.config, calibration)?;
        *dag = new_dag;
        properties.insert(summary);
        Ok(())
    }
}
