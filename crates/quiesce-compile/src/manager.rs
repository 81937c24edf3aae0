//! Running passes in sequence.

use tracing::{debug, info, instrument};

use quiesce_ir::CircuitDag;

use crate::calibration::Calibration;
use crate::error::CompileResult;
use crate::pass::{Pass, PassKind};
use crate::passes::{DdConfig, DdFamily, DynamicalDecoupling};
use crate::property::PropertySet;

/// An ordered pipeline of passes.
///
/// After each transformation the timeline's integrity is verified, so a
/// faulty rewrite fails at the pass that caused it.
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Names of the passes, in run order.
    pub fn pass_names(&self) -> impl Iterator<Item = &str> {
        self.passes.iter().map(|p| p.name())
    }

    /// Run every pass on `dag` in order.
    #[instrument(skip_all, fields(passes = self.passes.len()))]
    pub fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        info!(
            "Compiling timeline: {} lanes, {} idle periods",
            dag.num_qubits(),
            idle_periods(dag)
        );

        for pass in &self.passes {
            if !pass.should_run(dag, properties) {
                debug!("Skipping {}", pass.name());
                continue;
            }
            pass.run(dag, properties)?;
            if pass.kind() == PassKind::Transformation {
                dag.verify_integrity()?;
            }
            debug!("{} done, {} ops", pass.name(), dag.num_ops());
        }

        info!(
            "Compiled timeline: {} ops, depth {}, {} idle periods",
            dag.num_ops(),
            dag.depth(),
            idle_periods(dag)
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

fn idle_periods(dag: &CircuitDag) -> usize {
    dag.topological_ops()
        .filter(|(_, inst)| inst.is_delay())
        .count()
}

/// Assembles a [`PassManager`] and the [`PropertySet`] it runs with.
#[derive(Default)]
pub struct PassManagerBuilder {
    passes: Vec<Box<dyn Pass>>,
    properties: PropertySet,
}

impl PassManagerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_properties(mut self, properties: PropertySet) -> Self {
        self.properties = properties;
        self
    }

    /// Set the device calibration the decoupling passes read.
    #[must_use]
    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.properties.calibration = Some(calibration);
        self
    }

    /// Append a dynamical-decoupling pass.
    #[must_use]
    pub fn with_dynamical_decoupling(
        self,
        family: DdFamily,
        order: u32,
        config: DdConfig,
    ) -> Self {
        self.with_pass(DynamicalDecoupling::new(family, order).with_config(config))
    }

    /// Append any pass.
    #[must_use]
    pub fn with_pass(mut self, pass: impl Pass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    pub fn build(self) -> (PassManager, PropertySet) {
        (
            PassManager {
                passes: self.passes,
            },
            self.properties,
        )
    }
}
