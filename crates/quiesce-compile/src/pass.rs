//! The pass interface.

use quiesce_ir::CircuitDag;

use crate::error::CompileResult;
use crate::property::PropertySet;

/// Whether a pass may change the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Reads the timeline and reports through the [`PropertySet`].
    Analysis,
    /// Rewrites the timeline. The pass manager checks the timeline's
    /// integrity after every transformation.
    Transformation,
}

/// One step of a compilation pipeline over a scheduled timeline.
pub trait Pass: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> PassKind;

    /// Run on `dag`, reading inputs from and writing results to
    /// `properties`.
    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()>;

    /// Whether the pass has anything to do. Defaults to always.
    fn should_run(&self, _dag: &CircuitDag, _properties: &PropertySet) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiesce_ir::{Circuit, QubitId};

    struct IdleBudget;

    #[derive(Debug, PartialEq)]
    struct TotalIdle(u64);

    impl Pass for IdleBudget {
        fn name(&self) -> &str {
            "idle_budget"
        }

        fn kind(&self) -> PassKind {
            PassKind::Analysis
        }

        fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
            let total = dag
                .topological_ops()
                .filter_map(|(_, inst)| inst.delay_duration())
                .sum();
            properties.insert(TotalIdle(total));
            Ok(())
        }

        fn should_run(&self, dag: &CircuitDag, _properties: &PropertySet) -> bool {
            dag.num_ops() > 0
        }
    }

    #[test]
    fn test_analysis_pass_reports_through_properties() {
        let mut circuit = Circuit::with_size("budget", 2, 0);
        circuit.delay(QubitId(0), 10).unwrap();
        circuit.delay(QubitId(1), 32).unwrap();
        let mut dag = circuit.into_dag();

        let mut props = PropertySet::new();
        assert!(IdleBudget.should_run(&dag, &props));
        IdleBudget.run(&mut dag, &mut props).unwrap();

        assert_eq!(props.get::<TotalIdle>(), Some(&TotalIdle(42)));
        assert_eq!(dag.num_ops(), 2);
    }

    #[test]
    fn test_should_run_skips_empty_timeline() {
        let dag = Circuit::with_size("empty", 1, 0).into_dag();
        assert!(!IdleBudget.should_run(&dag, &PropertySet::new()));
    }
}
