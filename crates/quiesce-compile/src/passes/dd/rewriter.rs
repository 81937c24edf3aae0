//! Single-pass timeline rewrite for the per-lane families.

use quiesce_ir::{CircuitDag, Instruction, QubitId, StandardGate};

use crate::error::CompileResult;
use crate::passes::dd::planner::{self, InsertionPlan, PlanOutcome};
use crate::passes::dd::timing::{CycleTiming, LaneTimings};

/// Counters collected while rewriting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// Idle periods replaced by a sequence.
    pub rewritten: usize,
    /// Idle periods passed through.
    pub unchanged: usize,
    /// Pulses added to the timeline.
    pub pulses_inserted: usize,
}

/// Replaces eligible idle periods with whole cycles of a pulse sequence.
///
/// Non-idle operations are copied as they are, including labels and
/// classical conditions. An idle period is eligible once its lane has seen
/// a non-idle operation. Since idle periods touch a single lane, this is
/// the same as having a non-idle causal ancestor.
pub struct TimelineRewriter<'a> {
    sequence: &'a [StandardGate],
    timings: &'a LaneTimings,
}

impl<'a> TimelineRewriter<'a> {
    /// Create a rewriter for `sequence` with precomputed lane timings.
    pub fn new(sequence: &'a [StandardGate], timings: &'a LaneTimings) -> Self {
        Self { sequence, timings }
    }

    /// Produce the rewritten timeline. `dag` is left untouched.
    pub fn rewrite(&self, dag: &CircuitDag) -> CompileResult<(CircuitDag, RewriteStats)> {
        let mut new_dag = CircuitDag::with_wires_of(dag);
        let mut stats = RewriteStats::default();
        let mut active = vec![false; dag.qubits().last().map_or(0, |q| q.index() + 1)];

        for (_idx, inst) in dag.topological_ops() {
            let Some(duration) = inst.delay_duration() else {
                for qubit in &inst.qubits {
                    active[qubit.index()] = true;
                }
                new_dag.apply(inst.clone())?;
                continue;
            };

            let qubit = inst.qubits[0];
            let outcome = self
                .timings
                .get(qubit)
                .map_or(PlanOutcome::Unchanged, |timing| {
                    planner::plan(duration, timing, active[qubit.index()])
                });

            match (outcome, self.timings.get(qubit)) {
                (PlanOutcome::Insert(plan), Some(timing)) => {
                    stats.pulses_inserted += self.expand(&mut new_dag, qubit, &plan, timing)?;
                    stats.rewritten += 1;
                }
                _ => {
                    new_dag.apply(inst.clone())?;
                    stats.unchanged += 1;
                }
            }
        }

        Ok((new_dag, stats))
    }

    /// Append the expansion of `plan` on `qubit`, returning the pulse count.
    fn expand(
        &self,
        dag: &mut CircuitDag,
        qubit: QubitId,
        plan: &InsertionPlan,
        timing: &CycleTiming,
    ) -> CompileResult<usize> {
        idle(dag, qubit, plan.leading_idle)?;
        for _ in 0..plan.repetitions {
            for (gate, gap) in self.sequence.iter().zip(&timing.gap_schedule) {
                idle(dag, qubit, *gap)?;
                dag.apply(Instruction::pulse(*gate, qubit))?;
            }
            idle(dag, qubit, timing.gap_schedule[self.sequence.len()])?;
        }
        idle(dag, qubit, plan.trailing_idle)?;

        #[allow(clippy::cast_possible_truncation)]
        let pulses = plan.repetitions as usize * self.sequence.len();
        Ok(pulses)
    }
}

/// Append an idle period, skipping zero-length ones.
pub(crate) fn idle(dag: &mut CircuitDag, qubit: QubitId, duration: u64) -> CompileResult<()> {
    if duration > 0 {
        dag.apply(Instruction::delay(qubit, duration))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::dd::testing::FixedOracle;
    use crate::passes::dd::timing::SpacingPolicy;
    use quiesce_ir::{Circuit, ClassicalCondition, ClbitId, InstructionKind};

    #[derive(Debug, PartialEq)]
    enum Op {
        Idle(u64),
        Pulse(&'static str),
        Other(String),
    }

    fn lane(dag: &CircuitDag, qubit: QubitId) -> Vec<Op> {
        dag.qubit_ops(qubit)
            .unwrap()
            .into_iter()
            .map(|(_, inst)| match &inst.kind {
                InstructionKind::Delay { duration } => Op::Idle(*duration),
                InstructionKind::Gate(g) if g.as_standard() == Some(StandardGate::Y) => {
                    Op::Pulse("y")
                }
                _ => Op::Other(inst.name().to_string()),
            })
            .collect()
    }

    fn cpmg(dag: &CircuitDag, pulse: u64) -> (CircuitDag, RewriteStats) {
        let sequence = [StandardGate::Y, StandardGate::Y];
        let timings = LaneTimings::for_idle_lanes(
            dag,
            &sequence,
            SpacingPolicy::Uniform {
                cycle_duration: 2000,
            },
            &FixedOracle::new(pulse),
        )
        .unwrap();
        TimelineRewriter::new(&sequence, &timings).rewrite(dag).unwrap()
    }

    #[test]
    fn test_cpmg_expansion_order() {
        let mut circuit = Circuit::with_size("cpmg", 1, 0);
        circuit.x(QubitId(0)).unwrap().delay(QubitId(0), 2500).unwrap();
        let dag = circuit.into_dag();

        let (out, stats) = cpmg(&dag, 320);
        assert_eq!(
            lane(&out, QubitId(0)),
            vec![
                Op::Other("x".into()),
                Op::Idle(250),
                Op::Idle(340),
                Op::Pulse("y"),
                Op::Idle(680),
                Op::Pulse("y"),
                Op::Idle(340),
                Op::Idle(250),
            ]
        );
        assert_eq!(stats.rewritten, 1);
        assert_eq!(stats.pulses_inserted, 2);
        // input is untouched
        assert_eq!(dag.num_ops(), 2);
    }

    #[test]
    fn test_lanes_use_their_own_pulse_lengths() {
        let mut circuit = Circuit::with_size("mixed", 2, 0);
        circuit.x(QubitId(0)).unwrap().delay(QubitId(0), 2500).unwrap();
        circuit.x(QubitId(1)).unwrap().delay(QubitId(1), 2500).unwrap();
        let dag = circuit.into_dag();

        let sequence = [StandardGate::Y, StandardGate::Y];
        let oracle = FixedOracle::new(320).with_lane(QubitId(1), StandardGate::Y, 420);
        let timings = LaneTimings::for_idle_lanes(
            &dag,
            &sequence,
            SpacingPolicy::Uniform {
                cycle_duration: 2000,
            },
            &oracle,
        )
        .unwrap();
        let (out, stats) = TimelineRewriter::new(&sequence, &timings)
            .rewrite(&dag)
            .unwrap();

        assert_eq!(lane(&out, QubitId(0))[2], Op::Idle(340));
        assert_eq!(
            lane(&out, QubitId(1)),
            vec![
                Op::Other("x".into()),
                Op::Idle(250),
                Op::Idle(290),
                Op::Pulse("y"),
                Op::Idle(580),
                Op::Pulse("y"),
                Op::Idle(290),
                Op::Idle(250),
            ]
        );
        assert_eq!(stats.rewritten, 2);
    }

    #[test]
    fn test_leading_idle_passes_through() {
        let mut circuit = Circuit::with_size("lead", 1, 0);
        circuit
            .delay(QubitId(0), 5000)
            .unwrap()
            .delay(QubitId(0), 5000)
            .unwrap()
            .x(QubitId(0))
            .unwrap();
        let dag = circuit.into_dag();

        let (out, stats) = cpmg(&dag, 320);
        assert_eq!(
            lane(&out, QubitId(0)),
            vec![Op::Idle(5000), Op::Idle(5000), Op::Other("x".into())]
        );
        assert_eq!(stats.unchanged, 2);
        assert_eq!(stats.rewritten, 0);
    }

    #[test]
    fn test_eligibility_matches_causal_ancestors() {
        let mut circuit = Circuit::with_size("anc", 2, 0);
        circuit
            .delay(QubitId(1), 3000)
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap()
            .delay(QubitId(1), 3000)
            .unwrap();
        let dag = circuit.into_dag();

        let delays: Vec<_> = dag
            .topological_ops()
            .filter(|(_, inst)| inst.is_delay())
            .map(|(idx, _)| dag.ancestors_count(idx))
            .collect();
        assert_eq!(delays, vec![0, 2]);

        let (out, stats) = cpmg(&dag, 320);
        assert_eq!(stats.unchanged, 1);
        assert_eq!(stats.rewritten, 1);
        assert_eq!(lane(&out, QubitId(1))[0], Op::Idle(3000));
    }

    #[test]
    fn test_conditions_and_measurements_preserved() {
        let mut circuit = Circuit::with_size("cond", 1, 1);
        circuit
            .measure(QubitId(0), ClbitId(0))
            .unwrap()
            .gate_if(StandardGate::X, [QubitId(0)], ClassicalCondition::new("c", 1))
            .unwrap()
            .delay(QubitId(0), 2000)
            .unwrap();
        let dag = circuit.into_dag();

        let (out, _) = cpmg(&dag, 320);
        let conditioned: Vec<_> = out
            .topological_ops()
            .filter_map(|(_, inst)| inst.as_gate().and_then(|g| g.condition.clone()))
            .collect();
        assert_eq!(conditioned, vec![ClassicalCondition::new("c", 1)]);
        assert_eq!(out.num_clbits(), 1);
        out.verify_integrity().unwrap();
    }

    #[test]
    fn test_lane_total_is_conserved() {
        let mut circuit = Circuit::with_size("sum", 2, 0);
        circuit
            .cx(QubitId(0), QubitId(1))
            .unwrap()
            .delay(QubitId(0), 7777)
            .unwrap()
            .delay(QubitId(1), 1234)
            .unwrap();
        let dag = circuit.into_dag();

        let (out, _) = cpmg(&dag, 320);
        for qubit in [QubitId(0), QubitId(1)] {
            let total: u64 = lane(&out, qubit)
                .iter()
                .map(|op| match op {
                    Op::Idle(d) => *d,
                    Op::Pulse(_) => 320,
                    Op::Other(_) => 0,
                })
                .sum();
            let original: u64 = dag
                .qubit_ops(qubit)
                .unwrap()
                .iter()
                .filter_map(|(_, inst)| inst.delay_duration())
                .sum();
            assert_eq!(total, original, "{qubit}");
        }
    }
}
