//! Nested decoupling across the lanes of an entangling gate.
//!
//! Idle periods that directly follow an entangling gate are grouped by that
//! gate. The first lane of a group runs one block of the sequence fitted to
//! the group's shortest idle (the window). Every further lane runs the same
//! sequence inside each gap of the lane before it, holding still while that
//! lane pulses. Each level is padded to exactly the gap it fills, so all
//! lanes of a group occupy the same window.
//!
//! If any level does not fit, the whole group is left as it was.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use quiesce_ir::{CircuitDag, Instruction, NodeIndex, QubitId, StandardGate};

use crate::calibration::GateDurationOracle;
use crate::error::CompileResult;
use crate::passes::dd::planner::split_remainder;
use crate::passes::dd::rewriter::RewriteStats;
use crate::passes::dd::timing::{pulse_durations, uhrig_gaps};

/// One piece of a lane's block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    /// Idle time a deeper level may fill.
    Gap(u64),
    /// Idle time that stays idle.
    Hold(u64),
    /// A pulse and its duration on this lane.
    Pulse(StandardGate, u64),
}

impl Segment {
    fn duration(&self) -> u64 {
        match *self {
            Segment::Gap(d) | Segment::Hold(d) | Segment::Pulse(_, d) => d,
        }
    }
}

/// The idle run following an entangling gate on one lane.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Lane of the run.
    pub qubit: QubitId,
    /// Consecutive delay nodes, in wire order.
    pub run: Vec<NodeIndex>,
    /// Total idle time of the run.
    pub duration: u64,
}

/// Idle runs that share one entangling gate.
#[derive(Debug, Clone)]
pub struct CouplingGroup {
    /// The entangling gate node.
    pub entangler: NodeIndex,
    /// Runs ordered by the gate's operand order; nesting depth follows it.
    pub lanes: Vec<Candidate>,
}

impl CouplingGroup {
    /// Shortest idle run in the group.
    pub fn window(&self) -> u64 {
        self.lanes.iter().map(|c| c.duration).min().unwrap_or(0)
    }
}

/// Find the coupling groups formed by `entangler` gates in `dag`.
pub fn coupling_groups(dag: &CircuitDag, entangler: StandardGate) -> Vec<CouplingGroup> {
    let mut order = vec![];
    let mut groups: FxHashMap<NodeIndex, Vec<Candidate>> = FxHashMap::default();

    for (idx, inst) in dag.topological_ops() {
        if !inst.is_delay() {
            continue;
        }
        let qubit = inst.qubits[0];
        let Some(pred) = dag.wire_predecessor(idx, qubit) else {
            continue;
        };
        let is_entangler = dag
            .get_instruction(pred)
            .and_then(|p| p.as_gate())
            .and_then(|g| g.as_standard())
            == Some(entangler);
        if !is_entangler {
            continue;
        }

        let mut run = vec![idx];
        let mut duration = inst.delay_duration().unwrap_or(0);
        let mut cursor = idx;
        while let Some(next) = dag.wire_successor(cursor, qubit) {
            let Some(d) = dag.get_instruction(next).and_then(Instruction::delay_duration) else {
                break;
            };
            run.push(next);
            duration += d;
            cursor = next;
        }

        groups
            .entry(pred)
            .or_insert_with(|| {
                order.push(pred);
                vec![]
            })
            .push(Candidate {
                qubit,
                run,
                duration,
            });
    }

    order
        .into_iter()
        .map(|entangler| {
            let mut lanes = groups.remove(&entangler).unwrap_or_default();
            if let Some(gate) = dag.get_instruction(entangler) {
                lanes.sort_by_key(|c| gate.qubits.iter().position(|q| *q == c.qubit));
            }
            CouplingGroup { entangler, lanes }
        })
        .collect()
}

/// Fit one block of `sequence` into exactly `span` dt.
fn fit(
    sequence: &[StandardGate],
    durations: &FxHashMap<StandardGate, u64>,
    span: u64,
    uhrig: bool,
) -> Option<Vec<Segment>> {
    let pulse_total: u64 = sequence.iter().map(|g| durations[g]).sum();
    let budget = span.checked_sub(pulse_total)?;
    let gaps = if uhrig {
        uhrig_gaps(budget, sequence.len())
    } else {
        vec![budget / (sequence.len() as u64 + 1); sequence.len() + 1]
    };
    let used = pulse_total + gaps.iter().sum::<u64>();
    let (leading, trailing) = split_remainder(span - used);

    let mut block = Vec::with_capacity(2 * sequence.len() + 3);
    block.push(Segment::Hold(leading));
    for (gate, gap) in sequence.iter().zip(&gaps) {
        block.push(Segment::Gap(*gap));
        block.push(Segment::Pulse(*gate, durations[gate]));
    }
    block.push(Segment::Gap(gaps[sequence.len()]));
    block.push(Segment::Hold(trailing));
    Some(block)
}

/// Fill every gap of `outer` with a block on the next lane.
fn nest(
    outer: &[Segment],
    sequence: &[StandardGate],
    durations: &FxHashMap<StandardGate, u64>,
    uhrig: bool,
) -> Option<Vec<Segment>> {
    let mut inner = vec![];
    for segment in outer {
        match *segment {
            Segment::Gap(span) => inner.extend(fit(sequence, durations, span, uhrig)?),
            other => inner.push(Segment::Hold(other.duration())),
        }
    }
    Some(inner)
}

/// Blocks for every lane of a group, or `None` when some level does not fit.
fn group_blocks(
    window: u64,
    sequence: &[StandardGate],
    lane_durations: &[FxHashMap<StandardGate, u64>],
    uhrig: bool,
) -> Option<Vec<Vec<Segment>>> {
    let (first, rest) = lane_durations.split_first()?;
    let mut blocks = vec![fit(sequence, first, window, uhrig)?];
    for durations in rest {
        let previous = blocks.last()?;
        let next = nest(previous, sequence, durations, uhrig)?;
        blocks.push(next);
    }
    Some(blocks)
}

/// Turn a block into instructions, merging adjacent idle time.
fn lower(qubit: QubitId, block: &[Segment], tail: u64) -> Vec<Instruction> {
    let mut out = vec![];
    let mut pending = 0;
    for segment in block {
        match *segment {
            Segment::Gap(d) | Segment::Hold(d) => pending += d,
            Segment::Pulse(gate, _) => {
                if pending > 0 {
                    out.push(Instruction::delay(qubit, pending));
                    pending = 0;
                }
                out.push(Instruction::pulse(gate, qubit));
            }
        }
    }
    pending += tail;
    if pending > 0 {
        out.push(Instruction::delay(qubit, pending));
    }
    out
}

/// Outcome of a nested rewrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NestedStats {
    /// Per-idle counters.
    pub rewrite: RewriteStats,
    /// Groups left unchanged because some level did not fit.
    pub infeasible_groups: usize,
}

/// Rewrite `dag`, nesting `sequence` across every coupling group.
///
/// Pulse durations for every candidate lane are looked up before the
/// timeline is touched.
pub fn rewrite(
    dag: &CircuitDag,
    sequence: &[StandardGate],
    entangler: StandardGate,
    uhrig: bool,
    oracle: &dyn GateDurationOracle,
) -> CompileResult<(CircuitDag, NestedStats)> {
    let mut stats = NestedStats::default();
    let mut replacements: FxHashMap<NodeIndex, Vec<Instruction>> = FxHashMap::default();
    let mut absorbed: FxHashSet<NodeIndex> = FxHashSet::default();

    for group in coupling_groups(dag, entangler) {
        let window = group.window();
        let lane_durations = group
            .lanes
            .iter()
            .map(|c| pulse_durations(c.qubit, sequence, oracle))
            .collect::<CompileResult<Vec<_>>>()?;

        let Some(blocks) = group_blocks(window, sequence, &lane_durations, uhrig) else {
            debug!(
                "Group at {:?}: window {window} dt too short for {} levels",
                group.entangler,
                group.lanes.len()
            );
            stats.infeasible_groups += 1;
            continue;
        };
        debug!(
            "Group at {:?}: {} lanes nested in {window} dt",
            group.entangler,
            group.lanes.len()
        );

        for (candidate, block) in group.lanes.iter().zip(&blocks) {
            let lowered = lower(candidate.qubit, block, candidate.duration - window);
            stats.rewrite.pulses_inserted += lowered.iter().filter(|i| i.is_gate()).count();
            stats.rewrite.rewritten += 1;
            replacements.insert(candidate.run[0], lowered);
            absorbed.extend(candidate.run[1..].iter().copied());
        }
    }

    let mut new_dag = CircuitDag::with_wires_of(dag);
    for (idx, inst) in dag.topological_ops() {
        if absorbed.contains(&idx) {
            continue;
        }
        if let Some(block) = replacements.remove(&idx) {
            for instruction in block {
                new_dag.apply(instruction)?;
            }
            continue;
        }
        if inst.is_delay() {
            stats.rewrite.unchanged += 1;
        }
        new_dag.apply(inst.clone())?;
    }

    Ok((new_dag, stats))
}
