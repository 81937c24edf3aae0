//! The scheduled timeline as a wire-ordered DAG.
//!
//! Every qubit and classical bit is a wire running from an `In` node to an
//! `Out` node. Operations are only ever appended at the end of the wires
//! they touch and nodes are never removed, so node creation order is a
//! topological order. Traversal relies on that instead of re-sorting.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex as PetNodeIndex};
use petgraph::visit::{Dfs, EdgeRef, Reversed};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClbitId, QubitId};

/// Node index type for the timeline graph.
pub type NodeIndex = PetNodeIndex<u32>;

/// A node of the timeline graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DagNode {
    /// Start of a wire.
    In(WireId),
    /// End of a wire.
    Out(WireId),
    /// An operation.
    Op(Instruction),
}

impl DagNode {
    #[inline]
    pub fn instruction(&self) -> Option<&Instruction> {
        match self {
            DagNode::Op(inst) => Some(inst),
            _ => None,
        }
    }
}

/// A quantum or classical wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WireId {
    Qubit(QubitId),
    Clbit(ClbitId),
}

/// Edge weight: the wire an edge belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DagEdge {
    pub wire: WireId,
}

/// Endpoints of one wire and the last node placed on it.
#[derive(Debug, Clone, Copy)]
struct Wire {
    input: NodeIndex,
    output: NodeIndex,
    front: NodeIndex,
}

/// A scheduled circuit.
///
/// Idle time is explicit: a `Delay` node on a qubit wire is an idle period
/// of fixed duration on that lane. Everything a pass needs about lane order
/// (the previous or next operation on a lane, the whole lane in order, the
/// causal past of a node) is answered from the wire edges.
#[derive(Debug, Clone, Default)]
pub struct CircuitDag {
    graph: DiGraph<DagNode, DagEdge, u32>,
    wires: FxHashMap<WireId, Wire>,
}

impl CircuitDag {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty timeline with the same wires as `other`.
    pub fn with_wires_of(other: &CircuitDag) -> Self {
        let mut dag = Self::new();
        for wire in other.sorted_wires() {
            dag.add_wire(wire);
        }
        dag
    }

    pub fn add_qubit(&mut self, qubit: QubitId) {
        self.add_wire(WireId::Qubit(qubit));
    }

    pub fn add_clbit(&mut self, clbit: ClbitId) {
        self.add_wire(WireId::Clbit(clbit));
    }

    fn add_wire(&mut self, wire: WireId) {
        if self.wires.contains_key(&wire) {
            return;
        }
        let input = self.graph.add_node(DagNode::In(wire));
        let output = self.graph.add_node(DagNode::Out(wire));
        self.graph.add_edge(input, output, DagEdge { wire });
        self.wires.insert(
            wire,
            Wire {
                input,
                output,
                front: input,
            },
        );
    }

    /// Append `instruction` at the end of every wire it touches.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<NodeIndex> {
        self.check_operands(&instruction)?;

        let touched: Vec<WireId> = instruction
            .qubits
            .iter()
            .map(|&q| WireId::Qubit(q))
            .chain(instruction.clbits.iter().map(|&c| WireId::Clbit(c)))
            .collect();

        let node = self.graph.add_node(DagNode::Op(instruction));
        for wire in touched {
            let Wire { output, front, .. } = self.wires[&wire];
            let closing = self
                .graph
                .find_edge(front, output)
                .ok_or_else(|| IrError::InvalidDag(format!("{wire:?} is not closed")))?;
            self.graph.remove_edge(closing);
            self.graph.add_edge(front, node, DagEdge { wire });
            self.graph.add_edge(node, output, DagEdge { wire });
            if let Some(w) = self.wires.get_mut(&wire) {
                w.front = node;
            }
        }
        Ok(node)
    }

    fn check_operands(&self, instruction: &Instruction) -> IrResult<()> {
        let op = || instruction.name().to_string();
        let got = instruction.qubits.len();

        match &instruction.kind {
            InstructionKind::Gate(gate) if gate.num_qubits() != got => {
                return Err(IrError::ArityMismatch {
                    op: op(),
                    expected: gate.num_qubits(),
                    got,
                });
            }
            InstructionKind::Delay { .. } if got != 1 => return Err(IrError::DelayArity(got)),
            _ => {}
        }

        let mut seen = FxHashSet::default();
        for &qubit in &instruction.qubits {
            if !self.wires.contains_key(&WireId::Qubit(qubit)) {
                return Err(IrError::UnknownQubit { qubit, op: op() });
            }
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateOperand { qubit, op: op() });
            }
        }
        if let Some(&clbit) = instruction
            .clbits
            .iter()
            .find(|&&c| !self.wires.contains_key(&WireId::Clbit(c)))
        {
            return Err(IrError::UnknownClbit { clbit, op: op() });
        }
        Ok(())
    }

    /// Operations in a deterministic topological order (the order they were
    /// appended).
    pub fn topological_ops(&self) -> impl Iterator<Item = (NodeIndex, &Instruction)> {
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph[idx].instruction().map(|inst| (idx, inst)))
    }

    #[inline]
    pub fn get_instruction(&self, node: NodeIndex) -> Option<&Instruction> {
        self.graph.node_weight(node).and_then(DagNode::instruction)
    }

    /// Number of operations that causally precede `node` over any wire.
    pub fn ancestors_count(&self, node: NodeIndex) -> usize {
        let reversed = Reversed(&self.graph);
        let mut dfs = Dfs::new(reversed, node);
        let mut count = 0;
        while let Some(ancestor) = dfs.next(reversed) {
            if ancestor != node && self.get_instruction(ancestor).is_some() {
                count += 1;
            }
        }
        count
    }

    /// The operation right before `node` on `qubit`'s lane, if any.
    pub fn wire_predecessor(&self, node: NodeIndex, qubit: QubitId) -> Option<NodeIndex> {
        self.wire_neighbour(node, qubit, Direction::Incoming)
    }

    /// The operation right after `node` on `qubit`'s lane, if any.
    pub fn wire_successor(&self, node: NodeIndex, qubit: QubitId) -> Option<NodeIndex> {
        self.wire_neighbour(node, qubit, Direction::Outgoing)
    }

    fn wire_neighbour(
        &self,
        node: NodeIndex,
        qubit: QubitId,
        dir: Direction,
    ) -> Option<NodeIndex> {
        let wire = WireId::Qubit(qubit);
        self.graph
            .edges_directed(node, dir)
            .find(|e| e.weight().wire == wire)
            .map(|e| match dir {
                Direction::Incoming => e.source(),
                Direction::Outgoing => e.target(),
            })
            .filter(|&n| self.get_instruction(n).is_some())
    }

    /// The operations of one lane, in lane order.
    pub fn qubit_ops(&self, qubit: QubitId) -> IrResult<Vec<(NodeIndex, &Instruction)>> {
        let wire = WireId::Qubit(qubit);
        let path = self.walk(wire).ok_or_else(|| IrError::UnknownQubit {
            qubit,
            op: "lane query".into(),
        })??;
        Ok(path
            .into_iter()
            .filter_map(|idx| self.get_instruction(idx).map(|inst| (idx, inst)))
            .collect())
    }

    pub fn num_qubits(&self) -> usize {
        self.wires
            .keys()
            .filter(|w| matches!(w, WireId::Qubit(_)))
            .count()
    }

    pub fn num_clbits(&self) -> usize {
        self.wires.len() - self.num_qubits()
    }

    pub fn num_ops(&self) -> usize {
        self.graph.node_count() - 2 * self.wires.len()
    }

    /// Length of the longest chain of operations.
    pub fn depth(&self) -> usize {
        let mut depth: FxHashMap<NodeIndex, usize> = FxHashMap::default();
        let mut deepest = 0;
        for (idx, _) in self.topological_ops() {
            let d = 1 + self
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .filter_map(|pred| depth.get(&pred).copied())
                .max()
                .unwrap_or(0);
            depth.insert(idx, d);
            deepest = deepest.max(d);
        }
        deepest
    }

    /// Qubits in ascending order.
    pub fn qubits(&self) -> impl Iterator<Item = QubitId> + '_ {
        self.sorted_wires().into_iter().filter_map(|w| match w {
            WireId::Qubit(q) => Some(q),
            WireId::Clbit(_) => None,
        })
    }

    /// Classical bits in ascending order.
    pub fn clbits(&self) -> impl Iterator<Item = ClbitId> + '_ {
        self.sorted_wires().into_iter().filter_map(|w| match w {
            WireId::Clbit(c) => Some(c),
            WireId::Qubit(_) => None,
        })
    }

    fn sorted_wires(&self) -> Vec<WireId> {
        let mut wires: Vec<_> = self.wires.keys().copied().collect();
        wires.sort_unstable();
        wires
    }

    pub fn graph(&self) -> &DiGraph<DagNode, DagEdge, u32> {
        &self.graph
    }

    /// Check that the graph is acyclic, that every wire is one unbroken path
    /// from `In` to `Out`, and that every operation sits on exactly the
    /// wires of its operands.
    pub fn verify_integrity(&self) -> IrResult<()> {
        // toposort walks with an explicit stack, so long lanes are safe
        if petgraph::algo::toposort(&self.graph, None).is_err() {
            return Err(IrError::InvalidDag("cycle".into()));
        }

        let mut placements = 0;
        for wire in self.wires.keys() {
            let path = self
                .walk(*wire)
                .ok_or_else(|| IrError::InvalidDag(format!("{wire:?} has no endpoints")))??;
            placements += path.len();
        }

        let operands: usize = self
            .topological_ops()
            .map(|(_, inst)| inst.qubits.len() + inst.clbits.len())
            .sum();
        if placements != operands {
            return Err(IrError::InvalidDag(format!(
                "{operands} operands but {placements} wire placements"
            )));
        }
        Ok(())
    }

    /// Nodes strictly between a wire's endpoints, in wire order. `None` when
    /// the wire does not exist.
    fn walk(&self, wire: WireId) -> Option<IrResult<Vec<NodeIndex>>> {
        let Wire { input, output, .. } = *self.wires.get(&wire)?;
        let mut path = vec![];
        let mut current = input;
        loop {
            let next = self
                .graph
                .edges_directed(current, Direction::Outgoing)
                .find(|e| e.weight().wire == wire)
                .map(|e| e.target());
            match next {
                Some(n) if n == output => return Some(Ok(path)),
                Some(n) if path.len() < self.graph.node_count() => {
                    path.push(n);
                    current = n;
                }
                _ => {
                    return Some(Err(IrError::InvalidDag(format!(
                        "{wire:?} is broken after {current:?}"
                    ))));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::StandardGate;

    fn lanes(n: u32) -> CircuitDag {
        let mut dag = CircuitDag::new();
        for q in 0..n {
            dag.add_qubit(QubitId(q));
        }
        dag
    }

    fn cx(a: u32, b: u32) -> Instruction {
        Instruction::gate(StandardGate::CX, [QubitId(a), QubitId(b)])
    }

    #[test]
    fn test_empty_dag() {
        let dag = CircuitDag::new();
        assert_eq!(dag.num_qubits(), 0);
        assert_eq!(dag.num_ops(), 0);
        assert_eq!(dag.depth(), 0);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_depth_counts_delays() {
        let mut dag = lanes(2);
        dag.apply(Instruction::pulse(StandardGate::H, QubitId(0)))
            .unwrap();
        dag.apply(Instruction::pulse(StandardGate::H, QubitId(1)))
            .unwrap();
        assert_eq!(dag.depth(), 1);

        dag.apply(Instruction::delay(QubitId(0), 100)).unwrap();
        dag.apply(cx(0, 1)).unwrap();
        assert_eq!(dag.num_ops(), 4);
        assert_eq!(dag.depth(), 3);
    }

    #[test]
    fn test_operand_checks() {
        let mut dag = lanes(2);

        let short = Instruction::gate(StandardGate::CX, [QubitId(0)]);
        assert!(matches!(
            dag.apply(short),
            Err(IrError::ArityMismatch {
                expected: 2,
                got: 1,
                ..
            })
        ));

        let mut wide = Instruction::delay(QubitId(0), 10);
        wide.qubits.push(QubitId(1));
        assert!(matches!(dag.apply(wide), Err(IrError::DelayArity(2))));

        match dag.apply(cx(0, 9)) {
            Err(IrError::UnknownQubit { qubit, op }) => {
                assert_eq!(qubit, QubitId(9));
                assert_eq!(op, "cx");
            }
            other => panic!("expected UnknownQubit, got {other:?}"),
        }

        assert!(matches!(
            dag.apply(cx(1, 1)),
            Err(IrError::DuplicateOperand { .. })
        ));
        assert!(matches!(
            dag.apply(Instruction::measure(QubitId(0), ClbitId(0))),
            Err(IrError::UnknownClbit { .. })
        ));
        // nothing was placed
        assert_eq!(dag.num_ops(), 0);
    }

    #[test]
    fn test_topological_order_is_append_order() {
        let mut dag = lanes(2);
        let a = dag.apply(Instruction::delay(QubitId(1), 5)).unwrap();
        let b = dag.apply(Instruction::pulse(StandardGate::X, QubitId(0))).unwrap();
        let c = dag.apply(cx(0, 1)).unwrap();
        // a qubit added late still comes out in a valid order
        dag.add_qubit(QubitId(2));
        let d = dag.apply(cx(1, 2)).unwrap();

        let order: Vec<_> = dag.topological_ops().map(|(idx, _)| idx).collect();
        assert_eq!(order, vec![a, b, c, d]);
    }

    #[test]
    fn test_ancestors_count() {
        let mut dag = lanes(2);
        let first_delay = dag.apply(Instruction::delay(QubitId(1), 50)).unwrap();
        dag.apply(Instruction::pulse(StandardGate::H, QubitId(0)))
            .unwrap();
        let gate = dag.apply(cx(0, 1)).unwrap();
        let tail = dag.apply(Instruction::delay(QubitId(1), 200)).unwrap();

        assert_eq!(dag.ancestors_count(first_delay), 0);
        assert_eq!(dag.ancestors_count(gate), 2);
        assert_eq!(dag.ancestors_count(tail), 3);
    }

    #[test]
    fn test_wire_neighbours() {
        let mut dag = lanes(2);
        let gate = dag.apply(cx(0, 1)).unwrap();
        let d0 = dag.apply(Instruction::delay(QubitId(0), 300)).unwrap();
        let d1 = dag.apply(Instruction::delay(QubitId(0), 20)).unwrap();

        assert_eq!(dag.wire_predecessor(gate, QubitId(0)), None);
        assert_eq!(dag.wire_predecessor(d0, QubitId(0)), Some(gate));
        assert_eq!(dag.wire_successor(d0, QubitId(0)), Some(d1));
        assert_eq!(dag.wire_successor(d1, QubitId(0)), None);
        assert_eq!(dag.wire_successor(gate, QubitId(1)), None);
        // d0 is not on lane 1
        assert_eq!(dag.wire_predecessor(d0, QubitId(1)), None);
    }

    #[test]
    fn test_qubit_ops_in_lane_order() {
        let mut dag = lanes(2);
        dag.apply(Instruction::pulse(StandardGate::X, QubitId(0))).unwrap();
        dag.apply(Instruction::delay(QubitId(1), 7)).unwrap();
        dag.apply(Instruction::delay(QubitId(0), 9)).unwrap();
        dag.apply(Instruction::pulse(StandardGate::Y, QubitId(0))).unwrap();

        let lane: Vec<_> = dag
            .qubit_ops(QubitId(0))
            .unwrap()
            .into_iter()
            .map(|(_, inst)| inst.to_string())
            .collect();
        assert_eq!(lane, vec!["x q0", "delay(9) q0", "y q0"]);
        assert_eq!(dag.qubit_ops(QubitId(1)).unwrap().len(), 1);
        assert!(matches!(
            dag.qubit_ops(QubitId(5)),
            Err(IrError::UnknownQubit { .. })
        ));
    }

    #[test]
    fn test_verify_integrity_with_measurement() {
        let mut dag = lanes(1);
        dag.add_clbit(ClbitId(0));
        dag.apply(Instruction::pulse(StandardGate::H, QubitId(0))).unwrap();
        dag.apply(Instruction::delay(QubitId(0), 40)).unwrap();
        dag.apply(Instruction::measure(QubitId(0), ClbitId(0))).unwrap();

        dag.verify_integrity().unwrap();
        assert_eq!(dag.num_clbits(), 1);
    }

    #[test]
    fn test_verify_integrity_on_long_lane() {
        let mut dag = lanes(1);
        for _ in 0..100_000 {
            dag.apply(Instruction::pulse(StandardGate::X, QubitId(0))).unwrap();
            dag.apply(Instruction::delay(QubitId(0), 10)).unwrap();
        }
        dag.verify_integrity().unwrap();
        assert_eq!(dag.depth(), 200_000);
    }

    #[test]
    fn test_with_wires_of_copies_wires_only() {
        let mut dag = lanes(2);
        dag.add_clbit(ClbitId(0));
        dag.apply(Instruction::pulse(StandardGate::H, QubitId(0))).unwrap();

        let empty = CircuitDag::with_wires_of(&dag);
        assert_eq!(empty.num_qubits(), 2);
        assert_eq!(empty.num_clbits(), 1);
        assert_eq!(empty.num_ops(), 0);
        assert_eq!(empty.qubits().collect::<Vec<_>>(), vec![QubitId(0), QubitId(1)]);
    }
}
