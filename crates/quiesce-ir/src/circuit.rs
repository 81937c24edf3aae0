//! Builder for scheduled circuits.

use crate::dag::CircuitDag;
use crate::error::IrResult;
use crate::gate::{ClassicalCondition, Gate, StandardGate};
use crate::instruction::Instruction;
use crate::qubit::{ClbitId, QubitId};

/// A named scheduled circuit under construction.
///
/// Operations are appended in time order. Idle periods are explicit
/// [`delay`](Circuit::delay) calls measured in device time-steps; a lane
/// with no delay between two operations is assumed busy throughout.
///
/// Every method that places an operation returns `&mut Self`, so calls
/// chain with `?` or `.unwrap()` in tests.
#[derive(Debug, Clone)]
pub struct Circuit {
    name: String,
    dag: CircuitDag,
    qubits: u32,
    clbits: u32,
}

impl Circuit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dag: CircuitDag::new(),
            qubits: 0,
            clbits: 0,
        }
    }

    /// A circuit with lanes `q0..q{num_qubits}` and bits `c0..c{num_clbits}`.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::new(name);
        for _ in 0..num_qubits {
            circuit.add_qubit();
        }
        for _ in 0..num_clbits {
            circuit.add_clbit();
        }
        circuit
    }

    /// Add the next lane.
    pub fn add_qubit(&mut self) -> QubitId {
        let qubit = QubitId(self.qubits);
        self.qubits += 1;
        self.dag.add_qubit(qubit);
        qubit
    }

    /// Add the next classical bit.
    pub fn add_clbit(&mut self) -> ClbitId {
        let clbit = ClbitId(self.clbits);
        self.clbits += 1;
        self.dag.add_clbit(clbit);
        clbit
    }

    fn push(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        self.dag.apply(instruction)?;
        Ok(self)
    }

    // =========================================================================
    // Gates
    // =========================================================================

    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::pulse(StandardGate::H, qubit))
    }

    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::pulse(StandardGate::X, qubit))
    }

    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::pulse(StandardGate::Y, qubit))
    }

    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::pulse(StandardGate::Z, qubit))
    }

    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::pulse(StandardGate::SX, qubit))
    }

    /// CNOT with `control` as the first operand.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::gate(StandardGate::CX, [control, target]))
    }

    pub fn cz(&mut self, a: QubitId, b: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::gate(StandardGate::CZ, [a, b]))
    }

    pub fn ecr(&mut self, a: QubitId, b: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::gate(StandardGate::ECR, [a, b]))
    }

    /// Any gate, built-in or opaque.
    pub fn gate(
        &mut self,
        gate: impl Into<Gate>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::gate(gate, qubits))
    }

    /// A gate that fires only when `condition` holds.
    pub fn gate_if(
        &mut self,
        gate: impl Into<Gate>,
        qubits: impl IntoIterator<Item = QubitId>,
        condition: ClassicalCondition,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::gate(gate.into().with_condition(condition), qubits))
    }

    // =========================================================================
    // Non-gate operations
    // =========================================================================

    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.push(Instruction::measure(qubit, clbit))
    }

    /// Measure every lane into the bit of the same index, adding bits first
    /// if there are fewer bits than lanes.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        while self.clbits < self.qubits {
            self.add_clbit();
        }
        let qubits = (0..self.qubits).map(QubitId);
        let clbits = (0..self.qubits).map(ClbitId);
        self.push(Instruction::measure_many(qubits, clbits)?)
    }

    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::reset(qubit))
    }

    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.push(Instruction::barrier(qubits))
    }

    /// Idle `qubit` for `duration` dt.
    pub fn delay(&mut self, qubit: QubitId, duration: u64) -> IrResult<&mut Self> {
        self.push(Instruction::delay(qubit, duration))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_qubits(&self) -> usize {
        self.dag.num_qubits()
    }

    pub fn num_clbits(&self) -> usize {
        self.dag.num_clbits()
    }

    pub fn num_ops(&self) -> usize {
        self.dag.num_ops()
    }

    pub fn depth(&self) -> usize {
        self.dag.depth()
    }

    /// Total idle time scheduled on `qubit`.
    pub fn idle_time(&self, qubit: QubitId) -> IrResult<u64> {
        Ok(self
            .dag
            .qubit_ops(qubit)?
            .into_iter()
            .filter_map(|(_, inst)| inst.delay_duration())
            .sum())
    }

    pub fn dag(&self) -> &CircuitDag {
        &self.dag
    }

    pub fn into_dag(self) -> CircuitDag {
        self.dag
    }

    /// Wrap a timeline, for instance the output of a pass. New lanes and
    /// bits continue after the highest existing index.
    pub fn from_dag(name: impl Into<String>, dag: CircuitDag) -> Self {
        let qubits = dag.qubits().last().map_or(0, |q| q.0 + 1);
        let clbits = dag.clbits().last().map_or(0, |c| c.0 + 1);
        Self {
            name: name.into(),
            dag,
            qubits,
            clbits,
        }
    }
}
