//! Quiesce Scheduled-Circuit Intermediate Representation
//!
//! This crate provides the data structures the dynamical-decoupling engine
//! operates on: a scheduled quantum circuit in which every idle period is an
//! explicit, single-lane [`InstructionKind::Delay`] of integral device
//! time-steps (`dt`).
//!
//! # Core Components
//!
//! - **Lanes**: [`QubitId`], [`ClbitId`]
//! - **Gates**: [`Gate`], either a [`StandardGate`] or an opaque device
//!   operation, optionally guarded by a [`ClassicalCondition`]
//! - **Instructions**: [`Instruction`] combining an operation with its operands
//! - **DAG**: [`CircuitDag`], the wire-ordered timeline graph
//! - **Circuit**: [`Circuit`], a builder over the DAG
//!
//! # Example: Idle After an Entangler
//!
//! ```rust
//! use quiesce_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("idle", 2, 0);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.delay(QubitId(1), 2000).unwrap();
//!
//! let dag = circuit.into_dag();
//! let idles: Vec<_> = dag
//!     .topological_ops()
//!     .filter_map(|(_, inst)| inst.delay_duration())
//!     .collect();
//! assert_eq!(idles, vec![2000]);
//! ```

pub mod circuit;
pub mod dag;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod qubit;

pub use circuit::Circuit;
pub use dag::{CircuitDag, DagEdge, DagNode, NodeIndex, WireId};
pub use error::{IrError, IrResult};
pub use gate::{ClassicalCondition, Gate, GateKind, StandardGate};
pub use instruction::{Instruction, InstructionKind};
pub use qubit::{ClbitId, QubitId};
