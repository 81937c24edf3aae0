//! Error types for the IR crate.

use crate::qubit::{ClbitId, QubitId};
use thiserror::Error;

/// Errors raised while building or inspecting a timeline.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// An operation refers to a qubit the timeline does not have.
    #[error("{op} refers to unknown qubit {qubit}")]
    UnknownQubit {
        /// The missing lane.
        qubit: QubitId,
        /// Name of the offending operation.
        op: String,
    },

    /// An operation refers to a classical bit the timeline does not have.
    #[error("{op} refers to unknown classical bit {clbit}")]
    UnknownClbit {
        /// The missing bit.
        clbit: ClbitId,
        /// Name of the offending operation.
        op: String,
    },

    /// A gate was given the wrong number of qubits.
    #[error("{op} acts on {expected} qubits, got {got}")]
    ArityMismatch {
        /// Gate name.
        op: String,
        /// Arity of the gate.
        expected: usize,
        /// Number of qubits supplied.
        got: usize,
    },

    /// The same qubit appears twice in one operation.
    #[error("{op} uses qubit {qubit} more than once")]
    DuplicateOperand {
        /// The repeated lane.
        qubit: QubitId,
        /// Name of the offending operation.
        op: String,
    },

    /// A delay must idle exactly one lane.
    #[error("delay must idle exactly one qubit, got {0}")]
    DelayArity(usize),

    /// A measurement pairs unequal numbers of qubits and classical bits.
    #[error("measurement pairs {qubits} qubits with {clbits} classical bits")]
    MeasureMismatch {
        /// Qubits measured.
        qubits: usize,
        /// Classical bits written.
        clbits: usize,
    },

    /// The graph no longer describes a valid timeline.
    #[error("invalid timeline graph: {0}")]
    InvalidDag(String),
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
