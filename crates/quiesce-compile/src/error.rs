//! Errors raised while compiling a timeline.

use quiesce_ir::QubitId;
use thiserror::Error;

/// Errors raised by passes and the pass manager.
///
/// An idle period that is too short for a sequence is not an error; it is
/// left as it is.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// The rewritten timeline was rejected by the IR.
    #[error("timeline: {0}")]
    Ir(#[from] quiesce_ir::IrError),

    /// Requested sequence order is outside the family's supported range.
    #[error("{family} does not support order {order} (supported: {min}..={max})")]
    InvalidOrder {
        /// Family name.
        family: &'static str,
        /// Requested order.
        order: u32,
        /// Smallest supported order.
        min: u32,
        /// Largest supported order.
        max: u32,
    },

    /// Calibrated pulses do not fit in the configured cycle on a lane.
    #[error("pulses on {qubit} need {required} dt but a cycle only has {available} dt")]
    InsufficientDuration {
        /// The lane that cannot host the sequence.
        qubit: QubitId,
        /// Total pulse duration of one cycle.
        required: u64,
        /// Configured cycle duration.
        available: u64,
    },

    /// Both a cycle-duration and a step-delay override were supplied.
    #[error("cycle duration {cycle} dt and step delay {step} dt cannot both be set")]
    ConflictingConfiguration {
        /// Requested cycle duration.
        cycle: u64,
        /// Requested step delay.
        step: u64,
    },

    /// Calibration data has no entry for a lane or native gate.
    #[error("no calibrated length for '{gate}' on {qubit}")]
    MissingCalibration {
        /// Native gate or pulse name.
        gate: String,
        /// Lane that was queried.
        qubit: QubitId,
    },

    /// A property the pass depends on was not set.
    #[error("pass needs the '{0}' property")]
    MissingProperty(&'static str),

    /// Invalid pass configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for compilation.
pub type CompileResult<T> = Result<T, CompileError>;
