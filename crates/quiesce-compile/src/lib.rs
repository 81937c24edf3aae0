//! Quiesce Dynamical-Decoupling Compiler
//!
//! This crate rewrites long idle periods of a scheduled circuit into
//! sequences of refocusing pulses, keeping every lane's total duration
//! unchanged to the time-step.
//!
//! # Architecture
//!
//! ```text
//! DdFamily + order ──► sequence::build ──► pulse list
//!                                             │
//! Calibration (GateDurationOracle) ──► CycleTiming per lane
//!                                             │
//!                              planner::plan per idle period
//!                                             │
//!                     TimelineRewriter / nested::rewrite ──► new DAG
//! ```
//!
//! # Families
//!
//! | Family | Pulses | Spacing |
//! |--------|--------|---------|
//! | `Cpmg` | Y Y | quarter/half/quarter of a 2000 dt cycle |
//! | `Xy4` | X Y X Y | fixed 10 ns step |
//! | `Cdd` | S(k), 4·\|S(k-1)\| + 4 pulses | fixed 10 ns step |
//! | `Udd` | Y × order | Uhrig sin² schedule over 1000·order dt |
//! | `Ncdd` | S(k) | nested across the lanes of an entangling gate |
//! | `Nudd` | Y × order | Uhrig schedule, nested |
//!
//! # Example: Pass Manager
//!
//! ```rust
//! use quiesce_compile::{Calibration, DdConfig, DdFamily, DdSummary, PassManagerBuilder};
//! use quiesce_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("idle", 2, 0);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.delay(QubitId(1), 4000).unwrap();
//!
//! let (pm, mut props) = PassManagerBuilder::new()
//!     .with_calibration(Calibration::uniform(2, 1e-9, [("x", 40e-9), ("y", 40e-9)]))
//!     .with_dynamical_decoupling(DdFamily::Xy4, 1, DdConfig::default())
//!     .build();
//!
//! let mut dag = circuit.into_dag();
//! pm.run(&mut dag, &mut props).unwrap();
//!
//! let summary = props.get::<DdSummary>().unwrap();
//! assert_eq!(summary.rewritten, 1);
//! ```
//!
//! # Custom Passes
//!
//! Any [`Pass`] can run next to the decoupling passes. Analysis passes
//! report through the [`PropertySet`]:
//!
//! ```rust
//! use quiesce_compile::{CompileResult, Pass, PassKind, PropertySet};
//! use quiesce_ir::CircuitDag;
//!
//! struct LongestIdle;
//!
//! impl Pass for LongestIdle {
//!     fn name(&self) -> &str { "longest_idle" }
//!     fn kind(&self) -> PassKind { PassKind::Analysis }
//!
//!     fn run(&self, dag: &mut CircuitDag, props: &mut PropertySet) -> CompileResult<()> {
//!         let longest = dag
//!             .topological_ops()
//!             .filter_map(|(_, inst)| inst.delay_duration())
//!             .max()
//!             .unwrap_or(0);
//!         props.insert(longest);
//!         Ok(())
//!     }
//! }
//! ```

pub mod calibration;
pub mod error;
pub mod manager;
pub mod pass;
pub mod passes;
pub mod property;

pub use calibration::{Calibration, GateDurationOracle, PulseDecomposition};
pub use error::{CompileError, CompileResult};
pub use manager::{PassManager, PassManagerBuilder};
pub use pass::{Pass, PassKind};
pub use passes::{DdConfig, DdFamily, DdSummary, DynamicalDecoupling};
pub use property::PropertySet;
