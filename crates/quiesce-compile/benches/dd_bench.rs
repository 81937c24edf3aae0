//! Benchmarks for dynamical-decoupling insertion
//!
//! Run with: cargo bench -p quiesce-compile

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use quiesce_compile::passes::dd::{self, DdConfig, DdFamily};
use quiesce_compile::{Calibration, PulseDecomposition};
use quiesce_ir::{Circuit, CircuitDag, QubitId};

fn device(num_qubits: u32) -> Calibration {
    Calibration::uniform(num_qubits, 1e-9, [("x", 35e-9), ("rz", 0.0)])
        .with_decomposition(PulseDecomposition::ibm())
}

/// A brickwork of CX layers, each followed by an idle period on every lane.
fn brickwork(num_qubits: u32, layers: u32) -> CircuitDag {
    let mut circuit = Circuit::with_size("bench", num_qubits, 0);
    for layer in 0..layers {
        for q in (layer % 2..num_qubits - 1).step_by(2) {
            circuit.cx(QubitId(q), QubitId(q + 1)).unwrap();
        }
        for q in 0..num_qubits {
            circuit.delay(QubitId(q), 4000 + u64::from(q) * 37).unwrap();
        }
    }
    circuit.into_dag()
}

/// Benchmark per-lane families over growing timelines
fn bench_per_lane(c: &mut Criterion) {
    let mut group = c.benchmark_group("per_lane");

    for num_qubits in &[5, 20, 50] {
        let dag = brickwork(*num_qubits, 10);
        let cal = device(*num_qubits);
        for family in [DdFamily::Cpmg, DdFamily::Xy4, DdFamily::Udd] {
            group.bench_with_input(
                BenchmarkId::new(family.name(), num_qubits),
                &dag,
                |b, dag| {
                    b.iter(|| {
                        dd::apply(black_box(dag), family, 4, &DdConfig::default(), &cal).unwrap()
                    });
                },
            );
        }
    }

    group.finish();
}

/// Benchmark concatenation depth
fn bench_cdd_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("cdd_order");
    let dag = brickwork(10, 4);
    let cal = device(10);

    for order in 1..=3 {
        group.bench_with_input(BenchmarkId::new("cdd", order), &order, |b, &order| {
            b.iter(|| {
                dd::apply(&dag, DdFamily::Cdd, black_box(order), &DdConfig::default(), &cal)
                    .unwrap()
            });
        });
    }

    group.finish();
}

/// Benchmark nested families
fn bench_nested(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested");

    for num_qubits in &[4, 16, 32] {
        let dag = brickwork(*num_qubits, 10);
        let cal = device(*num_qubits);
        group.bench_with_input(BenchmarkId::new("nudd", num_qubits), &dag, |b, dag| {
            b.iter(|| {
                dd::apply(black_box(dag), DdFamily::Nudd, 2, &DdConfig::default(), &cal).unwrap()
            });
        });
        group.bench_with_input(BenchmarkId::new("ncdd", num_qubits), &dag, |b, dag| {
            b.iter(|| {
                dd::apply(black_box(dag), DdFamily::Ncdd, 1, &DdConfig::default(), &cal).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_per_lane, bench_cdd_order, bench_nested);

criterion_main!(benches);
