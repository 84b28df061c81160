use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use room_colgen::{
    BranchAndBoundSolver, ColumnGenerationConfig, ColumnGenerationSolver, IncompatibilityGraph,
    Operation, SchedulingInstance, SweepOrder,
};

fn instance(seed: u64, n: usize) -> SchedulingInstance {
    let mut rng = StdRng::seed_from_u64(seed);
    let operations = (0..n)
        .map(|i| {
            let start = 480 + 15 * rng.gen_range(0..36);
            let duration = 15 * rng.gen_range(2..10);
            Operation::new(format!("op{}", i), start, start + duration)
        })
        .collect();
    SchedulingInstance::new(operations)
}

fn bench_graph(c: &mut Criterion) {
    let operations = instance(7, 200).operations;
    c.bench_function("incompatibility_graph_200", |b| {
        b.iter(|| IncompatibilityGraph::build(black_box(&operations)))
    });
}

fn bench_column_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("column_generation");
    group.sample_size(10);

    for &n in &[10usize, 20, 100] {
        let instance = instance(42, n);
        let solver = ColumnGenerationSolver::new(
            BranchAndBoundSolver::default(),
            ColumnGenerationConfig {
                sweeps: vec![
                    SweepOrder::Natural,
                    SweepOrder::Reverse,
                    SweepOrder::Shuffled(1),
                ],
                ..Default::default()
            },
        );
        group.bench_with_input(BenchmarkId::from_parameter(n), &instance, |b, instance| {
            b.iter(|| solver.solve(black_box(instance)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_graph, bench_column_generation);
criterion_main!(benches);
