use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use armsight_kinematics::{InverseSolver, KinematicChain, HOME_CONFIGURATION};

fn bench_forward_kinematics(c: &mut Criterion) {
    let mut group = c.benchmark_group("forward_kinematics");

    let chain = KinematicChain::franka_panda();

    for (name, q) in [("zero", [0.0; 7]), ("home", HOME_CONFIGURATION)] {
        group.bench_with_input(BenchmarkId::new("joint7", name), &q, |b, q| {
            b.iter(|| black_box(chain.forward_kinematics(black_box(q))))
        });

        group.bench_with_input(BenchmarkId::new("tool", name), &q, |b, q| {
            b.iter(|| black_box(chain.forward_kinematics_tool(black_box(q))))
        });
    }

    group.finish();
}

fn bench_inverse_kinematics(c: &mut Criterion) {
    let mut group = c.benchmark_group("inverse_kinematics");

    let solver = InverseSolver::franka_panda();
    let target = solver
        .chain()
        .forward_kinematics(&HOME_CONFIGURATION)
        .expect("home configuration has 7 joints");

    for offset in [0.01, 0.05, 0.1] {
        let seed = HOME_CONFIGURATION.map(|q| q + offset);
        group.bench_with_input(
            BenchmarkId::new("lbfgs", format!("offset_{offset}")),
            &seed,
            |b, seed| b.iter(|| black_box(solver.solve(&target, black_box(seed)))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_forward_kinematics, bench_inverse_kinematics);
criterion_main!(benches);
