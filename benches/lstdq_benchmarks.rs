use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::{SeedableRng, rngs::StdRng};
use std::hint::black_box;
use std::sync::Arc;

use lspi::lstdq::{lstdq, lstdq_exact, lstdq_opt_exact};
use lspi::prelude::*;

/// Random-policy samples from a chain of `n` states, with a greedy policy to evaluate
fn chain_setup(n: usize) -> (Vec<Sample>, Policy) {
    let mut rng = StdRng::seed_from_u64(42);
    let mut chain = Chain::new(n, 0.9, 0).unwrap();
    let basis: Arc<dyn FeatureMap> = Arc::new(ExactBasis::new(&[n], 2).unwrap());
    let random = Policy::with_zero_weights(1.0, 2, basis.clone()).unwrap();
    let samples = collect_samples(&mut chain, 10, 500, &random, &mut rng).unwrap();
    let policy = Policy::with_random_weights(0.0, 2, basis, &mut rng).unwrap();
    (samples, policy)
}

fn bench_evaluators(c: &mut Criterion) {
    let mut group = c.benchmark_group("lstdq");
    group.sample_size(20);
    let solver = BiCgStab::new(IterationMonitor::default()).unwrap();

    for n_states in [10, 50, 200].iter() {
        let (samples, policy) = chain_setup(*n_states);

        group.bench_with_input(BenchmarkId::new("dense", n_states), n_states, |b, _| {
            let mut rng = StdRng::seed_from_u64(0);
            b.iter(|| black_box(lstdq(&samples, &policy, 0.9, &mut rng).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("exact", n_states), n_states, |b, _| {
            let mut rng = StdRng::seed_from_u64(0);
            b.iter(|| black_box(lstdq_exact(&samples, &policy, 0.9, &solver, &mut rng).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("inverse_update", n_states), n_states, |b, _| {
            let mut rng = StdRng::seed_from_u64(0);
            b.iter(|| black_box(lstdq_opt_exact(&samples, &policy, 0.9, &mut rng).unwrap()));
        });
    }

    group.finish();
}

fn bench_learning(c: &mut Criterion) {
    let mut group = c.benchmark_group("learn");
    group.sample_size(10);
    let (samples, _) = chain_setup(20);
    let basis: Arc<dyn FeatureMap> = Arc::new(ExactBasis::new(&[20], 2).unwrap());
    let initial = Policy::with_zero_weights(0.0, 2, basis).unwrap();

    for improver in [PolicyImprover::Lstdq, PolicyImprover::LstdqExact] {
        let lspi = Lspi::new(LspiConfig::default().improver(improver)).unwrap();
        group.bench_function(format!("{:?}", improver), |b| {
            let mut rng = StdRng::seed_from_u64(0);
            b.iter(|| black_box(lspi.learn(&samples, &initial, &mut rng).unwrap()));
        });
    }

    group.finish();
}

fn bench_model(c: &mut Criterion) {
    let (samples, _) = chain_setup(50);

    c.bench_function("model_from_samples", |b| {
        b.iter(|| black_box(TransitionModel::from_samples(&samples)));
    });
}

criterion_group!(benches, bench_evaluators, bench_learning, bench_model);
criterion_main!(benches);
