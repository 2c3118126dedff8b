//! Criterion benchmarks for the genetic engine.
//!
//! Uses the synthetic OneMax problem (maximize set bits) to measure pure
//! engine overhead independent of any domain fitness cost.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use evokit::{
    BinaryMutate, Chromosome, Crossover, Elite, FitnessFn, GeneticEngine, Population,
    PopulationConfig,
};

fn onemax_fitness() -> FitnessFn {
    Arc::new(|c: &Chromosome| {
        let ones = c.genes().iter().filter(|g| g.binary_value() == 1).count();
        ones as f64 / c.len() as f64
    })
}

fn run_onemax(population_size: usize, chromosome_len: usize, max_evaluations: u64) -> f64 {
    let mut rng = evokit::rng::create_rng(42);
    let population = Population::random(
        population_size,
        chromosome_len,
        PopulationConfig::default(),
        &mut rng,
    )
    .unwrap();

    let mut engine = GeneticEngine::new(population, onemax_fitness());
    engine.add_operator(Box::new(Elite::new(10))).unwrap();
    engine
        .add_operator(Box::new(Crossover::new(0.85).with_seed(43)))
        .unwrap();
    engine
        .add_operator(Box::new(BinaryMutate::new(0.02).with_seed(44)))
        .unwrap();
    engine.run(max_evaluations).unwrap();

    engine.population().unwrap().maximum_fitness().unwrap()
}

fn bench_engine_onemax(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_onemax");
    group.sample_size(10);

    for (pop, len, evals) in [(40usize, 24usize, 2_000u64), (100, 50, 5_000), (200, 100, 10_000)] {
        group.bench_with_input(
            BenchmarkId::new(format!("p{}_l{}", pop, len), evals),
            &(pop, len, evals),
            |b, &(pop, len, evals)| {
                b.iter(|| black_box(run_onemax(black_box(pop), len, evals)))
            },
        );
    }
    group.finish();
}

fn bench_parallel_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_evaluation");
    group.sample_size(10);

    for &parallel in &[false, true] {
        let config = PopulationConfig::default()
            .with_parallel(parallel)
            .with_re_evaluate_all(true);
        group.bench_with_input(
            BenchmarkId::from_parameter(parallel),
            &config,
            |b, config| {
                let mut rng = evokit::rng::create_rng(7);
                let mut population =
                    Population::random(500, 200, config.clone(), &mut rng).unwrap();
                let fitness = onemax_fitness();
                b.iter(|| black_box(population.evaluate(&fitness).unwrap()))
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_engine_onemax, bench_parallel_evaluation);
criterion_main!(benches);
