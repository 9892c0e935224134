//! Criterion benchmarks for the stepping engine.
//!
//! Run with:
//!   cargo bench
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use smpsim::prelude::*;

fn make_run(side: usize, max_population: usize, seed: u64) -> (Environment, State) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let cfg = Configuration::new(Location::of(&[side, side])).with_max_population(max_population);
    let instructions = Instruction::random_set(&cfg, 8, &mut rng).unwrap();
    let env = Environment::new(cfg, instructions).unwrap();
    let mut state = env
        .initial_state(|width| random_bits(width, &mut rng))
        .unwrap();
    // Warm up: let the population grow before measuring.
    for _ in 0..50 {
        if state.is_extinct() {
            break;
        }
        state = env.step(&state).unwrap();
    }
    (env, state)
}

/// Benchmark step() with varying population caps.
fn bench_step_population(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_population");

    for max_population in [16, 64, 256].iter() {
        group.throughput(Throughput::Elements(*max_population as u64));

        group.bench_with_input(
            BenchmarkId::new("grid_64", max_population),
            max_population,
            |b, &max_population| {
                let (env, state) = make_run(64, max_population, 42);
                b.iter(|| black_box(env.step(&state).unwrap().population()));
            },
        );
    }

    group.finish();
}

/// Benchmark the per-step cost of copying the grid.
fn bench_step_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_grid");

    for side in [16, 64, 128].iter() {
        group.throughput(Throughput::Elements((*side * *side) as u64));

        group.bench_with_input(BenchmarkId::new("pop_64", side), side, |b, &side| {
            let (env, state) = make_run(side, 64, 42);
            b.iter(|| black_box(env.step(&state).unwrap().step()));
        });
    }

    group.finish();
}

/// Benchmark instruction decoding and lookup.
fn bench_instruction(c: &mut Criterion) {
    let mut group = c.benchmark_group("instruction");
    let cfg = Configuration::default();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let instruction = Instruction::random(
        cfg.dims(),
        cfg.instruction_input_width(),
        cfg.instruction_output_width(),
        &mut rng,
    )
    .unwrap();
    let encoded = instruction.encode().unwrap();
    let input = random_bits(cfg.instruction_input_width(), &mut rng);

    group.bench_function("decode", |b| {
        b.iter(|| {
            black_box(
                Instruction::decode(
                    cfg.dims(),
                    cfg.instruction_input_width(),
                    cfg.instruction_output_width(),
                    &encoded,
                )
                .unwrap(),
            )
        });
    });

    group.bench_function("apply", |b| {
        b.iter(|| black_box(instruction.apply(&input).unwrap().len()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_step_population,
    bench_step_grid,
    bench_instruction,
);

criterion_main!(benches);
