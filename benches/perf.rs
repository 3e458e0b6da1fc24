use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use matchmind::{
    OracleAnalysis, PlayerScoringProbability, SimulationContext, analyze, enhance, run_enhanced,
    simulate,
};

fn bench_simulate_10k(c: &mut Criterion) {
    let ctx = SimulationContext::neutral();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    c.bench_function("tesseract_simulate_10k", |b| {
        b.iter(|| {
            let dist = simulate(black_box(82), black_box(55), &ctx, 10_000, &mut rng).unwrap();
            black_box(dist.simulation_count);
        })
    });
}

fn bench_enhanced_10k(c: &mut Criterion) {
    let oracle = OracleAnalysis::from_power_scores(82, 55).unwrap();
    let scorers: Vec<PlayerScoringProbability> = (0..11)
        .map(|idx| PlayerScoringProbability {
            player: format!("Player {idx}"),
            base_probability: 20.0 + f64::from(idx) * 5.0,
            adjusted_probability: 20.0 + f64::from(idx) * 5.0,
            is_playing: true,
        })
        .collect();
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    c.bench_function("player_overlay_10k", |b| {
        b.iter(|| {
            let out = run_enhanced(&oracle, &scorers, &scorers, 10_000, &mut rng).unwrap();
            black_box(out.home_expected_goals);
        })
    });
}

fn bench_arbitration(c: &mut Criterion) {
    let ctx = SimulationContext::neutral();
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let dist = simulate(82, 55, &ctx, 10_000, &mut rng).unwrap();
    let mut oracle = OracleAnalysis::from_power_scores(82, 55).unwrap();
    oracle.simulation_context = Some(ctx);
    c.bench_function("mastermind_analyze", |b| {
        b.iter(|| {
            let signal = analyze(black_box(&oracle), Some(black_box(&dist))).unwrap();
            black_box(signal.confidence);
        })
    });
    let signal = analyze(&oracle, Some(&dist)).unwrap();
    c.bench_function("context_enhance_noop", |b| {
        b.iter(|| {
            let out = enhance(black_box(&signal), &[], &[]);
            black_box(out.confidence);
        })
    });
}

criterion_group!(perf, bench_simulate_10k, bench_enhanced_10k, bench_arbitration);
criterion_main!(perf);
