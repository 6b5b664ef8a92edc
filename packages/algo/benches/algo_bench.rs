//! Benchmark suite for learnbible-algo
//!
//! Run with: cargo bench

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use learnbible_algo::{apply_xp, score_round, GameMode, MemoryState, RoundAnswers, SessionAllocation};

fn bench_review(c: &mut Criterion) {
    let now = Utc::now();
    let state = MemoryState {
        mastery: 0.42,
        correct_streak: 3,
        lapse_count: 1,
    };
    c.bench_function("MemoryState::review", |b| {
        b.iter(|| black_box(state).review(black_box(true), black_box(650), now))
    });
}

fn bench_apply_xp(c: &mut Criterion) {
    c.bench_function("apply_xp multi-level", |b| {
        b.iter(|| apply_xp(black_box(0), black_box(0), black_box(250_000)))
    });
}

fn bench_score_round(c: &mut Criterion) {
    let answers = RoundAnswers {
        correct_count: 4,
        incorrect_count: 1,
        all_blanks_correct: false,
        reference_correct: Some(true),
        mode: Some(GameMode::Hard),
        streak_before: 6,
        response_time_ms: Some(5200),
    };
    c.bench_function("score_round", |b| b.iter(|| score_round(black_box(&answers))));
    c.bench_function("SessionAllocation::for_target", |b| {
        b.iter(|| SessionAllocation::for_target(black_box(37)))
    });
}

criterion_group!(benches, bench_review, bench_apply_xp, bench_score_round);
criterion_main!(benches);
