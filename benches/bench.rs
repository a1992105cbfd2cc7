// Criterion benchmarks for the Boost engine

use boost_engine::core::{
    leaderboard::{rank_tallies, tally_votes},
    reward::{default_rewards, RewardTable},
    session::build_deck,
};
use boost_engine::models::{Direction, Profile, Vote};
use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

fn create_profile(id: usize) -> Profile {
    Profile {
        profile_id: format!("p{}", id),
        display_name: format!("Model {}", id),
        is_verified: Some(id % 3 == 0),
        is_featured: Some(id % 10 == 0),
        location_tags: vec![],
        category_tags: vec![],
        image_file_ids: vec![],
        today_points: 0,
        week_points: 0,
        all_time_points: 0,
        today_rank: None,
    }
}

fn create_votes(count: usize, profiles: usize) -> Vec<Vote> {
    let now = Utc::now();
    (0..count)
        .map(|i| Vote {
            id: Uuid::new_v4(),
            identity: format!("anon:{}", i % 97),
            profile_id: format!("p{}", i % profiles),
            round_id: Uuid::nil(),
            direction: if i % 4 == 0 { Direction::Pass } else { Direction::Like },
            tier: if i % 7 == 0 { "boost" } else { "none" }.to_string(),
            multiplier: if i % 7 == 0 { 5 } else { 1 },
            points: if i % 4 == 0 { 0 } else if i % 7 == 0 { 5 } else { 1 },
            revealed: false,
            priority: false,
            created_at: now - Duration::seconds(i as i64),
        })
        .collect()
}

fn bench_reward_draw(c: &mut Criterion) {
    let table = RewardTable::new(default_rewards()).unwrap();
    let mut rng = StdRng::seed_from_u64(7);

    c.bench_function("reward_draw", |b| {
        b.iter(|| table.draw(black_box(&mut rng)));
    });
}

fn bench_leaderboard(c: &mut Criterion) {
    let mut group = c.benchmark_group("leaderboard");

    for size in [1_000, 10_000, 100_000].iter() {
        let votes = create_votes(*size, 500);

        group.bench_with_input(BenchmarkId::from_parameter(size), &votes, |b, votes| {
            b.iter(|| rank_tallies(tally_votes(black_box(votes), None), 100));
        });
    }

    group.finish();
}

fn bench_build_deck(c: &mut Criterion) {
    let candidates: Vec<Profile> = (0..200).map(create_profile).collect();
    let seen: Vec<String> = (0..100).map(|i| format!("p{}", i * 2)).collect();

    c.bench_function("build_deck", |b| {
        b.iter(|| build_deck(black_box(candidates.clone()), black_box(&seen), 20));
    });
}

criterion_group!(benches, bench_reward_draw, bench_leaderboard, bench_build_deck);
criterion_main!(benches);
