use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use rand::SeedableRng;
use rand::rngs::StdRng;

use arena_features::dataset::MatchPlayerRow;
use arena_features::features::{
    FeatureBuilder, FeatureConfig, guild_mean_features, match_win_prob_stats, team_mean_features,
};
use arena_features::sample_data::{SampleSpec, generate_rows};

fn bench_rows() -> Vec<MatchPlayerRow> {
    let spec = SampleSpec {
        matches: 200,
        teams_per_match: 2,
        players_per_team: 5,
        guilds: 40,
        no_guild_rate: 0.25,
    };
    let mut rng = StdRng::seed_from_u64(99);
    generate_rows(&mut rng, &spec)
}

fn bench_enrich_extended(c: &mut Criterion) {
    let rows = bench_rows();
    let builder = FeatureBuilder::default();
    c.bench_function("enrich_extended", |b| {
        b.iter(|| {
            let enriched = builder.enrich(black_box(&rows));
            black_box(enriched.len());
        })
    });
}

fn bench_enrich_basic(c: &mut Criterion) {
    let rows = bench_rows();
    let builder = FeatureBuilder::new(FeatureConfig::basic());
    c.bench_function("enrich_basic", |b| {
        b.iter(|| {
            let enriched = builder.enrich(black_box(&rows));
            black_box(enriched.len());
        })
    });
}

fn bench_team_means(c: &mut Criterion) {
    let rows = bench_rows();
    c.bench_function("team_means", |b| {
        b.iter(|| {
            let means = team_mean_features(black_box(&rows));
            black_box(means.len());
        })
    });
}

fn bench_guild_means(c: &mut Criterion) {
    let rows = bench_rows();
    c.bench_function("guild_means", |b| {
        b.iter(|| {
            let stats = guild_mean_features(black_box(&rows));
            black_box(stats.len());
        })
    });
}

fn bench_match_winprob_stats(c: &mut Criterion) {
    let rows = bench_rows();
    c.bench_function("match_winprob_stats", |b| {
        b.iter(|| {
            let stats = match_win_prob_stats(black_box(&rows));
            black_box(stats.len());
        })
    });
}

criterion_group!(
    perf,
    bench_enrich_extended,
    bench_enrich_basic,
    bench_team_means,
    bench_guild_means,
    bench_match_winprob_stats
);
criterion_main!(perf);
