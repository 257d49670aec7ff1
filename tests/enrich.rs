use arena_features::dataset::MatchPlayerRow;
use arena_features::features::{FeatureBuilder, FeatureConfig, MmrSpreadGrouping};

fn row(
    match_id: u64,
    team_id: u32,
    guild: Option<&str>,
    mmr: f64,
    win: u32,
    lose: u32,
    prob: f64,
    accu: u32,
    tier: &str,
) -> MatchPlayerRow {
    MatchPlayerRow {
        match_id,
        team_id,
        guild_id: guild.map(|g| g.to_string()),
        mmr,
        win_streak: win,
        lose_streak: lose,
        recent_win_prob: prob,
        accu_matches: accu,
        tier: tier.to_string(),
    }
}

#[test]
fn two_row_team_scenario() {
    let rows = vec![
        row(1, 1, Some("G1"), 1000.0, 2, 0, 0.6, 10, "gold"),
        row(1, 1, Some("G1"), 2000.0, 0, 3, 0.4, 20, "silver"),
    ];
    let enriched = FeatureBuilder::default().enrich(&rows);

    assert_eq!(enriched.len(), 2);
    for e in &enriched {
        assert_eq!(e.team_avg_mmr, 1500.0);
        assert_eq!(e.mmr_diff, 1000.0);
    }
    assert_eq!(enriched[0].streak_rate, 1.0);
    assert_eq!(enriched[1].streak_rate, 0.0);
    assert!((enriched[0].recent_performance_index - 1.2).abs() < 1e-12);
    assert_eq!(enriched[1].recent_performance_index, 0.0);
    // gold=3, silver=2.
    assert_eq!(enriched[0].tier_numeric, 3);
    assert_eq!(enriched[1].tier_numeric, 2);
    assert_eq!(enriched[0].average_tier, 2.5);
}

#[test]
fn team_aggregates_broadcast_identically_to_every_member() {
    let rows = vec![
        row(1, 1, Some("G1"), 1000.0, 2, 0, 0.6, 10, "gold"),
        row(1, 1, Some("G2"), 2000.0, 0, 3, 0.4, 20, "silver"),
        row(1, 1, None, 1600.0, 1, 1, 0.5, 15, "platinum"),
        row(1, 2, None, 1300.0, 0, 0, 0.3, 5, "bronze"),
    ];
    let enriched = FeatureBuilder::default().enrich(&rows);

    let first_team: Vec<_> = enriched.iter().take(3).collect();
    for e in &first_team {
        assert_eq!(e.team_avg_mmr, first_team[0].team_avg_mmr);
        assert_eq!(e.team_avg_winstreak, first_team[0].team_avg_winstreak);
        assert_eq!(e.team_avg_losestreak, first_team[0].team_avg_losestreak);
        assert_eq!(
            e.team_avg_recentwinprob,
            first_team[0].team_avg_recentwinprob
        );
        assert_eq!(e.average_tier, first_team[0].average_tier);
        assert_eq!(e.accumatches_diff, first_team[0].accumatches_diff);
    }
    assert_ne!(enriched[3].team_avg_mmr, enriched[0].team_avg_mmr);
}

#[test]
fn missing_guilds_share_one_bucket() {
    let rows = vec![
        row(1, 1, None, 1000.0, 0, 0, 0.5, 10, "gold"),
        row(1, 1, None, 2000.0, 0, 0, 0.5, 20, "gold"),
        row(1, 2, Some("G1"), 1200.0, 0, 0, 0.5, 30, "gold"),
        row(1, 2, Some("G1"), 1400.0, 0, 0, 0.5, 40, "gold"),
    ];
    let enriched = FeatureBuilder::default().enrich(&rows);

    // Two distinct guild-aggregate value sets across the four rows.
    assert_eq!(enriched[0].guild_avg.mmr, 1500.0);
    assert_eq!(enriched[1].guild_avg.mmr, 1500.0);
    assert_eq!(enriched[2].guild_avg.mmr, 1300.0);
    assert_eq!(enriched[3].guild_avg.mmr, 1300.0);
    assert_eq!(enriched[0].guild_mean_mmr, 1500.0);
    assert_eq!(enriched[2].guild_mean_mmr, 1300.0);
}

#[test]
fn guild_mode_ties_resolve_to_the_smallest_value() {
    let rows = vec![
        row(1, 1, Some("G1"), 100.0, 0, 0, 0.5, 1, "gold"),
        row(1, 1, Some("G1"), 100.0, 0, 0, 0.5, 2, "gold"),
        row(1, 2, Some("G1"), 200.0, 0, 0, 0.5, 3, "gold"),
        row(1, 2, Some("G1"), 200.0, 0, 0, 0.5, 4, "gold"),
    ];
    let enriched = FeatureBuilder::default().enrich(&rows);
    for e in &enriched {
        let mode = e.guild_mode.expect("extended config computes modes");
        assert_eq!(mode.mmr, 100.0);
    }
}

#[test]
fn high_mmr_guild_flag_uses_the_threshold() {
    let rows = vec![
        row(1, 1, Some("whales"), 2400.0, 0, 0, 0.5, 1, "master"),
        row(1, 1, Some("whales"), 2200.0, 0, 0, 0.5, 2, "master"),
        row(1, 2, Some("minnows"), 900.0, 0, 0, 0.5, 3, "bronze"),
    ];
    let enriched = FeatureBuilder::default().enrich(&rows);
    assert!(enriched[0].high_mmr_guild);
    assert!(enriched[1].high_mmr_guild);
    assert!(!enriched[2].high_mmr_guild);
}

#[test]
fn normalization_endpoints_hit_zero_and_one() {
    let rows = vec![
        row(1, 1, None, 1000.0, 0, 0, 0.5, 5, "gold"),
        row(1, 1, None, 1000.0, 0, 0, 0.5, 105, "gold"),
        row(1, 2, None, 1000.0, 0, 0, 0.5, 55, "gold"),
    ];
    let enriched = FeatureBuilder::default().enrich(&rows);
    assert_eq!(enriched[0].normalized_accumatches, 0.0);
    assert_eq!(enriched[1].normalized_accumatches, 1.0);
    assert_eq!(enriched[2].normalized_accumatches, 0.5);
}

#[test]
fn row_count_order_and_identity_survive_enrichment() {
    let rows = vec![
        row(3, 2, Some("G9"), 1111.0, 1, 0, 0.7, 9, "diamond"),
        row(1, 1, None, 1500.0, 0, 0, 0.5, 10, "gold"),
        row(2, 1, Some("G1"), 1900.0, 0, 2, 0.2, 80, "not-a-tier"),
    ];
    let enriched = FeatureBuilder::default().enrich(&rows);
    assert_eq!(enriched.len(), rows.len());
    for (original, e) in rows.iter().zip(&enriched) {
        assert_eq!(e.player.match_id, original.match_id);
        assert_eq!(e.player.team_id, original.team_id);
        assert_eq!(e.player.guild_id, original.guild_id);
        assert_eq!(e.player.tier, original.tier);
    }
    assert_eq!(enriched[2].tier_numeric, -1);
}

#[test]
fn basic_config_skips_the_extended_stages() {
    let rows = vec![
        row(1, 1, Some("G1"), 1000.0, 2, 0, 0.6, 10, "gold"),
        row(1, 2, Some("G1"), 2000.0, 0, 3, 0.4, 20, "silver"),
    ];
    let basic = FeatureBuilder::new(FeatureConfig::basic()).enrich(&rows);
    for e in &basic {
        assert!(e.guild_median.is_none());
        assert!(e.guild_mode.is_none());
        assert!(e.tier_weight.is_none());
    }

    let extended = FeatureBuilder::default().enrich(&rows);
    for e in &extended {
        assert!(e.guild_median.is_some());
        assert!(e.guild_mode.is_some());
        assert!(e.tier_weight.is_some());
    }
    // e^3 for gold.
    let weight = extended[0].tier_weight.expect("tier weight computed");
    assert!((weight - 3.0_f64.exp()).abs() < 1e-9);
}

#[test]
fn streak_rate_stays_in_unit_interval() {
    let rows = vec![
        row(1, 1, None, 1000.0, 0, 0, 0.5, 1, "gold"),
        row(1, 1, None, 1000.0, 5, 0, 0.5, 2, "gold"),
        row(1, 2, None, 1000.0, 0, 4, 0.5, 3, "gold"),
        row(1, 2, None, 1000.0, 3, 1, 0.5, 4, "gold"),
    ];
    let enriched = FeatureBuilder::default().enrich(&rows);
    for e in &enriched {
        assert!(e.streak_rate >= 0.0 && e.streak_rate <= 1.0);
    }
    assert_eq!(enriched[0].streak_rate, 0.0);
    assert_eq!(enriched[1].streak_rate, 1.0);
    assert_eq!(enriched[3].streak_rate, 0.75);
}

#[test]
fn mmr_spread_grouping_is_configurable() {
    let rows = vec![
        row(1, 7, None, 1000.0, 0, 0, 0.5, 1, "gold"),
        row(2, 7, None, 1800.0, 0, 0, 0.5, 2, "gold"),
    ];

    let pooled = FeatureBuilder::default().enrich(&rows);
    assert_eq!(pooled[0].mmr_diff, 800.0);
    assert_eq!(pooled[1].mmr_diff, 800.0);

    let mut config = FeatureConfig::extended();
    config.mmr_spread_grouping = MmrSpreadGrouping::MatchTeam;
    let scoped = FeatureBuilder::new(config).enrich(&rows);
    assert_eq!(scoped[0].mmr_diff, 0.0);
    assert!(scoped[0].mmr_variance.is_nan());
}

#[test]
fn rerunning_the_pipeline_is_deterministic() {
    let rows = vec![
        row(1, 1, Some("G1"), 1000.0, 2, 0, 0.6, 10, "gold"),
        row(1, 1, None, 2000.0, 0, 3, 0.4, 20, "silver"),
        row(2, 1, Some("G2"), 1500.0, 1, 1, 0.5, 30, "unranked"),
    ];
    let builder = FeatureBuilder::default();
    let first = serde_json::to_string(&builder.enrich(&rows)).expect("serialize");
    let second = serde_json::to_string(&builder.enrich(&rows)).expect("serialize");
    assert_eq!(first, second);
}

#[test]
fn match_level_winprob_stats_cross_team_lines() {
    let rows = vec![
        row(1, 1, None, 1000.0, 0, 0, 0.9, 1, "gold"),
        row(1, 1, None, 1000.0, 0, 0, 0.5, 2, "gold"),
        row(1, 2, None, 1000.0, 0, 0, 0.1, 3, "gold"),
    ];
    let enriched = FeatureBuilder::default().enrich(&rows);
    for e in &enriched {
        assert_eq!(e.recentwinprob_max, 0.9);
        assert_eq!(e.recentwinprob_min, 0.1);
        assert!((e.recentwinprob_diff - 0.8).abs() < 1e-12);
        assert!((e.recentwinprob_mean - 0.5).abs() < 1e-12);
    }
    // Population variance: ((0.4)^2 + 0 + (0.4)^2) / 3.
    let expected = (0.16 + 0.16) / 3.0;
    assert!((enriched[0].recentwinprob_variance - expected).abs() < 1e-12);
}
