use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

use crate::dataset::MatchPlayerRow;
use crate::stats::{
    max_value, mean, median, min_value, mode_ascending, population_variance, sample_variance,
};
use crate::tier::Tier;

pub const HIGH_MMR_GUILD_THRESHOLD: f64 = 2000.0;

/// Group key for the per-team stages: one team's rows within one match.
pub type TeamKey = (u64, u32);

/// Grouping for the mmr spread/variance stage.
///
/// `TeamAcrossMatches` pools every appearance of a team id, so a team that
/// shows up in ten matches gets one spread over all ten. That is what the
/// live tables were built with, unlike every other team-level stage, which
/// scopes to a single match. `MatchTeam` applies the per-match scoping here
/// too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmrSpreadGrouping {
    TeamAcrossMatches,
    MatchTeam,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureConfig {
    /// Compute guild median and mode tables in addition to the means.
    pub guild_extended: bool,
    /// Attach the exponential tier weight column.
    pub tier_weights: bool,
    pub mmr_spread_grouping: MmrSpreadGrouping,
    pub high_mmr_threshold: f64,
}

impl FeatureConfig {
    pub fn extended() -> Self {
        Self {
            guild_extended: true,
            tier_weights: true,
            mmr_spread_grouping: MmrSpreadGrouping::TeamAcrossMatches,
            high_mmr_threshold: HIGH_MMR_GUILD_THRESHOLD,
        }
    }

    /// Guild means only, no median/mode tables and no tier weights.
    pub fn basic() -> Self {
        Self {
            guild_extended: false,
            tier_weights: false,
            ..Self::extended()
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self::extended()
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TeamAverages {
    pub mmr: f64,
    pub win_streak: f64,
    pub lose_streak: f64,
    pub recent_win_prob: f64,
}

/// One statistic (mean, median, or mode) of the five guild-aggregated series.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GuildStats {
    pub mmr: f64,
    pub win_streak: f64,
    pub recent_win_prob: f64,
    pub accu_matches: f64,
    pub tier: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TeamAccuMatchStats {
    pub max: u32,
    pub min: u32,
    pub spread: u32,
    pub variance: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MatchWinProbStats {
    pub max: f64,
    pub min: f64,
    pub spread: f64,
    pub mean: f64,
    pub variance: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MmrSpread {
    pub spread: f64,
    pub variance: f64,
}

/// An input row plus every derived feature. The original row is embedded
/// untouched, so identity keys survive enrichment by construction.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedRow {
    #[serde(flatten)]
    pub player: MatchPlayerRow,
    pub team_avg_mmr: f64,
    pub team_avg_winstreak: f64,
    pub team_avg_losestreak: f64,
    pub team_avg_recentwinprob: f64,
    pub guild_avg: GuildStats,
    pub guild_median: Option<GuildStats>,
    pub guild_mode: Option<GuildStats>,
    pub guild_mean_mmr: f64,
    pub high_mmr_guild: bool,
    pub normalized_accumatches: f64,
    pub team_max_accumatches: u32,
    pub team_min_accumatches: u32,
    pub accumatches_diff: u32,
    pub accumatches_variance: f64,
    pub recent_performance_index: f64,
    pub mmr_diff: f64,
    pub mmr_variance: f64,
    pub recentwinprob_max: f64,
    pub recentwinprob_min: f64,
    pub recentwinprob_diff: f64,
    pub recentwinprob_mean: f64,
    pub recentwinprob_variance: f64,
    pub tier_numeric: i8,
    pub average_tier: f64,
    pub streak_rate: f64,
    pub tier_weight: Option<f64>,
}

/// Runs the derivation stages in dependency order over one row table. Holds
/// nothing but the config, so concurrent tables just get separate builders.
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    config: FeatureConfig,
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new(FeatureConfig::extended())
    }
}

impl FeatureBuilder {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Enriches the table: same rows, same order, derived columns attached.
    pub fn enrich(&self, rows: &[MatchPlayerRow]) -> Vec<EnrichedRow> {
        let team_avgs = team_mean_features(rows);
        let guild_avgs = guild_mean_features(rows);
        let guild_medians = self.config.guild_extended.then(|| guild_median_features(rows));
        let guild_modes = self.config.guild_extended.then(|| guild_mode_features(rows));
        let guild_mmr = guild_mean_mmr(rows);
        let normalized = normalized_accu_matches(rows);
        let team_accu = team_accu_match_stats(rows);
        let mmr_spreads = mmr_spread_features(rows, self.config.mmr_spread_grouping);
        let match_stats = match_win_prob_stats(rows);
        let avg_tiers = team_average_tiers(rows);

        let mut out = Vec::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            // Each map was grouped from these same rows, so every lookup key
            // is present.
            let team_key = (row.match_id, row.team_id);
            let bucket = row.guild_bucket();
            let tier = Tier::parse(&row.tier);
            let team_avg = team_avgs[&team_key];
            let accu = team_accu[&team_key];
            let winprob = match_stats[&row.match_id];
            let mmr_spread = mmr_spreads[idx];
            let guild_mean = guild_mmr[bucket];

            out.push(EnrichedRow {
                player: row.clone(),
                team_avg_mmr: team_avg.mmr,
                team_avg_winstreak: team_avg.win_streak,
                team_avg_losestreak: team_avg.lose_streak,
                team_avg_recentwinprob: team_avg.recent_win_prob,
                guild_avg: guild_avgs[bucket],
                guild_median: guild_medians.as_ref().map(|stats| stats[bucket]),
                guild_mode: guild_modes.as_ref().map(|stats| stats[bucket]),
                guild_mean_mmr: guild_mean,
                high_mmr_guild: guild_mean > self.config.high_mmr_threshold,
                normalized_accumatches: normalized[idx],
                team_max_accumatches: accu.max,
                team_min_accumatches: accu.min,
                accumatches_diff: accu.spread,
                accumatches_variance: accu.variance,
                recent_performance_index: f64::from(row.win_streak) * row.recent_win_prob,
                mmr_diff: mmr_spread.spread,
                mmr_variance: mmr_spread.variance,
                recentwinprob_max: winprob.max,
                recentwinprob_min: winprob.min,
                recentwinprob_diff: winprob.spread,
                recentwinprob_mean: winprob.mean,
                recentwinprob_variance: winprob.variance,
                tier_numeric: tier.ordinal(),
                average_tier: avg_tiers[&team_key],
                streak_rate: streak_rate(row.win_streak, row.lose_streak),
                tier_weight: self.config.tier_weights.then(|| tier.weight()),
            });
        }
        out
    }
}

/// Mean mmr, streaks, and recent win probability per team within a match.
pub fn team_mean_features(rows: &[MatchPlayerRow]) -> HashMap<TeamKey, TeamAverages> {
    #[derive(Default)]
    struct Sums {
        mmr: f64,
        win_streak: f64,
        lose_streak: f64,
        recent_win_prob: f64,
        n: usize,
    }

    let mut sums: HashMap<TeamKey, Sums> = HashMap::new();
    for row in rows {
        let s = sums.entry((row.match_id, row.team_id)).or_default();
        s.mmr += row.mmr;
        s.win_streak += f64::from(row.win_streak);
        s.lose_streak += f64::from(row.lose_streak);
        s.recent_win_prob += row.recent_win_prob;
        s.n += 1;
    }

    sums.into_iter()
        .map(|(key, s)| {
            let n = s.n as f64;
            (
                key,
                TeamAverages {
                    mmr: s.mmr / n,
                    win_streak: s.win_streak / n,
                    lose_streak: s.lose_streak / n,
                    recent_win_prob: s.recent_win_prob / n,
                },
            )
        })
        .collect()
}

#[derive(Debug, Default)]
struct GuildSeries {
    mmr: Vec<f64>,
    win_streak: Vec<f64>,
    recent_win_prob: Vec<f64>,
    accu_matches: Vec<f64>,
    tier: Vec<f64>,
}

fn guild_series(rows: &[MatchPlayerRow]) -> HashMap<&str, GuildSeries> {
    let mut groups: HashMap<&str, GuildSeries> = HashMap::new();
    for row in rows {
        let series = groups.entry(row.guild_bucket()).or_default();
        series.mmr.push(row.mmr);
        series.win_streak.push(f64::from(row.win_streak));
        series.recent_win_prob.push(row.recent_win_prob);
        series.accu_matches.push(f64::from(row.accu_matches));
        series.tier.push(f64::from(Tier::parse(&row.tier).ordinal()));
    }
    groups
}

fn guild_stat_features<'a>(
    rows: &'a [MatchPlayerRow],
    stat: fn(&[f64]) -> f64,
) -> HashMap<&'a str, GuildStats> {
    guild_series(rows)
        .into_iter()
        .map(|(bucket, series)| {
            (
                bucket,
                GuildStats {
                    mmr: stat(&series.mmr),
                    win_streak: stat(&series.win_streak),
                    recent_win_prob: stat(&series.recent_win_prob),
                    accu_matches: stat(&series.accu_matches),
                    tier: stat(&series.tier),
                },
            )
        })
        .collect()
}

pub fn guild_mean_features(rows: &[MatchPlayerRow]) -> HashMap<&str, GuildStats> {
    guild_stat_features(rows, mean)
}

pub fn guild_median_features(rows: &[MatchPlayerRow]) -> HashMap<&str, GuildStats> {
    guild_stat_features(rows, median)
}

pub fn guild_mode_features(rows: &[MatchPlayerRow]) -> HashMap<&str, GuildStats> {
    guild_stat_features(rows, mode_ascending)
}

pub fn guild_mean_mmr(rows: &[MatchPlayerRow]) -> HashMap<&str, f64> {
    let mut sums: HashMap<&str, (f64, usize)> = HashMap::new();
    for row in rows {
        let entry = sums.entry(row.guild_bucket()).or_insert((0.0, 0));
        entry.0 += row.mmr;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(bucket, (sum, n))| (bucket, sum / n as f64))
        .collect()
}

/// Global min-max normalization of accumulated matches. A zero-range column
/// has no defined normalization, so every cell becomes NaN.
pub fn normalized_accu_matches(rows: &[MatchPlayerRow]) -> Vec<f64> {
    if rows.is_empty() {
        return Vec::new();
    }
    let mut min = rows[0].accu_matches;
    let mut max = rows[0].accu_matches;
    for row in rows {
        min = min.min(row.accu_matches);
        max = max.max(row.accu_matches);
    }
    let range = f64::from(max - min);
    rows.iter()
        .map(|row| {
            if range == 0.0 {
                f64::NAN
            } else {
                f64::from(row.accu_matches - min) / range
            }
        })
        .collect()
}

pub fn team_accu_match_stats(rows: &[MatchPlayerRow]) -> HashMap<TeamKey, TeamAccuMatchStats> {
    let mut groups: HashMap<TeamKey, Vec<u32>> = HashMap::new();
    for row in rows {
        groups
            .entry((row.match_id, row.team_id))
            .or_default()
            .push(row.accu_matches);
    }

    groups
        .into_iter()
        .map(|(key, values)| {
            let max = values.iter().copied().fold(0u32, u32::max);
            let min = values.iter().copied().fold(u32::MAX, u32::min);
            let as_f64: Vec<f64> = values.iter().map(|v| f64::from(*v)).collect();
            (
                key,
                TeamAccuMatchStats {
                    max,
                    min,
                    spread: max - min,
                    variance: sample_variance(&as_f64),
                },
            )
        })
        .collect()
}

pub fn mmr_spread_features(rows: &[MatchPlayerRow], grouping: MmrSpreadGrouping) -> Vec<MmrSpread> {
    match grouping {
        MmrSpreadGrouping::TeamAcrossMatches => mmr_spreads_by(rows, |row| row.team_id),
        MmrSpreadGrouping::MatchTeam => mmr_spreads_by(rows, |row| (row.match_id, row.team_id)),
    }
}

fn mmr_spreads_by<K>(rows: &[MatchPlayerRow], key: impl Fn(&MatchPlayerRow) -> K) -> Vec<MmrSpread>
where
    K: Eq + Hash,
{
    let mut groups: HashMap<K, Vec<f64>> = HashMap::new();
    for row in rows {
        groups.entry(key(row)).or_default().push(row.mmr);
    }

    let spreads: HashMap<K, MmrSpread> = groups
        .into_iter()
        .map(|(k, values)| {
            (
                k,
                MmrSpread {
                    spread: max_value(&values) - min_value(&values),
                    variance: sample_variance(&values),
                },
            )
        })
        .collect();

    rows.iter().map(|row| spreads[&key(row)]).collect()
}

/// Max/min/mean/spread of recent win probability across a match, with the
/// variance taken as the mean of squared deviations over the whole match.
pub fn match_win_prob_stats(rows: &[MatchPlayerRow]) -> HashMap<u64, MatchWinProbStats> {
    let mut groups: HashMap<u64, Vec<f64>> = HashMap::new();
    for row in rows {
        groups
            .entry(row.match_id)
            .or_default()
            .push(row.recent_win_prob);
    }

    groups
        .into_iter()
        .map(|(match_id, values)| {
            let max = max_value(&values);
            let min = min_value(&values);
            (
                match_id,
                MatchWinProbStats {
                    max,
                    min,
                    spread: max - min,
                    mean: mean(&values),
                    variance: population_variance(&values),
                },
            )
        })
        .collect()
}

pub fn team_average_tiers(rows: &[MatchPlayerRow]) -> HashMap<TeamKey, f64> {
    let mut sums: HashMap<TeamKey, (f64, usize)> = HashMap::new();
    for row in rows {
        let entry = sums.entry((row.match_id, row.team_id)).or_insert((0.0, 0));
        entry.0 += f64::from(Tier::parse(&row.tier).ordinal());
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(key, (sum, n))| (key, sum / n as f64))
        .collect()
}

pub fn streak_rate(win_streak: u32, lose_streak: u32) -> f64 {
    let total = win_streak + lose_streak;
    if total == 0 {
        return 0.0;
    }
    f64::from(win_streak) / f64::from(total)
}
