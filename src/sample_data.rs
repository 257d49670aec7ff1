use std::path::Path;

use anyhow::{Context, Result};
use rand::Rng;

use crate::dataset::MatchPlayerRow;
use crate::tier::TIER_NAMES;

#[derive(Debug, Clone, Copy)]
pub struct SampleSpec {
    pub matches: u32,
    pub teams_per_match: u32,
    pub players_per_team: u32,
    pub guilds: u32,
    pub no_guild_rate: f64,
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self {
            matches: 50,
            teams_per_match: 2,
            players_per_team: 5,
            guilds: 12,
            no_guild_rate: 0.25,
        }
    }
}

/// Synthetic match-player rows for demos, tests, and benches. Deterministic
/// when driven by a seeded rng.
pub fn generate_rows<R: Rng>(rng: &mut R, spec: &SampleSpec) -> Vec<MatchPlayerRow> {
    let mut rows = Vec::new();
    for match_id in 1..=u64::from(spec.matches.max(1)) {
        for team_id in 1..=spec.teams_per_match.max(1) {
            for _ in 0..spec.players_per_team.max(1) {
                let guild_id = if rng.gen_bool(spec.no_guild_rate.clamp(0.0, 1.0)) {
                    None
                } else {
                    Some(format!("G{:03}", rng.gen_range(1..=spec.guilds.max(1))))
                };
                // A player is on a win streak or a lose streak, never both.
                let win_streak = rng.gen_range(0..6);
                let lose_streak = if win_streak == 0 {
                    rng.gen_range(0..6)
                } else {
                    0
                };
                rows.push(MatchPlayerRow {
                    match_id,
                    team_id,
                    guild_id,
                    mmr: rng.gen_range(800.0..2800.0),
                    win_streak,
                    lose_streak,
                    recent_win_prob: rng.gen_range(0.0..1.0),
                    accu_matches: rng.gen_range(1..2500),
                    tier: TIER_NAMES[rng.gen_range(0..TIER_NAMES.len())].to_string(),
                });
            }
        }
    }
    rows
}

pub fn write_sample_csv(path: &Path, rows: &[MatchPlayerRow]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    for row in rows {
        writer.serialize(row).context("write sample row")?;
    }
    writer.flush().context("flush sample csv")?;
    Ok(())
}
