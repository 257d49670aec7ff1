use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::features::{EnrichedRow, GuildStats};

pub struct ExportReport {
    pub rows: usize,
    pub columns: usize,
}

pub fn export_enriched_xlsx(path: &Path, rows: &[EnrichedRow]) -> Result<ExportReport> {
    let mut sheet_rows = vec![header_row()];
    for row in rows {
        sheet_rows.push(enriched_row_cells(row));
    }
    let columns = sheet_rows[0].len();

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Enriched")?;
    write_rows(sheet, &sheet_rows)?;

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        rows: rows.len(),
        columns,
    })
}

/// One json object per line. Non-finite floats serialize as null.
pub fn export_enriched_jsonl(path: &Path, rows: &[EnrichedRow]) -> Result<usize> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for row in rows {
        let line = serde_json::to_string(row).context("serialize enriched row")?;
        writeln!(out, "{line}").context("write enriched row")?;
    }
    out.flush().context("flush enriched rows")?;
    Ok(rows.len())
}

fn header_row() -> Vec<String> {
    [
        "matchid",
        "teamid",
        "guildid",
        "mmr",
        "winstreak",
        "losestreak",
        "recentwinprob",
        "accumatches",
        "tier",
        "team_avg_mmr",
        "team_avg_winstreak",
        "team_avg_losestreak",
        "team_avg_recentwinprob",
        "guild_avg_mmr",
        "guild_avg_winstreak",
        "guild_avg_recentwinprob",
        "guild_avg_accumatches",
        "guild_avg_tier",
        "guild_median_mmr",
        "guild_median_winstreak",
        "guild_median_recentwinprob",
        "guild_median_accumatches",
        "guild_median_tier",
        "guild_mode_mmr",
        "guild_mode_winstreak",
        "guild_mode_recentwinprob",
        "guild_mode_accumatches",
        "guild_mode_tier",
        "guild_mean_mmr",
        "high_mmr_guild",
        "normalized_accumatches",
        "team_max_accumatches",
        "team_min_accumatches",
        "accumatches_diff",
        "accumatches_variance",
        "recent_performance_index",
        "mmr_diff",
        "mmr_variance",
        "recentwinprob_max",
        "recentwinprob_min",
        "recentwinprob_diff",
        "recentwinprob_mean",
        "recentwinprob_variance",
        "tier_numeric",
        "average_tier",
        "streak_rate",
        "tier_weight",
    ]
    .iter()
    .map(|name| name.to_string())
    .collect()
}

fn enriched_row_cells(row: &EnrichedRow) -> Vec<String> {
    let mut cells = vec![
        row.player.match_id.to_string(),
        row.player.team_id.to_string(),
        row.player.guild_id.clone().unwrap_or_default(),
        num(row.player.mmr),
        row.player.win_streak.to_string(),
        row.player.lose_streak.to_string(),
        num(row.player.recent_win_prob),
        row.player.accu_matches.to_string(),
        row.player.tier.clone(),
        num(row.team_avg_mmr),
        num(row.team_avg_winstreak),
        num(row.team_avg_losestreak),
        num(row.team_avg_recentwinprob),
    ];
    push_guild_stats(&mut cells, Some(&row.guild_avg));
    push_guild_stats(&mut cells, row.guild_median.as_ref());
    push_guild_stats(&mut cells, row.guild_mode.as_ref());
    cells.push(num(row.guild_mean_mmr));
    cells.push(if row.high_mmr_guild { "1" } else { "0" }.to_string());
    cells.push(num(row.normalized_accumatches));
    cells.push(row.team_max_accumatches.to_string());
    cells.push(row.team_min_accumatches.to_string());
    cells.push(row.accumatches_diff.to_string());
    cells.push(num(row.accumatches_variance));
    cells.push(num(row.recent_performance_index));
    cells.push(num(row.mmr_diff));
    cells.push(num(row.mmr_variance));
    cells.push(num(row.recentwinprob_max));
    cells.push(num(row.recentwinprob_min));
    cells.push(num(row.recentwinprob_diff));
    cells.push(num(row.recentwinprob_mean));
    cells.push(num(row.recentwinprob_variance));
    cells.push(row.tier_numeric.to_string());
    cells.push(num(row.average_tier));
    cells.push(num(row.streak_rate));
    cells.push(row.tier_weight.map(num).unwrap_or_default());
    cells
}

fn push_guild_stats(cells: &mut Vec<String>, stats: Option<&GuildStats>) {
    match stats {
        Some(stats) => {
            cells.push(num(stats.mmr));
            cells.push(num(stats.win_streak));
            cells.push(num(stats.recent_win_prob));
            cells.push(num(stats.accu_matches));
            cells.push(num(stats.tier));
        }
        None => {
            for _ in 0..5 {
                cells.push(String::new());
            }
        }
    }
}

// NaN formats as the literal "NaN", never an empty cell.
fn num(value: f64) -> String {
    format!("{value}")
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{enriched_row_cells, header_row};
    use crate::dataset::MatchPlayerRow;
    use crate::features::{FeatureBuilder, FeatureConfig};

    fn sample_rows() -> Vec<MatchPlayerRow> {
        vec![
            MatchPlayerRow {
                match_id: 1,
                team_id: 1,
                guild_id: Some("G1".to_string()),
                mmr: 1500.0,
                win_streak: 2,
                lose_streak: 0,
                recent_win_prob: 0.6,
                accu_matches: 100,
                tier: "gold".to_string(),
            },
            MatchPlayerRow {
                match_id: 1,
                team_id: 2,
                guild_id: None,
                mmr: 1400.0,
                win_streak: 0,
                lose_streak: 1,
                recent_win_prob: 0.4,
                accu_matches: 50,
                tier: "silver".to_string(),
            },
        ]
    }

    #[test]
    fn cell_rows_match_header_width() {
        let header = header_row();
        for config in [FeatureConfig::extended(), FeatureConfig::basic()] {
            let enriched = FeatureBuilder::new(config).enrich(&sample_rows());
            for row in &enriched {
                assert_eq!(enriched_row_cells(row).len(), header.len());
            }
        }
    }

    #[test]
    fn nan_cells_are_spelled_out() {
        // Singleton team groups make the sample variance undefined.
        let enriched = FeatureBuilder::default().enrich(&sample_rows());
        let cells = enriched_row_cells(&enriched[0]);
        let header = header_row();
        let variance_col = header
            .iter()
            .position(|h| h == "accumatches_variance")
            .expect("column present");
        assert_eq!(cells[variance_col], "NaN");
    }
}
