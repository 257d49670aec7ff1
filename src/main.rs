use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use arena_features::dataset;
use arena_features::export;
use arena_features::features::{FeatureBuilder, FeatureConfig, MmrSpreadGrouping};
use arena_features::store;

fn main() -> Result<()> {
    let db_path = parse_path_arg("--db")
        .or_else(|| std::env::var("ARENA_DB_PATH").ok().map(PathBuf::from));
    let rows = if let Some(db_path) = db_path {
        let conn = store::open_db(&db_path)?;
        store::load_match_rows(&conn)
            .with_context(|| format!("load rows from {}", db_path.display()))?
    } else {
        let data_dir = parse_path_arg("--data")
            .or_else(|| std::env::var("ARENA_DATA_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("data"));
        dataset::load_data_dir(&data_dir)
            .with_context(|| format!("load csv rows from {}", data_dir.display()))?
    };
    if rows.is_empty() {
        return Err(anyhow!("no match-player rows to enrich"));
    }

    let mut config = if has_flag("--basic") {
        FeatureConfig::basic()
    } else {
        FeatureConfig::extended()
    };
    if has_flag("--no-tier-weights") {
        config.tier_weights = false;
    }
    if has_flag("--mmr-spread-by-match") {
        config.mmr_spread_grouping = MmrSpreadGrouping::MatchTeam;
    }
    if let Some(threshold) = parse_f64_arg("--threshold") {
        config.high_mmr_threshold = threshold;
    }

    let builder = FeatureBuilder::new(config);
    let enriched = builder.enrich(&rows);

    let matches: HashSet<u64> = rows.iter().map(|row| row.match_id).collect();
    let teams: HashSet<(u64, u32)> = rows.iter().map(|row| (row.match_id, row.team_id)).collect();
    let guilds: HashSet<&str> = rows.iter().map(|row| row.guild_bucket()).collect();
    let high_mmr_rows = enriched.iter().filter(|row| row.high_mmr_guild).count();

    println!("Enrichment complete");
    println!("Rows: {}", enriched.len());
    println!("Matches: {}", matches.len());
    println!("Teams: {}", teams.len());
    println!("Guild buckets: {}", guilds.len());
    println!(
        "High-mmr guild rows: {high_mmr_rows} (threshold {})",
        config.high_mmr_threshold
    );

    if let Some(path) = parse_path_arg("--out-xlsx") {
        let report = export::export_enriched_xlsx(&path, &enriched)?;
        println!(
            "XLSX: {} ({} rows x {} columns)",
            path.display(),
            report.rows,
            report.columns
        );
    }
    if let Some(path) = parse_path_arg("--out-jsonl") {
        let written = export::export_enriched_jsonl(&path, &enriched)?;
        println!("JSONL: {} ({written} rows)", path.display());
    }

    Ok(())
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    parse_string_arg(name).map(PathBuf::from)
}

fn parse_f64_arg(name: &str) -> Option<f64> {
    parse_string_arg(name).and_then(|raw| raw.parse::<f64>().ok())
}

fn parse_string_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}
