use std::path::PathBuf;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;

use arena_features::sample_data::{self, SampleSpec};

fn main() -> Result<()> {
    let out_path =
        parse_path_arg("--out").unwrap_or_else(|| PathBuf::from("data/sample_matches.csv"));
    let seed = parse_u64_arg("--seed").unwrap_or(1);

    let mut spec = SampleSpec::default();
    if let Some(matches) = parse_u32_arg("--matches") {
        spec.matches = matches.max(1);
    }
    if let Some(players) = parse_u32_arg("--players-per-team") {
        spec.players_per_team = players.max(1);
    }
    if let Some(guilds) = parse_u32_arg("--guilds") {
        spec.guilds = guilds.max(1);
    }

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let rows = sample_data::generate_rows(&mut rng, &spec);
    sample_data::write_sample_csv(&out_path, &rows)?;

    println!("Sample dataset written");
    println!("File: {}", out_path.display());
    println!(
        "Rows: {} ({} matches x {} teams x {} players)",
        rows.len(),
        spec.matches,
        spec.teams_per_match,
        spec.players_per_team
    );
    println!("Seed: {seed}");

    Ok(())
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    parse_string_arg(name).map(PathBuf::from)
}

fn parse_u64_arg(name: &str) -> Option<u64> {
    parse_string_arg(name).and_then(|raw| raw.parse::<u64>().ok())
}

fn parse_u32_arg(name: &str) -> Option<u32> {
    parse_string_arg(name).and_then(|raw| raw.parse::<u32>().ok())
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
