use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shared bucket for rows carrying no guild id. Every guildless row lands in
/// this one bucket, never in a bucket of its own.
pub const NO_GUILD_BUCKET: &str = "NoGuild";

pub const REQUIRED_COLUMNS: [&str; 9] = [
    "matchid",
    "teamid",
    "guildid",
    "mmr",
    "winstreak",
    "losestreak",
    "recentwinprob",
    "accumatches",
    "tier",
];

/// One row per player per match, exactly as it arrives from the raw feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPlayerRow {
    #[serde(rename = "matchid")]
    pub match_id: u64,
    #[serde(rename = "teamid")]
    pub team_id: u32,
    #[serde(rename = "guildid")]
    pub guild_id: Option<String>,
    pub mmr: f64,
    #[serde(rename = "winstreak")]
    pub win_streak: u32,
    #[serde(rename = "losestreak")]
    pub lose_streak: u32,
    #[serde(rename = "recentwinprob")]
    pub recent_win_prob: f64,
    #[serde(rename = "accumatches")]
    pub accu_matches: u32,
    pub tier: String,
}

impl MatchPlayerRow {
    pub fn guild_bucket(&self) -> &str {
        self.guild_id
            .as_deref()
            .filter(|g| !g.is_empty())
            .unwrap_or(NO_GUILD_BUCKET)
    }
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("{}: missing required columns: {}", .label, .columns.join(", "))]
    MissingColumns { label: String, columns: Vec<String> },
    #[error("{label}: line {line}: {source}")]
    BadRow {
        label: String,
        line: u64,
        source: csv::Error,
    },
    #[error("{label}: {source}")]
    Header { label: String, source: csv::Error },
}

/// Enumerates the raw csv files of a data directory, sorted by name so ingest
/// order is stable.
pub fn scan_data_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("read data dir {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read data dir entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Decodes match-player rows from csv. The header is validated up front: any
/// absent required column aborts the whole load with no partial rows.
pub fn parse_match_rows<R: Read>(reader: R, label: &str) -> Result<Vec<MatchPlayerRow>, DatasetError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|source| DatasetError::Header {
            label: label.to_string(),
            source,
        })?
        .clone();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DatasetError::MissingColumns {
            label: label.to_string(),
            columns: missing,
        });
    }

    let mut rows = Vec::new();
    for (idx, record) in rdr.deserialize::<MatchPlayerRow>().enumerate() {
        match record {
            Ok(row) => rows.push(row),
            Err(source) => {
                // Header is line 1, so the first data record is line 2.
                return Err(DatasetError::BadRow {
                    label: label.to_string(),
                    line: idx as u64 + 2,
                    source,
                });
            }
        }
    }
    Ok(rows)
}

pub fn load_csv_file(path: &Path) -> Result<Vec<MatchPlayerRow>> {
    let label = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rows = parse_match_rows(file, &label)?;
    Ok(rows)
}

/// Loads every csv file of a data directory into one row table, in file-name
/// order, preserving each file's row order.
pub fn load_data_dir(dir: &Path) -> Result<Vec<MatchPlayerRow>> {
    let files = scan_data_dir(dir)?;
    let mut rows = Vec::new();
    for path in &files {
        rows.extend(load_csv_file(path)?);
    }
    Ok(rows)
}
