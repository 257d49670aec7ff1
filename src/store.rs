use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, params};

use crate::dataset::{self, MatchPlayerRow};

#[derive(Debug, Clone)]
pub struct FileIngestSummary {
    pub file: PathBuf,
    pub rows_inserted: usize,
}

#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub db_path: PathBuf,
    pub files_total: usize,
    pub files_succeeded: usize,
    pub rows_inserted: usize,
    pub per_file: Vec<FileIngestSummary>,
    pub errors: Vec<String>,
}

pub fn default_db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("match_players.sqlite")
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS match_players (
            row_id INTEGER PRIMARY KEY AUTOINCREMENT,
            matchid INTEGER NOT NULL,
            teamid INTEGER NOT NULL,
            guildid TEXT NULL,
            mmr REAL NOT NULL,
            winstreak INTEGER NOT NULL,
            losestreak INTEGER NOT NULL,
            recentwinprob REAL NOT NULL,
            accumatches INTEGER NOT NULL,
            tier TEXT NOT NULL,
            source_file TEXT NOT NULL,
            ingested_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_match_players_match ON match_players(matchid);
        CREATE INDEX IF NOT EXISTS idx_match_players_guild ON match_players(guildid);
        CREATE INDEX IF NOT EXISTS idx_match_players_source ON match_players(source_file);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Raw rows carry no natural primary key (no player id), so re-ingesting a
/// file replaces its rows wholesale instead of upserting.
pub fn replace_file_rows(
    conn: &mut Connection,
    source_file: &str,
    rows: &[MatchPlayerRow],
) -> Result<usize> {
    let ingested_at = Utc::now().to_rfc3339();
    let tx = conn.transaction().context("begin ingest transaction")?;
    tx.execute(
        "DELETE FROM match_players WHERE source_file = ?1",
        params![source_file],
    )
    .context("clear previous file rows")?;
    {
        let mut stmt = tx
            .prepare(
                r#"
                INSERT INTO match_players (
                    matchid, teamid, guildid, mmr, winstreak, losestreak,
                    recentwinprob, accumatches, tier, source_file, ingested_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )
            .context("prepare insert")?;
        for row in rows {
            stmt.execute(params![
                row.match_id as i64,
                row.team_id as i64,
                row.guild_id,
                row.mmr,
                row.win_streak as i64,
                row.lose_streak as i64,
                row.recent_win_prob,
                row.accu_matches as i64,
                row.tier,
                source_file,
                ingested_at,
            ])
            .context("insert match player row")?;
        }
    }
    tx.commit().context("commit ingest transaction")?;
    Ok(rows.len())
}

/// Loads every stored row in insertion order.
pub fn load_match_rows(conn: &Connection) -> Result<Vec<MatchPlayerRow>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT matchid, teamid, guildid, mmr, winstreak, losestreak,
                   recentwinprob, accumatches, tier
            FROM match_players
            ORDER BY row_id ASC
            "#,
        )
        .context("prepare load rows query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(MatchPlayerRow {
                match_id: row.get::<_, u64>(0)?,
                team_id: row.get::<_, u32>(1)?,
                guild_id: row.get(2)?,
                mmr: row.get(3)?,
                win_streak: row.get::<_, u32>(4)?,
                lose_streak: row.get::<_, u32>(5)?,
                recent_win_prob: row.get(6)?,
                accu_matches: row.get::<_, u32>(7)?,
                tier: row.get(8)?,
            })
        })
        .context("query match player rows")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode match player row")?);
    }
    Ok(out)
}

/// Ingests every csv file of a data directory. A file that fails to parse is
/// recorded and skipped; the rest of the directory still loads.
pub fn ingest_data_dir(
    conn: &mut Connection,
    db_path: PathBuf,
    data_dir: &Path,
) -> Result<IngestSummary> {
    let files = dataset::scan_data_dir(data_dir)?;
    if files.is_empty() {
        return Err(anyhow!("no csv files found in {}", data_dir.display()));
    }

    let mut per_file = Vec::new();
    let mut errors = Vec::new();
    let mut rows_inserted = 0usize;

    for path in &files {
        let source_file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match dataset::load_csv_file(path) {
            Ok(rows) => {
                let inserted = replace_file_rows(conn, &source_file, &rows)?;
                rows_inserted += inserted;
                per_file.push(FileIngestSummary {
                    file: path.clone(),
                    rows_inserted: inserted,
                });
            }
            Err(err) => {
                // Dataset errors already carry the file label.
                errors.push(err.to_string());
            }
        }
    }

    Ok(IngestSummary {
        db_path,
        files_total: files.len(),
        files_succeeded: per_file.len(),
        rows_inserted,
        per_file,
        errors,
    })
}
