use std::path::PathBuf;

use anyhow::{Context, Result};

use arena_features::store;

fn main() -> Result<()> {
    let data_dir = parse_path_arg("--data")
        .or_else(|| std::env::var("ARENA_DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("data"));
    let db_path = parse_path_arg("--db")
        .or_else(|| std::env::var("ARENA_DB_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| store::default_db_path(&data_dir));

    let mut conn = store::open_db(&db_path)?;
    let summary = store::ingest_data_dir(&mut conn, db_path.clone(), &data_dir)
        .with_context(|| format!("ingest {}", data_dir.display()))?;

    println!("Match-player ingest complete");
    println!("DB: {}", summary.db_path.display());
    println!(
        "Files: {}/{}",
        summary.files_succeeded, summary.files_total
    );
    println!("Rows inserted: {}", summary.rows_inserted);
    for file in &summary.per_file {
        println!(
            "  {}: {} rows",
            file.file.display(),
            file.rows_inserted
        );
    }
    if !summary.errors.is_empty() {
        println!("Errors: {}", summary.errors.len());
        for err in summary.errors.iter().take(6) {
            println!("  - {err}");
        }
    }

    Ok(())
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next.trim()));
            }
        }
    }
    None
}
