//! `beeri backup` and `beeri verify-backup`
//!
//! A backup is one JSON document:
//!
//! ```json
//! {"created_at": "...", "manifest": {"events": 12, ...}, "tables": {"events": [...], ...}}
//! ```
//!
//! The manifest holds the row count of every table at export time.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use beeri_server::db::MaintenanceRepo;
use beeri_server::migrations::TABLES;
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Parser, Debug)]
pub struct BackupArgs {
    /// Output file (default: beeri-backup-<timestamp>.json)
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,

    /// Database URL (overrides config/environment)
    #[arg(long)]
    pub database_url: Option<String>,
}

#[derive(Parser, Debug)]
pub struct VerifyBackupArgs {
    /// Backup file written by `beeri backup`
    #[arg(long, short = 'f')]
    pub file: PathBuf,

    /// Database URL (overrides config/environment)
    #[arg(long)]
    pub database_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Backup {
    pub created_at: DateTime<Utc>,
    pub manifest: BTreeMap<String, i64>,
    pub tables: BTreeMap<String, Value>,
}

impl Backup {
    fn new(created_at: DateTime<Utc>, tables: BTreeMap<String, Value>) -> Self {
        let manifest = tables
            .iter()
            .map(|(table, rows)| (table.clone(), row_count(rows)))
            .collect();
        Self {
            created_at,
            manifest,
            tables,
        }
    }

    /// Tables whose exported rows disagree with the manifest.
    fn inconsistent_tables(&self) -> Vec<&str> {
        self.manifest
            .iter()
            .filter(|(table, count)| {
                self.tables.get(*table).map(row_count) != Some(**count)
            })
            .map(|(table, _)| table.as_str())
            .collect()
    }
}

fn row_count(rows: &Value) -> i64 {
    rows.as_array().map_or(0, |a| a.len() as i64)
}

#[derive(Debug, PartialEq, Eq)]
pub struct Mismatch {
    pub table: String,
    pub backup: Option<i64>,
    pub live: i64,
}

/// Every known table must be in the backup with the live row count.
fn compare(manifest: &BTreeMap<String, i64>, live: &BTreeMap<String, i64>) -> Vec<Mismatch> {
    live.iter()
        .filter_map(|(table, &count)| {
            let backup = manifest.get(table).copied();
            (backup != Some(count)).then(|| Mismatch {
                table: table.clone(),
                backup,
                live: count,
            })
        })
        .collect()
}

pub async fn run_backup(config_path: Option<&Path>, args: BackupArgs) -> Result<()> {
    let config = super::load_config(config_path, args.database_url)?;
    let pool = super::connect(&config).await?;
    let repo = MaintenanceRepo::new(&pool);

    let mut tables = BTreeMap::new();
    for table in TABLES {
        let rows = repo
            .export_table(table)
            .await
            .with_context(|| format!("Failed to export {table}"))?;
        tracing::debug!(table, rows = row_count(&rows), "exported");
        tables.insert(table.to_string(), rows);
    }

    let now = Utc::now();
    let backup = Backup::new(now, tables);
    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(format!("beeri-backup-{}.json", now.format("%Y%m%d-%H%M%S"))));

    let json = serde_json::to_vec_pretty(&backup).context("Failed to serialize backup")?;
    std::fs::write(&out, json).with_context(|| format!("Failed to write {}", out.display()))?;

    let total: i64 = backup.manifest.values().sum();
    println!(
        "Backed up {} rows from {} tables to {}",
        total,
        backup.manifest.len(),
        out.display()
    );
    Ok(())
}

pub async fn run_verify_backup(config_path: Option<&Path>, args: VerifyBackupArgs) -> Result<()> {
    let content = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let backup: Backup = serde_json::from_slice(&content)
        .with_context(|| format!("{} is not a beeri backup", args.file.display()))?;

    let broken = backup.inconsistent_tables();
    if !broken.is_empty() {
        bail!("Backup is internally inconsistent: {}", broken.join(", "));
    }

    let config = super::load_config(config_path, args.database_url)?;
    let pool = super::connect(&config).await?;
    let repo = MaintenanceRepo::new(&pool);

    let mut live = BTreeMap::new();
    for table in TABLES {
        let count = repo
            .count_rows(table)
            .await
            .with_context(|| format!("Failed to count {table}"))?;
        live.insert(table.to_string(), count);
    }

    let mismatches = compare(&backup.manifest, &live);
    if mismatches.is_empty() {
        println!(
            "Backup from {} matches the database ({} tables)",
            backup.created_at.to_rfc3339(),
            live.len()
        );
        return Ok(());
    }

    for m in &mismatches {
        match m.backup {
            Some(count) => println!("  {}: backup {} rows, database {} rows", m.table, count, m.live),
            None => println!("  {}: missing from backup, database {} rows", m.table, m.live),
        }
    }
    bail!("{} table(s) differ from the backup", mismatches.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn counts(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
        pairs.iter().map(|(t, c)| (t.to_string(), *c)).collect()
    }

    #[test]
    fn manifest_counts_exported_rows() {
        let mut tables = BTreeMap::new();
        tables.insert("events".to_string(), json!([{"id": 1}, {"id": 2}]));
        tables.insert("tags".to_string(), json!([]));
        let backup = Backup::new(Utc::now(), tables);

        assert_eq!(backup.manifest, counts(&[("events", 2), ("tags", 0)]));
        assert!(backup.inconsistent_tables().is_empty());
    }

    #[test]
    fn edited_rows_are_detected() {
        let mut tables = BTreeMap::new();
        tables.insert("events".to_string(), json!([{"id": 1}]));
        let mut backup = Backup::new(Utc::now(), tables);
        backup.manifest.insert("events".into(), 3);

        assert_eq!(backup.inconsistent_tables(), vec!["events"]);
    }

    #[test]
    fn compare_reports_count_and_missing_tables() {
        let manifest = counts(&[("events", 4), ("tasks", 10)]);
        let live = counts(&[("events", 4), ("tasks", 11), ("ideas", 2)]);

        let mismatches = compare(&manifest, &live);
        assert_eq!(
            mismatches,
            vec![
                Mismatch { table: "ideas".into(), backup: None, live: 2 },
                Mismatch { table: "tasks".into(), backup: Some(10), live: 11 },
            ]
        );
    }

    #[test]
    fn matching_counts_pass() {
        let manifest = counts(&[("events", 4)]);
        assert!(compare(&manifest, &manifest.clone()).is_empty());
    }
}
