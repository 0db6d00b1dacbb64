//! `beeri seed` - load events exported from a calendar or spreadsheet
//!
//! Accepts `.csv` (header row) or `.json` (array of objects) with the columns
//! `title, start, end, location, description, event_type`. Times may carry
//! an offset; without one they are read as Israel wall-clock time. Every row
//! is checked before anything is written.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use beeri_core::clock::israel_to_utc;
use beeri_core::token::generate_share_token;
use beeri_server::db::EventRepo;
use beeri_server::models::event::CreateEvent;
use beeri_server::models::Validate;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::Parser;
use serde::Deserialize;

#[derive(Parser, Debug)]
pub struct SeedArgs {
    /// Events file (.csv or .json)
    #[arg(long, short = 'f')]
    pub file: PathBuf,

    /// Check the file and report, write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Database URL (overrides config/environment)
    #[arg(long)]
    pub database_url: Option<String>,
}

/// One row as it comes out of the export
#[derive(Debug, Deserialize)]
struct SeedEvent {
    title: String,
    start: String,
    end: Option<String>,
    location: Option<String>,
    description: Option<String>,
    event_type: Option<String>,
}

const LOCAL_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// RFC 3339, Israel-local date-time, or a bare date (09:00 local).
fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    let local = LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(9, 0, 0))
        })?;
    israel_to_utc(local)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl SeedEvent {
    fn into_event(self) -> Result<CreateEvent, String> {
        let start_datetime =
            parse_time(&self.start).ok_or_else(|| format!("unreadable start '{}'", self.start))?;
        let end_datetime = match non_blank(self.end) {
            Some(end) => Some(parse_time(&end).ok_or_else(|| format!("unreadable end '{end}'"))?),
            None => None,
        };

        let event = CreateEvent {
            title: self.title.trim().to_string(),
            description: non_blank(self.description),
            start_datetime,
            end_datetime,
            location: non_blank(self.location),
            event_type: non_blank(self.event_type).unwrap_or_else(|| "general".to_string()),
            status: Default::default(),
            visibility: Default::default(),
            committee_id: None,
            budget_allocated: None,
            max_attendees: None,
            registration_enabled: None,
        };
        event.validate().map_err(|e| e.to_string())?;
        Ok(event)
    }
}

fn read_rows(path: &Path) -> Result<Vec<SeedEvent>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("csv") => {
            let mut reader = csv::Reader::from_path(path)
                .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
            reader
                .deserialize::<SeedEvent>()
                .enumerate()
                .map(|(idx, row)| row.with_context(|| format!("Failed to read row {}", idx + 1)))
                .collect()
        }
        Some("json") => {
            let content = std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_slice(&content)
                .with_context(|| format!("{} is not a JSON array of events", path.display()))
        }
        _ => bail!("Unsupported seed file {} (expected .csv or .json)", path.display()),
    }
}

/// All rows as events, or every problem found with its row number.
fn load_events(path: &Path) -> Result<Vec<CreateEvent>> {
    let mut events = Vec::new();
    let mut problems = Vec::new();
    for (idx, row) in read_rows(path)?.into_iter().enumerate() {
        match row.into_event() {
            Ok(event) => events.push(event),
            Err(reason) => problems.push(format!("row {}: {reason}", idx + 1)),
        }
    }

    if !problems.is_empty() {
        for problem in &problems {
            eprintln!("  {problem}");
        }
        bail!("{} invalid row(s) in {}, nothing written", problems.len(), path.display());
    }
    Ok(events)
}

pub async fn run_seed(config_path: Option<&Path>, args: SeedArgs) -> Result<()> {
    let events = load_events(&args.file)?;

    if args.dry_run {
        println!("{} event(s) ready to import from {}", events.len(), args.file.display());
        return Ok(());
    }

    let config = super::load_config(config_path, args.database_url)?;
    let pool = super::connect(&config).await?;
    let repo = EventRepo::new(&pool);

    for event in &events {
        let row = repo
            .create(event, &generate_share_token())
            .await
            .with_context(|| format!("Failed to insert '{}'", event.title))?;
        tracing::debug!(event_id = %row.id, title = %row.title, "seeded event");
    }

    println!("Imported {} event(s) from {}", events.len(), args.file.display());
    Ok(())
}
