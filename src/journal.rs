use crate::error::{Error, Result};
use crate::pipeline::Outcome;
use chrono::Local;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

pub const LOG_FILE: &str = "download_log.txt";
pub const SKIPPED_FILE: &str = "skipped_episodes.csv";

#[derive(Debug, Serialize)]
struct SkippedRow<'a> {
    #[serde(rename = "Episode Title")]
    title: &'a str,
    #[serde(rename = "Reason")]
    reason: &'a str,
    #[serde(rename = "Date")]
    date: &'a str,
    #[serde(rename = "Details")]
    details: &'a str,
}

/// Append-only run log and skipped-episode table of one podcast directory.
pub struct Journal {
    log: File,
    skipped: csv::Writer<File>,
}

impl Journal {
    pub fn open(dir: &Path) -> Result<Self> {
        let log_path = dir.join(LOG_FILE);
        let mut log = append(&log_path)?;
        writeln!(log, "--- Run started at {} ---", Local::now().format("%Y-%m-%d %H:%M:%S"))
            .map_err(|e| Error::fs(&log_path, e))?;

        let csv_path = dir.join(SKIPPED_FILE);
        let fresh = !csv_path.exists();
        let mut skipped = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(append(&csv_path)?);
        if fresh {
            skipped.write_record(&["Episode Title", "Reason", "Date", "Details"])?;
            skipped.flush().map_err(|e| Error::fs(&csv_path, e))?;
        }

        Ok(Journal { log, skipped })
    }

    pub fn record(&mut self, title: &str, date: &str, outcome: &Outcome) -> Result<()> {
        let line = match outcome {
            Outcome::Saved(file) => format!("SUCCESS: {} -> {}", title, file),
            Outcome::Converted(file) => format!("SUCCESS: {} -> {} (from HTML)", title, file),
            Outcome::Exists => format!("SKIP [Exists]: {}", title),
            Outcome::NoTranscript => format!("SKIP [No Tag]: {}", title),
            Outcome::Failed(err) => format!("ERROR: {} - {}", title, err),
        };
        writeln!(self.log, "{}", line).map_err(|e| Error::fs(LOG_FILE, e))?;

        let row = match outcome {
            Outcome::NoTranscript => Some(("No Tag", "No podcast:transcript tag found")),
            Outcome::Failed(err) => Some(("Download Error", err.as_str())),
            _ => None,
        };
        if let Some((reason, details)) = row {
            self.skipped.serialize(SkippedRow {
                title,
                reason,
                date,
                details,
            })?;
            self.skipped.flush().map_err(|e| Error::fs(SKIPPED_FILE, e))?;
        }
        Ok(())
    }
}

fn append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::fs(path, e))
}
