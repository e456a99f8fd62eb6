use crate::error::{Error, Result};
use crate::journal::LOG_FILE;
use crate::util::sanitize_filename;
use chrono::Local;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const MARKER: &str = "All_Transcripts";

pub fn aggregate_name(podcast_title: &str) -> String {
    format!("{}_{}.txt", sanitize_filename(podcast_title), MARKER)
}

fn transcript_files(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::fs(dir, e))? {
        let entry = entry.map_err(|e| Error::fs(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".txt") && !name.contains(MARKER) && name != LOG_FILE {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Concatenates every plain text transcript in `dir` into one file.
/// Returns `None` when there is nothing to aggregate.
pub fn aggregate(dir: &Path, podcast_title: &str) -> Result<Option<PathBuf>> {
    let names = transcript_files(dir)?;
    if names.is_empty() {
        return Ok(None);
    }

    let path = dir.join(aggregate_name(podcast_title));
    log::info!("Creating aggregated file: {}", path.display());
    let file = File::create(&path).map_err(|e| Error::fs(&path, e))?;
    let mut out = BufWriter::new(file);
    write_all(&mut out, dir, podcast_title, &names).map_err(|e| Error::fs(&path, e))?;
    Ok(Some(path))
}

fn write_all(out: &mut impl Write, dir: &Path, title: &str, names: &[String]) -> std::io::Result<()> {
    let rule = "=".repeat(80);
    writeln!(out, "AGGREGATED TRANSCRIPTS FOR: {}", title)?;
    writeln!(out, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    write!(out, "{}\n\n", rule)?;

    for name in names {
        let content = match fs::read_to_string(dir.join(name)) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Error reading {}: {}", name, e);
                continue;
            }
        };
        writeln!(out, "EPISODE: {}", name)?;
        writeln!(out, "{}", "-".repeat(80))?;
        out.write_all(content.as_bytes())?;
        write!(out, "\n\n{}\n\n", rule)?;
    }
    out.flush()
}
