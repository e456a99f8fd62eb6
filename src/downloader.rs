use crate::client::Fetcher;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

#[derive(Debug, PartialEq)]
pub enum Download {
    /// The target was already on disk; nothing was fetched.
    Skipped,
    Fetched(Vec<u8>),
}

pub struct Downloader<'a, F: Fetcher> {
    fetcher: &'a F,
}

impl<'a, F: Fetcher> Downloader<'a, F> {
    pub fn new(fetcher: &'a F) -> Self {
        Downloader { fetcher }
    }

    /// Fetches `url` into `path` unless `path` already exists.
    pub fn download(&self, path: &Path, url: &str) -> Result<Download> {
        if path.exists() {
            log::debug!("exists, skipping {}", path.display());
            return Ok(Download::Skipped);
        }
        let body = self.fetcher.fetch(url)?;
        write_file(path, &body)?;
        Ok(Download::Fetched(body))
    }
}

pub fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| Error::fs(dir, e))?;
    }
    fs::write(path, data).map_err(|e| Error::fs(path, e))
}
