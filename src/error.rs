use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("reading response from {url} failed: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {source}", .path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error("feed has no channel title, is this a valid RSS feed?")]
    MissingTitle,
    #[error("writing journal failed: {0}")]
    Journal(#[from] csv::Error),
}

impl Error {
    pub fn network(url: &str, source: ureq::Error) -> Self {
        Error::Network {
            url: url.to_string(),
            source: Box::new(source),
        }
    }

    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// True for failures that happened on the wire rather than on disk.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network { .. } | Error::Body { .. })
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("malformed feed at byte {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },
}
