use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_OUTPUT: &str = "downloads";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// Root under which one directory per podcast is created.
    pub output: PathBuf,
    pub timeout: Duration,
    /// Prefix file names with the episode's `YYYY-MM-DD` publication date.
    pub date_prefix: bool,
    pub aggregate: bool,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            output: PathBuf::from(DEFAULT_OUTPUT),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            date_prefix: false,
            aggregate: true,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}
