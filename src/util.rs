use flexi_logger::{FlexiLoggerError, Logger, LoggerHandle};
use simple_error::SimpleError;
use std::error::Error;

/// Logs to stdout; `RUST_LOG` overrides `spec`.
pub fn init_log(spec: &str) -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_env_or_str(spec)?.log_to_stdout().start()
}

pub fn to_simple<E: Error>(e: E) -> SimpleError {
    SimpleError::new(e.to_string())
}

/// Drops characters that are illegal in file names on common filesystems.
pub fn sanitize_filename(name: &str) -> String {
    const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
    let cleaned: String = name
        .chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c) && !c.is_control())
        .collect();
    let cleaned = cleaned.trim().trim_end_matches('.').trim_end();
    match cleaned {
        "" => "untitled".to_string(),
        s => s.to_string(),
    }
}
