use clap::Parser;
use podcast_transcripts::{config, util, Client, Config};
use simple_error::SimpleResult;
use std::path::PathBuf;
use std::time::Duration;

/// Download podcast transcripts from an RSS feed.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// RSS feed URL
    url: String,

    /// Output directory
    #[arg(long, env = "TRANSCRIPTS_OUTPUT", default_value = config::DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Request timeout in seconds
    #[arg(long, env = "TRANSCRIPTS_TIMEOUT", default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Prefix file names with the publication date
    #[arg(long, env = "TRANSCRIPTS_DATE_PREFIX")]
    date_prefix: bool,

    /// Skip writing the combined transcript file
    #[arg(long, env = "TRANSCRIPTS_NO_AGGREGATE")]
    no_aggregate: bool,

    /// Log spec, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> SimpleResult<()> {
    let args = Args::parse();
    let _log = util::init_log(&args.log_level).map_err(util::to_simple)?;

    let config = Config {
        output: args.output,
        timeout: Duration::from_secs(args.timeout),
        date_prefix: args.date_prefix,
        aggregate: !args.no_aggregate,
        ..Default::default()
    };
    log::debug!("{:?}", config);

    let client = Client::new(config.timeout, &config.user_agent);
    podcast_transcripts::run(&client, &args.url, &config).map_err(|e| {
        log::error!("Error fetching feed: {}", e);
        util::to_simple(e)
    })?;
    Ok(())
}
