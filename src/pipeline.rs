use crate::aggregate::{aggregate, MARKER};
use crate::client::Fetcher;
use crate::config::Config;
use crate::converter::html_to_text;
use crate::downloader::{write_file, Download, Downloader};
use crate::entity::{date_key, parse_date, Episode, TranscriptFormat};
use crate::error::{Error, Result};
use crate::journal::{Journal, LOG_FILE};
use crate::parser::Feed;
use crate::util::sanitize_filename;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// What happened to one feed item.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Saved(String),
    /// HTML fetched and converted; holds the `.txt` file name.
    Converted(String),
    Exists,
    NoTranscript,
    Failed(String),
}

#[derive(Debug, Default, PartialEq)]
pub struct Summary {
    pub output_dir: PathBuf,
    pub saved: usize,
    pub skipped: usize,
    pub failed: usize,
    /// The feed broke off mid-document; items after the break were not seen.
    pub truncated: bool,
    pub aggregate: Option<PathBuf>,
}

impl Summary {
    fn count(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Saved(_) | Outcome::Converted(_) => self.saved += 1,
            Outcome::Exists | Outcome::NoTranscript => self.skipped += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }
}

struct Harvester<'a, F: Fetcher> {
    downloader: Downloader<'a, F>,
    dir: &'a Path,
    date_prefix: bool,
    /// Lowercased stems handed out so far in this run.
    claimed: HashSet<String>,
}

/// Keeps episode files clear of the journal and aggregate names.
fn unreserved(stem: String) -> String {
    if stem.contains(MARKER) {
        return stem.replace(MARKER, "All Transcripts");
    }
    if LOG_FILE.eq_ignore_ascii_case(&format!("{}.txt", stem)) {
        return format!("{}_episode", stem);
    }
    stem
}

impl<'a, F: Fetcher> Harvester<'a, F> {
    /// Feed order decides which of several same-titled episodes gets the
    /// bare name, so reruns map every episode to the same file again.
    fn file_stem(&mut self, ep: &Episode) -> String {
        let title = sanitize_filename(&ep.title);
        let base = unreserved(if self.date_prefix {
            format!("{}_{}", ep.date_key(), title)
        } else {
            title
        });

        let mut stem = base.clone();
        let mut n = 1;
        while !self.claimed.insert(stem.to_lowercase()) {
            n += 1;
            stem = format!("{} ({})", base, n);
        }
        if n > 1 {
            warn!(
                "{} shares its file name with an earlier episode, saving as {}",
                ep.title, stem
            );
        }
        stem
    }

    fn save(&mut self, ep: &Episode) -> Result<Outcome> {
        let stem = self.file_stem(ep);
        let name = format!("{}.{}", stem, ep.format.extension());
        let path = self.dir.join(&name);

        if ep.format != TranscriptFormat::Html {
            return Ok(match self.downloader.download(&path, &ep.url)? {
                Download::Skipped => Outcome::Exists,
                Download::Fetched(_) => Outcome::Saved(name),
            });
        }

        // html counts as done once its text rendering exists
        let txt_name = format!("{}.txt", stem);
        let txt_path = self.dir.join(&txt_name);
        if txt_path.exists() {
            debug!("exists, skipping {}", txt_path.display());
            return Ok(Outcome::Exists);
        }
        let html = match self.downloader.download(&path, &ep.url)? {
            Download::Fetched(body) => body,
            Download::Skipped => fs::read(&path).map_err(|e| Error::fs(&path, e))?,
        };
        write_file(&txt_path, html_to_text(&html).as_bytes())?;
        Ok(Outcome::Converted(txt_name))
    }
}

/// Fetches `feed_url` and downloads every transcript it links into
/// `<output>/<podcast title>/`. Only a feed that cannot be fetched, or
/// whose channel header cannot be read, is an error. A document that breaks
/// off later stops the loop and sets `truncated`; per-episode failures end
/// up in the summary.
pub fn run<F: Fetcher>(fetcher: &F, feed_url: &str, config: &Config) -> Result<Summary> {
    info!("Parsing feed: {}", feed_url);
    let body = fetcher.fetch(feed_url)?;
    let (podcast, items) = Feed::parse(body.as_slice())?.into_parts();

    let dir = config.output.join(sanitize_filename(&podcast.title));
    fs::create_dir_all(&dir).map_err(|e| Error::fs(&dir, e))?;
    info!("Podcast Title: {}", podcast.title);
    info!("Saving to: {}", dir.display());

    let mut journal = Journal::open(&dir)?;
    let mut harvester = Harvester {
        downloader: Downloader::new(fetcher),
        dir: &dir,
        date_prefix: config.date_prefix,
        claimed: HashSet::new(),
    };
    let mut summary = Summary {
        output_dir: dir.clone(),
        ..Default::default()
    };

    for item in items {
        let item = match item {
            Ok(item) => item,
            Err(e) => {
                warn!("Malformed feed data detected, no further episodes read: {}", e);
                summary.truncated = true;
                break;
            }
        };
        let title = item.display_title();
        let outcome = match Episode::from_item(&item) {
            None => {
                debug!("No transcript found for: {}", title);
                Outcome::NoTranscript
            }
            Some(ep) => {
                info!("Downloading transcript for: {}", title);
                harvester.save(&ep).unwrap_or_else(|e| {
                    warn!("Failed to download {}: {}", title, e);
                    Outcome::Failed(e.to_string())
                })
            }
        };
        match &outcome {
            Outcome::Saved(file) | Outcome::Converted(file) => info!("  saved {}", file),
            Outcome::Exists => debug!("Exists: {}", title),
            _ => {}
        }
        summary.count(&outcome);

        let date = date_key(item.pub_date.as_deref().and_then(parse_date).as_ref());
        if let Err(e) = journal.record(&title, &date, &outcome) {
            warn!("journal: {}", e);
        }
    }

    info!(
        "Done. Success: {}, Skipped: {}, Failed: {}",
        summary.saved, summary.skipped, summary.failed
    );

    if config.aggregate {
        summary.aggregate = aggregate(&dir, &podcast.title).unwrap_or_else(|e| {
            warn!("aggregation failed: {}", e);
            None
        });
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::MemFetcher;
    use crate::journal::{LOG_FILE, SKIPPED_FILE};
    use crate::parser::tests::FEED;
    use tempfile::TempDir;

    const FEED_URL: &str = "https://example.com/feed.xml";

    fn config(dir: &TempDir) -> Config {
        Config {
            output: dir.path().to_path_buf(),
            ..Default::default()
        }
    }

    fn fetcher() -> MemFetcher {
        MemFetcher::default()
            .with(FEED_URL, FEED)
            .with("https://example.com/1.html", "<html><body><p>Hello <i>there</i></p></body></html>")
            .with("https://example.com/2.srt", "1\n00:00:00,000 --> 00:00:01,000\nHi\n")
            .with("https://example.com/4.json", "{\"segments\":[]}")
    }

    fn files(dir: &Path) -> Vec<String> {
        let mut names = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect::<Vec<String>>();
        names.sort();
        names
    }

    #[test]
    fn downloads_and_converts() {
        let out = TempDir::new().expect("tempdir");
        let f = fetcher();
        let summary = run(&f, FEED_URL, &config(&out)).expect("run");

        let show = out.path().join("Tech & Talk");
        assert_eq!(summary.output_dir, show);
        assert_eq!((summary.saved, summary.skipped, summary.failed), (3, 1, 0));
        assert_eq!(
            files(&show),
            vec![
                "Episode_3.json",
                "First Hello.html",
                "First Hello.txt",
                "Second Episode.srt",
                "Tech & Talk_All_Transcripts.txt",
                LOG_FILE,
                SKIPPED_FILE,
            ]
        );
        assert_eq!(fs::read_to_string(show.join("First Hello.txt")).unwrap(), "Hello there");
        assert!(fs::read_to_string(show.join("Second Episode.srt")).unwrap().contains("Hi"));
        assert_eq!(summary.aggregate, Some(show.join("Tech & Talk_All_Transcripts.txt")));
    }

    #[test]
    fn rerun_fetches_only_the_feed() {
        let out = TempDir::new().expect("tempdir");
        let f = fetcher();
        run(&f, FEED_URL, &config(&out)).expect("first run");
        assert_eq!(f.count(), 4);

        let second = run(&f, FEED_URL, &config(&out)).expect("second run");
        assert_eq!(f.count(), 5);
        assert_eq!(f.requests.borrow().last().map(String::as_str), Some(FEED_URL));
        assert_eq!((second.saved, second.skipped, second.failed), (0, 4, 0));
    }

    #[test]
    fn failed_episode_does_not_stop_the_run() {
        let out = TempDir::new().expect("tempdir");
        let f = MemFetcher::default()
            .with(FEED_URL, FEED)
            .with("https://example.com/4.json", "{}");
        let summary = run(&f, FEED_URL, &config(&out)).expect("run");
        assert_eq!((summary.saved, summary.skipped, summary.failed), (1, 1, 2));

        let show = out.path().join("Tech & Talk");
        assert!(show.join("Episode_3.json").exists());
        assert!(!show.join("First Hello.txt").exists());
        let csv = fs::read_to_string(show.join(SKIPPED_FILE)).unwrap();
        assert_eq!(csv.matches("Download Error").count(), 2);
    }

    #[test]
    fn no_transcripts_writes_no_transcripts() {
        let out = TempDir::new().expect("tempdir");
        let xml = "<rss><channel><title>Quiet</title><item><title>a</title></item></channel></rss>";
        let f = MemFetcher::default().with(FEED_URL, xml);
        let summary = run(&f, FEED_URL, &config(&out)).expect("run");

        assert_eq!((summary.saved, summary.skipped, summary.failed), (0, 1, 0));
        assert_eq!(summary.aggregate, None);
        assert_eq!(files(&out.path().join("Quiet")), vec![LOG_FILE, SKIPPED_FILE]);
        assert_eq!(f.count(), 1);
    }

    #[test]
    fn date_prefix() {
        let out = TempDir::new().expect("tempdir");
        let cfg = Config {
            date_prefix: true,
            aggregate: false,
            ..config(&out)
        };
        run(&fetcher(), FEED_URL, &cfg).expect("run");
        let show = out.path().join("Tech & Talk");
        assert!(show.join("2024-01-01_First Hello.txt").exists());
        assert!(show.join("0000-00-00_Second Episode.srt").exists());
        assert!(!show.join("Tech & Talk_All_Transcripts.txt").exists());
    }

    #[test]
    fn html_left_from_earlier_run_is_converted_offline() {
        let out = TempDir::new().expect("tempdir");
        let show = out.path().join("Tech & Talk");
        fs::create_dir_all(&show).unwrap();
        fs::write(show.join("First Hello.html"), "<p>cached</p>").unwrap();

        let f = MemFetcher::default().with(FEED_URL, FEED);
        run(&f, FEED_URL, &config(&out)).expect("run");
        assert_eq!(fs::read_to_string(show.join("First Hello.txt")).unwrap(), "cached");
        assert!(!f.requests.borrow().iter().any(|u| u.ends_with("1.html")));
    }

    #[test]
    fn unreachable_feed_is_fatal() {
        let out = TempDir::new().expect("tempdir");
        let err = run(&MemFetcher::default(), FEED_URL, &config(&out)).unwrap_err();
        assert!(err.is_network());
        assert!(fs::read_dir(out.path()).unwrap().next().is_none());
    }

    #[test]
    fn not_a_feed_is_fatal() {
        let out = TempDir::new().expect("tempdir");
        let f = MemFetcher::default().with(FEED_URL, "<html><body>moved</body></html>");
        assert!(matches!(run(&f, FEED_URL, &config(&out)), Err(Error::MissingTitle)));
    }

    #[test]
    fn raw_html_in_description_is_tolerated() {
        let out = TempDir::new().expect("tempdir");
        let xml = "<rss><channel><title>Loose</title>\
            <item><title>One</title><description>Hi<br>there</description>\
            <podcast:transcript url=\"https://example.com/1.vtt\" type=\"text/vtt\"/></item>\
            </channel></rss>";
        let f = MemFetcher::default()
            .with(FEED_URL, xml)
            .with("https://example.com/1.vtt", "WEBVTT\n");
        let summary = run(&f, FEED_URL, &config(&out)).expect("run");

        assert_eq!((summary.saved, summary.skipped, summary.failed), (1, 0, 0));
        assert!(!summary.truncated);
        assert!(out.path().join("Loose").join("One.vtt").exists());
    }

    #[test]
    fn feed_breaking_off_keeps_earlier_episodes() {
        let out = TempDir::new().expect("tempdir");
        let xml = "<rss><channel><title>Cut</title>\
            <item><title>One</title>\
            <podcast:transcript url=\"https://example.com/1.txt\" type=\"text/plain\"/></item>\
            <item><title>Two</title><!-- cut here";
        let f = MemFetcher::default()
            .with(FEED_URL, xml)
            .with("https://example.com/1.txt", "hello");
        let summary = run(&f, FEED_URL, &config(&out)).expect("run");

        assert!(summary.truncated);
        assert_eq!(summary.saved, 1);
        assert_eq!(summary.aggregate, Some(out.path().join("Cut").join("Cut_All_Transcripts.txt")));
    }

    #[test]
    fn same_title_gets_numbered_name() {
        let out = TempDir::new().expect("tempdir");
        let xml = "<rss><channel><title>Dup</title>\
            <item><title>Q&amp;A</title><podcast:transcript url=\"https://example.com/a.vtt\" type=\"text/vtt\"/></item>\
            <item><title>q&amp;a</title><podcast:transcript url=\"https://example.com/b.vtt\" type=\"text/vtt\"/></item>\
            </channel></rss>";
        let f = MemFetcher::default()
            .with(FEED_URL, xml)
            .with("https://example.com/a.vtt", "A")
            .with("https://example.com/b.vtt", "B");

        let first = run(&f, FEED_URL, &config(&out)).expect("first run");
        assert_eq!((first.saved, first.skipped), (2, 0));
        assert_eq!(f.count(), 3);
        let show = out.path().join("Dup");
        assert_eq!(fs::read_to_string(show.join("Q&A.vtt")).unwrap(), "A");
        assert_eq!(fs::read_to_string(show.join("q&a (2).vtt")).unwrap(), "B");

        let second = run(&f, FEED_URL, &config(&out)).expect("second run");
        assert_eq!((second.saved, second.skipped), (0, 2));
        assert_eq!(f.count(), 4);
    }

    #[test]
    fn journal_names_are_not_episode_names() {
        let out = TempDir::new().expect("tempdir");
        let xml = "<rss><channel><title>Meta</title>\
            <item><title>download_log</title><podcast:transcript url=\"https://example.com/1.txt\"/></item>\
            <item><title>Meta_All_Transcripts</title><podcast:transcript url=\"https://example.com/2.txt\"/></item>\
            </channel></rss>";
        let f = MemFetcher::default()
            .with(FEED_URL, xml)
            .with("https://example.com/1.txt", "one")
            .with("https://example.com/2.txt", "two");
        let summary = run(&f, FEED_URL, &config(&out)).expect("run");

        assert_eq!((summary.saved, summary.skipped), (2, 0));
        let show = out.path().join("Meta");
        assert_eq!(fs::read_to_string(show.join("download_log_episode.txt")).unwrap(), "one");
        assert_eq!(fs::read_to_string(show.join("Meta_All Transcripts.txt")).unwrap(), "two");
        let combined = fs::read_to_string(show.join("Meta_All_Transcripts.txt")).unwrap();
        assert!(combined.contains("EPISODE: download_log_episode.txt"));
        assert!(combined.contains("EPISODE: Meta_All Transcripts.txt"));
    }
}
