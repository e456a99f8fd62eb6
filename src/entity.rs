use crate::model::Item;
use chrono::{DateTime, FixedOffset};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptFormat {
    Html,
    Vtt,
    Srt,
    Json,
    Other,
}

impl TranscriptFormat {
    pub fn from_mime(mime: Option<&str>) -> Self {
        let essence = mime
            .and_then(|m| m.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase())
            .unwrap_or_default();
        match essence.as_str() {
            "text/html" => TranscriptFormat::Html,
            "text/vtt" => TranscriptFormat::Vtt,
            "application/srt" | "application/x-subrip" => TranscriptFormat::Srt,
            "application/json" => TranscriptFormat::Json,
            _ => TranscriptFormat::Other,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            TranscriptFormat::Html => "html",
            TranscriptFormat::Vtt => "vtt",
            TranscriptFormat::Srt => "srt",
            TranscriptFormat::Json => "json",
            TranscriptFormat::Other => "txt",
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Episode {
    pub title: String,
    pub url: String,
    pub format: TranscriptFormat,
    pub published: Option<DateTime<FixedOffset>>,
}

impl Episode {
    /// Builds an episode from a feed item, `None` when it has no transcript.
    pub fn from_item(item: &Item) -> Option<Self> {
        let transcript = item.transcript()?;
        Some(Episode {
            title: item.display_title(),
            url: transcript.url.trim().to_string(),
            format: TranscriptFormat::from_mime(transcript.mime.as_deref()),
            published: item.pub_date.as_deref().and_then(parse_date),
        })
    }

    pub fn date_key(&self) -> String {
        date_key(self.published.as_ref())
    }
}

pub fn parse_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(raw.trim()).ok()
}

pub fn date_key(date: Option<&DateTime<FixedOffset>>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "0000-00-00".to_string())
}

#[derive(Debug, PartialEq, Clone)]
pub struct Podcast {
    pub title: String,
}
