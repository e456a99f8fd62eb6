/// A transcript reference as declared inside an `<item>`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transcript {
    pub url: String,
    pub mime: Option<String>,
}

/// Raw `<item>` contents, before deciding whether it is a downloadable episode.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Item {
    pub index: usize,
    pub title: Option<String>,
    pub pub_date: Option<String>,
    /// `podcast:transcript` elements, in document order.
    pub transcripts: Vec<Transcript>,
    /// `link rel="transcript"` elements, in document order.
    pub transcript_links: Vec<Transcript>,
}

impl Item {
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => format!("Episode_{}", self.index),
        }
    }

    // podcast:transcript wins over a rel link
    pub fn transcript(&self) -> Option<&Transcript> {
        self.transcripts
            .iter()
            .chain(self.transcript_links.iter())
            .find(|t| !t.url.trim().is_empty())
    }
}
