use crate::entity::{Episode, Podcast};
use crate::error::{Error, FeedError, Result};
use crate::model::{Item, Transcript};
use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use std::io::BufRead;

type XmlResult<T> = std::result::Result<T, quick_xml::Error>;

/// A parsed channel header plus the lazy sequence of its items.
pub struct Feed<R: BufRead> {
    podcast: Podcast,
    items: Items<R>,
}

impl<'a> Feed<&'a [u8]> {
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self> {
        Feed::parse(bytes)
    }
}

impl<R: BufRead> Feed<R> {
    /// Reads the channel up to its first `<item>`. Fails when the
    /// document is malformed before that point or has no channel title.
    pub fn parse(r: R) -> Result<Self> {
        let mut items = Items::new(r);
        let title = items
            .read_header()?
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(Error::MissingTitle)?;
        Ok(Feed {
            podcast: Podcast { title },
            items,
        })
    }

    pub fn podcast(&self) -> &Podcast {
        &self.podcast
    }

    pub fn into_parts(self) -> (Podcast, Items<R>) {
        (self.podcast, self.items)
    }

    /// Only the items that carry a transcript link.
    pub fn episodes(self) -> impl Iterator<Item = std::result::Result<Episode, FeedError>> {
        self.items.filter_map(|res| match res {
            Ok(item) => Episode::from_item(&item).map(Ok),
            Err(e) => Some(Err(e)),
        })
    }
}

struct Element {
    name: Vec<u8>,
    attrs: Vec<(Vec<u8>, String)>,
}

impl Element {
    fn read(start: &BytesStart) -> XmlResult<Self> {
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let value = match attr.unescape_value() {
                Ok(v) => v.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            };
            attrs.push((attr.key.local_name().as_ref().to_vec(), value));
        }
        Ok(Element {
            name: start.name().as_ref().to_vec(),
            attrs,
        })
    }

    fn local_name(&self) -> &[u8] {
        local_part(&self.name)
    }

    fn is_prefixed(&self) -> bool {
        self.name.contains(&b':')
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.as_slice() == key.as_bytes())
            .map(|(_, v)| v.as_str())
    }
}

enum Node {
    Open(Element),
    Empty(Element),
    Text(String),
    /// Local name of the closing tag.
    Close(Vec<u8>),
    Eof,
    Skip,
}

fn local_part(name: &[u8]) -> &[u8] {
    match name.iter().position(|b| *b == b':') {
        Some(i) => &name[i + 1..],
        None => name,
    }
}

fn read_node<R: BufRead>(reader: &mut Reader<R>, buf: &mut Vec<u8>) -> XmlResult<Node> {
    buf.clear();
    let node = match reader.read_event_into(buf)? {
        Event::Start(e) => Node::Open(Element::read(&e)?),
        Event::Empty(e) => Node::Empty(Element::read(&e)?),
        // stray html entities in titles are common, keep the raw text
        Event::Text(t) => Node::Text(match t.unescape() {
            Ok(s) => s.into_owned(),
            Err(_) => String::from_utf8_lossy(&t).into_owned(),
        }),
        Event::CData(c) => Node::Text(String::from_utf8_lossy(&c.into_inner()).into_owned()),
        Event::End(e) => Node::Close(local_part(e.name().as_ref()).to_vec()),
        Event::Eof => Node::Eof,
        _ => Node::Skip,
    };
    Ok(node)
}

/// Lazy, single pass iterator over the `<item>` elements of a feed.
///
/// Unbalanced tags (raw `<br>` in a description and the like) are
/// tolerated: a closing tag unwinds to its matching open element.
pub struct Items<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    stack: Vec<Vec<u8>>,
    current: Option<Item>,
    /// A self-closed `<item/>` met while reading the header.
    ready: Option<Item>,
    item_depth: usize,
    next_index: usize,
    done: bool,
}

impl<R: BufRead> Items<R> {
    fn new(r: R) -> Self {
        let mut reader = Reader::from_reader(r);
        reader.trim_text(true);
        reader.check_end_names(false);
        Items {
            reader,
            buf: Vec::new(),
            stack: Vec::new(),
            current: None,
            ready: None,
            item_depth: 0,
            next_index: 0,
            done: false,
        }
    }

    fn next_node(&mut self) -> std::result::Result<Node, FeedError> {
        read_node(&mut self.reader, &mut self.buf).map_err(|source| FeedError::Xml {
            position: self.reader.buffer_position(),
            source,
        })
    }

    /// Consumes the channel header, stopping right after the first `<item>` opens.
    fn read_header(&mut self) -> std::result::Result<Option<String>, FeedError> {
        let mut title: Option<String> = None;
        loop {
            match self.next_node()? {
                Node::Open(el) => {
                    self.stack.push(el.local_name().to_vec());
                    if el.local_name() == b"item" {
                        self.open_item();
                        return Ok(title);
                    }
                }
                Node::Empty(el) => {
                    if el.local_name() == b"item" {
                        self.ready = Some(self.new_item());
                        return Ok(title);
                    }
                }
                Node::Text(text) => {
                    if self.in_channel_title() {
                        title.get_or_insert_with(String::new).push_str(&text);
                    }
                }
                Node::Close(name) => self.close(&name),
                Node::Eof => {
                    self.done = true;
                    return Ok(title);
                }
                Node::Skip => {}
            }
        }
    }

    fn in_channel_title(&self) -> bool {
        let n = self.stack.len();
        n >= 2 && self.stack[n - 1].as_slice() == b"title" && self.stack[n - 2].as_slice() == b"channel"
    }

    /// Pops back to the innermost open element called `name`.
    fn close(&mut self, name: &[u8]) {
        match self.stack.iter().rposition(|open| open.as_slice() == name) {
            Some(pos) => {
                if pos + 1 != self.stack.len() {
                    log::warn!(
                        "Malformed feed data detected: </{}> closes unclosed <{}> at byte {}",
                        String::from_utf8_lossy(name),
                        String::from_utf8_lossy(&self.stack[self.stack.len() - 1]),
                        self.reader.buffer_position()
                    );
                }
                self.stack.truncate(pos);
            }
            None => log::warn!(
                "Malformed feed data detected: stray </{}> at byte {}",
                String::from_utf8_lossy(name),
                self.reader.buffer_position()
            ),
        }
    }

    fn new_item(&mut self) -> Item {
        let item = Item {
            index: self.next_index,
            ..Default::default()
        };
        self.next_index += 1;
        item
    }

    fn open_item(&mut self) {
        self.item_depth = self.stack.len();
        self.current = Some(self.new_item());
    }

    fn collect(&mut self, el: &Element) {
        let item = match self.current.as_mut() {
            Some(item) => item,
            None => return,
        };
        let local = el.local_name();
        if local == b"transcript" && el.is_prefixed() {
            item.transcripts.push(Transcript {
                url: el.attr("url").unwrap_or_default().to_string(),
                mime: el.attr("type").map(str::to_string),
            });
        } else if local == b"link" && el.attr("rel") == Some("transcript") {
            item.transcript_links.push(Transcript {
                url: el.attr("href").unwrap_or_default().to_string(),
                mime: el.attr("type").map(str::to_string),
            });
        }
    }

    fn collect_text(&mut self, text: &str) {
        let item = match self.current.as_mut() {
            Some(item) => item,
            None => return,
        };
        if self.stack.len() != self.item_depth + 1 {
            return;
        }
        let field = match self.stack.last().map(Vec::as_slice) {
            Some(b"title") => &mut item.title,
            Some(b"pubDate") => &mut item.pub_date,
            _ => return,
        };
        field.get_or_insert_with(String::new).push_str(text);
    }
}

impl<R: BufRead> Iterator for Items<R> {
    type Item = std::result::Result<Item, FeedError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(item) = self.ready.take() {
            return Some(Ok(item));
        }
        if self.done {
            return None;
        }
        loop {
            let node = match self.next_node() {
                Ok(node) => node,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            match node {
                Node::Open(el) => {
                    self.stack.push(el.local_name().to_vec());
                    if self.current.is_none() && el.local_name() == b"item" {
                        self.open_item();
                    } else {
                        self.collect(&el);
                    }
                }
                Node::Empty(el) => {
                    if self.current.is_none() && el.local_name() == b"item" {
                        return Some(Ok(self.new_item()));
                    }
                    self.collect(&el);
                }
                Node::Text(text) => self.collect_text(&text),
                Node::Close(name) => {
                    self.close(&name);
                    if self.current.is_some() && self.stack.len() < self.item_depth {
                        return self.current.take().map(Ok);
                    }
                }
                Node::Eof => {
                    self.done = true;
                    return self.current.take().map(Ok);
                }
                Node::Skip => {}
            }
        }
    }
}
