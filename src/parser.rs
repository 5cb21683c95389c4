//! Streaming dump reader.
//!
//! The reader never builds a document tree. XML events are fed into a
//! [`DumpMachine`], which only buffers the handful of elements listed in
//! [`KEPT_ELEMENTS`] and forgets everything else as soon as it is seen. When a
//! `page` element closes the machine yields the page's latest revision, which
//! [`DumpReader`] then hands to every registered [`PageHandler`].

use crate::config::PROGRESS_INTERVAL;
use crate::models::PageRevision;
use crate::stats::ReadStats;
use anyhow::{Context, Result};
use bzip2::read::BzDecoder;
use indicatif::ProgressBar;
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing::{debug, error, info, warn};

/// `#REDIRECT [[Target]]` at the start of a page, case-insensitive.
pub static REDIRECT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*#redirect:?\s*\[\[([^|\]]+)[^\]]*\]\]").unwrap());

/// Returns the cleaned redirect target if `text` is a redirect directive.
pub fn redirect_target(text: &str) -> Option<String> {
    REDIRECT_REGEX
        .captures(text)
        .map(|c| clean_redirect_target(&c[1]))
}

fn clean_redirect_target(target: &str) -> String {
    let target = target.split('|').next().unwrap_or_default();
    target.replace('_', " ").trim().to_string()
}

/// Consumer of the pages produced by [`DumpReader`].
///
/// Called once per retained page, in registration order. An error is logged
/// together with the page title and does not stop the read.
pub trait PageHandler {
    fn on_page(&mut self, page: &PageRevision) -> Result<()>;
}

/// The subset of XML events the state machine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlEvent<'a> {
    Start(&'a str),
    Text(&'a str),
    End(&'a str),
}

/// Leaf elements whose text content is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    PageId,
    RevisionId,
    Text,
    Username,
    Timestamp,
    Comment,
}

impl Field {
    fn tag(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::PageId | Field::RevisionId => "id",
            Field::Text => "text",
            Field::Username => "username",
            Field::Timestamp => "timestamp",
            Field::Comment => "comment",
        }
    }
}

/// What an opening tag turns into once it passes the allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kept {
    Page,
    Revision,
    Field(Field),
}

pub type KeepRule = fn(Option<&PageContext>) -> Option<Kept>;

/// Allow-list of materialized elements, keyed by local name. A rule sees the
/// current page (if any) and may still decline, e.g. a second `<id>` inside a
/// revision. Elements absent from this table are dropped unbuffered.
pub const KEPT_ELEMENTS: &[(&str, KeepRule)] = &[
    ("page", keep_page),
    ("title", keep_title),
    ("revision", keep_revision),
    ("id", keep_id),
    ("text", keep_text),
    ("username", keep_username),
    ("timestamp", keep_timestamp),
    ("comment", keep_comment),
];

fn keep_page(_: Option<&PageContext>) -> Option<Kept> {
    Some(Kept::Page)
}

fn keep_title(page: Option<&PageContext>) -> Option<Kept> {
    page.map(|_| Kept::Field(Field::Title))
}

fn keep_revision(page: Option<&PageContext>) -> Option<Kept> {
    page.map(|_| Kept::Revision)
}

// First id outside a revision is the page id; first id inside a revision is
// the revision id. Later ids (contributor ids) are ignored.
fn keep_id(page: Option<&PageContext>) -> Option<Kept> {
    let page = page?;
    match &page.revision {
        None => page.page_id.is_none().then_some(Kept::Field(Field::PageId)),
        Some(rev) => rev.id.is_none().then_some(Kept::Field(Field::RevisionId)),
    }
}

fn in_revision(page: Option<&PageContext>, field: Field) -> Option<Kept> {
    page?.revision.as_ref().map(|_| Kept::Field(field))
}

fn keep_text(page: Option<&PageContext>) -> Option<Kept> {
    in_revision(page, Field::Text)
}

fn keep_username(page: Option<&PageContext>) -> Option<Kept> {
    in_revision(page, Field::Username)
}

fn keep_timestamp(page: Option<&PageContext>) -> Option<Kept> {
    in_revision(page, Field::Timestamp)
}

fn keep_comment(page: Option<&PageContext>) -> Option<Kept> {
    in_revision(page, Field::Comment)
}

#[derive(Debug, Default)]
struct RevisionContext {
    id: Option<String>,
    text: String,
    username: String,
    timestamp: String,
    comment: String,
}

#[derive(Debug)]
struct Capture {
    field: Field,
    buf: String,
}

/// Accumulating state of the page currently being read. Created when `<page>`
/// opens and consumed when it closes.
#[derive(Debug, Default)]
pub struct PageContext {
    title: String,
    page_id: Option<String>,
    latest_rev_id: u32,
    latest: Option<RevisionContext>,
    revision: Option<RevisionContext>,
    capture: Option<Capture>,
}

impl PageContext {
    fn commit(&mut self, capture: Capture) {
        let Capture { field, buf } = capture;
        match field {
            Field::Title => self.title = buf,
            Field::PageId => self.page_id = Some(buf),
            _ => {
                let Some(rev) = self.revision.as_mut() else {
                    return;
                };
                match field {
                    Field::RevisionId => rev.id = Some(buf),
                    Field::Text => rev.text = buf,
                    Field::Username => rev.username = buf,
                    Field::Timestamp => rev.timestamp = buf,
                    Field::Comment => rev.comment = buf,
                    Field::Title | Field::PageId => {}
                }
            }
        }
    }

    /// Keeps the closing revision only if its id is strictly greater than
    /// every id retained so far. Document order is trusted, not corrected.
    fn close_revision(&mut self, stats: &ReadStats) {
        let Some(rev) = self.revision.take() else {
            return;
        };
        let Some(raw) = rev.id.as_deref() else {
            return;
        };
        match raw.trim().parse::<u32>() {
            Ok(id) if id > self.latest_rev_id => {
                self.latest_rev_id = id;
                self.latest = Some(rev);
            }
            Ok(id) => {
                warn!(
                    title = %self.title,
                    latest = self.latest_rev_id,
                    id,
                    "Revision ids out of sequence"
                );
                stats.inc_out_of_order();
            }
            Err(_) => {
                warn!(title = %self.title, id = raw, "Invalid revision id");
                stats.inc_invalid_ids();
            }
        }
    }
}

/// Result of closing a `page` element.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Emit(PageRevision),
    EmptyTitle,
    SkippedRedirect(String),
}

#[derive(Debug, Default)]
enum ReaderState {
    #[default]
    Idle,
    InPage(Box<PageContext>),
}

/// Event-driven page extractor, independent of any particular XML library.
#[derive(Debug, Default)]
pub struct DumpMachine {
    state: ReaderState,
    skip_redirects: bool,
}

impl DumpMachine {
    pub fn new(skip_redirects: bool) -> Self {
        Self {
            state: ReaderState::Idle,
            skip_redirects,
        }
    }

    /// Drops any partially read page.
    pub fn reset(&mut self) {
        self.state = ReaderState::Idle;
    }

    pub fn in_page(&self) -> bool {
        matches!(self.state, ReaderState::InPage(_))
    }

    pub fn handle(&mut self, event: XmlEvent<'_>, stats: &ReadStats) -> Option<PageOutcome> {
        match event {
            XmlEvent::Start(name) => {
                self.start(name);
                None
            }
            XmlEvent::Text(text) => {
                if let ReaderState::InPage(page) = &mut self.state {
                    if let Some(capture) = page.capture.as_mut() {
                        capture.buf.push_str(text);
                    }
                }
                None
            }
            XmlEvent::End(name) => self.end(name, stats),
        }
    }

    fn start(&mut self, name: &str) {
        let Some((_, rule)) = KEPT_ELEMENTS.iter().find(|(tag, _)| *tag == name) else {
            return;
        };
        let page = match &self.state {
            ReaderState::Idle => None,
            ReaderState::InPage(page) => Some(page.as_ref()),
        };
        let kept = rule(page);
        match (kept, &mut self.state) {
            (Some(Kept::Page), state) => {
                if matches!(state, ReaderState::InPage(_)) {
                    warn!("Nested page element, discarding the outer page");
                }
                *state = ReaderState::InPage(Box::default());
            }
            (Some(Kept::Revision), ReaderState::InPage(page)) => {
                page.revision = Some(RevisionContext::default());
            }
            (Some(Kept::Field(field)), ReaderState::InPage(page)) => {
                page.capture = Some(Capture {
                    field,
                    buf: String::new(),
                });
            }
            _ => {}
        }
    }

    fn end(&mut self, name: &str, stats: &ReadStats) -> Option<PageOutcome> {
        let ReaderState::InPage(page) = &mut self.state else {
            return None;
        };
        // Captured fields hold text only, so any other end tag is a mismatch.
        if let Some(capture) = page.capture.take() {
            if capture.field.tag() != name {
                warn!(
                    expected = capture.field.tag(),
                    found = name,
                    "Mismatched end tag, discarding current page"
                );
                stats.inc_xml_errors();
                self.reset();
                return None;
            }
            page.commit(capture);
            return None;
        }
        match name {
            "revision" => {
                page.close_revision(stats);
                None
            }
            "page" => match std::mem::take(&mut self.state) {
                ReaderState::InPage(page) => Some(self.finish_page(*page, stats)),
                ReaderState::Idle => None,
            },
            _ => None,
        }
    }

    fn finish_page(&self, page: PageContext, stats: &ReadStats) -> PageOutcome {
        stats.inc_pages();

        let title = page.title.trim().to_string();
        let page_id = match page.page_id.as_deref() {
            None => None,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!(title = %title, id = raw, "Invalid page id");
                    stats.inc_invalid_ids();
                    None
                }
            },
        };
        let latest = page.latest.unwrap_or_default();

        if title.is_empty() {
            warn!(page_id = ?page_id, "Empty title");
            stats.inc_empty_titles();
            return PageOutcome::EmptyTitle;
        }

        if self.skip_redirects && REDIRECT_REGEX.is_match(&latest.text) {
            debug!(title = %title, "Skipping redirect");
            stats.inc_redirects_skipped();
            return PageOutcome::SkippedRedirect(title);
        }

        PageOutcome::Emit(PageRevision {
            title,
            page_id,
            latest_rev_id: page.latest_rev_id,
            text: latest.text,
            username: latest.username,
            timestamp: latest.timestamp,
            comment: latest.comment,
        })
    }
}

/// Opens a plain or bzip2-compressed (`.bz2`) dump as a buffered stream.
pub fn open_dump(path: &str) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).with_context(|| format!("Failed to open dump: {}", path))?;
    if path.ends_with(".bz2") {
        Ok(Box::new(BufReader::with_capacity(
            256 * 1024,
            BzDecoder::new(file),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(256 * 1024, file)))
    }
}

fn xml_reader<R: BufRead>(input: R) -> Reader<R> {
    let mut reader = Reader::from_reader(input);
    // Mismatched end tags are left to the state machine.
    reader.expand_empty_elements(true).check_end_names(false);
    reader
}

/// Consumes input up to and including the next `<page>` open tag. Returns the
/// number of bytes consumed, or `None` if the input ends first.
fn skip_to_next_page<R: BufRead>(input: &mut R) -> std::io::Result<Option<usize>> {
    let mut skipped = 0;
    let mut scratch = Vec::new();
    loop {
        scratch.clear();
        let n = input.read_until(b'<', &mut scratch)?;
        skipped += n;
        if scratch.last() != Some(&b'<') {
            return Ok(None);
        }
        scratch.clear();
        let n = input.read_until(b'>', &mut scratch)?;
        skipped += n;
        if scratch.last() != Some(&b'>') {
            return Ok(None);
        }
        // a stray `<` inside the skipped tag may hide the page tag itself
        let tag = match memchr::memrchr(b'<', &scratch) {
            Some(at) => &scratch[at + 1..],
            None => &scratch[..],
        };
        let is_page = tag
            .strip_prefix(b"page")
            .and_then(|rest| rest.first())
            .is_some_and(|&c| c == b'>' || c.is_ascii_whitespace());
        if is_page {
            return Ok(Some(skipped));
        }
    }
}

/// Drives a [`DumpMachine`] from a quick-xml event stream and dispatches the
/// resulting pages.
pub struct DumpReader<'h> {
    handlers: Vec<&'h mut dyn PageHandler>,
    skip_redirects: bool,
    show_progress: bool,
}

impl Default for DumpReader<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'h> DumpReader<'h> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            skip_redirects: true,
            show_progress: true,
        }
    }

    pub fn skip_redirects(mut self, skip: bool) -> Self {
        self.skip_redirects = skip;
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn add_handler(&mut self, handler: &'h mut dyn PageHandler) {
        self.handlers.push(handler);
    }

    pub fn read_path(&mut self, path: &str) -> Result<ReadStats> {
        info!("Reading dump: {}", path);
        let input = open_dump(path)?;
        self.read(input)
    }

    /// Consumes the whole stream. Malformed XML discards the page being read
    /// and reading resumes at the next page; only input I/O failures are
    /// returned as errors.
    pub fn read<R: BufRead>(&mut self, input: R) -> Result<ReadStats> {
        let mut reader = xml_reader(input);
        // bytes consumed by earlier readers, for error positions
        let mut offset = 0;

        let stats = ReadStats::new();
        let mut machine = DumpMachine::new(self.skip_redirects);
        let pb = if self.show_progress {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        let mut buf = Vec::with_capacity(64 * 1024);

        loop {
            buf.clear();
            let outcome = match reader.read_event_into(&mut buf) {
                Ok(Event::Eof) => break,
                Ok(Event::Start(e)) => match std::str::from_utf8(e.local_name().as_ref()) {
                    Ok(name) => machine.handle(XmlEvent::Start(name), &stats),
                    Err(_) => None,
                },
                Ok(Event::End(e)) => match std::str::from_utf8(e.local_name().as_ref()) {
                    Ok(name) => machine.handle(XmlEvent::End(name), &stats),
                    Err(_) => None,
                },
                Ok(Event::Text(e)) => match e.unescape() {
                    Ok(text) => machine.handle(XmlEvent::Text(&text), &stats),
                    Err(err) => {
                        warn!(error = %err, "Undecodable text, keeping it raw");
                        stats.inc_xml_errors();
                        let raw = String::from_utf8_lossy(&e);
                        machine.handle(XmlEvent::Text(&raw), &stats)
                    }
                },
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(&e);
                    machine.handle(XmlEvent::Text(&text), &stats)
                }
                Ok(_) => None,
                Err(quick_xml::Error::Io(e)) => {
                    pb.finish_and_clear();
                    return Err(quick_xml::Error::Io(e)).context("Failed to read dump input");
                }
                Err(e) => {
                    let pos = offset + reader.buffer_position();
                    warn!(position = pos, error = %e, "Malformed XML, discarding current page");
                    stats.inc_xml_errors();
                    machine.reset();

                    // quick-xml does not resume after a syntax error, so the
                    // stream is resynchronized on the next page by hand.
                    offset = pos;
                    let mut input = reader.into_inner();
                    match skip_to_next_page(&mut input) {
                        Ok(Some(skipped)) => {
                            offset += skipped;
                            machine.handle(XmlEvent::Start("page"), &stats);
                            reader = xml_reader(input);
                            continue;
                        }
                        Ok(None) => break,
                        Err(e) => {
                            pb.finish_and_clear();
                            return Err(e).context("Failed to read dump input");
                        }
                    }
                }
            };

            let Some(outcome) = outcome else {
                continue;
            };
            if let PageOutcome::Emit(page) = outcome {
                self.dispatch(&page, &stats);
            }
            if stats.pages() % PROGRESS_INTERVAL == 0 {
                pb.tick();
            }
        }

        pb.finish_and_clear();
        if machine.in_page() {
            warn!("Dump ended inside a page element");
        }

        info!(
            pages = stats.pages(),
            dispatched = stats.dispatched(),
            "Dump read complete"
        );
        Ok(stats)
    }

    fn dispatch(&mut self, page: &PageRevision, stats: &ReadStats) {
        for handler in self.handlers.iter_mut() {
            if let Err(e) = handler.on_page(page) {
                error!(title = %page.title, "Handler failed: {:#}", e);
                stats.inc_handler_errors();
            }
        }
        stats.inc_dispatched();
    }
}
