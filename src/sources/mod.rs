pub mod dom;
pub mod embedded;

use chrono::{FixedOffset, NaiveDate};
use clap::ValueEnum;
use tracing::{debug, warn};

use crate::date::{parse_release_date, strip_to_date_chars};
use crate::error::{CrawlError, Result};
use crate::markup::{Document, select_all_in, select_first_in, text_of};
use crate::models::{Candidate, DetailInfo};

/// Container that only exists on pages belonging to an ongoing series.
pub const SERIES_LIST_ID: &str = "SeriesListWrap";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edition {
    Standalone,
    Series,
}

/// One way of reading the storefront's listing and detail pages.
pub trait ReleaseSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn recognizes_listing(&self, doc: &Document) -> bool;

    fn recognizes_detail(&self, doc: &Document) -> bool;

    /// Candidates in listing order, newest first.
    fn extract_listing(&self, doc: &Document) -> Result<Vec<Candidate>>;

    fn classify(&self, doc: &Document) -> Result<Edition>;

    fn extract_detail(&self, doc: &Document, offset: FixedOffset) -> Result<DetailInfo>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Strategy {
    /// Probe each page and try every source that recognizes it, preferred first.
    #[default]
    Auto,
    Embedded,
    Dom,
}

pub struct SourceRegistry {
    sources: Vec<Box<dyn ReleaseSource>>,
    strategy: Strategy,
}

impl SourceRegistry {
    pub fn new(sources: Vec<Box<dyn ReleaseSource>>, strategy: Strategy) -> Self {
        Self { sources, strategy }
    }

    /// Embedded-state first, DOM as fallback.
    pub fn standard(strategy: Strategy) -> Self {
        Self::new(
            vec![
                Box::new(embedded::EmbeddedStateSource),
                Box::new(dom::DomSource),
            ],
            strategy,
        )
    }

    fn by_name(&self, name: &str) -> Option<&dyn ReleaseSource> {
        self.sources
            .iter()
            .find(|s| s.name() == name)
            .map(|s| s.as_ref())
    }

    /// Sources to try for a page, in order.
    ///
    /// A pinned strategy yields its one source whether or not it recognizes the
    /// page. `Auto` yields every recognizing source, preferred first.
    fn candidates(
        &self,
        doc: &Document,
        recognizes: impl Fn(&dyn ReleaseSource, &Document) -> bool,
    ) -> Vec<&dyn ReleaseSource> {
        match self.strategy {
            Strategy::Embedded => self.by_name(embedded::NAME).into_iter().collect(),
            Strategy::Dom => self.by_name(dom::NAME).into_iter().collect(),
            Strategy::Auto => self
                .sources
                .iter()
                .map(|s| s.as_ref())
                .filter(|s| recognizes(*s, doc))
                .collect(),
        }
    }

    pub fn listing_sources(&self, doc: &Document) -> Vec<&dyn ReleaseSource> {
        self.candidates(doc, |s, d| s.recognizes_listing(d))
    }

    pub fn detail_sources(&self, doc: &Document) -> Vec<&dyn ReleaseSource> {
        self.candidates(doc, |s, d| s.recognizes_detail(d))
    }

    pub fn extract_listing(&self, body: &str) -> Result<Vec<Candidate>> {
        let doc = Document::parse(body);
        let sources = self.listing_sources(&doc);
        if sources.is_empty() {
            return Err(CrawlError::ListingNotFound(
                "no extraction strategy recognizes the listing page".into(),
            ));
        }
        first_success(sources, |source| source.extract_listing(&doc)).map_err(|e| match e {
            CrawlError::ListingNotFound(_) => e,
            other => CrawlError::ListingNotFound(other.to_string()),
        })
    }

    pub fn extract_detail(&self, body: &str, offset: FixedOffset) -> Result<(Edition, DetailInfo)> {
        let doc = Document::parse(body);
        let sources = self.detail_sources(&doc);
        if sources.is_empty() {
            return Err(CrawlError::Parse(
                "no extraction strategy recognizes the detail page".into(),
            ));
        }
        first_success(sources, |source| {
            let edition = source.classify(&doc)?;
            let info = source.extract_detail(&doc, offset)?;
            Ok((edition, info))
        })
    }
}

/// Runs `extract` against each source until one succeeds.
///
/// When every source fails, the error from the first (preferred) one is returned.
fn first_success<T>(
    sources: Vec<&dyn ReleaseSource>,
    extract: impl Fn(&dyn ReleaseSource) -> Result<T>,
) -> Result<T> {
    let mut first_error = None;
    for source in sources {
        debug!(source = source.name(), "extracting");
        match extract(source) {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(source = source.name(), error = %e, "extraction failed");
                first_error.get_or_insert(e);
            }
        }
    }
    Err(first_error.unwrap_or_else(|| CrawlError::Parse("no extraction strategy available".into())))
}

pub fn has_series_list(doc: &Document) -> bool {
    doc.by_id(SERIES_LIST_ID).is_some()
}

/// Registration date of the newest volume in the series list.
///
/// Registration dates track the storefront's own listing, while the metadata
/// `pubDate` can lag behind by days.
pub fn latest_series_date(doc: &Document, offset: FixedOffset) -> Result<NaiveDate> {
    let wrap = doc
        .by_id(SERIES_LIST_ID)
        .ok_or_else(|| CrawlError::missing(format!("#{}", SERIES_LIST_ID)))?;
    let volumes = select_all_in(wrap, "li.js_series_book_list")?;
    let newest = volumes
        .last()
        .ok_or_else(|| CrawlError::missing("li.js_series_book_list"))?;
    let reg_date = select_first_in(*newest, "li.info_reg_date")?
        .ok_or_else(|| CrawlError::missing("li.info_reg_date"))?;
    let text = strip_to_date_chars(&text_of(reg_date));
    if text.is_empty() {
        return Err(CrawlError::missing("li.info_reg_date text"));
    }
    parse_release_date(&text, offset)
}

/// `"{author} {role} | ... | {publisher} 출판"`.
pub fn compose_sub_text<'a>(
    groups: impl IntoIterator<Item = (&'a str, &'a str)>,
    publisher: &str,
) -> String {
    groups
        .into_iter()
        .map(|(name, role)| format!("{} {}", name.trim(), role.trim()))
        .chain(std::iter::once(format!("{} 출판", publisher.trim())))
        .collect::<Vec<_>>()
        .join(" | ")
}
