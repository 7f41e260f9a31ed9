//! Legacy markup-only layout, read by fixed positions in the rendered DOM.
//!
//! Kept as a fallback for page versions that ship without embedded state.
//! Any layout change on the storefront is likely to break these indices.

use std::sync::LazyLock;

use chrono::FixedOffset;
use regex::Regex;
use scraper::ElementRef;
use tracing::{debug, warn};

use crate::date::{parse_release_date, strip_to_date_chars};
use crate::error::{CrawlError, Result};
use crate::markup::{Document, attr, child_elements, select_all_in, select_first_in, text_of};
use crate::models::{Candidate, DetailInfo};
use crate::sources::{Edition, ReleaseSource, compose_sub_text, has_series_list, latest_series_date};

pub const NAME: &str = "dom";

/// Position of the new-releases section among `<main>`'s sections.
const LISTING_SECTION_INDEX: usize = 1;
/// The first anchor wraps the cover, the second carries the title.
const TITLE_ANCHOR_INDEX: usize = 1;
const CURRENCY_UNIT: &str = "원";

const HEADER_BLOCK: &str = "div.header_info_wrap";
const METADATA_BLOCK: &str = "div.info_metadata_wrap";

static BOOK_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/books/(\d+)").unwrap());

pub struct DomSource;

/// `"소장 4,500원"` -> `4500`.
pub fn parse_price(text: &str) -> Option<u64> {
    let amount = text.split(CURRENCY_UNIT).next()?;
    let token = amount.split_whitespace().nth(1)?;
    token.replace(',', "").parse().ok()
}

fn book_id(href: &str) -> Option<u64> {
    BOOK_ID.captures(href)?.get(1)?.as_str().parse().ok()
}

fn candidate_from_item(item: ElementRef<'_>) -> Result<Option<Candidate>> {
    let anchors = select_all_in(item, "a")?;
    let paragraphs = select_all_in(item, "p")?;
    let (Some(anchor), Some(last_p)) = (anchors.get(TITLE_ANCHOR_INDEX), paragraphs.last()) else {
        return Ok(None);
    };

    let href = attr(*anchor, "href").unwrap_or_default();
    let Some(id) = book_id(href) else {
        debug!(href, "listing item link has no book id");
        return Ok(None);
    };

    let price_text = text_of(*last_p);
    let Some(price) = parse_price(&price_text) else {
        warn!(id, text = %price_text.trim(), "could not read price from listing item");
        return Ok(None);
    };

    Ok(Some(Candidate {
        id,
        title: text_of(*anchor).trim().to_string(),
        price,
    }))
}

fn header_block<'a>(doc: &'a Document) -> Result<ElementRef<'a>> {
    doc.select_first(HEADER_BLOCK)?
        .ok_or_else(|| CrawlError::missing(HEADER_BLOCK))
}

fn metadata_block<'a>(doc: &'a Document) -> Result<ElementRef<'a>> {
    let header = header_block(doc)?;
    select_first_in(header, METADATA_BLOCK)?.ok_or_else(|| CrawlError::missing(METADATA_BLOCK))
}

fn sub_text(doc: &Document) -> Result<String> {
    let header = header_block(doc)?;

    let publisher = select_first_in(header, "p.metadata_publisher a")?
        .map(text_of)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| CrawlError::missing("p.metadata_publisher a"))?;

    let writer = select_first_in(header, "p.metadata_writer")?
        .ok_or_else(|| CrawlError::missing("p.metadata_writer"))?;
    let mut groups = Vec::new();
    for group in child_elements(writer) {
        let parts = child_elements(group);
        if parts.len() < 2 {
            continue;
        }
        // name anchor first, role label last
        groups.push((text_of(parts[0]), text_of(parts[parts.len() - 1])));
    }
    if groups.is_empty() {
        return Err(CrawlError::missing("p.metadata_writer author groups"));
    }

    Ok(compose_sub_text(
        groups.iter().map(|(n, r)| (n.as_str(), r.as_str())),
        &publisher,
    ))
}

impl ReleaseSource for DomSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn recognizes_listing(&self, doc: &Document) -> bool {
        matches!(doc.select_first("main section ul li"), Ok(Some(_)))
    }

    fn recognizes_detail(&self, doc: &Document) -> bool {
        matches!(doc.select_first(HEADER_BLOCK), Ok(Some(_)))
    }

    fn extract_listing(&self, doc: &Document) -> Result<Vec<Candidate>> {
        let main = doc
            .select_first("main")?
            .ok_or_else(|| CrawlError::ListingNotFound("<main> not found".into()))?;
        let sections: Vec<_> = child_elements(main)
            .into_iter()
            .filter(|el| el.value().name() == "section")
            .collect();
        let section = sections.get(LISTING_SECTION_INDEX).ok_or_else(|| {
            CrawlError::ListingNotFound(format!("main > section[{}] not found", LISTING_SECTION_INDEX))
        })?;
        let list = select_first_in(*section, "ul")?
            .ok_or_else(|| CrawlError::ListingNotFound("listing <ul> not found".into()))?;

        let mut candidates = Vec::new();
        for item in child_elements(list) {
            if item.value().name() != "li" {
                continue;
            }
            if let Some(candidate) = candidate_from_item(item)? {
                candidates.push(candidate);
            }
        }
        debug!(count = candidates.len(), "read listing from markup");
        Ok(candidates)
    }

    /// A `<time>` in the metadata block marks a dated standalone release.
    fn classify(&self, doc: &Document) -> Result<Edition> {
        let block = metadata_block(doc)?;
        Ok(if select_first_in(block, "time")?.is_some() {
            Edition::Standalone
        } else {
            Edition::Series
        })
    }

    fn extract_detail(&self, doc: &Document, offset: FixedOffset) -> Result<DetailInfo> {
        let block = metadata_block(doc)?;
        let date = match self.classify(doc)? {
            Edition::Standalone => {
                let time = select_first_in(block, "time")?
                    .ok_or_else(|| CrawlError::missing("time"))?;
                let raw = attr(time, "datetime")
                    .map(str::to_string)
                    .unwrap_or_else(|| strip_to_date_chars(&text_of(time)));
                parse_release_date(&raw, offset)?
            }
            Edition::Series if has_series_list(doc) => latest_series_date(doc, offset)?,
            Edition::Series => {
                let first = select_first_in(block, "li")?
                    .ok_or_else(|| CrawlError::missing(format!("{} li", METADATA_BLOCK)))?;
                parse_release_date(&strip_to_date_chars(&text_of(first)), offset)?
            }
        };

        Ok(DetailInfo {
            date,
            sub_text: sub_text(doc)?,
        })
    }
}
