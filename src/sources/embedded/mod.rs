pub mod state;

use chrono::FixedOffset;
use tracing::debug;

use crate::date::parse_release_date;
use crate::error::{CrawlError, Result};
use crate::markup::Document;
use crate::models::{Candidate, DetailInfo};
use crate::sources::{Edition, ReleaseSource, compose_sub_text, has_series_list, latest_series_date};

use self::state::{Cursor, read_script_json};

pub const NAME: &str = "embedded";

/// Next.js state on the new-releases listing.
pub const LISTING_SCRIPT_ID: &str = "__NEXT_DATA__";
/// Prepared grid data on a book detail page.
pub const DETAIL_SCRIPT_ID: &str = "ISLANDS__PreparedData";

const LISTING_QUERIES_PATH: &str = "props.pageProps.dehydratedState.queries";
const LISTING_ITEMS_PATH: &str = "state.data.newReleases.items";
const DETAIL_CELLS_PATH: &str = "props.gridQuery.riGrid.grid.cells";

const METADATA_CELL: &str = "BookDetailHomeMetadata";
const HEADER_CELL: &str = "BookDetailHomeHeader";

/// Reads the JSON state the storefront embeds for client-side hydration.
pub struct EmbeddedStateSource;

fn candidate_from_item(item: &Cursor<'_>) -> Result<Candidate> {
    let book = item.walk("bookShell.book")?;
    Ok(Candidate {
        id: book.field("id")?.id()?,
        title: book.walk("title.main")?.str()?.to_string(),
        price: book.walk("priceInfo.purchase.sellingPrice")?.u64()?,
    })
}

/// Finds the grid cell with the given `type` and returns its `cell__{type}` payload.
fn find_cell<'a>(cells: &[Cursor<'a>], kind: &str) -> Result<Cursor<'a>> {
    let cell = cells
        .iter()
        .find(|c| c.value().get("type").and_then(|t| t.as_str()) == Some(kind))
        .ok_or_else(|| CrawlError::missing(format!("{} cell", kind)))?;
    cell.field(&format!("cell__{}", kind))
}

fn sub_text(cells: &[Cursor<'_>]) -> Result<String> {
    let information = find_cell(cells, HEADER_CELL)?.field("information")?;
    let publisher = information.field("publisherName")?.text()?;
    let groups = information.field("authorGroups")?.items()?;
    if groups.is_empty() {
        return Err(CrawlError::missing(format!(
            "{}.authorGroups entries",
            information.path()
        )));
    }

    let mut pairs = Vec::with_capacity(groups.len());
    for group in &groups {
        let name = group.field("authors")?.index(0)?.field("name")?.text()?;
        let role = group.field("title")?.str()?;
        pairs.push((name, role));
    }
    Ok(compose_sub_text(pairs, publisher))
}

impl ReleaseSource for EmbeddedStateSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn recognizes_listing(&self, doc: &Document) -> bool {
        doc.by_id(LISTING_SCRIPT_ID).is_some()
    }

    fn recognizes_detail(&self, doc: &Document) -> bool {
        doc.by_id(DETAIL_SCRIPT_ID).is_some()
    }

    fn extract_listing(&self, doc: &Document) -> Result<Vec<Candidate>> {
        let data = read_script_json(doc, LISTING_SCRIPT_ID)
            .map_err(|e| CrawlError::ListingNotFound(e.to_string()))?;
        let root = Cursor::root(&data, LISTING_SCRIPT_ID);
        let candidates = root
            .walk(LISTING_QUERIES_PATH)
            .and_then(|queries| queries.index(0))
            .and_then(|query| query.walk(LISTING_ITEMS_PATH))
            .and_then(|items| items.items())
            .and_then(|items| items.iter().map(candidate_from_item).collect::<Result<Vec<_>>>())
            .map_err(|e| CrawlError::ListingNotFound(e.to_string()))?;
        debug!(count = candidates.len(), "read listing from embedded state");
        Ok(candidates)
    }

    fn classify(&self, doc: &Document) -> Result<Edition> {
        Ok(if has_series_list(doc) {
            Edition::Series
        } else {
            Edition::Standalone
        })
    }

    fn extract_detail(&self, doc: &Document, offset: FixedOffset) -> Result<DetailInfo> {
        let data = read_script_json(doc, DETAIL_SCRIPT_ID)?;
        let cells = Cursor::root(&data, DETAIL_SCRIPT_ID)
            .walk(DETAIL_CELLS_PATH)?
            .items()?;
        if cells.is_empty() {
            return Err(CrawlError::Parse(
                "detail grid has no cells, not a book detail page".into(),
            ));
        }

        // The prepared episode list is truncated, so series read the rendered list instead.
        let date = match self.classify(doc)? {
            Edition::Series => latest_series_date(doc, offset)?,
            Edition::Standalone => {
                let pub_date = find_cell(&cells, METADATA_CELL)?
                    .field("publishInfo")?
                    .index(0)?
                    .field("pubDate")?
                    .text()?;
                parse_release_date(pub_date, offset)?
            }
        };

        Ok(DetailInfo {
            date,
            sub_text: sub_text(&cells)?,
        })
    }
}
