#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("http error: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("parse failed: {0}")]
    Parse(String),

    /// The embedded state blob no longer matches the schema we navigate.
    #[error("embedded data shape changed at {path}: expected {expected}")]
    ShapeChanged { path: String, expected: &'static str },

    #[error("missing field: {0}")]
    MissingField(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("listing not found: {0}")]
    ListingNotFound(String),
}

impl CrawlError {
    /// Listing failures leave nothing to crawl, so no policy can skip them.
    pub fn is_listing_level(&self) -> bool {
        matches!(self, CrawlError::ListingNotFound(_))
    }

    pub(crate) fn missing(field: impl Into<String>) -> Self {
        CrawlError::MissingField(field.into())
    }
}

pub type Result<T> = std::result::Result<T, CrawlError>;
