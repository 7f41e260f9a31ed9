//! Sequential crawl over the new-releases listing.
//!
//! One page is fetched at a time. Candidates are visited in listing order
//! (newest first) and the scan stops at the first title dated before the
//! target day, since everything after it is older still.

use chrono::{FixedOffset, NaiveDate, Utc};
use clap::ValueEnum;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_BASE_URL;
use crate::date::{CutoffPolicy, KST_OFFSET_HOURS, offset_from_hours, target_day};
use crate::error::Result;
use crate::http_client::Fetcher;
use crate::models::{Candidate, DetailInfo, Title};
use crate::sources::{SourceRegistry, Strategy};

/// Listing filter: comics only, adult titles excluded, newest first.
pub const LISTING_PATH: &str = "/new-releases/comic?type=total&adult_exclude=y&page=1&order=RECENT";

pub fn listing_url(base_url: &str) -> String {
    format!("{}{}", base_url, LISTING_PATH)
}

pub fn book_url(base_url: &str, id: u64) -> String {
    format!("{}/books/{}", base_url, id)
}

/// What happens when one candidate's detail page cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FailurePolicy {
    /// End the crawl with the error.
    #[default]
    Abort,
    /// Log it, leave the title out and keep scanning.
    Skip,
}

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub base_url: String,
    pub max_candidates: usize,
    pub utc_offset_hours: i32,
    pub cutoff: CutoffPolicy,
    pub on_error: FailurePolicy,
    pub strategy: Strategy,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_candidates: 30,
            utc_offset_hours: KST_OFFSET_HOURS,
            cutoff: CutoffPolicy::default(),
            on_error: FailurePolicy::default(),
            strategy: Strategy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedCandidate {
    pub id: u64,
    pub title: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlReport {
    pub target_day: NaiveDate,
    pub titles: Vec<Title>,
    pub detail_fetches: usize,
    pub skipped: Vec<SkippedCandidate>,
}

enum Step {
    Keep(Title),
    Pass,
    Stop,
}

pub struct Crawler<F: Fetcher> {
    fetcher: F,
    registry: SourceRegistry,
    options: CrawlOptions,
    offset: FixedOffset,
}

impl<F: Fetcher> Crawler<F> {
    pub fn new(fetcher: F, options: CrawlOptions) -> Result<Self> {
        let offset = offset_from_hours(options.utc_offset_hours)?;
        Ok(Self {
            fetcher,
            registry: SourceRegistry::standard(options.strategy),
            options,
            offset,
        })
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Today's civil date in the configured offset.
    pub fn today(&self) -> NaiveDate {
        target_day(Utc::now(), self.offset)
    }

    pub async fn fetch_candidates(&self) -> Result<Vec<Candidate>> {
        let url = listing_url(&self.options.base_url);
        let body = self.fetcher.fetch_body(&url).await?;
        let mut candidates = self.registry.extract_listing(&body)?;
        candidates.truncate(self.options.max_candidates);
        info!(count = candidates.len(), "listing candidates");
        Ok(candidates)
    }

    pub async fn fetch_detail(&self, id: u64) -> Result<DetailInfo> {
        let url = book_url(&self.options.base_url, id);
        let body = self.fetcher.fetch_body(&url).await?;
        let (edition, info) = self.registry.extract_detail(&body, self.offset)?;
        debug!(id, url = %url, ?edition, date = %info.date, "extracted detail");
        Ok(info)
    }

    fn decide(&self, candidate: Candidate, detail: DetailInfo, target: NaiveDate) -> Step {
        let cutoff = self.options.cutoff;
        if cutoff.stops(detail.date, target) {
            info!(
                id = candidate.id,
                date = %detail.date,
                target = %target,
                "reached titles older than the target day"
            );
            return Step::Stop;
        }
        if cutoff.accepts(detail.date, target) {
            Step::Keep(Title::merge(candidate, detail))
        } else {
            debug!(id = candidate.id, date = %detail.date, "outside the target day, passing over");
            Step::Pass
        }
    }

    /// Runs one crawl against `target`, which callers usually get from [`Crawler::today`].
    pub async fn run(&self, target: NaiveDate) -> Result<CrawlReport> {
        info!(target = %target, cutoff = ?self.options.cutoff, "starting crawl");
        let candidates = self.fetch_candidates().await?;

        let mut report = CrawlReport {
            target_day: target,
            titles: Vec::new(),
            detail_fetches: 0,
            skipped: Vec::new(),
        };

        for candidate in candidates {
            report.detail_fetches += 1;
            let detail = match self.fetch_detail(candidate.id).await {
                Ok(detail) => detail,
                Err(e) if self.options.on_error == FailurePolicy::Skip && !e.is_listing_level() => {
                    warn!(id = candidate.id, title = %candidate.title, error = %e, "skipping candidate");
                    report.skipped.push(SkippedCandidate {
                        id: candidate.id,
                        title: candidate.title,
                        reason: e.to_string(),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            match self.decide(candidate, detail, target) {
                Step::Keep(title) => report.titles.push(title),
                Step::Pass => {}
                Step::Stop => break,
            }
        }

        info!(
            titles = report.titles.len(),
            detail_fetches = report.detail_fetches,
            skipped = report.skipped.len(),
            "crawl finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::CrawlError;
    use crate::sources::embedded::fixtures::{detail_html, listing_html};

    const BASE: &str = "http://shop.test";

    struct MockFetcher {
        pages: HashMap<String, String>,
        requests: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn fetch_body(&self, url: &str) -> Result<String> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.pages.get(url).cloned().ok_or_else(|| CrawlError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// One listing entry and detail page per `(id, pub_date)`.
    fn fetcher(books: &[(u64, &str)]) -> MockFetcher {
        let items: Vec<_> = books.iter().map(|(id, _)| (*id, "Book", 4500)).collect();
        let mut pages = HashMap::new();
        pages.insert(listing_url(BASE), listing_html(&items));
        for (id, date) in books {
            pages.insert(book_url(BASE, *id), detail_html(date, None));
        }
        MockFetcher {
            pages,
            requests: AtomicUsize::new(0),
        }
    }

    fn options() -> CrawlOptions {
        CrawlOptions {
            base_url: BASE.to_string(),
            ..CrawlOptions::default()
        }
    }

    #[tokio::test]
    async fn stops_one_past_the_boundary() {
        let crawler = Crawler::new(
            fetcher(&[
                (1, "2025.09.05."),
                (2, "2025.09.05."),
                (3, "2025.09.04."),
                (4, "2025.09.03."),
                (5, "2025.09.02."),
            ]),
            options(),
        )
        .unwrap();
        let report = crawler.run(ymd(2025, 9, 5)).await.unwrap();
        let ids: Vec<_> = report.titles.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(report.detail_fetches, 3);
        // listing + three detail pages
        assert_eq!(crawler.fetcher.requests.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn future_dates_kept_unless_exact_day() {
        let books = [(1, "2025.09.08."), (2, "2025.09.05."), (3, "2025.09.01.")];
        let crawler = Crawler::new(fetcher(&books), options()).unwrap();
        let report = crawler.run(ymd(2025, 9, 5)).await.unwrap();
        assert_eq!(report.titles.len(), 2);

        let exact = CrawlOptions {
            cutoff: CutoffPolicy::ExactDay,
            ..options()
        };
        let crawler = Crawler::new(fetcher(&books), exact).unwrap();
        let report = crawler.run(ymd(2025, 9, 5)).await.unwrap();
        let ids: Vec<_> = report.titles.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2]);
        assert_eq!(report.detail_fetches, 3);
    }

    #[tokio::test]
    async fn abort_policy_propagates_detail_errors() {
        let mut mock = fetcher(&[(1, "2025.09.05."), (2, "2025.09.05.")]);
        mock.pages.insert(book_url(BASE, 1), "<html></html>".into());
        let crawler = Crawler::new(mock, options()).unwrap();
        let err = crawler.run(ymd(2025, 9, 5)).await.unwrap_err();
        assert!(matches!(err, CrawlError::Parse(_)));
    }

    #[tokio::test]
    async fn skip_policy_records_and_continues() {
        let mut mock = fetcher(&[(1, "2025.09.05."), (2, "2025.09.05."), (3, "2025.09.01.")]);
        mock.pages.remove(&book_url(BASE, 1));
        let crawler = Crawler::new(
            mock,
            CrawlOptions {
                on_error: FailurePolicy::Skip,
                ..options()
            },
        )
        .unwrap();
        let report = crawler.run(ymd(2025, 9, 5)).await.unwrap();
        assert_eq!(report.titles.len(), 1);
        assert_eq!(report.titles[0].id, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].id, 1);
        assert_eq!(report.detail_fetches, 3);
    }

    #[tokio::test]
    async fn listing_failure_is_fatal_even_when_skipping() {
        let mut mock = fetcher(&[(1, "2025.09.05.")]);
        mock.pages.insert(listing_url(BASE), "<html><body></body></html>".into());
        let crawler = Crawler::new(
            mock,
            CrawlOptions {
                on_error: FailurePolicy::Skip,
                ..options()
            },
        )
        .unwrap();
        let err = crawler.run(ymd(2025, 9, 5)).await.unwrap_err();
        assert!(err.is_listing_level());
    }

    #[tokio::test]
    async fn candidates_capped_before_detail_fetches() {
        let books: Vec<(u64, &str)> = (1..=5).map(|id| (id, "2025.09.05.")).collect();
        let crawler = Crawler::new(
            fetcher(&books),
            CrawlOptions {
                max_candidates: 3,
                ..options()
            },
        )
        .unwrap();
        let report = crawler.run(ymd(2025, 9, 5)).await.unwrap();
        assert_eq!(report.titles.len(), 3);
        assert_eq!(report.detail_fetches, 3);
    }

    #[test]
    fn urls_follow_storefront_layout() {
        assert_eq!(
            listing_url("https://ridibooks.com"),
            "https://ridibooks.com/new-releases/comic?type=total&adult_exclude=y&page=1&order=RECENT"
        );
        assert_eq!(book_url("https://ridibooks.com", 42), "https://ridibooks.com/books/42");
    }

    #[test]
    fn rejects_out_of_range_offset() {
        let result = Crawler::new(
            fetcher(&[]),
            CrawlOptions {
                utc_offset_hours: 30,
                ..options()
            },
        );
        assert!(result.is_err());
    }
}
