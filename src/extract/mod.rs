pub mod fashion_studio;

use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use tracing::{debug, info, instrument};

use crate::error::ExtractError;
use crate::types::RawRecord;

pub use fashion_studio::{parse_page, FashionStudioCrawler};

/// A paginated catalog that can be fetched one page at a time.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Unique identifier for this source
    fn source_name(&self) -> &'static str;

    /// Fetch and parse a single page (1-based). Rows come back in document order.
    async fn fetch_page(&self, page: u32) -> Result<Vec<RawRecord>, ExtractError>;
}

/// Fetches pages `1..=pages` one after another, sleeping `delay` after each
/// attempt. A failed page is reported and skipped; only a run where no page
/// could be fetched at all is an error.
#[instrument(skip(source), fields(source = source.source_name()))]
pub async fn scrape_all(
    source: &dyn CatalogSource,
    pages: u32,
    delay: Duration,
) -> Result<Vec<RawRecord>, ExtractError> {
    let mut records = Vec::new();
    let mut fetched = 0u32;

    for page in 1..=pages {
        println!("[extract] scraping page {page}/{pages} ...");
        match source.fetch_page(page).await {
            Ok(rows) => {
                info!(page, rows = rows.len(), "Fetched page");
                counter!("catalog_pages_fetched_total").increment(1);
                fetched += 1;
                records.extend(rows);
            }
            Err(e) => {
                debug!(page, "Page failed: {}", e);
                println!("[extract] warning: {e}");
                counter!("catalog_pages_failed_total").increment(1);
            }
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    if fetched == 0 {
        return Err(ExtractError::NoPages);
    }
    counter!("catalog_records_raw_total").increment(records.len() as u64);
    println!(
        "[extract] finished scraping {fetched}/{pages} pages ({} rows)",
        records.len()
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakySource {
        failing: Vec<u32>,
    }

    #[async_trait]
    impl CatalogSource for FlakySource {
        fn source_name(&self) -> &'static str {
            "flaky"
        }

        async fn fetch_page(&self, page: u32) -> Result<Vec<RawRecord>, ExtractError> {
            if self.failing.contains(&page) {
                return Err(ExtractError::Status { page, status: 503 });
            }
            Ok(vec![RawRecord {
                title: Some(format!("Item {page}")),
                ..RawRecord::default()
            }])
        }
    }

    #[tokio::test]
    async fn failed_pages_are_skipped() {
        let source = FlakySource { failing: vec![2] };
        let rows = scrape_all(&source, 3, Duration::ZERO).await.unwrap();
        let titles: Vec<_> = rows.iter().filter_map(|r| r.title.as_deref()).collect();
        assert_eq!(titles, ["Item 1", "Item 3"]);
    }

    #[tokio::test]
    async fn all_pages_failing_is_fatal() {
        let source = FlakySource { failing: vec![1, 2] };
        let err = scrape_all(&source, 2, Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, ExtractError::NoPages));
    }

    #[tokio::test]
    async fn zero_pages_is_fatal() {
        let source = FlakySource { failing: vec![] };
        assert!(scrape_all(&source, 0, Duration::ZERO).await.is_err());
    }
}
