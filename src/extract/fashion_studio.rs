use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};

use crate::constants::{page_url, SOURCE_NAME};
use crate::error::ExtractError;
use crate::extract::CatalogSource;
use crate::types::RawRecord;

static CARD_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(".collection-card").unwrap());
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(".product-title").unwrap());
static PRICE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(".price").unwrap());
static DETAIL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".product-details p").unwrap());

/// Crawler for the Fashion Studio product catalog.
pub struct FashionStudioCrawler {
    client: reqwest::Client,
    base_url: String,
}

impl FashionStudioCrawler {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(ExtractError::Client)?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl CatalogSource for FashionStudioCrawler {
    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    #[instrument(skip(self))]
    async fn fetch_page(&self, page: u32) -> Result<Vec<RawRecord>, ExtractError> {
        let url = page_url(&self.base_url, page);
        debug!(%url, "Requesting page");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ExtractError::Http { page, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Status {
                page,
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| ExtractError::Http { page, source })?;

        let timestamp = Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
        let records = parse_page(&body, &timestamp);
        if records.is_empty() {
            warn!(page, "No product cards found - the page structure may have changed");
        }
        Ok(records)
    }
}

fn element_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<String>()
}

fn first_text(card: ElementRef, selector: &Selector) -> Option<String> {
    card.select(selector).next().map(element_text)
}

/// Parses every `.collection-card` of a catalog page into a [`RawRecord`],
/// stamping each with `timestamp`.
pub fn parse_page(html: &str, timestamp: &str) -> Vec<RawRecord> {
    let document = Html::parse_document(html);

    document
        .select(&CARD_SELECTOR)
        .map(|card| {
            let mut record = RawRecord {
                title: first_text(card, &TITLE_SELECTOR),
                price: first_text(card, &PRICE_SELECTOR),
                timestamp: Some(timestamp.to_string()),
                ..RawRecord::default()
            };

            for detail in card.select(&DETAIL_SELECTOR) {
                let text = element_text(detail);
                if text.starts_with("Rating") {
                    record.rating = Some(text.replace("Rating:", "").trim().to_string());
                } else if text.contains("Colors") {
                    record.colors = Some(text);
                } else if text.contains("Size:") {
                    record.size = Some(text.replace("Size:", "").trim().to_string());
                } else if text.contains("Gender:") {
                    record.gender = Some(text.replace("Gender:", "").trim().to_string());
                }
            }
            record
        })
        .collect()
}
