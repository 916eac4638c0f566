use serde::{Deserialize, Serialize};

/// One product card exactly as scraped. Every field may be absent and may hold
/// sentinel text such as "Unknown Product" or "Price Unavailable".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Price")]
    pub price: Option<String>,
    #[serde(rename = "Rating")]
    pub rating: Option<String>,
    #[serde(rename = "Colors")]
    pub colors: Option<String>,
    #[serde(rename = "Size")]
    pub size: Option<String>,
    #[serde(rename = "Gender")]
    pub gender: Option<String>,
    /// ISO-8601 capture time, stamped by extraction.
    pub timestamp: Option<String>,
}

/// A fully typed, validated product listing. Field order is the canonical
/// column order used by every sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    #[serde(rename = "Title")]
    pub title: String,
    /// Price converted to the target currency.
    #[serde(rename = "Price")]
    pub price: i64,
    #[serde(rename = "Rating")]
    pub rating: f64,
    #[serde(rename = "Colors")]
    pub colors: i64,
    #[serde(rename = "Size")]
    pub size: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    pub timestamp: Option<String>,
}

impl CleanRecord {
    /// Renders the record back into raw text that normalizes to the same record:
    /// price in source currency at `exchange_rate`, size and gender labelled.
    pub fn to_raw(&self, exchange_rate: u32) -> RawRecord {
        let source_price = self.price as f64 / f64::from(exchange_rate.max(1));
        RawRecord {
            title: Some(self.title.clone()),
            price: Some(format!("${source_price}")),
            rating: Some(self.rating.to_string()),
            colors: Some(self.colors.to_string()),
            size: Some(format!("Size: {}", self.size)),
            gender: Some(format!("Gender: {}", self.gender)),
            timestamp: self.timestamp.clone(),
        }
    }
}

/// Output columns, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Title,
    Price,
    Rating,
    Colors,
    Size,
    Gender,
    Timestamp,
}

impl Column {
    pub const CANONICAL: [Column; 7] = [
        Column::Title,
        Column::Price,
        Column::Rating,
        Column::Colors,
        Column::Size,
        Column::Gender,
        Column::Timestamp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Title => "Title",
            Column::Price => "Price",
            Column::Rating => "Rating",
            Column::Colors => "Colors",
            Column::Size => "Size",
            Column::Gender => "Gender",
            Column::Timestamp => "timestamp",
        }
    }

    pub fn header() -> Vec<&'static str> {
        Self::CANONICAL.iter().map(|c| c.name()).collect()
    }
}
