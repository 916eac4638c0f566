//! Record filter and validator: turns a scraped batch into typed, deduplicated
//! [`CleanRecord`]s.

pub mod normalizers;

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::constants::{DEFAULT_EXCHANGE_RATE, UNKNOWN_PRODUCT};
use crate::error::TransformError;
use crate::types::{CleanRecord, Column, RawRecord};

pub use normalizers::{
    normalize_colors, normalize_gender, normalize_price, normalize_rating, normalize_size,
    ParseResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformConfig {
    pub exchange_rate: u32,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            exchange_rate: DEFAULT_EXCHANGE_RATE,
        }
    }
}

/// What happened to each input row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformReport {
    pub input: usize,
    pub dropped_title: usize,
    pub dropped_price: usize,
    pub dropped_rating: usize,
    pub dropped_colors: usize,
    pub dropped_size: usize,
    pub dropped_gender: usize,
    pub duplicates: usize,
    pub kept: usize,
}

impl TransformReport {
    pub fn dropped(&self) -> usize {
        self.dropped_title
            + self.dropped_price
            + self.dropped_rating
            + self.dropped_colors
            + self.dropped_size
            + self.dropped_gender
            + self.duplicates
    }

    fn record_drop(&mut self, column: Column) {
        match column {
            Column::Title => self.dropped_title += 1,
            Column::Price => self.dropped_price += 1,
            Column::Rating => self.dropped_rating += 1,
            Column::Colors => self.dropped_colors += 1,
            Column::Size => self.dropped_size += 1,
            Column::Gender => self.dropped_gender += 1,
            Column::Timestamp => {}
        }
    }

    /// Drop counts keyed by reason, for logs and metric labels.
    pub fn drop_reasons(&self) -> [(&'static str, usize); 7] {
        [
            ("title", self.dropped_title),
            ("price", self.dropped_price),
            ("rating", self.dropped_rating),
            ("colors", self.dropped_colors),
            ("size", self.dropped_size),
            ("gender", self.dropped_gender),
            ("duplicate", self.duplicates),
        ]
    }
}

/// Per-field outcome for one record, before the all-or-drop reduction.
struct NormalizedFields {
    price: ParseResult<i64>,
    rating: ParseResult<f64>,
    colors: ParseResult<i64>,
    size: ParseResult<String>,
    gender: ParseResult<String>,
}

impl NormalizedFields {
    fn of(raw: &RawRecord, config: &TransformConfig) -> Self {
        Self {
            price: normalize_price(raw.price.as_deref(), config.exchange_rate),
            rating: normalize_rating(raw.rating.as_deref()),
            colors: normalize_colors(raw.colors.as_deref()),
            size: normalize_size(raw.size.as_deref()),
            gender: normalize_gender(raw.gender.as_deref()),
        }
    }

    /// Combines the five results; the first failing column in canonical order
    /// is reported when the record has to go.
    fn into_record(self, title: &str, timestamp: Option<&str>) -> Result<CleanRecord, Column> {
        let price = self.price.map_err(|e| log_field_failure(title, Column::Price, &e))?;
        let rating = self.rating.map_err(|e| log_field_failure(title, Column::Rating, &e))?;
        let colors = self.colors.map_err(|e| log_field_failure(title, Column::Colors, &e))?;
        let size = self.size.map_err(|e| log_field_failure(title, Column::Size, &e))?;
        let gender = self.gender.map_err(|e| log_field_failure(title, Column::Gender, &e))?;

        Ok(CleanRecord {
            title: title.to_string(),
            price,
            rating,
            colors,
            size,
            gender,
            timestamp: timestamp.map(str::to_string),
        })
    }
}

fn log_field_failure(title: &str, column: Column, err: &crate::error::ParseError) -> Column {
    debug!(title, column = column.name(), "dropping record: {}", err);
    column
}

fn is_usable_title(title: Option<&str>) -> Option<&str> {
    title.filter(|t| !t.trim().is_empty() && !t.contains(UNKNOWN_PRODUCT))
}

/// Runs the full filter over a batch and returns the clean records in input
/// order, keeping the first occurrence of every (title, price) pair.
#[instrument(skip(batch), fields(input = batch.len()))]
pub fn transform(
    batch: &[RawRecord],
    config: &TransformConfig,
) -> Result<(Vec<CleanRecord>, TransformReport), TransformError> {
    if batch.is_empty() {
        return Err(TransformError::EmptyBatch);
    }

    let mut report = TransformReport {
        input: batch.len(),
        ..TransformReport::default()
    };
    let mut seen: HashSet<(String, i64)> = HashSet::with_capacity(batch.len());
    let mut records = Vec::with_capacity(batch.len());

    for raw in batch {
        let Some(title) = is_usable_title(raw.title.as_deref()) else {
            report.record_drop(Column::Title);
            continue;
        };

        let fields = NormalizedFields::of(raw, config);
        let record = match fields.into_record(title, raw.timestamp.as_deref()) {
            Ok(record) => record,
            Err(column) => {
                report.record_drop(column);
                continue;
            }
        };

        if !seen.insert((record.title.clone(), record.price)) {
            debug!(title = %record.title, price = record.price, "dropping duplicate");
            report.duplicates += 1;
            continue;
        }
        records.push(record);
    }

    report.kept = records.len();
    info!(
        kept = report.kept,
        dropped = report.dropped(),
        duplicates = report.duplicates,
        "Transform finished"
    );
    Ok((records, report))
}
