use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::Result;
use crate::extract::{scrape_all, CatalogSource};
use crate::load::{write_all, Sink, SinkOutcome};
use crate::transform::{transform, TransformConfig, TransformReport};

/// Result of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct PipelineReport {
    pub source: String,
    pub raw_records: usize,
    pub transform: TransformReport,
    pub sinks: Vec<SinkOutcome>,
    pub duration_secs: f64,
}

impl PipelineReport {
    pub fn clean_records(&self) -> usize {
        self.transform.kept
    }

    pub fn failed_sinks(&self) -> impl Iterator<Item = &SinkOutcome> {
        self.sinks.iter().filter(|o| !o.is_success())
    }
}

/// Extract -> transform -> load, run sequentially.
pub struct Pipeline {
    source: Box<dyn CatalogSource>,
    sinks: Vec<Box<dyn Sink>>,
    pages: u32,
    delay: Duration,
    transform: TransformConfig,
}

impl Pipeline {
    pub fn new(source: Box<dyn CatalogSource>, sinks: Vec<Box<dyn Sink>>) -> Self {
        Self {
            source,
            sinks,
            pages: crate::constants::DEFAULT_PAGES,
            delay: Duration::from_millis(crate::constants::DEFAULT_DELAY_MS),
            transform: TransformConfig::default(),
        }
    }

    pub fn pages(mut self, pages: u32) -> Self {
        self.pages = pages;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn transform_config(mut self, config: TransformConfig) -> Self {
        self.transform = config;
        self
    }

    /// Runs the pipeline. Only an extraction that yields no page at all or an
    /// empty batch fails the run; sink failures end up in the report.
    #[instrument(skip(self), fields(source = self.source.source_name(), pages = self.pages))]
    pub async fn run(&self) -> Result<PipelineReport> {
        let started = Instant::now();
        let source = self.source.source_name();
        info!("Starting pipeline");

        let raw = scrape_all(self.source.as_ref(), self.pages, self.delay).await?;

        let (records, report) = transform(&raw, &self.transform)?;
        println!(
            "[transform] kept {} of {} rows ({} dropped, {} duplicates)",
            report.kept,
            report.input,
            report.dropped(),
            report.duplicates
        );
        counter!("catalog_records_clean_total").increment(report.kept as u64);
        for (reason, count) in report.drop_reasons() {
            if count > 0 {
                counter!("catalog_records_dropped_total", "reason" => reason).increment(count as u64);
            }
        }

        let outcomes = write_all(&self.sinks, &records).await;

        let duration_secs = started.elapsed().as_secs_f64();
        histogram!("catalog_pipeline_duration_seconds").record(duration_secs);
        info!(
            clean = report.kept,
            sinks_failed = outcomes.iter().filter(|o| !o.is_success()).count(),
            "Pipeline finished in {:.1}s",
            duration_secs
        );

        Ok(PipelineReport {
            source: source.to_string(),
            raw_records: raw.len(),
            transform: report,
            sinks: outcomes,
            duration_secs,
        })
    }
}
