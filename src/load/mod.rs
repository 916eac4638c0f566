pub mod csv_file;
pub mod google_sheets;
pub mod postgres;

use std::path::PathBuf;

use async_trait::async_trait;
use metrics::counter;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::LoadError;
use crate::types::CleanRecord;

pub use csv_file::CsvSink;
pub use google_sheets::GoogleSheetsSink;
pub use postgres::PostgresSink;

/// A persistence target for the clean batch. Sinks only read the records.
#[async_trait]
pub trait Sink: Send + Sync {
    fn name(&self) -> &'static str;

    /// Write the whole batch, returning a human-readable description of where it went.
    async fn write(&self, records: &[CleanRecord]) -> Result<String, LoadError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SinkStatus {
    Written { detail: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SinkOutcome {
    pub sink: &'static str,
    #[serde(flatten)]
    pub status: SinkStatus,
}

impl SinkOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, SinkStatus::Written { .. })
    }
}

/// Which sinks a run writes to. The CSV file is always written; the
/// spreadsheet and table sinks are opt-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkSelection {
    pub output: PathBuf,
    pub spreadsheet_id: Option<String>,
    pub credentials: PathBuf,
    pub sheet_range: String,
    pub postgres_table: Option<String>,
    pub database_url: Option<String>,
}

/// Builds the sinks in run order: file, spreadsheet, table.
pub fn build_sinks(selection: &SinkSelection) -> Vec<Box<dyn Sink>> {
    let mut sinks: Vec<Box<dyn Sink>> = vec![Box::new(CsvSink::new(&selection.output))];
    if let Some(id) = selection.spreadsheet_id.as_deref().filter(|id| !id.trim().is_empty()) {
        sinks.push(Box::new(GoogleSheetsSink::new(
            id,
            &selection.credentials,
            selection.sheet_range.as_str(),
        )));
    }
    if let Some(table) = &selection.postgres_table {
        sinks.push(Box::new(PostgresSink::new(
            selection.database_url.clone(),
            table.as_str(),
        )));
    }
    sinks
}

/// Runs every sink in order. A failing sink is logged and recorded; it never
/// stops the sinks after it.
pub async fn write_all(sinks: &[Box<dyn Sink>], records: &[CleanRecord]) -> Vec<SinkOutcome> {
    let mut outcomes = Vec::with_capacity(sinks.len());

    for sink in sinks {
        let name = sink.name();
        let status = match sink.write(records).await {
            Ok(detail) => {
                info!(sink = name, rows = records.len(), "Sink written");
                println!("[load] Saved to {name}: {detail}");
                counter!("catalog_sink_writes_total", "sink" => name, "status" => "ok").increment(1);
                SinkStatus::Written { detail }
            }
            Err(e) => {
                debug!(sink = name, "Sink failed: {}", e);
                println!("[load] warning: failed to save to {name}: {e}");
                counter!("catalog_sink_writes_total", "sink" => name, "status" => "error")
                    .increment(1);
                SinkStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };
        outcomes.push(SinkOutcome { sink: name, status });
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSink {
        name: &'static str,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Sink for CountingSink {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn write(&self, records: &[CleanRecord]) -> Result<String, LoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(LoadError::MissingConnectionString("DATABASE_URL"))
            } else {
                Ok(format!("{} rows", records.len()))
            }
        }
    }

    fn selection() -> SinkSelection {
        SinkSelection {
            output: PathBuf::from("products.csv"),
            spreadsheet_id: None,
            credentials: PathBuf::from("google-sheets-api.json"),
            sheet_range: "Sheet1!A1".into(),
            postgres_table: None,
            database_url: None,
        }
    }

    #[test]
    fn csv_is_always_selected() {
        let names: Vec<_> = build_sinks(&selection()).iter().map(|s| s.name()).collect();
        assert_eq!(names, ["csv"]);
    }

    #[test]
    fn optional_sinks_follow_file_sink() {
        let mut selection = selection();
        selection.spreadsheet_id = Some("sheet".into());
        selection.postgres_table = Some("products".into());

        let names: Vec<_> = build_sinks(&selection).iter().map(|s| s.name()).collect();
        assert_eq!(names, ["csv", "google_sheets", "postgres"]);
    }

    #[test]
    fn blank_spreadsheet_id_is_ignored() {
        let mut selection = selection();
        selection.spreadsheet_id = Some("  ".into());
        assert_eq!(build_sinks(&selection).len(), 1);
    }

    #[tokio::test]
    async fn failing_sink_does_not_stop_later_sinks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sinks: Vec<Box<dyn Sink>> = vec![
            Box::new(CountingSink {
                name: "first",
                fail: true,
                calls: calls.clone(),
            }),
            Box::new(CountingSink {
                name: "second",
                fail: false,
                calls: calls.clone(),
            }),
        ];

        let outcomes = write_all(&sinks, &[]).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!outcomes[0].is_success());
        assert_eq!(
            outcomes[0].status,
            SinkStatus::Failed {
                reason: "DATABASE_URL environment variable not set".into()
            }
        );
        assert_eq!(
            outcomes[1].status,
            SinkStatus::Written { detail: "0 rows".into() }
        );
    }
}
