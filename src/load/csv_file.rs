use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::instrument;

use crate::constants::CSV_SINK;
use crate::error::LoadError;
use crate::load::Sink;
use crate::types::CleanRecord;

/// Writes the batch as CSV with a header row and no index column,
/// replacing any existing file.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Synchronous core of the CSV sink; returns the path written.
pub fn save_csv(records: &[CleanRecord], path: &Path) -> Result<PathBuf, LoadError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(crate::types::Column::header())?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(path.to_path_buf())
}

#[async_trait]
impl Sink for CsvSink {
    fn name(&self) -> &'static str {
        CSV_SINK
    }

    #[instrument(skip(self, records), fields(path = %self.path.display(), rows = records.len()))]
    async fn write(&self, records: &[CleanRecord]) -> Result<String, LoadError> {
        let written = save_csv(records, &self.path)?;
        Ok(written.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(title: &str, timestamp: Option<&str>) -> CleanRecord {
        CleanRecord {
            title: title.into(),
            price: 160_000,
            rating: 4.5,
            colors: 3,
            size: "M".into(),
            gender: "Unisex".into(),
            timestamp: timestamp.map(str::to_string),
        }
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("products.csv");

        save_csv(
            &[record("T-Shirt A", Some("2025-01-01T00:00:00")), record("Pants, Cargo", None)],
            &path,
        )
        .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "Title,Price,Rating,Colors,Size,Gender,timestamp");
        assert_eq!(lines[1], "T-Shirt A,160000,4.5,3,M,Unisex,2025-01-01T00:00:00");
        assert_eq!(lines[2], "\"Pants, Cargo\",160000,4.5,3,M,Unisex,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn empty_batch_still_gets_a_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        save_csv(&[], &path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap().trim_end(),
            "Title,Price,Rating,Colors,Size,Gender,timestamp"
        );
    }

    #[tokio::test]
    async fn overwrites_and_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out/products.csv");
        let sink = CsvSink::new(&path);

        sink.write(&[record("A", None), record("B", None)]).await.unwrap();
        let detail = sink.write(&[record("C", None)]).await.unwrap();

        assert_eq!(detail, path.display().to_string());
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("C,160000"));
    }
}
