use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Postgres, QueryBuilder};
use tracing::{info, instrument};

use crate::constants::{ENV_DATABASE_URL, POSTGRES_SINK};
use crate::error::LoadError;
use crate::load::Sink;
use crate::types::{CleanRecord, Column};

static TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Rows per INSERT statement; 7 bind parameters each keeps us far below the
/// Postgres limit of 65535.
const INSERT_CHUNK: usize = 1000;

/// Replaces the contents of a Postgres table with the batch.
pub struct PostgresSink {
    database_url: Option<String>,
    table: String,
}

impl PostgresSink {
    pub fn new(database_url: Option<String>, table: impl Into<String>) -> Self {
        Self {
            database_url: database_url.filter(|url| !url.trim().is_empty()),
            table: table.into(),
        }
    }

    fn quoted_table(&self) -> Result<String, LoadError> {
        if !TABLE_NAME_RE.is_match(&self.table) {
            return Err(LoadError::InvalidTableName(self.table.clone()));
        }
        Ok(format!("\"{}\"", self.table))
    }
}

fn column_type(column: Column) -> &'static str {
    match column {
        Column::Price | Column::Colors => "BIGINT",
        Column::Rating => "DOUBLE PRECISION",
        Column::Title | Column::Size | Column::Gender | Column::Timestamp => "TEXT",
    }
}

pub fn create_table_sql(quoted_table: &str) -> String {
    let columns = Column::CANONICAL
        .iter()
        .map(|c| format!("\"{}\" {}", c.name(), column_type(*c)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {quoted_table} ({columns})")
}

fn insert_prefix(quoted_table: &str) -> String {
    let columns = Column::CANONICAL
        .iter()
        .map(|c| format!("\"{}\"", c.name()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {quoted_table} ({columns}) ")
}

#[async_trait]
impl Sink for PostgresSink {
    fn name(&self) -> &'static str {
        POSTGRES_SINK
    }

    #[instrument(skip(self, records), fields(table = %self.table, rows = records.len()))]
    async fn write(&self, records: &[CleanRecord]) -> Result<String, LoadError> {
        let url = self
            .database_url
            .as_deref()
            .ok_or(LoadError::MissingConnectionString(ENV_DATABASE_URL))?;
        let table = self.quoted_table()?;

        let pool = PgPoolOptions::new().max_connections(1).connect(url).await?;
        let mut tx = pool.begin().await?;

        sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&create_table_sql(&table))
            .execute(&mut *tx)
            .await?;

        for chunk in records.chunks(INSERT_CHUNK) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(insert_prefix(&table));
            builder.push_values(chunk, |mut row, record| {
                row.push_bind(&record.title)
                    .push_bind(record.price)
                    .push_bind(record.rating)
                    .push_bind(record.colors)
                    .push_bind(&record.size)
                    .push_bind(&record.gender)
                    .push_bind(&record.timestamp);
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        pool.close().await;

        info!("Replaced table contents");
        Ok(format!("{} rows into {}", records.len(), self.table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_connection_string_is_a_load_error() {
        let sink = PostgresSink::new(None, "products");
        let err = sink.write(&[]).await.unwrap_err();
        assert!(matches!(err, LoadError::MissingConnectionString("DATABASE_URL")));
    }

    #[tokio::test]
    async fn blank_connection_string_counts_as_missing() {
        let sink = PostgresSink::new(Some("  ".into()), "products");
        assert!(matches!(
            sink.write(&[]).await,
            Err(LoadError::MissingConnectionString(_))
        ));
    }

    #[tokio::test]
    async fn table_names_are_validated_before_connecting() {
        let sink = PostgresSink::new(
            Some("postgres://localhost/unused".into()),
            "products; DROP TABLE users",
        );
        assert!(matches!(
            sink.write(&[]).await,
            Err(LoadError::InvalidTableName(_))
        ));
    }

    #[test]
    fn create_table_uses_canonical_columns() {
        assert_eq!(
            create_table_sql("\"products\""),
            "CREATE TABLE \"products\" (\"Title\" TEXT, \"Price\" BIGINT, \"Rating\" DOUBLE PRECISION, \
             \"Colors\" BIGINT, \"Size\" TEXT, \"Gender\" TEXT, \"timestamp\" TEXT)"
        );
    }
}
