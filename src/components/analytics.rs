//! Analytical column-store component (ClickHouse over its HTTP interface).
//!
//! # Design Decisions
//! - Talks to the HTTP interface through reqwest instead of a native
//!   protocol client; queries and inserts use JSONEachRow, which keeps
//!   the wire format inspectable
//! - Multiple nodes are dispatched round-robin; startup pings them all

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::schema::ClickHouseSettings;
use crate::lifecycle::{BoxError, Component};

/// Errors from column-store operations.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("clickhouse component is not started")]
    NotStarted,

    #[error("clickhouse request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("clickhouse returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("failed to decode clickhouse response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// ClickHouse client with round-robin node dispatch.
pub struct ClickHouseComponent {
    settings: ClickHouseSettings,
    client: ArcSwapOption<reqwest::Client>,
    cursor: AtomicUsize,
}

impl ClickHouseComponent {
    pub fn new(settings: ClickHouseSettings) -> Self {
        Self {
            settings,
            client: ArcSwapOption::empty(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Run a statement that returns no rows (DDL, mutations).
    pub async fn execute(&self, sql: &str) -> Result<(), AnalyticsError> {
        self.post(sql.to_string()).await.map(|_| ())
    }

    /// Run a SELECT, returning one JSON object per row.
    pub async fn query_json(&self, sql: &str) -> Result<Vec<Value>, AnalyticsError> {
        let body = self.post(format_select(sql)).await?;
        parse_rows(&body)
    }

    /// Insert a batch of rows encoded as JSON objects.
    pub async fn insert_rows(&self, table: &str, rows: &[Value]) -> Result<(), AnalyticsError> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut body = String::new();
        for row in rows {
            body.push_str(&row.to_string());
            body.push('\n');
        }

        let client = self.client()?;
        let response = client
            .post(self.node())
            .query(&[
                ("database", self.settings.database.as_str()),
                (
                    "query",
                    &format!("INSERT INTO {table} FORMAT JSONEachRow"),
                ),
            ])
            .basic_auth(&self.settings.username, Some(&self.settings.password))
            .body(body)
            .send()
            .await?;
        Self::check(response).await.map(|_| ())
    }

    fn client(&self) -> Result<reqwest::Client, AnalyticsError> {
        self.client
            .load_full()
            .map(|client| (*client).clone())
            .ok_or(AnalyticsError::NotStarted)
    }

    /// Next node, rotating across the configured URLs.
    fn node(&self) -> &str {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.settings.urls.len();
        &self.settings.urls[index]
    }

    async fn post(&self, sql: String) -> Result<String, AnalyticsError> {
        let client = self.client()?;
        let mut request = client
            .post(self.node())
            .query(&[("database", self.settings.database.as_str())])
            .basic_auth(&self.settings.username, Some(&self.settings.password));
        if self.settings.compression {
            request = request.query(&[("enable_http_compression", "1")]);
        }

        let response = request.body(sql).send().await?;
        Self::check(response).await
    }

    async fn check(response: reqwest::Response) -> Result<String, AnalyticsError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AnalyticsError::Server {
                status: status.as_u16(),
                message: body.trim().to_string(),
            });
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl Component for ClickHouseComponent {
    async fn start(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        if self.settings.urls.is_empty() {
            return Err("no clickhouse nodes configured".into());
        }

        let client = reqwest::Client::builder()
            .timeout(self.settings.timeout())
            .build()?;

        for url in &self.settings.urls {
            let response = client
                .get(format!("{}/ping", url.trim_end_matches('/')))
                .send()
                .await
                .map_err(|error| format!("clickhouse node {url} unreachable: {error}"))?;
            if !response.status().is_success() {
                return Err(format!(
                    "clickhouse node {url} ping returned {}",
                    response.status()
                )
                .into());
            }
        }

        self.client.store(Some(Arc::new(client)));
        tracing::info!(
            nodes = self.settings.urls.len(),
            database = %self.settings.database,
            "clickhouse connected"
        );
        Ok(())
    }

    async fn stop(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        self.client.store(None);
        tracing::info!("clickhouse client released");
        Ok(())
    }
}

/// Append the row format unless the statement already names one.
fn format_select(sql: &str) -> String {
    let trimmed = sql.trim_end_matches([' ', ';', '\n']);
    if trimmed.to_ascii_uppercase().contains(" FORMAT ") {
        trimmed.to_string()
    } else {
        format!("{trimmed} FORMAT JSONEachRow")
    }
}

fn parse_rows(body: &str) -> Result<Vec<Value>, AnalyticsError> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(AnalyticsError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_gets_row_format_appended() {
        assert_eq!(
            format_select("SELECT 1;"),
            "SELECT 1 FORMAT JSONEachRow"
        );
        assert_eq!(
            format_select("SELECT * FROM t FORMAT CSV"),
            "SELECT * FROM t FORMAT CSV"
        );
    }

    #[test]
    fn rows_parse_line_by_line() {
        let rows = parse_rows("{\"a\":1}\n{\"a\":2}\n\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["a"], 2);
    }

    #[test]
    fn operations_fail_before_start() {
        let component = ClickHouseComponent::new(ClickHouseSettings::default());
        assert!(matches!(
            component.client().unwrap_err(),
            AnalyticsError::NotStarted
        ));
    }
}
