//! Region catalog
//!
//! [`RegionCatalog`] is the immutable result of one load: the URL that was
//! requested, what happened at the HTTP level, and the canonical table when
//! everything went well. Load failures never escape as errors; they are
//! recorded in [`FetchStatus`] and the table is left absent.

use crate::client::{FetchOptions, HttpFetcher, PageFetcher};
use crate::decode::decode_body;
use crate::error::{CatalogError, FetchError, TableError};
use crate::extract::extract_first_table;
use crate::matcher::{FuzzyMatcher, MatchReport};
use crate::normalize::normalize_with_columns;
use crate::similarity::SimilarityMetric;
use crate::table::CanonicalTable;
use crate::DEFAULT_URL;
use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Number of rows shown in the summary preview
const PREVIEW_ROWS: usize = 5;

/// Outcome of the request that produced a catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchStatus {
    /// HTTP status code, absent when no response was received
    pub http_status: Option<u16>,
    /// Description of what went wrong, if anything
    pub error: Option<String>,
}

/// Loaded reference table plus the status of the load
#[derive(Debug, Clone, Serialize)]
pub struct RegionCatalog {
    url: String,
    status: FetchStatus,
    table: Option<CanonicalTable>,
}

impl RegionCatalog {
    /// Load the catalog from `url` with default options
    pub async fn load(url: impl Into<String>) -> Self {
        Self::builder().url(url).load().await
    }

    /// Create a new catalog builder
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// Build a catalog from an already retrieved HTML document
    pub fn from_html(url: impl Into<String>, html: &str) -> Self {
        Self::builder().url(url).from_html(html)
    }

    /// URL the catalog was requested from
    pub fn url(&self) -> &str {
        &self.url
    }

    /// HTTP status and error of the load
    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    /// The canonical table, absent if the load failed
    pub fn table(&self) -> Option<&CanonicalTable> {
        self.table.as_ref()
    }

    /// Matcher over the distinct values of `column`
    pub fn matcher(&self, column: &str) -> Result<FuzzyMatcher<'_>, CatalogError> {
        let references = self.reference_values(column)?;
        Ok(FuzzyMatcher::new(references))
    }

    /// Matcher over the distinct values of `column` with a custom metric
    pub fn matcher_with_metric<'a>(
        &'a self,
        column: &str,
        metric: Box<dyn SimilarityMetric + 'a>,
    ) -> Result<FuzzyMatcher<'a>, CatalogError> {
        let references = self.reference_values(column)?;
        Ok(FuzzyMatcher::with_metric(references, metric))
    }

    /// Map noisy values onto the canonical values of `column`
    ///
    /// The result has one value per input, in order. Inputs whose best
    /// match scores under `threshold` are returned unchanged and reported
    /// in [`MatchReport::diagnostics`].
    pub fn normalize_values<S: AsRef<str>>(
        &self,
        column: &str,
        dirty: &[S],
        threshold: f64,
    ) -> Result<MatchReport, CatalogError> {
        if !(0.0..=100.0).contains(&threshold) {
            return Err(CatalogError::InvalidThreshold(threshold));
        }
        Ok(self.matcher(column)?.match_values(dirty, threshold))
    }

    fn reference_values(&self, column: &str) -> Result<Vec<&str>, CatalogError> {
        let table = self.table.as_ref().ok_or_else(|| {
            CatalogError::TableUnavailable(
                self.status
                    .error
                    .clone()
                    .unwrap_or_else(|| "no table loaded".to_string()),
            )
        })?;
        table
            .unique_values(column)
            .ok_or_else(|| CatalogError::ColumnNotFound(column.to_string()))
    }

    fn failed(url: String, http_status: Option<u16>, error: String) -> Self {
        warn!(url = %url, http_status = ?http_status, error = %error, "Catalog load failed");
        Self {
            url,
            status: FetchStatus {
                http_status,
                error: Some(error),
            },
            table: None,
        }
    }
}

impl fmt::Display for RegionCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Request")?;
        writeln!(f, "----------")?;
        writeln!(f, "URL: {}", self.url)?;
        match self.status.http_status {
            Some(code) => writeln!(f, "HTTP status: {}", code)?,
            None => writeln!(f, "HTTP status: -")?,
        }
        writeln!(
            f,
            "Error: {}",
            self.status.error.as_deref().unwrap_or("none")
        )?;
        writeln!(f)?;
        writeln!(f, "Table")?;
        writeln!(f, "----------")?;

        let Some(table) = &self.table else {
            return writeln!(f, "(no table loaded)");
        };
        writeln!(
            f,
            "Columns ({}): {}",
            table.columns().len(),
            table.columns().join(", ")
        )?;
        writeln!(f, "Rows: {}", table.len())?;
        writeln!(f)?;
        write!(f, "{}", format_preview(table, PREVIEW_ROWS))
    }
}

/// First `limit` rows as an aligned text grid
fn format_preview(table: &CanonicalTable, limit: usize) -> String {
    let shown = &table.rows()[..table.len().min(limit)];
    let widths: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            shown
                .iter()
                .map(|row| row[i].chars().count())
                .fold(name.chars().count(), usize::max)
        })
        .collect();

    let mut output = String::new();
    let mut push_line = |cells: &[String]| {
        let line: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{}{}", cell, " ".repeat(w - cell.chars().count())))
            .collect();
        output.push_str(line.join("  ").trim_end());
        output.push('\n');
    };

    push_line(table.columns());
    for row in shown {
        push_line(row);
    }
    if table.len() > limit {
        output.push_str(&format!("... {} more rows\n", table.len() - limit));
    }
    output
}

/// Error text including its source chain
fn describe(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Builder for loading a [`RegionCatalog`]
pub struct CatalogBuilder {
    url: String,
    options: FetchOptions,
    column_names: Option<Vec<String>>,
    fetcher: Box<dyn PageFetcher>,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogBuilder {
    /// Builder pointing at the INE page with default options
    pub fn new() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            options: FetchOptions::default(),
            column_names: None,
            fetcher: Box::new(HttpFetcher::new()),
        }
    }

    /// Set the page URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.options.user_agent = Some(ua.into());
        self
    }

    /// Set connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    /// Set whole-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.options.request_timeout = timeout;
        self
    }

    /// Set maximum body size
    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.options.max_bytes = max_bytes;
        self
    }

    /// Use custom column names instead of the defaults
    pub fn column_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.column_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the HTTP fetcher
    pub fn fetcher(mut self, fetcher: Box<dyn PageFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Fetch, decode, extract and normalize
    pub async fn load(self) -> RegionCatalog {
        debug!(fetcher = self.fetcher.name(), url = %self.url, "Loading catalog");

        let page = match self.fetcher.fetch(&self.url, &self.options).await {
            Ok(page) => page,
            Err(e) => return RegionCatalog::failed(self.url, None, describe(&e)),
        };

        let status = page.status_code;
        if !(200..300).contains(&status) {
            let err = FetchError::HttpStatus(status);
            return RegionCatalog::failed(self.url, Some(status), err.to_string());
        }

        match decode_body(&page.body, page.content_type.as_deref()) {
            Ok(html) => self.build(Some(status), &html),
            Err(e) => RegionCatalog::failed(self.url, Some(status), describe(&e)),
        }
    }

    /// Run extraction and normalization on an already retrieved document
    pub fn from_html(self, html: &str) -> RegionCatalog {
        self.build(None, html)
    }

    fn build(self, http_status: Option<u16>, html: &str) -> RegionCatalog {
        match self.table_from_html(html) {
            Ok(table) => {
                debug!(rows = table.len(), url = %self.url, "Catalog loaded");
                RegionCatalog {
                    url: self.url,
                    status: FetchStatus {
                        http_status,
                        error: None,
                    },
                    table: Some(table),
                }
            }
            Err(e) => RegionCatalog::failed(self.url, http_status, e.to_string()),
        }
    }

    fn table_from_html(&self, html: &str) -> Result<CanonicalTable, TableError> {
        let raw = extract_first_table(html)?;
        normalize_with_columns(&raw, self.column_names.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FetchedPage;
    use async_trait::async_trait;
    use bytes::Bytes;

    const PAGE: &str = r#"<html><body>
        <table>
          <tr><th>CODIGO</th><th>CCAA</th><th>CODIGO</th><th>PROVINCIA</th></tr>
          <tr><td>1</td><td>Andalucía</td><td>4</td><td>Almería</td></tr>
          <tr><td></td><td>Andalucía</td><td>11</td><td>Cádiz</td></tr>
          <tr><td>2</td><td>Aragón</td><td>22</td><td>Huesca</td></tr>
          <tr><td>9</td><td>Cataluña</td><td>8</td><td>Barcelona</td></tr>
          <tr><td>18</td><td>Ciudad Autónoma de Ceuta</td><td>51</td><td>Ceuta</td></tr>
        </table></body></html>"#;

    struct StubFetcher {
        status: u16,
        body: &'static str,
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn fetch(&self, _url: &str, _options: &FetchOptions) -> Result<FetchedPage, FetchError> {
            Ok(FetchedPage {
                status_code: self.status,
                content_type: Some("text/html; charset=utf-8".to_string()),
                body: Bytes::from_static(self.body.as_bytes()),
            })
        }
    }

    struct DownFetcher;

    #[async_trait]
    impl PageFetcher for DownFetcher {
        fn name(&self) -> &'static str {
            "down"
        }

        async fn fetch(&self, _url: &str, _options: &FetchOptions) -> Result<FetchedPage, FetchError> {
            Err(FetchError::Timeout)
        }
    }

    #[test]
    fn test_from_html_builds_table() {
        let catalog = RegionCatalog::from_html("https://example.com", PAGE);
        let table = catalog.table().unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.get(0, "id_region"), Some("01"));
        assert_eq!(table.get(1, "id_region"), Some(""));
        assert_eq!(table.get(3, "id_region"), Some("09"));
        assert_eq!(catalog.status(), &FetchStatus::default());
    }

    #[test]
    fn test_zero_padded_codes_preserved() {
        let html = r#"<table>
            <tr><td>01</td><td>Andalucía</td><td>04</td><td>Almería</td></tr>
            <tr><td></td><td>Andalucía</td><td>11</td><td>Cádiz</td></tr>
            <tr><td>02</td><td>Aragón</td><td>22</td><td>Huesca</td></tr>
            <tr><td>09</td><td>Cataluña</td><td>08</td><td>Barcelona</td></tr>
        </table>"#;
        let catalog = RegionCatalog::from_html("https://example.com", html);
        let table = catalog.table().unwrap();
        assert_eq!(table.get(0, "id_region"), Some("01"));
        assert_eq!(table.get(1, "id_region"), Some(""));
        assert_eq!(table.get(0, "id_subregion"), Some("04"));
        assert_eq!(table.get(1, "id_subregion"), Some("11"));
        assert_eq!(table.get(3, "id_region"), Some("09"));
        assert_eq!(table.get(3, "id_subregion"), Some("08"));
    }

    #[test]
    fn test_from_html_without_table_records_error() {
        let catalog = RegionCatalog::from_html("https://example.com", "<p>moved</p>");
        assert!(catalog.table().is_none());
        assert_eq!(catalog.status().error.as_deref(), Some("No table found in document"));
    }

    #[test]
    fn test_custom_column_names_mismatch_recorded() {
        let catalog = RegionCatalog::builder()
            .column_names(["a", "b"])
            .from_html(PAGE);
        assert!(catalog.table().is_none());
        assert!(catalog
            .status()
            .error
            .as_deref()
            .unwrap()
            .contains("Schema mismatch"));
    }

    #[test]
    fn test_custom_column_names() {
        let catalog = RegionCatalog::builder()
            .column_names(["id_ccaa", "ccaa", "id_prov", "prov"])
            .from_html(PAGE);
        let report = catalog
            .normalize_values("prov", &["almeria", "cadiz"], 85.0)
            .unwrap();
        assert_eq!(report.values, vec!["Almería", "Cádiz"]);
    }

    #[test]
    fn test_normalize_values_end_to_end() {
        let catalog = RegionCatalog::from_html("https://example.com", PAGE);
        let report = catalog
            .normalize_values("region", &["andalucia", "aragon", "xyz123"], 85.0)
            .unwrap();
        assert_eq!(report.values, vec!["Andalucía", "Aragón", "xyz123"]);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].index, 2);
    }

    #[test]
    fn test_unknown_column_fails_fast() {
        let catalog = RegionCatalog::from_html("https://example.com", PAGE);
        assert_eq!(
            catalog.normalize_values("province", &["x"], 85.0).unwrap_err(),
            CatalogError::ColumnNotFound("province".to_string())
        );
    }

    #[test]
    fn test_invalid_threshold() {
        let catalog = RegionCatalog::from_html("https://example.com", PAGE);
        assert_eq!(
            catalog.normalize_values("region", &["x"], 101.0).unwrap_err(),
            CatalogError::InvalidThreshold(101.0)
        );
    }

    #[test]
    fn test_matching_without_table() {
        let catalog = RegionCatalog::from_html("https://example.com", "");
        assert!(matches!(
            catalog.normalize_values("region", &["x"], 85.0),
            Err(CatalogError::TableUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_load_with_stub_fetcher() {
        let catalog = RegionCatalog::builder()
            .fetcher(Box::new(StubFetcher {
                status: 200,
                body: PAGE,
            }))
            .load()
            .await;
        assert_eq!(catalog.url(), DEFAULT_URL);
        assert_eq!(catalog.status().http_status, Some(200));
        assert!(catalog.status().error.is_none());
        assert_eq!(catalog.table().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_load_http_error_status() {
        let catalog = RegionCatalog::builder()
            .fetcher(Box::new(StubFetcher {
                status: 503,
                body: PAGE,
            }))
            .load()
            .await;
        assert!(catalog.table().is_none());
        assert_eq!(catalog.status().http_status, Some(503));
        let error = catalog.status().error.as_deref().unwrap();
        assert!(error.contains("503"));
        assert!(error.contains("URL"));
    }

    #[tokio::test]
    async fn test_load_transport_error() {
        let catalog = RegionCatalog::builder()
            .fetcher(Box::new(DownFetcher))
            .load()
            .await;
        assert!(catalog.table().is_none());
        assert_eq!(catalog.status().http_status, None);
        assert_eq!(catalog.status().error.as_deref(), Some("Request timed out"));
    }

    #[test]
    fn test_summary_with_table() {
        let catalog = RegionCatalog::from_html("https://example.com/page", PAGE);
        let summary = catalog.to_string();
        assert!(summary.contains("URL: https://example.com/page"));
        assert!(summary.contains("HTTP status: -"));
        assert!(summary.contains("Error: none"));
        assert!(summary.contains("Columns (4): id_region, region, id_subregion, subregion"));
        assert!(summary.contains("Rows: 4"));
        assert!(summary.contains("Andalucía"));
    }

    #[test]
    fn test_summary_without_table() {
        let catalog = RegionCatalog::from_html("https://example.com/page", "");
        let summary = catalog.to_string();
        assert!(summary.contains("(no table loaded)"));
        assert!(summary.contains("Error: No table found in document"));
    }

    #[test]
    fn test_preview_limits_rows() {
        let rows: Vec<Vec<String>> = (0..8).map(|i| vec![format!("{:02}", i)]).collect();
        let table = CanonicalTable::new(vec!["code".to_string()], rows);
        let preview = format_preview(&table, 5);
        assert_eq!(preview.lines().count(), 7);
        assert!(preview.ends_with("... 3 more rows\n"));
    }

    #[test]
    fn test_describe_includes_source() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "inner");
        let outer = WrappedError(err);
        assert_eq!(describe(&outer), "outer: inner");
    }

    #[derive(Debug)]
    struct WrappedError(std::io::Error);

    impl fmt::Display for WrappedError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "outer")
        }
    }

    impl StdError for WrappedError {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }
}
