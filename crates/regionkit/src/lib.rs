//! RegionKit - INE autonomous community / province code catalog
//!
//! This crate fetches the INE reference page that maps Spanish autonomous
//! communities to provinces, turns its first table into a clean
//! [`CanonicalTable`], and reconciles noisy free-text names against it.
//!
//! ## Pipeline
//!
//! 1. [`PageFetcher`] retrieves the page ([`HttpFetcher`] by default)
//! 2. The body is decoded to UTF-8 honoring the declared charset
//! 3. [`extract_first_table`] turns the first `<table>` into a [`RawTable`]
//! 4. [`normalize`] names the columns, drops autonomous-city rows, repairs
//!    float-formatted codes and coerces every cell to text
//!
//! [`RegionCatalog`] owns the result. Matching is done with
//! [`RegionCatalog::normalize_values`], backed by [`FuzzyMatcher`].
//!
//! ```no_run
//! # async fn run() {
//! let catalog = regionkit::RegionCatalog::load(regionkit::DEFAULT_URL).await;
//! if let Ok(report) = catalog.normalize_values("subregion", &["Valensia"], 85.0) {
//!     println!("{:?}", report.values);
//! }
//! # }
//! ```

pub mod catalog;
pub mod client;
mod decode;
mod error;
mod extract;
pub mod matcher;
mod normalize;
pub mod similarity;
mod table;

pub use catalog::{CatalogBuilder, FetchStatus, RegionCatalog};
pub use client::{FetchOptions, FetchedPage, HttpFetcher, PageFetcher};
pub use decode::decode_body;
pub use error::{CatalogError, FetchError, TableError};
pub use extract::extract_first_table;
pub use matcher::{
    FallbackReason, FuzzyMatcher, MatchDiagnostic, MatchReport, MatchResult, DEFAULT_THRESHOLD,
};
pub use normalize::{
    normalize, normalize_with_columns, CODE_WIDTH, DEFAULT_COLUMN_NAMES, EXCLUDED_ROW_KEYWORD,
};
pub use similarity::{similarity, IndelRatio, SimilarityMetric};
pub use table::{CanonicalTable, RawCell, RawTable};

/// INE page with the autonomous community / province code table
pub const DEFAULT_URL: &str = "https://ine.es/daco/daco42/codmun/cod_ccaa_provincia.htm";

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = "RegionKit/0.1";
