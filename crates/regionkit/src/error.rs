//! Error types for RegionKit

use thiserror::Error;

/// Errors that can occur while retrieving the source page
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL could not be parsed or has a non-HTTP scheme
    #[error("Invalid URL: must be an absolute http:// or https:// URL")]
    InvalidUrl,

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuildError(#[source] reqwest::Error),

    /// Connect or whole-request timeout elapsed
    #[error("Request timed out")]
    Timeout,

    /// Failed to connect to server
    #[error("Failed to connect to server")]
    ConnectError(#[source] reqwest::Error),

    /// Server answered with a non-success status
    #[error(
        "HTTP GET request failed with status {0}. Check that the catalog URL points to a valid page"
    )]
    HttpStatus(u16),

    /// Body exceeded the configured size cap
    #[error("Response too large: more than {max_bytes} bytes")]
    TooLarge {
        /// Configured limit
        max_bytes: u64,
    },

    /// Body could not be decoded to text
    #[error("Failed to decode response body as {encoding}")]
    Decode {
        /// Encoding that was attempted
        encoding: String,
    },

    /// Other request error
    #[error("Request failed: {0}")]
    RequestError(String),
}

impl FetchError {
    /// Create an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::ConnectError(err)
        } else {
            FetchError::RequestError(err.to_string())
        }
    }
}

/// Errors raised while turning a document into a canonical table
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// The document has no `<table>` element
    #[error("No table found in document")]
    NoTable,

    /// The first table has no cells
    #[error("Table has no columns")]
    Empty,

    /// Column names do not match the table width
    #[error("Schema mismatch: {expected} column names given for a table with {actual} columns")]
    SchemaMismatch {
        /// Number of names supplied
        expected: usize,
        /// Number of columns in the table
        actual: usize,
    },

    /// The same column name was supplied twice
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),
}

/// Errors returned by catalog queries
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    /// The catalog failed to load, so there is nothing to match against
    #[error("Reference table unavailable: {0}")]
    TableUnavailable(String),

    /// Requested reference column is absent
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Similarity threshold outside [0, 100]
    #[error("Invalid threshold {0}: must be between 0 and 100")]
    InvalidThreshold(f64),
}
