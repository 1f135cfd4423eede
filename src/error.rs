//! Error taxonomy for the slip engine.
//!
//! User-visible failures carry short human-readable messages; diagnostic
//! detail (per-order fetch errors, HTTP bodies) goes to the log instead.
//! Per-order line-item failures never surface here — consolidation skips
//! the order and keeps going.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlipError {
    /// The configured dashboard base URL could not be turned into a client.
    #[error("Invalid admin dashboard URL: {0}")]
    InvalidBaseUrl(String),

    /// Transport-level failure (connect, timeout, TLS).
    #[error("{message}")]
    Http { url: String, message: String },

    /// The dashboard answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The dashboard answered 2xx but the body was not the expected shape.
    #[error("Invalid response from admin dashboard: {0}")]
    Decode(String),

    /// No route yielded any consolidatable products; there is no workbook
    /// to build. Distinct from success on purpose.
    #[error("Nothing to export for the selected orders")]
    NothingToExport,

    /// XLSX container serialization failed.
    #[error("Workbook write failed: {0}")]
    Workbook(String),
}
