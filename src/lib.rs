//! # Tabport
//!
//! Extension-driven import, export and conversion of tabular data files.
//!
//! Tabport picks an import or export handler from a file's extension (or an
//! explicit format override) and delegates the actual parsing and writing to
//! format-specific crates. Compressed and archived files (`.gz`, `.zip`,
//! `.tar`), URLs, and the clipboard are handled transparently.
//!
//! ## Features
//!
//! - Case-insensitive extension resolution with compound suffixes (`data.tsv.gz`)
//! - Runtime-extensible format registry (last registration wins)
//! - Uniform per-column metadata regardless of source format
//! - Staged writes: a failed export never leaves a partial file behind
//!
//! ## Example
//!
//! ```rust,ignore
//! use tabport::{Table, Column};
//!
//! let table = Table::new(vec![
//!     Column::integers("a", [Some(1), Some(2)]),
//!     Column::text("b", [Some("x"), Some("y")]),
//! ])?;
//! let path = tabport::export(&table, "t.csv")?;
//! let back = tabport::import(&path)?;
//! assert_eq!(back.column("a").map(|c| c.len()), Some(2));
//!
//! tabport::convert("t.csv", "t.json.gz")?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// Arrow and parquet pull several versions of the same transitive crates.
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod io;
pub mod models;
pub mod observability;

// Re-exports for convenience
pub use config::TabportConfig;
pub use io::{
    Clipboard, ConversionRequest, ConvertService, Direction, ExportOptions, ExportService,
    Exporter, FormatRegistry, FormatTag, HandlerOptions, HandlerPair, ImportOptions,
    ImportService, Importer, SourceSpec,
};
pub use models::{Column, ColumnData, ColumnMeta, NamedTable, Table, TableMeta, TableSet, Value};

/// Reason a source or target could not be resolved to a readable file.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum SourceFailure {
    /// The local file does not exist or is not a regular file.
    #[error("file not found")]
    NotFound,
    /// A remote fetch failed (transport error or non-success status).
    #[error("fetch failed: {0}")]
    Fetch(String),
    /// An archive holds zero or several files and no member was named.
    #[error("archive member ambiguous: archive holds {count} files, name one with a member")]
    AmbiguousArchive {
        /// Number of regular files in the archive.
        count: usize,
    },
    /// The requested archive member does not exist.
    #[error("archive member '{0}' not found")]
    MemberNotFound(String),
    /// The clipboard could not be read or written.
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
    /// Any other I/O failure while staging the source.
    #[error("{0}")]
    Io(String),
}

/// Error type for tabport operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `UnrecognizedFormat` | Extension or tag unknown to both registry and catalog |
/// | `KnownButUnsupported` | Catalog knows the format but no handler is registered |
/// | `HandlerDirectionUnavailable` | Tag registered, but not for import (or export) |
/// | `SourceResolution` | Missing file, failed fetch, ambiguous archive, no clipboard |
/// | `HandlerExecution` | The underlying codec failed while reading or writing |
/// | `InvalidInput` | Malformed tables, bad option values, unsupported targets |
/// | `OperationFailed` | Staging I/O, archive packing, config parsing |
#[derive(Debug, ThisError)]
pub enum Error {
    /// The format could not be recognized.
    ///
    /// Raised when the extension (or explicit format) maps to no registered
    /// handler and to no entry in the format catalog.
    #[error("unrecognized format: {input}")]
    UnrecognizedFormat {
        /// The extension, tag, or file name that failed to resolve.
        input: String,
    },

    /// The format is known but implemented elsewhere.
    ///
    /// Raised when the catalog lists the format (e.g. `accdb`, `xlsx`) but no
    /// handler is registered for it. The guidance names where support lives.
    #[error("format '{format}' is recognized but not supported: {guidance}")]
    KnownButUnsupported {
        /// Canonical format tag.
        format: String,
        /// Which crate or feature would provide support.
        guidance: String,
    },

    /// The format has no handler for the requested direction.
    ///
    /// Raised e.g. when importing from an export-only format such as `html`.
    #[error("no {direction} handler registered for format '{format}'")]
    HandlerDirectionUnavailable {
        /// Canonical format tag.
        format: String,
        /// The direction that was requested.
        direction: Direction,
    },

    /// A source or target could not be resolved.
    ///
    /// Raised when:
    /// - A local file is missing
    /// - A URL fetch fails
    /// - An archive member is ambiguous or missing
    /// - No clipboard provider is configured
    #[error("cannot resolve source '{source_identity}': {reason}")]
    SourceResolution {
        /// Display form of the source (path, URL, `clipboard`).
        source_identity: String,
        /// What went wrong.
        reason: SourceFailure,
    },

    /// A format handler failed while reading or writing.
    ///
    /// The handler's own error is preserved as the error source.
    #[error("{format} handler failed on '{source_identity}': {cause}")]
    HandlerExecution {
        /// Canonical format tag of the handler.
        format: String,
        /// Display form of the file being read or written.
        source_identity: String,
        /// The handler's error.
        #[source]
        cause: Box<Self>,
    },

    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - Columns of a table have differing lengths
    /// - A handler option cannot be parsed
    /// - Several tables are exported to a single-table format
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Filesystem I/O fails while staging files
    /// - Archive packing or unpacking fails
    /// - Codec calls fail inside built-in handlers
    /// - The configuration file cannot be parsed
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Builds an [`Error::OperationFailed`] from any displayable cause.
    pub(crate) fn operation(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for tabport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Imports a table using the shared registry and default configuration.
///
/// # Errors
///
/// Returns an error if the source cannot be resolved, the format is not
/// supported for import, or the handler fails.
pub fn import(source: impl Into<SourceSpec>) -> Result<Table> {
    ImportService::shared().import(&source.into(), &ImportOptions::default())
}

/// Exports a table using the shared registry and default configuration.
///
/// Returns the written location.
///
/// # Errors
///
/// Returns an error if the format is not supported for export or writing fails.
pub fn export(table: &Table, target: impl Into<SourceSpec>) -> Result<PathBuf> {
    ExportService::shared().export(table, &target.into(), &ExportOptions::default())
}

/// Converts a file from one format to another using the shared registry.
///
/// Equivalent to `export(&import(source)?, target)`.
///
/// # Errors
///
/// Returns an error if either direction is unavailable or either step fails.
pub fn convert(source: impl Into<SourceSpec>, target: impl Into<SourceSpec>) -> Result<PathBuf> {
    ConvertService::shared().convert(ConversionRequest::new(source, target))
}
