//! Import, export and conversion of tabular files.
//!
//! # Architecture
//!
//! - **Resolver** maps a file name (or explicit format) to a [`FormatTag`]
//!   plus an optional [`Compression`] wrapper
//! - **Registry** maps tags to [`Importer`] / [`Exporter`] handlers
//! - **Locator** stages paths, URLs, archives and the clipboard as local files
//! - **Services** run the handlers and normalize their output
//!
//! # Built-in Formats
//!
//! | Format | Import | Export | Notes |
//! |--------|--------|--------|-------|
//! | csv / tsv / psv | ✓ | ✓ | Delimiter configurable via `delimiter` |
//! | json | ✓ | ✓ | Records, columns or NDJSON |
//! | yaml | ✓ | ✓ | Sequence of mappings or document stream |
//! | fwf | ✓ | ✓ | Widths inferred from the header |
//! | html | - | ✓ | One section per table |
//! | parquet | ✓ | ✓ | Requires the `parquet` feature |
//! | feather | ✓ | ✓ | Requires the `feather` feature |
//!
//! # Examples
//!
//! ```rust,ignore
//! use tabport::io::{ConversionRequest, ConvertService};
//!
//! let written = ConvertService::shared()
//!     .convert(ConversionRequest::new("https://example.org/t.csv", "t.parquet"))?;
//! println!("{}", written.display());
//! ```

pub mod catalog;
pub mod formats;
pub mod registry;
pub mod resolver;
pub mod services;
pub mod source;
pub mod traits;

// Re-exports for convenience
pub use registry::{Direction, FormatRegistry, HandlerPair};
pub use resolver::{Compression, ExtensionResolver, FormatTag, Resolved};
pub use services::convert::{ConversionRequest, ConvertService};
pub use services::export::{ExportOptions, ExportService};
pub use services::import::{ImportOptions, ImportService};
pub use source::{
    Clipboard, LocatedSource, Location, MemoryClipboard, SourceLocator, SourceSpec, StagedTarget,
};
#[cfg(feature = "system-clipboard")]
pub use source::SystemClipboard;
pub use traits::{Exporter, HandlerOptions, Importer};
