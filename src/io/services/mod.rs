//! Import, export and convert services.
//!
//! Each service owns an `Arc` of the registry and a [`SourceLocator`], so
//! several services can share one registry while carrying their own
//! clipboard provider or HTTP settings.
//!
//! [`SourceLocator`]: crate::io::SourceLocator

pub mod convert;
pub mod export;
pub mod import;

pub use convert::{ConversionRequest, ConvertService};
pub use export::{ExportOptions, ExportService};
pub use import::{ImportOptions, ImportService};

use crate::config::TabportConfig;
use crate::io::source::{RemoteFetcher, SourceLocator};
use crate::io::traits::HandlerOptions;

/// Builds a locator from configuration.
pub(crate) fn locator_from_config(config: &TabportConfig) -> SourceLocator {
    SourceLocator::new(config.resolver(), RemoteFetcher::new(&config.http))
}

/// Copies `options`, filling `na` from the configured defaults when absent.
///
/// An empty default list is passed as an empty `na`, which turns markers off.
pub(crate) fn with_default_na(options: &HandlerOptions, na: &[String]) -> HandlerOptions {
    let mut merged = options.clone();
    if merged.get("na").is_none() {
        let joined = match na {
            [only] if only.is_empty() => ",".to_string(),
            _ => na.join(","),
        };
        merged.set("na", joined);
    }
    merged
}

/// Status label for operation counters.
pub(crate) const fn status_label<T>(result: &crate::Result<T>) -> &'static str {
    if result.is_ok() { "success" } else { "error" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_na_only_fills_missing() {
        let defaults = vec![String::new(), "NA".to_string()];
        let filled = with_default_na(&HandlerOptions::new(), &defaults);
        assert_eq!(filled.get("na"), Some(",NA"));

        let explicit = HandlerOptions::new().with("na", "-");
        assert_eq!(with_default_na(&explicit, &defaults).get("na"), Some("-"));
    }

    #[test]
    fn test_empty_default_na_turns_markers_off() {
        let none = with_default_na(&HandlerOptions::new(), &[]);
        assert_eq!(none.get("na"), Some(""));

        let blank_only = with_default_na(&HandlerOptions::new(), &[String::new()]);
        assert_eq!(blank_only.list("na"), Some(vec![String::new(), String::new()]));
    }
}
