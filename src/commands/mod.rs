//! Command handlers for the `tabport` binary.
//!
//! - `io.rs`: `convert` and `inspect`
//! - `formats.rs`: the format listing

mod formats;
mod io;

pub use formats::cmd_formats;
pub use io::{cmd_convert, cmd_inspect};

use std::sync::Arc;
use tabport::{Clipboard, HandlerOptions, Result};

/// Parses repeated `key=value` arguments into handler options.
fn parse_options(pairs: &[String]) -> Result<HandlerOptions> {
    pairs
        .iter()
        .map(|pair| HandlerOptions::parse_pair(pair))
        .collect()
}

/// Clipboard provider for `clipboard` sources and targets.
#[cfg(feature = "system-clipboard")]
#[allow(clippy::unnecessary_wraps)]
fn clipboard_provider() -> Option<Arc<dyn Clipboard>> {
    Some(Arc::new(tabport::io::SystemClipboard::new()))
}

/// Clipboard provider for `clipboard` sources and targets.
#[cfg(not(feature = "system-clipboard"))]
fn clipboard_provider() -> Option<Arc<dyn Clipboard>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options() {
        let options =
            parse_options(&["delimiter=;".to_string(), "header=no".to_string()]).unwrap();
        assert_eq!(options.get("delimiter"), Some(";"));
        assert_eq!(options.get("header"), Some("no"));
        assert!(parse_options(&["broken".to_string()]).is_err());
    }

    #[test]
    fn test_clipboard_provider_follows_feature() {
        assert_eq!(
            clipboard_provider().is_some(),
            cfg!(feature = "system-clipboard")
        );
    }
}
