//! Clipboard access.
//!
//! The system clipboard is platform specific, so tabport talks to it only
//! through the [`Clipboard`] trait. [`SystemClipboard`] (feature
//! `system-clipboard`) goes through the `arboard` crate; [`MemoryClipboard`]
//! is an in-process provider for embedding and tests.

use crate::{Error, Result};
use std::sync::Mutex;

/// Text clipboard provider.
pub trait Clipboard: Send + Sync {
    /// Returns the clipboard text.
    ///
    /// # Errors
    ///
    /// Returns an error if the clipboard cannot be read.
    fn read_text(&self) -> Result<String>;

    /// Replaces the clipboard text.
    ///
    /// # Errors
    ///
    /// Returns an error if the clipboard cannot be written.
    fn write_text(&self, text: &str) -> Result<()>;
}

/// Clipboard held in memory.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    text: Mutex<String>,
}

impl MemoryClipboard {
    /// Creates an empty clipboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clipboard holding `text`.
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(text.into()),
        }
    }

    /// Current contents.
    #[must_use]
    pub fn contents(&self) -> String {
        self.text
            .lock()
            .map(|text| text.clone())
            .unwrap_or_default()
    }
}

impl Clipboard for MemoryClipboard {
    fn read_text(&self) -> Result<String> {
        self.text
            .lock()
            .map(|text| text.clone())
            .map_err(|e| Error::operation("read_clipboard", e))
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let mut guard = self
            .text
            .lock()
            .map_err(|e| Error::operation("write_clipboard", e))?;
        text.clone_into(&mut guard);
        Ok(())
    }
}

/// The operating system clipboard.
///
/// A connection is opened per call, so constructing one never fails even
/// without a display. On X11 the written text is served until the process
/// exits unless a clipboard manager takes it over.
#[cfg(feature = "system-clipboard")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

#[cfg(feature = "system-clipboard")]
impl SystemClipboard {
    /// Creates a system clipboard provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[cfg(feature = "system-clipboard")]
impl Clipboard for SystemClipboard {
    fn read_text(&self) -> Result<String> {
        arboard::Clipboard::new()
            .and_then(|mut clipboard| clipboard.get_text())
            .map_err(|e| Error::operation("read_clipboard", e))
    }

    fn write_text(&self, text: &str) -> Result<()> {
        arboard::Clipboard::new()
            .and_then(|mut clipboard| clipboard.set_text(text))
            .map_err(|e| Error::operation("write_clipboard", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_clipboard() {
        let clipboard = MemoryClipboard::with_text("a\tb\n");
        assert_eq!(clipboard.read_text().unwrap(), "a\tb\n");
        clipboard.write_text("x").unwrap();
        assert_eq!(clipboard.contents(), "x");
    }
}
