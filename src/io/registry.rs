//! Format registry: tag to handler pair.
//!
//! The registry is an explicitly constructed object. Callers either own an
//! instance (usually behind an `Arc`) or use [`FormatRegistry::shared`].
//! Registration takes the write lock and lookups take the read lock, so
//! runtime registration is safe alongside concurrent lookups.

use super::formats;
use super::resolver::FormatTag;
use super::traits::{Exporter, Importer};
use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Direction of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Reading a file into a table.
    Import,
    /// Writing a table to a file.
    Export,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import => f.write_str("import"),
            Self::Export => f.write_str("export"),
        }
    }
}

/// Import and export handlers for one format. Either side may be absent.
#[derive(Clone, Default)]
pub struct HandlerPair {
    /// Reader, if the format can be imported.
    pub importer: Option<Arc<dyn Importer>>,
    /// Writer, if the format can be exported.
    pub exporter: Option<Arc<dyn Exporter>>,
}

impl HandlerPair {
    /// Creates a pair with both directions.
    #[must_use]
    pub fn new(importer: impl Importer + 'static, exporter: impl Exporter + 'static) -> Self {
        Self {
            importer: Some(Arc::new(importer)),
            exporter: Some(Arc::new(exporter)),
        }
    }

    /// Creates an import-only pair.
    #[must_use]
    pub fn import_only(importer: impl Importer + 'static) -> Self {
        Self {
            importer: Some(Arc::new(importer)),
            exporter: None,
        }
    }

    /// Creates an export-only pair.
    #[must_use]
    pub fn export_only(exporter: impl Exporter + 'static) -> Self {
        Self {
            importer: None,
            exporter: Some(Arc::new(exporter)),
        }
    }

    /// Returns whether the given direction is available.
    #[must_use]
    pub const fn supports(&self, direction: Direction) -> bool {
        match direction {
            Direction::Import => self.importer.is_some(),
            Direction::Export => self.exporter.is_some(),
        }
    }
}

impl fmt::Debug for HandlerPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerPair")
            .field("import", &self.importer.is_some())
            .field("export", &self.exporter.is_some())
            .finish()
    }
}

static SHARED: Lazy<Arc<FormatRegistry>> = Lazy::new(|| Arc::new(FormatRegistry::with_builtins()));

/// Mapping from format tag to handler pair.
#[derive(Debug, Default)]
pub struct FormatRegistry {
    handlers: RwLock<HashMap<FormatTag, HandlerPair>>,
}

impl FormatRegistry {
    /// Creates a registry with no handlers.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a registry with every compiled-in built-in handler.
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        for (tag, pair) in formats::builtin_handlers() {
            registry.insert(FormatTag::new(tag), pair);
        }
        registry
    }

    /// Returns the process-wide registry, built with the built-ins on first use.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::clone(&SHARED)
    }

    /// Registers a handler pair, replacing any previous pair for the tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry lock is poisoned.
    pub fn register(&self, tag: impl Into<FormatTag>, pair: HandlerPair) -> Result<()> {
        let tag = tag.into();
        let mut handlers = self.handlers.write().map_err(lock_error)?;
        let replaced = handlers.insert(tag.clone(), pair).is_some();
        tracing::debug!(tag = %tag, replaced, "Registered format handlers");
        Ok(())
    }

    /// Registers an import-only handler, replacing any previous pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry lock is poisoned.
    pub fn register_importer(
        &self,
        tag: impl Into<FormatTag>,
        importer: impl Importer + 'static,
    ) -> Result<()> {
        self.register(tag, HandlerPair::import_only(importer))
    }

    /// Registers an export-only handler, replacing any previous pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry lock is poisoned.
    pub fn register_exporter(
        &self,
        tag: impl Into<FormatTag>,
        exporter: impl Exporter + 'static,
    ) -> Result<()> {
        self.register(tag, HandlerPair::export_only(exporter))
    }

    /// Looks up the importer for a tag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandlerDirectionUnavailable`] if the tag is export-only
    /// and [`Error::UnrecognizedFormat`] if it is not registered.
    pub fn importer(&self, tag: &FormatTag) -> Result<Arc<dyn Importer>> {
        let pair = self.pair(tag)?;
        pair.importer
            .ok_or_else(|| Error::HandlerDirectionUnavailable {
                format: tag.to_string(),
                direction: Direction::Import,
            })
    }

    /// Looks up the exporter for a tag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandlerDirectionUnavailable`] if the tag is import-only
    /// and [`Error::UnrecognizedFormat`] if it is not registered.
    pub fn exporter(&self, tag: &FormatTag) -> Result<Arc<dyn Exporter>> {
        let pair = self.pair(tag)?;
        pair.exporter
            .ok_or_else(|| Error::HandlerDirectionUnavailable {
                format: tag.to_string(),
                direction: Direction::Export,
            })
    }

    /// Returns whether any handler is registered for the tag.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.handlers
            .read()
            .map(|handlers| handlers.contains_key(tag))
            .unwrap_or(false)
    }

    /// Returns whether the tag supports a direction.
    #[must_use]
    pub fn supports(&self, tag: &str, direction: Direction) -> bool {
        self.handlers
            .read()
            .ok()
            .and_then(|handlers| handlers.get(tag).map(|pair| pair.supports(direction)))
            .unwrap_or(false)
    }

    /// All registered tags, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<FormatTag> {
        let mut tags: Vec<FormatTag> = self
            .handlers
            .read()
            .map(|handlers| handlers.keys().cloned().collect())
            .unwrap_or_default();
        tags.sort();
        tags
    }

    fn pair(&self, tag: &FormatTag) -> Result<HandlerPair> {
        let handlers = self.handlers.read().map_err(lock_error)?;
        handlers
            .get(tag.as_str())
            .cloned()
            .ok_or_else(|| Error::UnrecognizedFormat {
                input: tag.to_string(),
            })
    }

    /// Insert used while building; the registry is not shared yet.
    fn insert(&self, tag: FormatTag, pair: HandlerPair) {
        if let Ok(mut handlers) = self.handlers.write() {
            handlers.insert(tag, pair);
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
fn lock_error<T>(e: std::sync::PoisonError<T>) -> Error {
    Error::operation("format_registry_lock", e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::traits::HandlerOptions;
    use crate::models::{Column, Table, TableSet};
    use std::path::Path;

    fn constant_importer(value: i64) -> impl Importer {
        move |_: &Path, _: &HandlerOptions| Table::new(vec![Column::integers("v", [Some(value)])])
    }

    #[test]
    fn test_builtins_registered() {
        let registry = FormatRegistry::with_builtins();
        for tag in ["csv", "tsv", "psv", "json", "yaml", "fwf", "html"] {
            assert!(registry.contains(tag), "missing builtin {tag}");
        }
        assert!(registry.supports("html", Direction::Export));
        assert!(!registry.supports("html", Direction::Import));
    }

    #[test]
    fn test_direction_unavailable() {
        let registry = FormatRegistry::with_builtins();
        let err = registry.importer(&FormatTag::new("html")).err();
        assert!(matches!(
            err,
            Some(Error::HandlerDirectionUnavailable {
                direction: Direction::Import,
                ..
            })
        ));
    }

    #[test]
    fn test_reregister_replaces_only_that_tag() {
        let registry = FormatRegistry::with_builtins();
        registry
            .register_importer("custom", constant_importer(1))
            .unwrap();
        registry
            .register_importer("custom", constant_importer(2))
            .unwrap();

        let table = registry
            .importer(&FormatTag::new("custom"))
            .unwrap()
            .import(Path::new("ignored"), &HandlerOptions::new())
            .unwrap();
        assert_eq!(table.row(0), vec![crate::models::Value::Integer(2)]);
        assert!(registry.supports("csv", Direction::Import));
        assert!(registry.supports("csv", Direction::Export));
    }

    #[test]
    fn test_register_replaces_whole_pair() {
        let registry = FormatRegistry::with_builtins();
        registry
            .register_exporter("csv", |_: &TableSet, _: &Path, _: &HandlerOptions| {
                Ok::<(), Error>(())
            })
            .unwrap();
        assert!(!registry.supports("csv", Direction::Import));
        assert!(registry.supports("csv", Direction::Export));
    }

    #[test]
    fn test_unregistered_lookup() {
        let registry = FormatRegistry::empty();
        assert!(matches!(
            registry.exporter(&FormatTag::new("csv")),
            Err(Error::UnrecognizedFormat { .. })
        ));
        assert!(registry.tags().is_empty());
    }
}
