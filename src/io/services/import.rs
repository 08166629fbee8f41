//! Table import service.
//!
//! Locates a source, resolves its format, runs the registered importer and
//! normalizes the resulting table's metadata.

use super::{locator_from_config, status_label, with_default_na};
use crate::config::TabportConfig;
use crate::io::formats::DEFAULT_NA;
use crate::io::registry::FormatRegistry;
use crate::io::resolver::FormatTag;
use crate::io::source::{Clipboard, LocatedSource, SourceLocator, SourceSpec};
use crate::io::traits::HandlerOptions;
use crate::models::Table;
use crate::{Error, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::instrument;

/// Options for a single import.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Format override; wins over the file extension.
    pub format: Option<String>,
    /// Archive member to read, overriding the one on the source.
    pub member: Option<String>,
    /// Options passed to the importer untouched.
    pub handler: HandlerOptions,
}

impl ImportOptions {
    /// Sets the format override.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Selects an archive member.
    #[must_use]
    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }

    /// Adds a handler option.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.handler.set(key, value);
        self
    }

    /// Replaces all handler options.
    #[must_use]
    pub fn with_handler_options(mut self, handler: HandlerOptions) -> Self {
        self.handler = handler;
        self
    }
}

/// Service for importing tables.
#[derive(Debug, Clone)]
pub struct ImportService {
    registry: Arc<FormatRegistry>,
    locator: SourceLocator,
    default_na: Vec<String>,
}

impl ImportService {
    /// Creates an import service over `registry` with default settings.
    #[must_use]
    pub fn new(registry: Arc<FormatRegistry>) -> Self {
        Self {
            registry,
            locator: SourceLocator::default(),
            default_na: DEFAULT_NA.iter().map(ToString::to_string).collect(),
        }
    }

    /// Creates an import service using the shared registry.
    #[must_use]
    pub fn shared() -> Self {
        Self::new(FormatRegistry::shared())
    }

    /// Creates an import service from configuration.
    #[must_use]
    pub fn from_config(config: &TabportConfig, registry: Arc<FormatRegistry>) -> Self {
        Self {
            registry,
            locator: locator_from_config(config),
            default_na: config.defaults.na.clone(),
        }
    }

    /// Replaces the source locator.
    #[must_use]
    pub fn with_locator(mut self, locator: SourceLocator) -> Self {
        self.locator = locator;
        self
    }

    /// Sets the clipboard provider.
    #[must_use]
    pub fn with_clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.locator = self.locator.with_clipboard(clipboard);
        self
    }

    /// The registry handlers are looked up in.
    #[must_use]
    pub const fn registry(&self) -> &Arc<FormatRegistry> {
        &self.registry
    }

    /// Imports a table.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The source cannot be located ([`Error::SourceResolution`])
    /// - The format is unknown or has no importer
    /// - The importer fails ([`Error::HandlerExecution`])
    #[instrument(
        skip(self, source, options),
        fields(operation = "import", source = %source, format = tracing::field::Empty)
    )]
    pub fn import(&self, source: &SourceSpec, options: &ImportOptions) -> Result<Table> {
        let mut format = "unknown".to_string();
        let result = self.import_inner(source, options, &mut format);

        metrics::counter!(
            "tabport_import_total",
            "format" => format.clone(),
            "status" => status_label(&result)
        )
        .increment(1);

        match &result {
            Ok(table) => tracing::info!(
                format = %format,
                rows = table.n_rows(),
                cols = table.n_cols(),
                "Imported table"
            ),
            Err(e) => tracing::debug!(error = %e, "Import failed"),
        }
        result
    }

    fn import_inner(
        &self,
        source: &SourceSpec,
        options: &ImportOptions,
        format: &mut String,
    ) -> Result<Table> {
        let spec = match &options.member {
            Some(member) => source.clone().with_member(member.clone()),
            None => source.clone(),
        };

        let located = self.locator.open(&spec)?;
        let resolved = self.locator.resolver().resolve(
            &located.name,
            options.format.as_deref(),
            &self.registry,
        )?;
        *format = resolved.tag.to_string();
        tracing::Span::current().record("format", resolved.tag.as_str());

        let importer = self.registry.importer(&resolved.tag)?;
        let handler_options = with_default_na(&options.handler, &self.default_na);
        let table = importer
            .import(&located.path, &handler_options)
            .map_err(|e| Error::HandlerExecution {
                format: resolved.tag.to_string(),
                source_identity: located.identity.clone(),
                cause: Box::new(e),
            })?;

        normalize(table, &located, &resolved.tag)
    }
}

/// Fills in metadata every imported table carries.
fn normalize(table: Table, located: &LocatedSource, tag: &FormatTag) -> Result<Table> {
    // Registered importers may build tables by any route; re-check lengths.
    let mut table = table.validated()?;

    for (_, kind, meta) in table.column_metas_mut() {
        if meta.storage_type.is_none() {
            meta.storage_type = Some(kind.storage_type().to_string());
        }
    }

    table.meta.source = Some(located.identity.clone());
    table.meta.format = Some(tag.to_string());
    if table.meta.name.is_none() {
        table.meta.name = Path::new(&located.name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
    }
    Ok(table)
}
