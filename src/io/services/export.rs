//! Table export service.
//!
//! Handlers never write to the target directly. Output goes to a staging
//! directory next to the target and is renamed into place only once the
//! handler (and packing, for compressed targets) has succeeded.

use super::{locator_from_config, status_label, with_default_na};
use crate::config::TabportConfig;
use crate::io::formats::DEFAULT_NA;
use crate::io::registry::FormatRegistry;
use crate::io::resolver::{Compression, ExtensionResolver, FormatTag};
use crate::io::source::{
    CLIPBOARD_NAME, Clipboard, SourceLocator, SourceSpec, StagedTarget, pack, parent_dir,
};
use crate::io::traits::{Exporter, HandlerOptions};
use crate::models::{Table, TableSet};
use crate::{Error, Result, SourceFailure};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

/// Options for a single export.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Format override; wins over the target extension.
    pub format: Option<String>,
    /// Options passed to the exporter untouched.
    pub handler: HandlerOptions,
}

impl ExportOptions {
    /// Sets the format override.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
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

/// Service for exporting tables.
#[derive(Debug, Clone)]
pub struct ExportService {
    registry: Arc<FormatRegistry>,
    locator: SourceLocator,
    default_na: Vec<String>,
}

impl ExportService {
    /// Creates an export service over `registry` with default settings.
    #[must_use]
    pub fn new(registry: Arc<FormatRegistry>) -> Self {
        Self {
            registry,
            locator: SourceLocator::default(),
            default_na: DEFAULT_NA.iter().map(ToString::to_string).collect(),
        }
    }

    /// Creates an export service using the shared registry.
    #[must_use]
    pub fn shared() -> Self {
        Self::new(FormatRegistry::shared())
    }

    /// Creates an export service from configuration.
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

    /// Looks up the exporter a target would use, without writing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is not writable or the format has no
    /// exporter.
    pub fn check_target(&self, target: &SourceSpec, format: Option<&str>) -> Result<FormatTag> {
        let tag = if target.is_clipboard() {
            self.clipboard_tag(format)?
        } else {
            let staged = self.locator.stage_target(target)?;
            self.locator
                .resolver()
                .resolve(&staged.name, format, &self.registry)?
                .tag
        };
        self.registry.exporter(&tag)?;
        Ok(tag)
    }

    /// Exports one table. Returns the written location.
    ///
    /// The table becomes a one-entry set named after its metadata name, or
    /// `Sheet1`.
    ///
    /// # Errors
    ///
    /// See [`ExportService::export_set`].
    pub fn export(
        &self,
        table: &Table,
        target: &SourceSpec,
        options: &ExportOptions,
    ) -> Result<PathBuf> {
        self.export_set(&TableSet::single(table.clone()), target, options)
    }

    /// Exports a set of tables. Returns the written location.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The target is a URL or its directory does not exist
    /// - The format is unknown or has no exporter
    /// - The set holds several tables and the format only holds one
    /// - The exporter fails ([`Error::HandlerExecution`])
    #[instrument(
        skip(self, tables, target, options),
        fields(
            operation = "export",
            target = %target,
            tables = tables.len(),
            format = tracing::field::Empty
        )
    )]
    pub fn export_set(
        &self,
        tables: &TableSet,
        target: &SourceSpec,
        options: &ExportOptions,
    ) -> Result<PathBuf> {
        let mut format = "unknown".to_string();
        let result = self.export_inner(tables, target, options, &mut format);

        metrics::counter!(
            "tabport_export_total",
            "format" => format.clone(),
            "status" => status_label(&result)
        )
        .increment(1);

        match &result {
            Ok(path) => tracing::info!(format = %format, path = %path.display(), "Exported tables"),
            Err(e) => tracing::debug!(error = %e, "Export failed"),
        }
        result
    }

    fn export_inner(
        &self,
        tables: &TableSet,
        target: &SourceSpec,
        options: &ExportOptions,
        format: &mut String,
    ) -> Result<PathBuf> {
        if tables.is_empty() {
            return Err(Error::InvalidInput(
                "nothing to export: the table set is empty".to_string(),
            ));
        }
        let handler_options = with_default_na(&options.handler, &self.default_na);

        if target.is_clipboard() {
            let tag = self.clipboard_tag(options.format.as_deref())?;
            *format = tag.to_string();
            return self.export_clipboard(tables, &tag, &handler_options);
        }

        let staged = self.locator.stage_target(target)?;
        let resolved = self.locator.resolver().resolve(
            &staged.name,
            options.format.as_deref(),
            &self.registry,
        )?;
        *format = resolved.tag.to_string();
        tracing::Span::current().record("format", resolved.tag.as_str());

        let exporter = self.exporter_for(&resolved.tag, tables.len())?;
        let identity = target.identity();
        let write = |path: &Path| {
            exporter
                .export(tables, path, &handler_options)
                .map_err(|e| handler_error(&resolved.tag, &identity, e))
        };

        write_staged(
            &staged,
            resolved.compression,
            self.locator.resolver(),
            &resolved.tag,
            write,
        )?;
        Ok(staged.path)
    }

    fn clipboard_tag(&self, format: Option<&str>) -> Result<FormatTag> {
        match format {
            Some(format) => self.locator.resolver().tag_for(format, &self.registry),
            None => Ok(FormatTag::new("tsv")),
        }
    }

    fn exporter_for(&self, tag: &FormatTag, count: usize) -> Result<Arc<dyn Exporter>> {
        let exporter = self.registry.exporter(tag)?;
        if count > 1 && !exporter.supports_multiple() {
            return Err(Error::InvalidInput(format!(
                "format '{tag}' holds a single table, got {count}"
            )));
        }
        Ok(exporter)
    }

    fn export_clipboard(
        &self,
        tables: &TableSet,
        tag: &FormatTag,
        options: &HandlerOptions,
    ) -> Result<PathBuf> {
        let clipboard = self.locator.clipboard()?;
        let exporter = self.exporter_for(tag, tables.len())?;

        let staging = tempfile::TempDir::new().map_err(|e| Error::operation("stage_export", e))?;
        let path = staging.path().join(CLIPBOARD_NAME);
        exporter
            .export(tables, &path, options)
            .map_err(|e| handler_error(tag, "clipboard", e))?;
        let text = fs::read_to_string(&path).map_err(|e| Error::operation("stage_export", e))?;

        clipboard
            .write_text(&text)
            .map_err(|e| Error::SourceResolution {
                source_identity: "clipboard".to_string(),
                reason: SourceFailure::Clipboard(e.to_string()),
            })?;
        Ok(PathBuf::from("clipboard"))
    }
}

fn handler_error(tag: &FormatTag, identity: &str, cause: Error) -> Error {
    Error::HandlerExecution {
        format: tag.to_string(),
        source_identity: identity.to_string(),
        cause: Box::new(cause),
    }
}

/// Name of the file inside a compressed target.
///
/// `out.csv.gz` holds `out.csv`; `out.gz` exported as csv holds `out.csv`.
fn inner_entry_name(resolver: &ExtensionResolver, name: &str, tag: &FormatTag) -> String {
    let (inner, _) = resolver.split_compression(name);
    if ExtensionResolver::extension(inner).is_some() {
        inner.to_string()
    } else {
        format!("{inner}.{}", tag.extension())
    }
}

/// Runs `write` in a staging directory beside the target, then renames the
/// result onto the target. The staging directory is removed on drop, so a
/// failure leaves the target untouched.
fn write_staged(
    staged: &StagedTarget,
    compression: Option<Compression>,
    resolver: &ExtensionResolver,
    tag: &FormatTag,
    write: impl FnOnce(&Path) -> Result<()>,
) -> Result<()> {
    let staging = tempfile::Builder::new()
        .prefix(".tabport-")
        .tempdir_in(parent_dir(&staged.path))
        .map_err(|e| Error::operation("stage_export", e))?;

    let finished = match compression {
        None => {
            let file = staging.path().join(&staged.name);
            write(&file)?;
            file
        },
        Some(compression) => {
            let entry = inner_entry_name(resolver, &staged.name, tag);
            let inner = staging.path().join(&entry);
            write(&inner)?;
            let packed = staging.path().join(&staged.name);
            pack(compression, &inner, &entry, &packed)?;
            tracing::debug!(entry = %entry, compression = %compression, "Packed export");
            packed
        },
    };

    fs::rename(&finished, &staged.path).map_err(|e| Error::operation("persist_export", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::source::MemoryClipboard;
    use crate::models::Column;

    fn sample() -> Table {
        Table::new(vec![
            Column::integers("a", [Some(1), Some(2)]),
            Column::text("b", [Some("x"), Some("y")]),
        ])
        .unwrap()
    }

    #[test]
    fn test_export_writes_target_only() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("out.csv");

        let written = ExportService::shared()
            .export(&sample(), &SourceSpec::path(&target), &ExportOptions::default())
            .unwrap();
        assert_eq!(written, target);
        assert_eq!(fs::read_to_string(&target).unwrap(), "a,b\n1,x\n2,y\n");

        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_inner_entry_name() {
        let resolver = ExtensionResolver::default();
        let csv = FormatTag::new("csv");
        assert_eq!(inner_entry_name(&resolver, "out.csv.gz", &csv), "out.csv");
        assert_eq!(inner_entry_name(&resolver, "out.gz", &csv), "out.csv");
        assert_eq!(
            inner_entry_name(&resolver, "bundle.zip", &FormatTag::new("yaml")),
            "bundle.yaml"
        );
    }

    #[test]
    fn test_failing_exporter_keeps_existing_target() {
        let registry = Arc::new(FormatRegistry::with_builtins());
        registry
            .register_exporter("boom", |_: &TableSet, path: &Path, _: &HandlerOptions| -> Result<()> {
                fs::write(path, "partial").map_err(|e| Error::operation("write_boom", e))?;
                Err(Error::operation("write_boom", "disk full"))
            })
            .unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("out.boom");
        fs::write(&target, "previous").unwrap();

        let err = ExportService::new(registry)
            .export(&sample(), &SourceSpec::path(&target), &ExportOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::HandlerExecution { .. }));
        assert_eq!(fs::read_to_string(&target).unwrap(), "previous");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_multiple_tables_need_multi_section_format() {
        let dir = tempfile::TempDir::new().unwrap();
        let set = TableSet::new().with("one", sample()).with("two", sample());

        let err = ExportService::shared()
            .export_set(
                &set,
                &SourceSpec::path(dir.path().join("x.csv")),
                &ExportOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let html = ExportService::shared()
            .export_set(
                &set,
                &SourceSpec::path(dir.path().join("x.html")),
                &ExportOptions::default(),
            )
            .unwrap();
        assert!(html.is_file());
    }

    #[test]
    fn test_empty_set_rejected() {
        let err = ExportService::shared()
            .export_set(
                &TableSet::new(),
                &SourceSpec::path("x.csv"),
                &ExportOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_clipboard_target() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let service = ExportService::shared().with_clipboard(clipboard.clone());

        let written = service
            .export(&sample(), &SourceSpec::clipboard(), &ExportOptions::default())
            .unwrap();
        assert_eq!(written, PathBuf::from("clipboard"));
        assert_eq!(clipboard.contents(), "a\tb\n1\tx\n2\ty\n");
    }

    #[test]
    fn test_check_target() {
        let service = ExportService::shared();
        assert_eq!(
            service
                .check_target(&SourceSpec::path("out.tsv.gz"), None)
                .unwrap()
                .as_str(),
            "tsv"
        );
        assert!(matches!(
            service.check_target(&SourceSpec::path("out.accdb"), None),
            Err(Error::KnownButUnsupported { .. })
        ));
        assert!(matches!(
            service.check_target(&SourceSpec::url("https://x.org/a.csv"), None),
            Err(Error::InvalidInput(_))
        ));
    }
}
