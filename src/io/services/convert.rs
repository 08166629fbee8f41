//! Conversion: import followed by export.

use super::export::{ExportOptions, ExportService};
use super::import::{ImportOptions, ImportService};
use crate::config::TabportConfig;
use crate::io::registry::FormatRegistry;
use crate::io::source::{Clipboard, SourceSpec};
use crate::io::traits::HandlerOptions;
use crate::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::instrument;

/// A single conversion, consumed by [`ConvertService::convert`].
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Where to read from.
    pub source: SourceSpec,
    /// Where to write to.
    pub target: SourceSpec,
    /// Input format override.
    pub in_format: Option<String>,
    /// Output format override.
    pub out_format: Option<String>,
    /// Options for the importer.
    pub import_options: HandlerOptions,
    /// Options for the exporter.
    pub export_options: HandlerOptions,
}

impl ConversionRequest {
    /// Creates a request inferring both formats from the names.
    #[must_use]
    pub fn new(source: impl Into<SourceSpec>, target: impl Into<SourceSpec>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            in_format: None,
            out_format: None,
            import_options: HandlerOptions::default(),
            export_options: HandlerOptions::default(),
        }
    }

    /// Sets the input format.
    #[must_use]
    pub fn from_format(mut self, format: impl Into<String>) -> Self {
        self.in_format = Some(format.into());
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn to_format(mut self, format: impl Into<String>) -> Self {
        self.out_format = Some(format.into());
        self
    }

    /// Selects the archive member to read.
    #[must_use]
    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.source.member = Some(member.into());
        self
    }

    /// Sets the importer options.
    #[must_use]
    pub fn with_import_options(mut self, options: HandlerOptions) -> Self {
        self.import_options = options;
        self
    }

    /// Sets the exporter options.
    #[must_use]
    pub fn with_export_options(mut self, options: HandlerOptions) -> Self {
        self.export_options = options;
        self
    }
}

/// Chains an [`ImportService`] and an [`ExportService`].
#[derive(Debug, Clone)]
pub struct ConvertService {
    import: ImportService,
    export: ExportService,
}

impl ConvertService {
    /// Creates a convert service over `registry` with default settings.
    #[must_use]
    pub fn new(registry: Arc<FormatRegistry>) -> Self {
        Self {
            import: ImportService::new(Arc::clone(&registry)),
            export: ExportService::new(registry),
        }
    }

    /// Creates a convert service using the shared registry.
    #[must_use]
    pub fn shared() -> Self {
        Self::new(FormatRegistry::shared())
    }

    /// Creates a convert service from configuration.
    #[must_use]
    pub fn from_config(config: &TabportConfig, registry: Arc<FormatRegistry>) -> Self {
        Self {
            import: ImportService::from_config(config, Arc::clone(&registry)),
            export: ExportService::from_config(config, registry),
        }
    }

    /// Sets the clipboard provider on both sides.
    #[must_use]
    pub fn with_clipboard(self, clipboard: Arc<dyn Clipboard>) -> Self {
        Self {
            import: self.import.with_clipboard(Arc::clone(&clipboard)),
            export: self.export.with_clipboard(clipboard),
        }
    }

    /// Converts `request.source` into `request.target`.
    ///
    /// The exporter is checked before anything is read, so an unsupported
    /// target fails without fetching the source. Returns the written location.
    ///
    /// # Errors
    ///
    /// Returns the first error of the export check, the import or the export.
    #[instrument(
        skip(self, request),
        fields(operation = "convert", source = %request.source, target = %request.target)
    )]
    pub fn convert(&self, request: ConversionRequest) -> Result<PathBuf> {
        let out_tag = self
            .export
            .check_target(&request.target, request.out_format.as_deref())?;
        tracing::debug!(target_format = %out_tag, "Export handler available");

        let import_options = ImportOptions {
            format: request.in_format,
            member: None,
            handler: request.import_options,
        };
        let table = self.import.import(&request.source, &import_options)?;

        let export_options = ExportOptions {
            format: request.out_format,
            handler: request.export_options,
        };
        self.export.export(&table, &request.target, &export_options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_convert_csv_to_json() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("in.csv");
        fs::write(&source, "a,b\n1,x\n2,y\n").unwrap();
        let target = dir.path().join("out.json");

        let written = ConvertService::shared()
            .convert(ConversionRequest::new(&source, &target))
            .unwrap();
        assert_eq!(written, target);
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "[{\"a\":1,\"b\":\"x\"},{\"a\":2,\"b\":\"y\"}]\n"
        );
    }

    #[test]
    fn test_unsupported_target_fails_before_reading() {
        let dir = TempDir::new().unwrap();
        let err = ConvertService::shared()
            .convert(ConversionRequest::new(
                dir.path().join("missing.csv"),
                dir.path().join("out.accdb"),
            ))
            .unwrap_err();
        assert!(matches!(err, Error::KnownButUnsupported { .. }));
    }

    #[test]
    fn test_import_failure_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.csv");
        let err = ConvertService::shared()
            .convert(ConversionRequest::new(dir.path().join("missing.tsv"), &target))
            .unwrap_err();
        assert!(matches!(err, Error::SourceResolution { .. }));
        assert!(!target.exists());
    }

    #[test]
    fn test_separate_import_and_export_options() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("in.txt");
        fs::write(&source, "a;b\n1;2\n").unwrap();
        let target = dir.path().join("out.dat");

        ConvertService::shared()
            .convert(
                ConversionRequest::new(&source, &target)
                    .from_format("csv")
                    .to_format("psv")
                    .with_import_options(HandlerOptions::new().with("delimiter", ";")),
            )
            .unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "a|b\n1|2\n");
    }
}
