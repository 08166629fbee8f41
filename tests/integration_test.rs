//! Integration tests for tabport.
#![allow(clippy::panic, clippy::too_many_lines, clippy::unwrap_used)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tabport::io::MemoryClipboard;
use tabport::{
    Column, ColumnData, ConversionRequest, ConvertService, Direction, Error, ExportOptions,
    ExportService, FormatRegistry, HandlerOptions, ImportOptions, ImportService, SourceFailure,
    SourceSpec, Table, TableSet, Value,
};
use tempfile::TempDir;
use test_case::test_case;

fn sample() -> Table {
    Table::new(vec![
        Column::integers("id", [Some(1), Some(2), None]),
        Column::floats("score", [Some(1.5), None, Some(-0.25)]),
        Column::booleans("ok", [Some(true), Some(false), None]),
        Column::text("name", [Some("ann"), None, Some("a, \"quoted\" b")]),
    ])
    .unwrap()
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn import(path: &Path) -> Table {
    ImportService::shared()
        .import(&SourceSpec::path(path), &ImportOptions::default())
        .unwrap()
}

fn export(table: &Table, path: &Path) -> PathBuf {
    ExportService::shared()
        .export(table, &SourceSpec::path(path), &ExportOptions::default())
        .unwrap()
}

#[test_case("csv" ; "csv")]
#[test_case("tsv" ; "tsv")]
#[test_case("psv" ; "psv")]
#[test_case("json" ; "json")]
#[test_case("yaml" ; "yaml")]
#[test_case("CSV" ; "uppercase extension")]
#[test_case("tsv.gz" ; "gzip wrapped tsv")]
#[test_case("json.zip" ; "zip wrapped json")]
#[test_case("yaml.tar" ; "tar wrapped yaml")]
#[test_case("csv.tar.gz" ; "gzipped tar csv")]
#[test_case("psv.tgz" ; "tgz wrapped psv")]
fn test_roundtrip_preserves_data(extension: &str) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(format!("t.{extension}"));

    let written = export(&sample(), &path);
    assert_eq!(written, path);
    let back = import(&written);
    assert!(back.same_data(&sample()), "{extension}: {back:?}");
}

#[cfg(feature = "parquet")]
#[test]
fn test_parquet_roundtrip_keeps_labels() {
    let dir = TempDir::new().unwrap();
    let mut table = sample();
    if let Some(meta) = table.column_meta_mut("ok") {
        meta.label = Some("Passed".to_string());
    }
    let path = export(&table, &dir.path().join("t.parquet"));

    let back = import(&path);
    assert!(back.same_data(&sample()));
    assert_eq!(back.column("ok").unwrap().meta.label.as_deref(), Some("Passed"));
}

#[test]
fn test_numeric_and_text_columns_survive_csv() {
    let dir = TempDir::new().unwrap();
    let table = Table::new(vec![
        Column::integers("a", [Some(1), Some(2)]),
        Column::text("b", [Some("x"), Some("y")]),
    ])
    .unwrap();

    let path = tabport::export(&table, dir.path().join("t.csv")).unwrap();
    let back = tabport::import(&path).unwrap();
    assert_eq!(
        back.column("a").map(|c| &c.data),
        Some(&ColumnData::Integer(vec![Some(1), Some(2)]))
    );
    assert_eq!(
        back.column("b").map(|c| &c.data),
        Some(&ColumnData::Text(vec![
            Some("x".to_string()),
            Some("y".to_string())
        ]))
    );
}

#[test]
fn test_gzip_source_is_decompressed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.tsv.gz");
    let file = fs::File::create(&path).unwrap();
    let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    encoder.write_all(b"a\tb\n1\tx\n").unwrap();
    encoder.finish().unwrap();

    let table = import(&path);
    assert_eq!(table.meta.format.as_deref(), Some("tsv"));
    assert_eq!(table.row(0), vec![Value::Integer(1), Value::Text("x".to_string())]);
}

#[test]
fn test_zip_archive_member_rules() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bundle.zip");
    let mut writer = zip::ZipWriter::new(fs::File::create(&path).unwrap());
    let options = zip::write::SimpleFileOptions::default();
    writer.start_file("people.csv", options).unwrap();
    writer.write_all(b"n\n1\n").unwrap();
    writer.start_file("places.json", options).unwrap();
    writer.write_all(br#"[{"p":"x"}]"#).unwrap();
    writer.finish().unwrap();

    let err = ImportService::shared()
        .import(&SourceSpec::path(&path), &ImportOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::SourceResolution {
            reason: SourceFailure::AmbiguousArchive { count: 2 },
            ..
        }
    ));

    let places = ImportService::shared()
        .import(
            &SourceSpec::path(&path),
            &ImportOptions::default().with_member("places.json"),
        )
        .unwrap();
    assert_eq!(places.meta.format.as_deref(), Some("json"));
    assert_eq!(places.column_names(), vec!["p"]);
}

#[test]
fn test_unknown_and_unsupported_extensions() {
    let dir = TempDir::new().unwrap();
    let unknown = write(&dir, "t.unknownext", "");
    let err = ImportService::shared()
        .import(&SourceSpec::path(&unknown), &ImportOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::UnrecognizedFormat { .. }));

    let accdb = write(&dir, "t.accdb", "");
    match ImportService::shared().import(&SourceSpec::path(&accdb), &ImportOptions::default()) {
        Err(Error::KnownButUnsupported { format, guidance }) => {
            assert_eq!(format, "accdb");
            assert!(!guidance.is_empty());
        },
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_html_is_export_only() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "page.html", "<table></table>");
    let err = ImportService::shared()
        .import(&SourceSpec::path(&path), &ImportOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::HandlerDirectionUnavailable {
            direction: Direction::Import,
            ..
        }
    ));
}

#[test]
fn test_convert_matches_import_then_export() {
    let dir = TempDir::new().unwrap();
    let source = export(&sample(), &dir.path().join("src.csv"));

    let converted = tabport::convert(&source, dir.path().join("a.json")).unwrap();
    let chained = export(&import(&source), &dir.path().join("b.json"));
    assert_eq!(
        fs::read_to_string(converted).unwrap(),
        fs::read_to_string(chained).unwrap()
    );
}

#[test]
fn test_reregistering_replaces_only_that_tag() {
    let registry = Arc::new(FormatRegistry::with_builtins());
    registry
        .register_importer("json", |_: &Path, _: &HandlerOptions| {
            Table::new(vec![Column::text("custom", [Some("yes")])])
        })
        .unwrap();

    let dir = TempDir::new().unwrap();
    let json = write(&dir, "t.json", "[]");
    let csv = write(&dir, "t.csv", "a\n1\n");
    let service = ImportService::new(registry);

    let custom = service
        .import(&SourceSpec::path(&json), &ImportOptions::default())
        .unwrap();
    assert_eq!(custom.column_names(), vec!["custom"]);
    let builtin = service
        .import(&SourceSpec::path(&csv), &ImportOptions::default())
        .unwrap();
    assert_eq!(builtin.column_names(), vec!["a"]);
}

#[test]
fn test_handler_registered_under_alias_is_used() {
    let registry = Arc::new(FormatRegistry::with_builtins());
    registry
        .register_importer("txt", |_: &Path, _: &HandlerOptions| {
            Table::new(vec![Column::text("line", [Some("custom")])])
        })
        .unwrap();

    let dir = TempDir::new().unwrap();
    let notes = write(&dir, "notes.txt", "a\tb\n1\t2\n");
    let table = ImportService::new(registry)
        .import(&SourceSpec::path(&notes), &ImportOptions::default())
        .unwrap();
    assert_eq!(table.column_names(), vec!["line"]);
    assert_eq!(table.meta.format.as_deref(), Some("txt"));
}

#[test]
fn test_runtime_format_is_resolved_like_builtins() {
    let registry = Arc::new(FormatRegistry::with_builtins());
    registry
        .register_exporter(
            "lines",
            |tables: &TableSet, path: &Path, _: &HandlerOptions| -> tabport::Result<()> {
                let table = &tables.first().unwrap().table;
                let text: String = table.rows().map(|row| format!("{}\n", row[0])).collect();
                fs::write(path, text).map_err(|e| Error::InvalidInput(e.to_string()))
            },
        )
        .unwrap();

    let dir = TempDir::new().unwrap();
    let path = ExportService::new(registry)
        .export(
            &sample(),
            &SourceSpec::path(dir.path().join("ids.LINES.gz")),
            &ExportOptions::default(),
        )
        .unwrap();
    assert!(path.is_file());
}

#[test]
fn test_two_table_html_keeps_order() {
    let dir = TempDir::new().unwrap();
    let set = TableSet::new()
        .with("zeta", sample())
        .with("alpha", sample());
    let path = ExportService::shared()
        .export_set(
            &set,
            &SourceSpec::path(dir.path().join("report.html")),
            &ExportOptions::default(),
        )
        .unwrap();

    let html = fs::read_to_string(path).unwrap();
    assert_eq!(html.matches("<table").count(), 2);
    let zeta = html.find("<h2>zeta</h2>").unwrap();
    let alpha = html.find("<h2>alpha</h2>").unwrap();
    assert!(zeta < alpha);
}

#[test]
fn test_failing_exporter_leaves_no_compressed_target() {
    let registry = Arc::new(FormatRegistry::empty());
    registry
        .register_exporter(
            "boom",
            |_: &TableSet, path: &Path, _: &HandlerOptions| -> tabport::Result<()> {
                fs::write(path, "half").map_err(|e| Error::InvalidInput(e.to_string()))?;
                Err(Error::InvalidInput("exporter gave up".to_string()))
            },
        )
        .unwrap();

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("out.boom.gz");
    let err = ExportService::new(registry)
        .export(&sample(), &SourceSpec::path(&target), &ExportOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::HandlerExecution { .. }));
    assert!(!target.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_clipboard_roundtrip_through_fake_provider() {
    let dir = TempDir::new().unwrap();
    let source = write(&dir, "in.csv", "a,b\n1,x\n2,y\n");
    let clipboard = Arc::new(MemoryClipboard::new());
    let service = ConvertService::shared().with_clipboard(clipboard.clone());

    let written = service
        .convert(ConversionRequest::new(&source, "clipboard"))
        .unwrap();
    assert_eq!(written, PathBuf::from("clipboard"));
    assert_eq!(clipboard.contents(), "a\tb\n1\tx\n2\ty\n");

    let target = dir.path().join("out.csv");
    service
        .convert(ConversionRequest::new("clipboard", &target))
        .unwrap();
    assert_eq!(fs::read_to_string(target).unwrap(), "a,b\n1,x\n2,y\n");
}

#[test]
fn test_convert_with_member_and_options() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("bundle.tar");
    let mut builder = tar::Builder::new(fs::File::create(&archive).unwrap());
    for (name, body) in [("a.csv", "x;y\n1;2\n"), ("b.csv", "q\n9\n")] {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, body.as_bytes()).unwrap();
    }
    builder.finish().unwrap();

    let target = dir.path().join("a.yaml");
    ConvertService::shared()
        .convert(
            ConversionRequest::new(&archive, &target)
                .with_member("a.csv")
                .with_import_options(HandlerOptions::new().with("delimiter", ";")),
        )
        .unwrap();
    let back = import(&target);
    assert_eq!(back.column_names(), vec!["x", "y"]);
    assert_eq!(back.row(0), vec![Value::Integer(1), Value::Integer(2)]);
}
