//! Benchmarks for extension resolution and delimited import.
//!
//! Benchmark targets:
//! - Resolving a plain or compound name: <5us
//! - Importing a 10k-row csv: <50ms

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::fmt::Write as _;
use std::hint::black_box;
use std::time::Duration;
use tempfile::TempDir;

use tabport::io::ExtensionResolver;
use tabport::{FormatRegistry, ImportOptions, ImportService, SourceSpec};

const NAMES: &[&str] = &[
    "data.csv",
    "DATA.TSV",
    "archive/people.tsv.gz",
    "https://example.org/exports/t.json?dl=1#top",
    "bundle.yml.zip",
];

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    group.measurement_time(Duration::from_secs(5));
    let registry = FormatRegistry::with_builtins();
    let resolver = ExtensionResolver::default();

    for name in NAMES {
        group.bench_with_input(BenchmarkId::from_parameter(name), name, |b, name| {
            b.iter(|| resolver.resolve(black_box(name), None, &registry));
        });
    }

    group.bench_function("explicit_override", |b| {
        b.iter(|| resolver.resolve(black_box("download"), Some("tab"), &registry));
    });
    group.finish();
}

fn write_csv(dir: &TempDir, rows: usize) -> std::path::PathBuf {
    let mut text = String::from("id,score,label,flag\n");
    for i in 0..rows {
        let _ = writeln!(text, "{i},{}.5,row {i},{}", i % 100, i % 2 == 0);
    }
    let path = dir.path().join(format!("rows_{rows}.csv"));
    std::fs::write(&path, text).unwrap();
    path
}

fn bench_csv_import(c: &mut Criterion) {
    let mut group = c.benchmark_group("csv_import");
    group.measurement_time(Duration::from_secs(10));
    let dir = TempDir::new().unwrap();
    let service = ImportService::shared();

    for rows in [100, 1_000, 10_000] {
        let source = SourceSpec::path(write_csv(&dir, rows));
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &source, |b, source| {
            b.iter(|| service.import(black_box(source), &ImportOptions::default()).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_resolve, bench_csv_import);
criterion_main!(benches);
