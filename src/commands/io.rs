//! Convert and inspect command handlers.

use std::fmt::Write as _;

use tabport::config::TabportConfig;
use tabport::{
    ConversionRequest, ConvertService, FormatRegistry, ImportOptions, ImportService, Result,
    SourceSpec, Table,
};

use super::{clipboard_provider, parse_options};

/// Convert command.
#[allow(clippy::too_many_arguments)]
pub fn cmd_convert(
    config: &TabportConfig,
    input: &str,
    output: &str,
    from: Option<String>,
    to: Option<String>,
    member: Option<String>,
    in_options: &[String],
    out_options: &[String],
) -> Result<()> {
    let mut request = ConversionRequest::new(input, output)
        .with_import_options(parse_options(in_options)?)
        .with_export_options(parse_options(out_options)?);
    if let Some(from) = from {
        request = request.from_format(from);
    }
    if let Some(to) = to {
        request = request.to_format(to);
    }
    if let Some(member) = member {
        request = request.with_member(member);
    }

    let mut service = ConvertService::from_config(config, FormatRegistry::shared());
    if let Some(clipboard) = clipboard_provider() {
        service = service.with_clipboard(clipboard);
    }
    let written = service.convert(request)?;
    println!("{}", written.display());
    Ok(())
}

/// Inspect command.
pub fn cmd_inspect(
    config: &TabportConfig,
    input: &str,
    format: Option<String>,
    member: Option<String>,
    rows: usize,
    in_options: &[String],
) -> Result<()> {
    let options = ImportOptions {
        format,
        member,
        handler: parse_options(in_options)?,
    };
    let mut service = ImportService::from_config(config, FormatRegistry::shared());
    if let Some(clipboard) = clipboard_provider() {
        service = service.with_clipboard(clipboard);
    }
    let table = service.import(&SourceSpec::parse(input), &options)?;
    print!("{}", describe(&table, rows));
    Ok(())
}

/// Renders schema, metadata and the first `rows` rows.
fn describe(table: &Table, rows: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Source: {}",
        table.meta.source.as_deref().unwrap_or("(unknown)")
    );
    let _ = writeln!(
        out,
        "Format: {}",
        table.meta.format.as_deref().unwrap_or("(unknown)")
    );
    let _ = writeln!(out, "Rows: {}  Columns: {}", table.n_rows(), table.n_cols());
    for (key, value) in &table.meta.attributes {
        let _ = writeln!(out, "  {key}: {value}");
    }
    out.push('\n');

    out.push_str("Columns:\n");
    for column in table.columns() {
        let storage = column.meta.storage_type.as_deref().unwrap_or("-");
        let _ = write!(out, "  {}  <{storage}>", column.name);
        if let Some(label) = &column.meta.label {
            let _ = write!(out, "  \"{label}\"");
        }
        out.push('\n');
        if !column.meta.value_labels.is_empty() {
            let labels: Vec<String> = column
                .meta
                .value_labels
                .iter()
                .map(|(code, label)| format!("{code}={label}"))
                .collect();
            let _ = writeln!(out, "      values: {}", labels.join(", "));
        }
    }

    let shown = rows.min(table.n_rows());
    if shown > 0 {
        let _ = writeln!(out, "\nFirst {shown} rows:");
        let _ = writeln!(out, "  {}", table.column_names().join(" | "));
        for row in table.rows().take(shown) {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            let _ = writeln!(out, "  {}", cells.join(" | "));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabport::{Column, ColumnMeta};

    #[test]
    fn test_describe() {
        let mut table = Table::new(vec![
            Column::integers("sex", [Some(1), Some(2), None]).with_meta(
                ColumnMeta::default()
                    .with_label("Respondent sex")
                    .with_value_label("1", "male"),
            ),
        ])
        .unwrap();
        table.meta.format = Some("csv".to_string());

        let text = describe(&table, 2);
        assert!(text.contains("Format: csv"));
        assert!(text.contains("Rows: 3  Columns: 1"));
        assert!(text.contains("sex  <->  \"Respondent sex\""));
        assert!(text.contains("values: 1=male"));
        assert!(text.contains("First 2 rows:\n  sex\n  1\n  2\n"));
        assert!(!text.contains("NA"));
    }
}
