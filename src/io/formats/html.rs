//! HTML tables (export only).
//!
//! Writes one `<h2>` heading and `<table>` per named table, in set order.
//! This is the built-in multi-section format: `export_set` with several
//! tables produces one document with several sections.

use super::create_writer;
use crate::io::traits::{Exporter, HandlerOptions};
use crate::models::{Table, TableSet};
use crate::{Error, Result};
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

/// HTML table writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTables;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_table(out: &mut String, name: &str, table: &Table) -> std::fmt::Result {
    writeln!(out, "<h2>{}</h2>", escape(name))?;
    writeln!(out, "<table>")?;
    out.push_str("<thead><tr>");
    for column in table.columns() {
        match &column.meta.label {
            Some(label) => write!(
                out,
                "<th title=\"{}\">{}</th>",
                escape(label),
                escape(&column.name)
            )?,
            None => write!(out, "<th>{}</th>", escape(&column.name))?,
        }
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for row in table.rows() {
        out.push_str("<tr>");
        for value in row {
            write!(out, "<td>{}</td>", escape(&value.to_cell().unwrap_or_default()))?;
        }
        out.push_str("</tr>\n");
    }
    writeln!(out, "</tbody>\n</table>")
}

impl Exporter for HtmlTables {
    fn export(&self, tables: &TableSet, path: &Path, options: &HandlerOptions) -> Result<()> {
        let title = options.get("title").unwrap_or("tabport export");

        let mut document = String::new();
        let rendered = (|| -> std::fmt::Result {
            writeln!(document, "<!DOCTYPE html>")?;
            writeln!(document, "<html>")?;
            writeln!(
                document,
                "<head><meta charset=\"utf-8\"><title>{}</title></head>",
                escape(title)
            )?;
            writeln!(document, "<body>")?;
            for named in tables.iter() {
                render_table(&mut document, &named.name, &named.table)?;
            }
            writeln!(document, "</body>\n</html>")
        })();
        rendered.map_err(|e| Error::operation("render_html", e))?;

        let mut writer = create_writer(path)?;
        writer
            .write_all(document.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|e| Error::operation("write_html", e))?;
        Ok(())
    }

    fn supports_multiple(&self) -> bool {
        true
    }
}
