//! Format listing command handler.

use tabport::io::catalog;
use tabport::{Direction, FormatRegistry, Result};

/// Formats command.
pub fn cmd_formats() -> Result<()> {
    print!("{}", format_table(&FormatRegistry::shared()));
    Ok(())
}

fn mark(supported: bool) -> &'static str {
    if supported { "yes" } else { "-" }
}

/// One line per catalog entry, then any runtime-registered tags.
fn format_table(registry: &FormatRegistry) -> String {
    let mut lines = vec![format!(
        "{:<10} {:<24} {:<7} {:<7} {}",
        "FORMAT", "EXTENSIONS", "IMPORT", "EXPORT", "DESCRIPTION"
    )];

    for info in catalog::entries() {
        let mut description = info.description.to_string();
        if !registry.contains(info.tag) {
            description = format!("{description} ({})", info.guidance());
        }
        lines.push(format!(
            "{:<10} {:<24} {:<7} {:<7} {}",
            info.tag,
            info.extensions.join(","),
            mark(registry.supports(info.tag, Direction::Import)),
            mark(registry.supports(info.tag, Direction::Export)),
            description
        ));
    }

    for tag in registry.tags() {
        if catalog::lookup(tag.as_str()).is_none() {
            lines.push(format!(
                "{:<10} {:<24} {:<7} {:<7} registered at runtime",
                tag.as_str(),
                tag.as_str(),
                mark(registry.supports(tag.as_str(), Direction::Import)),
                mark(registry.supports(tag.as_str(), Direction::Export)),
            ));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_table_marks_support() {
        let registry = FormatRegistry::with_builtins();
        let text = format_table(&registry);
        let html = text.lines().find(|l| l.starts_with("html ")).unwrap();
        assert!(html.contains(" -       yes"));
        let accdb = text.lines().find(|l| l.starts_with("accdb ")).unwrap();
        assert!(accdb.contains('('));
    }
}
