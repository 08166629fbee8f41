//! Uniform metadata attached to tables and columns.
//!
//! Handlers translate whatever their format carries (variable labels, value
//! labels, storage widths, field metadata) into these structures, so callers
//! see the same shape regardless of where a table came from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-column metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    /// Human-readable variable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Value code to label mapping (e.g. `"1" => "male"`).
    ///
    /// Attached as metadata only; the column data is never recoded.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub value_labels: BTreeMap<String, String>,
    /// Storage type name (`integer`, `double`, `logical`, `character`, or
    /// a format-specific name such as `int32`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
    /// Display format hint (e.g. a fixed width or a print format).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Any further format-specific attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl ColumnMeta {
    /// Sets the variable label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Adds a value label.
    #[must_use]
    pub fn with_value_label(mut self, code: impl Into<String>, label: impl Into<String>) -> Self {
        self.value_labels.insert(code.into(), label.into());
        self
    }

    /// Adds a free-form attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns whether no metadata is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.value_labels.is_empty()
            && self.storage_type.is_none()
            && self.format.is_none()
            && self.attributes.is_empty()
    }
}

/// Table-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMeta {
    /// Table (sheet, section) name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Where the table was read from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Format tag the table was read with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Any further format-specific attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_meta_builder() {
        let meta = ColumnMeta::default()
            .with_label("Respondent sex")
            .with_value_label("1", "male")
            .with_value_label("2", "female");
        assert_eq!(meta.label.as_deref(), Some("Respondent sex"));
        assert_eq!(meta.value_labels.len(), 2);
        assert!(!meta.is_empty());
        assert!(ColumnMeta::default().is_empty());
    }

    #[test]
    fn test_empty_fields_are_skipped_in_json() {
        let meta = ColumnMeta::default().with_label("x");
        let json = serde_json::to_string(&meta).unwrap_or_default();
        assert_eq!(json, r#"{"label":"x"}"#);
    }
}
