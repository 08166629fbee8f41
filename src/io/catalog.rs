//! Static table of known formats.
//!
//! Maps extensions to canonical tags and records, for formats tabport does
//! not implement itself, where support can be found. The table is consulted
//! only after the registry, so registering a handler for a listed tag
//! (e.g. `xlsx`) makes it resolve like any built-in.

/// How a catalog format is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    /// Shipped with tabport, optionally behind a Cargo feature.
    Builtin {
        /// Cargo feature that compiles the handler in, if any.
        feature: Option<&'static str>,
    },
    /// Implemented by another crate; register a handler that wraps it.
    Elsewhere {
        /// Where to look.
        guidance: &'static str,
    },
}

/// One known format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    /// Canonical tag.
    pub tag: &'static str,
    /// Recognized extensions, lowercase, first is preferred.
    pub extensions: &'static [&'static str],
    /// Short human-readable name.
    pub description: &'static str,
    /// Support status.
    pub support: Support,
}

impl FormatInfo {
    /// Preferred file extension.
    #[must_use]
    pub fn preferred_extension(&self) -> &'static str {
        self.extensions.first().copied().unwrap_or(self.tag)
    }

    /// Explains how to obtain support, for formats without a registered handler.
    #[must_use]
    pub fn guidance(&self) -> String {
        match self.support {
            Support::Builtin {
                feature: Some(feature),
            } => format!("rebuild tabport with the `{feature}` feature enabled"),
            Support::Builtin { feature: None } => {
                "register the built-in handlers with FormatRegistry::with_builtins()".to_string()
            },
            Support::Elsewhere { guidance } => guidance.to_string(),
        }
    }
}

const BUILTIN: Support = Support::Builtin { feature: None };

static CATALOG: &[FormatInfo] = &[
    FormatInfo {
        tag: "csv",
        extensions: &["csv"],
        description: "Comma-separated values",
        support: BUILTIN,
    },
    FormatInfo {
        tag: "tsv",
        extensions: &["tsv", "tab", "txt"],
        description: "Tab-separated values",
        support: BUILTIN,
    },
    FormatInfo {
        tag: "psv",
        extensions: &["psv"],
        description: "Pipe-separated values",
        support: BUILTIN,
    },
    FormatInfo {
        tag: "json",
        extensions: &["json"],
        description: "JSON records or columns",
        support: BUILTIN,
    },
    FormatInfo {
        tag: "yaml",
        extensions: &["yaml", "yml"],
        description: "YAML sequence of records",
        support: BUILTIN,
    },
    FormatInfo {
        tag: "fwf",
        extensions: &["fwf"],
        description: "Fixed-width text",
        support: BUILTIN,
    },
    FormatInfo {
        tag: "html",
        extensions: &["html", "htm"],
        description: "HTML tables",
        support: BUILTIN,
    },
    FormatInfo {
        tag: "parquet",
        extensions: &["parquet", "pq"],
        description: "Apache Parquet",
        support: Support::Builtin {
            feature: Some("parquet"),
        },
    },
    FormatInfo {
        tag: "feather",
        extensions: &["feather", "arrow", "ipc"],
        description: "Feather / Arrow IPC file",
        support: Support::Builtin {
            feature: Some("feather"),
        },
    },
    FormatInfo {
        tag: "xlsx",
        extensions: &["xlsx", "xlsm"],
        description: "Excel workbook",
        support: Support::Elsewhere {
            guidance: "read with the `calamine` crate or write with `rust_xlsxwriter`, then register the handler",
        },
    },
    FormatInfo {
        tag: "xls",
        extensions: &["xls"],
        description: "Legacy Excel workbook",
        support: Support::Elsewhere {
            guidance: "read with the `calamine` crate and register the handler",
        },
    },
    FormatInfo {
        tag: "ods",
        extensions: &["ods"],
        description: "OpenDocument spreadsheet",
        support: Support::Elsewhere {
            guidance: "read with the `calamine` crate and register the handler",
        },
    },
    FormatInfo {
        tag: "dta",
        extensions: &["dta"],
        description: "Stata data file",
        support: Support::Elsewhere {
            guidance: "use a ReadStat binding (e.g. the `readstat` crate) and register the handler",
        },
    },
    FormatInfo {
        tag: "sav",
        extensions: &["sav", "zsav", "por"],
        description: "SPSS data file",
        support: Support::Elsewhere {
            guidance: "use a ReadStat binding (e.g. the `readstat` crate) and register the handler",
        },
    },
    FormatInfo {
        tag: "sas7bdat",
        extensions: &["sas7bdat"],
        description: "SAS data set",
        support: Support::Elsewhere {
            guidance: "use a ReadStat binding (e.g. the `readstat` crate) and register the handler",
        },
    },
    FormatInfo {
        tag: "xpt",
        extensions: &["xpt"],
        description: "SAS transport file",
        support: Support::Elsewhere {
            guidance: "use a ReadStat binding (e.g. the `readstat` crate) and register the handler",
        },
    },
    FormatInfo {
        tag: "rds",
        extensions: &["rds", "rdata", "rda"],
        description: "R serialized data",
        support: Support::Elsewhere {
            guidance: "read with an R bridge such as the `extendr-api` crate, or export from R to csv or parquet",
        },
    },
    FormatInfo {
        tag: "accdb",
        extensions: &["accdb", "mdb"],
        description: "Microsoft Access database",
        support: Support::Elsewhere {
            guidance: "query it through ODBC with the `odbc-api` crate and register the handler",
        },
    },
    FormatInfo {
        tag: "dbf",
        extensions: &["dbf"],
        description: "dBase table",
        support: Support::Elsewhere {
            guidance: "read with the `dbase` crate and register the handler",
        },
    },
    FormatInfo {
        tag: "mat",
        extensions: &["mat"],
        description: "MATLAB data file",
        support: Support::Elsewhere {
            guidance: "read with the `matfile` crate and register the handler",
        },
    },
    FormatInfo {
        tag: "sqlite",
        extensions: &["sqlite", "sqlite3", "db"],
        description: "SQLite database",
        support: Support::Elsewhere {
            guidance: "query it with the `rusqlite` crate and register the handler",
        },
    },
    FormatInfo {
        tag: "xml",
        extensions: &["xml"],
        description: "XML document",
        support: Support::Elsewhere {
            guidance: "parse it with the `quick-xml` crate and register the handler",
        },
    },
    FormatInfo {
        tag: "fst",
        extensions: &["fst"],
        description: "fst columnar file",
        support: Support::Elsewhere {
            guidance: "no Rust reader exists; export from R to parquet or feather",
        },
    },
];

/// Returns every catalog entry.
#[must_use]
pub fn entries() -> &'static [FormatInfo] {
    CATALOG
}

/// Maps a lowercase extension or alias to its canonical tag.
#[must_use]
pub fn canonical_tag(extension: &str) -> Option<&'static str> {
    CATALOG
        .iter()
        .find(|info| info.tag == extension || info.extensions.contains(&extension))
        .map(|info| info.tag)
}

/// Looks up a catalog entry by canonical tag.
#[must_use]
pub fn lookup(tag: &str) -> Option<&'static FormatInfo> {
    CATALOG.iter().find(|info| info.tag == tag)
}
