//! Extension resolution.
//!
//! Turns a file name or URL into a canonical [`FormatTag`] plus an optional
//! [`Compression`] wrapper. Extensions are read right to left, so
//! `data.tsv.gz` resolves to `tsv` wrapped in gzip.

use super::catalog;
use super::registry::FormatRegistry;
use crate::{Error, Result};
use std::borrow::Borrow;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Canonical, lowercase format identifier.
///
/// Any string is representable so that formats registered at runtime work
/// exactly like built-ins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormatTag(String);

impl FormatTag {
    /// Creates a tag, normalizing case and a leading dot.
    #[must_use]
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().trim().trim_start_matches('.').to_lowercase())
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Preferred file extension for this tag.
    #[must_use]
    pub fn extension(&self) -> &str {
        catalog::lookup(&self.0).map_or(self.as_str(), |info| info.preferred_extension())
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FormatTag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FormatTag {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl Borrow<str> for FormatTag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Compression or container wrapper around an inner file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    /// gzip stream (`.gz`).
    Gzip,
    /// zip archive (`.zip`).
    Zip,
    /// tar archive (`.tar`).
    Tar,
    /// gzipped tar archive (`.tar.gz` or `.tgz`).
    TarGz,
}

impl Compression {
    /// All supported wrappers.
    pub const ALL: [Self; 4] = [Self::Gzip, Self::Zip, Self::Tar, Self::TarGz];

    /// File suffix without the dot.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Gzip => "gz",
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGz => "tgz",
        }
    }

    /// Suffixes that select this wrapper, longest first.
    const fn suffixes(self) -> &'static [&'static str] {
        match self {
            Self::Gzip => &["gz"],
            Self::Zip => &["zip"],
            Self::Tar => &["tar"],
            Self::TarGz => &["tar.gz", "tgz"],
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "gz" | "gzip" => Ok(Self::Gzip),
            "zip" => Ok(Self::Zip),
            "tar" => Ok(Self::Tar),
            "tgz" | "tar.gz" => Ok(Self::TarGz),
            other => Err(Error::InvalidInput(format!(
                "unknown compression suffix: {other}"
            ))),
        }
    }
}

/// Result of resolving a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Inner format.
    pub tag: FormatTag,
    /// Outer wrapper, if any.
    pub compression: Option<Compression>,
}

/// Maps file names to formats.
#[derive(Debug, Clone)]
pub struct ExtensionResolver {
    compression: Vec<Compression>,
}

impl Default for ExtensionResolver {
    fn default() -> Self {
        Self::new(Compression::ALL)
    }
}

impl ExtensionResolver {
    /// Creates a resolver recognizing the given compression wrappers.
    #[must_use]
    pub fn new(compression: impl IntoIterator<Item = Compression>) -> Self {
        Self {
            compression: compression.into_iter().collect(),
        }
    }

    /// Creates a resolver from configured suffix strings.
    ///
    /// # Errors
    ///
    /// Returns an error if a suffix is not a supported wrapper.
    pub fn from_suffixes<S: AsRef<str>>(suffixes: &[S]) -> Result<Self> {
        let compression = suffixes
            .iter()
            .map(|s| s.as_ref().parse())
            .collect::<Result<Vec<Compression>>>()?;
        Ok(Self::new(compression))
    }

    /// Returns the final name component of a path or URL.
    ///
    /// For URLs the query and fragment are ignored.
    #[must_use]
    pub fn file_name(input: &str) -> String {
        if let Ok(url) = url::Url::parse(input) {
            if url.has_host() {
                return url
                    .path_segments()
                    .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
                    .unwrap_or_default()
                    .to_string();
            }
        }
        Path::new(input)
            .file_name()
            .map_or_else(|| input.to_string(), |n| n.to_string_lossy().into_owned())
    }

    /// Returns the lowercase last extension of a name, if any.
    #[must_use]
    pub fn extension(name: &str) -> Option<String> {
        name.rsplit_once('.')
            .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
            .map(|(_, ext)| ext.to_lowercase())
    }

    /// Splits a trailing compression suffix off a file name.
    ///
    /// `data.csv.gz` gives `("data.csv", Some(Gzip))` and `data.csv.tar.gz`
    /// gives `("data.csv", Some(TarGz))`; names without a recognized wrapper
    /// come back unchanged.
    #[must_use]
    pub fn split_compression<'a>(&self, name: &'a str) -> (&'a str, Option<Compression>) {
        let bytes = name.as_bytes();
        let mut best: Option<(usize, Compression)> = None;
        for &compression in &self.compression {
            for suffix in compression.suffixes() {
                let dotted = suffix.len() + 1;
                if bytes.len() <= dotted {
                    continue;
                }
                let tail = &bytes[bytes.len() - dotted..];
                let matches = tail[0] == b'.' && tail[1..].eq_ignore_ascii_case(suffix.as_bytes());
                if matches && best.is_none_or(|(len, _)| dotted > len) {
                    best = Some((dotted, compression));
                }
            }
        }
        match best {
            // The matched tail is ASCII, so the cut is on a char boundary.
            Some((len, compression)) => (&name[..name.len() - len], Some(compression)),
            None => (name, None),
        }
    }

    /// Resolves a path or URL, with an optional explicit format override.
    ///
    /// The override always decides the inner format; a compression suffix on
    /// the name is still honoured.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnrecognizedFormat`] or [`Error::KnownButUnsupported`]
    /// when no registered handler matches.
    pub fn resolve(
        &self,
        input: &str,
        explicit: Option<&str>,
        registry: &FormatRegistry,
    ) -> Result<Resolved> {
        let name = Self::file_name(input);
        let (inner, compression) = self.split_compression(&name);

        let tag = match explicit {
            Some(format) => self.tag_for(format, registry)?,
            None => {
                let ext = Self::extension(inner).ok_or_else(|| Error::UnrecognizedFormat {
                    input: name.clone(),
                })?;
                self.tag_for(&ext, registry)?
            },
        };

        tracing::debug!(input, tag = %tag, compression = ?compression, "Resolved format");
        Ok(Resolved { tag, compression })
    }

    /// Maps an extension or format name to a registered tag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KnownButUnsupported`] for catalog formats without a
    /// handler and [`Error::UnrecognizedFormat`] for anything else unknown.
    pub fn tag_for(&self, format: &str, registry: &FormatRegistry) -> Result<FormatTag> {
        let raw = FormatTag::new(format);
        if raw.as_str().is_empty() {
            return Err(Error::UnrecognizedFormat {
                input: format.to_string(),
            });
        }
        // A handler registered under the literal tag wins over alias mapping.
        if registry.contains(raw.as_str()) {
            return Ok(raw);
        }
        let tag = catalog::canonical_tag(raw.as_str()).map_or(raw, FormatTag::new);

        if registry.contains(tag.as_str()) {
            return Ok(tag);
        }
        match catalog::lookup(tag.as_str()) {
            Some(info) => Err(Error::KnownButUnsupported {
                format: tag.to_string(),
                guidance: info.guidance(),
            }),
            None => Err(Error::UnrecognizedFormat {
                input: format.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn registry() -> FormatRegistry {
        FormatRegistry::with_builtins()
    }

    #[test_case("data.csv", "csv", None ; "plain")]
    #[test_case("FILE.CSV", "csv", None ; "upper case")]
    #[test_case("data.tsv.gz", "tsv", Some(Compression::Gzip) ; "gzip wrapper")]
    #[test_case("data.csv.zip", "csv", Some(Compression::Zip) ; "zip wrapper")]
    #[test_case("dir/data.YML.TAR", "yaml", Some(Compression::Tar) ; "alias and tar")]
    #[test_case("https://example.org/x/data.json?raw=1#top", "json", None ; "url")]
    #[test_case("data.csv.tar.gz", "csv", Some(Compression::TarGz) ; "gzipped tar")]
    #[test_case("DATA.TSV.TGZ", "tsv", Some(Compression::TarGz) ; "tgz shorthand")]
    fn test_resolve(input: &str, tag: &str, compression: Option<Compression>) {
        let resolved = ExtensionResolver::default()
            .resolve(input, None, &registry())
            .unwrap();
        assert_eq!(resolved.tag.as_str(), tag);
        assert_eq!(resolved.compression, compression);
    }

    #[test]
    fn test_explicit_format_overrides_inner_but_keeps_wrapper() {
        let resolved = ExtensionResolver::default()
            .resolve("data.csv.gz", Some("JSON"), &registry())
            .unwrap();
        assert_eq!(resolved.tag.as_str(), "json");
        assert_eq!(resolved.compression, Some(Compression::Gzip));
    }

    #[test]
    fn test_unknown_extension_is_unrecognized() {
        let err = ExtensionResolver::default()
            .resolve("t.unknownext", None, &registry())
            .unwrap_err();
        assert!(matches!(err, Error::UnrecognizedFormat { .. }));
    }

    #[test]
    fn test_no_extension_is_unrecognized() {
        let err = ExtensionResolver::default()
            .resolve("README", None, &registry())
            .unwrap_err();
        assert!(matches!(err, Error::UnrecognizedFormat { .. }));
    }

    #[test]
    fn test_known_elsewhere_is_distinct() {
        let err = ExtensionResolver::default()
            .resolve("t.accdb", None, &registry())
            .unwrap_err();
        match err {
            Error::KnownButUnsupported { format, guidance } => {
                assert_eq!(format, "accdb");
                assert!(guidance.contains("odbc-api"));
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_disabled_wrapper_is_not_split() {
        let resolver = ExtensionResolver::new([Compression::Gzip]);
        assert_eq!(resolver.split_compression("a.csv.zip"), ("a.csv.zip", None));
        assert_eq!(
            resolver.split_compression("a.csv.gz"),
            ("a.csv", Some(Compression::Gzip))
        );
    }

    #[test]
    fn test_stacked_wrapper_falls_back_to_gzip_when_tar_gz_disabled() {
        let resolver = ExtensionResolver::new([Compression::Gzip, Compression::Tar]);
        assert_eq!(
            resolver.split_compression("a.csv.tar.gz"),
            ("a.csv.tar", Some(Compression::Gzip))
        );
        assert_eq!(
            ExtensionResolver::default().split_compression("a.csv.tar.gz"),
            ("a.csv", Some(Compression::TarGz))
        );
        assert_eq!(ExtensionResolver::default().split_compression(".tgz"), (".tgz", None));
    }

    #[test]
    fn test_registered_alias_tag_wins_over_mapping() {
        let registry = FormatRegistry::with_builtins();
        registry
            .register_importer("txt", |_: &Path, _: &crate::HandlerOptions| {
                crate::Table::new(vec![])
            })
            .unwrap();
        let resolver = ExtensionResolver::default();
        assert_eq!(resolver.resolve("notes.txt", None, &registry).unwrap().tag.as_str(), "txt");
        assert_eq!(resolver.resolve("notes.tab", None, &registry).unwrap().tag.as_str(), "tsv");

        let empty = FormatRegistry::empty();
        empty
            .register_importer("yml", |_: &Path, _: &crate::HandlerOptions| {
                crate::Table::new(vec![])
            })
            .unwrap();
        assert_eq!(resolver.resolve("d.yml", None, &empty).unwrap().tag.as_str(), "yml");
        assert!(matches!(
            resolver.resolve("d.yaml", None, &empty),
            Err(Error::KnownButUnsupported { .. })
        ));
    }

    #[test]
    fn test_from_suffixes_rejects_unknown() {
        assert!(ExtensionResolver::from_suffixes(&["gz", "bz2"]).is_err());
        assert!(ExtensionResolver::from_suffixes(&["GZ", ".zip", "tar.gz"]).is_ok());
    }

    #[test]
    fn test_file_name_and_extension() {
        assert_eq!(ExtensionResolver::file_name("/tmp/a/b.csv"), "b.csv");
        assert_eq!(
            ExtensionResolver::file_name("https://bit.ly/3xYz"),
            "3xYz"
        );
        assert_eq!(ExtensionResolver::extension(".hidden"), None);
        assert_eq!(ExtensionResolver::extension("a.B"), Some("b".to_string()));
    }
}
