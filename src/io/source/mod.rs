//! Source location: turns a [`SourceSpec`] into a readable local file.
//!
//! Local paths are used in place. URLs, clipboard text and archive members
//! are staged into a temporary directory that lives as long as the returned
//! [`LocatedSource`].

mod archive;
mod clipboard;
mod remote;

pub use archive::{Unpacked, pack, unpack};
pub use clipboard::{Clipboard, MemoryClipboard};
#[cfg(feature = "system-clipboard")]
pub use clipboard::SystemClipboard;
pub use remote::{
    RemoteFetcher, SHORTENER_HOSTS, extension_for_content_type, is_shortener, name_hint,
    rewrite_google_sheets,
};

use super::resolver::ExtensionResolver;
use crate::{Error, Result, SourceFailure};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// File name given to clipboard contents.
pub const CLIPBOARD_NAME: &str = "clipboard.tsv";

/// Where a table is read from or written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Local filesystem path.
    Path(PathBuf),
    /// Remote `http` or `https` URL.
    Url(String),
    /// The system clipboard.
    Clipboard,
}

/// A source or target: a location plus an optional archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    /// Where the data lives.
    pub location: Location,
    /// Archive member to read, for zip and tar sources.
    pub member: Option<String>,
}

impl SourceSpec {
    /// Parses a user-supplied string.
    ///
    /// `clipboard` (any case) selects the clipboard, strings with an
    /// `http://` or `https://` scheme are URLs, and everything else is a
    /// path.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let lower = trimmed.to_lowercase();
        let location = if lower == "clipboard" {
            Location::Clipboard
        } else if ["http://", "https://"]
            .iter()
            .any(|scheme| lower.starts_with(scheme))
        {
            Location::Url(trimmed.to_string())
        } else {
            Location::Path(PathBuf::from(input))
        };
        Self {
            location,
            member: None,
        }
    }

    /// A local path.
    #[must_use]
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::Path(path.into()),
            member: None,
        }
    }

    /// A remote URL.
    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            location: Location::Url(url.into()),
            member: None,
        }
    }

    /// The clipboard.
    #[must_use]
    pub const fn clipboard() -> Self {
        Self {
            location: Location::Clipboard,
            member: None,
        }
    }

    /// Selects an archive member.
    #[must_use]
    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }

    /// Display form used in errors and metadata.
    #[must_use]
    pub fn identity(&self) -> String {
        match &self.location {
            Location::Path(path) => path.display().to_string(),
            Location::Url(url) => url.clone(),
            Location::Clipboard => "clipboard".to_string(),
        }
    }

    /// File name used for format resolution before anything is fetched.
    #[must_use]
    pub fn file_name(&self) -> String {
        match &self.location {
            Location::Path(path) => path
                .file_name()
                .map_or_else(|| self.identity(), |n| n.to_string_lossy().into_owned()),
            Location::Url(url) => ExtensionResolver::file_name(url),
            Location::Clipboard => CLIPBOARD_NAME.to_string(),
        }
    }

    /// Returns whether this is the clipboard.
    #[must_use]
    pub const fn is_clipboard(&self) -> bool {
        matches!(self.location, Location::Clipboard)
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity())
    }
}

impl From<&str> for SourceSpec {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for SourceSpec {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<&Path> for SourceSpec {
    fn from(path: &Path) -> Self {
        Self::path(path)
    }
}

impl From<PathBuf> for SourceSpec {
    fn from(path: PathBuf) -> Self {
        Self::path(path)
    }
}

impl From<&PathBuf> for SourceSpec {
    fn from(path: &PathBuf) -> Self {
        Self::path(path.clone())
    }
}

impl From<&SourceSpec> for SourceSpec {
    fn from(spec: &SourceSpec) -> Self {
        spec.clone()
    }
}

/// A source staged as a readable local file.
#[derive(Debug)]
pub struct LocatedSource {
    /// Readable local file.
    pub path: PathBuf,
    /// File name to resolve the format from.
    pub name: String,
    /// Display form of the original source.
    pub identity: String,
    _staging: Option<TempDir>,
}

/// A validated export target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedTarget {
    /// Final location.
    pub path: PathBuf,
    /// File name to resolve the format from.
    pub name: String,
}

/// Resolves sources to local files.
#[derive(Clone)]
pub struct SourceLocator {
    resolver: ExtensionResolver,
    fetcher: RemoteFetcher,
    clipboard: Option<Arc<dyn Clipboard>>,
}

impl fmt::Debug for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceLocator")
            .field("resolver", &self.resolver)
            .field("clipboard", &self.clipboard.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for SourceLocator {
    fn default() -> Self {
        Self::new(ExtensionResolver::default(), RemoteFetcher::default())
    }
}

impl SourceLocator {
    /// Creates a locator.
    #[must_use]
    pub const fn new(resolver: ExtensionResolver, fetcher: RemoteFetcher) -> Self {
        Self {
            resolver,
            fetcher,
            clipboard: None,
        }
    }

    /// Sets the clipboard provider.
    #[must_use]
    pub fn with_clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    /// Returns the clipboard provider.
    ///
    /// # Errors
    ///
    /// Returns [`SourceFailure::Clipboard`] if none is configured.
    pub fn clipboard(&self) -> Result<&Arc<dyn Clipboard>> {
        self.clipboard.as_ref().ok_or_else(|| Error::SourceResolution {
            source_identity: "clipboard".to_string(),
            reason: SourceFailure::Clipboard("no clipboard provider configured".to_string()),
        })
    }

    /// The resolver used to split compression suffixes.
    #[must_use]
    pub const fn resolver(&self) -> &ExtensionResolver {
        &self.resolver
    }

    /// Stages a source as a readable local file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceResolution`] if the file is missing, the fetch
    /// fails, the clipboard is unavailable, or an archive member cannot be
    /// chosen.
    #[tracing::instrument(skip(self, spec), fields(source = %spec))]
    pub fn open(&self, spec: &SourceSpec) -> Result<LocatedSource> {
        let identity = spec.identity();
        let io_failure = |e: std::io::Error| Error::SourceResolution {
            source_identity: identity.clone(),
            reason: SourceFailure::Io(e.to_string()),
        };

        let mut staging: Option<TempDir> = None;
        let (path, name) = match &spec.location {
            Location::Path(path) => {
                if !path.is_file() {
                    return Err(Error::SourceResolution {
                        source_identity: identity,
                        reason: SourceFailure::NotFound,
                    });
                }
                (path.clone(), spec.file_name())
            },
            Location::Url(url) => {
                let dir = TempDir::new().map_err(io_failure)?;
                let fetched = self.fetcher.fetch(url, dir.path())?;
                staging = Some(dir);
                fetched
            },
            Location::Clipboard => {
                let text = self.clipboard()?.read_text().map_err(|e| Error::SourceResolution {
                    source_identity: identity.clone(),
                    reason: SourceFailure::Clipboard(e.to_string()),
                })?;
                let dir = TempDir::new().map_err(io_failure)?;
                let path = dir.path().join(CLIPBOARD_NAME);
                std::fs::write(&path, text).map_err(io_failure)?;
                staging = Some(dir);
                (path, CLIPBOARD_NAME.to_string())
            },
        };

        let (inner_name, compression) = self.resolver.split_compression(&name);
        let Some(compression) = compression else {
            if spec.member.is_some() {
                tracing::debug!(name = %name, "Ignoring member for a file that is not an archive");
            }
            return Ok(LocatedSource {
                path,
                name,
                identity,
                _staging: staging,
            });
        };

        let dir = match staging {
            Some(dir) => dir,
            None => TempDir::new().map_err(io_failure)?,
        };
        let unpacked = unpack(
            compression,
            &path,
            inner_name,
            spec.member.as_deref(),
            dir.path(),
            &identity,
        )?;
        Ok(LocatedSource {
            path: unpacked.path,
            name: unpacked.name,
            identity,
            _staging: Some(dir),
        })
    }

    /// Validates an export target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for URL and clipboard targets and
    /// [`Error::SourceResolution`] if the parent directory does not exist.
    pub fn stage_target(&self, spec: &SourceSpec) -> Result<StagedTarget> {
        match &spec.location {
            Location::Path(path) => {
                let parent = parent_dir(path);
                if !parent.is_dir() {
                    return Err(Error::SourceResolution {
                        source_identity: spec.identity(),
                        reason: SourceFailure::NotFound,
                    });
                }
                Ok(StagedTarget {
                    path: path.clone(),
                    name: spec.file_name(),
                })
            },
            Location::Url(url) => Err(Error::InvalidInput(format!(
                "cannot export to a URL: {url}"
            ))),
            Location::Clipboard => Err(Error::InvalidInput(
                "clipboard targets are written by the export service".to_string(),
            )),
        }
    }
}

/// Directory a path lives in; `.` for bare file names.
#[must_use]
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
