//! Remote sources fetched over HTTP(S).
//!
//! Redirects are followed, so shortened links resolve to their target.
//! Google Sheets share links are rewritten to the sheet's CSV export.

use crate::config::HttpConfig;
use crate::{Error, Result, SourceFailure};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Hosts of common link shorteners.
pub const SHORTENER_HOSTS: &[&str] = &[
    "bit.ly", "tinyurl.com", "t.co", "goo.gl", "ow.ly", "is.gd", "buff.ly", "rb.gy",
];

static SHEETS_PATH: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^/spreadsheets/d/([A-Za-z0-9_-]+)").ok());

static GID: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?:^|[&#?])gid=([0-9]+)").ok());

/// Returns whether the host is a known link shortener.
#[must_use]
pub fn is_shortener(host: &str) -> bool {
    let host = host.trim_start_matches("www.");
    SHORTENER_HOSTS.contains(&host)
}

/// Rewrites a Google Sheets share link to its CSV export URL.
///
/// Returns the export URL and the file name hint `<id>.csv`, or `None` for
/// other URLs. The sheet tab (`gid`) is taken from the query or fragment.
#[must_use]
pub fn rewrite_google_sheets(url: &Url) -> Option<(Url, String)> {
    if url.host_str() != Some("docs.google.com") {
        return None;
    }
    let id = SHEETS_PATH
        .as_ref()?
        .captures(url.path())?
        .get(1)?
        .as_str()
        .to_string();

    let gid = GID.as_ref().and_then(|re| {
        [url.query(), url.fragment()]
            .into_iter()
            .flatten()
            .find_map(|part| re.captures(part).and_then(|c| c.get(1)))
            .map(|m| m.as_str().to_string())
    });

    let mut export = url.clone();
    export.set_path(&format!("/spreadsheets/d/{id}/export"));
    export.set_fragment(None);
    match gid {
        Some(gid) => export.set_query(Some(&format!("format=csv&gid={gid}"))),
        None => export.set_query(Some("format=csv")),
    }
    Some((export, format!("{id}.csv")))
}

/// Maps a `Content-Type` (without parameters) to a file extension.
#[must_use]
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    let ext = match essence.as_str() {
        "text/csv" | "application/csv" => "csv",
        "text/tab-separated-values" => "tsv",
        "text/plain" => "txt",
        "application/json" | "application/x-ndjson" => "json",
        "application/yaml" | "application/x-yaml" | "text/yaml" | "text/x-yaml" => "yaml",
        "text/html" => "html",
        "application/vnd.apache.parquet" | "application/x-parquet" => "parquet",
        "application/vnd.apache.arrow.file" => "feather",
        "application/zip" | "application/x-zip-compressed" => "zip",
        "application/gzip" | "application/x-gzip" => "gz",
        "application/x-tar" => "tar",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => "xlsx",
        "application/vnd.ms-excel" => "xls",
        "application/vnd.oasis.opendocument.spreadsheet" => "ods",
        "application/xml" | "text/xml" => "xml",
        _ => return None,
    };
    Some(ext)
}

/// File name hint for a downloaded resource.
///
/// Uses the last path segment of the final URL; when it has no extension,
/// one is derived from the content type.
#[must_use]
pub fn name_hint(final_url: &Url, content_type: Option<&str>) -> String {
    let segment = final_url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .filter(|s| *s != "." && *s != "..")
        .unwrap_or("download")
        .to_string();

    let has_extension = segment
        .rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && !ext.is_empty());
    if has_extension {
        return segment;
    }
    match content_type.and_then(extension_for_content_type) {
        Some(ext) => format!("{segment}.{ext}"),
        None => segment,
    }
}

/// Blocking HTTP fetcher for remote sources.
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    client: reqwest::blocking::Client,
}

impl Default for RemoteFetcher {
    fn default() -> Self {
        Self::new(&HttpConfig::default())
    }
}

impl RemoteFetcher {
    /// Builds a fetcher with the configured timeout and user agent.
    #[must_use]
    pub fn new(config: &HttpConfig) -> Self {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(10));
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }

        let client = builder.build().unwrap_or_else(|err| {
            tracing::warn!("Failed to build HTTP client: {err}");
            reqwest::blocking::Client::new()
        });
        Self { client }
    }

    /// Downloads `url` into `staging` and returns the file path and name hint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceResolution`] with [`SourceFailure::Fetch`] on
    /// transport errors and non-success statuses.
    #[tracing::instrument(skip(self, staging))]
    pub fn fetch(&self, url: &str, staging: &Path) -> Result<(PathBuf, String)> {
        let fetch_failure = |cause: String| Error::SourceResolution {
            source_identity: url.to_string(),
            reason: SourceFailure::Fetch(cause),
        };

        let parsed = Url::parse(url).map_err(|e| fetch_failure(e.to_string()))?;
        let (request_url, sheet_name) = match rewrite_google_sheets(&parsed) {
            Some((export, name)) => {
                tracing::debug!(export = %export, "Rewrote Google Sheets link");
                (export, Some(name))
            },
            None => (parsed, None),
        };
        let shortened = request_url.host_str().is_some_and(is_shortener);

        let response = self
            .client
            .get(request_url.clone())
            .send()
            .map_err(|e| fetch_failure(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_failure(format!("HTTP {status}")));
        }

        let final_url = response.url().clone();
        if shortened || final_url != request_url {
            tracing::info!(from = %request_url, to = %final_url, "Followed redirect");
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let name = sheet_name.unwrap_or_else(|| name_hint(&final_url, content_type.as_deref()));

        let body = response
            .bytes()
            .map_err(|e| fetch_failure(e.to_string()))?;
        let path = staging.join(&name);
        std::fs::write(&path, &body).map_err(|e| Error::SourceResolution {
            source_identity: url.to_string(),
            reason: SourceFailure::Io(e.to_string()),
        })?;

        tracing::debug!(bytes = body.len(), name = %name, "Fetched remote source");
        Ok((path, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_google_sheets_rewrite() {
        let (export, name) = rewrite_google_sheets(&url(
            "https://docs.google.com/spreadsheets/d/1AbC_d-9/edit?usp=sharing#gid=42",
        ))
        .unwrap();
        assert_eq!(
            export.as_str(),
            "https://docs.google.com/spreadsheets/d/1AbC_d-9/export?format=csv&gid=42"
        );
        assert_eq!(name, "1AbC_d-9.csv");
    }

    #[test]
    fn test_google_sheets_without_gid() {
        let (export, _) =
            rewrite_google_sheets(&url("https://docs.google.com/spreadsheets/d/xyz/edit")).unwrap();
        assert_eq!(
            export.as_str(),
            "https://docs.google.com/spreadsheets/d/xyz/export?format=csv"
        );
        assert!(rewrite_google_sheets(&url("https://docs.google.com/document/d/xyz")).is_none());
        assert!(rewrite_google_sheets(&url("https://example.org/spreadsheets/d/xyz")).is_none());
    }

    #[test_case("text/csv; charset=utf-8", Some("csv") ; "csv with params")]
    #[test_case("Application/JSON", Some("json") ; "case insensitive")]
    #[test_case("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet", Some("xlsx") ; "xlsx")]
    #[test_case("application/octet-stream", None ; "unknown")]
    fn test_content_type_mapping(content_type: &str, expected: Option<&str>) {
        assert_eq!(extension_for_content_type(content_type), expected);
    }

    #[test]
    fn test_name_hint() {
        assert_eq!(name_hint(&url("https://x.org/data/t.csv?dl=1"), None), "t.csv");
        assert_eq!(
            name_hint(&url("https://x.org/api/export"), Some("text/csv")),
            "export.csv"
        );
        assert_eq!(name_hint(&url("https://x.org/"), Some("application/json")), "download.json");
    }

    #[test]
    fn test_shorteners() {
        assert!(is_shortener("bit.ly"));
        assert!(is_shortener("www.tinyurl.com"));
        assert!(!is_shortener("example.org"));
    }

    #[test]
    fn test_fetch_unreachable_host_is_fetch_failure() {
        let fetcher = RemoteFetcher::new(&HttpConfig {
            timeout_secs: 2,
            ..HttpConfig::default()
        });
        let staging = tempfile::TempDir::new().unwrap();
        let err = fetcher
            .fetch("http://127.0.0.1:9/t.csv", staging.path())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::SourceResolution {
                reason: SourceFailure::Fetch(_),
                ..
            }
        ));
    }
}
