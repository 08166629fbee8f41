//! Unpacking and packing of gzip, zip, tar and gzipped tar wrappers.
//!
//! Gzip wraps exactly one stream. Zip and tar archives may hold several
//! files; unpacking picks the one named by `member`, or the only regular
//! file when no member is given.

use crate::io::resolver::Compression;
use crate::{Error, Result, SourceFailure};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

/// An extracted file and the name used to resolve its format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unpacked {
    /// Path of the extracted file inside the staging directory.
    pub path: PathBuf,
    /// File name of the extracted member.
    pub name: String,
}

fn failure(identity: &str, reason: SourceFailure) -> Error {
    Error::SourceResolution {
        source_identity: identity.to_string(),
        reason,
    }
}

fn io_failure(identity: &str) -> impl Fn(io::Error) -> Error + '_ {
    move |e| failure(identity, SourceFailure::Io(e.to_string()))
}

/// Last path component of an archive entry name.
fn base_name(entry: &str) -> &str {
    entry
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(entry)
}

/// Picks the entry to extract from a list of regular-file entry names.
fn choose<'a>(entries: &'a [String], member: Option<&str>, identity: &str) -> Result<&'a str> {
    if let Some(member) = member {
        return entries
            .iter()
            .find(|entry| entry.as_str() == member)
            .or_else(|| entries.iter().find(|entry| base_name(entry) == member))
            .map(String::as_str)
            .ok_or_else(|| failure(identity, SourceFailure::MemberNotFound(member.to_string())));
    }
    match entries {
        [only] => Ok(only),
        _ => Err(failure(
            identity,
            SourceFailure::AmbiguousArchive {
                count: entries.len(),
            },
        )),
    }
}

fn extract(mut reader: impl Read, dest: &Path, identity: &str) -> Result<()> {
    let mut out = BufWriter::new(File::create(dest).map_err(io_failure(identity))?);
    io::copy(&mut reader, &mut out).map_err(io_failure(identity))?;
    out.flush().map_err(io_failure(identity))
}

/// Unpacks `archive` into `staging`.
///
/// `inner_name` is the archive's file name without the wrapper suffix; it
/// names the output of a gzip stream.
///
/// # Errors
///
/// Returns [`Error::SourceResolution`] if the archive is corrupt, holds no
/// or several candidate files, or lacks the requested member.
pub fn unpack(
    compression: Compression,
    archive: &Path,
    inner_name: &str,
    member: Option<&str>,
    staging: &Path,
    identity: &str,
) -> Result<Unpacked> {
    let file = File::open(archive).map_err(io_failure(identity))?;
    let unpacked = match compression {
        Compression::Gzip => {
            let name = inner_name.to_string();
            let path = staging.join(&name);
            extract(MultiGzDecoder::new(BufReader::new(file)), &path, identity)?;
            Unpacked { path, name }
        },
        Compression::Zip => unpack_zip(file, member, staging, identity)?,
        Compression::Tar => unpack_tar(
            || {
                let file = File::open(archive).map_err(io_failure(identity))?;
                Ok(BufReader::new(file))
            },
            member,
            staging,
            identity,
        )?,
        Compression::TarGz => unpack_tar(
            || {
                let file = File::open(archive).map_err(io_failure(identity))?;
                Ok(MultiGzDecoder::new(BufReader::new(file)))
            },
            member,
            staging,
            identity,
        )?,
    };
    tracing::debug!(
        archive = %archive.display(),
        compression = %compression,
        member = %unpacked.name,
        "Unpacked archive"
    );
    Ok(unpacked)
}

fn unpack_zip(file: File, member: Option<&str>, staging: &Path, identity: &str) -> Result<Unpacked> {
    let zip_failure = |e: zip::result::ZipError| failure(identity, SourceFailure::Io(e.to_string()));
    let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(zip_failure)?;

    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(zip_failure)?;
        // Entries escaping the archive root are never extracted.
        if entry.is_file() && entry.enclosed_name().is_some() && !entry.name().starts_with("__MACOSX/") {
            entries.push(entry.name().to_string());
        }
    }

    let chosen = choose(&entries, member, identity)?.to_string();
    let name = base_name(&chosen).to_string();
    let path = staging.join(&name);
    let entry = archive.by_name(&chosen).map_err(zip_failure)?;
    extract(entry, &path, identity)?;
    Ok(Unpacked { path, name })
}

fn unpack_tar<R: Read>(
    open_stream: impl Fn() -> Result<R>,
    member: Option<&str>,
    staging: &Path,
    identity: &str,
) -> Result<Unpacked> {
    let open = || open_stream().map(tar::Archive::new);

    let mut entries = Vec::new();
    let mut listing = open()?;
    for entry in listing.entries().map_err(io_failure(identity))? {
        let entry = entry.map_err(io_failure(identity))?;
        if entry.header().entry_type().is_file() {
            let path = entry.path().map_err(io_failure(identity))?;
            entries.push(path.to_string_lossy().into_owned());
        }
    }

    let chosen = choose(&entries, member, identity)?.to_string();
    let name = base_name(&chosen).to_string();
    let path = staging.join(&name);

    // Tar is a stream; the second pass extracts the chosen entry.
    let mut extracting = open()?;
    for entry in extracting.entries().map_err(io_failure(identity))? {
        let entry = entry.map_err(io_failure(identity))?;
        let matches = entry
            .path()
            .map(|p| p.to_string_lossy() == chosen.as_str())
            .unwrap_or(false);
        if matches && entry.header().entry_type().is_file() {
            extract(entry, &path, identity)?;
            return Ok(Unpacked { path, name });
        }
    }
    Err(failure(identity, SourceFailure::MemberNotFound(chosen)))
}

fn pack_error(e: impl std::fmt::Display) -> Error {
    Error::operation("pack_archive", e)
}

/// Packs `inner` into `out` as a single-entry archive named `entry_name`.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if reading or writing fails.
pub fn pack(compression: Compression, inner: &Path, entry_name: &str, out: &Path) -> Result<()> {
    let target = File::create(out).map_err(pack_error)?;

    match compression {
        Compression::Gzip => {
            let mut source = File::open(inner).map_err(pack_error)?;
            let mut encoder = GzEncoder::new(BufWriter::new(target), flate2::Compression::default());
            io::copy(&mut source, &mut encoder).map_err(pack_error)?;
            encoder
                .finish()
                .and_then(|mut w| w.flush())
                .map_err(pack_error)?;
        },
        Compression::Zip => {
            let mut source = File::open(inner).map_err(pack_error)?;
            let mut writer = zip::ZipWriter::new(target);
            let options =
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
            writer
                .start_file(entry_name, options)
                .map_err(pack_error)?;
            io::copy(&mut source, &mut writer).map_err(pack_error)?;
            writer.finish().map_err(pack_error)?;
        },
        Compression::Tar => {
            let mut builder = tar::Builder::new(BufWriter::new(target));
            builder
                .append_path_with_name(inner, entry_name)
                .map_err(pack_error)?;
            builder
                .into_inner()
                .and_then(|mut w| w.flush())
                .map_err(pack_error)?;
        },
        Compression::TarGz => {
            let encoder = GzEncoder::new(BufWriter::new(target), flate2::Compression::default());
            let mut builder = tar::Builder::new(encoder);
            builder
                .append_path_with_name(inner, entry_name)
                .map_err(pack_error)?;
            builder
                .into_inner()
                .and_then(GzEncoder::finish)
                .and_then(|mut w| w.flush())
                .map_err(pack_error)?;
        },
    }
    Ok(())
}
