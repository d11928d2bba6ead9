//! Decompression dispatch for downloaded archives.
//!
//! The download phase records the type the server declared for every file.
//! During parsing, files declared as zip or gzip are replaced in the pending
//! list by their members, so that only real content files reach the parser.
//!
//! Archives can be left packed on a second run (`decompress = false`) when an
//! earlier run already extracted them; the dispatcher then only rebuilds the
//! pending list from what is on disk.

mod error;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::{debug, info, instrument};

pub use error::ArchiveError;

use crate::files::list_files_recursive;

/// Declared types that mark a file as compressed.
pub const COMPRESSED_TYPES: &[&str] = &[
    "[application/gzip]",
    "[application/x-gzip]",
    "[application/zip]",
    "[zip]",
];

const ZIP_TYPES: &[&str] = &["[application/zip]", "[zip]"];

/// Suffix added to gzip outputs whose name does not end in `.gz`.
const DECOMPRESSED_SUFFIX: &str = ".decompressed";

/// How a compressed file is unpacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Zip container; members go to a folder named after the archive.
    Zip,
    /// Gzipped tarball; members go to a folder named after the archive stem.
    Tar,
    /// Single gzip stream; decompressed next to the archive.
    Gzip,
}

/// Decides how `file` must be unpacked given its declared type.
#[must_use]
pub fn archive_kind(file: &str, declared_type: &str) -> Option<ArchiveKind> {
    if !COMPRESSED_TYPES.contains(&declared_type) {
        return None;
    }
    if ZIP_TYPES.contains(&declared_type) {
        return Some(ArchiveKind::Zip);
    }
    let mut segments = file.rsplit('.');
    let last = segments.next();
    let second_last = segments.next();
    if second_last == Some("tar") || last == Some("tgz") {
        Some(ArchiveKind::Tar)
    } else {
        Some(ArchiveKind::Gzip)
    }
}

/// Unpacks (or, with `decompress` off, re-lists) an archive and folds its
/// members into `pending`.
///
/// The archive name is removed from `pending` before any member is appended.
/// Returns the archive kind, or `None` when the file is not compressed.
///
/// # Errors
///
/// [`ArchiveError::NotDecompressed`] when `decompress` is off and the output of
/// an earlier run is missing; IO and format errors otherwise.
#[instrument(skip(dir, pending), fields(dir = %dir.display()))]
pub fn dispatch(
    dir: &Path,
    file: &str,
    declared_type: &str,
    decompress: bool,
    pending: &mut Vec<String>,
) -> Result<Option<ArchiveKind>, ArchiveError> {
    let Some(kind) = archive_kind(file, declared_type) else {
        return Ok(None);
    };

    if decompress {
        info!(kind = ?kind, "compressed file, extracting");
    } else {
        info!(kind = ?kind, "compressed file, updating pending list");
    }
    if let Some(position) = pending.iter().position(|name| name == file) {
        pending.remove(position);
    }

    match kind {
        ArchiveKind::Zip => handle_zip(dir, file, decompress, pending)?,
        ArchiveKind::Tar => handle_tar(dir, file, decompress, pending)?,
        ArchiveKind::Gzip => handle_gzip(dir, file, decompress, pending)?,
    }
    Ok(Some(kind))
}

/// Folder that receives the members of a zip archive.
#[must_use]
pub fn zip_destination(file: &str) -> String {
    match file.strip_suffix(".zip") {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => format!("{file}_extracted"),
    }
}

/// Folder that receives the members of a tarball.
#[must_use]
pub fn tar_destination(file: &str) -> String {
    let stem = if let Some(stem) = file.strip_suffix(".tgz") {
        stem
    } else {
        let mut parts = file.rsplitn(3, '.');
        parts.next();
        parts.next();
        parts.next().unwrap_or("")
    };
    if stem.is_empty() {
        format!("{file}_extracted")
    } else {
        stem.to_string()
    }
}

/// Name of the file a plain gzip stream decompresses to.
#[must_use]
pub fn gzip_output(file: &str) -> String {
    match file.strip_suffix(".gz") {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => format!("{file}{DECOMPRESSED_SUFFIX}"),
    }
}

fn handle_zip(
    dir: &Path,
    file: &str,
    decompress: bool,
    pending: &mut Vec<String>,
) -> Result<(), ArchiveError> {
    let destination = zip_destination(file);
    let dest_path = dir.join(&destination);

    if decompress {
        let archive_path = dir.join(file);
        let archive_file =
            File::open(&archive_path).map_err(|e| ArchiveError::io(&archive_path, e))?;
        let mut archive = zip::ZipArchive::new(BufReader::new(archive_file))
            .map_err(|e| ArchiveError::zip(&archive_path, e))?;
        archive
            .extract(&dest_path)
            .map_err(|e| ArchiveError::zip(&archive_path, e))?;
    } else if !dest_path.is_dir() {
        return Err(ArchiveError::not_decompressed(file, destination));
    }

    let members = list_files_recursive(&dest_path).map_err(|e| ArchiveError::io(&dest_path, e))?;
    info!(
        members = members.len(),
        destination = %dest_path.display(),
        "zip members collected"
    );
    pending.extend(members.into_iter().map(|m| format!("{destination}/{m}")));
    Ok(())
}

fn handle_tar(
    dir: &Path,
    file: &str,
    decompress: bool,
    pending: &mut Vec<String>,
) -> Result<(), ArchiveError> {
    let archive_path = dir.join(file);
    let destination = tar_destination(file);
    let dest_path = dir.join(&destination);

    let members = tar_members(&archive_path)?;
    debug!(?members, "tar content");

    if decompress {
        let archive_file =
            File::open(&archive_path).map_err(|e| ArchiveError::io(&archive_path, e))?;
        tar::Archive::new(GzDecoder::new(BufReader::new(archive_file)))
            .unpack(&dest_path)
            .map_err(|e| ArchiveError::io(&dest_path, e))?;
    } else if let Some(missing) = members.iter().find(|m| !dest_path.join(m).is_file()) {
        return Err(ArchiveError::not_decompressed(
            file,
            format!("{destination}/{missing}"),
        ));
    }

    info!(
        members = members.len(),
        destination = %dest_path.display(),
        "tar members collected"
    );
    pending.extend(members.into_iter().map(|m| format!("{destination}/{m}")));
    Ok(())
}

fn tar_members(archive_path: &Path) -> Result<Vec<String>, ArchiveError> {
    let io_err = |e| ArchiveError::io(archive_path, e);
    let archive_file = File::open(archive_path).map_err(io_err)?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(archive_file)));

    let mut members = Vec::new();
    for entry in archive.entries().map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path().map_err(io_err)?;
        let member = path.to_string_lossy();
        members.push(member.trim_start_matches("./").to_string());
    }
    Ok(members)
}

fn handle_gzip(
    dir: &Path,
    file: &str,
    decompress: bool,
    pending: &mut Vec<String>,
) -> Result<(), ArchiveError> {
    let output = gzip_output(file);
    let already_listed = pending.iter().any(|name| *name == output);

    if decompress {
        let archive_path = dir.join(file);
        let output_path = dir.join(&output);
        let input = File::open(&archive_path).map_err(|e| ArchiveError::io(&archive_path, e))?;
        let target = File::create(&output_path).map_err(|e| ArchiveError::io(&output_path, e))?;
        let mut decoder = GzDecoder::new(BufReader::new(input));
        let mut writer = BufWriter::new(target);
        std::io::copy(&mut decoder, &mut writer).map_err(|e| ArchiveError::io(&archive_path, e))?;
        writer.flush().map_err(|e| ArchiveError::io(&output_path, e))?;
        info!(output = %output, "decompressed gzip file");
        if !already_listed {
            pending.push(output);
        }
        return Ok(());
    }

    if already_listed {
        debug!(output = %output, "already in the pending list");
        Ok(())
    } else {
        Err(ArchiveError::not_decompressed(file, output))
    }
}
