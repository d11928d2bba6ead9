//! File eligibility checks and normalization of anomalous file names.
//!
//! Two checks guard the pipeline: links are screened by the extension in their
//! URL before anything is fetched, and downloaded files are screened by the
//! type the download tool declared for them. Names that hide the real
//! extension are rewritten so the RDF parser can guess the format from it.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Tracking suffix some servers append to download URLs.
pub const TRACKING_SUFFIX: &str = "?accessType=DOWNLOAD";

/// Link extensions that are never fetched (markup and images).
pub const INVALID_EXTENSIONS: &[&str] = &["html", "png"];

/// Declared types that are never parsed.
pub const INVALID_TYPES: &[&str] = &["[text/csv]", "[text/html]", "[text/plain]"];

/// Declared type recorded for files the download phase knows nothing about.
pub const UNKNOWN_TYPE: &str = "unknown";

/// Filesystem housekeeping entries that are never pipeline input.
const HOUSEKEEPING_FILES: &[&str] = &[".DS_Store"];

/// Returns the last path segment of a link, without the tracking suffix.
#[must_use]
pub fn link_filename(link: &str) -> &str {
    let last = link.rsplit('/').next().unwrap_or(link);
    last.strip_suffix(TRACKING_SUFFIX).unwrap_or(last)
}

/// Returns the text after the last `.` of `filename` (the whole name if it has none).
#[must_use]
pub fn extension(filename: &str) -> &str {
    filename.rsplit('.').next().unwrap_or(filename)
}

/// Whether the link points to something worth downloading.
#[must_use]
pub fn is_link_eligible(link: &str) -> bool {
    !INVALID_EXTENSIONS.contains(&extension(link_filename(link)))
}

/// Whether a file with the given declared type may be parsed.
#[must_use]
pub fn is_type_parsable(declared_type: &str) -> bool {
    !INVALID_TYPES.contains(&declared_type)
}

/// Computes the normalized form of a downloaded file name.
///
/// - `name?accessType=DOWNLOAD` becomes `name`
/// - `name.ext.N` becomes `name_N.ext` (N all digits)
/// - `name.N` becomes `name_N`
///
/// Returns `None` when the name is already fine.
#[must_use]
pub fn normalize_filename(file: &str) -> Option<String> {
    if let Some(stripped) = file.strip_suffix(TRACKING_SUFFIX) {
        return Some(stripped.to_string());
    }

    let (rest, digits) = file.rsplit_once('.')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    match rest.rsplit_once('.') {
        Some((base, ext)) => Some(format!("{base}_{digits}.{ext}")),
        None => Some(format!("{rest}_{digits}")),
    }
}

/// Renames `dir/file` to its normalized name, returning the name to use from now on.
///
/// `file` may contain subdirectories (archive members); only the final
/// component is rewritten.
pub fn rename_if_weird(dir: &Path, file: &str) -> std::io::Result<String> {
    let (parent, name) = match file.rsplit_once('/') {
        Some((parent, name)) => (Some(parent), name),
        None => (None, file),
    };
    let Some(new_name) = normalize_filename(name) else {
        return Ok(file.to_string());
    };

    let renamed = match parent {
        Some(parent) => format!("{parent}/{new_name}"),
        None => new_name,
    };
    let from: PathBuf = dir.join(file);
    let to: PathBuf = dir.join(&renamed);
    std::fs::rename(&from, &to)?;
    debug!(from = %file, to = %renamed, "renamed file with anomalous name");
    Ok(renamed)
}

/// Lists the regular files directly inside `dir`, sorted, without housekeeping entries.
pub fn list_files(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if HOUSEKEEPING_FILES.contains(&name.as_str()) {
            continue;
        }
        files.push(name);
    }
    files.sort();
    Ok(files)
}

/// Lists every regular file below `dir` as `/`-separated paths relative to it, sorted.
pub fn list_files_recursive(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut files = Vec::new();
    collect_files(dir, "", &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_files(dir: &Path, prefix: &str, files: &mut Vec<String>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let relative = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(&entry.path(), &relative, files)?;
        } else if file_type.is_file() && !HOUSEKEEPING_FILES.contains(&name.as_str()) {
            files.push(relative);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_link_rejected() {
        assert!(!is_link_eligible("http://example.org/index.html"));
    }

    #[test]
    fn test_png_link_rejected() {
        assert!(!is_link_eligible("http://example.org/logo.png"));
    }

    #[test]
    fn test_ttl_link_accepted() {
        assert!(is_link_eligible("http://example.org/data/dump.ttl"));
    }

    #[test]
    fn test_tracking_suffix_stripped_before_extension_check() {
        let link = "http://example.org/files/data.rdf?accessType=DOWNLOAD";
        assert_eq!(link_filename(link), "data.rdf");
        assert!(is_link_eligible(link));
        assert!(!is_link_eligible(
            "http://example.org/files/page.html?accessType=DOWNLOAD"
        ));
    }

    #[test]
    fn test_link_without_extension_accepted() {
        assert!(is_link_eligible("http://example.org/sparql"));
    }

    #[test]
    fn test_extension_of_dotless_name_is_whole_name() {
        assert_eq!(extension("README"), "README");
        assert_eq!(extension("a.tar.gz"), "gz");
    }

    #[test]
    fn test_type_parsable() {
        assert!(!is_type_parsable("[text/html]"));
        assert!(!is_type_parsable("[text/plain]"));
        assert!(!is_type_parsable("[text/csv]"));
        assert!(is_type_parsable("[application/rdf+xml]"));
        assert!(is_type_parsable(UNKNOWN_TYPE));
    }

    #[test]
    fn test_normalize_strips_tracking_suffix() {
        assert_eq!(
            normalize_filename("data.rdf?accessType=DOWNLOAD").as_deref(),
            Some("data.rdf")
        );
    }

    #[test]
    fn test_normalize_moves_numeric_suffix_before_extension() {
        assert_eq!(normalize_filename("name.rdf.2").as_deref(), Some("name_2.rdf"));
        assert_eq!(
            normalize_filename("my.data.ttl.13").as_deref(),
            Some("my.data_13.ttl")
        );
    }

    #[test]
    fn test_normalize_two_segment_numeric_name() {
        assert_eq!(normalize_filename("dump.1").as_deref(), Some("dump_1"));
    }

    #[test]
    fn test_normalize_leaves_regular_names() {
        assert_eq!(normalize_filename("data.ttl"), None);
        assert_eq!(normalize_filename("v2.rdf"), None);
        assert_eq!(normalize_filename("noext"), None);
        assert_eq!(normalize_filename("trailing."), None);
    }

    #[test]
    fn test_rename_if_weird_renames_on_disk() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        std::fs::write(temp.path().join("name.rdf.2"), b"<rdf/>").expect("write");

        let renamed = rename_if_weird(temp.path(), "name.rdf.2").expect("rename");

        assert_eq!(renamed, "name_2.rdf");
        assert!(temp.path().join("name_2.rdf").exists());
        assert!(!temp.path().join("name.rdf.2").exists());
    }

    #[test]
    fn test_rename_if_weird_keeps_member_directory() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        std::fs::create_dir(temp.path().join("bundle")).expect("mkdir");
        std::fs::write(temp.path().join("bundle/a.nt.1"), b"").expect("write");

        let renamed = rename_if_weird(temp.path(), "bundle/a.nt.1").expect("rename");

        assert_eq!(renamed, "bundle/a_1.nt");
        assert!(temp.path().join("bundle/a_1.nt").exists());
    }

    #[test]
    fn test_list_files_skips_directories_and_housekeeping() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        std::fs::write(temp.path().join("b.ttl"), b"").expect("write");
        std::fs::write(temp.path().join("a.rdf"), b"").expect("write");
        std::fs::write(temp.path().join(".DS_Store"), b"").expect("write");
        std::fs::create_dir(temp.path().join("extracted")).expect("mkdir");

        let files = list_files(temp.path()).expect("list");

        assert_eq!(files, vec!["a.rdf".to_string(), "b.ttl".to_string()]);
    }

    #[test]
    fn test_list_files_recursive_uses_relative_paths() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        std::fs::create_dir_all(temp.path().join("nested/deeper")).expect("mkdir");
        std::fs::write(temp.path().join("top.nt"), b"").expect("write");
        std::fs::write(temp.path().join("nested/deeper/x.ttl"), b"").expect("write");

        let files = list_files_recursive(temp.path()).expect("list");

        assert_eq!(
            files,
            vec!["nested/deeper/x.ttl".to_string(), "top.nt".to_string()]
        );
    }

    #[test]
    fn test_rename_if_weird_noop_for_regular_name() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let renamed = rename_if_weird(temp.path(), "data.ttl").expect("noop");
        assert_eq!(renamed, "data.ttl");
    }
}
