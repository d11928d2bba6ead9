//! Persistence of run artifacts.
//!
//! Results tables are `;`-separated CSV with a header row; statistics, link
//! mappings and extracted content are JSON. Every writer rewrites its file
//! from scratch, so artifacts can be refreshed after each dataset.

mod error;
mod layout;
mod records;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use error::OutputError;
pub use layout::OutputLayout;
pub use records::{CsvRow, DeclaredTypes, DownloadRecord, DownloadStats, ParseRecord, ParseStats};

/// Field delimiter of the results tables.
pub const CSV_DELIMITER: u8 = b';';

fn ensure_parent(path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| OutputError::io(parent, e))?;
    }
    Ok(())
}

/// Writes `rows` under their header, replacing the file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or a row cannot be written.
pub fn write_csv<T: CsvRow>(path: &Path, rows: &[T]) -> Result<(), OutputError> {
    ensure_parent(path)?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(CSV_DELIMITER)
        .has_headers(false)
        .from_path(path)
        .map_err(|e| OutputError::csv(path, e))?;

    writer
        .write_record(T::HEADER)
        .map_err(|e| OutputError::csv(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| OutputError::csv(path, e))?;
    }
    writer.flush().map_err(|e| OutputError::io(path, e))
}

/// Reads every row of a results table.
///
/// # Errors
///
/// Returns an error if the file is missing or a row does not match `T`.
pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, OutputError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(CSV_DELIMITER)
        .from_path(path)
        .map_err(|e| OutputError::csv(path, e))?;
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| OutputError::csv(path, e))
}

/// Serializes `value` as JSON, replacing the file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), OutputError> {
    ensure_parent(path)?;
    let file = File::create(path).map_err(|e| OutputError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(|e| OutputError::json(path, e))?;
    writer.flush().map_err(|e| OutputError::io(path, e))
}

/// Reads a JSON artifact.
///
/// # Errors
///
/// Returns an error if the file is missing or does not match `T`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, OutputError> {
    let file = File::open(path).map_err(|e| OutputError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| OutputError::json(path, e))
}
