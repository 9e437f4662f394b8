//! Flat-file JSON store.
//!
//! The service only ever reads or writes whole documents: the historical input
//! series, and the combined output of a batch run.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, ErrorKind};

/// Read and parse a JSON document.
///
/// Missing files map to `FileNotFound`, unparsable content to `MalformedFile`.
pub fn read_json_file(path: &Path) -> Result<Value, AppError> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::new(ErrorKind::FileNotFound, "Data file not found")
        } else {
            AppError::new(ErrorKind::Io, format!("Failed to open '{}': {e}", path.display()))
        }
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        AppError::new(
            ErrorKind::MalformedFile,
            format!("Invalid JSON in data file '{}': {e}", path.display()),
        )
    })
}

/// Write a value as pretty-printed JSON, creating parent directories.
pub fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::new(
                ErrorKind::Io,
                format!("Failed to create directory '{}': {e}", parent.display()),
            )
        })?;
    }

    let file = File::create(path)
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to create '{}': {e}", path.display())))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to write JSON: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to write '{}': {e}", path.display())))?;

    Ok(())
}
