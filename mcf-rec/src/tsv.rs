//! Delimited text reading shared by the interaction loader and artist catalog
//!
//! Files are read literally: no quote processing, header row required,
//! every row must have the header's field count.

use crate::error::{Error, Result};
use csv::{ByteRecord, Reader, ReaderBuilder};
use std::borrow::Cow;
use std::fs::File;
use std::path::Path;

/// Open `path` for reading, failing with `NotFound` if it does not exist
pub(crate) fn open(path: &Path, delimiter: u8) -> Result<Reader<File>> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    Ok(ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .quoting(false)
        .from_reader(file))
}

/// Positions of `required` fields in the header row
///
/// Fails with `Schema` naming every missing field before any data row is read.
pub(crate) fn column_indices(
    path: &Path,
    reader: &mut Reader<File>,
    required: &[&str],
) -> Result<Vec<usize>> {
    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(|e| Error::from_csv(path, e))?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim().to_string())
        .collect();

    let mut indices = Vec::with_capacity(required.len());
    let mut missing = Vec::new();
    for name in required {
        match headers.iter().position(|h| h == name) {
            Some(idx) => indices.push(idx),
            None => missing.push(name.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(Error::Schema {
            path: path.to_path_buf(),
            missing,
            available: headers,
        });
    }
    Ok(indices)
}

/// 1-based line the record started on
pub(crate) fn record_line(record: &ByteRecord) -> Option<u64> {
    record.position().map(|p| p.line())
}

/// Field text with invalid UTF-8 replaced
pub(crate) fn field<'r>(record: &'r ByteRecord, idx: usize) -> Cow<'r, str> {
    String::from_utf8_lossy(record.get(idx).unwrap_or_default())
}
