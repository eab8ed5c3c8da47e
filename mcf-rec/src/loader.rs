//! User–artist interaction loading
//!
//! Parses a delimited file with `userID`, `artistID` and `weight` columns
//! (extra columns ignored) into an [`InteractionMatrix`].

use crate::error::{Error, Result};
use crate::matrix::{InteractionMatrix, InteractionRecord};
use crate::tsv;
use csv::ByteRecord;
use mcf_common::TomlConfig;
use std::path::Path;
use tracing::{debug, info};

pub const USER_FIELD: &str = "userID";
pub const ARTIST_FIELD: &str = "artistID";
pub const WEIGHT_FIELD: &str = "weight";

/// Interaction file loader
#[derive(Debug, Clone)]
pub struct InteractionLoader {
    delimiter: u8,
}

impl Default for InteractionLoader {
    fn default() -> Self {
        Self { delimiter: b'\t' }
    }
}

impl InteractionLoader {
    /// Tab-separated loader
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Loader using the configured delimiter
    ///
    /// Fails with [`Error::Common`] when the delimiter is not a single ASCII
    /// character.
    pub fn from_config(config: &TomlConfig) -> Result<Self> {
        Ok(Self::with_delimiter(config.delimiter_byte()?))
    }

    /// Load `path` into a sparse matrix, summing repeated (user, artist) pairs
    ///
    /// # Errors
    /// - `NotFound` if the file does not exist
    /// - `Schema` if any required column is absent from the header
    /// - `Parse` if a row has a malformed id or weight
    pub fn load(&self, path: &Path) -> Result<InteractionMatrix> {
        info!("Loading user-artist interactions from: {}", path.display());

        let records = self.read_records(path)?;
        let matrix = InteractionMatrix::from_records(&records)
            .map_err(|e| Error::parse(path, None, e.to_string()))?;

        let (rows, cols) = matrix.shape();
        info!(
            rows,
            cols,
            nnz = matrix.nnz(),
            "Loaded matrix shape: ({}, {})",
            rows,
            cols
        );
        Ok(matrix)
    }

    /// Parse every row without building the matrix
    pub fn read_records(&self, path: &Path) -> Result<Vec<InteractionRecord>> {
        let mut reader = tsv::open(path, self.delimiter)?;
        let columns = tsv::column_indices(path, &mut reader, &[USER_FIELD, ARTIST_FIELD, WEIGHT_FIELD])?;
        let (user_col, artist_col, weight_col) = (columns[0], columns[1], columns[2]);

        let mut records = Vec::new();
        let mut record = ByteRecord::new();
        while reader
            .read_byte_record(&mut record)
            .map_err(|e| Error::from_csv(path, e))?
        {
            let line = tsv::record_line(&record);
            records.push(InteractionRecord {
                user_id: parse_id(path, &record, user_col, USER_FIELD, line)?,
                artist_id: parse_id(path, &record, artist_col, ARTIST_FIELD, line)?,
                weight: parse_weight(path, &record, weight_col, line)?,
            });
        }

        debug!(rows = records.len(), "Parsed interaction rows");
        Ok(records)
    }
}

fn parse_id(
    path: &Path,
    record: &ByteRecord,
    idx: usize,
    column: &str,
    line: Option<u64>,
) -> Result<u32> {
    let text = tsv::field(record, idx);
    text.trim().parse::<u32>().map_err(|_| {
        Error::parse(
            path,
            line,
            format!(
                "line {}, column '{}': '{}' is not a non-negative integer id",
                line.unwrap_or_default(),
                column,
                text
            ),
        )
    })
}

fn parse_weight(path: &Path, record: &ByteRecord, idx: usize, line: Option<u64>) -> Result<f64> {
    let text = tsv::field(record, idx);
    match text.trim().parse::<f64>() {
        Ok(weight) if weight.is_finite() && weight >= 0.0 => Ok(weight),
        _ => Err(Error::parse(
            path,
            line,
            format!(
                "line {}, column '{}': '{}' is not a finite, non-negative number",
                line.unwrap_or_default(),
                WEIGHT_FIELD,
                text
            ),
        )),
    }
}

/// Load an interaction file with the default tab delimiter
pub fn load_user_artists(path: &Path) -> Result<InteractionMatrix> {
    InteractionLoader::new().load(path)
}
