//! Artist id → name lookup
//!
//! The catalog is an explicit two-state object: `Unloaded` until [`ArtistCatalog::load`]
//! succeeds, then `Loaded` with a read-only map. Resolving before load is an
//! error; resolving an id that is not in a loaded catalog never fails and
//! yields [`unknown_artist_name`] instead.
//!
//! Repeated ids in the source file are last-write-wins.

use crate::error::{Error, Result};
use crate::tsv;
use csv::ByteRecord;
use mcf_common::TomlConfig;
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

pub const ID_FIELD: &str = "id";
pub const NAME_FIELD: &str = "name";

/// One catalog row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistRecord {
    pub artist_id: u32,
    pub name: String,
}

#[derive(Debug, Clone)]
enum CatalogState {
    Unloaded,
    Loaded(HashMap<u32, String>),
}

/// Retrieves artist names given an artist id
#[derive(Debug, Clone)]
pub struct ArtistCatalog {
    state: CatalogState,
    delimiter: u8,
}

impl Default for ArtistCatalog {
    fn default() -> Self {
        Self {
            state: CatalogState::Unloaded,
            delimiter: b'\t',
        }
    }
}

/// Placeholder returned for ids absent from a loaded catalog
pub fn unknown_artist_name(artist_id: u32) -> String {
    format!("Unknown Artist (ID: {})", artist_id)
}

impl ArtistCatalog {
    /// Unloaded, tab-separated catalog
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self {
            delimiter,
            ..Self::default()
        }
    }

    /// Unloaded catalog using the configured delimiter
    pub fn from_config(config: &TomlConfig) -> Result<Self> {
        Ok(Self::with_delimiter(config.delimiter_byte()?))
    }

    /// Already-loaded catalog built from in-memory records (last write wins)
    pub fn from_records(records: impl IntoIterator<Item = ArtistRecord>) -> Self {
        let names = records
            .into_iter()
            .map(|r| (r.artist_id, r.name))
            .collect();
        Self {
            state: CatalogState::Loaded(names),
            ..Self::default()
        }
    }

    /// Load the artists file
    ///
    /// Replaces any previous contents only when the whole file parses.
    ///
    /// # Errors
    /// - `NotFound` if the file does not exist
    /// - `Schema` if `id` or `name` is absent from the header
    /// - `Parse` for a non-integer id or empty name
    pub fn load(&mut self, path: &Path) -> Result<()> {
        info!("Loading artist data from: {}", path.display());

        let mut reader = tsv::open(path, self.delimiter)?;
        let columns = tsv::column_indices(path, &mut reader, &[ID_FIELD, NAME_FIELD])?;
        let (id_col, name_col) = (columns[0], columns[1]);

        let mut names: HashMap<u32, String> = HashMap::new();
        let mut record = ByteRecord::new();
        while reader
            .read_byte_record(&mut record)
            .map_err(|e| Error::from_csv(path, e))?
        {
            let line = tsv::record_line(&record);

            let id_text = tsv::field(&record, id_col);
            let artist_id = id_text.trim().parse::<u32>().map_err(|_| {
                Error::parse(
                    path,
                    line,
                    format!(
                        "line {}, column '{}': '{}' is not a non-negative integer id",
                        line.unwrap_or_default(),
                        ID_FIELD,
                        id_text
                    ),
                )
            })?;

            // Stored exactly as written; only the emptiness check ignores whitespace
            let name = tsv::field(&record, name_col).into_owned();
            if name.trim().is_empty() {
                return Err(Error::parse(
                    path,
                    line,
                    format!("line {}: artist {} has an empty name", line.unwrap_or_default(), artist_id),
                ));
            }

            if let Some(previous) = names.insert(artist_id, name) {
                debug!(artist_id, previous = %previous, "Duplicate artist id, later row wins");
            }
        }

        info!("Loaded {} artists.", names.len());
        self.state = CatalogState::Loaded(names);
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, CatalogState::Loaded(_))
    }

    /// Number of artists; 0 while unloaded
    pub fn len(&self) -> usize {
        match &self.state {
            CatalogState::Loaded(names) => names.len(),
            CatalogState::Unloaded => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, artist_id: u32) -> bool {
        match &self.state {
            CatalogState::Loaded(names) => names.contains_key(&artist_id),
            CatalogState::Unloaded => false,
        }
    }

    /// Name for `artist_id`
    ///
    /// Fails only with `NotLoaded`. Unknown ids log a warning and resolve to
    /// `"Unknown Artist (ID: <id>)"`.
    pub fn resolve(&self, artist_id: u32) -> Result<Cow<'_, str>> {
        let names = match &self.state {
            CatalogState::Loaded(names) => names,
            CatalogState::Unloaded => return Err(Error::NotLoaded),
        };

        match names.get(&artist_id) {
            Some(name) => Ok(Cow::Borrowed(name.as_str())),
            None => {
                warn!("Artist ID {} not found.", artist_id);
                Ok(Cow::Owned(unknown_artist_name(artist_id)))
            }
        }
    }
}
