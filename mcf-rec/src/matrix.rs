//! Sparse user×artist interaction matrix
//!
//! Stored in compressed sparse row form: `indptr[u]..indptr[u + 1]` is the
//! slice of `indices`/`data` holding user `u`'s artists (ascending) and their
//! accumulated weights. The matrix is immutable once built.

use thiserror::Error;

/// One parsed (user, artist, weight) row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionRecord {
    pub user_id: u32,
    pub artist_id: u32,
    /// Play count or similar implicit signal
    pub weight: f64,
}

impl InteractionRecord {
    pub fn new(user_id: u32, artist_id: u32, weight: f64) -> Self {
        Self {
            user_id,
            artist_id,
            weight,
        }
    }
}

/// Matrix construction failures
#[derive(Debug, Error, PartialEq)]
pub enum MatrixError {
    #[error("weight {weight} for user {user_id}, artist {artist_id} is negative or not finite")]
    InvalidWeight {
        user_id: u32,
        artist_id: u32,
        weight: f64,
    },

    #[error("accumulated weight for user {user_id}, artist {artist_id} overflows")]
    Overflow { user_id: u32, artist_id: u32 },
}

/// Borrowed view of one user's stored interactions
#[derive(Debug, Clone, Copy)]
pub struct UserRow<'a> {
    /// Row index in the matrix the view was taken from
    pub user_id: usize,
    /// Artist ids, ascending
    pub artist_ids: &'a [u32],
    pub weights: &'a [f32],
}

impl<'a> UserRow<'a> {
    pub fn len(&self) -> usize {
        self.artist_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artist_ids.is_empty()
    }

    pub fn contains(&self, artist_id: u32) -> bool {
        self.artist_ids.binary_search(&artist_id).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + 'a {
        self.artist_ids
            .iter()
            .copied()
            .zip(self.weights.iter().copied())
    }
}

/// Sparse interaction matrix indexed by `[user_id, artist_id]`
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionMatrix {
    rows: usize,
    cols: usize,
    indptr: Vec<usize>,
    indices: Vec<u32>,
    data: Vec<f32>,
}

impl InteractionMatrix {
    /// Build from records, summing weights of repeated (user, artist) pairs
    ///
    /// Shape is (max user_id + 1, max artist_id + 1), or (0, 0) for no
    /// records. Sums are accumulated in f64 and must stay finite as f32.
    pub fn from_records(records: &[InteractionRecord]) -> Result<Self, MatrixError> {
        let mut triplets: Vec<(u32, u32, f64)> = Vec::with_capacity(records.len());
        for record in records {
            if !record.weight.is_finite() || record.weight < 0.0 {
                return Err(MatrixError::InvalidWeight {
                    user_id: record.user_id,
                    artist_id: record.artist_id,
                    weight: record.weight,
                });
            }
            triplets.push((record.user_id, record.artist_id, record.weight));
        }
        triplets.sort_unstable_by_key(|&(u, a, _)| (u, a));

        let rows = triplets.iter().map(|t| t.0 as usize + 1).max().unwrap_or(0);
        let cols = triplets.iter().map(|t| t.1 as usize + 1).max().unwrap_or(0);

        let mut indptr = vec![0usize; rows + 1];
        let mut indices = Vec::with_capacity(triplets.len());
        let mut data = Vec::with_capacity(triplets.len());

        let mut i = 0;
        while i < triplets.len() {
            let (user_id, artist_id, _) = triplets[i];
            let mut sum = 0.0f64;
            while i < triplets.len() && triplets[i].0 == user_id && triplets[i].1 == artist_id {
                sum += triplets[i].2;
                i += 1;
            }
            let value = sum as f32;
            if !value.is_finite() {
                return Err(MatrixError::Overflow { user_id, artist_id });
            }
            indices.push(artist_id);
            data.push(value);
            indptr[user_id as usize + 1] += 1;
        }

        for u in 0..rows {
            indptr[u + 1] += indptr[u];
        }

        Ok(Self {
            rows,
            cols,
            indptr,
            indices,
            data,
        })
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored (non-duplicate) cells
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Weight at `[user_id, artist_id]`, 0.0 for cells never observed
    pub fn get(&self, user_id: usize, artist_id: u32) -> f32 {
        match self.row(user_id) {
            Some(row) => row
                .artist_ids
                .binary_search(&artist_id)
                .map(|pos| row.weights[pos])
                .unwrap_or(0.0),
            None => 0.0,
        }
    }

    /// Row view for `user_id`, None when outside the matrix
    pub fn row(&self, user_id: usize) -> Option<UserRow<'_>> {
        if user_id >= self.rows {
            return None;
        }
        let span = self.indptr[user_id]..self.indptr[user_id + 1];
        Some(UserRow {
            user_id,
            artist_ids: &self.indices[span.clone()],
            weights: &self.data[span],
        })
    }

    /// All stored cells as (user_id, artist_id, weight), row-major
    pub fn iter(&self) -> impl Iterator<Item = (usize, u32, f32)> + '_ {
        (0..self.rows).flat_map(move |u| {
            let span = self.indptr[u]..self.indptr[u + 1];
            self.indices[span.clone()]
                .iter()
                .zip(&self.data[span])
                .map(move |(&a, &w)| (u, a, w))
        })
    }

    /// Artist-major copy: row `a` of the result lists the users of artist `a`
    pub fn transpose(&self) -> InteractionMatrix {
        let mut indptr = vec![0usize; self.cols + 1];
        for &a in &self.indices {
            indptr[a as usize + 1] += 1;
        }
        for a in 0..self.cols {
            indptr[a + 1] += indptr[a];
        }

        let mut next = indptr.clone();
        let mut indices = vec![0u32; self.nnz()];
        let mut data = vec![0f32; self.nnz()];
        for (u, a, w) in self.iter() {
            let slot = &mut next[a as usize];
            indices[*slot] = u as u32;
            data[*slot] = w;
            *slot += 1;
        }

        InteractionMatrix {
            rows: self.cols,
            cols: self.rows,
            indptr,
            indices,
            data,
        }
    }
}
