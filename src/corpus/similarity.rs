use rayon::prelude::*;

use super::tfidf::SparseVector;

/// Dense, square, symmetric matrix of pairwise cosine similarities.
///
/// Row `i` belongs to the movie at index `i` of the movie table.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    dimension: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Wraps row-major values, `None` if they do not form an N×N square
    pub fn from_raw(dimension: usize, values: Vec<f32>) -> Option<Self> {
        (dimension.checked_mul(dimension)? == values.len()).then_some(Self { dimension, values })
    }

    /// Cosine similarity of every pair of L2-normalised rows.
    ///
    /// Dot products are accumulated through an inverted index so only
    /// co-occurring terms are visited; rows are computed in parallel.
    pub fn from_vectors(rows: &[SparseVector]) -> Self {
        let dimension = rows.len();

        let feature_count = rows
            .iter()
            .flat_map(|row| row.iter().map(|(index, _)| *index as usize + 1))
            .max()
            .unwrap_or(0);
        let mut postings: Vec<Vec<(u32, f32)>> = vec![Vec::new(); feature_count];
        for (movie, row) in rows.iter().enumerate() {
            for &(feature, weight) in row {
                postings[feature as usize].push((movie as u32, weight));
            }
        }

        let mut values = vec![0.0f32; dimension * dimension];
        if dimension == 0 {
            return Self { dimension, values };
        }

        values
            .par_chunks_mut(dimension)
            .enumerate()
            .for_each(|(i, out)| {
                for &(feature, weight) in &rows[i] {
                    for &(j, other) in &postings[feature as usize] {
                        out[j as usize] += weight * other;
                    }
                }
                for value in out.iter_mut() {
                    *value = value.clamp(0.0, 1.0);
                }
                out[i] = 1.0;
            });

        tracing::info!(dimension, "Computed similarity matrix");

        Self { dimension, values }
    }

    /// Number of movies covered (rows == columns)
    pub fn len(&self) -> usize {
        self.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.dimension == 0
    }

    pub fn row(&self, index: usize) -> Option<&[f32]> {
        (index < self.dimension)
            .then(|| &self.values[index * self.dimension..(index + 1) * self.dimension])
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        self.row(i).and_then(|row| row.get(j).copied())
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}
