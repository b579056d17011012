use crate::corpus::SimilarityMatrix;

/// Neighbors returned by a direct recommendation query
pub const DIRECT_LIMIT: usize = 10;

/// Neighbors inspected before rating/vote thresholds are applied
pub const FILTER_WINDOW: usize = 49;

/// Every other movie as `(index, score)`, most similar first.
///
/// The queried movie is excluded by index, so another movie with an identical
/// score can never push it into the results. Equal scores keep table order.
pub fn ranked_neighbors(matrix: &SimilarityMatrix, index: usize) -> Vec<(usize, f32)> {
    let Some(row) = matrix.row(index) else {
        return Vec::new();
    };

    let mut scored: Vec<(usize, f32)> = row
        .iter()
        .copied()
        .enumerate()
        .filter(|(candidate, _)| *candidate != index)
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored
}

/// Indices of the `limit` most similar movies
pub fn top_neighbors(matrix: &SimilarityMatrix, index: usize, limit: usize) -> Vec<usize> {
    ranked_neighbors(matrix, index)
        .into_iter()
        .take(limit)
        .map(|(candidate, _)| candidate)
        .collect()
}
