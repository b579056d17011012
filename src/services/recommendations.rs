use serde::Deserialize;

use super::{
    neighbors::{top_neighbors, DIRECT_LIMIT, FILTER_WINDOW},
    title_match::resolve_title,
};
use crate::{
    corpus::Corpus,
    error::{AppError, AppResult},
    models::{RecommendResponse, Recommendation},
};

/// Minimum rating and vote count a recommended movie must have
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct RatingFilter {
    #[serde(default)]
    pub min_rating: f64,
    #[serde(default)]
    pub min_votes: u32,
}

impl RatingFilter {
    fn accepts(&self, rating: f64, votes: u32) -> bool {
        rating >= self.min_rating && votes >= self.min_votes
    }
}

/// Movies similar to the title closest to `query`.
///
/// Neighbors are taken from the 49 most similar movies in similarity order,
/// filtered by `filter`, capped at 10 and finally ordered by rating.
pub fn recommend(corpus: &Corpus, query: &str, filter: RatingFilter) -> AppResult<RecommendResponse> {
    let index = resolve_title(corpus, query)?;
    let searched = corpus
        .movie(index)
        .ok_or_else(|| AppError::Internal(format!("Row {} missing from movie table", index)))?;

    let mut recommendations: Vec<Recommendation> = top_neighbors(corpus.similarity(), index, FILTER_WINDOW)
        .into_iter()
        .filter_map(|candidate| corpus.movie(candidate))
        .filter(|movie| filter.accepts(movie.vote_average, movie.vote_count))
        .take(DIRECT_LIMIT)
        .map(|movie| Recommendation::new(movie, corpus.metadata(movie.movie_id)))
        .collect();
    recommendations.sort_by(|a, b| b.rating.total_cmp(&a.rating));

    tracing::info!(
        query = %query,
        searched = %searched.title,
        results = recommendations.len(),
        "Recommendations computed"
    );

    let metadata = corpus.metadata(searched.movie_id);
    Ok(RecommendResponse {
        searched_movie: searched.title.clone(),
        searched_genres: metadata.genres.clone(),
        searched_year: metadata.release_year,
        searched_overview: metadata.overview.clone(),
        searched_tagline: metadata.tagline.clone(),
        searched_rating: searched.vote_average,
        searched_votes: searched.vote_count,
        searched_movie_id: searched.movie_id,
        recommendations,
    })
}
