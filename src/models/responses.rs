use serde::{Deserialize, Serialize};

use super::{MetadataRecord, MovieRecord};

/// Movie entry returned by the browsing views
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub title: String,
    pub rating: f64,
    pub votes: u32,
    pub movie_id: i64,
    pub genres: Vec<String>,
    pub release_year: i32,
}

impl MovieSummary {
    pub fn new(movie: &MovieRecord, metadata: &MetadataRecord) -> Self {
        Self {
            title: movie.title.clone(),
            rating: movie.vote_average,
            votes: movie.vote_count,
            movie_id: movie.movie_id,
            genres: metadata.genres.clone(),
            release_year: metadata.release_year,
        }
    }
}

/// Neighbor of a searched movie, with the full metadata join
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub title: String,
    pub rating: f64,
    pub votes: u32,
    pub movie_id: i64,
    pub genres: Vec<String>,
    pub release_year: i32,
    pub overview: String,
    pub tagline: String,
}

impl Recommendation {
    pub fn new(movie: &MovieRecord, metadata: &MetadataRecord) -> Self {
        Self {
            title: movie.title.clone(),
            rating: movie.vote_average,
            votes: movie.vote_count,
            movie_id: movie.movie_id,
            genres: metadata.genres.clone(),
            release_year: metadata.release_year,
            overview: metadata.overview.clone(),
            tagline: metadata.tagline.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendResponse {
    pub searched_movie: String,
    pub searched_genres: Vec<String>,
    pub searched_year: i32,
    pub searched_overview: String,
    pub searched_tagline: String,
    pub searched_rating: f64,
    pub searched_votes: u32,
    pub searched_movie_id: i64,
    pub recommendations: Vec<Recommendation>,
}

/// Genre-filtered movie with the number of requested genres it carries
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenreMatch {
    #[serde(flatten)]
    pub movie: MovieSummary,
    pub overlap_count: usize,
}

/// Envelope shared by every JSON body the service returns
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LogSearchRequest {
    pub user_id: Option<i64>,
    pub movie_title: Option<String>,
}
