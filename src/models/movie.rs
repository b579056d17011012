use serde::{Deserialize, Serialize};

/// One row of the movie table.
///
/// The position of a record in the table is its row index in the
/// similarity matrix; the two are written and loaded together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRecord {
    pub movie_id: i64,
    pub title: String,
    /// Overview words plus genre, keyword, cast and director tokens
    pub tags: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u32,
}

/// Descriptive fields shown next to a movie, keyed by movie id
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetadataRecord {
    pub genres: Vec<String>,
    /// `0` when the release date is absent or malformed
    pub release_year: i32,
    pub overview: String,
    pub tagline: String,
}

impl MetadataRecord {
    /// Lowercased genre names, used for genre-overlap queries
    pub fn genre_keys(&self) -> impl Iterator<Item = String> + '_ {
        self.genres.iter().map(|g| g.to_lowercase())
    }
}
