//! Offline corpus construction
//!
//! Turns the raw TMDB movie and credits tables into the movie table and the
//! similarity matrix:
//! 1. Join movies with credits on title and drop rows missing a required field
//! 2. Extract genre, keyword, top-3 cast and director names
//! 3. Collapse each multi-word name into a single token
//! 4. Concatenate overview words and name tokens into the tag text
//! 5. Vectorize tag text with tf-idf (stop words removed, 5000 features)
//! 6. Compute pairwise cosine similarity

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use std::time::Instant;

use serde::de::DeserializeOwned;

use super::similarity::SimilarityMatrix;
use super::tfidf::TfidfVectorizer;
use crate::{
    error::{CorpusError, CorpusResult},
    models::{parse_director, parse_names, parse_top_cast, MovieRecord, RawCreditRow, RawMovieRow},
};

const TOP_CAST: usize = 3;

/// Output of a corpus build, index-aligned
#[derive(Debug, Clone)]
pub struct BuiltCorpus {
    pub movies: Vec<MovieRecord>,
    pub similarity: SimilarityMatrix,
}

/// Builds the corpus from the two CSV files on disk
pub fn build_from_files(movies_csv: &Path, credits_csv: &Path) -> CorpusResult<BuiltCorpus> {
    let movies = std::fs::File::open(movies_csv).map_err(|e| CorpusError::io(movies_csv, e))?;
    let credits = std::fs::File::open(credits_csv).map_err(|e| CorpusError::io(credits_csv, e))?;
    build_from_readers(movies, credits)
}

pub fn build_from_readers<M: Read, C: Read>(movies: M, credits: C) -> CorpusResult<BuiltCorpus> {
    let start = Instant::now();

    let movie_rows: Vec<RawMovieRow> = read_rows(movies, "movies")?;
    let credit_rows: Vec<RawCreditRow> = read_rows(credits, "credits")?;
    let raw_count = movie_rows.len();

    let movies = join_movies(movie_rows, credit_rows);
    tracing::info!(
        raw_rows = raw_count,
        kept = movies.len(),
        "Joined and cleaned movie rows"
    );

    let tags: Vec<String> = movies.iter().map(|m| m.tags.clone()).collect();
    let vectors = TfidfVectorizer::default().fit_transform(&tags);
    let similarity = SimilarityMatrix::from_vectors(&vectors);

    tracing::info!(
        movies = movies.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "Corpus build completed"
    );

    Ok(BuiltCorpus { movies, similarity })
}

/// Reads every record of a CSV source; malformed records are skipped
pub(crate) fn read_rows<T: DeserializeOwned, R: Read>(
    reader: R,
    source: &str,
) -> CorpusResult<Vec<T>> {
    let mut reader = csv::Reader::from_reader(reader);
    // Header problems mean the file is unusable.
    reader.headers()?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in reader.deserialize() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                skipped += 1;
                tracing::debug!(source, error = %e, "Skipping malformed CSV record");
            }
        }
    }

    if skipped > 0 {
        tracing::warn!(source, skipped, "Skipped malformed CSV records");
    }
    Ok(rows)
}

/// Joins movies with credits on title and keeps complete rows only.
///
/// When several credit rows share a title, the one whose id matches the movie
/// is preferred. The first row wins for a repeated movie id.
pub fn join_movies(movies: Vec<RawMovieRow>, credits: Vec<RawCreditRow>) -> Vec<MovieRecord> {
    let mut credits_by_title: HashMap<String, Vec<RawCreditRow>> = HashMap::new();
    for credit in credits {
        if let Some(title) = credit.title.clone() {
            credits_by_title.entry(title).or_default().push(credit);
        }
    }

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(movies.len());

    for movie in movies {
        let Some(title) = movie.title.as_deref() else {
            continue;
        };
        let Some(candidates) = credits_by_title.get(title) else {
            continue;
        };
        let credit = candidates
            .iter()
            .find(|c| c.movie_id.is_some() && c.movie_id == movie.id)
            .unwrap_or(&candidates[0]);

        let Some(record) = build_record(&movie, credit) else {
            continue;
        };
        if seen.insert(record.movie_id) {
            records.push(record);
        }
    }

    records
}

fn build_record(movie: &RawMovieRow, credit: &RawCreditRow) -> Option<MovieRecord> {
    let movie_id = credit.movie_id.or(movie.id)?;
    let title = movie.title.clone()?;
    let overview = movie.overview.as_deref()?;
    let genres = movie.genres.as_deref()?;
    let keywords = movie.keywords.as_deref()?;
    let cast = credit.cast.as_deref()?;
    let crew = credit.crew.as_deref()?;

    let mut tokens: Vec<String> = overview.split_whitespace().map(str::to_string).collect();
    tokens.extend(parse_names(genres).iter().map(|n| collapse_whitespace(n)));
    tokens.extend(parse_names(keywords).iter().map(|n| collapse_whitespace(n)));
    tokens.extend(parse_top_cast(cast, TOP_CAST).iter().map(|n| collapse_whitespace(n)));
    tokens.extend(parse_director(crew).map(|n| collapse_whitespace(&n)));

    Some(MovieRecord {
        movie_id,
        title,
        tags: tokens.join(" "),
        vote_average: movie.vote_average.unwrap_or(0.0),
        vote_count: movie.vote_count.unwrap_or(0),
    })
}

/// "Robert Downey Jr." -> "RobertDowneyJr."
pub fn collapse_whitespace(name: &str) -> String {
    name.split_whitespace().collect()
}
