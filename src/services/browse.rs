use std::collections::HashSet;

use rand::{seq::SliceRandom, Rng};

use super::{
    history::{SearchHistory, HISTORY_LIMIT},
    neighbors::{top_neighbors, DIRECT_LIMIT},
    title_match::closest_title,
};
use crate::{
    corpus::Corpus,
    error::{AppError, AppResult},
    models::{GenreMatch, MovieRecord, MovieSummary},
};

/// Length of the popular, recent, top-rated and for-you lists
pub const LIST_LIMIT: usize = 20;
pub const GENRE_LIMIT: usize = 30;
pub const RANDOM_COUNT: usize = 4;
/// Random picks must be rated strictly above this
pub const RANDOM_MIN_RATING: f64 = 6.0;

fn summarize<'a>(corpus: &Corpus, movies: impl IntoIterator<Item = &'a MovieRecord>) -> Vec<MovieSummary> {
    movies
        .into_iter()
        .map(|movie| MovieSummary::new(movie, corpus.metadata(movie.movie_id)))
        .collect()
}

/// Most voted movies first
pub fn popular(corpus: &Corpus) -> Vec<MovieSummary> {
    let mut movies: Vec<&MovieRecord> = corpus.movies().iter().collect();
    movies.sort_by(|a, b| b.vote_count.cmp(&a.vote_count));
    summarize(corpus, movies.into_iter().take(LIST_LIMIT))
}

/// Newest first, rating breaking ties within a year; unknown years sort last
pub fn recent(corpus: &Corpus) -> Vec<MovieSummary> {
    let mut summaries = summarize(corpus, corpus.movies());
    summaries.sort_by(|a, b| {
        b.release_year
            .cmp(&a.release_year)
            .then(b.rating.total_cmp(&a.rating))
    });
    summaries.truncate(LIST_LIMIT);
    summaries
}

/// Highest rated first
pub fn top_rated(corpus: &Corpus) -> Vec<MovieSummary> {
    let mut movies: Vec<&MovieRecord> = corpus.movies().iter().collect();
    movies.sort_by(|a, b| b.vote_average.total_cmp(&a.vote_average));
    summarize(corpus, movies.into_iter().take(LIST_LIMIT))
}

/// Union of the neighbors of each search term, best rated first.
///
/// Terms that resolve to no title are skipped. A title reached through more
/// than one term appears once.
pub fn for_you_from_terms(corpus: &Corpus, terms: &[String]) -> Vec<MovieSummary> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut picks: Vec<&MovieRecord> = Vec::new();

    for term in terms {
        let Some((index, _)) = closest_title(term, corpus.titles_lower()) else {
            tracing::debug!(term = %term, "Search term matched no title");
            continue;
        };

        for candidate in top_neighbors(corpus.similarity(), index, DIRECT_LIMIT) {
            let Some(movie) = corpus.movie(candidate) else {
                continue;
            };
            if seen.insert(movie.title.as_str()) {
                picks.push(movie);
            }
        }
    }

    picks.sort_by(|a, b| b.vote_average.total_cmp(&a.vote_average));
    summarize(corpus, picks.into_iter().take(LIST_LIMIT))
}

/// Personalized list for `user_id`, top rated when there is nothing to go on
pub async fn for_you(
    corpus: &Corpus,
    history: &dyn SearchHistory,
    user_id: Option<i64>,
) -> Vec<MovieSummary> {
    let Some(user_id) = user_id else {
        return top_rated(corpus);
    };

    let terms = history.recent_searches(user_id, HISTORY_LIMIT).await;
    if terms.is_empty() {
        tracing::debug!(user_id, "No search history, using top rated");
        return top_rated(corpus);
    }

    for_you_from_terms(corpus, &terms)
}

/// Movies sharing at least one of `genres`, most overlap first.
///
/// Genre names compare case-insensitively; `exclude` drops a title the same way.
pub fn by_genre(corpus: &Corpus, genres: &[String], exclude: Option<&str>) -> AppResult<Vec<GenreMatch>> {
    let targets: HashSet<String> = genres
        .iter()
        .map(|genre| genre.trim().to_lowercase())
        .filter(|genre| !genre.is_empty())
        .collect();
    if targets.is_empty() {
        return Err(AppError::InvalidInput(
            "Genres parameter is required".to_string(),
        ));
    }

    let exclude = exclude
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_lowercase);

    let mut matches: Vec<GenreMatch> = corpus
        .movies()
        .iter()
        .zip(corpus.titles_lower())
        .filter(|(_, title)| exclude.as_deref() != Some(title.as_str()))
        .filter_map(|(movie, _)| {
            let metadata = corpus.metadata(movie.movie_id);
            let overlap = metadata
                .genre_keys()
                .collect::<HashSet<_>>()
                .intersection(&targets)
                .count();
            (overlap > 0).then(|| GenreMatch {
                movie: MovieSummary::new(movie, metadata),
                overlap_count: overlap,
            })
        })
        .collect();

    matches.sort_by(|a, b| {
        b.overlap_count
            .cmp(&a.overlap_count)
            .then(b.movie.rating.total_cmp(&a.movie.rating))
    });
    matches.truncate(GENRE_LIMIT);
    Ok(matches)
}

/// Up to four distinct well-rated movies picked uniformly at random
pub fn random_movies<R: Rng + ?Sized>(corpus: &Corpus, rng: &mut R) -> Vec<MovieSummary> {
    let candidates: Vec<&MovieRecord> = corpus
        .movies()
        .iter()
        .filter(|movie| movie.vote_average > RANDOM_MIN_RATING)
        .collect();

    summarize(
        corpus,
        candidates.choose_multiple(rng, RANDOM_COUNT).copied(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::history::MockSearchHistory;
    use crate::services::test_support::{fixture_corpus, synthetic_corpus, SYNTHETIC_GROUP};
    use mockall::predicate::eq;

    fn titles(summaries: &[MovieSummary]) -> Vec<&str> {
        summaries.iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn test_popular_sorted_by_votes() {
        let corpus = fixture_corpus();
        let movies = popular(&corpus);

        assert_eq!(movies.len(), corpus.len().min(LIST_LIMIT));
        assert_eq!(movies[0].title, "Inception");
        assert_eq!(movies[1].title, "The Dark Knight");
        assert!(movies.windows(2).all(|pair| pair[0].votes >= pair[1].votes));
    }

    #[test]
    fn test_recent_unknown_year_last() {
        let corpus = fixture_corpus();
        let movies = recent(&corpus);

        assert_eq!(
            &titles(&movies)[..3],
            &["The Dark Knight Rises", "The Avengers", "Pirates of the Caribbean: On Stranger Tides"]
        );
        let last = movies.last().unwrap();
        assert_eq!(last.title, "Broken Genres");
        assert_eq!(last.release_year, 0);
        // Same year, higher rating first
        let forrest = movies.iter().position(|m| m.title == "Forrest Gump").unwrap();
        let lion = movies.iter().position(|m| m.title == "The Lion King").unwrap();
        assert!(forrest < lion);
    }

    #[test]
    fn test_top_rated_is_stable_on_ties() {
        let corpus = fixture_corpus();
        let movies = top_rated(&corpus);
        assert_eq!(&titles(&movies)[..3], &["The Dark Knight", "Forrest Gump", "Inception"]);
    }

    #[test]
    fn test_by_genre_overlap_then_rating() {
        let corpus = fixture_corpus();
        let genres = vec!["ACTION".to_string(), "drama".to_string()];
        let matches = by_genre(&corpus, &genres, Some("inception")).unwrap();

        assert!(matches.iter().all(|m| m.overlap_count >= 1));
        assert!(matches.iter().all(|m| !m.movie.title.eq_ignore_ascii_case("Inception")));
        assert!(matches.iter().all(|m| m.movie.title != "Toy Story"));

        let order: Vec<&str> = matches.iter().map(|m| m.movie.title.as_str()).collect();
        assert_eq!(
            &order[..4],
            &["The Dark Knight", "The Dark Knight Rises", "Batman Begins", "Forrest Gump"]
        );
        assert_eq!(matches[0].overlap_count, 2);
        assert_eq!(matches[3].overlap_count, 1);
    }

    #[test]
    fn test_by_genre_requires_genres() {
        let corpus = fixture_corpus();
        let err = by_genre(&corpus, &[" ".to_string()], None).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(by_genre(&corpus, &[], None).is_err());
    }

    #[test]
    fn test_by_genre_broken_metadata_never_matches() {
        let corpus = fixture_corpus();
        let matches = by_genre(&corpus, &["drama".to_string()], None).unwrap();
        assert!(matches.iter().all(|m| m.movie.title != "Broken Genres"));
    }

    #[test]
    fn test_random_movies_are_distinct_and_rated() {
        let corpus = fixture_corpus();
        let mut rng = rand::thread_rng();

        for _ in 0..10 {
            let picks = random_movies(&corpus, &mut rng);
            assert_eq!(picks.len(), RANDOM_COUNT);
            assert!(picks.iter().all(|m| m.rating > RANDOM_MIN_RATING));
            let unique: HashSet<i64> = picks.iter().map(|m| m.movie_id).collect();
            assert_eq!(unique.len(), RANDOM_COUNT);
        }
    }

    #[test]
    fn test_for_you_from_terms_dedupes_and_sorts() {
        let corpus = fixture_corpus();
        let terms = vec!["Inception".to_string(), "Titanic".to_string()];
        let movies = for_you_from_terms(&corpus, &terms);

        assert!(!movies.is_empty());
        assert!(movies.len() <= LIST_LIMIT);
        let unique: HashSet<&str> = movies.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(unique.len(), movies.len());
        assert!(movies.windows(2).all(|pair| pair[0].rating >= pair[1].rating));
    }

    #[test]
    fn test_lists_are_capped_on_large_corpus() {
        let corpus = synthetic_corpus(40);

        let popular = popular(&corpus);
        assert_eq!(popular.len(), LIST_LIMIT);
        let most_votes = corpus.movies().iter().map(|m| m.vote_count).max().unwrap();
        assert_eq!(popular[0].votes, most_votes);
        assert!(popular.windows(2).all(|pair| pair[0].votes >= pair[1].votes));

        let recent = recent(&corpus);
        assert_eq!(recent.len(), LIST_LIMIT);
        assert!(recent
            .windows(2)
            .all(|pair| pair[0].release_year >= pair[1].release_year));

        let top = top_rated(&corpus);
        assert_eq!(top.len(), LIST_LIMIT);
        assert_eq!(top[0].title, "Synthetic Movie 17");
        assert!(top.windows(2).all(|pair| pair[0].rating >= pair[1].rating));
    }

    #[test]
    fn test_by_genre_is_capped_on_large_corpus() {
        let corpus = synthetic_corpus(40);

        let matches = by_genre(&corpus, &["drama".to_string()], None).unwrap();
        assert_eq!(matches.len(), GENRE_LIMIT);

        // Even rows carry both genres and outrank every single-genre match
        let matches = by_genre(&corpus, &["Drama".to_string(), "action".to_string()], None).unwrap();
        assert_eq!(matches.len(), GENRE_LIMIT);
        assert!(matches[..20].iter().all(|m| m.overlap_count == 2));
        assert!(matches[20..].iter().all(|m| m.overlap_count == 1));
    }

    #[test]
    fn test_for_you_from_terms_is_capped() {
        let corpus = synthetic_corpus(40);
        // One term per similarity block, ten distinct neighbors each
        let terms: Vec<String> = (0..3)
            .map(|block| format!("synthetic movie {:02}", block * SYNTHETIC_GROUP))
            .collect();

        let movies = for_you_from_terms(&corpus, &terms);
        assert_eq!(movies.len(), LIST_LIMIT);
        let unique: HashSet<&str> = movies.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(unique.len(), LIST_LIMIT);
        assert!(movies.windows(2).all(|pair| pair[0].rating >= pair[1].rating));
        for term in &terms {
            assert!(!movies.iter().any(|m| m.title.to_lowercase() == *term));
        }
    }

    #[test]
    fn test_for_you_from_unmatched_terms_is_empty() {
        let corpus = fixture_corpus();
        let terms = vec!["zzzzzznonexistentmovie".to_string()];
        assert!(for_you_from_terms(&corpus, &terms).is_empty());
    }

    #[tokio::test]
    async fn test_for_you_without_user_is_top_rated() {
        let corpus = fixture_corpus();
        let mut history = MockSearchHistory::new();
        history.expect_recent_searches().never();

        let movies = for_you(&corpus, &history, None).await;
        assert_eq!(titles(&movies), titles(&top_rated(&corpus)));
    }

    #[tokio::test]
    async fn test_for_you_empty_history_is_top_rated() {
        let corpus = fixture_corpus();
        let mut history = MockSearchHistory::new();
        history
            .expect_recent_searches()
            .with(eq(7), eq(HISTORY_LIMIT))
            .times(1)
            .returning(|_, _| Vec::new());

        let movies = for_you(&corpus, &history, Some(7)).await;
        assert_eq!(titles(&movies), titles(&top_rated(&corpus)));
    }

    #[tokio::test]
    async fn test_for_you_uses_history() {
        let corpus = fixture_corpus();
        let mut history = MockSearchHistory::new();
        history
            .expect_recent_searches()
            .times(1)
            .returning(|_, _| vec!["batman begins".to_string()]);

        let movies = for_you(&corpus, &history, Some(1)).await;
        let names = titles(&movies);
        assert!(names.contains(&"The Dark Knight"));
        assert!(!names.contains(&"Batman Begins"));
    }
}
