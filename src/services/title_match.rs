use crate::{
    corpus::Corpus,
    error::{AppError, AppResult},
};

/// Minimum closeness for a query to resolve to a title
pub const MATCH_THRESHOLD: f64 = 0.6;

/// Ratcliff/Obershelp closeness in `[0, 1]`: twice the characters covered by
/// matching blocks over the combined length. `1.0` for identical strings.
///
/// A query that is a prefix or fragment of a longer title scores on the shared
/// block alone, so "pirates of the caribbean" still reaches its sequel titles.
pub fn title_ratio(query: &str, title: &str) -> f64 {
    let title: Vec<char> = title.chars().collect();
    let query: Vec<char> = query.chars().collect();
    let total = title.len() + query.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matched_chars(&title, &query) as f64 / total as f64
}

/// Characters covered by the matching blocks: the longest common block, then
/// the same search in the unmatched spans on either side of it
fn matched_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut spans = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = spans.pop() {
        let (i, j, size) = longest_block(a, b, (alo, ahi), (blo, bhi));
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            spans.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            spans.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest common run of `a[alo..ahi]` and `b[blo..bhi]` as `(i, j, len)`.
/// The run ending earliest in `a` wins a tie, then the earliest in `b`.
fn longest_block(
    a: &[char],
    b: &[char],
    (alo, ahi): (usize, usize),
    (blo, bhi): (usize, usize),
) -> (usize, usize, usize) {
    let mut best = (alo, blo, 0);
    // run[col] is the length of the common run ending at a[i], b[blo + col - 1]
    let mut prev = vec![0usize; bhi - blo + 1];
    let mut run = vec![0usize; bhi - blo + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            let col = j - blo + 1;
            run[col] = if a[i] == b[j] { prev[col - 1] + 1 } else { 0 };
            if run[col] > best.2 {
                best = (i + 1 - run[col], j + 1 - run[col], run[col]);
            }
        }
        std::mem::swap(&mut prev, &mut run);
    }

    best
}

/// Best match among lowercased titles as `(index, ratio)`.
///
/// The earliest title wins a tie, so resolution is deterministic for a given
/// table order.
pub fn closest_title(query: &str, titles_lower: &[String]) -> Option<(usize, f64)> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for (index, title) in titles_lower.iter().enumerate() {
        let ratio = title_ratio(&query, title);
        if best.map_or(true, |(_, top)| ratio > top) {
            best = Some((index, ratio));
        }
    }

    best.filter(|(_, ratio)| *ratio >= MATCH_THRESHOLD)
}

/// Resolves a free-text query to a movie-table row index
pub fn resolve_title(corpus: &Corpus, query: &str) -> AppResult<usize> {
    if query.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Movie parameter is required".to_string(),
        ));
    }

    match closest_title(query, corpus.titles_lower()) {
        Some((index, ratio)) => {
            tracing::debug!(query = %query, index, ratio, "Resolved title");
            Ok(index)
        }
        None => {
            tracing::info!(query = %query, "No title above match threshold");
            Err(AppError::NotFound("Movie not found".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles() -> Vec<String> {
        ["the dark knight", "the dark knight rises", "inception", "titanic", "avatar"]
            .iter()
            .map(|t| t.to_string())
            .collect()
    }

    #[test]
    fn test_exact_match_case_insensitive() {
        assert_eq!(closest_title("Inception", &titles()), Some((2, 1.0)));
        assert_eq!(closest_title("  TITANIC ", &titles()).map(|m| m.0), Some(3));
    }

    #[test]
    fn test_typo_resolves() {
        let (index, ratio) = closest_title("drak knight", &titles()).unwrap();
        assert_eq!(index, 0);
        assert!(ratio >= MATCH_THRESHOLD);
    }

    #[test]
    fn test_far_query_is_not_found() {
        assert_eq!(closest_title("zzzzzznonexistentmovie", &titles()), None);
    }

    #[test]
    fn test_empty_query_has_no_match() {
        assert_eq!(closest_title("", &titles()), None);
        assert_eq!(closest_title("   ", &titles()), None);
    }

    #[test]
    fn test_tie_goes_to_first_title() {
        let duplicated = vec!["the host".to_string(), "the host".to_string()];
        assert_eq!(closest_title("the host", &duplicated), Some((0, 1.0)));
    }

    #[test]
    fn test_ratio_bounds() {
        assert_eq!(title_ratio("avatar", "avatar"), 1.0);
        assert_eq!(title_ratio("", ""), 1.0);
        assert_eq!(title_ratio("avatar", ""), 0.0);
        assert!(title_ratio("avatar", "titanic") < MATCH_THRESHOLD);
    }

    #[test]
    fn test_ratio_counts_matching_blocks() {
        // " knight" plus the single letters d, a and k
        assert!((title_ratio("drak knight", "the dark knight") - 20.0 / 26.0).abs() < 1e-9);
        // "ta" is the only shared block
        assert!((title_ratio("avatar", "titanic") - 4.0 / 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_title_prefix_resolves_to_longer_title() {
        let candidates: Vec<String> = [
            "pirates of the caribbean: on stranger tides",
            "the avengers",
            "avatar",
        ]
        .iter()
        .map(|t| t.to_string())
        .collect();

        let (index, ratio) = closest_title("pirates of the caribbean", &candidates).unwrap();
        assert_eq!(index, 0);
        assert!((ratio - 48.0 / 67.0).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_title_prefix_in_corpus() {
        let corpus = crate::services::test_support::fixture_corpus();
        let index = resolve_title(&corpus, "Pirates of the Caribbean").unwrap();
        assert_eq!(corpus.movie(index).unwrap().movie_id, 1865);
    }

    #[test]
    fn test_resolve_title_errors() {
        let corpus = crate::services::test_support::fixture_corpus();
        assert!(matches!(resolve_title(&corpus, "  "), Err(AppError::InvalidInput(_))));
        assert!(matches!(
            resolve_title(&corpus, "zzzzzznonexistentmovie"),
            Err(AppError::NotFound(_))
        ));
    }
}
