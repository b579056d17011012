use serde::Deserialize;

// ============================================================================
// TMDB CSV rows
// ============================================================================

/// Row of `tmdb_5000_movies.csv`. Only the columns the service reads are mapped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMovieRow {
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub genres: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub vote_average: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub vote_count: Option<u32>,
}

/// Row of `tmdb_5000_credits.csv`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCreditRow {
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub movie_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub cast: Option<String>,
    #[serde(default)]
    pub crew: Option<String>,
}

// ============================================================================
// Embedded list columns
// ============================================================================

/// Element of the genre / keyword / cast lists (`[{"id": 28, "name": "Action"}, ...]`)
#[derive(Debug, Deserialize)]
struct NamedEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CrewEntry {
    name: String,
    #[serde(default)]
    job: String,
}

/// Names from an encoded list column, `None` if the text is not a list of named objects
pub fn try_parse_names(text: &str) -> Option<Vec<String>> {
    match serde_json::from_str::<Vec<NamedEntry>>(text) {
        Ok(entries) => Some(entries.into_iter().map(|e| e.name).collect()),
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable list column");
            None
        }
    }
}

/// Names from an encoded list column. Malformed text yields an empty list.
pub fn parse_names(text: &str) -> Vec<String> {
    try_parse_names(text).unwrap_or_default()
}

/// Names of the first `limit` cast entries in source order
pub fn parse_top_cast(text: &str, limit: usize) -> Vec<String> {
    let mut names = parse_names(text);
    names.truncate(limit);
    names
}

/// Name of the first crew member whose job is "Director"
pub fn parse_director(text: &str) -> Option<String> {
    serde_json::from_str::<Vec<CrewEntry>>(text)
        .ok()?
        .into_iter()
        .find(|member| member.job == "Director")
        .map(|member| member.name)
}

/// Leading four-digit year of an ISO-like date, `0` when absent or malformed
pub fn release_year(date: Option<&str>) -> i32 {
    let Some(date) = date else {
        return 0;
    };
    let head = date.trim().split('-').next().unwrap_or_default();
    if head.len() == 4 && head.bytes().all(|b| b.is_ascii_digit()) {
        head.parse().unwrap_or(0)
    } else {
        0
    }
}
