use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    db::CacheKey,
    error::{AppError, AppResult},
    models::{ApiResponse, GenreMatch, LogSearchRequest, MovieSummary, RecommendResponse},
    services::{browse, recommend, RatingFilter},
};

use super::AppState;

type ApiResult<T> = AppResult<Json<ApiResponse<T>>>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> AppResult<T> {
    params
        .map(|Query(params)| params)
        .map_err(|e| AppError::InvalidInput(e.body_text()))
}

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecommendParams {
    pub movie: Option<String>,
    pub min_rating: Option<f64>,
    pub min_votes: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ForYouParams {
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct GenreParams {
    pub genres: Option<String>,
    pub exclude: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub movies: usize,
    pub metadata_records: usize,
    pub loaded_at: DateTime<Utc>,
}

// Handlers

pub async fn home() -> ApiResult<Value> {
    ok(json!({ "message": "Backend is running successfully" }))
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<HealthResponse> {
    ok(HealthResponse {
        status: "healthy",
        movies: state.corpus.len(),
        metadata_records: state.corpus.metadata_len(),
        loaded_at: state.corpus.loaded_at(),
    })
}

/// Movies similar to `?movie=`, optionally thresholded by rating and votes
pub async fn recommend_movies(
    State(state): State<AppState>,
    params: Result<Query<RecommendParams>, QueryRejection>,
) -> ApiResult<RecommendResponse> {
    let params = query_params(params)?;
    let movie = params.movie.unwrap_or_default();
    if movie.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Movie parameter is required".to_string(),
        ));
    }

    let filter = RatingFilter {
        min_rating: params.min_rating.unwrap_or(0.0),
        min_votes: params.min_votes.unwrap_or(0),
    };
    let key = CacheKey::Recommendation {
        query: movie.clone(),
        min_rating: filter.min_rating,
        min_votes: filter.min_votes,
    };

    let corpus = &state.corpus;
    let response: AppResult<RecommendResponse> =
        crate::cached!(state.cache.as_ref(), key, state.cache_ttl, async {
            recommend(corpus, &movie, filter)
        });

    ok(response?)
}

pub async fn popular_movies(State(state): State<AppState>) -> ApiResult<Vec<MovieSummary>> {
    ok(browse::popular(&state.corpus))
}

pub async fn recent_movies(State(state): State<AppState>) -> ApiResult<Vec<MovieSummary>> {
    ok(browse::recent(&state.corpus))
}

pub async fn random_movies(State(state): State<AppState>) -> ApiResult<Vec<MovieSummary>> {
    let mut rng = rand::thread_rng();
    ok(browse::random_movies(&state.corpus, &mut rng))
}

/// Personalized feed from the user's recent searches
pub async fn for_you_movies(
    State(state): State<AppState>,
    params: Result<Query<ForYouParams>, QueryRejection>,
) -> ApiResult<Vec<MovieSummary>> {
    let params = query_params(params)?;
    let movies = browse::for_you(&state.corpus, state.history.as_ref(), params.user_id).await;
    ok(movies)
}

/// Movies sharing genres with `?genres=a,b`, skipping `?exclude=`
pub async fn movies_by_genres(
    State(state): State<AppState>,
    params: Result<Query<GenreParams>, QueryRejection>,
) -> ApiResult<Vec<GenreMatch>> {
    let params = query_params(params)?;
    let genres: Vec<String> = params
        .genres
        .unwrap_or_default()
        .split(',')
        .map(str::to_string)
        .collect();

    ok(browse::by_genre(
        &state.corpus,
        &genres,
        params.exclude.as_deref(),
    )?)
}

/// Records a searched title for the for-you feed
pub async fn log_search(
    State(state): State<AppState>,
    payload: Result<Json<LogSearchRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(request) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;

    let (Some(user_id), Some(movie_title)) = (
        request.user_id,
        request.movie_title.filter(|t| !t.trim().is_empty()),
    ) else {
        return Err(AppError::InvalidInput(
            "Missing user_id or movie_title".to_string(),
        ));
    };

    if !state.history.add_search(user_id, &movie_title).await {
        return Err(AppError::UpstreamUnavailable(
            "Failed to log search".to_string(),
        ));
    }

    tracing::info!(user_id, movie_title = %movie_title, "Search logged");
    ok(json!({ "message": "Search logged" }))
}

pub async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
