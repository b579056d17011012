use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Startup failure: {0}")]
    StartupFailure(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::StartupFailure(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::UpstreamUnavailable(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::Database(_) | AppError::Cache(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "success": false,
            "data": null,
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Errors raised while building, fetching or loading the corpus.
///
/// Every variant is fatal for process bring-up; record-level problems are
/// absorbed into defaults by the parsers and never surface here.
#[derive(thiserror::Error, Debug)]
pub enum CorpusError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Artifact {name} is corrupt: {reason}")]
    Corrupt { name: String, reason: String },

    #[error("Artifact {name} is unavailable: {reason}")]
    Unavailable { name: String, reason: String },

    #[error("Movie table has {movies} rows but similarity matrix is {matrix}x{matrix}")]
    Misaligned { movies: usize, matrix: usize },

    #[error("Corpus task failed: {0}")]
    Task(String),
}

impl CorpusError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CorpusError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<CorpusError> for AppError {
    fn from(err: CorpusError) -> Self {
        AppError::StartupFailure(err.to_string())
    }
}

pub type CorpusResult<T> = Result<T, CorpusError>;
