use std::path::PathBuf;

use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL connection URL for search history; in-memory history when unset
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL for the recommendation cache; caching disabled when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Directory holding raw CSVs and precomputed artifacts
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// Remote location to fetch missing artifacts from
    #[serde(default)]
    pub artifact_base_url: Option<String>,

    #[serde(default = "default_movies_csv")]
    pub movies_csv: String,

    #[serde(default = "default_credits_csv")]
    pub credits_csv: String,

    #[serde(default = "default_movie_table_file")]
    pub movie_table_file: String,

    #[serde(default = "default_similarity_file")]
    pub similarity_file: String,

    /// Build the corpus from the raw CSVs at startup instead of loading artifacts
    #[serde(default)]
    pub rebuild_corpus: bool,

    /// Comma separated list of allowed origins; any origin when unset
    #[serde(default)]
    pub cors_origins: Option<String>,

    /// TTL in seconds for cached recommendation responses
    #[serde(default = "default_recommend_cache_ttl")]
    pub recommend_cache_ttl: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_movies_csv() -> String {
    "tmdb_5000_movies.csv".to_string()
}

fn default_credits_csv() -> String {
    "tmdb_5000_credits.csv".to_string()
}

fn default_movie_table_file() -> String {
    "movies.json".to_string()
}

fn default_similarity_file() -> String {
    "similarity.bin.gz".to_string()
}

fn default_recommend_cache_ttl() -> u64 {
    3600
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Artifact names the corpus loader needs
    pub fn corpus_files(&self) -> crate::corpus::CorpusFiles {
        crate::corpus::CorpusFiles {
            movies_csv: self.movies_csv.clone(),
            credits_csv: self.credits_csv.clone(),
            movie_table: self.movie_table_file.clone(),
            similarity: self.similarity_file.clone(),
            rebuild: self.rebuild_corpus,
        }
    }

    /// Parsed CORS origins, `None` meaning any origin is allowed
    pub fn allowed_origins(&self) -> Option<Vec<String>> {
        self.cors_origins.as_ref().map(|raw| {
            raw.split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect()
        })
    }
}
