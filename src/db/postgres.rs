use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::services::SearchHistory;

/// Creates a PostgreSQL connection pool
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded migrations in `migrations/`
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Search history stored in the `search_history` table
#[derive(Debug, Clone)]
pub struct PgSearchHistory {
    pool: PgPool,
}

impl PgSearchHistory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SearchHistory for PgSearchHistory {
    async fn recent_searches(&self, user_id: i64, limit: usize) -> Vec<String> {
        let result = sqlx::query_scalar::<_, String>(
            "SELECT movie_title FROM search_history \
             WHERE user_id = $1 \
             ORDER BY searched_at DESC, id DESC \
             LIMIT $2",
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await;

        match result {
            Ok(titles) => titles,
            Err(e) => {
                tracing::error!(user_id, error = %e, "Failed to read search history");
                Vec::new()
            }
        }
    }

    async fn add_search(&self, user_id: i64, movie_title: &str) -> bool {
        let result = sqlx::query("INSERT INTO search_history (user_id, movie_title) VALUES ($1, $2)")
            .bind(user_id)
            .bind(movie_title)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(user_id, movie_title, error = %e, "Failed to record search");
                false
            }
        }
    }
}
