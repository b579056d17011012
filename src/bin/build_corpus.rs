//! Offline corpus build.
//!
//! Reads the raw TMDB CSVs from `ARTIFACT_DIR`, builds the movie table and the
//! similarity matrix, and writes both artifacts next to them for the server
//! to load at startup.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use moctail_api::{
    config::Config,
    corpus::{builder, store, ArtifactProvider, LocalArtifacts},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("moctail_api=info")),
        )
        .init();

    let files = config.corpus_files();
    let provider = LocalArtifacts::new(config.artifact_dir.clone());
    let movies_csv = provider.ensure_local(&files.movies_csv).await?;
    let credits_csv = provider.ensure_local(&files.credits_csv).await?;

    let table_path = provider.dir().join(&files.movie_table);
    let matrix_path = provider.dir().join(&files.similarity);

    let built = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let built = builder::build_from_files(&movies_csv, &credits_csv)?;
        store::save_movie_table(&table_path, &built.movies)?;
        store::save_similarity(&matrix_path, &built.similarity)?;
        Ok(built)
    })
    .await
    .context("Corpus build task panicked")??;

    tracing::info!(
        movies = built.movies.len(),
        dir = %config.artifact_dir.display(),
        table = %files.movie_table,
        similarity = %files.similarity,
        "Artifacts written"
    );

    Ok(())
}
