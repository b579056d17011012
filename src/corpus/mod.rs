//! The immutable, process-lifetime corpus
//!
//! A `Corpus` bundles the movie table, the similarity matrix (index-aligned
//! with the table) and the metadata index. It is built once at startup and
//! shared read-only by every request.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;

use crate::{
    error::{CorpusError, CorpusResult},
    models::{MetadataRecord, MovieRecord},
};

pub mod artifacts;
pub mod builder;
pub mod metadata;
pub mod similarity;
pub mod stop_words;
pub mod store;
pub mod tfidf;

pub use artifacts::{ArtifactProvider, HttpArtifacts, LocalArtifacts};
pub use builder::BuiltCorpus;
pub use metadata::MetadataIndex;
pub use similarity::SimilarityMatrix;

/// Artifact names the loader resolves through an `ArtifactProvider`
#[derive(Debug, Clone)]
pub struct CorpusFiles {
    pub movies_csv: String,
    pub credits_csv: String,
    pub movie_table: String,
    pub similarity: String,
    /// Build from the raw CSVs instead of loading the precomputed artifacts
    pub rebuild: bool,
}

#[derive(Debug)]
pub struct Corpus {
    movies: Vec<MovieRecord>,
    titles_lower: Vec<String>,
    similarity: SimilarityMatrix,
    metadata: MetadataIndex,
    loaded_at: DateTime<Utc>,
}

impl Corpus {
    /// Assembles a corpus, rejecting a table and matrix of different sizes
    pub fn new(
        movies: Vec<MovieRecord>,
        similarity: SimilarityMatrix,
        metadata: MetadataIndex,
    ) -> CorpusResult<Self> {
        if movies.len() != similarity.len() {
            return Err(CorpusError::Misaligned {
                movies: movies.len(),
                matrix: similarity.len(),
            });
        }

        let titles_lower = movies.iter().map(|m| m.title.to_lowercase()).collect();

        Ok(Self {
            movies,
            titles_lower,
            similarity,
            metadata,
            loaded_at: Utc::now(),
        })
    }

    pub fn from_built(built: BuiltCorpus, metadata: MetadataIndex) -> CorpusResult<Self> {
        Self::new(built.movies, built.similarity, metadata)
    }

    pub fn movies(&self) -> &[MovieRecord] {
        &self.movies
    }

    pub fn movie(&self, index: usize) -> Option<&MovieRecord> {
        self.movies.get(index)
    }

    /// Lowercased titles in table order, used for fuzzy matching
    pub fn titles_lower(&self) -> &[String] {
        &self.titles_lower
    }

    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    /// Never fails: unknown ids map to an empty record
    pub fn metadata(&self, movie_id: i64) -> &MetadataRecord {
        self.metadata.get(movie_id)
    }

    pub fn metadata_len(&self) -> usize {
        self.metadata.len()
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

/// Resolves every artifact and loads (or rebuilds) the corpus.
///
/// File access and vectorization run on the blocking pool.
pub async fn load_corpus(
    provider: &dyn ArtifactProvider,
    files: &CorpusFiles,
) -> CorpusResult<Corpus> {
    tracing::info!(
        provider = provider.name(),
        rebuild = files.rebuild,
        "Loading corpus"
    );

    let movies_csv = provider.ensure_local(&files.movies_csv).await?;

    let corpus = if files.rebuild {
        let credits_csv = provider.ensure_local(&files.credits_csv).await?;
        run_blocking(move || {
            let built = builder::build_from_files(&movies_csv, &credits_csv)?;
            let metadata = MetadataIndex::from_path(&movies_csv)?;
            Corpus::from_built(built, metadata)
        })
        .await?
    } else {
        let table = provider.ensure_local(&files.movie_table).await?;
        let matrix = provider.ensure_local(&files.similarity).await?;
        run_blocking(move || load_precomputed(&table, &matrix, &movies_csv)).await?
    };

    tracing::info!(
        movies = corpus.len(),
        metadata = corpus.metadata_len(),
        "Corpus loaded"
    );

    Ok(corpus)
}

fn load_precomputed(table: &Path, matrix: &Path, movies_csv: &Path) -> CorpusResult<Corpus> {
    let movies = store::load_movie_table(table)?;
    let similarity = store::load_similarity(matrix)?;
    let metadata = MetadataIndex::from_path(movies_csv)?;
    Corpus::new(movies, similarity, metadata)
}

async fn run_blocking<T, F>(task: F) -> CorpusResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> CorpusResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| CorpusError::Task(e.to_string()))?
}

/// Holds the corpus once it has been loaded.
///
/// Concurrent first callers wait on the same load; later calls return the
/// stored corpus without touching the provider again.
#[derive(Debug, Default)]
pub struct CorpusCell {
    cell: OnceCell<Arc<Corpus>>,
}

impl CorpusCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_load(
        &self,
        provider: &dyn ArtifactProvider,
        files: &CorpusFiles,
    ) -> CorpusResult<Arc<Corpus>> {
        self.cell
            .get_or_try_init(|| async { load_corpus(provider, files).await.map(Arc::new) })
            .await
            .cloned()
    }

    pub fn get(&self) -> Option<Arc<Corpus>> {
        self.cell.get().cloned()
    }
}
