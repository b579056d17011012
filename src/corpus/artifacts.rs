//! Artifact provisioning
//!
//! The corpus loader only needs local file paths. Where those files come from
//! (a mounted directory, a download from object storage) is hidden behind
//! `ArtifactProvider`, so corpus logic runs against local fixtures in tests.

use std::path::{Path, PathBuf};

use reqwest::Client as HttpClient;

use crate::error::{CorpusError, CorpusResult};

/// Resolves an artifact name to a readable local path
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ArtifactProvider: Send + Sync {
    async fn ensure_local(&self, name: &str) -> CorpusResult<PathBuf>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Artifacts already present in a local directory
#[derive(Debug, Clone)]
pub struct LocalArtifacts {
    dir: PathBuf,
}

impl LocalArtifacts {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait::async_trait]
impl ArtifactProvider for LocalArtifacts {
    async fn ensure_local(&self, name: &str) -> CorpusResult<PathBuf> {
        let path = self.dir.join(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            Ok(path)
        } else {
            Err(CorpusError::Unavailable {
                name: name.to_string(),
                reason: format!("not found in {}", self.dir.display()),
            })
        }
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// Downloads missing artifacts from `<base_url>/<name>` into a local directory.
///
/// A single attempt is made per artifact; failures are reported, not retried.
#[derive(Clone)]
pub struct HttpArtifacts {
    http_client: HttpClient,
    base_url: String,
    local: LocalArtifacts,
}

impl HttpArtifacts {
    pub fn new(base_url: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            local: LocalArtifacts::new(dir),
        }
    }

    fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    async fn download(&self, name: &str, path: &Path) -> CorpusResult<()> {
        let unavailable = |reason: String| CorpusError::Unavailable {
            name: name.to_string(),
            reason,
        };

        let url = self.url_for(name);
        tracing::info!(artifact = %name, url = %url, "Downloading artifact");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(unavailable(format!("remote returned status {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        tokio::fs::create_dir_all(self.local.dir())
            .await
            .map_err(|e| CorpusError::io(self.local.dir(), e))?;

        // Write under a temporary name so a failed download never looks complete.
        let partial = path.with_extension("partial");
        tokio::fs::write(&partial, &bytes)
            .await
            .map_err(|e| CorpusError::io(&partial, e))?;
        tokio::fs::rename(&partial, path)
            .await
            .map_err(|e| CorpusError::io(path, e))?;

        tracing::info!(artifact = %name, bytes = bytes.len(), "Artifact downloaded");
        Ok(())
    }
}

#[async_trait::async_trait]
impl ArtifactProvider for HttpArtifacts {
    async fn ensure_local(&self, name: &str) -> CorpusResult<PathBuf> {
        if let Ok(path) = self.local.ensure_local(name).await {
            tracing::debug!(artifact = %name, "Artifact already present locally");
            return Ok(path);
        }

        let path = self.local.dir().join(name);
        self.download(name, &path).await?;
        Ok(path)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
