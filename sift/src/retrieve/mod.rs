//! Corpus retrieval: embedder, vector index, and the retriever collaborator.
//!
//! Index build/save/load is an administrative lifecycle performed outside
//! query execution; queries only take a read lock. `retrieve` before any
//! build or load fails with `IndexNotReady`.

mod embedder;
mod index;

pub use embedder::{Embedder, OpenAiEmbedder};
pub use index::VectorIndex;

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::info;

use crate::error::WorkflowError;
use crate::state::Passage;

/// Maps a question to ranked corpus passages.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Returns up to k ranked passages for the question; `IndexNotReady` when
    /// no index has been built or loaded yet.
    async fn retrieve(&self, question: &str) -> Result<Vec<Passage>, WorkflowError>;
}

/// Vector-index-backed retriever over a local corpus.
///
/// The index is read-mostly: all concurrent retrievals share it through a read
/// lock, while `build`/`load` (write lock) happen as separate administrative
/// steps before querying begins.
pub struct CorpusRetriever {
    embedder: Arc<dyn Embedder>,
    index: RwLock<Option<VectorIndex>>,
    path: PathBuf,
    k: usize,
}

impl CorpusRetriever {
    /// Creates a retriever that persists its index at `path` and returns up to
    /// `k` passages per query.
    pub fn new(embedder: Arc<dyn Embedder>, path: impl Into<PathBuf>, k: usize) -> Self {
        Self {
            embedder,
            index: RwLock::new(None),
            path: path.into(),
            k,
        }
    }

    /// Embeds the passages and replaces the in-memory index with a fresh one.
    pub async fn build(&self, passages: &[Passage]) -> Result<(), WorkflowError> {
        let texts: Vec<&str> = passages.iter().map(|p| p.content.as_str()).collect();
        let mut index = VectorIndex::new();
        if !texts.is_empty() {
            let vectors = self.embedder.embed(&texts).await?;
            for (vector, passage) in vectors.into_iter().zip(passages) {
                index.push(vector, passage.content.clone());
            }
        }
        info!(chunks = index.len(), "built corpus index");
        *self.index.write().expect("index lock poisoned") = Some(index);
        Ok(())
    }

    /// Persists the current index to the configured path.
    pub fn save(&self) -> Result<(), WorkflowError> {
        let guard = self.index.read().expect("index lock poisoned");
        let index = guard.as_ref().ok_or(WorkflowError::IndexNotReady)?;
        index.save(&self.path)?;
        info!(path = %self.path.display(), chunks = index.len(), "saved corpus index");
        Ok(())
    }

    /// Loads a previously saved index from the configured path.
    pub fn load(&self) -> Result<(), WorkflowError> {
        let index = VectorIndex::load(&self.path)?;
        info!(path = %self.path.display(), chunks = index.len(), "loaded corpus index");
        *self.index.write().expect("index lock poisoned") = Some(index);
        Ok(())
    }

    /// True once an index has been built or loaded.
    pub fn is_ready(&self) -> bool {
        self.index.read().expect("index lock poisoned").is_some()
    }
}

#[async_trait]
impl Retriever for CorpusRetriever {
    async fn retrieve(&self, question: &str) -> Result<Vec<Passage>, WorkflowError> {
        // Embed first so the lock is never held across an await point.
        let vectors = self.embedder.embed(&[question]).await?;
        let query = vectors
            .into_iter()
            .next()
            .ok_or_else(|| WorkflowError::ExecutionFailed("embedder returned no vector".into()))?;

        let guard = self.index.read().expect("index lock poisoned");
        let index = guard.as_ref().ok_or(WorkflowError::IndexNotReady)?;
        Ok(index.top_k(&query, self.k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic embedder: counts letter frequencies into a small vector.
    struct BagOfLetters;

    #[async_trait]
    impl Embedder for BagOfLetters {
        async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, WorkflowError> {
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0.0f32; 26];
                    for c in t.to_lowercase().chars() {
                        if c.is_ascii_lowercase() {
                            v[(c as u8 - b'a') as usize] += 1.0;
                        }
                    }
                    v
                })
                .collect())
        }

        fn dimension(&self) -> usize {
            26
        }
    }

    /// **Scenario**: retrieve before build fails with IndexNotReady.
    #[tokio::test]
    async fn retrieve_before_build_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let retriever =
            CorpusRetriever::new(Arc::new(BagOfLetters), dir.path().join("idx.json"), 4);
        assert!(!retriever.is_ready());
        let err = retriever.retrieve("anything").await.unwrap_err();
        assert!(matches!(err, WorkflowError::IndexNotReady));
    }

    /// **Scenario**: build → retrieve ranks the lexically closest chunk first.
    #[tokio::test]
    async fn build_then_retrieve_ranks_similar_first() {
        let dir = tempfile::tempdir().unwrap();
        let retriever =
            CorpusRetriever::new(Arc::new(BagOfLetters), dir.path().join("idx.json"), 2);
        let corpus = vec![
            Passage::corpus("zebra zebra zebra"),
            Passage::corpus("interlibrary loan service"),
        ];
        retriever.build(&corpus).await.unwrap();
        let hits = retriever.retrieve("library loan").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].content.contains("interlibrary"));
    }

    /// **Scenario**: save → fresh retriever → load serves the same corpus.
    #[tokio::test]
    async fn save_and_load_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idx.json");
        let first = CorpusRetriever::new(Arc::new(BagOfLetters), &path, 1);
        first
            .build(&[Passage::corpus("solar system planets")])
            .await
            .unwrap();
        first.save().unwrap();

        let second = CorpusRetriever::new(Arc::new(BagOfLetters), &path, 1);
        second.load().unwrap();
        assert!(second.is_ready());
        let hits = second.retrieve("planets").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].content.contains("solar"));
    }

    /// **Scenario**: saving before any build fails with IndexNotReady.
    #[test]
    fn save_before_build_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let retriever =
            CorpusRetriever::new(Arc::new(BagOfLetters), dir.path().join("idx.json"), 4);
        assert!(matches!(
            retriever.save().unwrap_err(),
            WorkflowError::IndexNotReady
        ));
    }
}
