//! In-memory vector index with JSON persistence.
//!
//! A flat list of (vector, content) entries; search is cosine similarity over
//! all entries with a top-k cut. Persistence is a single serde JSON file, so
//! the index survives process restarts without a separate store.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::state::Passage;

/// One indexed chunk: its embedding and the original text.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    vector: Vec<f32>,
    content: String,
}

/// Flat in-memory vector index over corpus chunks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one chunk with its embedding.
    pub fn push(&mut self, vector: Vec<f32>, content: impl Into<String>) {
        self.entries.push(IndexEntry {
            vector,
            content: content.into(),
        });
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the `k` most similar chunks as corpus passages, best first.
    pub fn top_k(&self, query: &[f32], k: usize) -> Vec<Passage> {
        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|e| (cosine_similarity(query, &e.vector), e))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(k)
            .map(|(_, e)| Passage::corpus(e.content.clone()))
            .collect()
    }

    /// Persists the index as JSON at `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), WorkflowError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(self)
            .map_err(|e| WorkflowError::ExecutionFailed(format!("index serialize failed: {e}")))?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Loads an index previously written by [`VectorIndex::save`].
    pub fn load(path: &Path) -> Result<Self, WorkflowError> {
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| WorkflowError::ExecutionFailed(format!("index parse failed: {e}")))
    }
}

/// Cosine similarity; 0.0 when either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: cosine similarity is 1 for parallel, 0 for orthogonal and
    /// zero vectors.
    #[test]
    fn cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    /// **Scenario**: top_k orders by similarity and truncates to k.
    #[test]
    fn top_k_orders_and_truncates() {
        let mut index = VectorIndex::new();
        index.push(vec![1.0, 0.0], "east");
        index.push(vec![0.0, 1.0], "north");
        index.push(vec![0.7, 0.7], "northeast");
        let hits = index.top_k(&[1.0, 0.1], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "east");
        assert_eq!(hits[1].content, "northeast");
    }

    /// **Scenario**: an index round-trips through save/load.
    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("index.json");
        let mut index = VectorIndex::new();
        index.push(vec![0.1, 0.2], "a chunk");
        index.save(&path).unwrap();

        let loaded = VectorIndex::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        let hits = loaded.top_k(&[0.1, 0.2], 1);
        assert_eq!(hits[0].content, "a chunk");
    }

    /// **Scenario**: loading a missing file surfaces an Io error.
    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = VectorIndex::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, WorkflowError::Io(_)));
    }
}
