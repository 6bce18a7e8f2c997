//! Context retrieval over a persisted passage table. Queries are embedded
//! with the same embedder used at ingestion time, compared by cosine
//! similarity, and returned closest-first. No similarity threshold is
//! applied: if no closer neighbours exist, distant chunks still fill k.

use std::sync::Arc;
use tracing::{debug, info};

use crate::client::Embedder;
use crate::domain::store::StateStore;
use crate::domain::types::HackathonListing;
use crate::error::Result;

const CHUNK_SIZE: usize = 1000;
const CHUNK_OVERLAP: usize = 200;

pub struct ContextRetriever {
    embedder: Arc<dyn Embedder>,
    /// Default number of passages returned per query.
    pub k: usize,
}

impl ContextRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, k: usize) -> Self {
        Self { embedder, k }
    }

    /// Returns up to `k` passages in similarity order, closest first.
    pub async fn retrieve(&self, store: &StateStore, query: &str, k: usize) -> Result<Vec<String>> {
        let query_embedding = self.embedder.embed(query).await?;
        let passages = store.passages_all().await?;

        let mut scored: Vec<(f32, String)> = passages
            .into_iter()
            .map(|(content, embedding)| (cosine_similarity(&query_embedding, &embedding), content))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let hits: Vec<String> = scored.into_iter().take(k).map(|(_, c)| c).collect();
        debug!(k, hits = hits.len(), "similarity search completed");
        Ok(hits)
    }

    /// The chat path's view: top-k chunks joined with newlines for prompt
    /// injection.
    pub async fn retrieve_joined(&self, store: &StateStore, query: &str) -> Result<String> {
        Ok(self.retrieve(store, query, self.k).await?.join("\n"))
    }

    /// Bulk re-index, triggered externally after ingestion refreshes the
    /// catalog. Re-embeds every listing and replaces the passage table.
    pub async fn reindex(&self, store: &StateStore, listings: &[HackathonListing]) -> Result<usize> {
        let mut passages = Vec::new();
        for listing in listings {
            let text = format!(
                "{}: {} (Skills: {}, Deadline: {})",
                listing.name,
                listing.description,
                listing.skills_required.join(", "),
                listing.deadline.format("%Y-%m-%d")
            );
            for chunk in chunk_text(&text, CHUNK_SIZE, CHUNK_OVERLAP) {
                let embedding = self.embedder.embed(&chunk).await?;
                passages.push((chunk, embedding));
            }
        }
        store.replace_passages(&passages).await?;
        info!(passages = passages.len(), "similarity index rebuilt");
        Ok(passages.len())
    }
}

/// Fixed-size character chunking with overlap, matching the ingestion
/// pipeline's splitter parameters.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    assert!(overlap < size);
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start = end - overlap;
    }
    chunks
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
