

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::super::models::{Concept, SearchFilter, VectorHit};
use crate::db::HelixClient;
use crate::llm::embeddings::{is_zero_vector, Embedder, EmbeddingError};


const QUERY_SEARCH_EMBEDDINGS: &str = "searchConceptEmbeddings";


/// Nearest-neighbour search over concept embeddings.
///
/// Never fails: an unavailable backend, a failed or all-zero query embedding
/// and a failed index query all yield an empty list, which callers treat as
/// "no semantic results".
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn search(&self, query: &str, limit: usize, filter: Option<&SearchFilter>) -> Vec<VectorHit>;
}

#[async_trait]
impl VectorIndex for Arc<dyn VectorIndex> {
    async fn search(&self, query: &str, limit: usize, filter: Option<&SearchFilter>) -> Vec<VectorHit> {
        (**self).search(query, limit, filter).await
    }
}


/// Cosine similarity clamped to `[0, 1]`; opposite or orthogonal vectors score 0.
pub fn cosine_similarity(vec1: &[f32], vec2: &[f32]) -> f64 {
    if vec1.is_empty() || vec2.is_empty() || vec1.len() != vec2.len() {
        return 0.0;
    }

    let dot_product: f32 = vec1.iter().zip(vec2.iter()).map(|(a, b)| a * b).sum();
    let mag1: f32 = vec1.iter().map(|a| a * a).sum::<f32>().sqrt();
    let mag2: f32 = vec2.iter().map(|b| b * b).sum::<f32>().sqrt();

    if mag1 == 0.0 || mag2 == 0.0 {
        return 0.0;
    }

    f64::from(dot_product / (mag1 * mag2)).clamp(0.0, 1.0) + 0.0
}


/// Drops duplicate ids (first wins) and non-finite scores, clamps, sorts descending (stable), truncates.
pub fn finalize_hits(hits: Vec<VectorHit>, limit: usize) -> Vec<VectorHit> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut finalized: Vec<VectorHit> = hits
        .into_iter()
        .filter(|h| h.score.is_finite())
        .filter(|h| seen.insert(h.concept_id.clone()))
        .map(|mut h| {
            h.score = h.score.clamp(0.0, 1.0) + 0.0;
            h
        })
        .collect();

    finalized.sort_by(|a, b| b.score.total_cmp(&a.score));
    finalized.truncate(limit);
    finalized
}

async fn embed_query(embedder: &dyn Embedder, query: &str) -> Option<Vec<f32>> {
    let embedding = match embedder.embed(query).await {
        Ok(e) => e,
        Err(EmbeddingError::EmptyText) => return None,
        Err(e) => {
            warn!("Query embedding failed, semantic search disabled for this call: {}", e);
            return None;
        }
    };

    if is_zero_vector(&embedding) {
        warn!("Query embedding is all zeros, skipping semantic search");
        return None;
    }
    Some(embedding)
}


#[derive(Deserialize)]
struct HelixVectorHit {
    concept_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    score: f64,
}

#[derive(Deserialize, Default)]
struct HelixVectorResponse {
    #[serde(default)]
    concepts: Vec<HelixVectorHit>,
}


pub struct HelixVectorIndex {
    client: Arc<HelixClient>,
    embedder: Arc<dyn Embedder>,
}

impl HelixVectorIndex {
    pub fn new(client: Arc<HelixClient>, embedder: Arc<dyn Embedder>) -> Self {
        Self { client, embedder }
    }
}

#[async_trait]
impl VectorIndex for HelixVectorIndex {
    async fn search(&self, query: &str, limit: usize, filter: Option<&SearchFilter>) -> Vec<VectorHit> {
        if limit == 0 {
            return Vec::new();
        }

        let Some(embedding) = embed_query(self.embedder.as_ref(), query).await else {
            return Vec::new();
        };

        let params = serde_json::json!({
            "vector": embedding,
            "limit": limit,
            "tag": filter.and_then(|f| f.tag.as_deref()),
        });

        let response: HelixVectorResponse = match self.client.execute_query(QUERY_SEARCH_EMBEDDINGS, &params).await {
            Ok(r) => r,
            Err(e) => {
                warn!("Vector search failed: {}", e);
                return Vec::new();
            }
        };

        let hits = response
            .concepts
            .into_iter()
            .map(|h| VectorHit {
                concept_id: h.concept_id,
                score: h.score,
                name: h.name,
            })
            .collect();

        let hits = finalize_hits(hits, limit);
        info!("Vector search: {} results", hits.len());
        hits
    }
}


struct IndexedConcept {
    concept_id: String,
    name: String,
    tags: Vec<String>,
    embedding: Vec<f32>,
}


pub struct InMemoryVectorIndex {
    embedder: Arc<dyn Embedder>,
    entries: RwLock<Vec<IndexedConcept>>,
}

impl InMemoryVectorIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn insert(&self, concept: &Concept, embedding: Vec<f32>) {
        let entry = IndexedConcept {
            concept_id: concept.id.clone(),
            name: concept.name.clone(),
            tags: concept.tags.clone(),
            embedding,
        };

        let mut entries = self.entries.write();
        match entries.iter_mut().find(|e| e.concept_id == concept.id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
    }

    pub async fn index_concept(&self, concept: &Concept) -> Result<(), EmbeddingError> {
        let embedding = self.embedder.embed(&concept.embedding_text()).await?;
        self.insert(concept, embedding);
        Ok(())
    }

    pub async fn index_all(&self, concepts: &[Concept]) -> Result<usize, EmbeddingError> {
        for concept in concepts {
            self.index_concept(concept).await?;
        }
        debug!("Indexed {} concepts with {}", concepts.len(), self.embedder.model_name());
        Ok(concepts.len())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn search(&self, query: &str, limit: usize, filter: Option<&SearchFilter>) -> Vec<VectorHit> {
        if limit == 0 {
            return Vec::new();
        }

        let Some(embedding) = embed_query(self.embedder.as_ref(), query).await else {
            return Vec::new();
        };

        let hits: Vec<VectorHit> = {
            let entries = self.entries.read();
            entries
                .iter()
                .filter(|e| filter.is_none_or(|f| f.accepts(&e.tags)))
                .map(|e| VectorHit {
                    concept_id: e.concept_id.clone(),
                    score: cosine_similarity(&embedding, &e.embedding),
                    name: e.name.clone(),
                })
                .filter(|h| h.score > 0.0)
                .collect()
        };

        finalize_hits(hits, limit)
    }
}
