

pub mod core;
pub mod db;
pub mod llm;
pub mod toolkit;
pub mod utils;

pub use utils::safe_truncate;


pub use core::config::RankerConfig;
pub use core::error::{RankError, Result};
pub use db::{ConceptStore, HelixClient, HelixClientError, HelixConceptStore, InMemoryConceptStore};
pub use llm::embeddings::{Embedder, EmbeddingError, EmbeddingGenerator};
pub use toolkit::concept_search::{
    Concept, ConceptEdge, ConceptMatch, MatchSource, RankOptions, RelationshipType,
    InMemoryVectorIndex, RelevanceRanker, SearchFilter, VectorHit, VectorIndex,
};


pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";


pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";


pub const DEFAULT_HELIX_PORT: u16 = 6969;


pub const DEFAULT_CACHE_SIZE: usize = 1000;


pub const DEFAULT_CACHE_TTL: u64 = 300;
