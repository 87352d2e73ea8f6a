

pub mod config;
pub mod models;
pub mod phases;
pub mod cache;
pub mod ranker;


pub use config::RankOptions;
pub use models::{Concept, ConceptEdge, ConceptMatch, MatchSource, RelationshipType, SearchFilter, VectorHit};
pub use phases::{HelixVectorIndex, InMemoryVectorIndex, VectorIndex};
pub use cache::{CacheStats, RankCache};
pub use ranker::RelevanceRanker;
