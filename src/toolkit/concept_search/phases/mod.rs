

pub mod vector;
pub mod lexical;
pub mod graph;
pub mod ranking;


pub use vector::{cosine_similarity, finalize_hits, HelixVectorIndex, InMemoryVectorIndex, VectorIndex};
pub use lexical::{extract_keywords, LexicalMatcher, STOP_WORDS};
pub use graph::{apply_centrality_boost, centrality_boost, PrerequisiteGraph};
pub use ranking::{filter_by_threshold, rank_results, sort_by_score};
