use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use super::cache::{CacheStats, RankCache};
use super::config::RankOptions;
use super::models::{Concept, ConceptMatch, MatchSource, SearchFilter};
use super::phases::{filter_by_threshold, rank_results, LexicalMatcher, PrerequisiteGraph, VectorIndex};
use super::phases::vector::HelixVectorIndex;
use crate::core::config::RankerConfig;
use crate::core::error::{RankError, Result};
use crate::db::{ConceptStore, HelixClient, HelixConceptStore};
use crate::llm::embeddings::{Embedder, EmbeddingGenerator};


/// Ranks curriculum concepts for a piece of text.
///
/// Pipeline: semantic search, keyword fallback when semantic search finds nothing
/// above the threshold, prerequisite expansion, centrality boost, stable sort, cut.
/// Semantic failures degrade to the keyword tier; storage failures are returned.
pub struct RelevanceRanker {
    vector_index: Arc<dyn VectorIndex>,
    store: Arc<dyn ConceptStore>,
    lexical: LexicalMatcher,
    graph: PrerequisiteGraph,
    cache: Option<RankCache>,
}

impl RelevanceRanker {
    pub fn new(vector_index: Arc<dyn VectorIndex>, store: Arc<dyn ConceptStore>) -> Self {
        Self {
            vector_index,
            lexical: LexicalMatcher::new(Arc::clone(&store)),
            graph: PrerequisiteGraph::new(Arc::clone(&store)),
            store,
            cache: None,
        }
    }

    /// A zero capacity leaves caching disabled.
    pub fn with_cache(mut self, capacity: usize, ttl_secs: u64) -> Self {
        self.cache = NonZeroUsize::new(capacity).map(|c| RankCache::new(c, ttl_secs));
        self
    }


    pub fn from_config(config: &RankerConfig) -> Result<Self> {
        config.validate()?;

        let client = Arc::new(
            HelixClient::from_config(config).map_err(|e| RankError::Connection(e.to_string()))?,
        );
        let embedder: Arc<dyn Embedder> = Arc::new(
            EmbeddingGenerator::from_config(config).map_err(|e| RankError::Embedding(e.to_string()))?,
        );

        let vector_index = Arc::new(HelixVectorIndex::new(Arc::clone(&client), embedder));
        let store = Arc::new(HelixConceptStore::new(client));

        Ok(Self::new(vector_index, store).with_cache(config.result_cache_size, config.result_cache_ttl))
    }

    pub async fn find_relevant_concepts(&self, text: &str, options: &RankOptions) -> Result<Vec<ConceptMatch>> {
        if !(0.0..=1.0).contains(&options.threshold) {
            return Err(RankError::Validation(format!(
                "threshold must be within [0, 1], got {}",
                options.threshold
            )));
        }
        if options.limit == 0 || text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let cache_key = self.cache.as_ref().map(|_| RankCache::make_key(text, options));
        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            if let Some(cached) = cache.get(key) {
                debug!("Cache hit for query: {}", crate::safe_truncate(text, 50));
                return Ok(cached);
            }
        }

        let start = Instant::now();
        let tag = options.normalized_tag();

        let mut direct = self.semantic_matches(text, options, tag.as_deref()).await?;
        if direct.is_empty() {
            debug!("No semantic matches above {:.2}, falling back to keywords", options.threshold);
            direct = self
                .lexical
                .search(text, options.candidate_limit(), tag.as_deref())
                .await?;
        }

        if direct.is_empty() {
            info!("No concepts matched: {}", crate::safe_truncate(text, 50));
            return Ok(Vec::new());
        }

        let expanded = if options.include_prerequisites {
            self.graph.expand_with_prerequisites(direct, options.limit).await?
        } else {
            direct
        };

        let boosted = self.graph.boost_by_relationship_importance(expanded).await?;
        let ranked = rank_results(boosted, options.limit);

        info!(
            "Ranked {} concepts in {:.2}ms for: {}",
            ranked.len(),
            start.elapsed().as_secs_f64() * 1000.0,
            crate::safe_truncate(text, 50)
        );

        if let (Some(cache), Some(key)) = (&self.cache, cache_key) {
            cache.set(key, ranked.clone());
        }

        Ok(ranked)
    }

    async fn semantic_matches(
        &self,
        text: &str,
        options: &RankOptions,
        tag: Option<&str>,
    ) -> Result<Vec<ConceptMatch>> {
        let filter = tag.map(SearchFilter::tag);
        let hits = self
            .vector_index
            .search(text, options.candidate_limit(), filter.as_ref())
            .await;
        let mut seen: HashSet<String> = HashSet::new();
        let hits: Vec<_> = filter_by_threshold(hits, options.threshold)
            .into_iter()
            .filter(|h| seen.insert(h.concept_id.clone()))
            .collect();
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = hits.iter().map(|h| h.concept_id.clone()).collect();
        let concepts: HashMap<String, Concept> = self
            .store
            .concepts_by_ids(&ids)
            .await?
            .into_iter()
            .filter(|c| tag.is_none_or(|t| c.has_tag(t)))
            .map(|c| (c.id.clone(), c))
            .collect();

        let matches: Vec<ConceptMatch> = hits
            .iter()
            .filter_map(|hit| match concepts.get(&hit.concept_id) {
                Some(concept) => Some(ConceptMatch::from_concept(concept, hit.score, MatchSource::Semantic)),
                None => {
                    debug!("Dropping vector hit {} absent from the store", hit.concept_id);
                    None
                }
            })
            .collect();

        debug!("Semantic search: {} hits -> {} matches", hits.len(), matches.len());
        Ok(matches)
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(RankCache::stats)
    }

    pub fn invalidate_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
            info!("Ranking cache cleared");
        }
    }
}
