use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::toolkit::concept_search::models::{Concept, ConceptEdge, RelationshipType};


/// Read-only access to the curriculum: concepts and the typed edges between them.
///
/// Every method is a bulk operation so one ranking call issues a bounded number
/// of round trips regardless of how many concepts matched.
#[async_trait]
pub trait ConceptStore: Send + Sync {
    /// Concepts for the given ids, in the order of `ids`. Unknown ids are skipped.
    async fn concepts_by_ids(&self, ids: &[String]) -> Result<Vec<Concept>>;

    /// Concepts whose name or definition contains any of the lowercase `keywords`,
    /// restricted to concepts carrying `tag` when one is given.
    async fn find_by_keywords(&self, keywords: &[String], tag: Option<&str>) -> Result<Vec<Concept>>;

    /// Edges of the given type whose source is one of `source_ids`.
    async fn edges_from(
        &self,
        source_ids: &[String],
        relationship: RelationshipType,
    ) -> Result<Vec<ConceptEdge>>;

    /// Number of incoming edges of the given type per target, counted over the whole graph.
    /// Targets without incoming edges may be absent from the map.
    async fn incoming_edge_counts(
        &self,
        target_ids: &[String],
        relationship: RelationshipType,
    ) -> Result<HashMap<String, usize>>;
}


#[async_trait]
impl ConceptStore for Arc<dyn ConceptStore> {
    async fn concepts_by_ids(&self, ids: &[String]) -> Result<Vec<Concept>> {
        (**self).concepts_by_ids(ids).await
    }

    async fn find_by_keywords(&self, keywords: &[String], tag: Option<&str>) -> Result<Vec<Concept>> {
        (**self).find_by_keywords(keywords, tag).await
    }

    async fn edges_from(
        &self,
        source_ids: &[String],
        relationship: RelationshipType,
    ) -> Result<Vec<ConceptEdge>> {
        (**self).edges_from(source_ids, relationship).await
    }

    async fn incoming_edge_counts(
        &self,
        target_ids: &[String],
        relationship: RelationshipType,
    ) -> Result<HashMap<String, usize>> {
        (**self).incoming_edge_counts(target_ids, relationship).await
    }
}
