

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::client::HelixClient;
use super::store::ConceptStore;
use crate::core::error::Result;
use crate::toolkit::concept_search::models::{Concept, ConceptEdge, RelationshipType};


const QUERY_CONCEPTS_BY_IDS: &str = "getConceptsByIds";
const QUERY_CONCEPTS_BY_KEYWORDS: &str = "searchConceptsByKeywords";
const QUERY_EDGES_FROM: &str = "getConceptEdgesFrom";
const QUERY_INCOMING_COUNTS: &str = "countIncomingConceptEdges";


#[derive(Deserialize, Default)]
struct ConceptsResponse {
    #[serde(default)]
    concepts: Vec<Concept>,
}

#[derive(Deserialize, Default)]
struct EdgesResponse {
    #[serde(default)]
    edges: Vec<ConceptEdge>,
}

#[derive(Deserialize)]
struct IncomingCount {
    concept_id: String,
    count: usize,
}

#[derive(Deserialize, Default)]
struct CountsResponse {
    #[serde(default)]
    counts: Vec<IncomingCount>,
}


pub struct HelixConceptStore {
    client: Arc<HelixClient>,
}

impl HelixConceptStore {
    pub fn new(client: Arc<HelixClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConceptStore for HelixConceptStore {
    async fn concepts_by_ids(&self, ids: &[String]) -> Result<Vec<Concept>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let params = serde_json::json!({"ids": ids});
        let response: ConceptsResponse = self.client.execute_query(QUERY_CONCEPTS_BY_IDS, &params).await?;

        let mut by_id: HashMap<String, Concept> = response
            .concepts
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn find_by_keywords(&self, keywords: &[String], tag: Option<&str>) -> Result<Vec<Concept>> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let params = serde_json::json!({"keywords": keywords, "tag": tag});
        let response: ConceptsResponse = self
            .client
            .execute_query(QUERY_CONCEPTS_BY_KEYWORDS, &params)
            .await?;

        let concepts: Vec<Concept> = response
            .concepts
            .into_iter()
            .filter(|c| tag.is_none_or(|t| c.has_tag(t)))
            .collect();

        debug!("Keyword query returned {} concepts", concepts.len());
        Ok(concepts)
    }

    async fn edges_from(
        &self,
        source_ids: &[String],
        relationship: RelationshipType,
    ) -> Result<Vec<ConceptEdge>> {
        if source_ids.is_empty() {
            return Ok(Vec::new());
        }

        let params = serde_json::json!({
            "source_ids": source_ids,
            "relationship_type": relationship.as_str(),
        });
        let response: EdgesResponse = self.client.execute_query(QUERY_EDGES_FROM, &params).await?;

        Ok(response
            .edges
            .into_iter()
            .filter(|e| e.relationship_type == relationship)
            .collect())
    }

    async fn incoming_edge_counts(
        &self,
        target_ids: &[String],
        relationship: RelationshipType,
    ) -> Result<HashMap<String, usize>> {
        if target_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let params = serde_json::json!({
            "target_ids": target_ids,
            "relationship_type": relationship.as_str(),
        });
        let response: CountsResponse = self.client.execute_query(QUERY_INCOMING_COUNTS, &params).await?;

        Ok(response
            .counts
            .into_iter()
            .map(|c| (c.concept_id, c.count))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concepts_response_tolerates_missing_field() {
        let response: ConceptsResponse = serde_json::from_str("{}").unwrap();
        assert!(response.concepts.is_empty());
    }

    #[test]
    fn test_edges_response_parses_wire_names() {
        let response: EdgesResponse = serde_json::from_str(
            r#"{"edges":[{"source_concept_id":"a","target_concept_id":"b","relationship_type":"PREREQUISITE"}]}"#,
        )
        .unwrap();
        assert_eq!(response.edges, vec![ConceptEdge::prerequisite("a", "b")]);
    }

    #[test]
    fn test_counts_response_parses() {
        let response: CountsResponse =
            serde_json::from_str(r#"{"counts":[{"concept_id":"a","count":12}]}"#).unwrap();
        assert_eq!(response.counts.len(), 1);
        assert_eq!(response.counts[0].count, 12);
    }

    #[tokio::test]
    async fn test_empty_inputs_skip_queries() {
        let client = Arc::new(HelixClient::new("localhost", 6969).unwrap());
        let store = HelixConceptStore::new(client);

        assert!(store.concepts_by_ids(&[]).await.unwrap().is_empty());
        assert!(store.find_by_keywords(&[], None).await.unwrap().is_empty());
        assert!(store.edges_from(&[], RelationshipType::Prerequisite).await.unwrap().is_empty());
        assert!(store
            .incoming_edge_counts(&[], RelationshipType::Prerequisite)
            .await
            .unwrap()
            .is_empty());
    }
}
