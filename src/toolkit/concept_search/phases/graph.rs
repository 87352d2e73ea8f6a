

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use super::super::config::{CANDIDATE_MULTIPLIER, CENTRALITY_BOOST_PER_DEPENDENT, MAX_CENTRALITY_BOOST, PREREQUISITE_SCORE};
use super::super::models::{ConceptMatch, MatchSource, RelationshipType};
use crate::core::error::Result;
use crate::db::ConceptStore;


pub fn centrality_boost(dependents: usize) -> f64 {
    (dependents as f64 * CENTRALITY_BOOST_PER_DEPENDENT).min(MAX_CENTRALITY_BOOST)
}


pub fn apply_centrality_boost(score: f64, dependents: usize) -> f64 {
    (score + centrality_boost(dependents)).min(1.0)
}


/// Prerequisite expansion and centrality boosting over the store's `PREREQUISITE` edges.
pub struct PrerequisiteGraph {
    store: Arc<dyn ConceptStore>,
}

impl PrerequisiteGraph {
    pub fn new(store: Arc<dyn ConceptStore>) -> Self {
        Self { store }
    }

    /// Prepends unmatched prerequisites of the matched concepts (score 0.85) and
    /// truncates the combined list to `2 * max_total`.
    pub async fn expand_with_prerequisites(
        &self,
        matches: Vec<ConceptMatch>,
        max_total: usize,
    ) -> Result<Vec<ConceptMatch>> {
        let cap = max_total.saturating_mul(CANDIDATE_MULTIPLIER);
        if matches.is_empty() {
            return Ok(matches);
        }

        let matched_ids: Vec<String> = matches.iter().map(|m| m.concept_id.clone()).collect();
        let edges = self
            .store
            .edges_from(&matched_ids, RelationshipType::Prerequisite)
            .await?;

        let matched: HashSet<&str> = matched_ids.iter().map(String::as_str).collect();
        let mut added: HashSet<&str> = HashSet::new();
        let new_ids: Vec<String> = edges
            .iter()
            .map(|e| e.target_concept_id.as_str())
            .filter(|target| !matched.contains(target) && added.insert(*target))
            .map(str::to_string)
            .collect();

        let mut expanded: Vec<ConceptMatch> = if new_ids.is_empty() {
            Vec::with_capacity(matches.len())
        } else {
            self.store
                .concepts_by_ids(&new_ids)
                .await?
                .iter()
                .map(|c| ConceptMatch::from_concept(c, PREREQUISITE_SCORE, MatchSource::Prerequisite))
                .collect()
        };

        let prerequisite_count = expanded.len();
        expanded.extend(matches);
        expanded.truncate(cap);

        info!(
            "Prerequisite expansion: {} edges, {} prerequisites added, {} total",
            edges.len(),
            prerequisite_count,
            expanded.len()
        );
        Ok(expanded)
    }

    /// Adds `min(dependents * 0.015, 0.15)` to each score, clamped to 1.0, where
    /// dependents is the number of concepts listing the match as a prerequisite.
    pub async fn boost_by_relationship_importance(
        &self,
        mut matches: Vec<ConceptMatch>,
    ) -> Result<Vec<ConceptMatch>> {
        if matches.is_empty() {
            return Ok(matches);
        }

        let ids: Vec<String> = matches.iter().map(|m| m.concept_id.clone()).collect();
        let counts = self
            .store
            .incoming_edge_counts(&ids, RelationshipType::Prerequisite)
            .await?;

        for m in matches.iter_mut() {
            let dependents = counts.get(&m.concept_id).copied().unwrap_or(0);
            if dependents > 0 {
                let boosted = apply_centrality_boost(m.score, dependents);
                debug!(
                    "Boosted {}: {:.3} -> {:.3} ({} dependents)",
                    crate::safe_truncate(&m.concept_id, 12),
                    m.score,
                    boosted,
                    dependents
                );
                m.score = boosted;
            }
        }

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryConceptStore;
    use crate::toolkit::concept_search::models::{Concept, ConceptEdge};

    fn concept(id: &str) -> Concept {
        Concept::new(id, format!("Concept {}", id), "general", format!("Definition of {}", id))
    }

    fn direct(id: &str, score: f64) -> ConceptMatch {
        ConceptMatch::from_concept(&concept(id), score, MatchSource::Semantic)
    }

    fn graph_with(concepts: &[&str], edges: Vec<ConceptEdge>) -> PrerequisiteGraph {
        let store = InMemoryConceptStore::with_data(concepts.iter().map(|id| concept(id)), edges);
        PrerequisiteGraph::new(Arc::new(store))
    }

    #[test]
    fn test_centrality_boost_caps() {
        assert_eq!(centrality_boost(0), 0.0);
        assert!((centrality_boost(4) - 0.06).abs() < 1e-9);
        assert_eq!(centrality_boost(11), MAX_CENTRALITY_BOOST);
        assert_eq!(centrality_boost(12), MAX_CENTRALITY_BOOST);
    }

    #[test]
    fn test_apply_centrality_boost_clamps_to_one() {
        assert_eq!(apply_centrality_boost(0.99, 50), 1.0);
        assert!((apply_centrality_boost(0.7, 12) - 0.85).abs() < 1e-9);
        assert_eq!(apply_centrality_boost(0.42, 0), 0.42);
    }

    #[tokio::test]
    async fn test_expansion_prepends_prerequisites() {
        let graph = graph_with(
            &["a", "b", "p1", "p2"],
            vec![
                ConceptEdge::prerequisite("a", "p1"),
                ConceptEdge::prerequisite("a", "b"),
                ConceptEdge::prerequisite("b", "p2"),
                ConceptEdge::prerequisite("b", "p1"),
                ConceptEdge::new("a", "p2", RelationshipType::Related),
            ],
        );

        let expanded = graph
            .expand_with_prerequisites(vec![direct("a", 0.9), direct("b", 0.6)], 5)
            .await
            .unwrap();

        let ids: Vec<_> = expanded.iter().map(|m| m.concept_id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2", "a", "b"]);
        assert_eq!(expanded[0].score, PREREQUISITE_SCORE);
        assert_eq!(expanded[0].source, MatchSource::Prerequisite);
        assert_eq!(expanded[2].score, 0.9);
    }

    #[tokio::test]
    async fn test_expansion_truncates_to_twice_max_total() {
        let graph = graph_with(
            &["a", "p1", "p2", "p3"],
            vec![
                ConceptEdge::prerequisite("a", "p1"),
                ConceptEdge::prerequisite("a", "p2"),
                ConceptEdge::prerequisite("a", "p3"),
            ],
        );

        let expanded = graph
            .expand_with_prerequisites(vec![direct("a", 0.9)], 1)
            .await
            .unwrap();

        let ids: Vec<_> = expanded.iter().map(|m| m.concept_id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_expansion_skips_prerequisites_missing_from_store() {
        let graph = graph_with(&["a"], vec![ConceptEdge::prerequisite("a", "ghost")]);
        let expanded = graph
            .expand_with_prerequisites(vec![direct("a", 0.9)], 5)
            .await
            .unwrap();
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].concept_id, "a");
    }

    #[tokio::test]
    async fn test_boost_counts_dependents_across_whole_graph() {
        let mut ids: Vec<String> = (0..12).map(|i| format!("dep{}", i)).collect();
        ids.push("core".to_string());
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let edges = (0..12).map(|i| ConceptEdge::prerequisite(format!("dep{}", i), "core")).collect();
        let graph = graph_with(&refs, edges);

        let boosted = graph
            .boost_by_relationship_importance(vec![direct("core", 0.7), direct("dep3", 0.5)])
            .await
            .unwrap();

        assert!((boosted[0].score - 0.85).abs() < 1e-9);
        assert_eq!(boosted[1].score, 0.5);
    }

    #[tokio::test]
    async fn test_boost_never_exceeds_one() {
        let mut ids: Vec<String> = (0..50).map(|i| format!("dep{}", i)).collect();
        ids.push("core".to_string());
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let edges = (0..50).map(|i| ConceptEdge::prerequisite(format!("dep{}", i), "core")).collect();
        let graph = graph_with(&refs, edges);

        let boosted = graph
            .boost_by_relationship_importance(vec![direct("core", 0.99)])
            .await
            .unwrap();
        assert_eq!(boosted[0].score, 1.0);
    }
}
