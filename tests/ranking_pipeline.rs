use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use conceptrank::{
    Concept, ConceptEdge, ConceptStore, Embedder, EmbeddingError, InMemoryConceptStore,
    InMemoryVectorIndex, MatchSource, RankError, RankOptions, RelationshipType, RelevanceRanker,
    Result, SearchFilter, VectorHit, VectorIndex,
};

struct StubIndex {
    hits: Vec<VectorHit>,
}

impl StubIndex {
    fn empty() -> Arc<Self> {
        Arc::new(Self { hits: Vec::new() })
    }

    fn with(hits: &[(&str, f64)]) -> Arc<Self> {
        Arc::new(Self {
            hits: hits
                .iter()
                .map(|(id, score)| VectorHit {
                    concept_id: id.to_string(),
                    score: *score,
                    name: id.to_string(),
                })
                .collect(),
        })
    }
}

#[async_trait]
impl VectorIndex for StubIndex {
    async fn search(&self, _query: &str, limit: usize, _filter: Option<&SearchFilter>) -> Vec<VectorHit> {
        self.hits.iter().take(limit).cloned().collect()
    }
}

struct BrokenStore;

#[async_trait]
impl ConceptStore for BrokenStore {
    async fn concepts_by_ids(&self, _ids: &[String]) -> Result<Vec<Concept>> {
        Err(RankError::Connection("store offline".to_string()))
    }

    async fn find_by_keywords(&self, _keywords: &[String], _tag: Option<&str>) -> Result<Vec<Concept>> {
        Err(RankError::Connection("store offline".to_string()))
    }

    async fn edges_from(&self, _source_ids: &[String], _relationship: RelationshipType) -> Result<Vec<ConceptEdge>> {
        Err(RankError::Connection("store offline".to_string()))
    }

    async fn incoming_edge_counts(
        &self,
        _target_ids: &[String],
        _relationship: RelationshipType,
    ) -> Result<HashMap<String, usize>> {
        Err(RankError::Connection("store offline".to_string()))
    }
}

#[derive(Clone, Copy, PartialEq)]
enum FailingStage {
    Hydration,
    Edges,
    Counts,
}

/// Serves the founder curriculum but fails one bulk read.
struct FailingStageStore {
    inner: Arc<InMemoryConceptStore>,
    stage: FailingStage,
}

impl FailingStageStore {
    fn new(stage: FailingStage) -> Arc<Self> {
        Arc::new(Self {
            inner: founder_curriculum(),
            stage,
        })
    }

    fn fail_at(&self, stage: FailingStage) -> Result<()> {
        if self.stage == stage {
            return Err(RankError::Connection("store dropped the connection".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ConceptStore for FailingStageStore {
    async fn concepts_by_ids(&self, ids: &[String]) -> Result<Vec<Concept>> {
        self.fail_at(FailingStage::Hydration)?;
        self.inner.concepts_by_ids(ids).await
    }

    async fn find_by_keywords(&self, keywords: &[String], tag: Option<&str>) -> Result<Vec<Concept>> {
        self.inner.find_by_keywords(keywords, tag).await
    }

    async fn edges_from(&self, source_ids: &[String], relationship: RelationshipType) -> Result<Vec<ConceptEdge>> {
        self.fail_at(FailingStage::Edges)?;
        self.inner.edges_from(source_ids, relationship).await
    }

    async fn incoming_edge_counts(
        &self,
        target_ids: &[String],
        relationship: RelationshipType,
    ) -> Result<HashMap<String, usize>> {
        self.fail_at(FailingStage::Counts)?;
        self.inner.incoming_edge_counts(target_ids, relationship).await
    }
}

/// One axis per vocabulary word, 1.0 when the text mentions it.
struct VocabularyEmbedder {
    vocabulary: Vec<&'static str>,
}

#[async_trait]
impl Embedder for VocabularyEmbedder {
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
        let text = text.to_lowercase();
        Ok(self
            .vocabulary
            .iter()
            .map(|word| if text.contains(word) { 1.0 } else { 0.0 })
            .collect())
    }

    fn model_name(&self) -> &str {
        "vocabulary"
    }
}

fn founder_curriculum() -> Arc<InMemoryConceptStore> {
    Arc::new(InMemoryConceptStore::with_data(
        vec![
            Concept::new(
                "seg",
                "Market Segmentation",
                "marketing",
                "Dividing customers into groups with shared needs",
            ),
            Concept::new(
                "vbp",
                "Value-Based Pricing",
                "pricing",
                "A pricing strategy that sets prices by perceived customer value",
            )
            .with_tags(["founder"]),
            Concept::new("cv", "Customer Value", "strategy", "Benefit a customer perceives"),
            Concept::new("hire", "Hiring Plan", "operations", "When to add headcount"),
        ],
        vec![ConceptEdge::prerequisite("vbp", "cv")],
    ))
}

fn hub_curriculum(dependents: usize) -> Arc<InMemoryConceptStore> {
    let mut concepts: Vec<Concept> = (0..dependents)
        .map(|i| Concept::new(format!("dep{}", i), format!("Dependent {}", i), "general", "Builds on the hub"))
        .collect();
    concepts.push(Concept::new("hub", "Unit Economics", "finance", "Revenue and cost per unit"));
    let edges: Vec<ConceptEdge> = (0..dependents)
        .map(|i| ConceptEdge::prerequisite(format!("dep{}", i), "hub"))
        .collect();
    Arc::new(InMemoryConceptStore::with_data(concepts, edges))
}

fn ids(matches: &[conceptrank::ConceptMatch]) -> Vec<&str> {
    matches.iter().map(|m| m.concept_id.as_str()).collect()
}

#[tokio::test]
async fn keyword_fallback_ranks_by_weighted_hits() {
    let ranker = RelevanceRanker::new(StubIndex::empty(), founder_curriculum());
    let options = RankOptions::default().without_prerequisites();

    let results = ranker
        .find_relevant_concepts("pricing and market strategy", &options)
        .await
        .unwrap();

    assert_eq!(ids(&results), vec!["vbp", "seg"]);
    assert!((results[0].score - 0.5).abs() < 1e-9);
    assert!((results[1].score - 0.45).abs() < 1e-9);
    assert!(results.iter().all(|m| m.source == MatchSource::Lexical));
}

#[tokio::test]
async fn semantic_hits_below_threshold_fall_back_to_keywords() {
    let ranker = RelevanceRanker::new(StubIndex::with(&[("hire", 0.29)]), founder_curriculum());
    let options = RankOptions::default().without_prerequisites();

    let results = ranker.find_relevant_concepts("segmentation", &options).await.unwrap();
    assert_eq!(ids(&results), vec!["seg"]);
    assert_eq!(results[0].source, MatchSource::Lexical);
}

#[tokio::test]
async fn nothing_found_yields_empty_list() {
    let ranker = RelevanceRanker::new(StubIndex::empty(), founder_curriculum());
    let results = ranker
        .find_relevant_concepts("quantum chromodynamics", &RankOptions::default())
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn prerequisites_only_when_enabled() {
    let ranker = RelevanceRanker::new(StubIndex::with(&[("vbp", 0.9)]), founder_curriculum());

    let with = ranker.find_relevant_concepts("pricing", &RankOptions::default()).await.unwrap();
    assert_eq!(ids(&with), vec!["vbp", "cv"]);
    assert_eq!(with[1].source, MatchSource::Prerequisite);

    let without = ranker
        .find_relevant_concepts("pricing", &RankOptions::default().without_prerequisites())
        .await
        .unwrap();
    assert_eq!(ids(&without), vec!["vbp"]);
    assert!(without.iter().all(|m| m.source != MatchSource::Prerequisite));
}

#[tokio::test]
async fn central_concept_is_boosted_to_cap() {
    let ranker = RelevanceRanker::new(StubIndex::with(&[("hub", 0.7)]), hub_curriculum(12));
    let results = ranker.find_relevant_concepts("unit economics", &RankOptions::default()).await.unwrap();

    assert_eq!(ids(&results), vec!["hub"]);
    assert!((results[0].score - 0.85).abs() < 1e-9);
}

#[tokio::test]
async fn boosted_score_is_clamped_to_one() {
    let ranker = RelevanceRanker::new(StubIndex::with(&[("hub", 0.99)]), hub_curriculum(50));
    let results = ranker.find_relevant_concepts("unit economics", &RankOptions::default()).await.unwrap();
    assert_eq!(results[0].score, 1.0);
}

#[tokio::test]
async fn results_respect_limit_bounds_and_order() {
    let hits: Vec<(String, f64)> = (0..20).map(|i| (format!("dep{}", i), 0.31 + i as f64 * 0.03)).collect();
    let hit_refs: Vec<(&str, f64)> = hits.iter().map(|(id, s)| (id.as_str(), *s)).collect();
    let ranker = RelevanceRanker::new(StubIndex::with(&hit_refs), hub_curriculum(20));

    for limit in [1, 3, 7] {
        let results = ranker
            .find_relevant_concepts("dependents", &RankOptions::default().with_limit(limit))
            .await
            .unwrap();

        assert!(results.len() <= limit);
        assert!(results.iter().all(|m| (0.0..=1.0).contains(&m.score)));
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[tokio::test]
async fn equal_scores_keep_retrieval_order() {
    let ranker = RelevanceRanker::new(
        StubIndex::with(&[("hire", 0.6), ("seg", 0.6), ("vbp", 0.6)]),
        founder_curriculum(),
    );
    let results = ranker
        .find_relevant_concepts("anything", &RankOptions::default().without_prerequisites())
        .await
        .unwrap();
    assert_eq!(ids(&results), vec!["hire", "seg", "vbp"]);
}

#[tokio::test]
async fn repeated_calls_are_identical() {
    let ranker = RelevanceRanker::new(StubIndex::with(&[("vbp", 0.8), ("seg", 0.5)]), founder_curriculum());
    let options = RankOptions::default();

    let first = ranker.find_relevant_concepts("pricing segments", &options).await.unwrap();
    let second = ranker.find_relevant_concepts("pricing segments", &options).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn tag_filter_restricts_keyword_matches() {
    let ranker = RelevanceRanker::new(StubIndex::empty(), founder_curriculum());

    let tagged = ranker
        .find_relevant_concepts("pricing and market strategy", &RankOptions::default().with_tag("Founder"))
        .await
        .unwrap();
    // Prerequisites of a tagged match are added whatever their own tags.
    assert_eq!(ids(&tagged), vec!["cv", "vbp"]);
    assert_eq!(tagged[0].source, MatchSource::Prerequisite);

    let unknown = ranker
        .find_relevant_concepts("pricing and market strategy", &RankOptions::default().with_tag("nonexistent"))
        .await
        .unwrap();
    assert!(unknown.is_empty());
}

#[tokio::test]
async fn storage_failure_in_keyword_tier_propagates() {
    let ranker = RelevanceRanker::new(StubIndex::empty(), Arc::new(BrokenStore));
    let result = ranker.find_relevant_concepts("pricing strategy", &RankOptions::default()).await;
    assert!(matches!(result, Err(RankError::Connection(_))));
}

#[tokio::test]
async fn hydration_failure_propagates_instead_of_falling_back() {
    let ranker = RelevanceRanker::new(StubIndex::with(&[("vbp", 0.9)]), FailingStageStore::new(FailingStage::Hydration));
    // The keyword tier alone would succeed for this text.
    let result = ranker.find_relevant_concepts("pricing strategy", &RankOptions::default()).await;
    assert!(matches!(result, Err(RankError::Connection(_))));
}

#[tokio::test]
async fn prerequisite_expansion_failure_propagates() {
    let ranker = RelevanceRanker::new(StubIndex::with(&[("vbp", 0.9)]), FailingStageStore::new(FailingStage::Edges));
    let result = ranker.find_relevant_concepts("pricing", &RankOptions::default()).await;
    assert!(matches!(result, Err(RankError::Connection(_))));

    let skipped = ranker
        .find_relevant_concepts("pricing", &RankOptions::default().without_prerequisites())
        .await
        .unwrap();
    assert_eq!(ids(&skipped), vec!["vbp"]);
}

#[tokio::test]
async fn centrality_boost_failure_propagates() {
    let ranker = RelevanceRanker::new(StubIndex::with(&[("vbp", 0.9)]), FailingStageStore::new(FailingStage::Counts));
    let result = ranker
        .find_relevant_concepts("pricing", &RankOptions::default().without_prerequisites())
        .await;
    assert!(matches!(result, Err(RankError::Connection(_))));
}

#[tokio::test]
async fn capitalized_non_ascii_tag_finds_its_concepts() {
    let store = Arc::new(InMemoryConceptStore::with_data(
        vec![
            Concept::new("precio", "Precio Dinámico", "pricing", "Cómo fijar el precio según la demanda")
                .with_tags(["Émprendedor"]),
            Concept::new("churn", "Churn", "retention", "Clientes perdidos por mes"),
        ],
        Vec::new(),
    ));
    let ranker = RelevanceRanker::new(StubIndex::empty(), store);

    for tag in ["Émprendedor", "émprendedor", "ÉMPRENDEDOR"] {
        let results = ranker
            .find_relevant_concepts("precio y churn", &RankOptions::default().with_tag(tag))
            .await
            .unwrap();
        assert_eq!(ids(&results), vec!["precio"]);
    }
}

#[tokio::test]
async fn in_memory_vector_index_drives_semantic_tier() {
    let store = founder_curriculum();
    let embedder = Arc::new(VocabularyEmbedder {
        vocabulary: vec!["pricing", "segment", "hiring"],
    });
    let index = Arc::new(InMemoryVectorIndex::new(embedder));
    let concepts: Vec<Concept> = ["seg", "vbp", "hire"].iter().filter_map(|id| store.get(id)).collect();
    assert_eq!(index.index_all(&concepts).await.unwrap(), 3);

    let ranker = RelevanceRanker::new(index, store);
    let results = ranker
        .find_relevant_concepts("help with pricing", &RankOptions::default().without_prerequisites())
        .await
        .unwrap();

    assert_eq!(ids(&results), vec!["vbp"]);
    assert_eq!(results[0].source, MatchSource::Semantic);
    assert!((results[0].score - 1.0).abs() < 1e-9);
}
