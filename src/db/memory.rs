

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::debug;

use super::store::ConceptStore;
use crate::core::error::Result;
use crate::toolkit::concept_search::models::{Concept, ConceptEdge, RelationshipType};
use crate::utils::contains_ignore_case;


/// Typed concept-to-concept edges held in a directed graph keyed by concept id.
#[derive(Debug, Default)]
pub struct ConceptGraph {
    graph: DiGraph<String, RelationshipType>,
    nodes: HashMap<String, NodeIndex>,
}

impl ConceptGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, concept_id: &str) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(concept_id) {
            return idx;
        }
        let idx = self.graph.add_node(concept_id.to_string());
        self.nodes.insert(concept_id.to_string(), idx);
        idx
    }

    /// Returns false when the same typed edge already exists.
    pub fn add_edge(&mut self, edge: &ConceptEdge) -> bool {
        let source = self.node(&edge.source_concept_id);
        let target = self.node(&edge.target_concept_id);

        let exists = self
            .graph
            .edges_connecting(source, target)
            .any(|e| *e.weight() == edge.relationship_type);
        if exists {
            return false;
        }

        self.graph.add_edge(source, target, edge.relationship_type);
        true
    }

    /// Outgoing edges of `source_id` in insertion order.
    pub fn outgoing(&self, source_id: &str, relationship: RelationshipType) -> Vec<ConceptEdge> {
        let Some(&source) = self.nodes.get(source_id) else {
            return Vec::new();
        };

        let mut edges: Vec<_> = self
            .graph
            .edges_directed(source, Direction::Outgoing)
            .filter(|e| *e.weight() == relationship)
            .collect();
        edges.sort_by_key(|e| e.id());

        edges
            .into_iter()
            .map(|e| ConceptEdge::new(source_id, self.graph[e.target()].clone(), relationship))
            .collect()
    }

    pub fn incoming_count(&self, target_id: &str, relationship: RelationshipType) -> usize {
        self.nodes.get(target_id).map_or(0, |&target| {
            self.graph
                .edges_directed(target, Direction::Incoming)
                .filter(|e| *e.weight() == relationship)
                .count()
        })
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}


#[derive(Default)]
struct ConceptTable {
    concepts: Vec<Concept>,
    positions: HashMap<String, usize>,
}


pub struct InMemoryConceptStore {
    table: RwLock<ConceptTable>,
    graph: RwLock<ConceptGraph>,
}

impl InMemoryConceptStore {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(ConceptTable::default()),
            graph: RwLock::new(ConceptGraph::new()),
        }
    }

    pub fn with_data<C, E>(concepts: C, edges: E) -> Self
    where
        C: IntoIterator<Item = Concept>,
        E: IntoIterator<Item = ConceptEdge>,
    {
        let store = Self::new();
        for concept in concepts {
            store.upsert_concept(concept);
        }
        for edge in edges {
            store.add_edge(edge);
        }
        store
    }

    /// Inserts a concept, replacing name, category, definition and tags of an existing id.
    pub fn upsert_concept(&self, concept: Concept) {
        let mut table = self.table.write();
        match table.positions.get(&concept.id).copied() {
            Some(pos) => table.concepts[pos] = concept,
            None => {
                let pos = table.concepts.len();
                table.positions.insert(concept.id.clone(), pos);
                table.concepts.push(concept);
            }
        }
    }

    pub fn add_edge(&self, edge: ConceptEdge) -> bool {
        self.graph.write().add_edge(&edge)
    }

    pub fn get(&self, id: &str) -> Option<Concept> {
        let table = self.table.read();
        table.positions.get(id).map(|&pos| table.concepts[pos].clone())
    }

    pub fn len(&self) -> usize {
        self.table.read().concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.read().edge_count()
    }
}

impl Default for InMemoryConceptStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConceptStore for InMemoryConceptStore {
    async fn concepts_by_ids(&self, ids: &[String]) -> Result<Vec<Concept>> {
        let table = self.table.read();
        Ok(ids
            .iter()
            .filter_map(|id| table.positions.get(id))
            .map(|&pos| table.concepts[pos].clone())
            .collect())
    }

    async fn find_by_keywords(&self, keywords: &[String], tag: Option<&str>) -> Result<Vec<Concept>> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let table = self.table.read();
        let found: Vec<Concept> = table
            .concepts
            .iter()
            .filter(|c| tag.is_none_or(|t| c.has_tag(t)))
            .filter(|c| {
                let name = c.name.to_lowercase();
                let definition = c.definition.to_lowercase();
                keywords.iter().any(|k| {
                    contains_ignore_case(&name, k) || contains_ignore_case(&definition, k)
                })
            })
            .cloned()
            .collect();

        debug!("Keyword lookup: {} keywords -> {} concepts", keywords.len(), found.len());
        Ok(found)
    }

    async fn edges_from(
        &self,
        source_ids: &[String],
        relationship: RelationshipType,
    ) -> Result<Vec<ConceptEdge>> {
        let graph = self.graph.read();
        let mut seen = HashSet::new();
        Ok(source_ids
            .iter()
            .filter(|id| seen.insert(*id))
            .flat_map(|id| graph.outgoing(id, relationship))
            .collect())
    }

    async fn incoming_edge_counts(
        &self,
        target_ids: &[String],
        relationship: RelationshipType,
    ) -> Result<HashMap<String, usize>> {
        let graph = self.graph.read();
        Ok(target_ids
            .iter()
            .map(|id| (id.clone(), graph.incoming_count(id, relationship)))
            .filter(|(_, count)| *count > 0)
            .collect())
    }
}
