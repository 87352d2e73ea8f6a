

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    pub name: String,
    pub category: String,
    pub definition: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Concept {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        definition: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            definition: definition.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| tags_match(t, tag))
    }


    pub fn embedding_text(&self) -> String {
        format!("{}: {}", self.name, self.definition)
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    Prerequisite,
    Related,
    BuildsOn,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptEdge {
    pub source_concept_id: String,
    pub target_concept_id: String,
    pub relationship_type: RelationshipType,
}

impl ConceptEdge {
    pub fn new(
        source_concept_id: impl Into<String>,
        target_concept_id: impl Into<String>,
        relationship_type: RelationshipType,
    ) -> Self {
        Self {
            source_concept_id: source_concept_id.into(),
            target_concept_id: target_concept_id.into(),
            relationship_type,
        }
    }


    pub fn prerequisite(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(source, target, RelationshipType::Prerequisite)
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchSource {
    Semantic,
    Lexical,
    Prerequisite,
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptMatch {
    pub concept_id: String,
    pub concept_name: String,
    pub category: String,
    pub definition: String,
    pub score: f64,
    pub source: MatchSource,
}

impl ConceptMatch {
    pub fn from_concept(concept: &Concept, score: f64, source: MatchSource) -> Self {
        Self {
            concept_id: concept.id.clone(),
            concept_name: concept.name.clone(),
            category: concept.category.clone(),
            definition: concept.definition.clone(),
            // `+ 0.0` turns -0.0 into 0.0 so equal scores sort as ties.
            score: score.clamp(0.0, 1.0) + 0.0,
            source,
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    pub concept_id: String,
    pub score: f64,
    pub name: String,
}


/// Unicode case-insensitive tag equality, so `Émprendedor` matches `émprendedor`.
pub fn tags_match(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}


#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub tag: Option<String>,
}

impl SearchFilter {
    pub fn tag(tag: impl Into<String>) -> Self {
        Self { tag: Some(tag.into()) }
    }

    pub fn accepts(&self, tags: &[String]) -> bool {
        match &self.tag {
            Some(tag) => tags.iter().any(|t| tags_match(t, tag)),
            None => true,
        }
    }
}
