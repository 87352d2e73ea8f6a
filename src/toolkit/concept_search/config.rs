

use serde::{Deserialize, Serialize};


pub const PREREQUISITE_SCORE: f64 = 0.85;

pub const CENTRALITY_BOOST_PER_DEPENDENT: f64 = 0.015;

pub const MAX_CENTRALITY_BOOST: f64 = 0.15;


pub const CANDIDATE_MULTIPLIER: usize = 2;


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankOptions {
    pub limit: usize,
    pub threshold: f64,
    pub tag_filter: Option<String>,
    pub include_prerequisites: bool,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            threshold: 0.3,
            tag_filter: None,
            include_prerequisites: true,
        }
    }
}

impl RankOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag_filter = Some(tag.into());
        self
    }

    pub fn without_prerequisites(mut self) -> Self {
        self.include_prerequisites = false;
        self
    }


    pub fn candidate_limit(&self) -> usize {
        self.limit.saturating_mul(CANDIDATE_MULTIPLIER)
    }


    pub fn normalized_tag(&self) -> Option<String> {
        self.tag_filter
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }
}
