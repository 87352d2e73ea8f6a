use std::collections::HashSet;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

use super::ranking::sort_by_score;
use super::super::models::{Concept, ConceptMatch, MatchSource};
use crate::core::error::Result;
use crate::db::ConceptStore;
use crate::utils::contains_ignore_case;


pub const MAX_KEYWORDS: usize = 15;

pub const MIN_KEYWORD_CHARS: usize = 3;

const NAME_HIT_WEIGHT: usize = 3;
const DEFINITION_HIT_WEIGHT: usize = 1;

const BASE_SCORE: f64 = 0.3;
const SCORE_PER_HIT: f64 = 0.05;
const MAX_LEXICAL_SCORE: f64 = 0.95;

lazy_static! {
    // Keeps ASCII alphanumerics plus Latin-1 Supplement and Latin Extended-A/B.
    static ref NON_KEYWORD_CHARS: Regex =
        Regex::new(r"[^a-z0-9\x{00C0}-\x{024F}]").expect("keyword character class is valid");

    pub static ref STOP_WORDS: HashSet<&'static str> = [
        // en
        "the", "and", "for", "with", "that", "this", "what", "how", "are", "was", "were",
        "have", "has", "had", "not", "but", "you", "your", "our", "can", "will", "would",
        "should", "could", "about", "from", "into", "they", "them", "their", "there",
        "which", "who", "when", "where", "why", "does", "did", "been", "being", "more",
        "most", "some", "any", "all", "just", "also", "than", "then", "very", "its",
        "his", "her", "she", "him", "out", "get", "got", "these", "those", "here",
        // es
        "que", "los", "las", "del", "para", "con", "por", "una", "uno", "como", "pero",
        "más", "mas", "este", "esta", "esto", "son", "sus", "muy", "sin", "sobre",
        "también", "cuando", "donde", "qué", "cómo", "hay", "ser", "está",
        // fr
        "les", "des", "une", "pour", "avec", "dans", "est", "sont", "pas", "qui", "sur",
        "par", "plus", "mais", "comme", "cette", "ces", "aux", "ont", "être", "nous", "vous",
        // de
        "der", "die", "das", "und", "ist", "mit", "für", "von", "den", "dem", "ein", "eine",
        "einen", "nicht", "auf", "auch", "sich", "wie", "oder", "aber", "bei", "sind",
        // pt
        "não", "com", "dos", "das", "mais", "são", "seu", "sua", "isso", "essa", "esse",
        // it
        "che", "della", "sono", "non", "gli", "più", "anche", "nel", "alla",
    ]
    .into_iter()
    .collect();
}


/// Extracts up to [`MAX_KEYWORDS`] distinct lowercase keywords in order of first occurrence.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    text.to_lowercase()
        .split_whitespace()
        .map(|token| NON_KEYWORD_CHARS.replace_all(token, "").into_owned())
        .filter(|token| token.chars().count() >= MIN_KEYWORD_CHARS)
        .filter(|token| !STOP_WORDS.contains(token.as_str()))
        .filter(|token| seen.insert(token.clone()))
        .take(MAX_KEYWORDS)
        .collect()
}


/// Weighted keyword hits: a keyword in the name counts 3, otherwise one in the definition counts 1.
pub fn weighted_hits(concept: &Concept, keywords: &[String]) -> usize {
    let name = concept.name.to_lowercase();
    let definition = concept.definition.to_lowercase();

    keywords
        .iter()
        .map(|k| {
            if contains_ignore_case(&name, k) {
                NAME_HIT_WEIGHT
            } else if contains_ignore_case(&definition, k) {
                DEFINITION_HIT_WEIGHT
            } else {
                0
            }
        })
        .sum()
}


pub fn lexical_score(hits: usize) -> f64 {
    (BASE_SCORE + SCORE_PER_HIT * hits as f64).min(MAX_LEXICAL_SCORE)
}


pub struct LexicalMatcher {
    store: Arc<dyn ConceptStore>,
}

impl LexicalMatcher {
    pub fn new(store: Arc<dyn ConceptStore>) -> Self {
        Self { store }
    }

    /// Storage failures propagate: there is no tier below this one.
    pub async fn search(&self, text: &str, limit: usize, tag: Option<&str>) -> Result<Vec<ConceptMatch>> {
        let keywords = extract_keywords(text);
        if keywords.is_empty() || limit == 0 {
            debug!("No keywords extracted from: {}", crate::safe_truncate(text, 50));
            return Ok(Vec::new());
        }

        let candidates = self.store.find_by_keywords(&keywords, tag).await?;

        let mut matches: Vec<ConceptMatch> = candidates
            .iter()
            .map(|c| ConceptMatch::from_concept(c, lexical_score(weighted_hits(c, &keywords)), MatchSource::Lexical))
            .collect();

        sort_by_score(&mut matches);
        matches.truncate(limit);

        info!("Lexical search: {} keywords -> {} matches", keywords.len(), matches.len());
        Ok(matches)
    }
}
