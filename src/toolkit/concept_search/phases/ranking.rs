

use super::super::models::{ConceptMatch, VectorHit};


/// Stable descending sort: equal scores keep their insertion order.
pub fn sort_by_score(matches: &mut [ConceptMatch]) {
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
}


pub fn filter_by_threshold(hits: Vec<VectorHit>, threshold: f64) -> Vec<VectorHit> {
    hits.into_iter().filter(|h| h.score >= threshold).collect()
}


pub fn rank_results(mut matches: Vec<ConceptMatch>, limit: usize) -> Vec<ConceptMatch> {
    sort_by_score(&mut matches);
    matches.truncate(limit);
    matches
}
