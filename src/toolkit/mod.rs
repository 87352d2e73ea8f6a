

pub mod concept_search;
