

pub mod client;
pub mod helix;
pub mod memory;
pub mod store;

pub use client::{HelixClient, HelixClientError};
pub use helix::HelixConceptStore;
pub use memory::{ConceptGraph, InMemoryConceptStore};
pub use store::ConceptStore;
