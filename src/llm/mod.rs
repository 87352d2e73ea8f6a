

pub mod embeddings;

pub use embeddings::{Embedder, EmbeddingError, EmbeddingGenerator, is_zero_vector};
