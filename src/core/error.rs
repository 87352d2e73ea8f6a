

use thiserror::Error;

use crate::db::HelixClientError;


#[derive(Error, Debug)]
pub enum RankError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HelixDB connection error: {0}")]
    Connection(String),

    #[error("Storage error: {0}")]
    Storage(#[from] HelixClientError),

    #[error("Embedding generation error: {0}")]
    Embedding(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<config::ConfigError> for RankError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}


pub type Result<T> = std::result::Result<T, RankError>;
