

pub mod config;
pub mod error;

pub use config::RankerConfig;
pub use error::{RankError, Result};
