

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::{RankError, Result};
use crate::toolkit::concept_search::RankOptions;


const ENV_PREFIX: &str = "CONCEPTRANK";

const SUPPORTED_EMBEDDING_PROVIDERS: &[&str] = &["ollama", "openai"];


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankerConfig {

    pub helix_host: String,
    pub helix_port: u16,
    pub timeout: u64,
    pub max_retries: u32,


    pub embedding_provider: String,
    pub embedding_model: String,
    pub embedding_url: String,
    pub embedding_base_url: Option<String>,
    pub embedding_api_key: Option<String>,


    pub embedding_fallback_enabled: bool,
    pub embedding_fallback_url: String,
    pub embedding_fallback_model: String,


    pub embedding_cache_size: usize,
    pub embedding_cache_ttl: u64,
    pub result_cache_size: usize,
    pub result_cache_ttl: u64,


    pub default_limit: usize,
    pub default_threshold: f64,
    pub include_prerequisites: bool,
}

impl RankerConfig {

    pub fn new(host: &str, port: u16) -> Self {
        Self {
            helix_host: host.to_string(),
            helix_port: port,
            timeout: 30,
            max_retries: 3,

            embedding_provider: "ollama".to_string(),
            embedding_model: crate::DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_url: crate::DEFAULT_OLLAMA_URL.to_string(),
            embedding_base_url: None,
            embedding_api_key: None,

            embedding_fallback_enabled: true,
            embedding_fallback_url: crate::DEFAULT_OLLAMA_URL.to_string(),
            embedding_fallback_model: crate::DEFAULT_EMBEDDING_MODEL.to_string(),

            embedding_cache_size: crate::DEFAULT_CACHE_SIZE,
            embedding_cache_ttl: crate::DEFAULT_CACHE_TTL,
            result_cache_size: 0,
            result_cache_ttl: crate::DEFAULT_CACHE_TTL,

            default_limit: 5,
            default_threshold: 0.3,
            include_prerequisites: true,
        }
    }


    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }


    pub fn from_env() -> Self {
        match Self::load(None) {
            Ok(config) => config,
            Err(e) => {
                warn!("Falling back to default configuration: {}", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.helix_port == 0 {
            return Err(RankError::Config("helix_port must be non-zero".to_string()));
        }

        let provider = self.embedding_provider.to_lowercase();
        if !SUPPORTED_EMBEDDING_PROVIDERS.contains(&provider.as_str()) {
            return Err(RankError::Config(format!(
                "unsupported embedding provider: {}",
                self.embedding_provider
            )));
        }

        check_url("embedding_url", &self.embedding_url)?;
        if let Some(base_url) = &self.embedding_base_url {
            check_url("embedding_base_url", base_url)?;
        }
        if self.embedding_fallback_enabled {
            check_url("embedding_fallback_url", &self.embedding_fallback_url)?;
        }

        if !(0.0..=1.0).contains(&self.default_threshold) {
            return Err(RankError::Config(format!(
                "default_threshold must be within [0, 1], got {}",
                self.default_threshold
            )));
        }
        if self.default_limit == 0 {
            return Err(RankError::Config("default_limit must be at least 1".to_string()));
        }

        Ok(())
    }


    pub fn default_options(&self) -> RankOptions {
        RankOptions {
            limit: self.default_limit,
            threshold: self.default_threshold,
            tag_filter: None,
            include_prerequisites: self.include_prerequisites,
        }
    }
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self::new("localhost", crate::DEFAULT_HELIX_PORT)
    }
}

fn check_url(field: &str, value: &str) -> Result<()> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| RankError::Config(format!("{} is not a valid URL ({}): {}", field, value, e)))
}
