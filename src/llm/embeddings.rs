
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::config::RankerConfig;

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";


#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty text")]
    EmptyText,

    #[error("Provider not implemented: {0}")]
    NotImplemented(String),

    #[error("Both primary and fallback failed: primary={0}, fallback={1}")]
    BothFailed(String, String),
}


#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn model_name(&self) -> &str;
}

#[async_trait]
impl Embedder for Arc<dyn Embedder> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed(text).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}


pub fn is_zero_vector(embedding: &[f32]) -> bool {
    embedding.iter().all(|v| *v == 0.0)
}


#[derive(Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct OpenAIEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
}


struct EmbeddingCache {
    entries: Mutex<LruCache<String, (Vec<f32>, Instant)>>,
    ttl: Duration,
}

impl EmbeddingCache {
    fn new(capacity: NonZeroUsize, ttl_secs: u64) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    fn get(&self, text: &str) -> Option<Vec<f32>> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(text) {
            Some((embedding, created_at)) if created_at.elapsed() < self.ttl => {
                return Some(embedding.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(text);
        }
        None
    }

    fn set(&self, text: &str, embedding: Vec<f32>) {
        self.entries.lock().put(text.to_string(), (embedding, Instant::now()));
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}


pub struct EmbeddingGenerator {
    provider: String,
    ollama_url: String,
    model: String,
    api_key: Option<String>,
    base_url: Option<String>,
    client: Client,
    cache: Option<EmbeddingCache>,

    fallback_enabled: bool,
    fallback_url: String,
    fallback_model: String,
    using_fallback: AtomicBool,
    fallback_count: AtomicUsize,
}

impl EmbeddingGenerator {

    pub fn from_config(config: &RankerConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        let provider = config.embedding_provider.to_lowercase();
        info!(
            "EmbeddingGenerator initialized: provider={}, model={}, cache={}",
            provider, config.embedding_model, config.embedding_cache_size
        );

        Ok(Self {
            provider,
            ollama_url: config.embedding_url.trim_end_matches('/').to_string(),
            model: config.embedding_model.clone(),
            api_key: config.embedding_api_key.clone(),
            base_url: config.embedding_base_url.clone(),
            client,
            cache: NonZeroUsize::new(config.embedding_cache_size)
                .map(|capacity| EmbeddingCache::new(capacity, config.embedding_cache_ttl)),
            fallback_enabled: config.embedding_fallback_enabled,
            fallback_url: config.embedding_fallback_url.trim_end_matches('/').to_string(),
            fallback_model: config.embedding_fallback_model.clone(),
            using_fallback: AtomicBool::new(false),
            fallback_count: AtomicUsize::new(0),
        })
    }


    pub async fn generate(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyText);
        }

        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(text)) {
            debug!("Cache HIT for: {}...", crate::safe_truncate(text, 50));
            return Ok(cached);
        }

        let result = match self.provider.as_str() {
            "ollama" => self.generate_ollama(&self.ollama_url, &self.model, text).await,
            "openai" => self.generate_openai(text).await,
            other => Err(EmbeddingError::NotImplemented(other.to_string())),
        };

        let embedding = match result {
            Ok(embedding) => {
                self.using_fallback.store(false, Ordering::SeqCst);
                embedding
            }
            Err(e) if self.fallback_enabled && self.provider != "ollama" => {
                debug!("Primary embedding provider unavailable, trying fallback: {}", e);
                self.fallback_to_ollama(text, &e).await?
            }
            Err(e) => return Err(e),
        };

        if let Some(cache) = &self.cache {
            cache.set(text, embedding.clone());
        }
        Ok(embedding)
    }

    async fn generate_ollama(&self, url: &str, model: &str, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = OllamaEmbeddingRequest { model, prompt: text };

        let response = self
            .client
            .post(format!("{}/api/embeddings", url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<OllamaEmbeddingResponse>()
            .await?;

        Ok(response.embedding)
    }

    async fn generate_openai(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| EmbeddingError::InvalidResponse("API key required".to_string()))?;

        let api_url = self
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_OPENAI_URL)
            .trim_end_matches('/');

        let request = OpenAIEmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", api_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<OpenAIEmbeddingResponse>()
            .await?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse("No embedding in response".to_string()))
    }

    async fn fallback_to_ollama(
        &self,
        text: &str,
        original_error: &EmbeddingError,
    ) -> Result<Vec<f32>, EmbeddingError> {
        info!(
            "Using fallback Ollama ({}/{}) - primary unavailable",
            self.fallback_url, self.fallback_model
        );

        let embedding = self
            .generate_ollama(&self.fallback_url, &self.fallback_model, text)
            .await
            .map_err(|e| EmbeddingError::BothFailed(original_error.to_string(), e.to_string()))?;

        self.using_fallback.store(true, Ordering::SeqCst);
        let total = self.fallback_count.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Fallback successful: dims={}, total_fallbacks={}", embedding.len(), total);

        Ok(embedding)
    }

    pub fn is_using_fallback(&self) -> bool {
        self.using_fallback.load(Ordering::SeqCst)
    }

    pub fn fallback_count(&self) -> usize {
        self.fallback_count.load(Ordering::SeqCst)
    }

    pub fn cache_size(&self) -> usize {
        self.cache.as_ref().map_or(0, EmbeddingCache::len)
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
            info!("Embedding cache cleared");
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }
}

#[async_trait]
impl Embedder for EmbeddingGenerator {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.generate(text).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
