

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use helix_rs::{HelixDB, HelixDBClient, HelixError};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::config::RankerConfig;


const DEFAULT_MAX_RETRIES: u32 = 3;

const INITIAL_RETRY_DELAY_MS: u64 = 100;

const MAX_RETRY_DELAY_MS: u64 = 10000;


#[derive(Debug, Error)]
pub enum HelixClientError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Query failed: {0}")]
    Query(String),
    #[error("Helix error: {0}")]
    Helix(#[from] HelixError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Retry exhausted after {0} attempts: {1}")]
    RetryExhausted(u32, String),
}


pub struct HelixClient {
    inner: HelixDB,
    is_connected: AtomicBool,
    base_url: String,
    max_retries: u32,
}

impl HelixClient {

    pub fn new(host: &str, port: u16) -> Result<Self, HelixClientError> {
        if host.trim().is_empty() {
            return Err(HelixClientError::Connection("empty host".to_string()));
        }

        let endpoint = format!("http://{}", host);
        let base_url = format!("http://{}:{}", host, port);

        let inner = <HelixDB as HelixDBClient>::new(
            Some(&endpoint),
            Some(port),
            None,
        );

        info!("HelixClient created for {}", base_url);

        Ok(Self {
            inner,
            is_connected: AtomicBool::new(false),
            base_url,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }


    pub fn from_config(config: &RankerConfig) -> Result<Self, HelixClientError> {
        Ok(Self::new(&config.helix_host, config.helix_port)?.with_max_retries(config.max_retries))
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }


    pub async fn execute_query<T, P>(&self, query_name: &str, params: &P) -> Result<T, HelixClientError>
    where
        T: DeserializeOwned,
        P: Serialize + Sync,
    {
        let mut last_error = None;
        let mut delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS);

        for attempt in 1..=self.max_retries {
            debug!("Executing query: {} (attempt {})", query_name, attempt);

            match self.inner.query::<P, T>(query_name, params).await {
                Ok(result) => {
                    self.is_connected.store(true, Ordering::Relaxed);
                    debug!("Query {} succeeded", query_name);
                    return Ok(result);
                }
                Err(e) => {
                    let err_str = e.to_string();

                    if is_not_found(&err_str) {
                        debug!("Query {} returned not found", query_name);
                        return Err(HelixClientError::Query(err_str));
                    }

                    debug!("Query {} failed (attempt {}/{}): {}", query_name, attempt, self.max_retries, e);
                    last_error = Some(err_str);

                    if attempt < self.max_retries {
                        tokio::time::sleep(delay).await;
                        delay = next_delay(delay);
                    }
                }
            }
        }

        Err(HelixClientError::RetryExhausted(
            self.max_retries,
            last_error.unwrap_or_else(|| "Unknown error".to_string()),
        ))
    }


    pub async fn execute_query_no_retry<T, P>(&self, query_name: &str, params: &P) -> Result<T, HelixClientError>
    where
        T: DeserializeOwned,
        P: Serialize + Sync,
    {
        self.inner
            .query::<P, T>(query_name, params)
            .await
            .map_err(|e| HelixClientError::Query(e.to_string()))
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected.load(Ordering::Relaxed)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

fn is_not_found(message: &str) -> bool {
    message.contains("not found") || message.contains("No value")
}

fn next_delay(delay: Duration) -> Duration {
    (delay * 2).min(Duration::from_millis(MAX_RETRY_DELAY_MS))
}
