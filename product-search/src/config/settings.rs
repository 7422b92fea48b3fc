//! Service settings read from the environment.

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use crate::ServiceError;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default product index.
const DEFAULT_OPENSEARCH_INDEX: &str = "products";

/// Default Kafka broker address.
const DEFAULT_KAFKA_BROKER: &str = "localhost:9092";

/// Default Kafka consumer group ID.
const DEFAULT_KAFKA_GROUP_ID: &str = "search-indexer-v2";

/// Default topic carrying product change events.
const DEFAULT_KAFKA_TOPIC: &str = "product-search-events";

const DEFAULT_HTTP_PORT: u16 = 8888;
const DEFAULT_WRITE_WORKERS: usize = 4;
const DEFAULT_COMMIT_BATCH_SIZE: usize = 100;
const DEFAULT_COMMIT_INTERVAL_MS: u64 = 1000;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 5000;
const DEFAULT_PRICE_FACET_CEILING: f64 = 1000.0;

/// Everything the service reads from its environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub opensearch_url: String,
    pub opensearch_index: String,
    pub kafka_broker: String,
    pub kafka_group_id: String,
    pub kafka_topic: String,
    pub http_port: u16,
    pub write_workers: usize,
    pub commit_batch_size: usize,
    pub commit_interval_ms: u64,
    /// Bound on every store write and query.
    pub store_timeout_ms: u64,
    pub price_facet_ceiling: f64,
}

impl Settings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_INDEX`: product index name (default: products)
    /// - `KAFKA_BROKER`: Kafka broker address (default: localhost:9092)
    /// - `KAFKA_GROUP_ID`: Consumer group ID (default: search-indexer-v2)
    /// - `KAFKA_TOPIC`: change-event topic (default: product-search-events)
    /// - `HTTP_PORT`: search API port (default: 8888)
    /// - `WRITE_WORKERS`: index write workers (default: 4)
    /// - `COMMIT_BATCH_SIZE`: staged writes per store commit (default: 100)
    /// - `COMMIT_INTERVAL_MS`: longest wait before a store commit (default: 1000)
    /// - `STORE_TIMEOUT_MS`: bound on store writes and queries (default: 5000)
    /// - `PRICE_FACET_CEILING`: upper edge of the price facet (default: 1000)
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    ///
    /// Unset and empty variables take their default; values that do not
    /// parse, or numeric values that must be positive but are not, are a
    /// configuration error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let string = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let price_facet_ceiling = parse(&var, "PRICE_FACET_CEILING", DEFAULT_PRICE_FACET_CEILING)?;
        if !(price_facet_ceiling.is_finite() && price_facet_ceiling > 0.0) {
            return Err(ServiceError::config(format!(
                "PRICE_FACET_CEILING must be a positive number, got {}",
                price_facet_ceiling
            )));
        }

        Ok(Self {
            opensearch_url: string("OPENSEARCH_URL", DEFAULT_OPENSEARCH_URL),
            opensearch_index: string("OPENSEARCH_INDEX", DEFAULT_OPENSEARCH_INDEX),
            kafka_broker: string("KAFKA_BROKER", DEFAULT_KAFKA_BROKER),
            kafka_group_id: string("KAFKA_GROUP_ID", DEFAULT_KAFKA_GROUP_ID),
            kafka_topic: string("KAFKA_TOPIC", DEFAULT_KAFKA_TOPIC),
            http_port: parse(&var, "HTTP_PORT", DEFAULT_HTTP_PORT)?,
            write_workers: positive(&var, "WRITE_WORKERS", DEFAULT_WRITE_WORKERS)?,
            commit_batch_size: positive(&var, "COMMIT_BATCH_SIZE", DEFAULT_COMMIT_BATCH_SIZE)?,
            commit_interval_ms: positive(&var, "COMMIT_INTERVAL_MS", DEFAULT_COMMIT_INTERVAL_MS)?,
            store_timeout_ms: positive(&var, "STORE_TIMEOUT_MS", DEFAULT_STORE_TIMEOUT_MS)?,
            price_facet_ceiling,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            opensearch_url: DEFAULT_OPENSEARCH_URL.to_string(),
            opensearch_index: DEFAULT_OPENSEARCH_INDEX.to_string(),
            kafka_broker: DEFAULT_KAFKA_BROKER.to_string(),
            kafka_group_id: DEFAULT_KAFKA_GROUP_ID.to_string(),
            kafka_topic: DEFAULT_KAFKA_TOPIC.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            write_workers: DEFAULT_WRITE_WORKERS,
            commit_batch_size: DEFAULT_COMMIT_BATCH_SIZE,
            commit_interval_ms: DEFAULT_COMMIT_INTERVAL_MS,
            store_timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
            price_facet_ceiling: DEFAULT_PRICE_FACET_CEILING,
        }
    }
}

fn parse<T, V>(var: &V, key: &str, default: T) -> Result<T, ServiceError>
where
    T: FromStr,
    T::Err: Display,
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ServiceError::config(format!("Invalid {} '{}': {}", key, raw, e))),
    }
}

fn positive<T, V>(var: &V, key: &str, default: T) -> Result<T, ServiceError>
where
    T: FromStr + PartialOrd + Default + Display,
    T::Err: Display,
    V: Fn(&str) -> Option<String>,
{
    let value = parse(var, key, default)?;
    if value <= T::default() {
        return Err(ServiceError::config(format!(
            "{} must be greater than zero, got {}",
            key, value
        )));
    }
    Ok(value)
}
