//! Dependency initialization and wiring for the product search service.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Settings;
use crate::ServiceError;
use product_search_api::AppState;
use product_search_pipeline::{
    consumer::{KafkaConsumer, KafkaConsumerConfig},
    dispatcher::DispatcherConfig,
    loader::{IndexWriter, LoaderConfig},
    orchestrator::{Orchestrator, OrchestratorConfig},
    processor::ProductProcessor,
};
use product_search_repository::{IndexConfig, OpenSearchClient, QueryConfig, SearchEngineClient};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured pipeline ready to run.
    pub orchestrator: Orchestrator,
    /// State for the search API router.
    pub api_state: AppState,
    /// Address the search API listens on.
    pub http_addr: SocketAddr,
}

impl Dependencies {
    /// Initialize all dependencies.
    ///
    /// Fails if the store is unreachable or unhealthy, if the product index
    /// cannot be created, or if the Kafka consumer cannot be built.
    pub async fn new(settings: &Settings) -> Result<Self, ServiceError> {
        info!(
            opensearch_url = %settings.opensearch_url,
            index = %settings.opensearch_index,
            kafka_broker = %settings.kafka_broker,
            kafka_group_id = %settings.kafka_group_id,
            kafka_topic = %settings.kafka_topic,
            "Initializing dependencies"
        );

        // One client serves both the pipeline and the API
        let search_client: Arc<dyn SearchEngineClient> = Arc::new(
            OpenSearchClient::new(
                &settings.opensearch_url,
                IndexConfig::new(&settings.opensearch_index),
                QueryConfig::with_price_ceiling(settings.price_facet_ceiling),
            )
            .map_err(|e| ServiceError::config(format!("Failed to create OpenSearch client: {}", e)))?,
        );

        // Verify OpenSearch is reachable
        let healthy = search_client
            .health_check()
            .await
            .map_err(|e| ServiceError::config(format!("OpenSearch health check failed: {}", e)))?;

        if !healthy {
            return Err(ServiceError::config("OpenSearch cluster is unhealthy"));
        }

        info!("OpenSearch connection verified");

        search_client.ensure_index_exists().await?;

        let consumer = KafkaConsumer::new(
            &KafkaConsumerConfig::new(&settings.kafka_broker)
                .with_group_id(&settings.kafka_group_id)
                .with_topic(&settings.kafka_topic),
        )
        .map_err(|e| ServiceError::config(format!("Failed to create Kafka consumer: {}", e)))?;

        info!("Kafka consumer created");

        let writer = Arc::new(IndexWriter::with_config(
            search_client.clone(),
            LoaderConfig {
                batch_size: settings.commit_batch_size,
                flush_interval_ms: settings.commit_interval_ms,
                write_timeout_ms: settings.store_timeout_ms,
                ..LoaderConfig::default()
            },
        ));

        let orchestrator = Orchestrator::with_config(
            Arc::new(consumer),
            ProductProcessor::new(),
            writer,
            OrchestratorConfig {
                dispatcher: DispatcherConfig {
                    workers: settings.write_workers,
                    ..DispatcherConfig::default()
                },
                ..OrchestratorConfig::default()
            },
        );

        let api_state = AppState::new(search_client)
            .with_query_timeout(Duration::from_millis(settings.store_timeout_ms));

        Ok(Self {
            orchestrator,
            api_state,
            http_addr: SocketAddr::from(([0, 0, 0, 0], settings.http_port)),
        })
    }
}
