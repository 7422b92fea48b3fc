//! # Product Search Pipeline
//!
//! This crate provides the ingestion components that keep the product index
//! synchronized with the stream of product change events.
//!
//! ## Architecture
//!
//! The pipeline follows the Consumer-Processor-Loader pattern:
//!
//! 1. **Consumer**: Receives raw change events from Kafka
//! 2. **Processor**: Parses events and maps payloads into product documents
//! 3. **Dispatcher**: Runs index writes on a bounded worker pool, one shard
//!    per document id so writes for the same product never race
//! 4. **Loader**: Stages documents and commits them with retry and
//!    error classification
//! 5. **Orchestrator**: Coordinates the flow and commits broker offsets only
//!    after the corresponding documents are visible in the index

pub mod consumer;
pub mod dispatcher;
pub mod errors;
pub mod loader;
pub mod orchestrator;
pub mod processor;

#[cfg(test)]
mod testing;

pub use errors::PipelineError;
