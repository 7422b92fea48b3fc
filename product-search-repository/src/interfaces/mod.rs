//! Interface definitions for the document store client.
//!
//! This module defines the abstract `SearchEngineClient` trait that allows
//! for dependency injection and swappable store implementations.

mod search_engine_client;

pub use search_engine_client::SearchEngineClient;
