//! Processor module for the ingestion pipeline.
//!
//! Turns raw broker records into product documents ready for indexing.

mod change_event;
mod product_mapper;

pub use change_event::ChangeEvent;
pub use product_mapper::{map_payload, MappingError};

use tracing::{debug, instrument};

use crate::errors::PipelineError;
use product_search_shared::ProductDocument;

/// Processor that transforms raw change events into search documents.
///
/// Every well-formed event is treated as an upsert of the product it
/// carries; the event type is only reported in logs.
#[derive(Debug, Default)]
pub struct ProductProcessor;

impl ProductProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Parse a raw message value and map its payload.
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn process(&self, bytes: &[u8]) -> Result<ProductDocument, PipelineError> {
        let event = ChangeEvent::parse(bytes)?;
        let document = map_payload(&event.payload)?;

        debug!(
            event_type = %event.event_type(),
            id = %document.id,
            "Mapped change event"
        );
        Ok(document)
    }
}
