//! Medallion pipeline
//!
//! Incoming batches are validated as a whole, written to bronze as-is, normalized into
//! silver, and the gold monthly table is recomputed from all of silver.

mod orchestrator;
mod validation;

pub use orchestrator::{IngestSummary, Pipeline};
pub use validation::{validate_batch, REQUIRED_FIELDS};
