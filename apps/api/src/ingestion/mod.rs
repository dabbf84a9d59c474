// Resume ingestion: upload -> blob store -> parser -> reconcile -> persist.

pub mod coordinator;
pub mod handlers;

pub use coordinator::{IngestError, IngestionCoordinator};
