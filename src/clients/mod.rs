pub mod processing_client;

pub use processing_client::{HttpProcessingClient, ProcessingService};
