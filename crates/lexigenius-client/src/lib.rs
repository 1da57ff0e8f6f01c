//! Clients for the external services: document analysis, template library, and document generation.

mod client;
mod error;
pub mod wire;

pub use client::{AnalyzeRequest, DEFAULT_SERVICE_URL, ServiceClient};
pub use error::ServiceError;
pub use wire::{AnalysisResponse, GenerateRequest, WireClause, WireSuggestion};
