//! LLM enrichment: manufacturer, part number, English description, and a
//! verified US retail price for each scraped product.

pub mod engine;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod response;

pub use engine::{BatchFailure, BatchStage, EnrichmentEngine, EnrichmentOutcome};
pub use error::EnrichError;
pub use llm::{GeminiClient, LlmClient};
