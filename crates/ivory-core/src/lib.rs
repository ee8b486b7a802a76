//! Core data model and pure pipeline stages for the Ivory price tracker.
//!
//! Everything in this crate is free of network I/O: the product records that
//! flow through a run, the category catalog, environment configuration,
//! USD conversion and price ratios, export assembly, validation, and report
//! statistics.

pub mod app_config;
pub mod categories;
pub mod config;
pub mod error;
pub mod export;
pub mod pricing;
pub mod products;
pub mod report;
pub mod validate;

pub use app_config::AppConfig;
pub use categories::{load_categories, CategoryCatalog, CategoryGroup, CategoryInfo, CategoryItem};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use export::{assemble, CategoryExport, CategoryResult, RunExport, EXPORT_SOURCE};
pub use pricing::{price_products, price_to_usd, ratio};
pub use products::{EnrichedProduct, Enrichment, PricedProduct, RawProduct, SOURCE_CURRENCY};
pub use report::{category_stats, CategoryStats};
pub use validate::{validate, ValidationIssue};
