//! Catalog adapter for the streaming service
//!
//! - **[`types`]**: response shapes as sent by the Web API
//! - **[`mapping`]**: one mapping function per shape into domain types
//! - **[`provider`]**: [`SpotifyCatalog`], the `CatalogProvider` port

pub mod mapping;
pub mod provider;
pub mod types;

pub use provider::SpotifyCatalog;
