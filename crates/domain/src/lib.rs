//! # By Defeat Domain
//!
//! Domain types and models for the By Defeat player.
//!
//! This crate contains:
//! - Catalog and session data types (Track, AudioFeatures, UserProfile, etc.)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants, including the bundled demo playlist
//!
//! ## Architecture
//! - No dependencies on other By Defeat crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
