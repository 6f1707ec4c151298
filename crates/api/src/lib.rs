//! # By Defeat App
//!
//! Command-line application layer - commands and main entry point.
//!
//! This crate contains:
//! - Commands behind the CLI subcommands
//! - Application context (dependency injection)
//! - Logging setup
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod commands;
pub mod context;
pub mod utils;

pub use context::AppContext;
