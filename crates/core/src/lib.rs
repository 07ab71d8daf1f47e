//! Core types and configuration for the tickflow system.
//!
//! This crate provides shared types used across all other crates:
//! - Exact decimal quantities
//! - Market data types (executions, ticks, spans)
//! - The append-only ticker
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod num;
pub mod span;
pub mod ticker;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use num::Num;
pub use span::TimeSpan;
pub use ticker::Ticker;
pub use types::*;
