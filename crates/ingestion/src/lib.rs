//! Execution ingestion for the tickflow system.
//!
//! This crate handles:
//! - Bucketing executions into fixed-resolution ticks
//! - Filling unobserved slots
//! - Fanning executions out to every managed span

pub mod tick_builder;
pub mod manager;

pub use tick_builder::TickBuilder;
pub use manager::{Committed, TickerManager};
