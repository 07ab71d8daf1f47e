//! Historical replay for the tickflow system.
//!
//! This crate handles:
//! - Reading logged executions day by day
//! - Feeding them through the same engine path as live data

pub mod log_house;
pub mod replay;

pub use log_house::{LogHouse, MemoryLogHouse};
pub use replay::{ReplaySummary, Replayer};
