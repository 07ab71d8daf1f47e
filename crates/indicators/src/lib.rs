//! Indicators for the tickflow system.
//!
//! This crate handles:
//! - Fixed-capacity windows for rolling aggregates
//! - The lazily evaluated indicator graph and its combinators
//! - Moving averages, VWAP, WaveTrend and true range
//! - Keeping registered indicators evaluated as ticks are committed

pub mod ring;
pub mod indicator;
pub mod average;
pub mod oscillator;
pub mod engine;

#[cfg(test)]
mod testing;

pub use engine::{Failure, IndicatorEngine, Recomputed, Warm};
pub use indicator::{Calculate, Indicator, Value};
pub use oscillator::{
    average_true_range, bucket_volume, true_range, typical_price, volume, vwap, vwap_of, wave_trend,
};
pub use ring::{CircularBuffer, RollingSum};
