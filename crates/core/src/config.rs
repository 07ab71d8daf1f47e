//! Configuration structures for the tickflow system.

use crate::error::Result;
use crate::span::TimeSpan;
use serde::{Deserialize, Serialize};

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ticker configuration.
    pub ticker: TickerConfig,
    /// Volume-weighted average price configuration.
    pub vwap: VwapConfig,
    /// WaveTrend oscillator configuration.
    pub wave_trend: WaveTrendConfig,
    /// Historical replay configuration.
    pub replay: ReplayConfig,
}

impl Config {
    /// Parse a JSON document. Missing sections fall back to their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Clamp every size to its safe minimum.
    pub fn sanitized(mut self) -> Self {
        if self.ticker.spans.is_empty() {
            self.ticker.spans = TimeSpan::ALL.to_vec();
        }
        self.ticker.spans.sort();
        self.ticker.spans.dedup();
        self.vwap.tick_size = self.vwap.tick_size.max(1);
        self.wave_trend.channel_length = self.wave_trend.channel_length.max(1);
        self.wave_trend.average_length = self.wave_trend.average_length.max(1);
        self.wave_trend.signal_length = self.wave_trend.signal_length.max(1);
        self
    }
}

/// Which resolutions to build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerConfig {
    /// Spans to maintain, smallest first.
    pub spans: Vec<TimeSpan>,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            spans: TimeSpan::ALL.to_vec(),
        }
    }
}

/// Volume-weighted average price configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VwapConfig {
    /// Trailing window in ticks (minimum 1).
    pub tick_size: usize,
}

impl Default for VwapConfig {
    fn default() -> Self {
        Self { tick_size: 1 }
    }
}

/// WaveTrend oscillator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveTrendConfig {
    /// EMA length of the channel (esa and deviation).
    pub channel_length: usize,
    /// EMA length of the fast line.
    pub average_length: usize,
    /// SMA length of the slow line.
    pub signal_length: usize,
}

impl Default for WaveTrendConfig {
    fn default() -> Self {
        Self {
            channel_length: 10,
            average_length: 21,
            signal_length: 4,
        }
    }
}

/// Historical replay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Evaluate registered indicators while replaying.
    pub recompute: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self { recompute: true }
    }
}
