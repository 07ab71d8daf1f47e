//! Concrete indicator compositions.

use crate::indicator::Indicator;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tickflow_core::config::{VwapConfig, WaveTrendConfig};
use tickflow_core::{Num, Result, Tick, Ticker};

/// Scale applied to the mean deviation of the WaveTrend channel.
const CHANNEL_FACTOR: Num = Num::from_decimal(dec!(0.015));

/// (high + low + close) / 3 of every tick.
pub fn typical_price(ticker: &Arc<Ticker>) -> Indicator<Num> {
    Indicator::build(Arc::clone(ticker), Tick::typical_price).named("typical price")
}

/// Traded volume of every tick.
pub fn volume(ticker: &Arc<Ticker>) -> Indicator<Num> {
    Indicator::build(Arc::clone(ticker), Tick::volume).named("volume")
}

/// Volume summed over buckets of the last `ticks` ticks.
pub fn bucket_volume(ticker: &Arc<Ticker>, ticks: usize) -> Indicator<Num> {
    volume(ticker).rolling_sum(ticks).named(format!("volume({ticks})"))
}

/// Volume-weighted average price over the trailing `tick_size` indices.
///
/// `Σ(price_i * volume_i) / Σ(volume_i)` over `[max(0, i - tick_size + 1), i]`.
/// Index 0 returns the raw price. Later indices whose window holds no volume
/// fail with [`Error::DivisionByZero`](tickflow_core::Error::DivisionByZero).
pub fn vwap(price: &Indicator<Num>, volume: &Indicator<Num>, tick_size: usize) -> Result<Indicator<Num>> {
    let tick_size = tick_size.max(1);
    let weighted = price.map_with(volume, |p, v| p.multiply(v))?.rolling_sum(tick_size);
    let total = volume.rolling_sum(tick_size);
    let raw = price.clone();

    let source = weighted.combine(&total)?;
    let node = move |index: usize| {
        if index == 0 {
            return raw.value_at(0);
        }
        let (weighted, total) = source.value_at(index)?;
        weighted.divide(total)
    };
    Ok(Indicator::new(Arc::clone(price.ticker()), node)
        .memoize()
        .named(format!("vwap({tick_size})")))
}

/// VWAP of a ticker's own typical price and volume.
pub fn vwap_of(ticker: &Arc<Ticker>, config: &VwapConfig) -> Result<Indicator<Num>> {
    vwap(&typical_price(ticker), &volume(ticker), config.tick_size)
}

/// WaveTrend oscillator as `(fast, slow)` lines.
///
/// `esa = ema(ap, channel)`, `d = ema(|ap - esa|, channel)`,
/// `ci = (ap - esa) / (0.015 * d)` (or `ap - esa` when `d` is zero),
/// `fast = ema(ci, average)`, `slow = sma(fast, signal)`.
pub fn wave_trend(ticker: &Arc<Ticker>, config: &WaveTrendConfig) -> Result<Indicator<(Num, Num)>> {
    let ap = typical_price(ticker);
    let esa = ap.ema(config.channel_length);
    let deviation = ap
        .map_with(&esa, |a, e| a.minus(e).abs())?
        .ema(config.channel_length);

    let channel = ap.try_map_with2(&esa, &deviation, |a, e, d| {
        let difference = a.minus(e);
        let denominator = CHANNEL_FACTOR.multiply(d);
        if denominator.is_zero() {
            Ok(difference)
        } else {
            difference.divide(denominator)
        }
    })?;

    let fast = channel.ema(config.average_length).named("wave trend fast");
    let slow = fast.sma(config.signal_length).named("wave trend slow");
    Ok(fast.combine(&slow)?.named("wave trend"))
}

/// Greatest of high - low, |high - previous close| and |previous close - low|.
pub fn true_range(ticker: &Arc<Ticker>) -> Indicator<Num> {
    let source = Arc::clone(ticker);
    let node = move |index: usize| -> Result<Num> {
        let tick = source.get(index)?;
        let high_low = tick.high.minus(tick.low).abs();
        if index == 0 {
            return Ok(high_low);
        }
        let previous = source.get(index - 1)?;
        let high_close = tick.high.minus(previous.close).abs();
        let close_low = previous.close.minus(tick.low).abs();
        Ok(high_low.max(high_close).max(close_low))
    };
    Indicator::new(Arc::clone(ticker), node).named("true range")
}

/// Wilder's average true range.
pub fn average_true_range(ticker: &Arc<Ticker>, length: usize) -> Indicator<Num> {
    true_range(ticker).mma(length).named(format!("atr({length})"))
}
