//! Ticker fixtures shared by the unit tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use tickflow_core::{Num, Tick, Ticker, TimeSpan};

pub(crate) fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
}

fn slot(span: TimeSpan, index: usize) -> (DateTime<Utc>, DateTime<Utc>) {
    let length = span.seconds();
    let start = index as i64 * length;
    (at(start), at(start + length))
}

/// 5s ticker of flat, zero-volume ticks.
pub(crate) fn ticker(prices: &[i64]) -> Arc<Ticker> {
    ticker_of(TimeSpan::Second5, prices)
}

/// Ticker of `span` with flat, zero-volume ticks.
pub(crate) fn ticker_of(span: TimeSpan, prices: &[i64]) -> Arc<Ticker> {
    let ticker = Arc::new(Ticker::new(span));
    for (index, price) in prices.iter().enumerate() {
        let (start, end) = slot(span, index);
        ticker.append(Tick::flat(start, end, Num::of(*price))).unwrap();
    }
    ticker
}

/// 5s ticker of flat ticks with the given `(price, buy volume)`.
pub(crate) fn ticker_with_volume(ticks: &[(i64, i64)]) -> Arc<Ticker> {
    let ticker = Arc::new(Ticker::new(TimeSpan::Second5));
    for (index, (price, volume)) in ticks.iter().enumerate() {
        let (start, end) = slot(TimeSpan::Second5, index);
        let mut tick = Tick::flat(start, end, Num::of(*price));
        tick.buy_volume = Num::of(*volume);
        ticker.append(tick).unwrap();
    }
    ticker
}

/// Ticker of `span` with `(open, high, low, close)` ticks.
pub(crate) fn ticks(span: TimeSpan, bars: &[(i64, i64, i64, i64)]) -> Arc<Ticker> {
    let ticker = Arc::new(Ticker::new(span));
    for (index, (open, high, low, close)) in bars.iter().enumerate() {
        let (start, end) = slot(span, index);
        let mut tick = Tick::flat(start, end, Num::of(*open));
        tick.high = Num::of(*high);
        tick.low = Num::of(*low);
        tick.close = Num::of(*close);
        ticker.append(tick).unwrap();
    }
    ticker
}
