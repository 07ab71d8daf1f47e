//! Moving averages and windowed aggregates over numeric indicators.

use crate::indicator::Indicator;
use crate::ring::{CircularBuffer, RollingSum};
use tickflow_core::Num;

/// `numerator / denominator` for smoothing factors whose denominator is a
/// positive length.
fn ratio(numerator: Num, denominator: usize) -> Num {
    numerator
        .divide(Num::from(denominator.max(1)))
        .unwrap_or(numerator)
}

impl Indicator<Num> {
    /// Exponential moving average, smoothing factor `2 / (length + 1)`.
    ///
    /// Seeded with the raw input at index 0.
    pub fn ema(&self, length: usize) -> Indicator<Num> {
        let length = length.max(1);
        self.smooth(ratio(Num::TWO, length + 1))
            .named(format!("ema({}, {length})", self.name()))
    }

    /// Modified (Wilder) moving average, smoothing factor `1 / length`.
    pub fn mma(&self, length: usize) -> Indicator<Num> {
        let length = length.max(1);
        self.smooth(ratio(Num::ONE, length))
            .named(format!("mma({}, {length})", self.name()))
    }

    /// `prev + (current - prev) * k`, which equals `prev * (1 - k) + current * k`.
    fn smooth(&self, k: Num) -> Indicator<Num> {
        self.scan(None::<Num>, move |previous, current| {
            let value = match *previous {
                None => current,
                Some(prev) => prev.plus(current.minus(prev).multiply(k)),
            };
            *previous = Some(value);
            Ok(value)
        })
    }

    /// Sum over the trailing window `[max(0, i - length + 1), i]`.
    pub fn rolling_sum(&self, length: usize) -> Indicator<Num> {
        let length = length.max(1);
        self.scan(RollingSum::new(length), |window, value| Ok(window.push(value)))
            .named(format!("sum({}, {length})", self.name()))
    }

    /// Simple moving average over `[max(0, i - length + 1), i]`.
    ///
    /// Short histories average only the available values, so index 0 is
    /// always the raw input.
    pub fn sma(&self, length: usize) -> Indicator<Num> {
        let length = length.max(1);
        self.scan(RollingSum::new(length), |window, value| {
            let total = window.push(value);
            total.divide(Num::from(window.count()))
        })
        .named(format!("sma({}, {length})", self.name()))
    }

    /// Linearly weighted moving average over the same truncated window; the
    /// newest value weighs `n`, the oldest `1`.
    pub fn wma(&self, length: usize) -> Indicator<Num> {
        let length = length.max(1);
        self.scan(CircularBuffer::<Num>::new(length), |window, value| {
            window.add(value);
            let n = window.len();
            let weighted: Num = window
                .iter()
                .enumerate()
                .map(|(i, v)| v.multiply(Num::from(i + 1)))
                .sum();
            weighted.divide(Num::from(n * (n + 1) / 2))
        })
        .named(format!("wma({}, {length})", self.name()))
    }

    /// Absolute value.
    pub fn abs(&self) -> Indicator<Num> {
        self.map(Num::abs).named(format!("abs({})", self.name()))
    }

    /// Round every value to `dp` decimal places.
    pub fn scale(&self, dp: u32) -> Indicator<Num> {
        self.map(move |v| v.scale(dp))
    }
}
