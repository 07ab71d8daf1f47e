//! Core data types for the tickflow system.

use crate::num::Num;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggressor side of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Buyer-initiated.
    Buy,
    /// Seller-initiated.
    Sell,
}

impl Side {
    #[inline]
    pub fn is_buy(self) -> bool {
        self == Side::Buy
    }

    #[inline]
    pub fn is_sell(self) -> bool {
        self == Side::Sell
    }

    /// The opposite side.
    pub fn inverse(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// A single execution (print) delivered by an exchange connector or replayed
/// from the historical log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    /// Venue trade id.
    pub id: i64,
    /// Execution time.
    pub date: DateTime<Utc>,
    /// Aggressor side.
    pub side: Side,
    /// Execution price.
    pub price: Num,
    /// Execution size.
    pub size: Num,
}

impl Execution {
    pub fn new(id: i64, date: DateTime<Utc>, side: Side, price: Num, size: Num) -> Self {
        Self {
            id,
            date,
            side,
            price,
            size,
        }
    }

    /// Whether this execution happened strictly before `time`.
    #[inline]
    pub fn is_before(&self, time: DateTime<Utc>) -> bool {
        self.date < time
    }
}

/// Immutable market snapshot for one closed time slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    /// Slot start (inclusive).
    pub start: DateTime<Utc>,
    /// Slot end (exclusive).
    pub end: DateTime<Utc>,
    /// Open price.
    pub open: Num,
    /// High price.
    pub high: Num,
    /// Low price.
    pub low: Num,
    /// Close price.
    pub close: Num,
    /// Buyer-initiated volume.
    pub buy_volume: Num,
    /// Seller-initiated volume.
    pub sell_volume: Num,
    /// Sum of upward price moves caused by buys.
    pub buy_price_increase: Num,
    /// Sum of downward price moves caused by sells.
    pub sell_price_decrease: Num,
    /// Number of executions.
    pub trades: u32,
}

impl Tick {
    /// A flat, zero-volume tick at `price`, used to fill unobserved slots.
    pub fn flat(start: DateTime<Utc>, end: DateTime<Utc>, price: Num) -> Self {
        Self {
            start,
            end,
            open: price,
            high: price,
            low: price,
            close: price,
            buy_volume: Num::ZERO,
            sell_volume: Num::ZERO,
            buy_price_increase: Num::ZERO,
            sell_price_decrease: Num::ZERO,
            trades: 0,
        }
    }

    /// Total volume.
    #[inline]
    pub fn volume(&self) -> Num {
        self.buy_volume.plus(self.sell_volume)
    }

    /// (high + low + close) / 3.
    pub fn typical_price(&self) -> Num {
        // three is never zero
        let sum = self.high.plus(self.low).plus(self.close);
        sum.divide(Num::THREE).unwrap_or(sum)
    }

    /// (high + low) / 2.
    pub fn median_price(&self) -> Num {
        let sum = self.high.plus(self.low);
        sum.divide(Num::TWO).unwrap_or(sum)
    }

    /// high - low.
    #[inline]
    pub fn spread(&self) -> Num {
        self.high.minus(self.low)
    }

    /// Whether `time` falls inside this tick's slot.
    #[inline]
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start <= time && time < self.end
    }
}
