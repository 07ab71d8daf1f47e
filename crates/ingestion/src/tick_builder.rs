//! Tick building from executions.
//!
//! Buckets executions into fixed-resolution slots and appends each slot to
//! its ticker once the slot is closed.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tickflow_core::{Error, Execution, Num, Result, Tick, Ticker, TimeSpan};
use tracing::{debug, warn};

/// A slot that's currently being built.
#[derive(Debug, Clone)]
struct TickInProgress {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    open: Num,
    high: Num,
    low: Num,
    close: Num,
    buy_volume: Num,
    sell_volume: Num,
    buy_price_increase: Num,
    sell_price_decrease: Num,
    trades: u32,
}

impl TickInProgress {
    fn new(span: TimeSpan, start: DateTime<Utc>, open: Num) -> Self {
        Self {
            start,
            end: start + span.duration(),
            open,
            high: open,
            low: open,
            close: open,
            buy_volume: Num::ZERO,
            sell_volume: Num::ZERO,
            buy_price_increase: Num::ZERO,
            sell_price_decrease: Num::ZERO,
            trades: 0,
        }
    }

    fn add_execution(&mut self, execution: &Execution, previous_price: Num) {
        let price = execution.price;
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
        if execution.side.is_buy() {
            self.buy_volume = self.buy_volume.plus(execution.size);
            self.buy_price_increase = self.buy_price_increase.plus(price.minus(previous_price));
        } else {
            self.sell_volume = self.sell_volume.plus(execution.size);
            self.sell_price_decrease = self.sell_price_decrease.plus(previous_price.minus(price));
        }
        self.trades += 1;
    }

    fn to_tick(&self) -> Tick {
        Tick {
            start: self.start,
            end: self.end,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            buy_volume: self.buy_volume,
            sell_volume: self.sell_volume,
            buy_price_increase: self.buy_price_increase,
            sell_price_decrease: self.sell_price_decrease,
            trades: self.trades,
        }
    }
}

/// Builder for the ticks of one span.
pub struct TickBuilder {
    span: TimeSpan,
    /// Destination of closed ticks.
    ticker: Arc<Ticker>,
    /// Slot accumulating executions.
    current: Option<TickInProgress>,
    /// End of the last closed slot and its close price.
    closed: Option<(DateTime<Utc>, Num)>,
    /// Price of the latest execution seen.
    latest_price: Option<Num>,
}

impl TickBuilder {
    /// Create a builder appending to a fresh ticker.
    pub fn new(span: TimeSpan) -> Self {
        Self::with_ticker(Arc::new(Ticker::new(span)))
    }

    /// Create a builder appending to an existing (possibly shared) ticker.
    pub fn with_ticker(ticker: Arc<Ticker>) -> Self {
        let closed = ticker.last().ok().map(|tick| (tick.end, tick.close));
        Self {
            span: ticker.span(),
            ticker,
            current: None,
            closed,
            latest_price: None,
        }
    }

    #[inline]
    pub fn span(&self) -> TimeSpan {
        self.span
    }

    /// The ticker receiving closed ticks.
    pub fn ticker(&self) -> &Arc<Ticker> {
        &self.ticker
    }

    /// Fail with [`Error::StaleExecution`] if `execution` can no longer be
    /// bucketed by this builder.
    pub fn check(&self, execution: &Execution) -> Result<()> {
        let slot = match (&self.current, &self.closed) {
            (Some(current), _) => current.start,
            (None, Some((end, _))) => *end,
            (None, None) => return Ok(()),
        };
        if execution.is_before(slot) {
            Err(Error::StaleExecution {
                date: execution.date,
                slot,
            })
        } else {
            Ok(())
        }
    }

    /// Add an execution and return the indices of the ticks it closed.
    pub fn add_execution(&mut self, execution: &Execution) -> Result<Vec<usize>> {
        if let Err(e) = self.check(execution) {
            warn!(span = %self.span, id = execution.id, "stale execution rejected");
            return Err(e);
        }

        let slot = self.span.start_of(execution.date);
        let mut committed = Vec::new();

        let rolled = matches!(&self.current, Some(current) if current.start < slot);
        if rolled {
            if let Some(index) = self.close_current()? {
                committed.push(index);
            }
        }

        if self.current.is_none() {
            committed.extend(self.fill_gap(slot)?);
            self.current = Some(TickInProgress::new(self.span, slot, execution.price));
        }

        let previous = self.latest_price.unwrap_or(execution.price);
        if let Some(current) = self.current.as_mut() {
            current.add_execution(execution, previous);
        }
        self.latest_price = Some(execution.price);

        Ok(committed)
    }

    /// Close the open slot if `now` has passed its end.
    pub fn flush_before(&mut self, now: DateTime<Utc>) -> Result<Option<usize>> {
        match &self.current {
            Some(current) if current.end <= now => self.close_current(),
            _ => Ok(None),
        }
    }

    /// Close the open slot regardless of the time.
    pub fn force_close(&mut self) -> Result<Option<usize>> {
        self.close_current()
    }

    /// Whether a slot is being accumulated.
    pub fn has_pending(&self) -> bool {
        self.current.is_some()
    }

    /// Snapshot of the open slot, not yet part of the ticker.
    pub fn pending(&self) -> Option<Tick> {
        self.current.as_ref().map(TickInProgress::to_tick)
    }

    /// Price of the latest execution seen.
    pub fn latest_price(&self) -> Option<Num> {
        self.latest_price
    }

    fn close_current(&mut self) -> Result<Option<usize>> {
        let Some(current) = self.current.take() else {
            return Ok(None);
        };
        let index = self.ticker.append(current.to_tick())?;
        self.closed = Some((current.end, current.close));
        Ok(Some(index))
    }

    /// Append flat ticks for every unobserved slot before `slot`.
    fn fill_gap(&mut self, slot: DateTime<Utc>) -> Result<Vec<usize>> {
        let mut filled = Vec::new();
        let Some((mut next, price)) = self.closed else {
            return Ok(filled);
        };

        while next < slot {
            let end = next + self.span.duration();
            filled.push(self.ticker.append(Tick::flat(next, end, price))?);
            next = end;
        }
        if !filled.is_empty() {
            debug!(span = %self.span, count = filled.len(), "filled unobserved slots");
            self.closed = Some((next, price));
        }
        Ok(filled)
    }
}
