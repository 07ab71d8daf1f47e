//! Multi-resolution ticker management.

use crate::tick_builder::TickBuilder;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tickflow_core::config::TickerConfig;
use tickflow_core::{Error, Execution, Num, Result, Ticker, TimeSpan};

/// A tick committed to one of the managed tickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Committed {
    pub span: TimeSpan,
    pub index: usize,
}

/// Feeds every execution to one builder per span.
pub struct TickerManager {
    /// Builders, smallest span first.
    builders: Vec<TickBuilder>,
    /// First execution ever seen.
    initial: Option<Execution>,
    /// Latest execution seen.
    latest: Option<Execution>,
}

impl TickerManager {
    /// Create a manager for the given spans.
    pub fn new(spans: &[TimeSpan]) -> Self {
        let mut spans = spans.to_vec();
        spans.sort();
        spans.dedup();
        Self {
            builders: spans.into_iter().map(TickBuilder::new).collect(),
            initial: None,
            latest: None,
        }
    }

    /// Create a manager from configuration.
    pub fn from_config(config: &TickerConfig) -> Self {
        Self::new(&config.spans)
    }

    /// Managed spans, smallest first.
    pub fn spans(&self) -> impl Iterator<Item = TimeSpan> + '_ {
        self.builders.iter().map(TickBuilder::span)
    }

    /// The shared ticker of `span`.
    pub fn ticker(&self, span: TimeSpan) -> Result<Arc<Ticker>> {
        self.builders
            .iter()
            .find(|builder| builder.span() == span)
            .map(|builder| Arc::clone(builder.ticker()))
            .ok_or_else(|| Error::config(format!("span {span} is not managed")))
    }

    /// Bucket an execution into every span.
    ///
    /// The execution is validated against every builder before any of them
    /// is touched, so a stale execution leaves all tickers unchanged.
    pub fn update(&mut self, execution: &Execution) -> Result<Vec<Committed>> {
        for builder in &self.builders {
            builder.check(execution)?;
        }

        let mut committed = Vec::new();
        for builder in &mut self.builders {
            let span = builder.span();
            for index in builder.add_execution(execution)? {
                committed.push(Committed { span, index });
            }
        }

        if self.initial.is_none() {
            self.initial = Some(execution.clone());
        }
        self.latest = Some(execution.clone());
        Ok(committed)
    }

    /// Close every slot that ended at or before `now`.
    pub fn flush_before(&mut self, now: DateTime<Utc>) -> Result<Vec<Committed>> {
        let mut committed = Vec::new();
        for builder in &mut self.builders {
            if let Some(index) = builder.flush_before(now)? {
                committed.push(Committed {
                    span: builder.span(),
                    index,
                });
            }
        }
        Ok(committed)
    }

    pub fn initial_execution(&self) -> Option<&Execution> {
        self.initial.as_ref()
    }

    pub fn latest_execution(&self) -> Option<&Execution> {
        self.latest.as_ref()
    }

    /// Price of the latest execution.
    pub fn latest_price(&self) -> Option<Num> {
        self.latest.as_ref().map(|e| e.price)
    }
}

impl Default for TickerManager {
    fn default() -> Self {
        Self::from_config(&TickerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tickflow_core::Side;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn exec(id: i64, secs: i64, price: i64) -> Execution {
        Execution::new(id, at(secs), Side::Buy, Num::of(price), Num::ONE)
    }

    #[test]
    fn test_spans_sorted_and_deduplicated() {
        let manager = TickerManager::new(&[TimeSpan::Minute1, TimeSpan::Second5, TimeSpan::Minute1]);
        let spans: Vec<_> = manager.spans().collect();
        assert_eq!(spans, vec![TimeSpan::Second5, TimeSpan::Minute1]);
        assert!(manager.ticker(TimeSpan::Hour1).is_err());
    }

    #[test]
    fn test_update_feeds_every_span() {
        let mut manager = TickerManager::new(&[TimeSpan::Second5, TimeSpan::Second15]);

        for (id, secs) in [0, 4, 6, 12, 16].into_iter().enumerate() {
            manager.update(&exec(id as i64, secs, 100 + secs)).unwrap();
        }

        let small = manager.ticker(TimeSpan::Second5).unwrap();
        let large = manager.ticker(TimeSpan::Second15).unwrap();
        // slots 0, 5, 10 closed on the 5s ticker, slot 0 on the 15s ticker
        assert_eq!(small.size(), 3);
        assert_eq!(large.size(), 1);
        assert_eq!(large.get(0).unwrap().high, Num::of(112));
        assert_eq!(large.get(0).unwrap().trades, 4);
        assert_eq!(manager.latest_price(), Some(Num::of(116)));
        assert_eq!(manager.initial_execution().unwrap().id, 0);
    }

    #[test]
    fn test_committed_order() {
        let mut manager = TickerManager::new(&[TimeSpan::Second5, TimeSpan::Second15]);
        manager.update(&exec(1, 1, 100)).unwrap();
        let committed = manager.update(&exec(2, 16, 100)).unwrap();

        assert_eq!(
            committed,
            vec![
                Committed { span: TimeSpan::Second5, index: 0 },
                Committed { span: TimeSpan::Second5, index: 1 },
                Committed { span: TimeSpan::Second5, index: 2 },
                Committed { span: TimeSpan::Second15, index: 0 },
            ]
        );
    }

    #[test]
    fn test_stale_execution_leaves_tickers_unchanged() {
        let mut manager = TickerManager::new(&[TimeSpan::Second5, TimeSpan::Second15]);
        manager.update(&exec(1, 7, 100)).unwrap();
        assert!(manager.update(&exec(2, 2, 100)).is_err());
        assert_eq!(manager.latest_execution().unwrap().id, 1);

        let committed = manager.flush_before(at(15)).unwrap();
        assert_eq!(committed.len(), 2);
        assert_eq!(manager.ticker(TimeSpan::Second5).unwrap().get(0).unwrap().trades, 1);
    }
}
