//! Append-only time series of closed ticks at one resolution.

use crate::error::{Error, Result};
use crate::span::TimeSpan;
use crate::types::Tick;
use chrono::{DateTime, Utc};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Time series container.
///
/// Index `i` denotes the same tick forever once assigned. Appends take the
/// write lock, so concurrent writers are serialized per ticker; readers only
/// ever see fully constructed ticks.
#[derive(Debug)]
pub struct Ticker {
    span: TimeSpan,
    ticks: RwLock<Vec<Tick>>,
}

impl Ticker {
    pub fn new(span: TimeSpan) -> Self {
        Self {
            span,
            ticks: RwLock::new(Vec::new()),
        }
    }

    /// The resolution of this ticker.
    #[inline]
    pub fn span(&self) -> TimeSpan {
        self.span
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Tick>>> {
        self.ticks.read().map_err(|_| Error::Poisoned("ticker"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Tick>>> {
        self.ticks.write().map_err(|_| Error::Poisoned("ticker"))
    }

    /// Append a closed tick and return its index.
    ///
    /// Fails with [`Error::OutOfOrder`] unless the tick's start strictly
    /// exceeds the last appended start.
    pub fn append(&self, tick: Tick) -> Result<usize> {
        let mut ticks = self.write()?;
        if let Some(last) = ticks.last() {
            if tick.start <= last.start {
                return Err(Error::OutOfOrder {
                    last: last.start,
                    next: tick.start,
                });
            }
        }
        debug!(span = %self.span, start = %tick.start, close = %tick.close, "tick appended");
        ticks.push(tick);
        Ok(ticks.len() - 1)
    }

    /// The tick at `index`.
    pub fn get(&self, index: usize) -> Result<Tick> {
        let ticks = self.read()?;
        ticks
            .get(index)
            .cloned()
            .ok_or_else(|| Error::out_of_range(index, ticks.len()))
    }

    /// Number of committed ticks.
    ///
    /// Ticks are pushed whole, so a poisoned lock still holds a consistent
    /// length; checked access goes through [`Ticker::check_index`].
    pub fn size(&self) -> usize {
        match self.ticks.read() {
            Ok(ticks) => ticks.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Index of the most recent tick, `None` while empty.
    pub fn latest_index(&self) -> Result<Option<usize>> {
        Ok(self.read()?.len().checked_sub(1))
    }

    /// Fail with [`Error::OutOfRange`] unless `index` is committed.
    pub fn check_index(&self, index: usize) -> Result<()> {
        let size = self.read()?.len();
        if index < size {
            Ok(())
        } else {
            Err(Error::out_of_range(index, size))
        }
    }

    pub fn first(&self) -> Result<Tick> {
        self.get(0)
    }

    pub fn last(&self) -> Result<Tick> {
        self.read()?
            .last()
            .cloned()
            .ok_or_else(|| Error::out_of_range(0, 0))
    }

    /// Index of the tick whose slot contains `time`.
    ///
    /// Times after the last committed slot fail with [`Error::OutOfRange`]
    /// since they refer to data that does not exist yet.
    pub fn index_of(&self, time: DateTime<Utc>) -> Result<usize> {
        let ticks = self.read()?;
        let size = ticks.len();
        let after = ticks.partition_point(|tick| tick.start <= time);
        match after.checked_sub(1) {
            None => Err(Error::data(format!(
                "{time} precedes the first {} tick",
                self.span
            ))),
            Some(index) if time >= ticks[index].end && index + 1 == size => {
                Err(Error::out_of_range(size, size))
            }
            Some(index) => Ok(index),
        }
    }

    /// Copy of the ticks in `[from, to]`.
    ///
    /// Fails with [`Error::OutOfRange`] when `to` is not committed yet. An
    /// inverted range is empty.
    pub fn range(&self, from: usize, to: usize) -> Result<Vec<Tick>> {
        let ticks = self.read()?;
        if to >= ticks.len() {
            return Err(Error::out_of_range(to, ticks.len()));
        }
        if from > to {
            return Ok(Vec::new());
        }
        Ok(ticks[from..=to].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::num::Num;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn tick(slot: i64, price: i64) -> Tick {
        Tick::flat(at(slot * 5), at(slot * 5 + 5), Num::of(price))
    }

    #[test]
    fn test_append_and_get() {
        let ticker = Ticker::new(TimeSpan::Second5);
        assert!(ticker.is_empty());
        assert_eq!(ticker.latest_index().unwrap(), None);

        assert_eq!(ticker.append(tick(0, 10)).unwrap(), 0);
        assert_eq!(ticker.append(tick(1, 11)).unwrap(), 1);

        assert_eq!(ticker.size(), 2);
        assert_eq!(ticker.latest_index().unwrap(), Some(1));
        assert_eq!(ticker.get(1).unwrap().close, Num::of(11));
        assert_eq!(ticker.first().unwrap().close, Num::TEN);
        assert_eq!(ticker.last().unwrap().close, Num::of(11));
    }

    #[test]
    fn test_out_of_order_rejected() {
        let ticker = Ticker::new(TimeSpan::Second5);
        ticker.append(tick(3, 10)).unwrap();
        assert!(matches!(ticker.append(tick(3, 11)), Err(Error::OutOfOrder { .. })));
        assert!(matches!(ticker.append(tick(2, 11)), Err(Error::OutOfOrder { .. })));
        assert_eq!(ticker.size(), 1);
    }

    #[test]
    fn test_get_out_of_range() {
        let ticker = Ticker::new(TimeSpan::Second5);
        ticker.append(tick(0, 10)).unwrap();
        assert!(matches!(
            ticker.get(1),
            Err(Error::OutOfRange { index: 1, size: 1 })
        ));
        assert!(ticker.check_index(0).is_ok());
        assert!(ticker.check_index(1).is_err());
        assert!(Ticker::new(TimeSpan::Second5).last().is_err());
    }

    #[test]
    fn test_append_only_stability() {
        let ticker = Ticker::new(TimeSpan::Second5);
        ticker.append(tick(0, 10)).unwrap();
        let before = ticker.get(0).unwrap();
        for slot in 1..10 {
            ticker.append(tick(slot, 10 + slot)).unwrap();
        }
        assert_eq!(ticker.get(0).unwrap(), before);
    }

    #[test]
    fn test_index_of() {
        let ticker = Ticker::new(TimeSpan::Second5);
        for slot in 0..3 {
            ticker.append(tick(slot, 10)).unwrap();
        }
        assert_eq!(ticker.index_of(at(0)).unwrap(), 0);
        assert_eq!(ticker.index_of(at(7)).unwrap(), 1);
        assert_eq!(ticker.index_of(at(14)).unwrap(), 2);
        assert!(matches!(ticker.index_of(at(15)), Err(Error::OutOfRange { .. })));
        assert!(matches!(ticker.index_of(at(-1)), Err(Error::Data(_))));
    }

    #[test]
    fn test_range() {
        let ticker = Ticker::new(TimeSpan::Second5);
        for slot in 0..4 {
            ticker.append(tick(slot, slot)).unwrap();
        }
        let ticks = ticker.range(2, 3).unwrap();
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].close, Num::TWO);
        assert!(ticker.range(3, 2).unwrap().is_empty());
    }

    #[test]
    fn test_range_past_end_fails() {
        let ticker = Ticker::new(TimeSpan::Second5);
        for slot in 0..3 {
            ticker.append(tick(slot, slot)).unwrap();
        }
        assert!(matches!(
            ticker.range(1, 10),
            Err(Error::OutOfRange { index: 10, size: 3 })
        ));
        assert!(matches!(ticker.range(0, 3), Err(Error::OutOfRange { .. })));
        assert!(ticker.range(5, 9).is_err());
        assert!(Ticker::new(TimeSpan::Second5).range(0, 0).is_err());
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let ticker = Arc::new(Ticker::new(TimeSpan::Second5));
        ticker.append(tick(0, 10)).unwrap();

        let writer = Arc::clone(&ticker);
        let _ = std::thread::spawn(move || {
            let _guard = writer.ticks.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(matches!(ticker.check_index(0), Err(Error::Poisoned(_))));
        assert!(matches!(ticker.latest_index(), Err(Error::Poisoned(_))));
        assert!(matches!(ticker.last(), Err(Error::Poisoned(_))));
        assert!(matches!(ticker.range(0, 0), Err(Error::Poisoned(_))));
        assert_eq!(ticker.size(), 1);
    }

    #[test]
    fn test_concurrent_readers() {
        let ticker = Arc::new(Ticker::new(TimeSpan::Second5));
        ticker.append(tick(0, 10)).unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let ticker = Arc::clone(&ticker);
                std::thread::spawn(move || ticker.get(0).unwrap().close)
            })
            .collect();
        for slot in 1..50 {
            ticker.append(tick(slot, 10)).unwrap();
        }
        for reader in readers {
            assert_eq!(reader.join().unwrap(), Num::TEN);
        }
        assert_eq!(ticker.size(), 50);
    }
}
