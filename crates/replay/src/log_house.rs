//! Day-keyed execution logs.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tickflow_core::{Error, Execution, Result};

/// Source of logged executions, one UTC day at a time.
pub trait LogHouse: Send + Sync {
    /// Whether executions are logged for `date`.
    fn has(&self, date: NaiveDate) -> bool;

    /// Executions of `date` in chronological order.
    fn read(&self, date: NaiveDate) -> Result<Vec<Execution>>;
}

/// Log house kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogHouse {
    days: BTreeMap<NaiveDate, Vec<Execution>>,
}

impl MemoryLogHouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group executions by the UTC day they happened on.
    pub fn from_executions(executions: impl IntoIterator<Item = Execution>) -> Self {
        let mut house = Self::new();
        for execution in executions {
            house.insert(execution);
        }
        house
    }

    /// Log one execution, keeping its day ordered by time.
    pub fn insert(&mut self, execution: Execution) {
        let day = self.days.entry(execution.date.date_naive()).or_default();
        // stable, so executions sharing a timestamp keep their arrival order
        let at = day.partition_point(|logged| logged.date <= execution.date);
        day.insert(at, execution);
    }

    /// Logged days, oldest first.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.days.keys().next().copied()
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.days.keys().next_back().copied()
    }
}

impl LogHouse for MemoryLogHouse {
    fn has(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    fn read(&self, date: NaiveDate) -> Result<Vec<Execution>> {
        self.days
            .get(&date)
            .cloned()
            .ok_or_else(|| Error::data(format!("no executions logged on {date}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use tickflow_core::{Num, Side};

    fn at(day: u32, hour: u32, secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, secs).unwrap()
    }

    fn exec(id: i64, date: DateTime<Utc>) -> Execution {
        Execution::new(id, date, Side::Sell, Num::of(100), Num::ONE)
    }

    #[test]
    fn test_grouped_by_day() {
        let house = MemoryLogHouse::from_executions([
            exec(1, at(1, 23, 59)),
            exec(2, at(2, 0, 1)),
            exec(3, at(2, 5, 0)),
        ]);

        let days: Vec<_> = house.days().collect();
        assert_eq!(days.len(), 2);
        assert_eq!(house.first_day(), Some(at(1, 0, 0).date_naive()));
        assert_eq!(house.last_day(), Some(at(2, 0, 0).date_naive()));
        assert_eq!(house.read(at(2, 0, 0).date_naive()).unwrap().len(), 2);
    }

    #[test]
    fn test_insert_keeps_time_order() {
        let mut house = MemoryLogHouse::new();
        house.insert(exec(1, at(1, 10, 0)));
        house.insert(exec(2, at(1, 9, 0)));
        house.insert(exec(3, at(1, 10, 0)));

        let ids: Vec<_> = house
            .read(at(1, 0, 0).date_naive())
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_missing_day() {
        let house = MemoryLogHouse::new();
        let day = at(3, 0, 0).date_naive();
        assert!(!house.has(day));
        assert!(matches!(house.read(day), Err(Error::Data(_))));
    }
}
