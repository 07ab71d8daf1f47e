//! Fixed tick resolutions.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resolution of a [`Ticker`](crate::Ticker).
///
/// Slots are aligned to the Unix epoch, so every slot of a larger span is
/// made of whole slots of the smaller spans that divide it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeSpan {
    Second5,
    Second15,
    Second30,
    Minute1,
    Minute3,
    Minute5,
    Minute10,
    Minute15,
    Minute30,
    Hour1,
    Hour2,
    Hour4,
    Hour6,
    Hour12,
    Day1,
    Day2,
    Day3,
    Day7,
}

impl TimeSpan {
    /// Every span, smallest first.
    pub const ALL: [TimeSpan; 18] = [
        TimeSpan::Second5,
        TimeSpan::Second15,
        TimeSpan::Second30,
        TimeSpan::Minute1,
        TimeSpan::Minute3,
        TimeSpan::Minute5,
        TimeSpan::Minute10,
        TimeSpan::Minute15,
        TimeSpan::Minute30,
        TimeSpan::Hour1,
        TimeSpan::Hour2,
        TimeSpan::Hour4,
        TimeSpan::Hour6,
        TimeSpan::Hour12,
        TimeSpan::Day1,
        TimeSpan::Day2,
        TimeSpan::Day3,
        TimeSpan::Day7,
    ];

    /// Length of one slot in seconds.
    pub const fn seconds(self) -> i64 {
        match self {
            TimeSpan::Second5 => 5,
            TimeSpan::Second15 => 15,
            TimeSpan::Second30 => 30,
            TimeSpan::Minute1 => 60,
            TimeSpan::Minute3 => 3 * 60,
            TimeSpan::Minute5 => 5 * 60,
            TimeSpan::Minute10 => 10 * 60,
            TimeSpan::Minute15 => 15 * 60,
            TimeSpan::Minute30 => 30 * 60,
            TimeSpan::Hour1 => 3600,
            TimeSpan::Hour2 => 2 * 3600,
            TimeSpan::Hour4 => 4 * 3600,
            TimeSpan::Hour6 => 6 * 3600,
            TimeSpan::Hour12 => 12 * 3600,
            TimeSpan::Day1 => 86_400,
            TimeSpan::Day2 => 2 * 86_400,
            TimeSpan::Day3 => 3 * 86_400,
            TimeSpan::Day7 => 7 * 86_400,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::seconds(self.seconds())
    }

    /// Start of the slot containing `time`.
    pub fn start_of(self, time: DateTime<Utc>) -> DateTime<Utc> {
        let secs = time.timestamp();
        let start = secs - secs.rem_euclid(self.seconds());
        Utc.timestamp_opt(start, 0).single().unwrap_or(time)
    }

    /// Start of the slot following the one containing `time`.
    pub fn next_start_of(self, time: DateTime<Utc>) -> DateTime<Utc> {
        self.start_of(time) + self.duration()
    }

    /// Number of slots per day, 1 for spans of a day or longer.
    pub fn ticks_per_day(self) -> usize {
        (86_400 / self.seconds()).max(1) as usize
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.seconds();
        if secs % 86_400 == 0 {
            write!(f, "{}d", secs / 86_400)
        } else if secs % 3600 == 0 {
            write!(f, "{}h", secs / 3600)
        } else if secs % 60 == 0 {
            write!(f, "{}m", secs / 60)
        } else {
            write!(f, "{secs}s")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_of() {
        let time = Utc.with_ymd_and_hms(2024, 1, 1, 10, 7, 42).unwrap();
        assert_eq!(
            TimeSpan::Minute5.start_of(time),
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 5, 0).unwrap()
        );
        assert_eq!(
            TimeSpan::Second15.start_of(time),
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 7, 30).unwrap()
        );
        assert_eq!(
            TimeSpan::Hour4.next_start_of(time),
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_spans_are_ordered() {
        for pair in TimeSpan::ALL.windows(2) {
            assert!(pair[0].seconds() < pair[1].seconds());
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(TimeSpan::Second5.to_string(), "5s");
        assert_eq!(TimeSpan::Minute15.to_string(), "15m");
        assert_eq!(TimeSpan::Hour4.to_string(), "4h");
        assert_eq!(TimeSpan::Day7.to_string(), "7d");
    }

    #[test]
    fn test_intermediate_spans() {
        assert_eq!(TimeSpan::ALL.len(), 18);
        assert_eq!(TimeSpan::Minute10.to_string(), "10m");
        assert_eq!(TimeSpan::Hour6.to_string(), "6h");
        assert_eq!(TimeSpan::Day3.to_string(), "3d");

        let time = Utc.with_ymd_and_hms(2024, 1, 1, 10, 27, 0).unwrap();
        assert_eq!(
            TimeSpan::Minute10.start_of(time),
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 20, 0).unwrap()
        );
        assert_eq!(
            TimeSpan::Hour6.start_of(time),
            Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap()
        );
        // 2024-01-01 is epoch day 19723, so the two-day slot began the day before
        assert_eq!(
            TimeSpan::Day2.start_of(time),
            Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap()
        );
        assert_eq!(TimeSpan::Hour2.ticks_per_day(), 12);
    }

    #[test]
    fn test_ticks_per_day() {
        assert_eq!(TimeSpan::Minute1.ticks_per_day(), 1440);
        assert_eq!(TimeSpan::Day7.ticks_per_day(), 1);
    }
}
