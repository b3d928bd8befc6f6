//! Calendar-month bucketing and the month-over-month time series.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use derive_more::Display;

/// Ordered calendar-month key, displayed as `YYYY-MM`.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display("{year:04}-{month:02}")]
pub struct MonthKey {
    pub year: i32,
    /// 1-based month, 1..=12.
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        debug_assert!((1..=12).contains(&month));
        Self { year, month }
    }

    pub fn from_datetime(time: &DateTime<Utc>) -> Self {
        Self {
            year: time.year(),
            month: time.month(),
        }
    }

    /// The following calendar month.
    pub fn succ(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The preceding calendar month.
    pub fn pred(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

/// Accumulate `value_fn` per calendar month of `key_fn`.
///
/// Each record contributes exactly once; buckets are created lazily.
pub fn bucket_by_month<T>(
    records: &[T],
    key_fn: impl Fn(&T) -> DateTime<Utc>,
    value_fn: impl Fn(&T) -> f64,
) -> BTreeMap<MonthKey, f64> {
    let mut buckets = BTreeMap::new();
    for record in records {
        let month = MonthKey::from_datetime(&key_fn(record));
        *buckets.entry(month).or_insert(0.0) += value_fn(record);
    }
    buckets
}

/// Every month from `start` to `end` inclusive; empty when start > end.
pub fn month_range(start: MonthKey, end: MonthKey) -> Vec<MonthKey> {
    let mut months = Vec::new();
    let mut current = start;
    while current <= end {
        months.push(current);
        current = current.succ();
    }
    months
}

/// Gap-free series over `[start, end]`; months with no bucket are 0.0.
///
/// Required before computing month-over-month change, which pairs each
/// month with its immediate predecessor.
pub fn filled_series(
    buckets: &BTreeMap<MonthKey, f64>,
    start: MonthKey,
    end: MonthKey,
) -> Vec<(MonthKey, f64)> {
    month_range(start, end)
        .into_iter()
        .map(|month| (month, buckets.get(&month).copied().unwrap_or(0.0)))
        .collect()
}

/// Percentage change from `previous` to `current`.
///
/// `None` when `previous` is zero: the change is undefined there, not
/// infinite.
pub fn percent_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 {
        None
    } else {
        Some((current - previous) / previous * 100.0)
    }
}

/// One row of the monthly time series.
#[derive(Clone, Debug, PartialEq)]
pub struct MonthlyChange {
    pub month: MonthKey,
    pub value: f64,
    /// Change vs the previous month; `None` for the first row and for
    /// zero-valued predecessors.
    pub change: Option<f64>,
}

/// Pair every month of a gap-free series with its change vs the
/// previous month.
pub fn monthly_changes(series: &[(MonthKey, f64)]) -> Vec<MonthlyChange> {
    series
        .iter()
        .enumerate()
        .map(|(index, &(month, value))| MonthlyChange {
            month,
            value,
            change: if index == 0 {
                None
            } else {
                percent_change(series[index - 1].1, value)
            },
        })
        .collect()
}

/// The October-1st anchor the quarterly and search views report from:
/// Oct 1 of the current year once October has started, otherwise Oct 1
/// of the previous year.
pub fn october_start(today: DateTime<Utc>) -> DateTime<Utc> {
    let year = if today.month() < 10 {
        today.year() - 1
    } else {
        today.year()
    };
    Utc.with_ymd_and_hms(year, 10, 1, 0, 0, 0)
        .single()
        .unwrap_or(today)
}

/// The `count` most recent calendar months ending with today's,
/// ascending.
pub fn last_months(today: DateTime<Utc>, count: usize) -> Vec<MonthKey> {
    let mut months = Vec::with_capacity(count);
    let mut current = MonthKey::from_datetime(&today);
    for _ in 0..count {
        months.push(current);
        current = current.pred();
    }
    months.reverse();
    months
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(input: &str) -> DateTime<Utc> {
        input.parse().unwrap()
    }

    #[test]
    fn test_month_key_display_and_order() {
        assert_eq!(MonthKey::new(2024, 10).to_string(), "2024-10");
        assert_eq!(MonthKey::new(2025, 1).to_string(), "2025-01");
        assert!(MonthKey::new(2024, 12) < MonthKey::new(2025, 1));
        assert_eq!(MonthKey::new(2024, 12).succ(), MonthKey::new(2025, 1));
        assert_eq!(MonthKey::new(2025, 1).pred(), MonthKey::new(2024, 12));
    }

    #[test]
    fn test_bucket_by_month_conserves_total() {
        let records = vec![
            (ts("2024-10-05T10:00:00Z"), 1.5),
            (ts("2024-10-29T23:59:59Z"), 0.5),
            (ts("2024-11-01T00:00:00Z"), 2.0),
            (ts("2025-01-15T12:00:00Z"), 4.0),
        ];

        let buckets = bucket_by_month(&records, |r| r.0, |r| r.1);

        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[&MonthKey::new(2024, 10)], 2.0);
        assert_eq!(buckets[&MonthKey::new(2024, 11)], 2.0);
        assert_eq!(buckets[&MonthKey::new(2025, 1)], 4.0);

        let input_total: f64 = records.iter().map(|r| r.1).sum();
        let bucket_total: f64 = buckets.values().sum();
        assert_eq!(bucket_total, input_total);
    }

    #[test]
    fn test_month_range() {
        // Single month in, single month out
        assert_eq!(
            month_range(MonthKey::new(2024, 10), MonthKey::new(2024, 10)),
            vec![MonthKey::new(2024, 10)]
        );

        // Year boundary
        assert_eq!(
            month_range(MonthKey::new(2024, 11), MonthKey::new(2025, 2)),
            vec![
                MonthKey::new(2024, 11),
                MonthKey::new(2024, 12),
                MonthKey::new(2025, 1),
                MonthKey::new(2025, 2),
            ]
        );

        // start > end yields nothing
        assert!(month_range(MonthKey::new(2025, 1), MonthKey::new(2024, 12)).is_empty());
    }

    #[test]
    fn test_filled_series_has_no_gaps() {
        let records = vec![
            (ts("2024-10-05T10:00:00Z"), 3.0),
            (ts("2024-12-05T10:00:00Z"), 1.0),
        ];
        let buckets = bucket_by_month(&records, |r| r.0, |r| r.1);

        let series = filled_series(&buckets, MonthKey::new(2024, 10), MonthKey::new(2025, 1));
        assert_eq!(
            series,
            vec![
                (MonthKey::new(2024, 10), 3.0),
                (MonthKey::new(2024, 11), 0.0),
                (MonthKey::new(2024, 12), 1.0),
                (MonthKey::new(2025, 1), 0.0),
            ]
        );
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(0.0, 123.0), None);
        assert_eq!(percent_change(100.0, 150.0), Some(50.0));
        assert_eq!(percent_change(100.0, 50.0), Some(-50.0));
        assert_eq!(percent_change(100.0, 100.0), Some(0.0));
    }

    #[test]
    fn test_monthly_changes() {
        let series = vec![
            (MonthKey::new(2024, 10), 2.0),
            (MonthKey::new(2024, 11), 3.0),
            (MonthKey::new(2024, 12), 0.0),
            (MonthKey::new(2025, 1), 5.0),
        ];

        let changes = monthly_changes(&series);

        assert_eq!(changes[0].change, None);
        assert_eq!(changes[1].change, Some(50.0));
        assert_eq!(changes[2].change, Some(-100.0));
        // Predecessor was zero: undefined, not infinite
        assert_eq!(changes[3].change, None);
    }

    #[test]
    fn test_october_start() {
        assert_eq!(
            october_start(ts("2024-11-20T08:00:00Z")),
            ts("2024-10-01T00:00:00Z")
        );
        assert_eq!(
            october_start(ts("2024-10-01T00:00:00Z")),
            ts("2024-10-01T00:00:00Z")
        );
        assert_eq!(
            october_start(ts("2025-03-14T12:00:00Z")),
            ts("2024-10-01T00:00:00Z")
        );
    }

    #[test]
    fn test_last_months() {
        assert_eq!(
            last_months(ts("2025-01-10T00:00:00Z"), 3),
            vec![
                MonthKey::new(2024, 11),
                MonthKey::new(2024, 12),
                MonthKey::new(2025, 1),
            ]
        );
    }

    #[test]
    fn test_bucket_by_month_is_idempotent() {
        let records = vec![
            (ts("2024-10-05T10:00:00Z"), 1.25),
            (ts("2024-11-07T10:00:00Z"), 0.75),
        ];

        let first = bucket_by_month(&records, |r| r.0, |r| r.1);
        let second = bucket_by_month(&records, |r| r.0, |r| r.1);
        assert_eq!(first, second);
    }
}
