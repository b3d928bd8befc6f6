//! Amount-range histograms, per month and overall.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use derive_more::Constructor;

use super::month::MonthKey;

/// Half-open amount interval `[min, max)`; `max: None` is unbounded.
///
/// Callers supply ranges pre-sorted and non-overlapping; that is not
/// validated here, and an overlapping record lands in the first range
/// that contains it.
#[derive(Clone, Debug, PartialEq, Constructor)]
pub struct AmountRange {
    pub min: f64,
    pub max: Option<f64>,
    pub label: String,
}

impl AmountRange {
    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.min && self.max.is_none_or(|max| amount < max)
    }
}

/// The dashboard's standard BTC buckets.
pub fn btc_ranges() -> Vec<AmountRange> {
    vec![
        AmountRange::new(0.0, Some(0.05), "0 - 0.05".to_string()),
        AmountRange::new(0.05, Some(0.15), "0.05 - 0.15".to_string()),
        AmountRange::new(0.15, Some(1.0), "0.15 - 1".to_string()),
        AmountRange::new(1.0, Some(10.0), "1 - 10".to_string()),
        AmountRange::new(10.0, None, "10+".to_string()),
    ]
}

/// Accumulated statistics for one amount range.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeStats {
    pub range: String,
    pub transaction_count: usize,
    pub total_volume: f64,
    /// `total_volume / transaction_count`, or 0.0 for an empty range -
    /// never NaN.
    pub average_tx_size: f64,
    /// Distinct `address_fn` values, case-sensitive exact match.
    pub unique_addresses: usize,
}

/// Partition `records` across `ranges` by `amount_fn`, accumulating
/// count, volume, average size and distinct addresses per range.
pub fn bucket_by_range<T>(
    records: &[T],
    ranges: &[AmountRange],
    amount_fn: impl Fn(&T) -> f64,
    address_fn: impl for<'a> Fn(&'a T) -> &'a str,
) -> Vec<RangeStats> {
    let mut counts = vec![0usize; ranges.len()];
    let mut volumes = vec![0.0f64; ranges.len()];
    let mut addresses: Vec<HashSet<&str>> = vec![HashSet::new(); ranges.len()];

    for record in records {
        let amount = amount_fn(record);
        let Some(slot) = ranges.iter().position(|range| range.contains(amount)) else {
            continue;
        };
        counts[slot] += 1;
        volumes[slot] += amount;
        addresses[slot].insert(address_fn(record));
    }

    ranges
        .iter()
        .enumerate()
        .map(|(slot, range)| RangeStats {
            range: range.label.clone(),
            transaction_count: counts[slot],
            total_volume: volumes[slot],
            average_tx_size: if counts[slot] > 0 {
                volumes[slot] / counts[slot] as f64
            } else {
                0.0
            },
            unique_addresses: addresses[slot].len(),
        })
        .collect()
}

/// Range statistics for one calendar month.
#[derive(Clone, Debug, PartialEq)]
pub struct MonthlyRangeStats {
    pub month: MonthKey,
    pub stats: Vec<RangeStats>,
}

/// Group records by calendar month, then compute range stats inside
/// each month. Months come out ascending; only months that saw at
/// least one record appear.
pub fn monthly_range_stats<T>(
    records: &[T],
    ranges: &[AmountRange],
    time_fn: impl Fn(&T) -> DateTime<Utc>,
    amount_fn: impl Fn(&T) -> f64,
    address_fn: impl for<'a> Fn(&'a T) -> &'a str,
) -> Vec<MonthlyRangeStats> {
    let mut by_month: BTreeMap<MonthKey, Vec<&T>> = BTreeMap::new();
    for record in records {
        by_month
            .entry(MonthKey::from_datetime(&time_fn(record)))
            .or_default()
            .push(record);
    }

    by_month
        .into_iter()
        .map(|(month, month_records)| MonthlyRangeStats {
            month,
            stats: bucket_by_range(
                &month_records,
                ranges,
                |record| amount_fn(record),
                |record| address_fn(record),
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Swap {
        time: DateTime<Utc>,
        amount: f64,
        address: &'static str,
    }

    fn swap(time: &str, amount: f64, address: &'static str) -> Swap {
        Swap {
            time: time.parse().unwrap(),
            amount,
            address,
        }
    }

    fn stats_for(swaps: &[Swap]) -> Vec<RangeStats> {
        bucket_by_range(swaps, &btc_ranges(), |s| s.amount, |s| s.address)
    }

    #[test]
    fn test_bucket_by_range_partitions_all_records() {
        let swaps = vec![
            swap("2024-10-01T00:00:00Z", 0.01, "addr-a"),
            swap("2024-10-02T00:00:00Z", 0.049999, "addr-a"),
            swap("2024-10-03T00:00:00Z", 0.05, "addr-b"),
            swap("2024-10-04T00:00:00Z", 0.8, "addr-c"),
            swap("2024-10-05T00:00:00Z", 4.2, "addr-d"),
            swap("2024-10-06T00:00:00Z", 10.0, "addr-e"),
            swap("2024-10-07T00:00:00Z", 250.0, "addr-e"),
        ];

        let stats = stats_for(&swaps);

        let counts: Vec<usize> = stats.iter().map(|s| s.transaction_count).collect();
        assert_eq!(counts, vec![2, 1, 1, 1, 2]);

        // Conservation of count and volume across the partition
        let count_total: usize = stats.iter().map(|s| s.transaction_count).sum();
        assert_eq!(count_total, swaps.len());
        let volume_total: f64 = stats.iter().map(|s| s.total_volume).sum();
        let input_total: f64 = swaps.iter().map(|s| s.amount).sum();
        assert!((volume_total - input_total).abs() < 1e-9);
    }

    #[test]
    fn test_boundaries_are_half_open() {
        let swaps = vec![
            swap("2024-10-01T00:00:00Z", 0.05, "a"),
            swap("2024-10-01T00:00:00Z", 0.15, "a"),
            swap("2024-10-01T00:00:00Z", 1.0, "a"),
            swap("2024-10-01T00:00:00Z", 10.0, "a"),
        ];

        let stats = stats_for(&swaps);

        // Each boundary amount belongs to the range it opens, not the
        // one it closes
        assert_eq!(stats[0].transaction_count, 0);
        assert_eq!(stats[1].transaction_count, 1); // 0.05
        assert_eq!(stats[2].transaction_count, 1); // 0.15
        assert_eq!(stats[3].transaction_count, 1); // 1.0
        assert_eq!(stats[4].transaction_count, 1); // 10.0
    }

    #[test]
    fn test_empty_range_average_is_zero() {
        let stats = stats_for(&[]);
        for stat in &stats {
            assert_eq!(stat.transaction_count, 0);
            assert_eq!(stat.average_tx_size, 0.0);
            assert!(!stat.average_tx_size.is_nan());
        }
    }

    #[test]
    fn test_unique_addresses_are_case_sensitive() {
        let swaps = vec![
            swap("2024-10-01T00:00:00Z", 1.0, "bc1qAbc"),
            swap("2024-10-02T00:00:00Z", 2.0, "bc1qabc"),
            swap("2024-10-03T00:00:00Z", 3.0, "bc1qAbc"),
        ];

        let stats = stats_for(&swaps);
        assert_eq!(stats[3].transaction_count, 3);
        assert_eq!(stats[3].unique_addresses, 2);
        assert_eq!(stats[3].average_tx_size, 2.0);
    }

    #[test]
    fn test_monthly_range_stats_groups_ascending() {
        let swaps = vec![
            swap("2024-11-05T00:00:00Z", 0.2, "a"),
            swap("2024-10-05T00:00:00Z", 0.01, "b"),
            swap("2024-11-20T00:00:00Z", 12.0, "c"),
        ];

        let monthly =
            monthly_range_stats(&swaps, &btc_ranges(), |s| s.time, |s| s.amount, |s| s.address);

        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].month, MonthKey::new(2024, 10));
        assert_eq!(monthly[1].month, MonthKey::new(2024, 11));
        assert_eq!(monthly[0].stats[0].transaction_count, 1);
        assert_eq!(monthly[1].stats[2].transaction_count, 1);
        assert_eq!(monthly[1].stats[4].transaction_count, 1);
    }
}
