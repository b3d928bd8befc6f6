//! Pure order-aggregation layer shared by all dashboard views.
//!
//! Every function here is a single-pass, stateless reduction over an
//! immutable snapshot of fetched records, parameterised by caller
//! closures for timestamp, amount and tagging policy. Re-running any
//! of them on the same snapshot yields identical output: ordered maps
//! and explicitly sorted results keep hash-order out of the picture.
//!
//! The aggregator validates nothing. Window filtering happens before
//! records get here, and malformed amounts have already been collapsed
//! to 0.0 by the extractors in [`crate::types`].

pub mod month;
pub mod range;
pub mod summary;

pub use month::{
    MonthKey, MonthlyChange, bucket_by_month, filled_series, last_months, month_range,
    monthly_changes, october_start, percent_change,
};
pub use range::{
    AmountRange, MonthlyRangeStats, RangeStats, btc_ranges, bucket_by_range, monthly_range_stats,
};
pub use summary::{
    AddressSummary, MonthlyBreakdown, QuarterTotals, TagShare, TaggedSplit, UNTAGGED_LABEL,
    address_report_summary, monthly_breakdown, quarter_totals, split_by_tag, tag_distribution,
    unique_tags,
};
