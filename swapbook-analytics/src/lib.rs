/// Swapbook Analytics - Shared Library
///
/// Core library for the swapbook atomic-swap analytics terminal:
/// - Typed data model for matched orders and external swap feeds
/// - HTTP client for the swapbook backend API
/// - Pure aggregation layer (monthly buckets, range histograms,
///   tagged/untagged summaries) consumed by the TUI views
///
/// The aggregation functions are synchronous, stateless and free of
/// I/O: each one consumes an immutable snapshot of fetched records and
/// produces a deterministic result, so the views stay testable without
/// any network mocking.
pub mod aggregate;
pub mod client;
pub mod de;
pub mod error;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    AddressReport, BTC_DECIMALS, ChainflipSwap, Order, SwapLeg, TagSet, ThorchainSwap,
};

pub use client::{ApiClient, ApiConfig};
pub use error::ApiError;

pub use aggregate::{
    AmountRange, MonthKey, MonthlyBreakdown, MonthlyChange, MonthlyRangeStats, QuarterTotals,
    RangeStats, TagShare, TaggedSplit, bucket_by_month, bucket_by_range, percent_change,
    split_by_tag,
};
