//! Tagged/untagged splits, the quarterly breakdown and the overview
//! tag distribution.

use std::collections::BTreeMap;

use itertools::Itertools;

use super::month::MonthKey;
use crate::types::Order;

/// Label the overview uses for volume carrying no operator tag.
pub const UNTAGGED_LABEL: &str = "untagged";

/// Contribution split between tagged and untagged records.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TaggedSplit {
    pub tagged: f64,
    pub untagged: f64,
}

impl TaggedSplit {
    pub fn total(&self) -> f64 {
        self.tagged + self.untagged
    }

    /// Tagged share of the combined total, in percent; 0.0 when the
    /// total is zero.
    pub fn tagged_share_pct(&self) -> f64 {
        let total = self.total();
        if total > 0.0 {
            self.tagged / total * 100.0
        } else {
            0.0
        }
    }
}

/// Sum `amount_fn` into a tagged/untagged split under the caller's
/// tagging policy.
pub fn split_by_tag<T>(
    records: &[T],
    is_tagged_fn: impl Fn(&T) -> bool,
    amount_fn: impl Fn(&T) -> f64,
) -> TaggedSplit {
    let mut split = TaggedSplit::default();
    for record in records {
        let amount = amount_fn(record);
        if is_tagged_fn(record) {
            split.tagged += amount;
        } else {
            split.untagged += amount;
        }
    }
    split
}

/// One month of the quarterly breakdown table.
///
/// BTC columns sum initiator-leg quantity; notional columns sum the
/// full-precision reference-currency value. Only display formatting
/// abbreviates notional to millions.
#[derive(Clone, Debug, PartialEq)]
pub struct MonthlyBreakdown {
    pub month: MonthKey,
    pub total_btc: f64,
    pub tagged_btc: f64,
    pub untagged_btc: f64,
    pub tagged_notional: f64,
    pub untagged_notional: f64,
}

impl MonthlyBreakdown {
    fn empty(month: MonthKey) -> Self {
        Self {
            month,
            total_btc: 0.0,
            tagged_btc: 0.0,
            untagged_btc: 0.0,
            tagged_notional: 0.0,
            untagged_notional: 0.0,
        }
    }

    pub fn tagged_share_pct(&self) -> f64 {
        TaggedSplit {
            tagged: self.tagged_notional,
            untagged: self.untagged_notional,
        }
        .tagged_share_pct()
    }
}

/// Per-month tagged/untagged breakdown over a caller-supplied month
/// list. Months with no orders come back as zero rows, so the output
/// always has one row per requested month, in the given order.
pub fn monthly_breakdown(orders: &[Order], months: &[MonthKey]) -> Vec<MonthlyBreakdown> {
    let mut by_month: BTreeMap<MonthKey, MonthlyBreakdown> = BTreeMap::new();

    for order in orders {
        let month = MonthKey::from_datetime(&order.created_at);
        let row = by_month
            .entry(month)
            .or_insert_with(|| MonthlyBreakdown::empty(month));

        let quantity = order.quantity_btc();
        let notional = order.notional();

        row.total_btc += quantity;
        if order.tags.is_tagged() {
            row.tagged_btc += quantity;
            row.tagged_notional += notional;
        } else {
            row.untagged_btc += quantity;
            row.untagged_notional += notional;
        }
    }

    months
        .iter()
        .map(|month| {
            by_month
                .get(month)
                .cloned()
                .unwrap_or_else(|| MonthlyBreakdown::empty(*month))
        })
        .collect()
}

/// Reduction over the breakdown rows shown in the quarterly summary
/// panel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct QuarterTotals {
    pub total_btc: f64,
    pub tagged_btc: f64,
    pub untagged_btc: f64,
    pub tagged_notional: f64,
    pub untagged_notional: f64,
}

impl QuarterTotals {
    pub fn tagged_share_pct(&self) -> f64 {
        TaggedSplit {
            tagged: self.tagged_notional,
            untagged: self.untagged_notional,
        }
        .tagged_share_pct()
    }
}

pub fn quarter_totals(rows: &[MonthlyBreakdown]) -> QuarterTotals {
    rows.iter().fold(QuarterTotals::default(), |mut acc, row| {
        acc.total_btc += row.total_btc;
        acc.tagged_btc += row.tagged_btc;
        acc.untagged_btc += row.untagged_btc;
        acc.tagged_notional += row.tagged_notional;
        acc.untagged_notional += row.untagged_notional;
        acc
    })
}

/// One slice of the overview distribution.
#[derive(Clone, Debug, PartialEq)]
pub struct TagShare {
    pub label: String,
    pub notional: f64,
    pub share_pct: f64,
}

/// Notional volume per tag label, as shares of the combined total.
///
/// An order's notional counts once per occurrence of each of its tags;
/// untagged orders accumulate under [`UNTAGGED_LABEL`]. Zero slices are
/// dropped and the rest sorted by descending share (label breaks
/// ties), so equal inputs always render the same distribution.
pub fn tag_distribution(orders: &[Order]) -> Vec<TagShare> {
    let mut notionals: BTreeMap<&str, f64> = BTreeMap::new();

    for order in orders {
        let notional = order.notional();
        if order.tags.is_tagged() {
            for tag in order.tags.labels() {
                *notionals.entry(tag.as_str()).or_insert(0.0) += notional;
            }
        } else {
            *notionals.entry(UNTAGGED_LABEL).or_insert(0.0) += notional;
        }
    }

    let total: f64 = notionals.values().sum();
    if total <= 0.0 {
        return Vec::new();
    }

    notionals
        .into_iter()
        .filter(|(_, notional)| *notional > 0.0)
        .map(|(label, notional)| TagShare {
            label: label.to_string(),
            notional,
            share_pct: notional / total * 100.0,
        })
        .sorted_by(|a, b| {
            b.share_pct
                .total_cmp(&a.share_pct)
                .then_with(|| a.label.cmp(&b.label))
        })
        .collect()
}

/// Every distinct tag across a set of orders, first-seen order.
pub fn unique_tags(orders: &[Order]) -> Vec<String> {
    orders
        .iter()
        .flat_map(|order| order.tags.labels())
        .map(String::as_str)
        .unique()
        .map(str::to_string)
        .collect()
}

/// Headline numbers for the address-search screen.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AddressSummary {
    pub transactions: usize,
    pub total_btc: f64,
    pub total_notional: f64,
    /// Largest single order, in BTC.
    pub largest_btc: f64,
}

pub fn address_report_summary(orders: &[Order]) -> AddressSummary {
    let mut summary = AddressSummary {
        transactions: orders.len(),
        ..Default::default()
    };
    for order in orders {
        let quantity = order.quantity_btc();
        summary.total_btc += quantity;
        summary.total_notional += order.notional();
        summary.largest_btc = summary.largest_btc.max(quantity);
    }
    summary
}
