//! Data model for the swapbook backend and the external swap feeds.
//!
//! Field names mirror the backend JSON exactly (a mix of PascalCase
//! database columns and camelCase API fields), so every struct here
//! deserialises straight off the wire.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Smallest-unit scale for Bitcoin-denominated amounts (1 BTC = 1e8 sats).
pub const BTC_DECIMALS: u32 = 8;

/// Convert a smallest-unit integer string into a whole-unit amount.
///
/// Parsing goes through [`Decimal`] so 64-bit-overflowing raw amounts
/// stay exact before the final `f64` conversion. Malformed input yields
/// 0.0 rather than NaN; upstream aggregation never has to guard.
pub fn scaled_amount(raw: &str, decimals: u32) -> f64 {
    let Ok(amount) = raw.trim().parse::<Decimal>() else {
        return 0.0;
    };
    let scale = Decimal::from(10u64.pow(decimals));
    (amount / scale).to_f64().unwrap_or(0.0)
}

/// One side of an atomic swap (initiator or follower leg).
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SwapLeg {
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(rename = "CreatedAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "UpdatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "initiatorAddress")]
    pub initiator_address: String,
    #[serde(rename = "redeemerAddress", default)]
    pub redeemer_address: Option<String>,
    /// Chain identifier (e.g. "bitcoin", "ethereum").
    pub chain: String,
    pub asset: String,
    /// Amount in the asset's smallest unit, as an integer string.
    pub amount: String,
    /// Oracle price of one whole unit, in the reference currency.
    #[serde(rename = "priceByOracle")]
    pub price_by_oracle: f64,
}

impl SwapLeg {
    /// Whole-unit quantity of this leg.
    pub fn quantity(&self, decimals: u32) -> f64 {
        scaled_amount(&self.amount, decimals)
    }

    /// Reference-currency value of this leg: quantity x oracle price.
    pub fn notional(&self, decimals: u32) -> f64 {
        self.quantity(decimals) * self.price_by_oracle
    }
}

/// Operator-applied labels on an order.
///
/// The backend serialises these as an optional array; absent, null and
/// empty all mean the same thing, so the distinction is collapsed here
/// once instead of re-checked at every call site. `Tagged` is non-empty
/// by construction; label order is preserved and duplicates are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TagSet {
    Tagged(Vec<String>),
    #[default]
    Untagged,
}

impl TagSet {
    pub fn from_labels(labels: Vec<String>) -> Self {
        if labels.is_empty() {
            TagSet::Untagged
        } else {
            TagSet::Tagged(labels)
        }
    }

    pub fn is_tagged(&self) -> bool {
        matches!(self, TagSet::Tagged(_))
    }

    pub fn labels(&self) -> &[String] {
        match self {
            TagSet::Tagged(labels) => labels,
            TagSet::Untagged => &[],
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.labels().iter().any(|label| label == tag)
    }

    pub fn push(&mut self, tag: String) {
        match self {
            TagSet::Tagged(labels) => labels.push(tag),
            TagSet::Untagged => *self = TagSet::Tagged(vec![tag]),
        }
    }
}

impl<'de> Deserialize<'de> for TagSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let labels = Option::<Vec<String>>::deserialize(deserializer)?;
        Ok(TagSet::from_labels(labels.unwrap_or_default()))
    }
}

impl Serialize for TagSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            TagSet::Tagged(labels) => serializer.collect_seq(labels),
            TagSet::Untagged => serializer.serialize_none(),
        }
    }
}

/// A matched atomic-swap order.
///
/// ### Raw Payload Example
/// ```json
/// {
///     "ID": 4821,
///     "CreatedAt": "2024-11-04T09:12:44.000Z",
///     "UpdatedAt": "2024-11-04T09:14:02.000Z",
///     "InitiatorAtomicSwapID": 9640,
///     "FollowerAtomicSwapID": 9641,
///     "initiatorAtomicSwap": { ... },
///     "followerAtomicSwap": { ... },
///     "maker": "0x74a1...c09e",
///     "taker": "0x99b2...d410",
///     "tags": ["vip"]
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Order {
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(rename = "CreatedAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "UpdatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "InitiatorAtomicSwapID")]
    pub initiator_atomic_swap_id: u64,
    #[serde(rename = "FollowerAtomicSwapID")]
    pub follower_atomic_swap_id: u64,
    #[serde(rename = "initiatorAtomicSwap")]
    pub initiator_atomic_swap: SwapLeg,
    #[serde(rename = "followerAtomicSwap")]
    pub follower_atomic_swap: SwapLeg,
    #[serde(rename = "userBtcWalletAddress", default)]
    pub user_btc_wallet_address: Option<String>,
    /// Address of the originating party.
    pub maker: String,
    pub taker: String,
    #[serde(default)]
    pub tags: TagSet,
}

impl Order {
    /// BTC quantity of the initiator leg (the amount every dashboard
    /// view reports on).
    pub fn quantity_btc(&self) -> f64 {
        self.initiator_atomic_swap.quantity(BTC_DECIMALS)
    }

    /// Reference-currency notional of the initiator leg.
    pub fn notional(&self) -> f64 {
        self.initiator_atomic_swap.notional(BTC_DECIMALS)
    }
}

/// One Thorchain swap interval; `btc_amount` arrives as whole BTC.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ThorchainSwap {
    #[serde(deserialize_with = "crate::de::de_epoch_s_as_datetime_utc")]
    pub timestamp: DateTime<Utc>,
    pub btc_amount: f64,
    pub btc_address: String,
}

/// One Chainflip swap interval; `btc_amount` arrives as an integer
/// string in sats.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ChainflipSwap {
    #[serde(deserialize_with = "crate::de::de_epoch_s_as_datetime_utc")]
    pub timestamp: DateTime<Utc>,
    pub btc_amount: String,
    pub btc_address: String,
}

impl ChainflipSwap {
    pub fn amount_btc(&self) -> f64 {
        scaled_amount(&self.btc_amount, BTC_DECIMALS)
    }
}

/// `/search` response: the tags attached to one address and all orders
/// it originated.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AddressReport {
    pub tags: Vec<String>,
    pub orders: Vec<Order>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_amount() {
        assert_eq!(scaled_amount("100000000", BTC_DECIMALS), 1.0);
        assert_eq!(scaled_amount("50000000", BTC_DECIMALS), 0.5);
        assert_eq!(scaled_amount("1", BTC_DECIMALS), 0.00000001);
        assert_eq!(scaled_amount("0", BTC_DECIMALS), 0.0);
        // Malformed input defaults to zero, never NaN
        assert_eq!(scaled_amount("garbage", BTC_DECIMALS), 0.0);
        assert_eq!(scaled_amount("", BTC_DECIMALS), 0.0);
    }

    #[test]
    fn test_tag_set_from_labels() {
        assert_eq!(TagSet::from_labels(vec![]), TagSet::Untagged);
        assert!(!TagSet::Untagged.is_tagged());

        let mut tags = TagSet::from_labels(vec!["vip".to_string()]);
        assert!(tags.is_tagged());
        assert!(tags.contains("vip"));
        assert!(!tags.contains("VIP"));

        // Order preserved, duplicates permitted
        tags.push("whale".to_string());
        tags.push("vip".to_string());
        assert_eq!(tags.labels(), ["vip", "whale", "vip"]);
    }

    mod de {
        use super::*;

        #[test]
        fn test_order() {
            struct TestCase {
                input: String,
                expected_tags: TagSet,
            }

            let leg = r#"{
                "ID": 9640,
                "CreatedAt": "2024-11-04T09:12:44Z",
                "UpdatedAt": "2024-11-04T09:14:02Z",
                "initiatorAddress": "bc1qw4xyz",
                "chain": "bitcoin",
                "asset": "BTC",
                "amount": "150000000",
                "priceByOracle": 60000.0
            }"#;

            let order_json = |tags: &str| {
                format!(
                    r#"{{
                        "ID": 4821,
                        "CreatedAt": "2024-11-04T09:12:44Z",
                        "UpdatedAt": "2024-11-04T09:14:02Z",
                        "InitiatorAtomicSwapID": 9640,
                        "FollowerAtomicSwapID": 9641,
                        "initiatorAtomicSwap": {leg},
                        "followerAtomicSwap": {leg},
                        "maker": "0x74a1c09e",
                        "taker": "0x99b2d410"{tags}
                    }}"#
                )
            };

            let tests = vec![
                // TC0: tags absent => Untagged
                TestCase {
                    input: order_json(""),
                    expected_tags: TagSet::Untagged,
                },
                // TC1: tags null => Untagged
                TestCase {
                    input: order_json(r#", "tags": null"#),
                    expected_tags: TagSet::Untagged,
                },
                // TC2: tags empty => Untagged
                TestCase {
                    input: order_json(r#", "tags": []"#),
                    expected_tags: TagSet::Untagged,
                },
                // TC3: tags present => Tagged, order preserved
                TestCase {
                    input: order_json(r#", "tags": ["vip", "market-maker"]"#),
                    expected_tags: TagSet::Tagged(vec![
                        "vip".to_string(),
                        "market-maker".to_string(),
                    ]),
                },
            ];

            for (index, test) in tests.into_iter().enumerate() {
                let order = serde_json::from_str::<Order>(&test.input)
                    .unwrap_or_else(|err| panic!("TC{index} failed to deserialise: {err}"));
                assert_eq!(order.id, 4821, "TC{index} failed");
                assert_eq!(order.tags, test.expected_tags, "TC{index} failed");
                assert_eq!(order.quantity_btc(), 1.5, "TC{index} failed");
                assert_eq!(order.notional(), 90_000.0, "TC{index} failed");
            }
        }

        #[test]
        fn test_tag_set_round_trip_shape() {
            let tagged = TagSet::Tagged(vec!["vip".to_string()]);
            assert_eq!(serde_json::to_string(&tagged).unwrap(), r#"["vip"]"#);
            assert_eq!(serde_json::to_string(&TagSet::Untagged).unwrap(), "null");
        }

        #[test]
        fn test_thorchain_swap() {
            let input = r#"{
                "timestamp": "1733011200",
                "btc_amount": 0.42,
                "btc_address": "bc1qThor"
            }"#;

            let swap = serde_json::from_str::<ThorchainSwap>(input).unwrap();
            assert_eq!(swap.btc_amount, 0.42);
            assert_eq!(
                swap.timestamp,
                DateTime::<Utc>::from_timestamp(1_733_011_200, 0).unwrap()
            );
        }

        #[test]
        fn test_chainflip_swap() {
            let input = r#"{
                "timestamp": 1733011200,
                "btc_amount": "25000000",
                "btc_address": "bc1qFlip"
            }"#;

            let swap = serde_json::from_str::<ChainflipSwap>(input).unwrap();
            assert_eq!(swap.amount_btc(), 0.25);
        }

        #[test]
        fn test_address_report() {
            let input = r#"{"tags": ["vip"], "orders": []}"#;
            let report = serde_json::from_str::<AddressReport>(input).unwrap();
            assert_eq!(report.tags, ["vip"]);
            assert!(report.orders.is_empty());
        }
    }
}
