//! Custom deserialization helpers for backend JSON quirks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Deserialize a `String` into any type implementing `FromStr`.
pub fn de_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let data = String::deserialize(deserializer)?;
    data.parse::<T>().map_err(serde::de::Error::custom)
}

/// Deserialize a unix-second epoch into a `DateTime<Utc>`.
///
/// The Thorchain and Chainflip feeds serialise their timestamps as
/// strings; accept a bare integer as well.
pub fn de_epoch_s_as_datetime_utc<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Epoch {
        Int(i64),
        Text(String),
    }

    let seconds = match Epoch::deserialize(deserializer)? {
        Epoch::Int(seconds) => seconds,
        Epoch::Text(text) => text.parse::<i64>().map_err(serde::de::Error::custom)?,
    };

    DateTime::<Utc>::from_timestamp(seconds, 0)
        .ok_or_else(|| serde::de::Error::custom(format!("epoch out of range: {seconds}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Record {
        #[serde(deserialize_with = "de_epoch_s_as_datetime_utc")]
        time: DateTime<Utc>,
        #[serde(deserialize_with = "de_str")]
        amount: u64,
    }

    #[test]
    fn test_de_epoch_s_and_de_str() {
        let from_text: Record =
            serde_json::from_str(r#"{"time": "1733011200", "amount": "150000"}"#).unwrap();
        let from_int: Record =
            serde_json::from_str(r#"{"time": 1733011200, "amount": "150000"}"#).unwrap();

        assert_eq!(from_text, from_int);
        assert_eq!(from_text.amount, 150_000);
        assert_eq!(
            from_text.time,
            DateTime::<Utc>::from_timestamp(1_733_011_200, 0).unwrap()
        );
    }

    #[test]
    fn test_de_str_rejects_garbage() {
        let result = serde_json::from_str::<Record>(r#"{"time": 0, "amount": "not-a-number"}"#);
        assert!(result.is_err());
    }
}
