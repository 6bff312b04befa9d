//! Explorer-shaped transfer records.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize an optional field from a JSON string or number.
///
/// Explorers encode numbers as decimal strings and use `""` for absent
/// values; both empty strings and `null` read as `None`.
fn deserialize_opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNum {
        Str(String),
        Num(serde_json::Number),
    }
    Ok(
        match Option::<StringOrNum>::deserialize(deserializer)? {
            Some(StringOrNum::Str(s)) if !s.trim().is_empty() => Some(s.trim().to_owned()),
            Some(StringOrNum::Num(n)) => Some(n.to_string()),
            _ => None,
        },
    )
}

/// One record of any account list endpoint.
///
/// The superset of the fields the four categories use; fields a category
/// does not report stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    /// Transaction hash.
    #[serde(default, deserialize_with = "deserialize_opt_string_or_number")]
    pub hash: Option<String>,
    /// Block time in seconds since the Unix epoch.
    #[serde(default, deserialize_with = "deserialize_opt_string_or_number")]
    pub time_stamp: Option<String>,
    /// Block number.
    #[serde(default, deserialize_with = "deserialize_opt_string_or_number")]
    pub block_number: Option<String>,
    /// Sender.
    #[serde(default, deserialize_with = "deserialize_opt_string_or_number")]
    pub from: Option<String>,
    /// Recipient.
    #[serde(default, deserialize_with = "deserialize_opt_string_or_number")]
    pub to: Option<String>,
    /// Amount in base units.
    #[serde(default, deserialize_with = "deserialize_opt_string_or_number")]
    pub value: Option<String>,
    /// Token contract.
    #[serde(default, deserialize_with = "deserialize_opt_string_or_number")]
    pub contract_address: Option<String>,
    /// ERC-721 token ID.
    #[serde(
        default,
        alias = "tokenID",
        deserialize_with = "deserialize_opt_string_or_number"
    )]
    pub token_id: Option<String>,
    /// Token ticker.
    #[serde(default, deserialize_with = "deserialize_opt_string_or_number")]
    pub token_symbol: Option<String>,
    /// Gas units consumed.
    #[serde(
        default,
        alias = "gasused",
        deserialize_with = "deserialize_opt_string_or_number"
    )]
    pub gas_used: Option<String>,
    /// Price per gas unit in wei.
    #[serde(
        default,
        alias = "gasprice",
        deserialize_with = "deserialize_opt_string_or_number"
    )]
    pub gas_price: Option<String>,
}

impl RawRecord {
    /// Decode one page entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry is not an object or a field has a
    /// non-scalar value.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        if !value.is_object() {
            return Err(serde::de::Error::custom(format!(
                "expected a record object, got {value}"
            )));
        }
        Self::deserialize(value)
    }
}
