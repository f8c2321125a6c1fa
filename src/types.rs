use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::WEI_PER_ETH;

/// One attribute from an asset's trait list, as supplied upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitAttribute {
    pub trait_type: String,
    pub value: String,
    /// Occurrences of this (trait_type, value) pair across the collection,
    /// as reported by the marketplace. May be missing or zero on malformed
    /// responses; the scorer treats both as a zero contribution.
    #[serde(default)]
    pub trait_count: Option<u64>,
}

/// An active fixed-price listing attached to an asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Price denominated in the payment token unit (e.g. ETH, not wei).
    pub price: Decimal,
    /// Payment token symbol, e.g. "ETH" or "WETH".
    pub payment_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
}

/// A raw asset record from the marketplace scrape.
///
/// Fields other than `token_id`, `traits` and `listing` are carried through
/// the pipeline untouched via `extra` (image URLs, permalinks, sale history).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub token_id: String,
    #[serde(default)]
    pub traits: Vec<TraitAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing: Option<Listing>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An asset after scoring: original fields plus one column per catalog trait,
/// the rarity score, the dense rarity rank, and (when snipe evaluation was
/// requested) the candidate flag.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredAsset {
    pub token_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing: Option<Listing>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Column key → trait value; `None` when the asset lacks the trait.
    #[serde(flatten)]
    pub trait_columns: BTreeMap<String, Option<String>>,
    pub rarity_score: f64,
    pub rarity_rank: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snipe: Option<bool>,
}

impl ScoredAsset {
    /// Value of the given trait column, if the asset has it.
    pub fn trait_value(&self, column_key: &str) -> Option<&str> {
        self.trait_columns
            .get(column_key)
            .and_then(|v| v.as_deref())
    }
}

/// Convert an upstream wei-denominated integer string to ETH.
///
/// Marketplace events report prices as wei strings ("250000000000000000");
/// returns `None` when the string is not a parseable amount.
pub fn wei_to_eth(wei: &str) -> Option<Decimal> {
    let raw: Decimal = wei.trim().parse().ok()?;
    Some(raw / WEI_PER_ETH)
}
