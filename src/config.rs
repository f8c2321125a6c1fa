use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::snipe::{PriceCeilings, SnipeCriteria};

/// Default config file path.
pub const CONFIG_PATH: &str = "config.toml";

/// Top-level per-collection config deserialized from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snipe: Option<SnipeConfig>,
}

/// Collection-level scoring settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Rarity denominator override for partial scrapes of large collections.
    /// Defaults to the batch size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_size: Option<usize>,
}

/// Snipe flagging settings. Supply either `flat_ceiling` or a
/// `segment_trait` plus `ceilings` table, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnipeConfig {
    /// Payment token symbol listings must use to qualify.
    #[serde(default = "default_payment_token")]
    pub payment_token: String,
    /// Trait type whose value selects the ceiling from `ceilings`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_trait: Option<String>,
    /// Single ceiling for the whole collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat_ceiling: Option<Decimal>,
    /// Segment value → ceiling.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub ceilings: HashMap<String, Decimal>,
}

fn default_payment_token() -> String {
    "ETH".to_string()
}

impl AppConfig {
    /// Load config from the given TOML file path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }
}

impl SnipeConfig {
    /// Validate and convert into runtime criteria.
    pub fn into_criteria(self) -> Result<SnipeCriteria> {
        let ceilings = match (self.flat_ceiling, self.ceilings.is_empty()) {
            (Some(_), false) => {
                bail!("snipe config must set either flat_ceiling or ceilings, not both")
            }
            (None, true) => {
                bail!("snipe config must set flat_ceiling or a ceilings table")
            }
            (Some(flat), true) => PriceCeilings::Flat(flat),
            (None, false) => {
                let trait_type = self
                    .segment_trait
                    .context("snipe ceilings table requires segment_trait")?;
                PriceCeilings::PerSegment {
                    trait_type,
                    table: self.ceilings,
                }
            }
        };
        Ok(SnipeCriteria {
            payment_token: self.payment_token,
            ceilings,
        })
    }
}
