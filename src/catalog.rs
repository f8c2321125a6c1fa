use std::collections::HashMap;

use crate::error::ScoreError;
use crate::types::Asset;

/// Prefix for generated trait columns, so they never collide with the
/// asset's own fields in the flattened output record.
const COLUMN_PREFIX: &str = "Trait_";

/// The set of distinct trait types observed across one batch, each mapped to
/// a canonical output column key.
///
/// Built fresh per batch and never persisted. Iteration order is first-seen
/// over the input sequence, so column layout is stable within a run.
#[derive(Debug, Clone)]
pub struct TraitCatalog {
    /// Trait types in first-seen order.
    order: Vec<String>,
    /// Trait type → column key.
    keys: HashMap<String, String>,
}

/// Normalize a free-form trait type into a column identifier: whitespace
/// runs become a single underscore.
fn column_key(trait_type: &str) -> String {
    let mut key = String::with_capacity(COLUMN_PREFIX.len() + trait_type.len());
    key.push_str(COLUMN_PREFIX);
    let mut last_was_sep = false;
    for ch in trait_type.trim().chars() {
        if ch.is_whitespace() {
            if !last_was_sep {
                key.push('_');
                last_was_sep = true;
            }
        } else {
            key.push(ch);
            last_was_sep = false;
        }
    }
    key
}

impl TraitCatalog {
    /// Scan a batch and build the catalog.
    ///
    /// Fails with `DuplicateColumnKey` when two distinct trait types
    /// normalize to the same column key (e.g. "Fur Color" and "Fur_Color").
    pub fn build(assets: &[Asset]) -> Result<Self, ScoreError> {
        let mut order = Vec::new();
        let mut keys: HashMap<String, String> = HashMap::new();
        let mut owners: HashMap<String, String> = HashMap::new();

        for asset in assets {
            for attr in &asset.traits {
                if keys.contains_key(&attr.trait_type) {
                    continue;
                }
                let key = column_key(&attr.trait_type);
                if let Some(first) = owners.get(&key) {
                    return Err(ScoreError::DuplicateColumnKey {
                        key,
                        first: first.clone(),
                        second: attr.trait_type.clone(),
                    });
                }
                owners.insert(key.clone(), attr.trait_type.clone());
                keys.insert(attr.trait_type.clone(), key);
                order.push(attr.trait_type.clone());
            }
        }

        Ok(Self { order, keys })
    }

    /// Column key for a trait type, if it is in the catalog.
    pub fn column_key(&self, trait_type: &str) -> Option<&str> {
        self.keys.get(trait_type).map(String::as_str)
    }

    /// Column keys in catalog (first-seen) order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|t| self.keys[t].as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
