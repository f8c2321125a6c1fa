use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::info;

use crate::catalog::TraitCatalog;
use crate::types::ScoredAsset;

/// Price ceilings for snipe flagging. Collections without per-segment
/// pricing use a single flat ceiling; others map a segmenting trait's value
/// to its own ceiling (e.g. one ceiling per Jankyness Level).
#[derive(Debug, Clone)]
pub enum PriceCeilings {
    Flat(Decimal),
    PerSegment {
        /// Trait type whose value selects the ceiling.
        trait_type: String,
        table: HashMap<String, Decimal>,
    },
}

/// Explicit per-collection snipe configuration. No implicit defaults: a
/// segment value missing from the table simply has no ceiling.
#[derive(Debug, Clone)]
pub struct SnipeCriteria {
    /// Listings in any other payment unit are never candidates.
    pub payment_token: String,
    pub ceilings: PriceCeilings,
}

impl SnipeCriteria {
    /// Whether this scored asset is listed at or below its ceiling.
    ///
    /// Unlisted assets, listings in an unrecognized payment unit, and
    /// segment values with no configured ceiling all evaluate to false.
    /// Upstream trait vocab changes between runs, so an unknown segment is
    /// a fallback, never an error.
    pub fn is_candidate(&self, asset: &ScoredAsset, catalog: &TraitCatalog) -> bool {
        let Some(listing) = &asset.listing else {
            return false;
        };
        if listing.payment_token != self.payment_token {
            return false;
        }

        let ceiling = match &self.ceilings {
            PriceCeilings::Flat(ceiling) => *ceiling,
            PriceCeilings::PerSegment { trait_type, table } => {
                let Some(segment) = catalog
                    .column_key(trait_type)
                    .and_then(|key| asset.trait_value(key))
                else {
                    return false;
                };
                match table.get(segment) {
                    Some(ceiling) => *ceiling,
                    None => return false,
                }
            }
        };

        listing.price <= ceiling
    }
}

/// Set the snipe flag on every asset in the batch.
pub fn flag_candidates(
    scored: &mut [ScoredAsset],
    criteria: &SnipeCriteria,
    catalog: &TraitCatalog,
) {
    let mut candidates = 0usize;
    for asset in scored.iter_mut() {
        let hit = criteria.is_candidate(asset, catalog);
        asset.snipe = Some(hit);
        if hit {
            candidates += 1;
            if let Some(listing) = &asset.listing {
                info!(
                    "SNIPE candidate: token {} at {} {} (rank {})",
                    asset.token_id, listing.price, listing.payment_token, asset.rarity_rank
                );
            }
        }
    }
    info!("Flagged {candidates} snipe candidates out of {}", scored.len());
}
