use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::catalog::TraitCatalog;
use crate::error::ScoreError;
use crate::snipe::{self, SnipeCriteria};
use crate::types::{Asset, ScoredAsset};

/// Knobs for one scoring run.
#[derive(Debug, Clone, Default)]
pub struct ScoreOptions {
    /// Denominator for the rarity ratio. Defaults to the batch size, but a
    /// partial scrape of a large collection should pass the real collection
    /// size here.
    pub collection_size: Option<usize>,
    /// When set, every output record gets a snipe candidate flag.
    pub snipe: Option<SnipeCriteria>,
}

/// Score one batch of assets against a catalog built from the same batch.
///
/// Each attribute contributes `collection_size / trait_count` to the asset's
/// rarity score, i.e. the inverse of the trait's frequency. Counts are taken
/// from the upstream data as-is, not recomputed from the batch, so scores
/// follow whatever the marketplace reported even when those counts are stale.
///
/// A `trait_count` of zero or a missing count contributes nothing (malformed
/// upstream rows must not poison the batch); an attribute whose trait type is
/// not in the catalog aborts the whole batch with `CatalogMismatch`.
pub fn score_batch(
    assets: &[Asset],
    catalog: &TraitCatalog,
    collection_size: Option<usize>,
) -> Result<Vec<ScoredAsset>, ScoreError> {
    let denominator = collection_size.unwrap_or(assets.len()) as f64;
    let mut scored = Vec::with_capacity(assets.len());

    for asset in assets {
        let mut columns: BTreeMap<String, Option<String>> = catalog
            .columns()
            .map(|key| (key.to_string(), None))
            .collect();
        let mut rarity_score = 0.0;

        for attr in &asset.traits {
            let key = catalog.column_key(&attr.trait_type).ok_or_else(|| {
                ScoreError::CatalogMismatch {
                    token_id: asset.token_id.clone(),
                    trait_type: attr.trait_type.clone(),
                }
            })?;

            match attr.trait_count {
                Some(0) => {} // marketplace reports 0 for some traits
                Some(count) => rarity_score += denominator / count as f64,
                None => {
                    warn!(
                        "Asset {}: trait {:?}={:?} has no trait_count, contributes 0",
                        asset.token_id, attr.trait_type, attr.value
                    );
                }
            }

            columns.insert(key.to_string(), Some(attr.value.clone()));
        }

        scored.push(ScoredAsset {
            token_id: asset.token_id.clone(),
            listing: asset.listing.clone(),
            extra: asset.extra.clone(),
            trait_columns: columns,
            rarity_score,
            rarity_rank: 0, // assigned by assign_ranks
            snipe: None,
        });
    }

    Ok(scored)
}

/// Assign dense 1-based ranks over descending rarity score.
///
/// Ties share a rank and the next distinct score gets the immediately
/// following rank, so the rank set is always `{1..k}` with no gaps. Batch
/// order is preserved.
pub fn assign_ranks(scored: &mut [ScoredAsset]) {
    let mut distinct: Vec<f64> = scored.iter().map(|s| s.rarity_score).collect();
    distinct.sort_by(|a, b| b.total_cmp(a));
    distinct.dedup();

    for asset in scored.iter_mut() {
        // distinct is small (<= batch size) and sorted descending
        let idx = distinct
            .iter()
            .position(|v| *v == asset.rarity_score)
            .unwrap_or(distinct.len().saturating_sub(1));
        asset.rarity_rank = (idx + 1) as u32;
    }
}

/// Run the full pipeline: catalog → scorer → ranker → optional snipe flags.
///
/// Fails atomically: on any fatal error no output is produced.
pub fn process_batch(
    assets: &[Asset],
    opts: &ScoreOptions,
) -> Result<Vec<ScoredAsset>, ScoreError> {
    let catalog = TraitCatalog::build(assets)?;
    debug!(
        "Built catalog with {} trait columns from {} assets",
        catalog.len(),
        assets.len()
    );

    let mut scored = score_batch(assets, &catalog, opts.collection_size)?;
    assign_ranks(&mut scored);

    if let Some(criteria) = &opts.snipe {
        snipe::flag_candidates(&mut scored, criteria, &catalog);
    }

    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TraitAttribute;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn make_asset(token_id: &str, traits: &[(&str, &str, Option<u64>)]) -> Asset {
        Asset {
            token_id: token_id.to_string(),
            traits: traits
                .iter()
                .map(|(t, v, c)| TraitAttribute {
                    trait_type: t.to_string(),
                    value: v.to_string(),
                    trait_count: *c,
                })
                .collect(),
            listing: None,
            extra: serde_json::Map::new(),
        }
    }

    fn scores(scored: &[ScoredAsset]) -> Vec<f64> {
        scored.iter().map(|s| s.rarity_score).collect()
    }

    fn ranks(scored: &[ScoredAsset]) -> Vec<u32> {
        scored.iter().map(|s| s.rarity_rank).collect()
    }

    // ── score_batch ────────────────────────────────────────────────

    #[test]
    fn universal_trait_contributes_exactly_one() {
        // trait_count == batch size → contribution 1 per occurrence
        let assets: Vec<Asset> = (0..4)
            .map(|i| make_asset(&i.to_string(), &[("Type", "Common", Some(4))]))
            .collect();
        let catalog = TraitCatalog::build(&assets).unwrap();
        let scored = score_batch(&assets, &catalog, None).unwrap();
        assert!(scored.iter().all(|s| approx_eq(s.rarity_score, 1.0)));
    }

    #[test]
    fn zero_trait_count_contributes_zero() {
        let assets = vec![make_asset(
            "1",
            &[("Type", "Glitch", Some(0)), ("Mood", "Happy", Some(1))],
        )];
        let catalog = TraitCatalog::build(&assets).unwrap();
        let scored = score_batch(&assets, &catalog, None).unwrap();
        // Only Mood contributes: 1 / (1/1) = 1
        assert!(approx_eq(scored[0].rarity_score, 1.0));
    }

    #[test]
    fn missing_trait_count_contributes_zero_but_keeps_column() {
        let assets = vec![make_asset("1", &[("Type", "Glitch", None)])];
        let catalog = TraitCatalog::build(&assets).unwrap();
        let scored = score_batch(&assets, &catalog, None).unwrap();
        assert!(approx_eq(scored[0].rarity_score, 0.0));
        assert_eq!(scored[0].trait_value("Trait_Type"), Some("Glitch"));
    }

    #[test]
    fn missing_trait_yields_none_column() {
        let assets = vec![
            make_asset("1", &[("Hat", "Crown", Some(1))]),
            make_asset("2", &[]),
        ];
        let catalog = TraitCatalog::build(&assets).unwrap();
        let scored = score_batch(&assets, &catalog, None).unwrap();
        assert_eq!(scored[1].trait_columns.get("Trait_Hat"), Some(&None));
        assert!(approx_eq(scored[1].rarity_score, 0.0));
    }

    #[test]
    fn collection_size_override_changes_denominator() {
        let assets = vec![make_asset("1", &[("Type", "Rare", Some(10))])];
        let catalog = TraitCatalog::build(&assets).unwrap();
        let scored = score_batch(&assets, &catalog, Some(10_000)).unwrap();
        assert!(approx_eq(scored[0].rarity_score, 1000.0));
    }

    #[test]
    fn stale_catalog_aborts_batch() {
        let old = vec![make_asset("1", &[("Hat", "Crown", Some(1))])];
        let catalog = TraitCatalog::build(&old).unwrap();
        let new = vec![make_asset("2", &[("Shoes", "Boots", Some(1))])];
        let err = score_batch(&new, &catalog, None).unwrap_err();
        match err {
            ScoreError::CatalogMismatch {
                token_id,
                trait_type,
            } => {
                assert_eq!(token_id, "2");
                assert_eq!(trait_type, "Shoes");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    // ── assign_ranks ───────────────────────────────────────────────

    #[test]
    fn ranks_are_dense_with_ties() {
        // A/B/C share the common (Color, Red, count=2) per upstream counts;
        // D has the rarer (Color, Blue, count=1).
        let assets = vec![
            make_asset("A", &[("Color", "Red", Some(2))]),
            make_asset("B", &[("Color", "Red", Some(2))]),
            make_asset("C", &[("Color", "Red", Some(2))]),
            make_asset("D", &[("Color", "Blue", Some(1))]),
        ];
        let scored = process_batch(&assets, &ScoreOptions::default()).unwrap();
        assert_eq!(scores(&scored), vec![2.0, 2.0, 2.0, 4.0]);
        assert_eq!(ranks(&scored), vec![2, 2, 2, 1]);
    }

    #[test]
    fn rank_set_is_contiguous_from_one() {
        let assets = vec![
            make_asset("1", &[("T", "a", Some(1))]), // score 5
            make_asset("2", &[("T", "b", Some(5))]), // score 1
            make_asset("3", &[("T", "b", Some(5))]), // score 1
            make_asset("4", &[("T", "c", Some(2))]), // score 2.5
            make_asset("5", &[]),                    // score 0
        ];
        let scored = process_batch(&assets, &ScoreOptions::default()).unwrap();
        let mut seen = ranks(&scored);
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen, vec![1, 2, 3, 4]); // dense, no gaps

        // rank order matches descending score order
        for a in &scored {
            for b in &scored {
                if a.rarity_score > b.rarity_score {
                    assert!(a.rarity_rank < b.rarity_rank);
                }
            }
        }
    }

    #[test]
    fn equal_scores_share_rank() {
        let assets = vec![
            make_asset("1", &[("T", "x", Some(2))]),
            make_asset("2", &[("T", "x", Some(2))]),
        ];
        let scored = process_batch(&assets, &ScoreOptions::default()).unwrap();
        assert_eq!(scored[0].rarity_rank, scored[1].rarity_rank);
        assert_eq!(scored[0].rarity_rank, 1);
    }

    // ── process_batch ──────────────────────────────────────────────

    #[test]
    fn batch_order_is_preserved() {
        let assets = vec![
            make_asset("first", &[("T", "a", Some(2))]),
            make_asset("second", &[("T", "b", Some(1))]),
        ];
        let scored = process_batch(&assets, &ScoreOptions::default()).unwrap();
        assert_eq!(scored[0].token_id, "first");
        assert_eq!(scored[1].token_id, "second");
    }

    #[test]
    fn rerun_is_byte_identical() {
        let assets = vec![
            make_asset(
                "1",
                &[("Background", "Red", Some(3)), ("DNA", "Human", Some(7))],
            ),
            make_asset("2", &[("DNA", "Robot", Some(1))]),
            make_asset("3", &[("Background", "Blue", Some(2))]),
        ];
        let opts = ScoreOptions::default();
        let a = process_batch(&assets, &opts).unwrap();
        let b = process_batch(&assets, &opts).unwrap();
        let ser_a = serde_json::to_string(&a).unwrap();
        let ser_b = serde_json::to_string(&b).unwrap();
        assert_eq!(ser_a, ser_b);
    }

    #[test]
    fn empty_batch_is_fine() {
        let scored = process_batch(&[], &ScoreOptions::default()).unwrap();
        assert!(scored.is_empty());
    }

    #[test]
    fn duplicate_column_key_aborts_before_scoring() {
        let assets = vec![
            make_asset("1", &[("Fur Color", "Brown", Some(1))]),
            make_asset("2", &[("Fur_Color", "Black", Some(1))]),
        ];
        let err = process_batch(&assets, &ScoreOptions::default()).unwrap_err();
        assert!(matches!(err, ScoreError::DuplicateColumnKey { .. }));
    }
}
