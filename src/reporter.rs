use serde::Serialize;

use crate::types::ScoredAsset;

/// Batch-level stats emitted after scoring.
#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub assets: usize,
    pub distinct_ranks: u32,
    pub snipe_candidates: Option<usize>,
}

impl BatchSummary {
    pub fn from_batch(scored: &[ScoredAsset]) -> Self {
        let distinct_ranks = scored.iter().map(|s| s.rarity_rank).max().unwrap_or(0);
        let snipe_candidates = if scored.iter().any(|s| s.snipe.is_some()) {
            Some(scored.iter().filter(|s| s.snipe == Some(true)).count())
        } else {
            None
        };
        Self {
            assets: scored.len(),
            distinct_ranks,
            snipe_candidates,
        }
    }
}

/// Emit each scored asset as a single JSON line to stdout, in batch order.
pub fn report_scored(scored: &[ScoredAsset]) {
    for asset in scored {
        if let Ok(json) = serde_json::to_string(asset) {
            println!("{json}");
        }
    }
}

/// Emit the batch summary as pretty-printed JSON to stdout.
pub fn report_summary(summary: &BatchSummary) {
    if let Ok(json) = serde_json::to_string_pretty(summary) {
        println!("{json}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use std::collections::BTreeMap;

    fn make_scored(rank: u32, snipe: Option<bool>) -> ScoredAsset {
        ScoredAsset {
            token_id: "1".to_string(),
            listing: None,
            extra: Map::new(),
            trait_columns: BTreeMap::new(),
            rarity_score: 1.0,
            rarity_rank: rank,
            snipe,
        }
    }

    #[test]
    fn summary_counts_candidates_when_flagged() {
        let scored = vec![
            make_scored(1, Some(true)),
            make_scored(2, Some(false)),
            make_scored(2, Some(true)),
        ];
        let summary = BatchSummary::from_batch(&scored);
        assert_eq!(summary.assets, 3);
        assert_eq!(summary.distinct_ranks, 2);
        assert_eq!(summary.snipe_candidates, Some(2));
    }

    #[test]
    fn summary_omits_candidates_without_evaluation() {
        let scored = vec![make_scored(1, None)];
        let summary = BatchSummary::from_batch(&scored);
        assert_eq!(summary.snipe_candidates, None);
    }
}
