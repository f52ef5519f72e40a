//! Recommendation ranking
//!
//! Every insight read goes through a [`RecommendationRanker`]. The default
//! ranker keeps source order, since narrative sources already list
//! recommendations most urgent first.

/// Orders recommendations for presentation
pub trait RecommendationRanker: Send + Sync {
    /// Human-readable name
    fn name(&self) -> &'static str;

    fn rank(&self, recommendations: &[String]) -> Vec<String>;
}

/// Preserves insertion order
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertionOrderRanker;

impl RecommendationRanker for InsertionOrderRanker {
    fn name(&self) -> &'static str {
        "insertion_order"
    }

    fn rank(&self, recommendations: &[String]) -> Vec<String> {
        recommendations.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_is_identity() {
        let recs = vec![
            "Add a second dispatch shift".to_string(),
            "Re-slot fast movers".to_string(),
            "Audit carrier SLAs".to_string(),
        ];
        let ranked = InsertionOrderRanker.rank(&recs);
        assert_eq!(ranked.len(), recs.len());
        assert_eq!(ranked, recs);
    }

    #[test]
    fn test_insertion_order_empty() {
        assert!(InsertionOrderRanker.rank(&[]).is_empty());
    }

    #[test]
    fn test_insertion_order_keeps_duplicates() {
        let recs = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        assert_eq!(InsertionOrderRanker.rank(&recs), recs);
    }
}
