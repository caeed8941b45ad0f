//! Tiered fetch budget for cursor pagination.
//!
//! After the first page the controller looks at how much data came back and
//! decides, once, how many additional pages it is willing to spend: sparse
//! accounts get more pages, busy accounts fewer.

use serde::{Deserialize, Serialize};

/// One budget tier: below `below` accumulated data points, allow up to
/// `max_pages` additional pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetTier {
    pub below: usize,
    pub max_pages: u32,
}

/// Tier table consulted once after the first fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetTiers {
    /// Tiers, matched by the smallest `below` that exceeds the count.
    pub tiers: Vec<BudgetTier>,
    /// Pages allowed when no tier matches.
    pub otherwise: u32,
}

/// Default tier thresholds.
pub mod tiers {
    pub const SPARSE_BELOW: usize = 20;
    pub const SPARSE_PAGES: u32 = 8;
    pub const LIGHT_BELOW: usize = 50;
    pub const LIGHT_PAGES: u32 = 6;
    pub const MODERATE_BELOW: usize = 100;
    pub const MODERATE_PAGES: u32 = 4;
    pub const BUSY_PAGES: u32 = 3;
}

impl Default for BudgetTiers {
    fn default() -> Self {
        Self {
            tiers: vec![
                BudgetTier {
                    below: tiers::SPARSE_BELOW,
                    max_pages: tiers::SPARSE_PAGES,
                },
                BudgetTier {
                    below: tiers::LIGHT_BELOW,
                    max_pages: tiers::LIGHT_PAGES,
                },
                BudgetTier {
                    below: tiers::MODERATE_BELOW,
                    max_pages: tiers::MODERATE_PAGES,
                },
            ],
            otherwise: tiers::BUSY_PAGES,
        }
    }
}

impl BudgetTiers {
    /// Additional pages allowed for an accumulated count.
    ///
    /// Tiers are matched by ascending threshold regardless of the order they
    /// were configured in.
    pub fn cap_for(&self, accumulated: usize) -> u32 {
        self.tiers
            .iter()
            .filter(|tier| accumulated < tier.below)
            .min_by_key(|tier| tier.below)
            .map_or(self.otherwise, |tier| tier.max_pages)
    }
}

/// Call-scoped page budget.
///
/// `pages_fetched` never exceeds `max_pages`: [`FetchBudget::try_consume_page`]
/// refuses once the cap is hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchBudget {
    target: usize,
    accumulated: usize,
    pages_fetched: u32,
    max_pages: u32,
}

impl FetchBudget {
    /// Size the budget from the count observed after the first fetch.
    ///
    /// If the target is already met, no additional pages are allowed.
    pub fn after_first_fetch(target: usize, accumulated: usize, tiers: &BudgetTiers) -> Self {
        let max_pages = if accumulated >= target {
            0
        } else {
            tiers.cap_for(accumulated)
        };
        Self {
            target,
            accumulated,
            pages_fetched: 0,
            max_pages,
        }
    }

    /// Reserve one additional page. Returns false when the cap is reached.
    pub fn try_consume_page(&mut self) -> bool {
        if self.pages_fetched >= self.max_pages {
            return false;
        }
        self.pages_fetched += 1;
        true
    }

    /// Add freshly fetched data points.
    pub fn record(&mut self, count: usize) {
        self.accumulated += count;
    }

    pub fn target_reached(&self) -> bool {
        self.accumulated >= self.target
    }

    pub fn cap_reached(&self) -> bool {
        self.pages_fetched >= self.max_pages
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn accumulated(&self) -> usize {
        self.accumulated
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: usize = 200;

    fn cap(accumulated: usize) -> u32 {
        FetchBudget::after_first_fetch(TARGET, accumulated, &BudgetTiers::default()).max_pages()
    }

    #[test]
    fn test_default_tier_caps() {
        assert_eq!(cap(0), 8);
        assert_eq!(cap(15), 8);
        assert_eq!(cap(19), 8);
        assert_eq!(cap(20), 6);
        assert_eq!(cap(40), 6);
        assert_eq!(cap(50), 4);
        assert_eq!(cap(80), 4);
        assert_eq!(cap(100), 3);
        assert_eq!(cap(150), 3);
    }

    #[test]
    fn test_target_already_met_allows_zero_pages() {
        assert_eq!(cap(TARGET), 0);
        assert_eq!(cap(TARGET + 1), 0);
        assert_eq!(FetchBudget::after_first_fetch(10, 15, &BudgetTiers::default()).max_pages(), 0);
    }

    #[test]
    fn test_try_consume_page_never_exceeds_cap() {
        let mut budget = FetchBudget::after_first_fetch(TARGET, 80, &BudgetTiers::default());
        let mut granted = 0;
        for _ in 0..20 {
            if budget.try_consume_page() {
                granted += 1;
            }
        }
        assert_eq!(granted, 4);
        assert_eq!(budget.pages_fetched(), 4);
        assert!(budget.cap_reached());
    }

    #[test]
    fn test_record_tracks_target() {
        let mut budget = FetchBudget::after_first_fetch(100, 40, &BudgetTiers::default());
        assert!(!budget.target_reached());
        budget.record(59);
        assert!(!budget.target_reached());
        budget.record(1);
        assert!(budget.target_reached());
        assert_eq!(budget.accumulated(), 100);
    }

    #[test]
    fn test_custom_tiers_are_order_independent() {
        let tiers = BudgetTiers {
            tiers: vec![
                BudgetTier {
                    below: 10,
                    max_pages: 2,
                },
                BudgetTier {
                    below: 5,
                    max_pages: 9,
                },
            ],
            otherwise: 1,
        };
        assert_eq!(tiers.cap_for(3), 9);
        assert_eq!(tiers.cap_for(7), 2);
        assert_eq!(tiers.cap_for(10), 1);
    }

    #[test]
    fn test_tiers_deserialize_with_defaults() {
        let tiers: BudgetTiers = serde_json::from_str(r#"{"otherwise": 1}"#).unwrap();
        assert_eq!(tiers.otherwise, 1);
        assert_eq!(tiers.tiers.len(), 3);
    }
}
