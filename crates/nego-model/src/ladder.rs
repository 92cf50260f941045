//! Ladder resolution: trailing-90-day spend to a discount tier.

use nego_core::ScenarioState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound of Tier A spend (inclusive).
pub const TIER_A_MAX: f64 = 250_000.0;
/// Upper bound of Tier B spend (inclusive).
pub const TIER_B_MAX: f64 = 1_000_000.0;

/// Discount bracket selected by trailing-90 spend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscountTier {
    A,
    B,
    C,
}

impl fmt::Display for DiscountTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountTier::A => write!(f, "A"),
            DiscountTier::B => write!(f, "B"),
            DiscountTier::C => write!(f, "C"),
        }
    }
}

/// Requested discount percentages per tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierAsks {
    /// Tier A ask, percent.
    pub tier_a: f64,
    /// Tier B ask, percent.
    pub tier_b: f64,
    /// Tier C ask, percent.
    pub tier_c: f64,
}

impl TierAsks {
    pub fn from_scenario(state: &ScenarioState) -> Self {
        Self {
            tier_a: state.ask_tier_a,
            tier_b: state.ask_tier_b,
            tier_c: state.ask_tier_c,
        }
    }
}

/// Resolved position on the discount ladder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LadderPosition {
    pub tier: DiscountTier,
    /// Active discount fraction in [0,1].
    pub discount: f64,
    /// Spend remaining to the next threshold; `None` once the ceiling tier
    /// is reached.
    pub next_threshold: Option<f64>,
    /// Linear progress through the current tier's span, in [0,100].
    pub progress_pct: f64,
}

/// Map trailing-90 spend onto the fixed tier ladder.
///
/// Boundaries use strictly-greater-than semantics: spend exactly at a
/// threshold stays in the lower tier.
pub fn resolve_ladder(trailing_90: f64, asks: &TierAsks) -> LadderPosition {
    let spend = trailing_90.max(0.0);
    if spend <= TIER_A_MAX {
        LadderPosition {
            tier: DiscountTier::A,
            discount: asks.tier_a / 100.0,
            next_threshold: Some(TIER_A_MAX - spend),
            progress_pct: (spend / TIER_A_MAX * 100.0).clamp(0.0, 100.0),
        }
    } else if spend <= TIER_B_MAX {
        LadderPosition {
            tier: DiscountTier::B,
            discount: asks.tier_b / 100.0,
            next_threshold: Some(TIER_B_MAX - spend),
            progress_pct: ((spend - TIER_A_MAX) / (TIER_B_MAX - TIER_A_MAX) * 100.0)
                .clamp(0.0, 100.0),
        }
    } else {
        LadderPosition {
            tier: DiscountTier::C,
            discount: asks.tier_c / 100.0,
            next_threshold: None,
            progress_pct: 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn asks() -> TierAsks {
        TierAsks {
            tier_a: 32.0,
            tier_b: 36.0,
            tier_c: 40.0,
        }
    }

    #[test]
    fn zero_spend_starts_tier_a() {
        let pos = resolve_ladder(0.0, &asks());
        assert_eq!(pos.tier, DiscountTier::A);
        assert_eq!(pos.discount, 0.32);
        assert_eq!(pos.progress_pct, 0.0);
        assert_eq!(pos.next_threshold, Some(250_000.0));
    }

    #[test]
    fn threshold_spend_stays_in_lower_tier() {
        let pos = resolve_ladder(250_000.0, &asks());
        assert_eq!(pos.tier, DiscountTier::A);
        assert_eq!(pos.progress_pct, 100.0);
        assert_eq!(pos.next_threshold, Some(0.0));

        let pos = resolve_ladder(1_000_000.0, &asks());
        assert_eq!(pos.tier, DiscountTier::B);
        assert_eq!(pos.progress_pct, 100.0);
    }

    #[test]
    fn one_dollar_past_threshold_advances() {
        let pos = resolve_ladder(250_001.0, &asks());
        assert_eq!(pos.tier, DiscountTier::B);
        assert_eq!(pos.discount, 0.36);
        assert!(pos.progress_pct < 0.001);
        assert_eq!(pos.next_threshold, Some(749_999.0));
    }

    #[test]
    fn ceiling_tier_has_no_next_threshold() {
        let pos = resolve_ladder(1_000_001.0, &asks());
        assert_eq!(pos.tier, DiscountTier::C);
        assert_eq!(pos.discount, 0.40);
        assert_eq!(pos.next_threshold, None);
        assert_eq!(pos.progress_pct, 100.0);
    }

    #[test]
    fn negative_spend_is_clamped() {
        let pos = resolve_ladder(-5_000.0, &asks());
        assert_eq!(pos.tier, DiscountTier::A);
        assert_eq!(pos.progress_pct, 0.0);
    }

    proptest! {
        #[test]
        fn progress_is_bounded(spend in -1e7f64..1e8) {
            let pos = resolve_ladder(spend, &asks());
            prop_assert!((0.0..=100.0).contains(&pos.progress_pct));
            if let Some(distance) = pos.next_threshold {
                prop_assert!(distance >= 0.0);
            } else {
                prop_assert_eq!(pos.tier, DiscountTier::C);
            }
        }
    }
}
