#![deny(warnings)]

//! Core domain models and invariants for the negotiation scenario engine.
//!
//! This crate defines the serializable records shared across the workspace
//! with validation helpers to guarantee basic invariants: the scenario input
//! record, the SKU catalog, the negotiation envelope, and the provenance tag
//! attached to values that can come from a fallback chain.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Minimum number of SKUs a catalog must carry to be usable.
pub const MIN_CATALOG_SKUS: usize = 120;

/// Flat record of raw scenario inputs.
///
/// Field names on the wire are camelCase, matching the scenario payloads
/// produced by the prior dashboard so cached records load unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioState {
    /// Contract start slot, "sep1" or "sep15".
    pub start_date: String,
    /// Trailing-90-day spend in USD.
    pub trailing_90: f64,
    /// Monthly lead volume.
    pub leads: u64,
    /// Average words per outbound message.
    pub words_per_outbound: f64,
    pub conversations_per_lead: f64,
    pub outbound_per_conversation: f64,
    pub inbound_per_conversation: f64,
    /// RCS adoption fraction in [0,1].
    pub rcs_adoption: f64,
    /// MMS share of non-RCS outbound in [0,1].
    pub mms_share: f64,
    /// Toll-free share of SMS segments in [0,1].
    pub toll_free_share: f64,
    pub verify_attempts_per_lead: f64,
    /// Verification success rate in [0,1].
    pub verify_success_rate: f64,
    pub ai_replies_per_conversation: f64,
    pub lookups_per_lead: f64,
    pub calls_per_lead: f64,
    pub minutes_per_call: f64,
    pub campaigns_active: f64,
    /// Tier A discount ask, percent in [0,100].
    pub ask_tier_a: f64,
    /// Tier B discount ask, percent in [0,100].
    pub ask_tier_b: f64,
    /// Tier C discount ask, percent in [0,100].
    pub ask_tier_c: f64,
    /// Engagement rate, percent.
    pub engagement_rate: f64,
    /// Lead-to-sale conversion rate, percent.
    pub conversion_rate: f64,
    /// Revenue per closed sale in USD.
    pub revenue_per_sale: f64,
    /// First projected month's spend in USD.
    pub projection_start_spend: f64,
    /// Monthly spend growth, percent.
    pub projection_growth: f64,
    /// Projection horizon in months (>= 1).
    pub projection_months: u32,
}

impl Default for ScenarioState {
    fn default() -> Self {
        Self {
            start_date: "sep1".to_string(),
            trailing_90: 180_000.0,
            leads: 40_000,
            words_per_outbound: 24.0,
            conversations_per_lead: 1.6,
            outbound_per_conversation: 3.2,
            inbound_per_conversation: 1.1,
            rcs_adoption: 0.18,
            mms_share: 0.12,
            toll_free_share: 0.4,
            verify_attempts_per_lead: 0.9,
            verify_success_rate: 0.92,
            ai_replies_per_conversation: 1.4,
            lookups_per_lead: 0.6,
            calls_per_lead: 0.25,
            minutes_per_call: 2.4,
            campaigns_active: 6.0,
            ask_tier_a: 32.0,
            ask_tier_b: 36.0,
            ask_tier_c: 40.0,
            engagement_rate: 48.0,
            conversion_rate: 2.4,
            revenue_per_sale: 180.0,
            projection_start_spend: 185_000.0,
            projection_growth: 6.0,
            projection_months: 24,
        }
    }
}

impl ScenarioState {
    /// Coerce non-finite numeric inputs to zero at the boundary.
    ///
    /// Invalid user input never propagates into the computation core; the
    /// consuming formulas additionally clamp ranges themselves.
    pub fn sanitize(&mut self) {
        for field in [
            &mut self.trailing_90,
            &mut self.words_per_outbound,
            &mut self.conversations_per_lead,
            &mut self.outbound_per_conversation,
            &mut self.inbound_per_conversation,
            &mut self.rcs_adoption,
            &mut self.mms_share,
            &mut self.toll_free_share,
            &mut self.verify_attempts_per_lead,
            &mut self.verify_success_rate,
            &mut self.ai_replies_per_conversation,
            &mut self.lookups_per_lead,
            &mut self.calls_per_lead,
            &mut self.minutes_per_call,
            &mut self.campaigns_active,
            &mut self.ask_tier_a,
            &mut self.ask_tier_b,
            &mut self.ask_tier_c,
            &mut self.engagement_rate,
            &mut self.conversion_rate,
            &mut self.revenue_per_sale,
            &mut self.projection_start_spend,
            &mut self.projection_growth,
        ] {
            if !field.is_finite() {
                debug!("coerced non-finite scenario input to 0");
                *field = 0.0;
            }
        }
        if self.projection_months == 0 {
            self.projection_months = 1;
        }
    }
}

/// Three-tier discount snapshot carried by each catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LadderSnapshot {
    pub tier_a: f64,
    pub tier_b: f64,
    pub tier_c: f64,
}

/// A catalog entry for one billable Twilio unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sku {
    pub sku_id: String,
    /// Display name; may carry a legacy "Tier N" marker.
    pub name: String,
    pub category: String,
    /// Channel grouping key used to select a driver volume.
    pub theme: String,
    /// Billable unit label, e.g. "message" or "minute".
    pub unit: String,
    /// Undiscounted list price per unit, >= 0.
    pub rack_rate: f64,
    /// Pre-negotiated fixed rate; nonzero values override ladder discounting.
    pub contract_rate: f64,
    /// Ladder discount fraction in [0,1].
    pub discount_rate: f64,
    pub price_after_discount: f64,
    pub ladder: LadderSnapshot,
    #[serde(default)]
    pub locked: bool,
    /// Explicit distribution weight; falls back to name parsing when absent.
    #[serde(default)]
    pub tier_weight: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A fetched SKU price list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub generated_at: String,
    pub skus: Vec<Sku>,
}

/// Negotiation envelope: target/floor/ceiling discounts and revenues plus
/// the current and targeted margin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEnvelope {
    pub target_discount: f64,
    pub floor_discount: f64,
    pub ceiling_discount: f64,
    pub target_revenue: f64,
    pub floor_revenue: f64,
    pub ceiling_revenue: f64,
    pub current_margin: f64,
    pub target_margin: f64,
}

/// Where a value came from when fallback chains are involved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Fetched from the remote service during this cycle.
    Live,
    /// Served from a previously stored copy.
    Cached,
    /// Computed locally from the deterministic fallback formula.
    Heuristic,
}

impl Provenance {
    pub fn label(self) -> &'static str {
        match self {
            Provenance::Live => "live",
            Provenance::Cached => "cached",
            Provenance::Heuristic => "heuristic",
        }
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Catalog is below the schema-enforced minimum size.
    #[error("catalog has {found} SKUs, minimum is {MIN_CATALOG_SKUS}")]
    CatalogTooSmall { found: usize },
    /// Discount fraction must be within [0, 1].
    #[error("sku {0}: discount rate out of [0,1]")]
    DiscountOutOfRange(String),
    /// Rack and contract rates must be non-negative.
    #[error("sku {0}: negative rate")]
    NegativeRate(String),
    /// Numeric field must be finite.
    #[error("non-finite numeric value encountered")]
    NonFinite,
}

/// Validate a single catalog entry.
pub fn validate_sku(sku: &Sku) -> Result<(), ValidationError> {
    if !(sku.rack_rate.is_finite() && sku.contract_rate.is_finite() && sku.discount_rate.is_finite())
    {
        return Err(ValidationError::NonFinite);
    }
    if sku.rack_rate < 0.0 || sku.contract_rate < 0.0 {
        return Err(ValidationError::NegativeRate(sku.sku_id.clone()));
    }
    if !(0.0..=1.0).contains(&sku.discount_rate) {
        return Err(ValidationError::DiscountOutOfRange(sku.sku_id.clone()));
    }
    if let Some(w) = sku.tier_weight {
        if !w.is_finite() || w < 0.0 {
            return Err(ValidationError::NonFinite);
        }
    }
    Ok(())
}

/// Validate a full catalog, including the minimum-size bound.
pub fn validate_catalog(catalog: &Catalog) -> Result<(), ValidationError> {
    if catalog.skus.len() < MIN_CATALOG_SKUS {
        return Err(ValidationError::CatalogTooSmall {
            found: catalog.skus.len(),
        });
    }
    for sku in &catalog.skus {
        validate_sku(sku)?;
    }
    Ok(())
}

/// Validate a scenario record after boundary sanitization.
pub fn validate_scenario(state: &ScenarioState) -> Result<(), ValidationError> {
    let fields = [
        state.trailing_90,
        state.words_per_outbound,
        state.conversations_per_lead,
        state.outbound_per_conversation,
        state.inbound_per_conversation,
        state.rcs_adoption,
        state.mms_share,
        state.toll_free_share,
        state.verify_attempts_per_lead,
        state.verify_success_rate,
        state.ai_replies_per_conversation,
        state.lookups_per_lead,
        state.calls_per_lead,
        state.minutes_per_call,
        state.campaigns_active,
        state.ask_tier_a,
        state.ask_tier_b,
        state.ask_tier_c,
        state.engagement_rate,
        state.conversion_rate,
        state.revenue_per_sale,
        state.projection_start_spend,
        state.projection_growth,
    ];
    if fields.iter().any(|v| !v.is_finite()) {
        return Err(ValidationError::NonFinite);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sku(id: &str) -> Sku {
        Sku {
            sku_id: id.to_string(),
            name: format!("SMS Standard Tier 1 ({id})"),
            category: "Messaging".to_string(),
            theme: "SMS Standard".to_string(),
            unit: "message".to_string(),
            rack_rate: 0.0072,
            contract_rate: 0.004752,
            discount_rate: 0.32,
            price_after_discount: 0.004896,
            ladder: LadderSnapshot {
                tier_a: 0.32,
                tier_b: 0.37,
                tier_c: 0.41,
            },
            locked: false,
            tier_weight: None,
            notes: None,
        }
    }

    #[test]
    fn scenario_wire_names_are_camel_case() {
        let state = ScenarioState::default();
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"wordsPerOutbound\""));
        assert!(json.contains("\"trailing90\""));
        assert!(json.contains("\"askTierA\""));
        assert!(!json.contains("words_per_outbound"));
    }

    #[test]
    fn scenario_serde_roundtrip_is_identical() {
        let state = ScenarioState::default();
        let json = serde_json::to_string(&state).unwrap();
        let back: ScenarioState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn sanitize_coerces_non_finite_input() {
        let mut state = ScenarioState {
            conversations_per_lead: f64::NAN,
            projection_growth: f64::INFINITY,
            projection_months: 0,
            ..ScenarioState::default()
        };
        state.sanitize();
        assert_eq!(state.conversations_per_lead, 0.0);
        assert_eq!(state.projection_growth, 0.0);
        assert_eq!(state.projection_months, 1);
        validate_scenario(&state).unwrap();
    }

    #[test]
    fn catalog_below_minimum_is_rejected() {
        let catalog = Catalog {
            generated_at: "test".to_string(),
            skus: (0..119).map(|i| sku(&format!("SKU-{i:03}"))).collect(),
        };
        assert_eq!(
            validate_catalog(&catalog),
            Err(ValidationError::CatalogTooSmall { found: 119 })
        );
    }

    #[test]
    fn catalog_at_minimum_is_accepted() {
        let catalog = Catalog {
            generated_at: "test".to_string(),
            skus: (0..MIN_CATALOG_SKUS)
                .map(|i| sku(&format!("SKU-{i:03}")))
                .collect(),
        };
        validate_catalog(&catalog).unwrap();
    }

    #[test]
    fn sku_discount_out_of_range_is_rejected() {
        let mut bad = sku("SKU-001");
        bad.discount_rate = 1.2;
        assert_eq!(
            validate_sku(&bad),
            Err(ValidationError::DiscountOutOfRange("SKU-001".to_string()))
        );
        bad.discount_rate = 0.32;
        bad.rack_rate = -0.01;
        assert_eq!(
            validate_sku(&bad),
            Err(ValidationError::NegativeRate("SKU-001".to_string()))
        );
    }

    #[test]
    fn sku_optional_fields_default_when_absent() {
        let json = r#"{
            "sku_id": "SMSSTD-001",
            "name": "SMS Standard Tier 1",
            "category": "Messaging",
            "theme": "SMS Standard",
            "unit": "message",
            "rack_rate": 0.0072,
            "contract_rate": 0.004752,
            "discount_rate": 0.32,
            "price_after_discount": 0.004896,
            "ladder": {"tier_a": 0.32, "tier_b": 0.37, "tier_c": 0.41}
        }"#;
        let parsed: Sku = serde_json::from_str(json).unwrap();
        assert!(!parsed.locked);
        assert_eq!(parsed.tier_weight, None);
        assert_eq!(parsed.notes, None);
    }

    proptest! {
        #[test]
        fn sanitize_always_yields_valid_scenario(
            ratio in prop::num::f64::ANY,
            growth in prop::num::f64::ANY,
        ) {
            let mut state = ScenarioState {
                rcs_adoption: ratio,
                projection_growth: growth,
                ..ScenarioState::default()
            };
            state.sanitize();
            prop_assert!(validate_scenario(&state).is_ok());
        }

        #[test]
        fn sku_in_range_validates(rack in 0.0f64..1000.0, disc in 0.0f64..=1.0) {
            let mut s = sku("SKU-P");
            s.rack_rate = rack;
            s.discount_rate = disc;
            prop_assert!(validate_sku(&s).is_ok());
        }
    }
}
