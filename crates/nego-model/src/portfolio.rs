//! Portfolio calculation: catalog entries to projected units and costs.

use crate::drivers::Drivers;
use crate::ladder::{resolve_ladder, DiscountTier, LadderPosition, TierAsks};
use nego_core::{Catalog, ScenarioState, Sku};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Distribution weights for same-theme SKUs carrying "Tier 1".."Tier 10"
/// markers. Descending so lower tiers dominate; the sum stays close to one
/// so a full theme block approximates total usage without double counting.
pub const TIER_WEIGHTS: [f64; 10] = [
    0.16, 0.14, 0.13, 0.11, 0.10, 0.09, 0.08, 0.07, 0.06, 0.05,
];

/// Driver volume a theme draws from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverField {
    SmsStandard,
    SmsTollFree,
    MmsMessages,
    RcsMessages,
    Whatsapp,
    VoiceMinutes,
    VerifyChecks,
    SegmentMtus,
    FlexSeats,
    EmailThousands,
}

impl DriverField {
    pub fn volume(self, drivers: &Drivers) -> f64 {
        match self {
            DriverField::SmsStandard => drivers.sms_standard,
            DriverField::SmsTollFree => drivers.sms_toll_free,
            DriverField::MmsMessages => drivers.mms_messages,
            DriverField::RcsMessages => drivers.rcs_messages,
            DriverField::Whatsapp => drivers.whatsapp,
            DriverField::VoiceMinutes => drivers.voice_minutes,
            DriverField::VerifyChecks => drivers.verify_checks,
            DriverField::SegmentMtus => drivers.segment_mtus,
            DriverField::FlexSeats => drivers.flex_seats,
            DriverField::EmailThousands => drivers.email_thousands,
        }
    }
}

/// How a theme maps onto a driver volume.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThemeRule {
    pub field: DriverField,
    /// Scale applied to the base volume. Themes that shadow a dominant
    /// channel (short code, SIP) use a reduced scale to avoid double
    /// counting against it.
    pub scale: f64,
}

const THEME_RULES: &[(&str, ThemeRule)] = &[
    (
        "SMS Standard",
        ThemeRule {
            field: DriverField::SmsStandard,
            scale: 1.0,
        },
    ),
    (
        "SMS Toll-Free",
        ThemeRule {
            field: DriverField::SmsTollFree,
            scale: 1.0,
        },
    ),
    (
        "SMS Short Code",
        ThemeRule {
            field: DriverField::SmsStandard,
            scale: 0.18,
        },
    ),
    (
        "MMS",
        ThemeRule {
            field: DriverField::MmsMessages,
            scale: 1.0,
        },
    ),
    (
        "RCS",
        ThemeRule {
            field: DriverField::RcsMessages,
            scale: 1.0,
        },
    ),
    (
        "WhatsApp",
        ThemeRule {
            field: DriverField::Whatsapp,
            scale: 1.0,
        },
    ),
    (
        "PSTN Outbound",
        ThemeRule {
            field: DriverField::VoiceMinutes,
            scale: 1.0,
        },
    ),
    (
        "Elastic SIP",
        ThemeRule {
            field: DriverField::VoiceMinutes,
            scale: 0.35,
        },
    ),
    (
        "Verify",
        ThemeRule {
            field: DriverField::VerifyChecks,
            scale: 1.0,
        },
    ),
    (
        "Twilio Segment",
        ThemeRule {
            field: DriverField::SegmentMtus,
            scale: 1.0,
        },
    ),
    (
        "Flex Seats",
        ThemeRule {
            field: DriverField::FlexSeats,
            scale: 1.0,
        },
    ),
    (
        "SendGrid",
        ThemeRule {
            field: DriverField::EmailThousands,
            scale: 1.0,
        },
    ),
];

/// Look up the driver rule for a theme.
///
/// Unrecognized themes deliberately map to standard SMS segments at full
/// scale; the default absorbs unmapped catalog additions instead of
/// dropping them.
pub fn theme_rule(theme: &str) -> ThemeRule {
    for (name, rule) in THEME_RULES {
        if *name == theme {
            return *rule;
        }
    }
    debug!(theme, "unmapped theme, defaulting to standard SMS volume");
    ThemeRule {
        field: DriverField::SmsStandard,
        scale: 1.0,
    }
}

/// Legacy weight extraction from a "Tier N" display-name marker.
///
/// Kept for catalogs that predate the explicit `tier_weight` field; names
/// without a recognizable marker get the Tier-1 weight.
fn tier_weight_from_name(name: &str) -> f64 {
    if let Some(idx) = name.find("Tier ") {
        let digits: String = name[idx + 5..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if let Ok(n) = digits.parse::<usize>() {
            if (1..=TIER_WEIGHTS.len()).contains(&n) {
                return TIER_WEIGHTS[n - 1];
            }
        }
    }
    TIER_WEIGHTS[0]
}

fn sku_weight(sku: &Sku) -> f64 {
    match sku.tier_weight {
        Some(w) => w.max(0.0),
        None => tier_weight_from_name(&sku.name),
    }
}

/// Projected usage and cost for one SKU.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkuUsage {
    pub sku_id: String,
    pub theme: String,
    pub units: f64,
    /// Per-unit rate actually charged: contract rate when locked in,
    /// otherwise rack rate less the ladder discount.
    pub effective_rate: f64,
    pub rack_cost: f64,
    pub effective_cost: f64,
}

/// Aggregate across all portfolio rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub rack_total: f64,
    pub effective_total: f64,
    /// Blended effective cost per message; zero when no message volume.
    pub blended_cpm: f64,
    pub messages_total: f64,
    pub tier: DiscountTier,
    pub discount: f64,
    pub next_threshold: Option<f64>,
    pub progress_pct: f64,
}

/// Per-SKU rows plus the aggregate summary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub rows: Vec<SkuUsage>,
    pub summary: PortfolioSummary,
}

/// Project per-SKU usage and costs for the whole catalog.
pub fn compute_portfolio(catalog: &Catalog, state: &ScenarioState, drivers: &Drivers) -> Portfolio {
    let ladder = resolve_ladder(state.trailing_90, &TierAsks::from_scenario(state));
    compute_portfolio_at(catalog, drivers, &ladder)
}

/// Same as [`compute_portfolio`] with an already-resolved ladder position.
pub fn compute_portfolio_at(
    catalog: &Catalog,
    drivers: &Drivers,
    ladder: &LadderPosition,
) -> Portfolio {
    let mut rows = Vec::with_capacity(catalog.skus.len());
    let mut rack_total = 0.0;
    let mut effective_total = 0.0;

    for sku in &catalog.skus {
        let rule = theme_rule(&sku.theme);
        let units = rule.field.volume(drivers) * rule.scale * sku_weight(sku);
        // A nonzero contract rate is locked pricing and overrides the ladder.
        let effective_rate = if sku.contract_rate > 0.0 {
            sku.contract_rate
        } else {
            sku.rack_rate * (1.0 - ladder.discount)
        };
        let rack_cost = sku.rack_rate * units;
        let effective_cost = effective_rate * units;
        rack_total += rack_cost;
        effective_total += effective_cost;
        rows.push(SkuUsage {
            sku_id: sku.sku_id.clone(),
            theme: sku.theme.clone(),
            units,
            effective_rate,
            rack_cost,
            effective_cost,
        });
    }

    let messages_total = drivers.sms_standard
        + drivers.sms_toll_free
        + drivers.rcs_messages
        + drivers.mms_messages
        + drivers.verify_checks
        + drivers.ai_responses;
    let blended_cpm = if messages_total > 0.0 {
        effective_total / messages_total
    } else {
        0.0
    };

    Portfolio {
        rows,
        summary: PortfolioSummary {
            rack_total,
            effective_total,
            blended_cpm,
            messages_total,
            tier: ladder.tier,
            discount: ladder.discount,
            next_threshold: ladder.next_threshold,
            progress_pct: ladder.progress_pct,
        },
    }
}
