//! Built-in SKU catalog for offline runs.
//!
//! Generates the same normalized 120-entry price list the catalog pipeline
//! publishes: 12 product blocks of 10 tiers each, with half-up rate
//! quantization to six decimals and ladder snapshots at +0, +500, and
//! +900 basis points over the block's base discount. Offered only when a
//! caller explicitly asks for it; a failed catalog fetch never silently
//! degrades to these fixtures.

use nego_core::{Catalog, LadderSnapshot, Sku};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

struct Block {
    category: &'static str,
    theme: &'static str,
    prefix: &'static str,
    unit: &'static str,
    rack_start: Decimal,
    rack_step: Decimal,
    contract_discount: Decimal,
    ladder_discount: Decimal,
    count: u32,
    locked_every: u32,
}

fn quantize(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(6, RoundingStrategy::MidpointAwayFromZero)
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn expand(block: &Block, offset: u32, out: &mut Vec<Sku>) {
    let tier_b_bump = Decimal::new(5, 2);
    let tier_c_bump = Decimal::new(9, 2);
    for index in 0..block.count {
        let sku_index = offset + index + 1;
        let rack = quantize(block.rack_start + block.rack_step * Decimal::from(index));
        let contract_rate = quantize(rack * (Decimal::ONE - block.contract_discount));
        let price_after_discount = quantize(rack * (Decimal::ONE - block.ladder_discount));
        let locked = block.locked_every > 0 && (index + 1) % block.locked_every == 0;
        let discount_pct = to_f64(block.ladder_discount * Decimal::from(100));
        out.push(Sku {
            sku_id: format!("{}-{sku_index:03}", block.prefix),
            name: format!("{} Tier {}", block.theme, index + 1),
            category: block.category.to_string(),
            theme: block.theme.to_string(),
            unit: block.unit.to_string(),
            rack_rate: to_f64(rack),
            contract_rate: to_f64(contract_rate),
            discount_rate: to_f64(block.ladder_discount),
            price_after_discount: to_f64(price_after_discount),
            ladder: LadderSnapshot {
                tier_a: to_f64(block.ladder_discount),
                tier_b: to_f64(block.ladder_discount + tier_b_bump),
                tier_c: to_f64(block.ladder_discount + tier_c_bump),
            },
            locked,
            tier_weight: None,
            notes: Some(format!(
                "{} negotiated unit for portfolio ladder at {discount_pct:.0}% discount.",
                block.theme
            )),
        });
    }
}

/// The full offline catalog: exactly 120 SKUs across all product blocks.
pub fn builtin_catalog() -> Catalog {
    let blocks = [
        Block {
            category: "Messaging",
            theme: "SMS Standard",
            prefix: "SMSSTD",
            unit: "message",
            rack_start: Decimal::new(72, 4),
            rack_step: Decimal::new(5, 5),
            contract_discount: Decimal::new(34, 2),
            ladder_discount: Decimal::new(32, 2),
            count: 10,
            locked_every: 5,
        },
        Block {
            category: "Messaging",
            theme: "SMS Toll-Free",
            prefix: "SMSTF",
            unit: "message",
            rack_start: Decimal::new(89, 4),
            rack_step: Decimal::new(4, 5),
            contract_discount: Decimal::new(36, 2),
            ladder_discount: Decimal::new(33, 2),
            count: 10,
            locked_every: 5,
        },
        Block {
            category: "Messaging",
            theme: "SMS Short Code",
            prefix: "SMSSC",
            unit: "message",
            rack_start: Decimal::new(95, 4),
            rack_step: Decimal::new(8, 5),
            contract_discount: Decimal::new(40, 2),
            ladder_discount: Decimal::new(35, 2),
            count: 10,
            locked_every: 5,
        },
        Block {
            category: "Messaging",
            theme: "MMS",
            prefix: "MMS",
            unit: "message",
            rack_start: Decimal::new(15, 3),
            rack_step: Decimal::new(12, 5),
            contract_discount: Decimal::new(33, 2),
            ladder_discount: Decimal::new(30, 2),
            count: 10,
            locked_every: 5,
        },
        Block {
            category: "Messaging",
            theme: "RCS",
            prefix: "RCS",
            unit: "session",
            rack_start: Decimal::new(35, 3),
            rack_step: Decimal::new(3, 4),
            contract_discount: Decimal::new(38, 2),
            ladder_discount: Decimal::new(34, 2),
            count: 10,
            locked_every: 0,
        },
        Block {
            category: "Messaging",
            theme: "WhatsApp",
            prefix: "WA",
            unit: "conversation",
            rack_start: Decimal::new(43, 3),
            rack_step: Decimal::new(35, 5),
            contract_discount: Decimal::new(31, 2),
            ladder_discount: Decimal::new(29, 2),
            count: 10,
            locked_every: 0,
        },
        Block {
            category: "Voice",
            theme: "PSTN Outbound",
            prefix: "VOIPSTN",
            unit: "minute",
            rack_start: Decimal::new(18, 3),
            rack_step: Decimal::new(1, 4),
            contract_discount: Decimal::new(37, 2),
            ladder_discount: Decimal::new(33, 2),
            count: 10,
            locked_every: 0,
        },
        Block {
            category: "Voice",
            theme: "Elastic SIP",
            prefix: "VOISIP",
            unit: "minute",
            rack_start: Decimal::new(14, 3),
            rack_step: Decimal::new(8, 5),
            contract_discount: Decimal::new(35, 2),
            ladder_discount: Decimal::new(31, 2),
            count: 10,
            locked_every: 0,
        },
        Block {
            category: "Trust & Safety",
            theme: "Verify",
            prefix: "VERIFY",
            unit: "verification",
            rack_start: Decimal::new(45, 3),
            rack_step: Decimal::new(4, 4),
            contract_discount: Decimal::new(30, 2),
            ladder_discount: Decimal::new(27, 2),
            count: 10,
            locked_every: 0,
        },
        Block {
            category: "Data & AI",
            theme: "Twilio Segment",
            prefix: "SEG",
            unit: "mtu",
            rack_start: Decimal::new(35, 3),
            rack_step: Decimal::new(25, 5),
            contract_discount: Decimal::new(28, 2),
            ladder_discount: Decimal::new(26, 2),
            count: 10,
            locked_every: 0,
        },
        Block {
            category: "Engagement",
            theme: "Flex Seats",
            prefix: "FLEX",
            unit: "agent",
            rack_start: Decimal::new(150, 0),
            rack_step: Decimal::new(16, 1),
            contract_discount: Decimal::new(22, 2),
            ladder_discount: Decimal::new(20, 2),
            count: 10,
            locked_every: 5,
        },
        Block {
            category: "Email",
            theme: "SendGrid",
            prefix: "EMAIL",
            unit: "thousand-emails",
            rack_start: Decimal::new(112, 2),
            rack_step: Decimal::new(8, 3),
            contract_discount: Decimal::new(25, 2),
            ladder_discount: Decimal::new(22, 2),
            count: 10,
            locked_every: 0,
        },
    ];

    let mut skus = Vec::with_capacity(120);
    let mut offset = 0;
    for block in &blocks {
        expand(block, offset, &mut skus);
        offset += block.count;
    }

    Catalog {
        generated_at: "builtin".to_string(),
        skus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nego_core::{validate_catalog, MIN_CATALOG_SKUS};

    #[test]
    fn builtin_catalog_has_exactly_120_valid_skus() {
        let catalog = builtin_catalog();
        assert_eq!(catalog.skus.len(), MIN_CATALOG_SKUS);
        validate_catalog(&catalog).unwrap();
    }

    #[test]
    fn sku_ids_are_sequential_within_a_block() {
        let catalog = builtin_catalog();
        assert_eq!(catalog.skus[0].sku_id, "SMSSTD-001");
        assert_eq!(catalog.skus[9].sku_id, "SMSSTD-010");
        assert_eq!(catalog.skus[10].sku_id, "SMSTF-011");
        assert_eq!(catalog.skus[119].sku_id, "EMAIL-120");
    }

    #[test]
    fn locked_blocks_lock_every_fifth_sku() {
        let catalog = builtin_catalog();
        let standard: Vec<_> = catalog
            .skus
            .iter()
            .filter(|s| s.theme == "SMS Standard")
            .collect();
        let locked: Vec<bool> = standard.iter().map(|s| s.locked).collect();
        assert_eq!(
            locked,
            [false, false, false, false, true, false, false, false, false, true]
        );
        assert!(catalog
            .skus
            .iter()
            .filter(|s| s.theme == "RCS")
            .all(|s| !s.locked));
    }

    #[test]
    fn rates_step_up_within_a_block() {
        let catalog = builtin_catalog();
        assert_eq!(catalog.skus[0].rack_rate, 0.0072);
        assert_eq!(catalog.skus[1].rack_rate, 0.00725);
        // Contract rate carries the 34% block discount.
        assert_eq!(catalog.skus[0].contract_rate, 0.004752);
    }

    #[test]
    fn ladder_snapshot_bumps_by_tier() {
        let catalog = builtin_catalog();
        let first = &catalog.skus[0];
        assert_eq!(first.ladder.tier_a, 0.32);
        assert_eq!(first.ladder.tier_b, 0.37);
        assert_eq!(first.ladder.tier_c, 0.41);
    }

    #[test]
    fn names_carry_the_tier_marker() {
        let catalog = builtin_catalog();
        assert_eq!(catalog.skus[0].name, "SMS Standard Tier 1");
        assert_eq!(catalog.skus[9].name, "SMS Standard Tier 10");
    }
}
