#![deny(warnings)]

//! Deterministic derivation pipeline for the negotiation dashboard.
//!
//! Raw scenario inputs are transformed into per-channel usage volumes
//! ([`drivers`]), a trailing-spend discount tier ([`ladder`]), per-SKU usage
//! and cost rows with an aggregate summary ([`portfolio`]), and a compounded
//! monthly spend series ([`projection`]). Every function here is pure and
//! synchronous: identical inputs yield bit-identical outputs, and invalid
//! numeric input is clamped rather than rejected.

pub mod drivers;
pub mod ladder;
pub mod portfolio;
pub mod projection;

pub use drivers::{derive_drivers, derive_drivers_with, DriverCalibration, Drivers};
pub use ladder::{resolve_ladder, DiscountTier, LadderPosition, TierAsks, TIER_A_MAX, TIER_B_MAX};
pub use portfolio::{
    compute_portfolio, compute_portfolio_at, theme_rule, DriverField, Portfolio, PortfolioSummary,
    SkuUsage, ThemeRule, TIER_WEIGHTS,
};
pub use projection::{project_spend, MonthSpend};
