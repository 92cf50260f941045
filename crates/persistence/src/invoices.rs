//! Invoice rollups: derive the trailing-90 spend from billing exports.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

const TRAILING_WINDOW_DAYS: i64 = 90;

/// One line from the billing export.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: String,
    pub date: NaiveDate,
    pub amount_usd: Decimal,
    pub status: String,
}

/// Total across all invoices, rounded to cents.
pub fn invoice_total(invoices: &[Invoice]) -> Decimal {
    invoices
        .iter()
        .map(|inv| inv.amount_usd)
        .sum::<Decimal>()
        .round_dp(2)
}

/// Spend over the 90 days ending at the newest invoice date, in cents.
///
/// The window is anchored to the data rather than the wall clock so a
/// stale export still yields a meaningful trailing figure.
pub fn trailing_90_spend(invoices: &[Invoice]) -> Decimal {
    let Some(latest) = invoices.iter().map(|inv| inv.date).max() else {
        warn!("no invoices in export, trailing spend is zero");
        return Decimal::ZERO;
    };
    let cutoff = latest - chrono::Duration::days(TRAILING_WINDOW_DAYS);
    invoices
        .iter()
        .filter(|inv| inv.date >= cutoff)
        .map(|inv| inv.amount_usd)
        .sum::<Decimal>()
        .round_dp(2)
}
