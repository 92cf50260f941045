//! Spend projection: compound monthly growth over a fixed horizon.

use serde::{Deserialize, Serialize};

/// One month of projected spend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthSpend {
    /// 1-based month index.
    pub month: u32,
    pub spend: f64,
    /// Running sum through this month.
    pub cumulative: f64,
}

/// Compound the starting spend over `months` months at `growth_pct` per
/// month.
///
/// Month 1 is the start spend unmodified; month N is
/// `start * (1 + g/100)^(N-1)`. The cumulative column is a running sum
/// because consumers need the full monthly series, not just a total.
pub fn project_spend(start: f64, growth_pct: f64, months: u32) -> Vec<MonthSpend> {
    let months = months.max(1);
    let factor = 1.0 + growth_pct / 100.0;
    let start = start.max(0.0);

    let mut series = Vec::with_capacity(months as usize);
    let mut spend = start;
    let mut cumulative = 0.0;
    for month in 1..=months {
        if month > 1 {
            spend *= factor;
        }
        cumulative += spend;
        series.push(MonthSpend {
            month,
            spend,
            cumulative,
        });
    }
    series
}
