//! Trailing-90-day spend feed.
//!
//! The figure arrives as a plain-text number from the billing export. The
//! feed is allowed to be down: a failed refresh keeps the last known value
//! and the provenance tells readers how stale the number is.

use nego_core::Provenance;
use tracing::{info, warn};

/// Last known trailing-90 spend plus where it came from.
pub struct TrailingSpend {
    http: reqwest::Client,
    url: Option<String>,
    last_known: f64,
    provenance: Provenance,
}

impl TrailingSpend {
    pub fn new(http: reqwest::Client, url: Option<String>) -> Self {
        Self {
            http,
            url,
            last_known: 0.0,
            provenance: Provenance::Heuristic,
        }
    }

    /// Seed the feed with a locally computed figure, e.g. an invoice rollup.
    pub fn seed(&mut self, value: f64) {
        if value.is_finite() && value >= 0.0 {
            self.last_known = value;
            self.provenance = Provenance::Cached;
        }
    }

    pub fn value(&self) -> f64 {
        self.last_known
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Re-fetch the figure. Keeps the previous value on any failure.
    pub async fn refresh(&mut self) -> f64 {
        let Some(url) = &self.url else {
            return self.last_known;
        };
        match self.fetch(url).await {
            Ok(value) => {
                self.last_known = value;
                self.provenance = Provenance::Live;
                info!(value, "trailing spend refreshed");
            }
            Err(err) => {
                warn!(%err, last_known = self.last_known, "trailing spend refresh failed");
            }
        }
        self.last_known
    }

    async fn fetch(&self, url: &str) -> Result<f64, String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("unexpected status: {}", response.status()));
        }
        let text = response.text().await.map_err(|e| e.to_string())?;
        parse_spend(&text).ok_or_else(|| format!("unparseable spend payload: {text:?}"))
    }
}

/// Parse a plain-text spend figure. Rejects non-finite and negative values.
pub fn parse_spend(text: &str) -> Option<f64> {
    let value: f64 = text.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trimmed_numeric_payloads() {
        assert_eq!(parse_spend("181250.75"), Some(181250.75));
        assert_eq!(parse_spend(" 42 \n"), Some(42.0));
        assert_eq!(parse_spend("0"), Some(0.0));
    }

    #[test]
    fn rejects_garbage_negative_and_non_finite() {
        assert_eq!(parse_spend("not a number"), None);
        assert_eq!(parse_spend("-5.0"), None);
        assert_eq!(parse_spend("NaN"), None);
        assert_eq!(parse_spend("inf"), None);
        assert_eq!(parse_spend(""), None);
    }

    #[tokio::test]
    async fn refresh_without_a_source_keeps_the_seeded_value() {
        let mut feed = TrailingSpend::new(reqwest::Client::new(), None);
        assert_eq!(feed.provenance(), Provenance::Heuristic);

        feed.seed(123_456.78);
        assert_eq!(feed.refresh().await, 123_456.78);
        assert_eq!(feed.provenance(), Provenance::Cached);
    }

    #[test]
    fn seed_ignores_invalid_figures() {
        let mut feed = TrailingSpend::new(reqwest::Client::new(), None);
        feed.seed(1000.0);
        feed.seed(f64::NAN);
        feed.seed(-1.0);
        assert_eq!(feed.value(), 1000.0);
    }
}
