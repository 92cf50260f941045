#![deny(warnings)]

//! Negotiation envelope provider.
//!
//! Attempts the remote negotiation service first and falls back to a local
//! deterministic formula on any failure, so the caller always receives a
//! usable envelope. The provenance of the result (live vs. heuristic) is
//! explicit, and a generation counter implements last-write-wins for
//! requests that were superseded while in flight.

use async_trait::async_trait;
use nego_core::{Provenance, ScenarioEnvelope, ScenarioState};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

/// Cap on the fallback target discount.
const TARGET_DISCOUNT_CAP: f64 = 0.6;
/// Cap on the trailing-spend uplift added to the portfolio ask.
const TRAILING_UPLIFT_CAP: f64 = 0.1;
/// Trailing dollars per point of uplift.
const TRAILING_UPLIFT_SCALE: f64 = 5_000_000.0;
/// Heuristic trailing spend when none is known: a quarter of revenue.
const TRAILING_DEFAULT_FRACTION: f64 = 0.25;
const FLOOR_DISCOUNT_MIN: f64 = 0.1;
const FLOOR_OFFSET: f64 = 0.08;
const CEILING_DISCOUNT_MAX: f64 = 0.75;
const CEILING_OFFSET: f64 = 0.05;
/// Margins reported by the fallback path only; the remote service returns
/// its own.
const FALLBACK_CURRENT_MARGIN: f64 = 0.32;
const FALLBACK_TARGET_MARGIN: f64 = 0.45;

/// Errors from the remote negotiation API.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status: {0}")]
    Status(u16),
    #[error("malformed envelope payload: {0}")]
    MalformedPayload(String),
}

/// Seam for the remote negotiation service.
#[async_trait]
pub trait EnvelopeApi: Send + Sync {
    async fn negotiate(&self, state: &ScenarioState) -> Result<ScenarioEnvelope, EnvelopeError>;
}

/// HTTP client for the negotiation endpoint.
///
/// The `reqwest::Client` is constructed once by the composition root and
/// injected; the same client is reused for the process lifetime.
pub struct HttpEnvelopeApi {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct EnvelopeResponse {
    envelope: ScenarioEnvelope,
}

impl HttpEnvelopeApi {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl EnvelopeApi for HttpEnvelopeApi {
    async fn negotiate(&self, state: &ScenarioState) -> Result<ScenarioEnvelope, EnvelopeError> {
        let url = format!("{}/api/negotiation/envelope", self.base_url);
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({ "scenario": state }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(EnvelopeError::Status(response.status().as_u16()));
        }
        let payload: EnvelopeResponse = response
            .json()
            .await
            .map_err(|e| EnvelopeError::MalformedPayload(e.to_string()))?;
        Ok(payload.envelope)
    }
}

/// Local deterministic envelope used when the remote service is unreachable
/// or returns garbage.
///
/// The target discount starts from the Tier A ask and scales up slightly
/// with trailing spend, capped; floor and ceiling bracket it at fixed
/// offsets. Margins are fixed constants on this path.
pub fn fallback_envelope(state: &ScenarioState) -> ScenarioEnvelope {
    let portfolio_discount = state.ask_tier_a.max(0.0) / 100.0;
    let average_revenue =
        state.leads as f64 * (state.conversion_rate.max(0.0) / 100.0) * state.revenue_per_sale.max(0.0);
    let trailing = if state.trailing_90 > 0.0 {
        state.trailing_90
    } else {
        average_revenue * TRAILING_DEFAULT_FRACTION
    };
    let target_discount = (portfolio_discount
        + (trailing / TRAILING_UPLIFT_SCALE).min(TRAILING_UPLIFT_CAP))
    .min(TARGET_DISCOUNT_CAP);
    let floor_discount = (target_discount - FLOOR_OFFSET).max(FLOOR_DISCOUNT_MIN);
    let ceiling_discount = (target_discount + CEILING_OFFSET).min(CEILING_DISCOUNT_MAX);

    ScenarioEnvelope {
        target_discount,
        floor_discount,
        ceiling_discount,
        target_revenue: average_revenue * (1.0 - target_discount),
        floor_revenue: average_revenue * (1.0 - floor_discount),
        ceiling_revenue: average_revenue * (1.0 - ceiling_discount),
        current_margin: FALLBACK_CURRENT_MARGIN,
        target_margin: FALLBACK_TARGET_MARGIN,
    }
}

/// An envelope together with the path that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedEnvelope {
    pub envelope: ScenarioEnvelope,
    pub provenance: Provenance,
}

/// Provider wrapping a remote API with the local fallback.
pub struct EnvelopeProvider<A: EnvelopeApi> {
    api: A,
    generation: AtomicU64,
}

impl<A: EnvelopeApi> EnvelopeProvider<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            generation: AtomicU64::new(0),
        }
    }

    /// Resolve an envelope for the scenario. Never fails: any remote error
    /// is logged and answered with the heuristic fallback.
    pub async fn resolve(&self, state: &ScenarioState) -> ResolvedEnvelope {
        match self.api.negotiate(state).await {
            Ok(envelope) => ResolvedEnvelope {
                envelope,
                provenance: Provenance::Live,
            },
            Err(err) => {
                warn!(%err, "remote negotiation failed, using local fallback");
                ResolvedEnvelope {
                    envelope: fallback_envelope(state),
                    provenance: Provenance::Heuristic,
                }
            }
        }
    }

    /// Last-write-wins variant: returns `None` when a newer scenario was
    /// submitted while this request was in flight, so stale results are
    /// discarded instead of overwriting fresher ones.
    pub async fn resolve_latest(&self, state: &ScenarioState) -> Option<ResolvedEnvelope> {
        let submitted = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let resolved = self.resolve(state).await;
        if self.generation.load(Ordering::SeqCst) == submitted {
            Some(resolved)
        } else {
            debug!("discarding superseded envelope result");
            None
        }
    }
}
