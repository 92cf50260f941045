#![deny(warnings)]

//! Headless negotiation dashboard: derives channel volumes from a scenario,
//! prices the catalog against the discount ladder, projects spend, and
//! resolves the negotiation envelope with its local fallback.

use anyhow::{Context, Result};
use nego_core::{Provenance, ScenarioState};
use nego_envelope::{fallback_envelope, EnvelopeProvider, HttpEnvelopeApi, ResolvedEnvelope};
use nego_model::{compute_portfolio_at, derive_drivers, project_spend, resolve_ladder, TierAsks};
use persistence::{
    builtin_catalog, trailing_90_spend, CatalogLoader, FileScenarioStore, Invoice,
    RemoteScenarioStore, TieredScenarioStore, TrailingSpend,
};
use rust_decimal::prelude::ToPrimitive;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

struct Args {
    scenario: Option<PathBuf>,
    catalog: Option<PathBuf>,
    invoices: Option<PathBuf>,
    months: Option<u32>,
    offline: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        scenario: None,
        catalog: None,
        invoices: None,
        months: None,
        offline: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--scenario" => args.scenario = it.next().map(PathBuf::from),
            "--catalog" => args.catalog = it.next().map(PathBuf::from),
            "--invoices" => args.invoices = it.next().map(PathBuf::from),
            "--months" => args.months = it.next().and_then(|s| s.parse().ok()),
            "--offline" => args.offline = true,
            _ => {}
        }
    }
    args
}

/// Service endpoints and the cache location, all overridable from the
/// environment.
struct Config {
    api_base: Option<String>,
    supabase_url: Option<String>,
    supabase_key: Option<String>,
    catalog_url: Option<String>,
    trailing_url: Option<String>,
    cache_path: PathBuf,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl Config {
    fn from_env() -> Self {
        Self {
            api_base: env_var("NEGOTIATION_API_BASE"),
            supabase_url: env_var("SUPABASE_URL"),
            supabase_key: env_var("SUPABASE_KEY"),
            catalog_url: env_var("CATALOG_URL"),
            trailing_url: env_var("TRAILING_SPEND_URL"),
            cache_path: env_var("SCENARIO_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".cache/scenario.json")),
        }
    }
}

/// Where the catalog comes from. Builtin fixtures are opt-in via
/// `--offline`; an unconfigured online run is an error, never a silent
/// fixture fallback.
#[derive(Debug, PartialEq)]
enum CatalogSource {
    Path(PathBuf),
    Url(String),
    Builtin,
}

fn choose_catalog_source(args: &Args, config: &Config) -> Result<CatalogSource> {
    if let Some(path) = &args.catalog {
        return Ok(CatalogSource::Path(path.clone()));
    }
    if args.offline {
        return Ok(CatalogSource::Builtin);
    }
    if let Some(url) = &config.catalog_url {
        return Ok(CatalogSource::Url(url.clone()));
    }
    anyhow::bail!("no catalog source: pass --catalog, set CATALOG_URL, or run --offline")
}

fn money(value: f64) -> String {
    format!("${value:.2}")
}

fn pct(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_args();
    let config = Config::from_env();
    let http = reqwest::Client::new();

    let loader = CatalogLoader::new(http.clone());
    let catalog = match choose_catalog_source(&args, &config)? {
        CatalogSource::Path(path) => loader
            .load_path(&path)
            .await
            .with_context(|| format!("loading catalog from {}", path.display()))?,
        CatalogSource::Url(url) => loader
            .fetch(&url)
            .await
            .with_context(|| format!("fetching catalog from {url}"))?,
        CatalogSource::Builtin => {
            info!("offline run, using builtin catalog fixtures");
            builtin_catalog()
        }
    };

    let remote = match (&config.supabase_url, &config.supabase_key, args.offline) {
        (Some(url), Some(key), false) => {
            Some(RemoteScenarioStore::new(http.clone(), url.clone(), key.clone()))
        }
        _ => None,
    };
    let store = TieredScenarioStore::new(remote, FileScenarioStore::new(&config.cache_path));

    let (mut state, source) = if let Some(path) = &args.scenario {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading scenario from {}", path.display()))?;
        let state: ScenarioState = serde_json::from_str(&text).context("parsing scenario file")?;
        (state, "file")
    } else {
        match store.load().await {
            Some((state, provenance)) => (state, provenance.label()),
            None => (ScenarioState::default(), "defaults"),
        }
    };
    state.sanitize();

    // Trailing-90 spend: seed from an invoice export if provided, then let
    // the live feed override when reachable.
    let mut trailing = TrailingSpend::new(
        http.clone(),
        if args.offline {
            None
        } else {
            config.trailing_url.clone()
        },
    );
    if let Some(path) = &args.invoices {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading invoices from {}", path.display()))?;
        let invoices: Vec<Invoice> =
            serde_json::from_str(&text).context("parsing invoice export")?;
        let rollup = trailing_90_spend(&invoices).to_f64().unwrap_or(0.0);
        info!(invoices = invoices.len(), rollup, "invoice rollup computed");
        trailing.seed(rollup);
    }
    trailing.refresh().await;
    if trailing.provenance() != Provenance::Heuristic {
        state.trailing_90 = trailing.value();
    }
    if let Some(months) = args.months {
        state.projection_months = months.max(1);
    }

    let drivers = derive_drivers(&state);
    let ladder = resolve_ladder(state.trailing_90, &TierAsks::from_scenario(&state));
    let portfolio = compute_portfolio_at(&catalog, &drivers, &ladder);
    let projection = project_spend(
        state.projection_start_spend,
        state.projection_growth,
        state.projection_months,
    );

    let resolved = if args.offline || config.api_base.is_none() {
        ResolvedEnvelope {
            envelope: fallback_envelope(&state),
            provenance: Provenance::Heuristic,
        }
    } else {
        let api = HttpEnvelopeApi::new(
            http.clone(),
            config.api_base.clone().unwrap_or_default(),
        );
        EnvelopeProvider::new(api).resolve(&state).await
    };

    println!(
        "Scenario [{source}] | leads: {} | trailing-90: {} | start: {}",
        state.leads,
        money(state.trailing_90),
        state.start_date
    );
    println!(
        "Drivers | SMS std: {:.0} | toll-free: {:.0} | MMS: {:.0} | RCS: {:.0} | WhatsApp: {:.0} | voice min: {:.0} | verify: {:.0} | AI: {:.0}",
        drivers.sms_standard,
        drivers.sms_toll_free,
        drivers.mms_messages,
        drivers.rcs_messages,
        drivers.whatsapp,
        drivers.voice_minutes,
        drivers.verify_checks,
        drivers.ai_responses
    );
    println!(
        "Ladder | tier: {} | discount: {} | next threshold: {} | progress: {:.1}%",
        ladder.tier,
        pct(ladder.discount),
        ladder
            .next_threshold
            .map_or_else(|| "-".to_string(), money),
        ladder.progress_pct
    );
    println!(
        "Portfolio | SKUs: {} | rack: {} | effective: {} | blended CPM: {} | messages: {:.0}",
        portfolio.rows.len(),
        money(portfolio.summary.rack_total),
        money(portfolio.summary.effective_total),
        money(portfolio.summary.blended_cpm),
        portfolio.summary.messages_total
    );
    if let Some(last) = projection.last() {
        println!(
            "Projection | months: {} | final month: {} | cumulative: {}",
            last.month,
            money(last.spend),
            money(last.cumulative)
        );
    }
    let envelope = &resolved.envelope;
    println!(
        "Envelope [{}] | target: {} | floor: {} | ceiling: {} | target revenue: {} | margin: {} -> {}",
        resolved.provenance.label(),
        pct(envelope.target_discount),
        pct(envelope.floor_discount),
        pct(envelope.ceiling_discount),
        money(envelope.target_revenue),
        pct(envelope.current_margin),
        pct(envelope.target_margin)
    );

    if let Err(err) = store.save(&state).await {
        warn!(%err, "scenario save failed on every backend");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            scenario: None,
            catalog: None,
            invoices: None,
            months: None,
            offline: false,
        }
    }

    fn config() -> Config {
        Config {
            api_base: None,
            supabase_url: None,
            supabase_key: None,
            catalog_url: None,
            trailing_url: None,
            cache_path: PathBuf::from(".cache/scenario.json"),
        }
    }

    #[test]
    fn unconfigured_online_run_is_an_error_not_fixtures() {
        assert!(choose_catalog_source(&args(), &config()).is_err());
    }

    #[test]
    fn offline_opts_into_builtin_fixtures() {
        let mut offline = args();
        offline.offline = true;
        assert_eq!(
            choose_catalog_source(&offline, &config()).unwrap(),
            CatalogSource::Builtin
        );
    }

    #[test]
    fn configured_url_is_fetched_when_online() {
        let mut cfg = config();
        cfg.catalog_url = Some("https://pricing.internal/catalog.json".to_string());
        assert_eq!(
            choose_catalog_source(&args(), &cfg).unwrap(),
            CatalogSource::Url("https://pricing.internal/catalog.json".to_string())
        );
    }

    #[test]
    fn explicit_path_wins_over_url_and_offline() {
        let mut both = args();
        both.offline = true;
        both.catalog = Some(PathBuf::from("catalog.json"));
        let mut cfg = config();
        cfg.catalog_url = Some("https://pricing.internal/catalog.json".to_string());
        assert_eq!(
            choose_catalog_source(&both, &cfg).unwrap(),
            CatalogSource::Path(PathBuf::from("catalog.json"))
        );
    }
}
