#![deny(warnings)]

//! External collaborators at their interface boundary: scenario persistence
//! with best-effort fallback, catalog fetching and validation, the
//! trailing-90 spend artifact, offline catalog fixtures, and invoice
//! rollups.
//!
//! Nothing here is allowed to take the dashboard down: persistence failures
//! degrade to warnings, the trailing source retains its last known value,
//! and only the catalog loader propagates errors (an empty price list would
//! make every downstream number silently wrong).

pub mod catalog;
pub mod fixtures;
pub mod invoices;
pub mod scenario;
pub mod trailing;

pub use catalog::{CatalogError, CatalogLoader};
pub use fixtures::builtin_catalog;
pub use invoices::{invoice_total, trailing_90_spend, Invoice};
pub use scenario::{
    FileScenarioStore, RemoteScenarioStore, ScenarioStore, StoreError, TieredScenarioStore,
};
pub use trailing::TrailingSpend;
