//! Catalog loading: fetch, parse, and schema-validate the SKU price list.
//!
//! Catalog failures propagate. Every downstream cost figure is keyed off
//! this list, so a silently empty catalog would be worse than an error
//! banner.

use nego_core::{validate_catalog, Catalog, ValidationError};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status: {0}")]
    Status(u16),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid catalog: {0}")]
    Invalid(#[from] ValidationError),
}

/// Fetches and validates `{generated_at, skus}` documents.
pub struct CatalogLoader {
    http: reqwest::Client,
}

impl CatalogLoader {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub async fn fetch(&self, url: &str) -> Result<Catalog, CatalogError> {
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(CatalogError::Status(response.status().as_u16()));
        }
        let catalog: Catalog = response.json().await?;
        validate_catalog(&catalog)?;
        info!(skus = catalog.skus.len(), "catalog fetched");
        Ok(catalog)
    }

    pub async fn load_path(&self, path: &Path) -> Result<Catalog, CatalogError> {
        let text = tokio::fs::read_to_string(path).await?;
        let catalog: Catalog = serde_json::from_str(&text)?;
        validate_catalog(&catalog)?;
        info!(skus = catalog.skus.len(), path = %path.display(), "catalog loaded");
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::builtin_catalog;

    fn loader() -> CatalogLoader {
        CatalogLoader::new(reqwest::Client::new())
    }

    #[tokio::test]
    async fn loads_and_validates_a_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let text = serde_json::to_string(&builtin_catalog()).unwrap();
        tokio::fs::write(&path, text).await.unwrap();

        let catalog = loader().load_path(&path).await.unwrap();
        assert!(catalog.skus.len() >= nego_core::MIN_CATALOG_SKUS);
    }

    #[tokio::test]
    async fn undersized_catalog_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let mut catalog = builtin_catalog();
        catalog.skus.truncate(10);
        tokio::fs::write(&path, serde_json::to_string(&catalog).unwrap())
            .await
            .unwrap();

        match loader().load_path(&path).await {
            Err(CatalogError::Invalid(ValidationError::CatalogTooSmall { found: 10 })) => {}
            other => panic!("expected CatalogTooSmall, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        tokio::fs::write(&path, "{not json").await.unwrap();
        assert!(matches!(
            loader().load_path(&path).await,
            Err(CatalogError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_is_an_error_not_an_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(
            loader().load_path(&path).await,
            Err(CatalogError::Io(_))
        ));
    }
}
