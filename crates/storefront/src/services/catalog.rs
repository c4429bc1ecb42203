//! Product catalog client.
//!
//! The catalog is an external collaborator: the orchestrator only needs
//! names and prices to value cart lines. Snapshots are cached with a TTL
//! so burst re-pricing does not hammer the product service.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use rust_decimal::Decimal;
use serde::Deserialize;

use pazar_core::ProductId;

use super::{ProductCatalog, RemoteError, error_from_response};
use crate::config::StorefrontConfig;

/// Name and unit price of one product, as currently listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInfo {
    pub name: String,
    pub price: Decimal,
}

/// A point-in-time view of the catalog, keyed by product id.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    products: HashMap<ProductId, ProductInfo>,
}

impl CatalogSnapshot {
    /// Build a snapshot from known products.
    #[must_use]
    pub fn from_products(products: HashMap<ProductId, ProductInfo>) -> Self {
        Self { products }
    }

    /// Look up a product. `None` for products no longer listed.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&ProductInfo> {
        self.products.get(&product_id)
    }

    /// Unit price for a product, zero when unlisted.
    ///
    /// Lines whose product has disappeared from the catalog contribute
    /// nothing to the subtotal rather than failing the whole cart.
    #[must_use]
    pub fn price_of(&self, product_id: ProductId) -> Decimal {
        self.get(product_id)
            .map_or(Decimal::ZERO, |product| product.price)
    }
}

#[derive(Deserialize)]
struct ProductListResponse {
    #[serde(default)]
    products: Vec<ProductRecord>,
}

#[derive(Deserialize)]
struct ProductRecord {
    // gorm.Model casing on the product service side
    #[serde(rename = "ID")]
    id: ProductId,
    name: String,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
}

/// HTTP client for the product service, with a TTL snapshot cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: String,
    page_size: u32,
    cache: Cache<(), CatalogSnapshot>,
}

impl CatalogClient {
    /// Create a client for the gateway in `config`.
    #[must_use]
    pub fn new(config: &StorefrontConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                base_url: config.api_base_url.as_str().trim_end_matches('/').to_string(),
                page_size: config.catalog_page_size,
                cache,
            }),
        }
    }

    async fn fetch_snapshot(&self) -> Result<CatalogSnapshot, RemoteError> {
        let url = format!(
            "{}/products?limit={}",
            self.inner.base_url, self.inner.page_size
        );
        let response = self.inner.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let parsed: ProductListResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))?;

        let products = parsed
            .products
            .into_iter()
            .map(|record| {
                (
                    record.id,
                    ProductInfo {
                        name: record.name,
                        price: record.price,
                    },
                )
            })
            .collect();
        Ok(CatalogSnapshot::from_products(products))
    }
}

#[async_trait]
impl ProductCatalog for CatalogClient {
    async fn snapshot(&self) -> Result<CatalogSnapshot, RemoteError> {
        if let Some(cached) = self.inner.cache.get(&()).await {
            return Ok(cached);
        }

        let snapshot = self.fetch_snapshot().await?;
        self.inner.cache.insert((), snapshot.clone()).await;
        Ok(snapshot)
    }
}
