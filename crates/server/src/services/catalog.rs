//! External product catalog client.
//!
//! A thin pass-through to the catalog's product listing. The listing is
//! cached using `moka` (5-minute TTL) so browsing does not hit the upstream
//! on every request.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

const CACHE_TTL: Duration = Duration::from_secs(300);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PRODUCTS_KEY: &str = "products";

/// Errors from the catalog upstream.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Request failed or the body was not a product list.
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog answered with a non-success status.
    #[error("catalog returned HTTP {0}")]
    Status(u16),
}

/// A product as listed by the catalog.
///
/// Prices are passed through as the catalog sends them; they become exact
/// decimals only when a product is added to an inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: i64,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<CatalogRating>,
}

/// Aggregate customer rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRating {
    pub rate: f64,
    pub count: u32,
}

/// Client for the product catalog API.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    url: Url,
    cache: Cache<&'static str, Arc<Vec<CatalogProduct>>>,
}

impl CatalogClient {
    /// Create a catalog client for the given listing URL.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Http` if the HTTP client cannot be built.
    pub fn new(url: Url) -> Result<Self, CatalogError> {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(CACHE_TTL)
            .build();
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            inner: Arc::new(CatalogClientInner { client, url, cache }),
        })
    }

    /// List every catalog product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the upstream fails or sends a malformed body.
    #[instrument(skip(self), fields(url = %self.inner.url))]
    pub async fn products(&self) -> Result<Arc<Vec<CatalogProduct>>, CatalogError> {
        if let Some(products) = self.inner.cache.get(PRODUCTS_KEY).await {
            debug!("Cache hit for catalog products");
            return Ok(products);
        }

        let response = self.inner.client.get(self.inner.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Catalog request failed");
            return Err(CatalogError::Status(status.as_u16()));
        }

        let products = Arc::new(response.json::<Vec<CatalogProduct>>().await?);
        debug!(count = products.len(), "Fetched catalog products");

        self.inner
            .cache
            .insert(PRODUCTS_KEY, Arc::clone(&products))
            .await;

        Ok(products)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_catalog_listing() {
        let body = r#"[
            {
                "id": 1,
                "title": "Fjallraven - Foldsack No. 1 Backpack, Fits 15 Laptops",
                "price": 109.95,
                "description": "Your perfect pack for everyday use and walks in the forest.",
                "category": "men's clothing",
                "image": "https://fakestoreapi.com/img/81fPKd-2AYL._AC_SL1500_.jpg",
                "rating": { "rate": 3.9, "count": 120 }
            },
            { "id": 2, "title": "Mens Casual Slim Fit", "price": 15.99 }
        ]"#;

        let products: Vec<CatalogProduct> = serde_json::from_str(body).unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].rating.as_ref().unwrap().count, 120);
        assert!(products[1].rating.is_none());
        assert!(products[1].description.is_empty());
    }

    #[test]
    fn test_serializes_without_missing_rating() {
        let product = CatalogProduct {
            id: 2,
            title: "Mens Casual Slim Fit".to_string(),
            price: 15.99,
            description: String::new(),
            category: "men's clothing".to_string(),
            image: String::new(),
            rating: None,
        };

        let json = serde_json::to_value(&product).unwrap();
        assert!(json.get("rating").is_none());
        assert_eq!(json["price"], 15.99);
    }

    #[tokio::test]
    async fn test_serves_cached_listing() {
        // Unroutable upstream: only a cache hit can succeed.
        let client = CatalogClient::new("http://127.0.0.1:9/products".parse().unwrap()).unwrap();
        let cached = Arc::new(vec![CatalogProduct {
            id: 1,
            title: "Backpack".to_string(),
            price: 109.95,
            description: String::new(),
            category: String::new(),
            image: String::new(),
            rating: None,
        }]);
        client
            .inner
            .cache
            .insert(PRODUCTS_KEY, Arc::clone(&cached))
            .await;

        let products = client.products().await.unwrap();
        assert_eq!(products, cached);
    }
}
