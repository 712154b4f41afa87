//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::services::catalog::{CatalogClient, CatalogError};
use crate::services::render::{HttpPdfRenderer, PdfRenderer, RenderError};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("catalog client: {0}")]
    Catalog(#[from] CatalogError),
    #[error("pdf renderer: {0}")]
    Renderer(#[from] RenderError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    catalog: CatalogClient,
    pdf: Arc<dyn PdfRenderer>,
}

impl AppState {
    /// Create a new application state using the HTTP PDF converter from
    /// `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if an outbound HTTP client cannot be built.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, StateError> {
        let pdf = HttpPdfRenderer::new(config.pdf_renderer.clone())?;
        Self::with_pdf_renderer(config, pool, Arc::new(pdf))
    }

    /// Create a new application state with a caller-supplied PDF renderer.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog HTTP client cannot be built.
    pub fn with_pdf_renderer(
        config: ServerConfig,
        pool: PgPool,
        pdf: Arc<dyn PdfRenderer>,
    ) -> Result<Self, StateError> {
        let catalog = CatalogClient::new(config.catalog_url.clone())?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                pdf,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the product catalog client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Get the PDF renderer.
    #[must_use]
    pub fn pdf_renderer(&self) -> &dyn PdfRenderer {
        self.inner.pdf.as_ref()
    }
}
