//! Invoice printing.
//!
//! An invoice is rendered to HTML with an askama template, then handed to a
//! [`PdfRenderer`]. Production uses [`HttpPdfRenderer`], which uploads the
//! HTML to a conversion service; tests inject their own renderer.

use std::time::Duration;

use askama::Template;
use futures::future::BoxFuture;
use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::instrument;

use crate::config::PdfRendererConfig;
use crate::models::invoice::InvoiceDetails;

/// Outbound request timeout for the converter.
const RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// A4 portrait with 10mm margins, as converter form fields.
const PAGE_FIELDS: &[(&str, &str)] = &[
    ("paperWidth", "210mm"),
    ("paperHeight", "297mm"),
    ("landscape", "false"),
    ("marginTop", "10mm"),
    ("marginRight", "10mm"),
    ("marginBottom", "10mm"),
    ("marginLeft", "10mm"),
];

/// Errors from rendering an invoice.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The HTML template failed to render.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    /// The converter could not be reached or its body could not be read.
    #[error("converter request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The converter answered with a non-success status.
    #[error("converter returned HTTP {0}")]
    Status(u16),

    /// The converter answered with an empty body.
    #[error("converter returned an empty document")]
    EmptyDocument,
}

/// Turns an HTML document into PDF bytes.
pub trait PdfRenderer: Send + Sync {
    /// Convert `html` to a complete PDF document.
    fn render(&self, html: String) -> BoxFuture<'_, Result<Vec<u8>, RenderError>>;
}

// =============================================================================
// HTML
// =============================================================================

/// One table row of the printed invoice.
#[derive(Debug)]
struct PrintLine<'a> {
    index: usize,
    name: &'a str,
    quantity: i32,
    price: String,
    total: String,
}

#[derive(Template)]
#[template(path = "invoices/print.html")]
struct InvoicePrintTemplate<'a> {
    invoice_id: String,
    date: String,
    user_name: &'a str,
    user_email: &'a str,
    lines: Vec<PrintLine<'a>>,
    total_amount: String,
}

/// Render an invoice as a standalone HTML document.
///
/// Output depends only on the invoice, so the same invoice always renders
/// the same bytes.
///
/// # Errors
///
/// Returns `RenderError::Template` if the template fails.
pub fn render_invoice_html(invoice: &InvoiceDetails) -> Result<String, RenderError> {
    let lines = invoice
        .products
        .iter()
        .enumerate()
        .map(|(i, line)| PrintLine {
            index: i + 1,
            name: &line.name,
            quantity: line.quantity,
            price: format!("{:.2}", line.price.amount()),
            total: format!("{:.2}", line.total),
        })
        .collect();

    let template = InvoicePrintTemplate {
        invoice_id: invoice.id.to_string(),
        date: invoice.created_at.format("%Y-%m-%d").to_string(),
        user_name: &invoice.user.name,
        user_email: invoice.user.email.as_str(),
        lines,
        total_amount: format!("{:.2}", invoice.total_amount),
    };

    Ok(template.render()?)
}

// =============================================================================
// HTTP converter
// =============================================================================

/// [`PdfRenderer`] backed by an HTML to PDF conversion service.
///
/// The document is uploaded as a multipart `files` part named `index.html`
/// along with page-size and margin fields. The response body is the PDF.
#[derive(Debug, Clone)]
pub struct HttpPdfRenderer {
    client: reqwest::Client,
    config: PdfRendererConfig,
}

impl HttpPdfRenderer {
    /// Create a renderer for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Http` if the HTTP client cannot be built.
    pub fn new(config: PdfRendererConfig) -> Result<Self, RenderError> {
        let client = reqwest::Client::builder().timeout(RENDER_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    #[instrument(skip_all, fields(url = %self.config.url, html_len = html.len()))]
    async fn convert(&self, html: String) -> Result<Vec<u8>, RenderError> {
        let file = Part::text(html)
            .file_name("index.html")
            .mime_str("text/html")?;
        let form = PAGE_FIELDS
            .iter()
            .fold(Form::new().part("files", file), |form, (name, value)| {
                form.text(*name, *value)
            });

        let mut request = self.client.post(self.config.url.clone()).multipart(form);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = %status, "PDF converter rejected the document");
            return Err(RenderError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(RenderError::EmptyDocument);
        }

        tracing::debug!(pdf_len = bytes.len(), "PDF rendered");
        Ok(bytes.to_vec())
    }
}

impl PdfRenderer for HttpPdfRenderer {
    fn render(&self, html: String) -> BoxFuture<'_, Result<Vec<u8>, RenderError>> {
        Box::pin(self.convert(html))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use stockroom_core::{Email, InventoryItemId, InvoiceId, Price, UserId};

    use super::*;
    use crate::models::DEFAULT_IMAGE_URL;
    use crate::models::invoice::{InvoiceLineItem, InvoiceOwner};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn line(id: i32, name: &str, price: &str, quantity: i32) -> InvoiceLineItem {
        let price = Price::new(dec(price)).unwrap();
        InvoiceLineItem {
            inventory_id: InventoryItemId::new(id),
            product_id: i64::from(id),
            name: name.to_string(),
            description: format!("{name} description"),
            price,
            quantity,
            image: DEFAULT_IMAGE_URL.to_string(),
            total: price.line_total(quantity).unwrap(),
        }
    }

    fn invoice(products: Vec<InvoiceLineItem>) -> InvoiceDetails {
        let total_amount = products.iter().map(|l| l.total).sum();
        InvoiceDetails {
            id: InvoiceId::new(42),
            user: InvoiceOwner {
                id: UserId::new(7),
                name: "Rina Akter".to_string(),
                email: Email::parse("rina@example.com").unwrap(),
            },
            products,
            total_amount,
            created_at: Utc.with_ymd_and_hms(2026, 3, 5, 14, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_html_lists_every_line_and_total() {
        let html = render_invoice_html(&invoice(vec![
            line(1, "Backpack", "10", 2),
            line(2, "T-Shirt", "5", 3),
        ]))
        .unwrap();

        assert!(html.contains("Invoice ID: 42"));
        assert!(html.contains("2026-03-05"));
        assert!(html.contains("User: Rina Akter (rina@example.com)"));
        assert!(html.contains("<td>Backpack</td>"));
        assert!(html.contains("<td>T-Shirt</td>"));
        assert!(html.contains("<td>20.00</td>"));
        assert!(html.contains("<td>15.00</td>"));
        assert!(html.contains("Total Amount: 35.00"));
        assert!(html.contains("Customer Signature"));
        assert!(!html.contains("No products found."));
    }

    #[test]
    fn test_html_numbers_rows_from_one() {
        let html = render_invoice_html(&invoice(vec![
            line(1, "A", "1", 1),
            line(2, "B", "1", 1),
        ]))
        .unwrap();

        let first = html.find("<td>1</td>").unwrap();
        let second = html.find("<td>2</td>").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_html_without_lines() {
        let html = render_invoice_html(&invoice(vec![])).unwrap();
        assert!(html.contains("No products found."));
        assert!(html.contains("Total Amount: 0.00"));
    }

    #[test]
    fn test_html_escapes_product_names() {
        let html =
            render_invoice_html(&invoice(vec![line(1, "<script>alert(1)</script>", "1", 1)]))
                .unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_html_is_deterministic() {
        let invoice = invoice(vec![line(1, "Backpack", "109.95", 1)]);
        assert_eq!(
            render_invoice_html(&invoice).unwrap(),
            render_invoice_html(&invoice).unwrap()
        );
    }
}
