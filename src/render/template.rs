//! Tera templates and the view models fed to them.

use serde::Serialize;
use std::path::Path;
use tera::{Context, Tera};

use super::common::{format_document_date, format_timestamp};
use super::RenderError;
use crate::invoice::models::{Invoice, InvoiceSummary};
use crate::invoice::money::format_cents;

pub const INVOICE_TEMPLATE: &str = "invoice.html";

#[derive(Debug, Serialize)]
pub struct LineItemView {
    pub description: String,
    pub quantity: i64,
    pub unit_price: String,
    pub subtotal: String,
}

/// Invoice fields as printed on the document.
#[derive(Debug, Serialize)]
pub struct InvoiceView {
    pub id: i64,
    pub number: String,
    pub company_name: String,
    pub client_name: String,
    pub client_email: String,
    pub issued_on: String,
    pub status: String,
    pub items: Vec<LineItemView>,
    pub total: String,
}

impl InvoiceView {
    pub fn new(invoice: &Invoice, company_name: &str) -> Self {
        InvoiceView {
            id: invoice.id,
            number: invoice.number(),
            company_name: company_name.to_string(),
            client_name: invoice.client_name.clone(),
            client_email: invoice.client_email.clone(),
            issued_on: format_document_date(&invoice.created_at),
            status: invoice.status.to_string(),
            items: invoice
                .line_items
                .iter()
                .map(|item| LineItemView {
                    description: item.description.clone(),
                    quantity: item.quantity,
                    unit_price: format_cents(item.unit_price_cents),
                    // Checked by the renderer before the view is built.
                    subtotal: format_cents(item.subtotal_cents().unwrap_or_default()),
                })
                .collect(),
            total: invoice.total_display(),
        }
    }
}

/// History row as shown on the pages.
#[derive(Debug, Serialize)]
pub struct SummaryView {
    pub id: i64,
    pub number: String,
    pub client_name: String,
    pub client_email: String,
    pub total: String,
    pub created_at: String,
    pub status: String,
    pub has_pdf: bool,
}

impl From<&InvoiceSummary> for SummaryView {
    fn from(summary: &InvoiceSummary) -> Self {
        SummaryView {
            id: summary.id,
            number: summary.number.clone(),
            client_name: summary.client_name.clone(),
            client_email: summary.client_email.clone(),
            total: summary.total.clone(),
            created_at: format_timestamp(&summary.created_at),
            status: summary.status.to_string(),
            has_pdf: summary.has_pdf,
        }
    }
}

/// Loads every `*.html` under a directory once at startup.
pub struct TemplateSet {
    tera: Tera,
}

impl TemplateSet {
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, RenderError> {
        let dir = dir.as_ref();
        let pattern = format!("{}/**/*.html", dir.display());
        let tera = Tera::new(&pattern).map_err(RenderError::Template)?;

        if !tera.get_template_names().any(|name| name == INVOICE_TEMPLATE) {
            return Err(RenderError::TemplateMissing(format!(
                "{} in {}",
                INVOICE_TEMPLATE,
                dir.display()
            )));
        }
        log::debug!("Loaded {} templates from {}", tera.get_template_names().count(), dir.display());
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<String, RenderError> {
        self.tera.render(name, context).map_err(RenderError::Template)
    }
}
