//! Rendering module - invoice HTML via Tera and HTML to PDF conversion.
//!
//! - `template` - template loading and the view models passed to Tera
//! - `layout` - HTML blocks placed on A4 pages
//! - `fonts` - embedded TrueType faces and text measuring
//! - `engine` - PDF writer over the layout
//! - `common` - date formatting and filename helpers

pub mod common;
pub mod engine;
pub mod fonts;
pub mod layout;
pub mod template;

use std::path::Path;
use tera::Context;
use thiserror::Error;
use uuid::Uuid;

use crate::invoice::models::{compute_total, Invoice};
pub use engine::{PdfRenderEngine, RenderedPdf};
pub use fonts::{FontFile, FontSet};
pub use template::{InvoiceView, SummaryView, TemplateSet, INVOICE_TEMPLATE};

/// Errors that can occur while rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invoice is missing required field '{0}'")]
    MissingField(&'static str),
    #[error("invoice total {stored} does not match its line items ({computed:?})")]
    InconsistentTotal { stored: i64, computed: Option<i64> },
    #[error("template not found: {0}")]
    TemplateMissing(String),
    #[error("template error: {0}")]
    Template(#[source] tera::Error),
    #[error("rendered document has no printable content")]
    EmptyDocument,
    #[error("no available font has a glyph for {0:?}")]
    UnsupportedCharacter(char),
    #[error("font error: {0}")]
    Font(String),
    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

/// Result of a successful invoice rendering.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub filename: String,
    pub pdf: Vec<u8>,
    /// Text content of the PDF, line by line.
    pub text: Vec<String>,
}

/// Renders invoices to PDF and the web pages to HTML from one template set.
pub struct InvoiceRenderer {
    templates: TemplateSet,
    engine: PdfRenderEngine,
    company_name: String,
}

impl InvoiceRenderer {
    pub fn new(templates: TemplateSet, fonts: FontSet, company_name: &str) -> Self {
        Self {
            templates,
            engine: PdfRenderEngine::new(fonts),
            company_name: company_name.to_string(),
        }
    }

    /// Templates from `dir`, bundled fonts only.
    pub fn from_dir(dir: impl AsRef<Path>, company_name: &str) -> Result<Self, RenderError> {
        Ok(Self::new(TemplateSet::from_dir(dir)?, FontSet::bundled()?, company_name))
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    fn check(invoice: &Invoice) -> Result<(), RenderError> {
        if invoice.client_name.trim().is_empty() {
            return Err(RenderError::MissingField("client_name"));
        }
        if invoice.client_email.trim().is_empty() {
            return Err(RenderError::MissingField("client_email"));
        }
        if invoice.line_items.is_empty() {
            return Err(RenderError::MissingField("line_items"));
        }
        if invoice.line_items.iter().any(|item| item.description.trim().is_empty()) {
            return Err(RenderError::MissingField("line_items.description"));
        }
        let computed = compute_total(&invoice.line_items);
        if computed != Some(invoice.total_cents) {
            return Err(RenderError::InconsistentTotal {
                stored: invoice.total_cents,
                computed,
            });
        }
        Ok(())
    }

    /// Fill `invoice.html` for the given invoice.
    pub fn render_html(&self, invoice: &Invoice) -> Result<String, RenderError> {
        Self::check(invoice)?;
        let mut context = Context::new();
        context.insert("invoice", &InvoiceView::new(invoice, &self.company_name));
        self.templates.render(INVOICE_TEMPLATE, &context)
    }

    /// Render the invoice to PDF bytes.
    pub fn render(&self, invoice: &Invoice) -> Result<GeneratedDocument, RenderError> {
        let html = self.render_html(invoice)?;
        let rendered = self.engine.render(&invoice.number(), &html)?;

        log::debug!(
            "Rendered invoice {} to {} page(s), {} bytes",
            invoice.id,
            rendered.pages,
            rendered.pdf.len()
        );

        Ok(GeneratedDocument {
            filename: pdf_filename(invoice),
            pdf: rendered.pdf,
            text: rendered.text,
        })
    }

    /// Render one of the web pages.
    pub fn render_page(&self, name: &str, context: &Context) -> Result<String, RenderError> {
        let mut context = context.clone();
        context.insert("company_name", &self.company_name);
        self.templates.render(name, &context)
    }
}

/// Storage filename for an invoice PDF: `invoice-<id>-<client>-<random>.pdf`.
pub fn pdf_filename(invoice: &Invoice) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "invoice-{}-{}-{}.pdf",
        invoice.id,
        common::slugify(&invoice.client_name, "client"),
        &suffix[..8]
    )
}

/// Download name offered to the browser.
pub fn download_filename(id: i64) -> String {
    format!("Invoice_{}.pdf", id)
}
