use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use super::money::format_cents;

/// Lifecycle of an invoice record. Only `Created` may transition, once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Created,
    Sent,
    Failed,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Created => "created",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(InvoiceStatus::Created),
            "sent" => Ok(InvoiceStatus::Sent),
            "failed" => Ok(InvoiceStatus::Failed),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LineItem {
    #[schema(example = "Website redesign")]
    pub description: String,
    #[schema(example = 3)]
    pub quantity: i64,
    #[schema(example = 12500)]
    pub unit_price_cents: i64,
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: i64, unit_price_cents: i64) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price_cents,
        }
    }

    /// `None` when the product does not fit in an i64.
    pub fn subtotal_cents(&self) -> Option<i64> {
        self.quantity.checked_mul(self.unit_price_cents)
    }
}

/// Sum of all line item subtotals, `None` on overflow.
pub fn compute_total(items: &[LineItem]) -> Option<i64> {
    items
        .iter()
        .try_fold(0i64, |acc, item| acc.checked_add(item.subtotal_cents()?))
}

/// A validated invoice that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    pub client_name: String,
    pub client_email: String,
    pub line_items: Vec<LineItem>,
    pub total_cents: i64,
}

impl NewInvoice {
    /// Build from already-checked parts. Returns `None` if the total overflows.
    pub fn new(
        client_name: impl Into<String>,
        client_email: impl Into<String>,
        line_items: Vec<LineItem>,
    ) -> Option<Self> {
        let total_cents = compute_total(&line_items)?;
        Some(Self {
            client_name: client_name.into(),
            client_email: client_email.into(),
            line_items,
            total_cents,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Invoice {
    #[schema(example = 42)]
    pub id: i64,
    #[schema(example = "Acme Corp")]
    pub client_name: String,
    #[schema(example = "billing@acme.example")]
    pub client_email: String,
    pub line_items: Vec<LineItem>,
    #[schema(example = 37500)]
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub status: InvoiceStatus,
    #[schema(example = "invoice-42-acme-corp-3f2a9c1d.pdf")]
    pub pdf_filename: Option<String>,
}

impl Invoice {
    /// Human facing number, e.g. `INV-000042`.
    pub fn number(&self) -> String {
        invoice_number(self.id)
    }

    pub fn total_display(&self) -> String {
        format_cents(self.total_cents)
    }
}

pub fn invoice_number(id: i64) -> String {
    format!("INV-{:06}", id)
}

/// Row of the history view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InvoiceSummary {
    pub id: i64,
    #[schema(example = "INV-000042")]
    pub number: String,
    pub client_name: String,
    pub client_email: String,
    pub total_cents: i64,
    #[schema(example = "375.00")]
    pub total: String,
    pub created_at: DateTime<Utc>,
    pub status: InvoiceStatus,
    pub has_pdf: bool,
}

/// Line item as submitted, before any parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLineItem {
    pub description: String,
    pub quantity: String,
    pub unit_price: String,
}

impl RawLineItem {
    pub fn is_blank(&self) -> bool {
        self.description.trim().is_empty()
            && self.quantity.trim().is_empty()
            && self.unit_price.trim().is_empty()
    }
}

/// Unvalidated invoice input, shared by the HTML form and the JSON API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceInput {
    pub client_name: String,
    pub client_email: String,
    pub line_items: Vec<RawLineItem>,
}

impl InvoiceInput {
    /// Collect the url-encoded form pairs. Row fields repeat in order
    /// (`item_description`, `item_quantity`, `item_unit_price`); fully blank
    /// rows are dropped.
    pub fn from_form_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut input = InvoiceInput::default();
        let mut descriptions = Vec::new();
        let mut quantities = Vec::new();
        let mut prices = Vec::new();

        for (key, value) in pairs {
            match key.as_str() {
                "client_name" => input.client_name = value,
                "client_email" => input.client_email = value,
                "item_description" => descriptions.push(value),
                "item_quantity" => quantities.push(value),
                "item_unit_price" => prices.push(value),
                _ => {}
            }
        }

        let rows = descriptions.len().max(quantities.len()).max(prices.len());
        let mut descriptions = descriptions.into_iter();
        let mut quantities = quantities.into_iter();
        let mut prices = prices.into_iter();

        input.line_items = (0..rows)
            .map(|_| RawLineItem {
                description: descriptions.next().unwrap_or_default(),
                quantity: quantities.next().unwrap_or_default(),
                unit_price: prices.next().unwrap_or_default(),
            })
            .filter(|row| !row.is_blank())
            .collect();

        input
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateLineItemRequest {
    #[schema(example = "Website redesign")]
    pub description: String,
    #[schema(example = 3)]
    pub quantity: i64,
    /// Decimal amount with at most two fraction digits.
    #[schema(example = "125.00")]
    pub unit_price: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateInvoiceRequest {
    #[schema(example = "Acme Corp")]
    pub client_name: String,
    #[schema(example = "billing@acme.example")]
    pub client_email: String,
    pub line_items: Vec<CreateLineItemRequest>,
}

impl From<CreateInvoiceRequest> for InvoiceInput {
    fn from(req: CreateInvoiceRequest) -> Self {
        InvoiceInput {
            client_name: req.client_name,
            client_email: req.client_email,
            line_items: req
                .line_items
                .into_iter()
                .map(|item| RawLineItem {
                    description: item.description,
                    quantity: item.quantity.to_string(),
                    unit_price: item.unit_price,
                })
                .collect(),
        }
    }
}
