//! Invoice database operations

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{AppState, DbError};
use crate::invoice::models::{invoice_number, Invoice, InvoiceStatus, InvoiceSummary, LineItem, NewInvoice};
use crate::invoice::money::format_cents;

#[derive(Debug, FromRow)]
struct InvoiceRow {
    id: i64,
    client_name: String,
    client_email: String,
    line_items: String,
    total_cents: i64,
    created_at: DateTime<Utc>,
    status: String,
    pdf_filename: Option<String>,
}

#[derive(Debug, FromRow)]
struct SummaryRow {
    id: i64,
    client_name: String,
    client_email: String,
    total_cents: i64,
    created_at: DateTime<Utc>,
    status: String,
    pdf_filename: Option<String>,
}

fn parse_status(id: i64, status: &str) -> Result<InvoiceStatus, DbError> {
    status.parse().map_err(|status| DbError::UnknownStatus { id, status })
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = DbError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        let line_items: Vec<LineItem> = serde_json::from_str(&row.line_items)
            .map_err(|source| DbError::CorruptLineItems { id: row.id, source })?;
        Ok(Invoice {
            status: parse_status(row.id, &row.status)?,
            id: row.id,
            client_name: row.client_name,
            client_email: row.client_email,
            line_items,
            total_cents: row.total_cents,
            created_at: row.created_at,
            pdf_filename: row.pdf_filename,
        })
    }
}

impl TryFrom<SummaryRow> for InvoiceSummary {
    type Error = DbError;

    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        Ok(InvoiceSummary {
            status: parse_status(row.id, &row.status)?,
            number: invoice_number(row.id),
            id: row.id,
            client_name: row.client_name,
            client_email: row.client_email,
            total_cents: row.total_cents,
            total: format_cents(row.total_cents),
            created_at: row.created_at,
            has_pdf: row.pdf_filename.is_some(),
        })
    }
}

impl AppState {
    /// Insert a new invoice with status `created`, returning its id.
    pub async fn create_invoice(&self, invoice: &NewInvoice) -> Result<i64, DbError> {
        let line_items = serde_json::to_string(&invoice.line_items).map_err(DbError::Encode)?;

        let result = sqlx::query(
            r#"
            INSERT INTO invoices (client_name, client_email, line_items, total_cents, created_at, status)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&invoice.client_name)
        .bind(&invoice.client_email)
        .bind(line_items)
        .bind(invoice.total_cents)
        .bind(Utc::now())
        .bind(InvoiceStatus::Created.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_invoice(&self, id: i64) -> Result<Invoice, DbError> {
        let row = sqlx::query_as::<_, InvoiceRow>(
            "SELECT id, client_name, client_email, line_items, total_cents, created_at, status, pdf_filename FROM invoices WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound(id))?;

        Invoice::try_from(row)
    }

    /// All invoices, newest first.
    pub async fn list_invoices(&self) -> Result<Vec<InvoiceSummary>, DbError> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            "SELECT id, client_name, client_email, total_cents, created_at, status, pdf_filename FROM invoices ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(InvoiceSummary::try_from).collect()
    }

    /// Attach the generated PDF and mark the invoice `sent`.
    pub async fn record_sent(&self, id: i64, pdf_filename: &str) -> Result<Invoice, DbError> {
        let result = sqlx::query(
            "UPDATE invoices SET status = ?, pdf_filename = ? WHERE id = ? AND status = ?",
        )
        .bind(InvoiceStatus::Sent.as_str())
        .bind(pdf_filename)
        .bind(id)
        .bind(InvoiceStatus::Created.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.transition_refused(id).await);
        }
        self.get_invoice(id).await
    }

    /// Mark an invoice whose PDF could not be produced.
    pub async fn record_failure(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE invoices SET status = ? WHERE id = ? AND status = ?")
            .bind(InvoiceStatus::Failed.as_str())
            .bind(id)
            .bind(InvoiceStatus::Created.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(self.transition_refused(id).await);
        }
        Ok(())
    }

    async fn transition_refused(&self, id: i64) -> DbError {
        match self.get_invoice(id).await {
            Ok(_) => DbError::AlreadyFinalized(id),
            Err(e) => e,
        }
    }
}
