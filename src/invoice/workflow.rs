//! Create-and-send pipeline shared by the form and the JSON API:
//! persist → render → store PDF → record as sent → simulate email.

use actix_web::web;
use log::{debug, error, info};
use thiserror::Error;

use super::models::{Invoice, NewInvoice};
use crate::db::{AppState, DbError};
use crate::render::RenderError;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to store PDF: {0}")]
    Storage(#[source] std::io::Error),
    #[error("rendering task was cancelled")]
    Cancelled,
}

/// Runs the whole pipeline. When rendering, storing or recording fails the
/// record is kept with status `failed`, no PDF is left behind and no email
/// goes out.
pub async fn create_and_send(state: &AppState, new_invoice: NewInvoice) -> Result<Invoice, WorkflowError> {
    let id = state.create_invoice(&new_invoice).await?;
    info!("Invoice {} created for {}", id, new_invoice.client_name);

    let invoice = state.get_invoice(id).await?;

    let renderer = state.renderer.clone();
    let to_render = invoice.clone();
    let rendered = match web::block(move || renderer.render(&to_render)).await {
        Ok(Ok(document)) => document,
        Ok(Err(e)) => {
            error!("PDF generation failed for invoice {}: {:?}", id, e);
            mark_failed(state, id).await;
            return Err(e.into());
        }
        Err(e) => {
            error!("Rendering task for invoice {} did not complete: {}", id, e);
            mark_failed(state, id).await;
            return Err(WorkflowError::Cancelled);
        }
    };

    debug!("Storing PDF for invoice {} as {}", id, rendered.filename);
    if let Err(e) = state.storage.save(&rendered.filename, &rendered.pdf).await {
        error!("Failed to store PDF for invoice {}: {}", id, e);
        mark_failed(state, id).await;
        return Err(WorkflowError::Storage(e));
    }

    match state.record_sent(id, &rendered.filename).await {
        Ok(sent) => {
            state.mailer.notify(&sent, &rendered.pdf);
            info!("Invoice {} sent to {}", id, sent.client_email);
            Ok(sent)
        }
        Err(e) => {
            error!("Failed to record invoice {} as sent: {}", id, e);
            if let Err(cleanup) = state.storage.remove(&rendered.filename).await {
                error!("Failed to remove orphaned PDF {}: {}", rendered.filename, cleanup);
            }
            mark_failed(state, id).await;
            Err(e.into())
        }
    }
}

async fn mark_failed(state: &AppState, id: i64) {
    if let Err(e) = state.record_failure(id).await {
        error!("Failed to mark invoice {} as failed: {}", id, e);
    }
}
