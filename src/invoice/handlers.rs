use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse, Responder};
use log::{debug, error, info, warn};

use super::models::{CreateInvoiceRequest, Invoice, InvoiceInput, InvoiceSummary};
use super::validation::Validator;
use super::workflow::{create_and_send, WorkflowError};
use crate::db::{AppState, DbError};
use crate::render::download_filename;
use crate::ErrorResponse;

/// Map a workflow failure to a generic 500; details stay in the log.
fn workflow_failure_response(e: &WorkflowError) -> HttpResponse {
    let message = match e {
        WorkflowError::Render(_) | WorkflowError::Cancelled => "Failed to generate the invoice PDF",
        WorkflowError::Storage(_) => "Failed to store the invoice PDF",
        WorkflowError::Db(_) => "Failed to save the invoice",
    };
    HttpResponse::InternalServerError().json(ErrorResponse::internal_error(message))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Invoice Service",
    post,
    path = "/invoices",
    request_body = CreateInvoiceRequest,
    responses(
        (status = 201, description = "Invoice created, rendered and sent", body = Invoice),
        (status = 422, description = "Validation failed", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn create_invoice(req: web::Json<CreateInvoiceRequest>, data: web::Data<AppState>) -> impl Responder {
    info!("Executing create_invoice handler");
    let input = InvoiceInput::from(req.into_inner());

    let new_invoice = match input.validate() {
        Ok(invoice) => invoice,
        Err(errors) => {
            warn!("Rejected invoice submission: {}", errors);
            return HttpResponse::UnprocessableEntity().json(ErrorResponse::validation(&errors));
        }
    };

    match create_and_send(&data, new_invoice).await {
        Ok(invoice) => HttpResponse::Created().json(invoice),
        Err(e) => workflow_failure_response(&e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Invoice Service",
    get,
    path = "/invoices",
    responses(
        (status = 200, description = "All invoices, newest first", body = [InvoiceSummary]),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn list_invoices(data: web::Data<AppState>) -> impl Responder {
    debug!("Executing list_invoices handler");
    match data.list_invoices().await {
        Ok(invoices) => HttpResponse::Ok().json(invoices),
        Err(e) => {
            error!("Failed to list invoices: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error("Failed to retrieve invoices"))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Invoice Service",
    get,
    path = "/invoices/{id}",
    responses(
        (status = 200, description = "Invoice found", body = Invoice),
        (status = 404, description = "Invoice not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    ),
    params(
        ("id" = i64, Path, description = "ID of the invoice")
    )
)]
pub async fn get_invoice(id: web::Path<i64>, data: web::Data<AppState>) -> impl Responder {
    let id = id.into_inner();
    match data.get_invoice(id).await {
        Ok(invoice) => HttpResponse::Ok().json(invoice),
        Err(DbError::NotFound(_)) => {
            HttpResponse::NotFound().json(ErrorResponse::not_found(&format!("Invoice {} not found", id)))
        }
        Err(e) => {
            error!("Failed to load invoice {}: {}", id, e);
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error("Failed to retrieve invoice"))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Invoice Service",
    get,
    path = "/invoices/{id}/pdf",
    responses(
        (status = 200, description = "The invoice PDF as application/pdf"),
        (status = 404, description = "Invoice or PDF not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    ),
    params(
        ("id" = i64, Path, description = "ID of the invoice")
    )
)]
pub async fn download_invoice_pdf(id: web::Path<i64>, data: web::Data<AppState>) -> impl Responder {
    let id = id.into_inner();
    info!("Executing download_invoice_pdf handler for invoice {}", id);

    let invoice = match data.get_invoice(id).await {
        Ok(invoice) => invoice,
        Err(DbError::NotFound(_)) => {
            return HttpResponse::NotFound().json(ErrorResponse::not_found(&format!("Invoice {} not found", id)));
        }
        Err(e) => {
            error!("Failed to load invoice {}: {}", id, e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to retrieve invoice"));
        }
    };

    let Some(filename) = invoice.pdf_filename.as_deref() else {
        return HttpResponse::NotFound().json(ErrorResponse::not_found(&format!(
            "Invoice {} has no PDF (status: {})",
            id, invoice.status
        )));
    };

    match data.storage.load(filename).await {
        Ok(Some(pdf)) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(download_filename(id))],
            })
            .body(pdf),
        Ok(None) => {
            error!("PDF file {} for invoice {} is missing", filename, id);
            HttpResponse::NotFound().json(ErrorResponse::not_found("PDF file missing"))
        }
        Err(e) => {
            error!("Failed to read PDF {} for invoice {}: {}", filename, id, e);
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error("Failed to read invoice PDF"))
        }
    }
}
