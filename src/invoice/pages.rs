//! Browser pages: dashboard with the form, history, confirmation.

use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};
use log::{error, info, warn};
use serde::Serialize;
use tera::Context;

use super::models::{InvoiceInput, RawLineItem};
use super::validation::{ValidationErrors, Validator};
use super::workflow::create_and_send;
use crate::db::AppState;
use crate::render::{InvoiceView, SummaryView};

/// Empty rows offered on a fresh form.
const BLANK_ROWS: usize = 3;

#[derive(Serialize)]
struct FieldErrorView<'a> {
    field: &'a str,
    message: &'a str,
    suggestion: Option<&'a str>,
}

fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status).content_type(ContentType::html()).body(body)
}

fn render_page(data: &AppState, status: StatusCode, name: &str, context: &Context) -> HttpResponse {
    match data.renderer.render_page(name, context) {
        Ok(body) => html(status, body),
        Err(e) => {
            error!("Failed to render page {}: {:?}", name, e);
            HttpResponse::InternalServerError()
                .content_type(ContentType::plaintext())
                .body("Internal Server Error")
        }
    }
}

pub(crate) fn error_page(data: &AppState, status: StatusCode, message: &str) -> HttpResponse {
    let mut context = Context::new();
    context.insert("message", message);
    render_page(data, status, "error.html", &context)
}

/// Dashboard: form (optionally refilled with errors) plus recent invoices.
async fn dashboard(data: &AppState, status: StatusCode, input: &InvoiceInput, errors: &ValidationErrors) -> HttpResponse {
    let invoices = match data.list_invoices().await {
        Ok(invoices) => invoices,
        Err(e) => {
            error!("Failed to list invoices for dashboard: {}", e);
            return error_page(data, StatusCode::INTERNAL_SERVER_ERROR, "Failed to retrieve invoices.");
        }
    };

    let mut rows = input.line_items.clone();
    if rows.len() < BLANK_ROWS {
        rows.resize(BLANK_ROWS, RawLineItem::default());
    } else {
        rows.push(RawLineItem::default());
    }

    let error_views: Vec<FieldErrorView> = errors
        .errors()
        .iter()
        .map(|e| FieldErrorView {
            field: &e.field,
            message: &e.message,
            suggestion: e.suggestion.as_deref(),
        })
        .collect();
    let summaries: Vec<SummaryView> = invoices.iter().map(SummaryView::from).collect();

    let mut context = Context::new();
    context.insert("form", input);
    context.insert("rows", &rows);
    context.insert("errors", &error_views);
    context.insert("error_summary", &errors.summary());
    context.insert("invoices", &summaries);
    render_page(data, status, "dashboard.html", &context)
}

pub async fn index(data: web::Data<AppState>) -> impl Responder {
    dashboard(&data, StatusCode::OK, &InvoiceInput::default(), &ValidationErrors::new()).await
}

pub async fn history(data: web::Data<AppState>) -> impl Responder {
    match data.list_invoices().await {
        Ok(invoices) => {
            let summaries: Vec<SummaryView> = invoices.iter().map(SummaryView::from).collect();
            let mut context = Context::new();
            context.insert("invoices", &summaries);
            render_page(&data, StatusCode::OK, "history.html", &context)
        }
        Err(e) => {
            error!("Failed to list invoices: {}", e);
            error_page(&data, StatusCode::INTERNAL_SERVER_ERROR, "Failed to retrieve invoices.")
        }
    }
}

/// Form submission. Answers the confirmation page, the form again with
/// field errors (422), or the error page (500).
pub async fn submit_invoice_form(form: web::Form<Vec<(String, String)>>, data: web::Data<AppState>) -> impl Responder {
    info!("Executing submit_invoice_form handler");
    let input = InvoiceInput::from_form_pairs(form.into_inner());

    let new_invoice = match input.validate() {
        Ok(invoice) => invoice,
        Err(errors) => {
            warn!("Rejected invoice form: {}", errors);
            return dashboard(&data, StatusCode::UNPROCESSABLE_ENTITY, &input, &errors).await;
        }
    };

    match create_and_send(&data, new_invoice).await {
        Ok(invoice) => {
            let mut context = Context::new();
            context.insert("invoice", &InvoiceView::new(&invoice, data.renderer.company_name()));
            render_page(&data, StatusCode::OK, "confirmation.html", &context)
        }
        Err(e) => {
            error!("Invoice form processing failed: {}", e);
            error_page(
                &data,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error generating invoice. Please check the logs.",
            )
        }
    }
}
