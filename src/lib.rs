use actix_web::error::InternalError;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::middleware::{Compress, Logger};
use actix_web::{web, App, HttpResponse, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod db;
pub mod invoice;
pub mod mail;
pub mod render;
pub mod storage;

pub use crate::config::AppConfig;
pub use crate::db::AppState;

use crate::invoice::validation::{ValidationError, ValidationErrors};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
    /// Field-level problems, only present for validation failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<ValidationError>,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            fields: Vec::new(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn unprocessable(message: &str) -> Self {
        Self::new("UnprocessableEntity", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }

    pub fn validation(errors: &ValidationErrors) -> Self {
        Self {
            fields: errors.errors().to_vec(),
            ..Self::new("ValidationFailed", &errors.summary())
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::invoice::handlers::create_invoice,
        crate::invoice::handlers::list_invoices,
        crate::invoice::handlers::get_invoice,
        crate::invoice::handlers::download_invoice_pdf
    ),
    components(
        schemas(
            invoice::models::Invoice,
            invoice::models::InvoiceStatus,
            invoice::models::InvoiceSummary,
            invoice::models::LineItem,
            invoice::models::CreateInvoiceRequest,
            invoice::models::CreateLineItemRequest,
            ValidationError,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Invoice Service", description = "Create invoices, list history and download PDFs.")
    )
)]
pub struct ApiDoc;

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Undecodable bodies answer 422 like failed validation: an HTML error page
/// for the form, a JSON error for the API.
fn body_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().error_handler(|err, req| {
        log::warn!("Invalid form submission: {}", err);
        let response = match req.app_data::<web::Data<AppState>>() {
            Some(data) => invoice::pages::error_page(
                data,
                StatusCode::UNPROCESSABLE_ENTITY,
                "The form submission could not be read. Please go back and try again.",
            ),
            None => HttpResponse::UnprocessableEntity()
                .content_type(ContentType::plaintext())
                .body("Invalid form submission"),
        };
        InternalError::from_response(err, response).into()
    }))
    .app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid JSON body: {}", err);
        log::warn!("{}", message);
        InternalError::from_response(err, HttpResponse::UnprocessableEntity().json(ErrorResponse::unprocessable(&message)))
            .into()
    }));
}

/// All application routes, shared by the server and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    body_config(cfg);
    cfg.service(web::resource("/").route(web::get().to(invoice::pages::index)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(
            web::resource("/invoices")
                .route(web::get().to(invoice::pages::history))
                .route(web::post().to(invoice::pages::submit_invoice_form)),
        )
        .service(
            web::resource("/invoices/{id}/pdf").route(web::get().to(invoice::handlers::download_invoice_pdf)),
        )
        .service(
            web::scope("/api")
                .service(
                    web::resource("/invoices")
                        .route(web::get().to(invoice::handlers::list_invoices))
                        .route(web::post().to(invoice::handlers::create_invoice)),
                )
                .service(web::resource("/invoices/{id}").route(web::get().to(invoice::handlers::get_invoice)))
                .service(
                    web::resource("/invoices/{id}/pdf")
                        .route(web::get().to(invoice::handlers::download_invoice_pdf)),
                ),
        );
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    let app_state = match AppState::new_with_config(&config).await {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!(
                "Failed to initialise application state. Check DATABASE_URL, PDF_DIR and TEMPLATE_DIR. Error: {:#}",
                e
            );
            return Err(e);
        }
    };

    let prometheus = PrometheusMetricsBuilder::new("invoice_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| anyhow::anyhow!("failed to create Prometheus metrics middleware: {}", e))?;

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .wrap(prometheus.clone())
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .configure(configure)
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
