//! Database module - AppState and database operations
//!
//! Invoice persistence lives in `invoice`; this file wires the shared state
//! (pool, PDF storage, renderer, mailer) the handlers receive.

mod invoice;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::AppConfig;
use crate::mail::EmailSimulator;
use crate::render::{FontFile, FontSet, InvoiceRenderer, TemplateSet};
use crate::storage::{LocalPdfStorage, PdfStorage};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("invoice {0} not found")]
    NotFound(i64),
    #[error("invoice {0} already has its final status")]
    AlreadyFinalized(i64),
    #[error("invoice {id} has unreadable line items: {source}")]
    CorruptLineItems {
        id: i64,
        #[source]
        source: serde_json::Error,
    },
    #[error("invoice {id} has unknown status '{status}'")]
    UnknownStatus { id: i64, status: String },
    #[error("failed to encode line items: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub storage: Arc<dyn PdfStorage>,
    pub renderer: Arc<InvoiceRenderer>,
    pub mailer: Arc<EmailSimulator>,
}

impl AppState {
    pub async fn new_with_config(config: &AppConfig) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let pool = connect(&config.database_url).await?;
        let storage = Arc::new(LocalPdfStorage::new(&config.pdf_dir)?);
        let mut fonts = FontSet::bundled()?;
        if let Some(path) = &config.fallback_font {
            fonts = fonts.with_fallback(FontFile::load(path)?);
        }
        let templates = TemplateSet::from_dir(&config.template_dir)?;
        let renderer = Arc::new(InvoiceRenderer::new(templates, fonts, &config.company_name));
        let mailer = Arc::new(EmailSimulator::new(&config.company_name));

        log::info!(
            "State ready: database {}, PDFs in {}, templates from {}",
            config.database_url,
            config.pdf_dir.display(),
            config.template_dir.display()
        );

        Ok(Self::new_with_pool_and_storage(pool, storage, renderer, mailer))
    }

    pub fn new_with_pool_and_storage(
        pool: SqlitePool,
        storage: Arc<dyn PdfStorage>,
        renderer: Arc<InvoiceRenderer>,
        mailer: Arc<EmailSimulator>,
    ) -> Self {
        AppState {
            pool,
            storage,
            renderer,
            mailer,
        }
    }
}

/// Open (creating if needed) the SQLite database and apply migrations.
pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}
