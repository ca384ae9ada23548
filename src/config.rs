//! Runtime configuration loaded from the environment (and `.env`).

use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_TEMPLATE_DIR: &str = "templates";
const DEFAULT_COMPANY_NAME: &str = "My Company Inc.";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a number between 1 and 65535, got '{0}'")]
    InvalidPort(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// SQLite connection string, e.g. `sqlite://data/invoices.db`.
    pub database_url: String,
    /// Directory the generated PDFs are written to.
    pub pdf_dir: PathBuf,
    /// Directory holding the Tera templates (`invoice.html` and the pages).
    pub template_dir: PathBuf,
    /// Sender shown on the invoice and in the simulated email.
    pub company_name: String,
    /// TrueType font used for characters the bundled DejaVu faces lack.
    pub fallback_font: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or(ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let data_dir = PathBuf::from(non_empty("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()));

        let database_url = non_empty("DATABASE_URL").unwrap_or_else(|| {
            format!("sqlite://{}", data_dir.join("invoices.db").display())
        });

        let pdf_dir = non_empty("PDF_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("pdfs"));

        Ok(AppConfig {
            host: non_empty("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            database_url,
            pdf_dir,
            template_dir: PathBuf::from(
                non_empty("TEMPLATE_DIR").unwrap_or_else(|| DEFAULT_TEMPLATE_DIR.to_string()),
            ),
            company_name: non_empty("COMPANY_NAME").unwrap_or_else(|| DEFAULT_COMPANY_NAME.to_string()),
            fallback_font: non_empty("PDF_FALLBACK_FONT").map(PathBuf::from),
            data_dir,
        })
    }
}
