#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use lopdf::content::Content;
use lopdf::{Document, Object};
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Mutex;

use invoice_server::db::{self, AppState};
use invoice_server::invoice::models::{Invoice, InvoiceStatus, LineItem, NewInvoice};
use invoice_server::mail::EmailSimulator;
use invoice_server::render::common::bundled_template_dir;
use invoice_server::render::InvoiceRenderer;
use invoice_server::storage::{LocalPdfStorage, PdfStorage};

pub const COMPANY: &str = "Test Company Ltd.";

/// Application state backed by a throwaway SQLite file; keep `dir` alive
/// for the duration of the test.
pub struct TestContext {
    pub state: AppState,
    pub dir: TempDir,
}

pub fn test_renderer() -> Arc<InvoiceRenderer> {
    Arc::new(InvoiceRenderer::from_dir(bundled_template_dir(), COMPANY).expect("bundled templates load"))
}

pub async fn setup_with_storage<F>(make_storage: F) -> TestContext
where
    F: FnOnce(&TempDir) -> Arc<dyn PdfStorage>,
{
    let dir = tempfile::tempdir().expect("create temp dir");
    let database_url = format!("sqlite://{}", dir.path().join("invoices.db").display());
    let pool = db::connect(&database_url).await.expect("open test database");
    let storage = make_storage(&dir);
    let state = AppState::new_with_pool_and_storage(pool, storage, test_renderer(), Arc::new(EmailSimulator::new(COMPANY)));
    TestContext { state, dir }
}

/// State with PDFs written to `<tmp>/pdfs`.
pub async fn setup_test_state() -> TestContext {
    setup_with_storage(|dir| Arc::new(LocalPdfStorage::new(dir.path().join("pdfs")).expect("create pdf dir"))).await
}

pub fn sample_new_invoice(client_name: &str) -> NewInvoice {
    NewInvoice::new(
        client_name,
        "billing@example.com",
        vec![LineItem::new("Website redesign", 3, 12_500), LineItem::new("Hosting (12 months)", 12, 999)],
    )
    .expect("total fits")
}

pub fn sample_invoice(id: i64) -> Invoice {
    let new_invoice = sample_new_invoice("Acme Corp");
    Invoice {
        id,
        client_name: new_invoice.client_name,
        client_email: new_invoice.client_email,
        line_items: new_invoice.line_items,
        total_cents: new_invoice.total_cents,
        created_at: Utc::now(),
        status: InvoiceStatus::Created,
        pdf_filename: None,
    }
}

/// Text drawn by each `Tj` operator of a PDF, in page order, decoded through
/// the fonts' ToUnicode maps.
pub fn pdf_text(pdf: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(pdf).expect("parse pdf");
    let mut lines = Vec::new();

    for page_id in doc.get_pages().into_values() {
        let mut cmaps: HashMap<Vec<u8>, HashMap<u16, char>> = HashMap::new();
        for (name, font) in doc.get_page_fonts(page_id) {
            let Ok(stream) = font
                .get(b"ToUnicode")
                .and_then(Object::as_reference)
                .and_then(|id| doc.get_object(id))
                .and_then(Object::as_stream)
            else {
                continue;
            };
            let data = stream.decompressed_content().unwrap_or_else(|_| stream.content.clone());
            cmaps.insert(name, parse_to_unicode(&String::from_utf8_lossy(&data)));
        }

        let content = Content::decode(&doc.get_page_content(page_id).expect("page content")).expect("decode content");
        let mut font: Vec<u8> = Vec::new();
        for op in content.operations {
            match op.operator.as_str() {
                "Tf" => font = op.operands[0].as_name().expect("font name").to_vec(),
                "Tj" => {
                    let bytes = op.operands[0].as_str().expect("text operand");
                    let cmap = cmaps.get(&font).expect("font has a ToUnicode map");
                    let text: String = bytes
                        .chunks(2)
                        .map(|pair| {
                            let glyph = u16::from_be_bytes([pair[0], pair[1]]);
                            *cmap.get(&glyph).unwrap_or_else(|| panic!("glyph {} has no character", glyph))
                        })
                        .collect();
                    lines.push(text);
                }
                _ => {}
            }
        }
    }
    lines
}

fn parse_to_unicode(cmap: &str) -> HashMap<u16, char> {
    let mut map = HashMap::new();
    let mut in_block = false;
    for line in cmap.lines().map(str::trim) {
        if line.ends_with("beginbfchar") {
            in_block = true;
        } else if line == "endbfchar" {
            in_block = false;
        } else if in_block {
            let codes: Vec<&str> = line.split_whitespace().map(|code| code.trim_matches(|c| c == '<' || c == '>')).collect();
            if let [glyph, unicode] = codes[..] {
                let glyph = u16::from_str_radix(glyph, 16).expect("glyph id");
                let unicode = u32::from_str_radix(unicode, 16).expect("code point");
                if let Some(ch) = char::from_u32(unicode) {
                    map.insert(glyph, ch);
                }
            }
        }
    }
    map
}

/// In-memory PDF storage that can be told to fail writes.
pub struct MockPdfStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
    fail_saves: bool,
}

impl MockPdfStorage {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            fail_saves: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            fail_saves: true,
        }
    }

    pub async fn has_file(&self, filename: &str) -> bool {
        self.files.lock().await.contains_key(filename)
    }

    pub async fn file_count(&self) -> usize {
        self.files.lock().await.len()
    }
}

#[async_trait]
impl PdfStorage for MockPdfStorage {
    async fn save(&self, filename: &str, pdf: &[u8]) -> io::Result<()> {
        if self.fail_saves {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        self.files.lock().await.insert(filename.to_string(), pdf.to_vec());
        Ok(())
    }

    async fn load(&self, filename: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.files.lock().await.get(filename).cloned())
    }

    async fn remove(&self, filename: &str) -> io::Result<()> {
        self.files.lock().await.remove(filename);
        Ok(())
    }
}
