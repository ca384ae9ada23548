//! PDF rendering engine.
//!
//! Turns a filled HTML document into PDF bytes: blocks are extracted and laid
//! out by [`super::layout`], then written page by page with `printpdf`. The
//! TrueType faces of the [`FontSet`] are embedded in every document, so any
//! character they have a glyph for prints as itself.

use std::collections::HashMap;

use printpdf::{IndirectFontRef, Mm, PdfDocument};

use super::fonts::{FontFace, FontSet};
use super::layout::{extract_blocks, layout_blocks, text_lines, PageLayout, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use super::RenderError;

const LAYER_NAME: &str = "Content";

/// Output of the engine: the PDF plus the text it contains.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub pdf: Vec<u8>,
    pub text: Vec<String>,
    pub pages: usize,
}

/// Converts HTML to PDF with one set of fonts.
pub struct PdfRenderEngine {
    fonts: FontSet,
}

impl PdfRenderEngine {
    pub fn new(fonts: FontSet) -> Self {
        Self { fonts }
    }

    /// Render an HTML string to a PDF document titled `title`.
    pub fn render(&self, title: &str, html: &str) -> Result<RenderedPdf, RenderError> {
        let blocks = extract_blocks(html);
        if blocks.is_empty() {
            return Err(RenderError::EmptyDocument);
        }
        let pages = layout_blocks(&blocks, &self.fonts)?;
        let pdf = self.write_pdf(title, &pages)?;

        Ok(RenderedPdf {
            text: text_lines(&pages),
            pages: pages.len(),
            pdf,
        })
    }

    fn write_pdf(&self, title: &str, pages: &[PageLayout]) -> Result<Vec<u8>, RenderError> {
        let (doc, first_page, first_layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);

        // Only faces the layout actually uses get embedded.
        let mut fonts: HashMap<FontFace, IndirectFontRef> = HashMap::new();
        for run in pages.iter().flat_map(|page| page.runs.iter()) {
            if !fonts.contains_key(&run.face) {
                let font = doc
                    .add_external_font(self.fonts.file(run.face).data())
                    .map_err(|e| RenderError::Pdf(e.to_string()))?;
                fonts.insert(run.face, font);
            }
        }

        for (index, page) in pages.iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page_index, layer_index) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
                doc.get_page(page_index).get_layer(layer_index)
            };

            for run in &page.runs {
                if let Some(font) = fonts.get(&run.face) {
                    layer.use_text(run.text.as_str(), run.size, Mm(run.x), Mm(run.y), font);
                }
            }
        }

        doc.save_to_bytes().map_err(|e| RenderError::Pdf(e.to_string()))
    }
}
