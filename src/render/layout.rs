//! HTML to page layout.
//!
//! The filled template is parsed with `scraper` into a flat list of blocks
//! (headings, paragraphs, table rows) in document order, which are then
//! placed on A4 pages as positioned text runs, measured with the glyph
//! advances of the fonts that will print them. Nothing here touches the PDF
//! writer.

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

use super::fonts::{FontFace, TextMeasure};
use super::RenderError;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 20.0;

const PT_TO_MM: f32 = 0.3528;
const LINE_SPACING: f32 = 1.45;
const BODY_SIZE: f32 = 10.0;
const CELL_PADDING_MM: f32 = 2.0;

lazy_static! {
    static ref BLOCK_SELECTOR: Selector =
        Selector::parse("h1, h2, h3, p, tr").expect("block selector is valid");
    static ref CELL_SELECTOR: Selector = Selector::parse("th, td").expect("cell selector is valid");
    static ref HEADER_CELL_SELECTOR: Selector = Selector::parse("th").expect("header selector is valid");
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    Row { cells: Vec<String>, header: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    /// Font size in points.
    pub size: f32,
    pub face: FontFace,
    /// Baseline position in millimetres from the bottom-left corner.
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub runs: Vec<TextRun>,
}

fn collapse_whitespace(element: &ElementRef) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the printable blocks of an HTML document, in document order.
pub fn extract_blocks(html: &str) -> Vec<Block> {
    let document = Html::parse_document(html);
    let mut blocks = Vec::new();

    for element in document.select(&BLOCK_SELECTOR) {
        match element.value().name() {
            "tr" => {
                let cells: Vec<String> = element.select(&CELL_SELECTOR).map(|c| collapse_whitespace(&c)).collect();
                if cells.iter().all(|c| c.is_empty()) {
                    continue;
                }
                let header = element.select(&HEADER_CELL_SELECTOR).next().is_some();
                blocks.push(Block::Row { cells, header });
            }
            name => {
                let text = collapse_whitespace(&element);
                if text.is_empty() {
                    continue;
                }
                let block = match name {
                    "h1" => Block::Heading { level: 1, text },
                    "h2" => Block::Heading { level: 2, text },
                    "h3" => Block::Heading { level: 3, text },
                    _ => Block::Paragraph(text),
                };
                blocks.push(block);
            }
        }
    }

    blocks
}

fn line_height_mm(size: f32) -> f32 {
    size * PT_TO_MM * LINE_SPACING
}

/// Split a word wider than `max_width` into pieces that fit.
fn split_word(word: &str, max_width: f32, width: &impl Fn(&str) -> f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        current.push(ch);
        if width(&current) > max_width && current.chars().count() > 1 {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(ch);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Greedy word wrap to `max_width`, measured with `width`. Words wider
/// than a line are split.
pub fn wrap_text(text: &str, max_width: f32, width: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if width(&candidate) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if width(word) <= max_width {
            current = word.to_string();
        } else {
            let mut pieces = split_word(word, max_width, &width);
            current = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Left edges and widths of the columns of a row with `count` cells. The
/// first column takes 45% of the content width, the others share the rest.
fn column_edges(count: usize) -> Vec<(f32, f32)> {
    let content = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    match count {
        0 => Vec::new(),
        1 => vec![(MARGIN_MM, content)],
        n => {
            let first = content * 0.45;
            let other = (content - first) / (n - 1) as f32;
            let mut edges = vec![(MARGIN_MM, first)];
            for i in 0..n - 1 {
                edges.push((MARGIN_MM + first + other * i as f32, other));
            }
            edges
        }
    }
}

struct Cursor {
    pages: Vec<PageLayout>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![PageLayout::default()],
            y: PAGE_HEIGHT_MM - MARGIN_MM,
        }
    }

    fn at_page_top(&self) -> bool {
        self.y >= PAGE_HEIGHT_MM - MARGIN_MM
    }

    fn new_page(&mut self) {
        self.pages.push(PageLayout::default());
        self.y = PAGE_HEIGHT_MM - MARGIN_MM;
    }

    /// Start a new page unless `height` still fits on the current one.
    fn reserve(&mut self, height: f32) {
        if self.y - height < MARGIN_MM && !self.at_page_top() {
            self.new_page();
        }
    }

    /// Move down one line of the given height, starting a page when full.
    /// Returns the page index and baseline of the line.
    fn advance(&mut self, height: f32) -> (usize, f32) {
        if self.y - height < MARGIN_MM {
            self.new_page();
        }
        self.y -= height;
        (self.pages.len() - 1, self.y)
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn push(&mut self, page: usize, run: TextRun) {
        if let Some(page) = self.pages.get_mut(page) {
            page.runs.push(run);
        }
    }
}

fn select_face(fonts: &impl TextMeasure, text: &str, bold: bool) -> Result<FontFace, RenderError> {
    fonts.face_for(text, bold).map_err(RenderError::UnsupportedCharacter)
}

/// Place blocks on pages. Always returns at least one page.
pub fn layout_blocks(blocks: &[Block], fonts: &impl TextMeasure) -> Result<Vec<PageLayout>, RenderError> {
    let content_width = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    let mut cursor = Cursor::new();

    for block in blocks {
        match block {
            Block::Heading { level, text } => {
                let size = match level {
                    1 => 20.0,
                    2 => 14.0,
                    _ => 12.0,
                };
                let face = select_face(fonts, text, true)?;
                cursor.gap(line_height_mm(size) * 0.3);
                for line in wrap_text(text, content_width, |s| fonts.width_mm(s, size, face)) {
                    let (page, y) = cursor.advance(line_height_mm(size));
                    cursor.push(page, TextRun { text: line, size, face, x: MARGIN_MM, y });
                }
            }
            Block::Paragraph(text) => {
                let face = select_face(fonts, text, false)?;
                for line in wrap_text(text, content_width, |s| fonts.width_mm(s, BODY_SIZE, face)) {
                    let (page, y) = cursor.advance(line_height_mm(BODY_SIZE));
                    cursor.push(page, TextRun { text: line, size: BODY_SIZE, face, x: MARGIN_MM, y });
                }
                cursor.gap(line_height_mm(BODY_SIZE) * 0.3);
            }
            Block::Row { cells, header } => {
                let mut columns = Vec::new();
                for (cell, (x, width)) in cells.iter().zip(column_edges(cells.len())) {
                    if cell.is_empty() {
                        continue;
                    }
                    let face = select_face(fonts, cell, *header)?;
                    let lines = wrap_text(cell, width - CELL_PADDING_MM, |s| fonts.width_mm(s, BODY_SIZE, face));
                    columns.push((x, face, lines));
                }

                let height = columns.iter().map(|(_, _, lines)| lines.len()).max().unwrap_or(0);
                cursor.reserve(line_height_mm(BODY_SIZE) * height as f32);
                let baselines: Vec<(usize, f32)> =
                    (0..height).map(|_| cursor.advance(line_height_mm(BODY_SIZE))).collect();

                // Cell by cell, so each cell reads as consecutive lines.
                for (x, face, lines) in columns {
                    for (line, (page, y)) in lines.into_iter().zip(baselines.iter().copied()) {
                        cursor.push(page, TextRun { text: line, size: BODY_SIZE, face, x, y });
                    }
                }
            }
        }
    }

    Ok(cursor.pages)
}

/// Text lines of a layout in reading order.
pub fn text_lines(pages: &[PageLayout]) -> Vec<String> {
    pages.iter().flat_map(|p| p.runs.iter().map(|r| r.text.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <html><body>
          <h1>Invoice</h1>
          <p>Bill to:   <strong>Acme</strong> &amp; Co</p>
          <table>
            <thead><tr><th>Description</th><th>Qty</th></tr></thead>
            <tbody>
              <tr><td>Design</td><td>2</td></tr>
              <tr><td></td><td></td></tr>
            </tbody>
          </table>
          <p>   </p>
        </body></html>
    "#;

    #[test]
    fn test_extract_blocks_in_document_order() {
        let blocks = extract_blocks(SAMPLE);
        assert_eq!(
            blocks,
            vec![
                Block::Heading { level: 1, text: "Invoice".to_string() },
                Block::Paragraph("Bill to: Acme & Co".to_string()),
                Block::Row { cells: vec!["Description".to_string(), "Qty".to_string()], header: true },
                Block::Row { cells: vec!["Design".to_string(), "2".to_string()], header: false },
            ]
        );
    }

    /// Every glyph half an em wide; CJK characters are not printable.
    struct HalfEm;

    impl TextMeasure for HalfEm {
        fn face_for(&self, text: &str, bold: bool) -> Result<FontFace, char> {
            match text.chars().find(|c| ('\u{4e00}'..='\u{9fff}').contains(c)) {
                Some(ch) => Err(ch),
                None if bold => Ok(FontFace::Bold),
                None => Ok(FontFace::Regular),
            }
        }

        fn width_mm(&self, text: &str, size: f32, _face: FontFace) -> f32 {
            text.chars().count() as f32 * size * PT_TO_MM * 0.5
        }
    }

    fn chars(s: &str) -> f32 {
        s.chars().count() as f32
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("one two three", 7.0, chars), vec!["one two", "three"]);
        assert_eq!(wrap_text("abcdefghij", 4.0, chars), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("ab abcdefghij", 4.0, chars), vec!["ab", "abcd", "efgh", "ij"]);
        assert!(wrap_text("   ", 10.0, chars).is_empty());
    }

    #[test]
    fn test_layout_starts_new_pages() {
        let blocks: Vec<Block> = (0..200).map(|i| Block::Paragraph(format!("line {}", i))).collect();
        let pages = layout_blocks(&blocks, &HalfEm).unwrap();
        assert!(pages.len() > 1);
        for page in &pages {
            for run in &page.runs {
                assert!(run.y >= MARGIN_MM);
                assert!(run.y <= PAGE_HEIGHT_MM - MARGIN_MM);
            }
        }
        assert_eq!(text_lines(&pages).len(), 200);
    }

    #[test]
    fn test_empty_document_has_one_page() {
        let pages = layout_blocks(&[], &HalfEm).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].runs.is_empty());
    }

    #[test]
    fn test_long_cells_wrap_without_losing_text() {
        let description = "Annual maintenance contract for the corporate website including \
                           security updates, uptime monitoring, monthly content changes and \
                           quarterly performance reviews with a written report for the board";
        let pages = layout_blocks(
            &[Block::Row {
                cells: vec![description.to_string(), "1".to_string(), "12,000.00".to_string()],
                header: false,
            }],
            &HalfEm,
        )
        .unwrap();

        let runs = &pages[0].runs;
        let description_runs: Vec<&TextRun> = runs.iter().filter(|r| r.x == MARGIN_MM).collect();
        assert!(description_runs.len() > 1);
        let joined: Vec<&str> = description_runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(joined.join(" "), description);

        let (_, first_width) = column_edges(3)[0];
        for run in &description_runs {
            assert!(HalfEm.width_mm(&run.text, run.size, run.face) <= first_width - CELL_PADDING_MM);
        }
        // Other cells sit on the first line of the row.
        let quantity = runs.iter().find(|r| r.text == "1").unwrap();
        assert_eq!(quantity.y, description_runs[0].y);
    }

    #[test]
    fn test_rows_are_not_split_across_pages() {
        let mut blocks: Vec<Block> = (0..37).map(|i| Block::Paragraph(format!("line {}", i))).collect();
        blocks.push(Block::Row {
            cells: vec!["word ".repeat(60), "2".to_string()],
            header: false,
        });
        let pages = layout_blocks(&blocks, &HalfEm).unwrap();

        assert_eq!(pages.len(), 2);
        assert!(pages[1].runs.iter().any(|r| r.text == "2"));
        assert!(pages[1].runs.iter().all(|r| !r.text.starts_with("line")));
    }

    #[test]
    fn test_unprintable_text_is_an_error() {
        let result = layout_blocks(&[Block::Paragraph("Client 東京商事".to_string())], &HalfEm);
        assert!(matches!(result, Err(RenderError::UnsupportedCharacter('東'))));
    }
}
