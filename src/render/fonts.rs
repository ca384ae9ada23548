//! TrueType fonts embedded in the generated PDFs.
//!
//! DejaVu Sans (regular and bold) ships with the crate and covers Latin,
//! Greek and Cyrillic. Scripts it lacks, such as CJK, need a fallback font
//! configured through `PDF_FALLBACK_FONT`; text no loaded font can print is
//! refused instead of being dropped from the document.

use std::collections::HashMap;
use std::path::Path;

use super::RenderError;

const REGULAR_NAME: &str = "DejaVuSans.ttf";
const BOLD_NAME: &str = "DejaVuSans-Bold.ttf";
static REGULAR_TTF: &[u8] = include_bytes!("../../fonts/DejaVuSans.ttf");
static BOLD_TTF: &[u8] = include_bytes!("../../fonts/DejaVuSans-Bold.ttf");

const PT_TO_MM: f32 = 0.3528;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    Regular,
    Bold,
    Fallback,
}

/// Measuring and font selection as seen by the layout.
pub trait TextMeasure {
    /// Face able to print every character of `text`, or the first character
    /// no available face has a glyph for.
    fn face_for(&self, text: &str, bold: bool) -> Result<FontFace, char>;

    /// Advance width of `text` in millimetres at `size` points.
    fn width_mm(&self, text: &str, size: f32, face: FontFace) -> f32;
}

/// One parsed font file: raw bytes for embedding plus per-character advances.
pub struct FontFile {
    name: String,
    data: Vec<u8>,
    units_per_em: f32,
    advances: HashMap<char, u16>,
}

impl FontFile {
    pub fn from_bytes(name: &str, data: Vec<u8>) -> Result<Self, RenderError> {
        let (units_per_em, advances) = {
            let face = ttf_parser::Face::parse(&data, 0)
                .map_err(|e| RenderError::Font(format!("{}: {}", name, e)))?;
            let mut advances = HashMap::new();
            if let Some(cmap) = face.tables().cmap {
                for subtable in cmap.subtables.into_iter().filter(|s| s.is_unicode()) {
                    subtable.codepoints(|code| {
                        let glyph = subtable.glyph_index(code).filter(|g| g.0 > 0);
                        if let (Some(ch), Some(glyph)) = (char::from_u32(code), glyph) {
                            advances
                                .entry(ch)
                                .or_insert_with(|| face.glyph_hor_advance(glyph).unwrap_or(0));
                        }
                    });
                }
            }
            (f32::from(face.units_per_em().max(1)), advances)
        };

        if advances.is_empty() {
            return Err(RenderError::Font(format!("{} has no Unicode character map", name)));
        }

        Ok(Self {
            name: name.to_string(),
            data,
            units_per_em,
            advances,
        })
    }

    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let data = std::fs::read(path).map_err(|e| RenderError::Font(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(&path.display().to_string(), data)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn covers(&self, ch: char) -> bool {
        self.advances.contains_key(&ch)
    }

    pub fn missing_glyph(&self, text: &str) -> Option<char> {
        text.chars().find(|ch| !self.covers(*ch))
    }

    /// Width of `text` in ems.
    pub fn width_em(&self, text: &str) -> f32 {
        let units: u32 = text
            .chars()
            .map(|ch| u32::from(self.advances.get(&ch).copied().unwrap_or(0)))
            .sum();
        units as f32 / self.units_per_em
    }
}

/// Regular and bold faces, plus an optional fallback for other scripts.
pub struct FontSet {
    regular: FontFile,
    bold: FontFile,
    fallback: Option<FontFile>,
}

impl FontSet {
    /// The DejaVu Sans faces compiled into the binary.
    pub fn bundled() -> Result<Self, RenderError> {
        Ok(Self {
            regular: FontFile::from_bytes(REGULAR_NAME, REGULAR_TTF.to_vec())?,
            bold: FontFile::from_bytes(BOLD_NAME, BOLD_TTF.to_vec())?,
            fallback: None,
        })
    }

    pub fn with_fallback(mut self, fallback: FontFile) -> Self {
        log::info!("Using {} as fallback PDF font", fallback.name());
        self.fallback = Some(fallback);
        self
    }

    pub fn file(&self, face: FontFace) -> &FontFile {
        match face {
            FontFace::Regular => &self.regular,
            FontFace::Bold => &self.bold,
            FontFace::Fallback => self.fallback.as_ref().unwrap_or(&self.regular),
        }
    }
}

impl TextMeasure for FontSet {
    fn face_for(&self, text: &str, bold: bool) -> Result<FontFace, char> {
        let (primary, face) = if bold {
            (&self.bold, FontFace::Bold)
        } else {
            (&self.regular, FontFace::Regular)
        };
        let Some(missing) = primary.missing_glyph(text) else {
            return Ok(face);
        };
        match &self.fallback {
            Some(fallback) => match fallback.missing_glyph(text) {
                None => Ok(FontFace::Fallback),
                Some(ch) => Err(ch),
            },
            None => Err(missing),
        }
    }

    fn width_mm(&self, text: &str, size: f32, face: FontFace) -> f32 {
        self.file(face).width_em(text) * size * PT_TO_MM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_faces_cover_latin_extended() {
        let fonts = FontSet::bundled().unwrap();
        assert_eq!(fonts.face_for("Zoë Müller, Ørsted Åsa", false), Ok(FontFace::Regular));
        assert_eq!(fonts.face_for("Σωκράτης Дмитрий", true), Ok(FontFace::Bold));
    }

    #[test]
    fn test_uncovered_text_reports_the_character() {
        let fonts = FontSet::bundled().unwrap();
        assert_eq!(fonts.face_for("Client 東京商事", false), Err('東'));
    }

    #[test]
    fn test_fallback_face_used_when_primary_lacks_glyphs() {
        // The bold face stands in for a fallback here; the layout only needs
        // the selection to move off the primary face.
        let mut fonts = FontSet::bundled().unwrap();
        fonts.regular.advances.remove(&'ë');
        let fonts = fonts.with_fallback(FontFile::from_bytes("bold", BOLD_TTF.to_vec()).unwrap());

        assert_eq!(fonts.face_for("Zoë", false), Ok(FontFace::Fallback));
        assert_eq!(fonts.face_for("Zoe", false), Ok(FontFace::Regular));
        assert_eq!(fonts.file(FontFace::Fallback).name(), "bold");
    }

    #[test]
    fn test_widths_follow_glyph_advances() {
        let fonts = FontSet::bundled().unwrap();
        let narrow = fonts.width_mm("iiii", 10.0, FontFace::Regular);
        let wide = fonts.width_mm("WWWW", 10.0, FontFace::Regular);
        assert!(narrow > 0.0);
        assert!(wide > narrow * 2.0);
        assert!(fonts.width_mm("Total", 10.0, FontFace::Bold) > fonts.width_mm("Total", 10.0, FontFace::Regular));
        assert_eq!(fonts.width_mm("", 10.0, FontFace::Regular), 0.0);
    }

    #[test]
    fn test_invalid_font_data_is_rejected() {
        assert!(matches!(
            FontFile::from_bytes("junk", b"not a font".to_vec()),
            Err(RenderError::Font(_))
        ));
    }
}
