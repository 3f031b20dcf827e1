//! Font discovery, matching and glyph metrics.
//!
//! Faces come from fontdb; metrics and outlines are read with ttf-parser.
//! When no face matches a run, approximate metrics keep layout going so
//! text is never dropped.

use fontdb::{Database, Family, Query, Stretch, Style, Weight, ID};
use pptx2img_core::{Error, FontSpec, RenderConfig, Result, DEFAULT_FONT_FAMILY};
use ttf_parser::{Face, GlyphId, OutlineBuilder};

/// Average advance of a glyph as a fraction of the font size, without a face.
const APPROX_ADVANCE: f32 = 0.55;
const APPROX_SPACE: f32 = 0.25;
const APPROX_ASCENT: f32 = 0.8;
const APPROX_DESCENT: f32 = 0.2;
const APPROX_LINE_GAP: f32 = 0.2;

/// Tab stops every this many space widths.
const TAB_SPACES: f32 = 4.0;

/// Vertical metrics in points for one font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    pub ascent: f32,
    /// Distance below the baseline, positive.
    pub descent: f32,
    pub line_gap: f32,
}

impl LineMetrics {
    fn approximate(size: f32) -> Self {
        Self {
            ascent: APPROX_ASCENT * size,
            descent: APPROX_DESCENT * size,
            line_gap: APPROX_LINE_GAP * size,
        }
    }

    /// Natural single-spaced line height.
    pub fn height(&self) -> f32 {
        self.ascent + self.descent + self.line_gap
    }

    /// Component-wise maximum.
    pub fn max(self, other: LineMetrics) -> Self {
        Self {
            ascent: self.ascent.max(other.ascent),
            descent: self.descent.max(other.descent),
            line_gap: self.line_gap.max(other.line_gap),
        }
    }
}

/// Text measured in one face: one advance per `char`.
#[derive(Debug, Clone, PartialEq)]
pub struct Measured {
    /// Matched face, or `None` for approximate metrics.
    pub face: Option<ID>,
    pub advances: Vec<f32>,
    pub metrics: LineMetrics,
}

/// Installed and bundled fonts available to the renderer.
pub struct FontLibrary {
    db: Database,
    default_family: String,
}

impl FontLibrary {
    /// Load fonts as configured: system fonts, then each font directory.
    pub fn new(config: &RenderConfig) -> Result<Self> {
        let mut db = Database::new();
        if config.load_system_fonts {
            db.load_system_fonts();
        }
        for dir in &config.font_dirs {
            if !dir.is_dir() {
                return Err(Error::FontError(format!(
                    "Font directory '{}' does not exist",
                    dir.display()
                )));
            }
            db.load_fonts_dir(dir);
        }
        log::debug!("Font library loaded {} faces", db.len());
        Ok(Self {
            db,
            default_family: config.default_font_family.clone(),
        })
    }

    /// A library with no faces; every run uses approximate metrics.
    pub fn empty() -> Self {
        Self {
            db: Database::new(),
            default_family: DEFAULT_FONT_FAMILY.to_string(),
        }
    }

    /// Add a font file held in memory.
    pub fn load_font_data(&mut self, data: Vec<u8>) {
        self.db.load_font_data(data);
    }

    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    pub fn default_family(&self) -> &str {
        &self.default_family
    }

    /// Whether a face of exactly this family is installed.
    pub fn has_family(&self, family: &str) -> bool {
        self.db
            .faces()
            .any(|face| face.families.iter().any(|(name, _)| name.eq_ignore_ascii_case(family)))
    }

    /// Best face for a run: the requested family, then the default family,
    /// then any sans-serif face.
    pub fn resolve(&self, font: &FontSpec) -> Option<ID> {
        let families = [
            Family::Name(font.family.as_str()),
            Family::Name(self.default_family.as_str()),
            Family::SansSerif,
        ];
        self.db.query(&Query {
            families: &families,
            weight: if font.bold { Weight::BOLD } else { Weight::NORMAL },
            stretch: Stretch::Normal,
            style: if font.italic { Style::Italic } else { Style::Normal },
        })
    }

    /// Measure `text` set in `font`.
    pub fn measure(&self, font: &FontSpec, text: &str) -> Measured {
        let size = font.size;
        let measured = self.resolve(font).and_then(|id| {
            self.db.with_face_data(id, |data, index| {
                let face = Face::parse(data, index).ok()?;
                let em = face.units_per_em().max(1) as f32;
                let to_pt = |units: f32| units / em * size;
                let space = face
                    .glyph_index(' ')
                    .and_then(|g| face.glyph_hor_advance(g))
                    .map(|a| to_pt(a as f32))
                    .unwrap_or(APPROX_SPACE * size);
                let advances = text
                    .chars()
                    .map(|ch| match ch {
                        '\n' => 0.0,
                        '\t' => space * TAB_SPACES,
                        _ => face
                            .glyph_index(ch)
                            .and_then(|g| face.glyph_hor_advance(g))
                            .map(|a| to_pt(a as f32))
                            .unwrap_or(APPROX_ADVANCE * size),
                    })
                    .collect();
                let metrics = LineMetrics {
                    ascent: to_pt(face.ascender() as f32),
                    descent: to_pt(-(face.descender() as f32)),
                    line_gap: to_pt(face.line_gap() as f32),
                };
                Some(Measured {
                    face: Some(id),
                    advances,
                    metrics,
                })
            })?
        });
        measured.unwrap_or_else(|| Measured {
            face: None,
            advances: text.chars().map(|ch| approximate_advance(ch, size)).collect(),
            metrics: LineMetrics::approximate(size),
        })
    }

    /// Vertical metrics for `font` without measuring any text.
    pub fn metrics(&self, font: &FontSpec) -> LineMetrics {
        self.measure(font, "").metrics
    }

    /// Glyph outlines for `text` in `face`, in points with the origin at
    /// the pen position on the baseline and y growing downward. Characters
    /// the face lacks draw its `.notdef` glyph; blank glyphs yield `None`.
    pub fn outlines(&self, face: ID, size: f32, text: &str) -> Vec<Option<tiny_skia::Path>> {
        self.db
            .with_face_data(face, |data, index| {
                let Ok(face) = Face::parse(data, index) else {
                    return Vec::new();
                };
                let scale = size / face.units_per_em().max(1) as f32;
                text.chars()
                    .map(|ch| {
                        let glyph = face.glyph_index(ch).unwrap_or(GlyphId(0));
                        let mut builder = GlyphPath {
                            builder: tiny_skia::PathBuilder::new(),
                            scale,
                        };
                        face.outline_glyph(glyph, &mut builder)?;
                        builder.builder.finish()
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn approximate_advance(ch: char, size: f32) -> f32 {
    match ch {
        '\n' => 0.0,
        '\t' => APPROX_SPACE * size * TAB_SPACES,
        c if c.is_whitespace() => APPROX_SPACE * size,
        _ => APPROX_ADVANCE * size,
    }
}

/// Collects a glyph outline into a tiny-skia path, flipping y.
struct GlyphPath {
    builder: tiny_skia::PathBuilder,
    scale: f32,
}

impl GlyphPath {
    fn x(&self, x: f32) -> f32 {
        x * self.scale
    }

    fn y(&self, y: f32) -> f32 {
        -y * self.scale
    }
}

impl OutlineBuilder for GlyphPath {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(self.x(x), self.y(y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(self.x(x), self.y(y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder
            .quad_to(self.x(x1), self.y(y1), self.x(x), self.y(y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder.cubic_to(
            self.x(x1),
            self.y(y1),
            self.x(x2),
            self.y(y2),
            self.x(x),
            self.y(y),
        );
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font(size: f32) -> FontSpec {
        FontSpec {
            family: "No Such Family".into(),
            size,
            bold: false,
            italic: false,
        }
    }

    #[test]
    fn test_empty_library_approximates() {
        let fonts = FontLibrary::empty();
        assert_eq!(fonts.face_count(), 0);
        assert_eq!(fonts.resolve(&font(10.0)), None);

        let m = fonts.measure(&font(10.0), "ab c\n");
        assert_eq!(m.face, None);
        assert_eq!(m.advances, vec![5.5, 5.5, 2.5, 5.5, 0.0]);
        assert!((m.metrics.height() - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_missing_font_dir_is_error() {
        let config = RenderConfig::new()
            .with_system_fonts(false)
            .with_font_dir("/definitely/not/a/font/dir");
        let err = FontLibrary::new(&config).err().expect("should fail");
        assert!(matches!(err, Error::FontError(_)));
    }

    #[test]
    fn test_config_sets_default_family() {
        let config = RenderConfig::new()
            .with_system_fonts(false)
            .with_default_font_family("Arial");
        let fonts = FontLibrary::new(&config).unwrap();
        assert_eq!(fonts.default_family(), "Arial");
        assert!(!fonts.has_family("Arial"));
    }

    #[test]
    fn test_metrics_scale_with_size() {
        let fonts = FontLibrary::empty();
        let small = fonts.metrics(&font(10.0));
        let large = fonts.metrics(&font(20.0));
        assert!((large.ascent - 2.0 * small.ascent).abs() < 1e-4);
        assert_eq!(small.max(large), large);
    }
}
