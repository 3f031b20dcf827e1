//! Unit conversion between OOXML document units and points.

/// English Metric Units per typographic point.
pub const EMU_PER_POINT: f64 = 12_700.0;

/// English Metric Units per inch.
pub const EMU_PER_INCH: f64 = 914_400.0;

/// OOXML angles are stored in 60,000ths of a degree.
pub const ANGLE_UNITS_PER_DEGREE: f64 = 60_000.0;

/// OOXML percentages are stored in 1,000ths of a percent.
pub const PERCENT_UNITS: f64 = 100_000.0;

/// Default slide width (10 in) when `p:sldSz` is absent.
pub const DEFAULT_SLIDE_WIDTH_EMU: i64 = 9_144_000;

/// Default slide height (7.5 in) when `p:sldSz` is absent.
pub const DEFAULT_SLIDE_HEIGHT_EMU: i64 = 6_858_000;

/// Convert EMUs to points.
pub fn emu_to_pt(emu: i64) -> f32 {
    (emu as f64 / EMU_PER_POINT) as f32
}

/// Convert an OOXML angle to degrees.
pub fn angle_to_deg(angle: i64) -> f32 {
    (angle as f64 / ANGLE_UNITS_PER_DEGREE) as f32
}

/// Convert an OOXML percentage to a fraction (100000 -> 1.0).
pub fn percent_to_fraction(value: i64) -> f32 {
    (value as f64 / PERCENT_UNITS) as f32
}

/// Convert hundredths of a point (font sizes, `spcPts`) to points.
pub fn centipoints_to_pt(value: i64) -> f32 {
    value as f32 / 100.0
}

/// Width and height in points.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Pixel dimensions at `scale`, rounded to the nearest pixel and never
    /// below one.
    pub fn scaled_pixels(&self, scale: f32) -> (u32, u32) {
        let w = (self.width * scale).round().max(1.0) as u32;
        let h = (self.height * scale).round().max(1.0) as u32;
        (w, h)
    }

    /// Longer of the two sides.
    pub fn long_edge(&self) -> f32 {
        self.width.max(self.height)
    }
}

/// A point in slide space, in points.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}
