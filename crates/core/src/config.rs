//! Conversion settings and the slide range filter.

use crate::error::{Error, Result};
use crate::units::Size;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::PathBuf;

/// Scale used when the caller gives neither a factor nor a long edge.
///
/// 1.0 renders one pixel per point, the deck's native size.
pub const DEFAULT_SCALE: f32 = 1.0;

/// Family used when a run's font cannot be found.
pub const DEFAULT_FONT_FAMILY: &str = "Calibri";

/// How the output resolution is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScaleMode {
    /// Pixels per point.
    Factor(f32),
    /// Fit the slide's longer side to this many pixels.
    LongEdge(u32),
}

impl ScaleMode {
    /// Pixels per point for a slide of `size`.
    pub fn factor_for(&self, size: Size) -> Result<f32> {
        let factor = match *self {
            ScaleMode::Factor(f) => f,
            ScaleMode::LongEdge(px) => px as f32 / size.long_edge().max(f32::EPSILON),
        };
        validate_scale(factor)
    }
}

/// Reject zero, negative and non-finite scale factors.
pub fn validate_scale(scale: f32) -> Result<f32> {
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        Err(Error::InvalidScale(scale))
    }
}

/// Settings shared by every slide of one conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Scale applied when a conversion does not name one.
    pub default_scale: f32,

    /// Font family substituted for fonts that are not installed.
    pub default_font_family: String,

    /// Extra directories scanned for font files.
    pub font_dirs: Vec<PathBuf>,

    /// Whether installed system fonts are loaded.
    pub load_system_fonts: bool,

    /// Worker threads for slide rendering; 1 renders on the calling thread.
    pub jobs: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_scale: DEFAULT_SCALE,
            default_font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_dirs: Vec::new(),
            load_system_fonts: true,
            jobs: 1,
        }
    }
}

impl RenderConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scale used when none is requested.
    pub fn with_default_scale(mut self, scale: f32) -> Self {
        self.default_scale = scale;
        self
    }

    /// Set the fallback font family.
    pub fn with_default_font_family(mut self, family: impl Into<String>) -> Self {
        self.default_font_family = family.into();
        self
    }

    /// Add a directory of font files.
    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dirs.push(dir.into());
        self
    }

    /// Set whether system fonts are loaded.
    pub fn with_system_fonts(mut self, load: bool) -> Self {
        self.load_system_fonts = load;
        self
    }

    /// Set the number of worker threads (at least one).
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }
}

/// An inclusive, 1-based slide range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideRange {
    pub start: usize,
    pub end: usize,
}

impl SlideRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A single slide.
    pub fn single(index: usize) -> Self {
        Self::new(index, index)
    }

    /// Check the range against a deck of `count` slides.
    pub fn validate(&self, count: usize) -> Result<RangeInclusive<usize>> {
        if self.start > self.end || self.start < 1 || self.end > count {
            return Err(Error::InvalidRange {
                start: self.start,
                end: self.end,
                count,
            });
        }
        Ok(self.start..=self.end)
    }

    /// Resolve an optional range; `None` means every slide.
    pub fn resolve(range: Option<SlideRange>, count: usize) -> Result<RangeInclusive<usize>> {
        match range {
            Some(range) => range.validate(count),
            None if count == 0 => Ok(1..=0),
            None => Ok(1..=count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_validation() {
        assert_eq!(SlideRange::new(2, 2).validate(5).unwrap(), 2..=2);
        assert_eq!(SlideRange::new(1, 5).validate(5).unwrap(), 1..=5);
        assert!(SlideRange::new(1, 6).validate(5).is_err());
        assert!(SlideRange::new(0, 3).validate(5).is_err());
        assert!(SlideRange::new(4, 3).validate(5).is_err());
    }

    #[test]
    fn test_resolve_defaults_to_all() {
        assert_eq!(SlideRange::resolve(None, 3).unwrap(), 1..=3);
        assert_eq!(SlideRange::resolve(None, 0).unwrap().count(), 0);
    }

    #[test]
    fn test_scale_modes() {
        let size = Size::new(720.0, 540.0);
        assert_eq!(ScaleMode::Factor(2.0).factor_for(size).unwrap(), 2.0);
        assert_eq!(ScaleMode::LongEdge(1440).factor_for(size).unwrap(), 2.0);
        assert!(ScaleMode::Factor(0.0).factor_for(size).is_err());
        assert!(ScaleMode::Factor(f32::NAN).factor_for(size).is_err());
    }

    #[test]
    fn test_builder() {
        let config = RenderConfig::new()
            .with_default_scale(2.0)
            .with_default_font_family("Arial")
            .with_system_fonts(false)
            .with_jobs(0);
        assert_eq!(config.default_scale, 2.0);
        assert_eq!(config.default_font_family, "Arial");
        assert!(!config.load_system_fonts);
        assert_eq!(config.jobs, 1);
    }
}
