//! Rendering for PPTX scenes: font matching, text layout, tiny-skia
//! rasterization and the per-slide conversion pipeline.

pub mod font;
pub mod pipeline;
pub mod raster;
pub mod text;

pub use font::FontLibrary;
pub use pipeline::{
    CancelToken, ConversionReport, Converter, RenderedSlide, SlideEncoder, SlideOutcome, SlideReport, SlideStatus,
    Slides,
};
pub use raster::{RasterOutput, Rasterizer};
pub use text::TextLayout;
