//! Core scene model, units, pixel buffers and error types for rendering
//! PowerPoint slides to images.

pub mod buffer;
pub mod color;
pub mod config;
pub mod error;
pub mod scene;
pub mod units;

pub use buffer::PixelBuffer;
pub use color::Color;
pub use config::{RenderConfig, ScaleMode, SlideRange, DEFAULT_FONT_FAMILY, DEFAULT_SCALE};
pub use error::{Error, Result};
pub use scene::{
    Align, Anchor, ArrowDirection, AutoFit, AutoShape, BodyLayout, Bullet, Crop, Dash, Diagnostic, FontSpec,
    Frame, Freeform, FreeformPath, Geometry, GradientStop, Group, ImageData, Insets, LineSpacing,
    Outline, Paint, Paragraph, PathCommand, Picture, Scene, Shape, Spacing, TextBody, TextBox,
    TextRun, Unsupported,
};
pub use units::{Point, Size};
