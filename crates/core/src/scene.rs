//! The resolved scene graph for one slide.
//!
//! Everything here is concrete: lengths are in points, colors are resolved,
//! and every style attribute has a value. The rasterizer walks
//! [`Scene::shapes`] in order; later shapes paint over earlier ones.

use crate::color::Color;
use crate::units::{Point, Size};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A fully resolved slide, ready to rasterize.
#[derive(Debug, Clone)]
pub struct Scene {
    /// 1-based slide index this scene was built from.
    pub index: usize,

    /// Slide extent in points.
    pub size: Size,

    /// Slide background, painted before any shape.
    pub background: Paint,

    /// Top-level shapes in paint order.
    pub shapes: Vec<Shape>,

    /// Non-fatal degradations met while building the scene.
    pub diagnostics: Vec<Diagnostic>,
}

impl Scene {
    /// Create an empty scene with a white background.
    pub fn new(index: usize, size: Size) -> Self {
        Self {
            index,
            size,
            background: Paint::Solid(Color::WHITE),
            shapes: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Record a degradation for this slide.
    pub fn diagnose(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Total number of shapes, counting group descendants.
    pub fn shape_count(&self) -> usize {
        fn count(shapes: &[Shape]) -> usize {
            shapes
                .iter()
                .map(|s| match s {
                    Shape::Group(g) => 1 + count(&g.children),
                    _ => 1,
                })
                .sum()
        }
        count(&self.shapes)
    }
}

/// A recoverable problem inside one slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Name or id of the shape involved, when known.
    pub shape: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(shape: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            shape: shape.map(str::to_string),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.shape {
            Some(shape) => write!(f, "{}: {}", shape, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Position, extent and orientation of a shape in its parent's space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Clockwise rotation about the frame center, in degrees.
    pub rotation: f32,
    pub flip_h: bool,
    pub flip_v: bool,
}

impl Frame {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            ..Default::default()
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// How an area is filled.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Paint {
    /// Nothing is painted.
    #[default]
    None,
    Solid(Color),
    /// Linear gradient across the shape's bounding box.
    LinearGradient {
        /// Direction in degrees, clockwise from the positive x axis.
        angle: f32,
        stops: Vec<GradientStop>,
    },
}

impl Paint {
    pub fn is_visible(&self) -> bool {
        match self {
            Paint::None => false,
            Paint::Solid(c) => !c.is_transparent(),
            Paint::LinearGradient { stops, .. } => stops.iter().any(|s| !s.color.is_transparent()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient in 0.0..=1.0.
    pub position: f32,
    pub color: Color,
}

/// Stroke dash pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dash {
    #[default]
    Solid,
    Dot,
    Dash,
    LongDash,
    DashDot,
}

impl Dash {
    /// Dash pattern as multiples of the stroke width.
    pub fn pattern(&self) -> Option<&'static [f32]> {
        match self {
            Dash::Solid => None,
            Dash::Dot => Some(&[1.0, 1.0]),
            Dash::Dash => Some(&[4.0, 3.0]),
            Dash::LongDash => Some(&[8.0, 3.0]),
            Dash::DashDot => Some(&[4.0, 3.0, 1.0, 3.0]),
        }
    }
}

/// A shape outline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Outline {
    pub paint: Paint,
    /// Stroke width in points.
    pub width: f32,
    pub dash: Dash,
}

impl Outline {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.paint.is_visible()
    }
}

/// Preset geometries the rasterizer knows how to trace.
///
/// Adjust values are fractions as stored in `a:avLst` (50000 -> 0.5).
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Rect,
    RoundRect { radius: f32 },
    Ellipse,
    Triangle { apex: f32 },
    RightTriangle,
    Diamond,
    Parallelogram { offset: f32 },
    Trapezoid { offset: f32 },
    Pentagon,
    Hexagon { offset: f32 },
    Octagon { offset: f32 },
    Plus { offset: f32 },
    Star5,
    Arrow { direction: ArrowDirection, shaft: f32, head: f32 },
    Chevron { offset: f32 },
    HomePlate { offset: f32 },
    /// Straight line from the frame's top-left to bottom-right corner.
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowDirection {
    Right,
    Left,
    Up,
    Down,
}

/// One drawing command in shape-local points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),
    CubicTo(Point, Point, Point),
    Close,
}

/// One sub-path of a freeform shape.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeformPath {
    pub commands: Vec<PathCommand>,
    pub filled: bool,
    pub stroked: bool,
}

/// Preset geometry with fill, outline and optional text.
#[derive(Debug, Clone)]
pub struct AutoShape {
    pub name: String,
    pub frame: Frame,
    pub geometry: Geometry,
    pub fill: Paint,
    pub outline: Outline,
    pub text: Option<TextBody>,
}

/// Custom geometry made of explicit path segments.
#[derive(Debug, Clone)]
pub struct Freeform {
    pub name: String,
    pub frame: Frame,
    pub paths: Vec<FreeformPath>,
    pub fill: Paint,
    pub outline: Outline,
    pub text: Option<TextBody>,
}

/// A rectangular text container.
#[derive(Debug, Clone)]
pub struct TextBox {
    pub name: String,
    pub frame: Frame,
    pub fill: Paint,
    pub outline: Outline,
    pub text: TextBody,
}

/// Crop insets as fractions of the source image (`a:srcRect`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Crop {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Crop {
    pub fn is_empty(&self) -> bool {
        self.left == 0.0 && self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0
    }
}

/// Encoded image bytes shared with the package.
#[derive(Clone)]
pub struct ImageData {
    /// Part path inside the package, for diagnostics.
    pub part: String,
    pub bytes: Arc<[u8]>,
}

impl std::fmt::Debug for ImageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageData")
            .field("part", &self.part)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// An embedded raster image.
#[derive(Debug, Clone)]
pub struct Picture {
    pub name: String,
    pub frame: Frame,
    /// `None` when the referenced part is missing.
    pub image: Option<ImageData>,
    pub crop: Crop,
    pub outline: Outline,
}

/// Child shapes positioned in their own coordinate space.
#[derive(Debug, Clone)]
pub struct Group {
    pub name: String,
    pub frame: Frame,
    /// Origin of the child coordinate space (`a:chOff`).
    pub child_offset: Point,
    /// Extent of the child coordinate space (`a:chExt`).
    pub child_extent: Size,
    pub children: Vec<Shape>,
}

/// A shape kind the renderer does not draw; kept to hold its paint slot.
#[derive(Debug, Clone)]
pub struct Unsupported {
    pub name: String,
    pub frame: Frame,
    pub kind: String,
}

/// Every shape kind that can appear in a scene.
#[derive(Debug, Clone)]
pub enum Shape {
    AutoShape(AutoShape),
    Freeform(Freeform),
    TextBox(TextBox),
    Picture(Picture),
    Group(Group),
    Unsupported(Unsupported),
}

impl Shape {
    pub fn frame(&self) -> &Frame {
        match self {
            Shape::AutoShape(s) => &s.frame,
            Shape::Freeform(s) => &s.frame,
            Shape::TextBox(s) => &s.frame,
            Shape::Picture(s) => &s.frame,
            Shape::Group(s) => &s.frame,
            Shape::Unsupported(s) => &s.frame,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Shape::AutoShape(s) => &s.name,
            Shape::Freeform(s) => &s.name,
            Shape::TextBox(s) => &s.name,
            Shape::Picture(s) => &s.name,
            Shape::Group(s) => &s.name,
            Shape::Unsupported(s) => &s.name,
        }
    }

    /// Text carried by this shape, if any.
    pub fn text(&self) -> Option<&TextBody> {
        match self {
            Shape::AutoShape(s) => s.text.as_ref(),
            Shape::Freeform(s) => s.text.as_ref(),
            Shape::TextBox(s) => Some(&s.text),
            _ => None,
        }
    }
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Vertical placement of text within its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Anchor {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// How text is fitted to its box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AutoFit {
    /// No fitting; text overflows the box.
    #[default]
    Disabled,
    /// Shrink text on overflow. With no explicit scale the layout engine
    /// searches one.
    Shrink {
        font_scale: Option<f32>,
        line_reduction: f32,
    },
    /// The shape grows to fit; text is laid out at natural size.
    ResizeShape,
}

/// Text box insets in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Insets {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Default for Insets {
    /// OOXML defaults: 0.1 in left/right, 0.05 in top/bottom.
    fn default() -> Self {
        Self {
            left: 7.2,
            top: 3.6,
            right: 7.2,
            bottom: 3.6,
        }
    }
}

/// Body-level text layout properties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyLayout {
    pub anchor: Anchor,
    pub wrap: bool,
    pub autofit: AutoFit,
    pub insets: Insets,
}

impl Default for BodyLayout {
    fn default() -> Self {
        Self {
            anchor: Anchor::Top,
            wrap: true,
            autofit: AutoFit::Disabled,
            insets: Insets::default(),
        }
    }
}

/// Font selection for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    /// Size in points.
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
}

/// Line spacing rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineSpacing {
    /// Multiple of the natural line height (1.0 = single).
    Proportional(f32),
    /// Exact line height in points.
    Exact(f32),
}

impl Default for LineSpacing {
    fn default() -> Self {
        LineSpacing::Proportional(1.0)
    }
}

/// Paragraph spacing rule (`a:spcBef`, `a:spcAft`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Spacing {
    #[default]
    None,
    /// Fraction of the paragraph's first-line font size.
    Proportional(f32),
    Points(f32),
}

/// A bullet drawn before the first line of a paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub ch: char,
    pub font: FontSpec,
    pub color: Color,
}

/// The atomic styled-text unit.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Run text. An explicit line break is a run containing `'\n'`.
    pub text: String,
    pub font: FontSpec,
    pub color: Color,
    pub underline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub align: Align,
    /// Left margin in points (`marL`).
    pub margin_left: f32,
    /// First-line indent relative to the margin, in points (may be negative).
    pub indent: f32,
    pub bullet: Option<Bullet>,
    pub line_spacing: LineSpacing,
    pub space_before: Spacing,
    pub space_after: Spacing,
    pub runs: Vec<TextRun>,
    /// Font used to size an empty paragraph (`a:endParaRPr`).
    pub end_font: FontSpec,
}

impl Paragraph {
    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.is_empty())
    }

    /// Concatenated run text.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Paragraphs plus the box-level layout rules.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBody {
    pub layout: BodyLayout,
    pub paragraphs: Vec<Paragraph>,
}

impl TextBody {
    pub fn is_empty(&self) -> bool {
        self.paragraphs.iter().all(Paragraph::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font() -> FontSpec {
        FontSpec {
            family: "Calibri".into(),
            size: 18.0,
            bold: false,
            italic: false,
        }
    }

    #[test]
    fn test_shape_count_includes_group_children() {
        let mut scene = Scene::new(1, Size::new(720.0, 540.0));
        let rect = Shape::AutoShape(AutoShape {
            name: "Rect".into(),
            frame: Frame::new(0.0, 0.0, 10.0, 10.0),
            geometry: Geometry::Rect,
            fill: Paint::Solid(Color::BLACK),
            outline: Outline::none(),
            text: None,
        });
        scene.shapes.push(rect.clone());
        scene.shapes.push(Shape::Group(Group {
            name: "Group".into(),
            frame: Frame::new(0.0, 0.0, 10.0, 10.0),
            child_offset: Point::default(),
            child_extent: Size::new(10.0, 10.0),
            children: vec![rect.clone(), rect],
        }));
        assert_eq!(scene.shape_count(), 4);
    }

    #[test]
    fn test_paint_visibility() {
        assert!(!Paint::None.is_visible());
        assert!(!Paint::Solid(Color::TRANSPARENT).is_visible());
        assert!(Paint::Solid(Color::BLACK).is_visible());
        assert!(!Outline {
            paint: Paint::Solid(Color::BLACK),
            width: 0.0,
            dash: Dash::Solid
        }
        .is_visible());
    }

    #[test]
    fn test_paragraph_text_joins_runs() {
        let para = Paragraph {
            align: Align::Left,
            margin_left: 0.0,
            indent: 0.0,
            bullet: None,
            line_spacing: LineSpacing::default(),
            space_before: Spacing::None,
            space_after: Spacing::None,
            runs: vec![
                TextRun {
                    text: "Hello ".into(),
                    font: font(),
                    color: Color::BLACK,
                    underline: false,
                },
                TextRun {
                    text: "world".into(),
                    font: font(),
                    color: Color::BLACK,
                    underline: true,
                },
            ],
            end_font: font(),
        };
        assert_eq!(para.text(), "Hello world");
        assert!(!para.is_empty());
    }
}
