//! Scene rasterization with tiny-skia.
//!
//! Shapes are drawn in scene order onto a premultiplied pixmap; the result
//! is demultiplied into a straight-alpha [`PixelBuffer`].

use crate::font::FontLibrary;
use crate::text::{self, GlyphRun};
use pptx2img_core::config::validate_scale;
use pptx2img_core::{
    ArrowDirection, Color, Diagnostic, Error, Frame, FreeformPath, Geometry, Group, Outline, Paint, PathCommand,
    Picture, PixelBuffer, Result, Scene, Shape, TextBody,
};
use tiny_skia::{
    FillRule, FilterQuality, IntRect, IntSize, LinearGradient, PathBuilder, Pixmap, PixmapPaint, Point, Rect,
    SpreadMode, Stroke, StrokeDash, Transform,
};

/// Bezier handle length for a quarter ellipse.
const KAPPA: f32 = 0.552_284_8;

/// Inner radius of a five-point star relative to the outer radius.
const STAR5_INNER: f32 = 0.381_966;

/// One rasterized slide.
#[derive(Debug)]
pub struct RasterOutput {
    pub buffer: PixelBuffer,
    /// Scene diagnostics plus anything met while drawing.
    pub diagnostics: Vec<Diagnostic>,
}

/// Draws scenes at a requested scale.
pub struct Rasterizer<'a> {
    fonts: &'a FontLibrary,
}

impl<'a> Rasterizer<'a> {
    pub fn new(fonts: &'a FontLibrary) -> Self {
        Self { fonts }
    }

    /// Rasterize `scene` at `scale` pixels per point.
    pub fn render(&self, scene: &Scene, scale: f32) -> Result<RasterOutput> {
        let scale = validate_scale(scale)?;
        let (width, height) = scene.size.scaled_pixels(scale);
        let mut pixmap = Pixmap::new(width, height).ok_or(Error::InvalidScale(scale))?;
        pixmap.fill(tiny_skia::Color::WHITE);

        let mut canvas = Canvas {
            pixmap,
            fonts: self.fonts,
            diagnostics: scene.diagnostics.clone(),
        };
        let base = Transform::from_scale(scale, scale);
        if let Some(path) = rect_path(scene.size.width, scene.size.height) {
            canvas.fill(&path, &scene.background, scene.size.width, scene.size.height, base);
        }
        for shape in &scene.shapes {
            canvas.shape(shape, base);
        }

        let Canvas {
            pixmap, diagnostics, ..
        } = canvas;
        let buffer = demultiply(&pixmap).ok_or_else(|| Error::MalformedSlide {
            index: scene.index,
            reason: "pixel buffer size mismatch".to_string(),
        })?;
        Ok(RasterOutput {
            buffer,
            diagnostics,
        })
    }
}

/// Drawing state for one slide.
struct Canvas<'a> {
    pixmap: Pixmap,
    fonts: &'a FontLibrary,
    diagnostics: Vec<Diagnostic>,
}

impl Canvas<'_> {
    fn shape(&mut self, shape: &Shape, parent: Transform) {
        match shape {
            Shape::AutoShape(s) => {
                let t = shape_transform(parent, &s.frame);
                let (w, h) = (s.frame.width, s.frame.height);
                if let Some(path) = geometry_path(&s.geometry, w, h) {
                    if s.geometry != Geometry::Line {
                        self.fill(&path, &s.fill, w, h, t);
                    }
                    self.stroke(&path, &s.outline, w, h, t);
                }
                if let Some(body) = &s.text {
                    self.text(&s.name, body, &s.frame, parent);
                }
            }
            Shape::Freeform(s) => {
                let t = shape_transform(parent, &s.frame);
                let (w, h) = (s.frame.width, s.frame.height);
                for sub in &s.paths {
                    let Some(path) = freeform_path(sub) else { continue };
                    if sub.filled {
                        self.fill(&path, &s.fill, w, h, t);
                    }
                    if sub.stroked {
                        self.stroke(&path, &s.outline, w, h, t);
                    }
                }
                if let Some(body) = &s.text {
                    self.text(&s.name, body, &s.frame, parent);
                }
            }
            Shape::TextBox(s) => {
                let t = shape_transform(parent, &s.frame);
                let (w, h) = (s.frame.width, s.frame.height);
                if let Some(path) = rect_path(w, h) {
                    self.fill(&path, &s.fill, w, h, t);
                    self.stroke(&path, &s.outline, w, h, t);
                }
                self.text(&s.name, &s.text, &s.frame, parent);
            }
            Shape::Picture(p) => self.picture(p, parent),
            Shape::Group(g) => self.group(g, parent),
            Shape::Unsupported(u) => {
                log::trace!("Leaving unsupported {} '{}' blank", u.kind, u.name);
            }
        }
    }

    fn group(&mut self, group: &Group, parent: Transform) {
        let ext = group.child_extent;
        let sx = if ext.width > 0.0 { group.frame.width / ext.width } else { 1.0 };
        let sy = if ext.height > 0.0 { group.frame.height / ext.height } else { 1.0 };
        let t = shape_transform(parent, &group.frame)
            .pre_scale(sx, sy)
            .pre_translate(-group.child_offset.x, -group.child_offset.y);
        for child in &group.children {
            self.shape(child, t);
        }
    }

    fn picture(&mut self, picture: &Picture, parent: Transform) {
        let t = shape_transform(parent, &picture.frame);
        let (w, h) = (picture.frame.width, picture.frame.height);
        if let Some(data) = &picture.image {
            match decode_image(&data.bytes) {
                Ok(image) => {
                    let image = match crop(&image, picture) {
                        Some(cropped) => cropped,
                        None => image,
                    };
                    let mut paint = PixmapPaint::default();
                    paint.quality = FilterQuality::Bilinear;
                    let fit = t.pre_scale(w / image.width() as f32, h / image.height() as f32);
                    self.pixmap.draw_pixmap(0, 0, image.as_ref(), &paint, fit, None);
                }
                Err(reason) => {
                    log::warn!("Cannot decode image '{}': {}", data.part, reason);
                    self.diagnostics.push(Diagnostic::new(
                        Some(&picture.name),
                        format!("undecodable image '{}': {}", data.part, reason),
                    ));
                }
            }
        }
        if let Some(path) = rect_path(w, h) {
            self.stroke(&path, &picture.outline, w, h, t);
        }
    }

    fn text(&mut self, name: &str, body: &TextBody, frame: &Frame, parent: Transform) {
        if body.is_empty() {
            return;
        }
        let layout = text::layout(body, frame.width, frame.height, self.fonts);
        for family in &layout.substituted {
            self.diagnostics.push(Diagnostic::new(
                Some(name),
                format!("font '{}' is not installed; substituted", family),
            ));
        }
        if layout.overflows {
            log::debug!("Text of '{}' overflows its box", name);
        }

        // Text follows the shape's rotation but is never mirrored.
        let mut t = parent.pre_translate(frame.x, frame.y);
        if frame.rotation != 0.0 {
            t = t.pre_concat(Transform::from_rotate_at(
                frame.rotation,
                frame.width / 2.0,
                frame.height / 2.0,
            ));
        }
        for line in &layout.lines {
            for run in &line.runs {
                self.glyph_run(run, t);
            }
        }
    }

    fn glyph_run(&mut self, run: &GlyphRun, t: Transform) {
        let paint = solid_paint(run.color);
        match run.face {
            Some(face) => {
                let outlines = self.fonts.outlines(face, run.size, &run.text);
                let mut pen = run.x;
                for (outline, advance) in outlines.iter().zip(&run.advances) {
                    if let Some(path) = outline {
                        self.pixmap.fill_path(
                            path,
                            &paint,
                            FillRule::Winding,
                            t.pre_translate(pen, run.baseline),
                            None,
                        );
                    }
                    pen += advance;
                }
            }
            None => {
                // No face at all: a hollow box per visible character.
                let stroke = Stroke {
                    width: (run.size * 0.05).max(0.5),
                    ..Stroke::default()
                };
                let mut pen = run.x;
                for (ch, advance) in run.text.chars().zip(&run.advances) {
                    if !ch.is_whitespace() {
                        let bx = Rect::from_xywh(
                            pen + advance * 0.1,
                            run.baseline - run.size * 0.7,
                            advance * 0.8,
                            run.size * 0.7,
                        );
                        if let Some(path) = bx.map(PathBuilder::from_rect) {
                            self.pixmap.stroke_path(&path, &paint, &stroke, t, None);
                        }
                    }
                    pen += advance;
                }
            }
        }
        if run.underline {
            let thickness = (run.size * 0.05).max(0.5);
            if let Some(rect) = Rect::from_xywh(run.x, run.baseline + run.size * 0.1, run.width(), thickness) {
                self.pixmap.fill_rect(rect, &paint, t, None);
            }
        }
    }

    fn fill(&mut self, path: &tiny_skia::Path, paint: &Paint, w: f32, h: f32, t: Transform) {
        if let Some(paint) = skia_paint(paint, w, h) {
            self.pixmap.fill_path(path, &paint, FillRule::Winding, t, None);
        }
    }

    fn stroke(&mut self, path: &tiny_skia::Path, outline: &Outline, w: f32, h: f32, t: Transform) {
        if !outline.is_visible() {
            return;
        }
        let Some(paint) = skia_paint(&outline.paint, w, h) else {
            return;
        };
        let mut stroke = Stroke {
            width: outline.width,
            ..Stroke::default()
        };
        if let Some(pattern) = outline.dash.pattern() {
            let intervals = pattern.iter().map(|v| v * outline.width).collect();
            stroke.dash = StrokeDash::new(intervals, 0.0);
        }
        self.pixmap.stroke_path(path, &paint, &stroke, t, None);
    }
}

/// Place, rotate and flip a frame within its parent's space.
fn shape_transform(parent: Transform, frame: &Frame) -> Transform {
    let mut t = parent.pre_translate(frame.x, frame.y);
    if frame.rotation != 0.0 {
        t = t.pre_concat(Transform::from_rotate_at(
            frame.rotation,
            frame.width / 2.0,
            frame.height / 2.0,
        ));
    }
    if frame.flip_h {
        t = t.pre_concat(Transform::from_row(-1.0, 0.0, 0.0, 1.0, frame.width, 0.0));
    }
    if frame.flip_v {
        t = t.pre_concat(Transform::from_row(1.0, 0.0, 0.0, -1.0, 0.0, frame.height));
    }
    t
}

fn to_skia(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn solid_paint(color: Color) -> tiny_skia::Paint<'static> {
    let mut paint = tiny_skia::Paint::default();
    paint.set_color(to_skia(color));
    paint.anti_alias = true;
    paint
}

/// A tiny-skia paint for a `w` × `h` box, or `None` when nothing shows.
fn skia_paint(paint: &Paint, w: f32, h: f32) -> Option<tiny_skia::Paint<'static>> {
    if !paint.is_visible() {
        return None;
    }
    match paint {
        Paint::None => None,
        Paint::Solid(color) => Some(solid_paint(*color)),
        Paint::LinearGradient { angle, stops } => {
            let (sin, cos) = angle.to_radians().sin_cos();
            let half = ((w * cos).abs() + (h * sin).abs()) / 2.0;
            let (cx, cy) = (w / 2.0, h / 2.0);
            let start = Point::from_xy(cx - cos * half, cy - sin * half);
            let end = Point::from_xy(cx + cos * half, cy + sin * half);
            let skia_stops = stops
                .iter()
                .map(|s| tiny_skia::GradientStop::new(s.position, to_skia(s.color)))
                .collect();
            match LinearGradient::new(start, end, skia_stops, SpreadMode::Pad, Transform::identity()) {
                Some(shader) => {
                    let mut paint = tiny_skia::Paint::default();
                    paint.shader = shader;
                    paint.anti_alias = true;
                    Some(paint)
                }
                None => stops.first().map(|s| solid_paint(s.color)),
            }
        }
    }
}

fn rect_path(w: f32, h: f32) -> Option<tiny_skia::Path> {
    polygon(&[(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)])
}

fn polygon(points: &[(f32, f32)]) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.0, first.1);
    for (x, y) in rest {
        pb.line_to(*x, *y);
    }
    pb.close();
    pb.finish()
}

/// Outline of a preset geometry in a `w` × `h` box.
pub fn geometry_path(geometry: &Geometry, w: f32, h: f32) -> Option<tiny_skia::Path> {
    let ss = w.min(h);
    match *geometry {
        Geometry::Rect => rect_path(w, h),
        Geometry::RoundRect { radius } => {
            let r = (radius * ss).clamp(0.0, ss / 2.0);
            let k = r * (1.0 - KAPPA);
            let mut pb = PathBuilder::new();
            pb.move_to(r, 0.0);
            pb.line_to(w - r, 0.0);
            pb.cubic_to(w - k, 0.0, w, k, w, r);
            pb.line_to(w, h - r);
            pb.cubic_to(w, h - k, w - k, h, w - r, h);
            pb.line_to(r, h);
            pb.cubic_to(k, h, 0.0, h - k, 0.0, h - r);
            pb.line_to(0.0, r);
            pb.cubic_to(0.0, k, k, 0.0, r, 0.0);
            pb.close();
            pb.finish()
        }
        Geometry::Ellipse => {
            let mut pb = PathBuilder::new();
            pb.push_oval(Rect::from_xywh(0.0, 0.0, w, h)?);
            pb.finish()
        }
        Geometry::Triangle { apex } => polygon(&[(apex * w, 0.0), (w, h), (0.0, h)]),
        Geometry::RightTriangle => polygon(&[(0.0, 0.0), (w, h), (0.0, h)]),
        Geometry::Diamond => polygon(&[(w / 2.0, 0.0), (w, h / 2.0), (w / 2.0, h), (0.0, h / 2.0)]),
        Geometry::Parallelogram { offset } => {
            let o = offset * ss;
            polygon(&[(o, 0.0), (w, 0.0), (w - o, h), (0.0, h)])
        }
        Geometry::Trapezoid { offset } => {
            let o = offset * ss;
            polygon(&[(o, 0.0), (w - o, 0.0), (w, h), (0.0, h)])
        }
        Geometry::Pentagon => polygon(&[
            (w / 2.0, 0.0),
            (w, 0.382 * h),
            (0.809 * w, h),
            (0.191 * w, h),
            (0.0, 0.382 * h),
        ]),
        Geometry::Hexagon { offset } => {
            let o = offset * ss;
            polygon(&[
                (o, 0.0),
                (w - o, 0.0),
                (w, h / 2.0),
                (w - o, h),
                (o, h),
                (0.0, h / 2.0),
            ])
        }
        Geometry::Octagon { offset } => {
            let o = offset * ss;
            polygon(&[
                (o, 0.0),
                (w - o, 0.0),
                (w, o),
                (w, h - o),
                (w - o, h),
                (o, h),
                (0.0, h - o),
                (0.0, o),
            ])
        }
        Geometry::Plus { offset } => {
            let o = offset * ss;
            polygon(&[
                (o, 0.0),
                (w - o, 0.0),
                (w - o, o),
                (w, o),
                (w, h - o),
                (w - o, h - o),
                (w - o, h),
                (o, h),
                (o, h - o),
                (0.0, h - o),
                (0.0, o),
                (o, o),
            ])
        }
        Geometry::Star5 => {
            let (cx, cy) = (w / 2.0, h / 2.0);
            let points: Vec<(f32, f32)> = (0..10)
                .map(|i| {
                    let angle = (-90.0 + 36.0 * i as f32).to_radians();
                    let r = if i % 2 == 0 { 1.0 } else { STAR5_INNER };
                    (cx + cx * r * angle.cos(), cy + cy * r * angle.sin())
                })
                .collect();
            polygon(&points)
        }
        Geometry::Arrow {
            direction,
            shaft,
            head,
        } => {
            // Traced pointing right in a length × breadth box, then mapped.
            let (len, breadth) = match direction {
                ArrowDirection::Left | ArrowDirection::Right => (w, h),
                ArrowDirection::Up | ArrowDirection::Down => (h, w),
            };
            let t = (shaft * breadth).clamp(0.0, breadth);
            let hl = (head * len.min(breadth)).clamp(0.0, len);
            let mid = breadth / 2.0;
            let right = [
                (0.0, mid - t / 2.0),
                (len - hl, mid - t / 2.0),
                (len - hl, 0.0),
                (len, mid),
                (len - hl, breadth),
                (len - hl, mid + t / 2.0),
                (0.0, mid + t / 2.0),
            ];
            let points: Vec<(f32, f32)> = right
                .iter()
                .map(|&(x, y)| match direction {
                    ArrowDirection::Right => (x, y),
                    ArrowDirection::Left => (w - x, y),
                    ArrowDirection::Down => (y, x),
                    ArrowDirection::Up => (y, h - x),
                })
                .collect();
            polygon(&points)
        }
        Geometry::Chevron { offset } => {
            let o = offset * ss;
            polygon(&[
                (0.0, 0.0),
                (w - o, 0.0),
                (w, h / 2.0),
                (w - o, h),
                (0.0, h),
                (o, h / 2.0),
            ])
        }
        Geometry::HomePlate { offset } => {
            let o = offset * ss;
            polygon(&[(0.0, 0.0), (w - o, 0.0), (w, h / 2.0), (w - o, h), (0.0, h)])
        }
        Geometry::Line => {
            let mut pb = PathBuilder::new();
            pb.move_to(0.0, 0.0);
            pb.line_to(w, h);
            pb.finish()
        }
    }
}

fn freeform_path(sub: &FreeformPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for cmd in &sub.commands {
        match *cmd {
            PathCommand::MoveTo(p) => pb.move_to(p.x, p.y),
            PathCommand::LineTo(p) => pb.line_to(p.x, p.y),
            PathCommand::QuadTo(c, p) => pb.quad_to(c.x, c.y, p.x, p.y),
            PathCommand::CubicTo(c1, c2, p) => pb.cubic_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y),
            PathCommand::Close => pb.close(),
        }
    }
    pb.finish()
}

/// Decode image bytes into a premultiplied pixmap.
fn decode_image(bytes: &[u8]) -> std::result::Result<Pixmap, String> {
    let rgba = image::load_from_memory(bytes)
        .map_err(|e| e.to_string())?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut data = rgba.into_raw();
    premultiply(&mut data);
    let size = IntSize::from_wh(width, height).ok_or_else(|| "empty image".to_string())?;
    Pixmap::from_vec(data, size).ok_or_else(|| "image too large".to_string())
}

fn premultiply(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        for c in &mut px[..3] {
            *c = ((*c as u16 * a + 127) / 255) as u8;
        }
    }
}

/// The `srcRect` window of a picture, or `None` when uncropped.
fn crop(image: &Pixmap, picture: &Picture) -> Option<Pixmap> {
    if picture.crop.is_empty() {
        return None;
    }
    let (w, h) = (image.width() as f32, image.height() as f32);
    let c = picture.crop;
    let left = (c.left.max(0.0) * w).round();
    let top = (c.top.max(0.0) * h).round();
    let right = w - (c.right.max(0.0) * w).round();
    let bottom = h - (c.bottom.max(0.0) * h).round();
    if right - left < 1.0 || bottom - top < 1.0 {
        return None;
    }
    let rect = IntRect::from_xywh(left as i32, top as i32, (right - left) as u32, (bottom - top) as u32)?;
    image.clone_rect(rect)
}

fn demultiply(pixmap: &Pixmap) -> Option<PixelBuffer> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    PixelBuffer::from_rgba(pixmap.width(), pixmap.height(), data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pptx2img_core::{
        AutoShape, BodyLayout, Crop, Dash, FontSpec, GradientStop, ImageData, Point as ScenePoint, Size,
        TextRun, Unsupported,
    };
    use std::sync::Arc;

    const RED: Color = Color::rgb(255, 0, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);

    fn scene() -> Scene {
        Scene::new(1, Size::new(100.0, 50.0))
    }

    fn rect(x: f32, y: f32, w: f32, h: f32, color: Color) -> Shape {
        Shape::AutoShape(AutoShape {
            name: "Rect".into(),
            frame: Frame::new(x, y, w, h),
            geometry: Geometry::Rect,
            fill: Paint::Solid(color),
            outline: Outline::none(),
            text: None,
        })
    }

    fn render(scene: &Scene, scale: f32) -> RasterOutput {
        let fonts = FontLibrary::empty();
        Rasterizer::new(&fonts).render(scene, scale).unwrap()
    }

    fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba(color));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_dimensions_follow_scale() {
        let out = render(&scene(), 2.0);
        assert_eq!((out.buffer.width(), out.buffer.height()), (200, 100));
        let out = render(&scene(), 0.5);
        assert_eq!((out.buffer.width(), out.buffer.height()), (50, 25));
    }

    #[test]
    fn test_invalid_scale() {
        let fonts = FontLibrary::empty();
        let err = Rasterizer::new(&fonts).render(&scene(), 0.0).err().expect("should fail");
        assert!(matches!(err, Error::InvalidScale(_)));
    }

    #[test]
    fn test_background_and_fill() {
        let mut s = scene();
        s.background = Paint::Solid(BLUE);
        s.shapes.push(rect(10.0, 10.0, 20.0, 20.0, RED));
        let out = render(&s, 1.0);
        assert_eq!(out.buffer.pixel(0, 0), Some(BLUE));
        assert_eq!(out.buffer.pixel(20, 20), Some(RED));
        assert_eq!(out.buffer.pixel(40, 20), Some(BLUE));
    }

    #[test]
    fn test_later_shapes_paint_over() {
        let mut s = scene();
        s.shapes.push(rect(0.0, 0.0, 50.0, 50.0, RED));
        s.shapes.push(rect(25.0, 0.0, 50.0, 50.0, BLUE));
        let out = render(&s, 1.0);
        assert_eq!(out.buffer.pixel(10, 10), Some(RED));
        assert_eq!(out.buffer.pixel(30, 10), Some(BLUE));
    }

    #[test]
    fn test_unsupported_keeps_neighbors() {
        let mut s = scene();
        s.shapes.push(rect(0.0, 0.0, 20.0, 20.0, RED));
        s.shapes.push(Shape::Unsupported(Unsupported {
            name: "Chart".into(),
            frame: Frame::new(0.0, 0.0, 100.0, 50.0),
            kind: "chart".into(),
        }));
        s.shapes.push(rect(60.0, 0.0, 20.0, 20.0, BLUE));
        let out = render(&s, 1.0);
        assert_eq!(out.buffer.pixel(10, 10), Some(RED));
        assert_eq!(out.buffer.pixel(70, 10), Some(BLUE));
        assert_eq!(out.buffer.pixel(40, 40), Some(Color::WHITE));
    }

    #[test]
    fn test_rotation_about_center() {
        let mut s = scene();
        let mut shape = rect(40.0, 20.0, 40.0, 10.0, RED);
        if let Shape::AutoShape(a) = &mut shape {
            a.frame.rotation = 90.0;
        }
        s.shapes.push(shape);
        let out = render(&s, 1.0);
        // A 40x10 bar turned upright around (60, 25).
        assert_eq!(out.buffer.pixel(60, 8), Some(RED));
        assert_eq!(out.buffer.pixel(45, 25), Some(Color::WHITE));
    }

    #[test]
    fn test_group_maps_child_space() {
        let mut s = scene();
        s.shapes.push(Shape::Group(Group {
            name: "Group".into(),
            frame: Frame::new(50.0, 0.0, 50.0, 50.0),
            child_offset: ScenePoint::new(100.0, 100.0),
            child_extent: Size::new(10.0, 10.0),
            children: vec![rect(100.0, 100.0, 5.0, 5.0, RED)],
        }));
        let out = render(&s, 1.0);
        // Child covers the group's top-left quarter.
        assert_eq!(out.buffer.pixel(60, 10), Some(RED));
        assert_eq!(out.buffer.pixel(90, 40), Some(Color::WHITE));
    }

    #[test]
    fn test_gradient_runs_along_angle() {
        let mut s = scene();
        s.background = Paint::LinearGradient {
            angle: 0.0,
            stops: vec![
                GradientStop {
                    position: 0.0,
                    color: RED,
                },
                GradientStop {
                    position: 1.0,
                    color: BLUE,
                },
            ],
        };
        let out = render(&s, 1.0);
        let left = out.buffer.pixel(1, 25).unwrap();
        let right = out.buffer.pixel(98, 25).unwrap();
        assert!(left.r > 200 && left.b < 50);
        assert!(right.b > 200 && right.r < 50);
    }

    #[test]
    fn test_dashed_outline_has_gaps() {
        let mut s = scene();
        s.shapes.push(Shape::AutoShape(AutoShape {
            name: "Line".into(),
            frame: Frame::new(0.0, 25.0, 100.0, 0.0),
            geometry: Geometry::Line,
            fill: Paint::None,
            outline: Outline {
                paint: Paint::Solid(Color::BLACK),
                width: 4.0,
                dash: Dash::Dash,
            },
            text: None,
        }));
        let out = render(&s, 1.0);
        let row: Vec<bool> = (0..100).map(|x| out.buffer.pixel(x, 25).unwrap().r < 128).collect();
        assert!(row.iter().any(|&dark| dark));
        assert!(row.iter().any(|&dark| !dark));
    }

    #[test]
    fn test_picture_scaled_and_cropped() {
        let mut bytes = png(4, 2, [255, 0, 0, 255]);
        let mut s = scene();
        s.shapes.push(Shape::Picture(Picture {
            name: "Picture".into(),
            frame: Frame::new(0.0, 0.0, 40.0, 20.0),
            image: Some(ImageData {
                part: "ppt/media/image1.png".into(),
                bytes: Arc::from(bytes.as_slice()),
            }),
            crop: Crop {
                left: 0.5,
                ..Default::default()
            },
            outline: Outline::none(),
        }));
        let out = render(&s, 1.0);
        assert_eq!(out.buffer.pixel(20, 10), Some(RED));
        assert_eq!(out.buffer.pixel(60, 10), Some(Color::WHITE));
        assert!(out.diagnostics.is_empty());

        bytes.truncate(10);
        if let Shape::Picture(p) = &mut s.shapes[0] {
            p.image.as_mut().unwrap().bytes = Arc::from(bytes.as_slice());
        }
        let out = render(&s, 1.0);
        assert_eq!(out.buffer.pixel(20, 10), Some(Color::WHITE));
        assert_eq!(out.diagnostics.len(), 1);
    }

    #[test]
    fn test_text_without_fonts_still_marks() {
        let mut s = scene();
        let font = FontSpec {
            family: "Calibri".into(),
            size: 20.0,
            bold: false,
            italic: false,
        };
        s.shapes.push(Shape::AutoShape(AutoShape {
            name: "Title".into(),
            frame: Frame::new(0.0, 0.0, 100.0, 50.0),
            geometry: Geometry::Rect,
            fill: Paint::None,
            outline: Outline::none(),
            text: Some(TextBody {
                layout: BodyLayout::default(),
                paragraphs: vec![pptx2img_core::Paragraph {
                    align: pptx2img_core::Align::Left,
                    margin_left: 0.0,
                    indent: 0.0,
                    bullet: None,
                    line_spacing: Default::default(),
                    space_before: Default::default(),
                    space_after: Default::default(),
                    runs: vec![TextRun {
                        text: "Hello".into(),
                        font: font.clone(),
                        color: Color::BLACK,
                        underline: true,
                    }],
                    end_font: font,
                }],
            }),
        }));
        let out = render(&s, 1.0);
        assert!(out.buffer.count_pixels(|c| c.r < 128) > 0);
        assert!(out.diagnostics.iter().any(|d| d.message.contains("Calibri")));
    }

    #[test]
    fn test_every_preset_traces() {
        let presets = [
            Geometry::Rect,
            Geometry::RoundRect { radius: 0.16667 },
            Geometry::Ellipse,
            Geometry::Triangle { apex: 0.5 },
            Geometry::RightTriangle,
            Geometry::Diamond,
            Geometry::Parallelogram { offset: 0.25 },
            Geometry::Trapezoid { offset: 0.25 },
            Geometry::Pentagon,
            Geometry::Hexagon { offset: 0.25 },
            Geometry::Octagon { offset: 0.29289 },
            Geometry::Plus { offset: 0.25 },
            Geometry::Star5,
            Geometry::Arrow {
                direction: ArrowDirection::Up,
                shaft: 0.5,
                head: 0.5,
            },
            Geometry::Chevron { offset: 0.5 },
            Geometry::HomePlate { offset: 0.5 },
            Geometry::Line,
        ];
        for geometry in &presets {
            let path = geometry_path(geometry, 40.0, 20.0).expect("path");
            let bounds = path.bounds();
            assert!(bounds.right() <= 40.0 + 1e-3 && bounds.bottom() <= 20.0 + 1e-3, "{:?}", geometry);
        }
    }

    #[test]
    fn test_ellipse_leaves_corners() {
        let mut s = scene();
        s.shapes.push(Shape::AutoShape(AutoShape {
            name: "Oval".into(),
            frame: Frame::new(0.0, 0.0, 50.0, 50.0),
            geometry: Geometry::Ellipse,
            fill: Paint::Solid(RED),
            outline: Outline::none(),
            text: None,
        }));
        let out = render(&s, 1.0);
        assert_eq!(out.buffer.pixel(25, 25), Some(RED));
        assert_eq!(out.buffer.pixel(1, 1), Some(Color::WHITE));
    }
}
