//! Slide XML to [`Scene`].
//!
//! The builder walks the master, layout and slide shape trees in paint
//! order, resolves each shape's style through the placeholder cascade and
//! emits concrete scene shapes. Anything it cannot draw becomes
//! [`Shape::Unsupported`] plus a [`Diagnostic`]; only a slide that is
//! missing, unparsable or has no shape tree fails.

use crate::color::{ColorMap, ColorSpec};
use crate::document::{Document, LayoutPart, MasterPart};
use crate::package::Relationships;
use crate::props::{FillSpec, GeometrySpec, LevelSpec, PathCmd, PathSpec, RunSpec, StyleLayer, Xfrm};
use crate::style::{frame_from_xfrm, ResolvedStyle, StyleResolver};
use crate::xml::XmlElement;
use pptx2img_core::units::{emu_to_pt, percent_to_fraction};
use pptx2img_core::{
    ArrowDirection, AutoShape, Bullet, Crop, Diagnostic, Error, FontSpec, Frame, Freeform, FreeformPath,
    Geometry, Group, ImageData, Paint, Paragraph, PathCommand, Picture, Point, Result, Scene, Shape, Size,
    TextBody, TextBox, TextRun, Unsupported,
};
use std::f64::consts::PI;

/// Where a shape tree comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Master,
    Layout,
    Slide,
}

/// A shape tree plus the relationships its `r:embed` ids resolve against.
struct TreeSource<'a> {
    origin: Origin,
    rels: &'a Relationships,
}

/// Placeholder identity from `p:nvPr/p:ph`.
#[derive(Debug, Clone, PartialEq)]
struct PlaceholderKey {
    kind: &'static str,
    idx: Option<i64>,
}

impl PlaceholderKey {
    fn of(shape: &XmlElement) -> Option<Self> {
        let nv = shape
            .children
            .iter()
            .find(|c| c.name.starts_with("nv") && c.name.ends_with("Pr"))?;
        let ph = nv.path(&["nvPr", "ph"])?;
        Some(Self {
            kind: normalize_placeholder_type(ph.attr("type")),
            idx: ph.attr_i64("idx"),
        })
    }
}

/// Fold placeholder types onto the families that inherit from each other.
fn normalize_placeholder_type(kind: Option<&str>) -> &'static str {
    match kind {
        Some("title") | Some("ctrTitle") => "title",
        None | Some("body") | Some("subTitle") | Some("obj") => "body",
        Some("dt") => "dt",
        Some("ftr") => "ftr",
        Some("sldNum") => "sldNum",
        Some("pic") => "pic",
        Some("chart") => "chart",
        Some("tbl") => "tbl",
        Some("media") => "media",
        Some(_) => "other",
    }
}

/// Find a placeholder in a shape tree, by `idx` first when `by_idx`, then by
/// type.
fn find_placeholder<'t>(tree: &'t XmlElement, key: &PlaceholderKey, by_idx: bool) -> Option<&'t XmlElement> {
    let candidates: Vec<(&XmlElement, PlaceholderKey)> = tree
        .children
        .iter()
        .filter_map(|c| PlaceholderKey::of(c).map(|k| (c, k)))
        .collect();
    if by_idx {
        if let Some(idx) = key.idx {
            if let Some((el, _)) = candidates.iter().find(|(_, k)| k.idx == Some(idx)) {
                return Some(el);
            }
        }
    }
    candidates
        .iter()
        .find(|(_, k)| k.kind == key.kind)
        .map(|(el, _)| *el)
}

fn shape_tree(root: &XmlElement) -> Option<&XmlElement> {
    root.path(&["cSld", "spTree"])
}

/// Non-visual name of a shape (`cNvPr@name`), falling back to its id.
fn shape_name(shape: &XmlElement) -> String {
    shape
        .children
        .iter()
        .find(|c| c.name.starts_with("nv") && c.name.ends_with("Pr"))
        .and_then(|nv| nv.child("cNvPr"))
        .and_then(|c| c.attr("name").filter(|n| !n.is_empty()).or_else(|| c.attr("id")))
        .unwrap_or_default()
        .to_string()
}

/// Builds scenes from a loaded [`Document`].
pub struct SceneBuilder<'a> {
    doc: &'a Document,
}

/// Per-slide state shared by every shape on it.
struct SlideContext<'a> {
    doc: &'a Document,
    index: usize,
    resolver: StyleResolver<'a>,
    layout: Option<&'a LayoutPart>,
    master: Option<&'a MasterPart>,
    title_style: StyleLayer,
    body_style: StyleLayer,
    other_style: StyleLayer,
    defaults: StyleLayer,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self { doc }
    }

    /// Build the scene for the 1-based slide `index`.
    pub fn build(&self, index: usize) -> Result<Scene> {
        let doc = self.doc;
        let slide = doc.slide(index).ok_or(Error::InvalidRange {
            start: index,
            end: index,
            count: doc.slide_count(),
        })?;
        let malformed = |reason: String| Error::MalformedSlide { index, reason };
        if let Some(reason) = &slide.rels_error {
            return Err(malformed(reason.clone()));
        }

        let bytes = doc
            .package()
            .part(&slide.path)
            .ok_or_else(|| malformed(format!("slide part '{}' is missing", slide.path)))?;
        let root = XmlElement::parse_bytes(bytes).map_err(|e| malformed(e.to_string()))?;
        let tree = shape_tree(&root).ok_or_else(|| malformed("slide has no p:cSld/p:spTree".into()))?;

        let layout = doc.layout(slide.layout);
        let master = doc.master(slide.master);
        let theme = doc.theme_for(master);
        let color_map = slide_color_map(&root, layout, master);
        let level_layer = |styles: Option<&Vec<LevelSpec>>| {
            styles
                .map(|s| StyleLayer::text_only(s.clone()))
                .unwrap_or_default()
        };
        let ctx = SlideContext {
            doc,
            index,
            resolver: StyleResolver::new(theme, &color_map),
            layout,
            master,
            title_style: level_layer(master.map(|m| &m.title_style)),
            body_style: level_layer(master.map(|m| &m.body_style)),
            other_style: level_layer(master.map(|m| &m.other_style)),
            defaults: StyleLayer::text_only(doc.default_text().to_vec()),
        };

        let mut scene = Scene::new(index, doc.size());
        scene.background = ctx.background(&root);
        if layout.is_none() {
            scene.diagnose(Diagnostic::new(None, "slide has no layout; using master defaults"));
        }

        let show_slide = root.attr_bool("showMasterSp").unwrap_or(true);
        let show_layout = layout
            .and_then(|l| l.root.attr_bool("showMasterSp"))
            .unwrap_or(true);
        if show_slide && show_layout {
            if let Some(master) = master {
                if let Some(tree) = shape_tree(&master.root) {
                    let source = TreeSource {
                        origin: Origin::Master,
                        rels: &master.rels,
                    };
                    ctx.build_tree(tree, &source, &mut scene.shapes, &mut scene.diagnostics);
                }
            }
        }
        if show_slide {
            if let Some(layout) = layout {
                if let Some(tree) = shape_tree(&layout.root) {
                    let source = TreeSource {
                        origin: Origin::Layout,
                        rels: &layout.rels,
                    };
                    ctx.build_tree(tree, &source, &mut scene.shapes, &mut scene.diagnostics);
                }
            }
        }
        let source = TreeSource {
            origin: Origin::Slide,
            rels: &slide.rels,
        };
        ctx.build_tree(tree, &source, &mut scene.shapes, &mut scene.diagnostics);

        log::debug!(
            "Built slide {} with {} shapes, {} diagnostics (layout {}, master {})",
            index,
            scene.shape_count(),
            scene.diagnostics.len(),
            layout.map_or("none", |l| l.path.as_str()),
            master.map_or("none", |m| m.path.as_str())
        );
        Ok(scene)
    }
}

/// Slide override, then layout override, then the master map.
fn slide_color_map(root: &XmlElement, layout: Option<&LayoutPart>, master: Option<&MasterPart>) -> ColorMap {
    let override_of = |root: &XmlElement| {
        root.path(&["clrMapOvr", "overrideClrMapping"])
            .map(ColorMap::from_element)
    };
    override_of(root)
        .or_else(|| layout.and_then(|l| override_of(&l.root)))
        .or_else(|| master.map(|m| m.color_map.clone()))
        .unwrap_or_default()
}

impl<'a> SlideContext<'a> {
    fn background(&self, slide_root: &XmlElement) -> Paint {
        let roots = [
            Some(slide_root),
            self.layout.map(|l| &l.root),
            self.master.map(|m| &m.root),
        ];
        for root in roots.into_iter().flatten() {
            let Some(bg) = root.path(&["cSld", "bg"]) else {
                continue;
            };
            if let Some(fill) = bg.child("bgPr").and_then(FillSpec::from_parent) {
                return self.resolver.paint(&fill);
            }
            if let Some(color) = bg.child("bgRef").and_then(ColorSpec::from_parent) {
                return Paint::Solid(self.resolver.color(&color));
            }
        }
        Paint::Solid(self.resolver.named_color("bg1"))
    }

    fn build_tree(&self, tree: &XmlElement, source: &TreeSource, out: &mut Vec<Shape>, diags: &mut Vec<Diagnostic>) {
        for el in &tree.children {
            match el.name.as_str() {
                "nvGrpSpPr" | "grpSpPr" | "extLst" => {}
                "AlternateContent" => {
                    if let Some(branch) = el.child("Fallback").or_else(|| el.child("Choice")) {
                        self.build_tree(branch, source, out, diags);
                    }
                }
                // Layout and master placeholders only style slide shapes.
                "sp" | "pic" if source.origin != Origin::Slide && PlaceholderKey::of(el).is_some() => {}
                "sp" | "cxnSp" => out.push(self.build_sp(el, source, diags)),
                "pic" => out.push(self.build_picture(el, source, diags)),
                "grpSp" => out.push(self.build_group(el, source, diags)),
                "graphicFrame" => out.push(self.unsupported(el, graphic_kind(el), diags)),
                other => out.push(self.unsupported(el, other.to_string(), diags)),
            }
        }
    }

    /// Layers of the placeholder this shape inherits from, nearest first.
    fn inherited_layers(&self, key: &PlaceholderKey, origin: Origin) -> Vec<StyleLayer> {
        let theme = self.resolver.theme();
        let mut layers = Vec::new();
        if origin == Origin::Slide {
            if let Some(tree) = self.layout.and_then(|l| shape_tree(&l.root)) {
                if let Some(el) = find_placeholder(tree, key, true) {
                    layers.push(StyleLayer::from_shape(el, theme));
                }
            }
        }
        if origin != Origin::Master {
            if let Some(tree) = self.master.and_then(|m| shape_tree(&m.root)) {
                if let Some(el) = find_placeholder(tree, key, false) {
                    layers.push(StyleLayer::from_shape(el, theme));
                }
            }
        }
        layers
    }

    fn text_style(&self, key: Option<&PlaceholderKey>) -> &StyleLayer {
        match key.map(|k| k.kind) {
            Some("title") => &self.title_style,
            Some("body") => &self.body_style,
            _ => &self.other_style,
        }
    }

    /// Resolve a shape's style through its cascade.
    fn resolve(&self, el: &XmlElement, source: &TreeSource) -> ResolvedStyle {
        let key = PlaceholderKey::of(el);
        let mut own = StyleLayer::from_shape(el, self.resolver.theme());
        own.inherit = key.is_some();
        let inherited = key
            .as_ref()
            .map(|k| self.inherited_layers(k, source.origin))
            .unwrap_or_default();

        let mut chain: Vec<&StyleLayer> = vec![&own];
        chain.extend(inherited.iter());
        chain.push(self.text_style(key.as_ref()));
        chain.push(&self.defaults);
        self.resolver.resolve(&chain)
    }

    fn build_sp(&self, el: &XmlElement, source: &TreeSource, diags: &mut Vec<Diagnostic>) -> Shape {
        let name = shape_name(el);
        let style = self.resolve(el, source);
        if style.xfrm.is_none() {
            diags.push(Diagnostic::new(Some(&name), "shape has no position; placed at the origin"));
        }
        let text = el.child("txBody").map(|body| self.text_body(body, &style));
        let is_text_box = el
            .path(&["nvSpPr", "cNvSpPr"])
            .and_then(|c| c.attr_bool("txBox"))
            .unwrap_or(false);
        let frame = style.frame;

        match &style.geometry {
            GeometrySpec::Custom(paths) => Shape::Freeform(Freeform {
                name,
                frame,
                paths: paths.iter().map(|p| freeform_path(p, &frame)).collect(),
                fill: style.fill,
                outline: style.outline,
                text,
            }),
            GeometrySpec::Preset { name: preset, .. } => {
                let geometry = preset_geometry(&style.geometry).unwrap_or_else(|| {
                    log::debug!("Unknown preset geometry '{}' on '{}'", preset, name);
                    diags.push(Diagnostic::new(
                        Some(&name),
                        format!("unknown preset geometry '{}' drawn as a rectangle", preset),
                    ));
                    Geometry::Rect
                });
                match text {
                    Some(text) if is_text_box && geometry == Geometry::Rect => Shape::TextBox(TextBox {
                        name,
                        frame,
                        fill: style.fill,
                        outline: style.outline,
                        text,
                    }),
                    text => {
                        // Lines carry no fill even when a style reference gives one.
                        let fill = if geometry == Geometry::Line { Paint::None } else { style.fill };
                        Shape::AutoShape(AutoShape {
                            name,
                            frame,
                            geometry,
                            fill,
                            outline: style.outline,
                            text,
                        })
                    }
                }
            }
        }
    }

    fn build_picture(&self, el: &XmlElement, source: &TreeSource, diags: &mut Vec<Diagnostic>) -> Shape {
        let name = shape_name(el);
        let style = self.resolve(el, source);
        let blip_fill = el.child("blipFill");

        let image = match blip_fill.and_then(|b| b.child("blip")).and_then(|b| b.attr("r:embed")) {
            Some(rid) => match source.rels.target(rid) {
                Some(target) if is_vector_image(target) => {
                    diags.push(Diagnostic::new(
                        Some(&name),
                        format!("vector image '{}' is not supported", target),
                    ));
                    None
                }
                Some(target) => match self.doc.package().shared_part(target) {
                    Some(bytes) => Some(ImageData {
                        part: target.to_string(),
                        bytes,
                    }),
                    None => {
                        diags.push(Diagnostic::new(Some(&name), format!("image part '{}' is missing", target)));
                        None
                    }
                },
                None => {
                    diags.push(Diagnostic::new(Some(&name), format!("image relationship '{}' not found", rid)));
                    None
                }
            },
            None => {
                diags.push(Diagnostic::new(Some(&name), "picture has no embedded image"));
                None
            }
        };

        let crop = blip_fill
            .and_then(|b| b.child("srcRect"))
            .map(|r| {
                let side = |k| percent_to_fraction(r.attr_i64(k).unwrap_or(0));
                Crop {
                    left: side("l"),
                    top: side("t"),
                    right: side("r"),
                    bottom: side("b"),
                }
            })
            .unwrap_or_default();

        Shape::Picture(Picture {
            name,
            frame: style.frame,
            image,
            crop,
            outline: style.outline,
        })
    }

    fn build_group(&self, el: &XmlElement, source: &TreeSource, diags: &mut Vec<Diagnostic>) -> Shape {
        let name = shape_name(el);
        let xfrm = el
            .path(&["grpSpPr", "xfrm"])
            .and_then(Xfrm::from_element)
            .unwrap_or_default();
        let frame = frame_from_xfrm(&xfrm);
        let (child_offset, child_extent) = match xfrm.child {
            Some((x, y, cx, cy)) if cx > 0 && cy > 0 => {
                (Point::new(emu_to_pt(x), emu_to_pt(y)), Size::new(emu_to_pt(cx), emu_to_pt(cy)))
            }
            _ => (Point::new(frame.x, frame.y), Size::new(frame.width, frame.height)),
        };

        let mut children = Vec::new();
        self.build_tree(el, source, &mut children, diags);
        Shape::Group(Group {
            name,
            frame,
            child_offset,
            child_extent,
            children,
        })
    }

    fn unsupported(&self, el: &XmlElement, kind: String, diags: &mut Vec<Diagnostic>) -> Shape {
        let name = shape_name(el);
        let frame = el
            .child("xfrm")
            .or_else(|| el.path(&["spPr", "xfrm"]))
            .and_then(Xfrm::from_element)
            .map(|x| frame_from_xfrm(&x))
            .unwrap_or_default();
        log::debug!("Slide {}: skipping unsupported {} '{}'", self.index, kind, name);
        diags.push(Diagnostic::new(Some(&name), format!("unsupported shape kind '{}'", kind)));
        Shape::Unsupported(Unsupported { name, frame, kind })
    }

    fn text_body(&self, body: &XmlElement, style: &ResolvedStyle) -> TextBody {
        TextBody {
            layout: style.body,
            paragraphs: body
                .children_named("p")
                .map(|p| self.paragraph(p, style))
                .collect(),
        }
    }

    fn paragraph(&self, p: &XmlElement, style: &ResolvedStyle) -> Paragraph {
        let ppr = p.child("pPr");
        let level = ppr
            .and_then(|x| x.attr_i64("lvl"))
            .unwrap_or(0)
            .clamp(0, style.levels.len() as i64 - 1) as usize;
        let local = ppr.map(LevelSpec::from_element).unwrap_or_default();
        let para = self.resolver.paragraph(&local, &style.levels[level]);

        let mut runs = Vec::new();
        for child in &p.children {
            let text = match child.name.as_str() {
                "r" => child.child("t").map(|t| t.text.clone()).unwrap_or_default(),
                "fld" if child.attr("type") == Some("slidenum") => self.index.to_string(),
                "fld" => child.child("t").map(|t| t.text.clone()).unwrap_or_default(),
                "br" => "\n".to_string(),
                _ => continue,
            };
            let rpr = child.child("rPr").map(RunSpec::from_element).unwrap_or_default();
            let run = self.resolver.run(&rpr, &para);
            runs.push(TextRun {
                text,
                font: run.font,
                color: run.color,
                underline: run.underline,
            });
        }

        let end_font = p
            .child("endParaRPr")
            .map(|e| self.resolver.run(&RunSpec::from_element(e), &para).font)
            .unwrap_or_else(|| para.font.clone());

        let has_text = runs.iter().any(|r| !r.text.trim().is_empty());
        let bullet = para.bullet.filter(|_| has_text).map(|ch| {
            let (font, color) = runs
                .first()
                .map(|r| (r.font.clone(), r.color))
                .unwrap_or_else(|| (para.font.clone(), para.color));
            Bullet {
                ch,
                font: FontSpec {
                    family: para.bullet_font.clone().unwrap_or(font.family),
                    ..font
                },
                color,
            }
        });

        Paragraph {
            align: para.align,
            margin_left: para.margin_left,
            indent: para.indent,
            bullet,
            line_spacing: para.line_spacing,
            space_before: para.space_before,
            space_after: para.space_after,
            runs,
            end_font,
        }
    }
}

fn graphic_kind(el: &XmlElement) -> String {
    el.path(&["graphic", "graphicData"])
        .and_then(|g| g.attr("uri"))
        .and_then(|uri| uri.rsplit('/').next())
        .filter(|k| !k.is_empty())
        .unwrap_or("graphicFrame")
        .to_string()
}

fn is_vector_image(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    lower.ends_with(".emf") || lower.ends_with(".wmf")
}

/// Map a preset name to a scene geometry; `None` for presets the rasterizer
/// does not trace.
fn preset_geometry(spec: &GeometrySpec) -> Option<Geometry> {
    let GeometrySpec::Preset { name, .. } = spec else {
        return None;
    };
    let adj = |key: &str, default: f32| spec.adjust(key).unwrap_or(default);
    let arrow = |direction| Geometry::Arrow {
        direction,
        shaft: adj("adj1", 0.5),
        head: adj("adj2", 0.5),
    };
    Some(match name.as_str() {
        "rect" | "flowChartProcess" => Geometry::Rect,
        "roundRect" | "flowChartAlternateProcess" => Geometry::RoundRect {
            radius: adj("adj", 0.166_67),
        },
        "ellipse" | "flowChartConnector" => Geometry::Ellipse,
        "triangle" => Geometry::Triangle { apex: adj("adj", 0.5) },
        "rtTriangle" => Geometry::RightTriangle,
        "diamond" | "flowChartDecision" => Geometry::Diamond,
        "parallelogram" => Geometry::Parallelogram {
            offset: adj("adj", 0.25),
        },
        "trapezoid" => Geometry::Trapezoid {
            offset: adj("adj", 0.25),
        },
        "pentagon" => Geometry::Pentagon,
        "hexagon" => Geometry::Hexagon {
            offset: adj("adj", 0.25),
        },
        "octagon" => Geometry::Octagon {
            offset: adj("adj", 0.292_89),
        },
        "plus" => Geometry::Plus {
            offset: adj("adj", 0.25),
        },
        "star5" => Geometry::Star5,
        "rightArrow" => arrow(ArrowDirection::Right),
        "leftArrow" => arrow(ArrowDirection::Left),
        "upArrow" => arrow(ArrowDirection::Up),
        "downArrow" => arrow(ArrowDirection::Down),
        "chevron" => Geometry::Chevron {
            offset: adj("adj", 0.5),
        },
        "homePlate" => Geometry::HomePlate {
            offset: adj("adj", 0.5),
        },
        "line" | "straightConnector1" => Geometry::Line,
        n if n.starts_with("bentConnector") || n.starts_with("curvedConnector") => Geometry::Line,
        _ => return None,
    })
}

/// Convert a custom geometry path to frame-local points.
fn freeform_path(path: &PathSpec, frame: &Frame) -> FreeformPath {
    let sx = if path.width > 0 {
        frame.width as f64 / path.width as f64
    } else {
        emu_to_pt(1) as f64
    };
    let sy = if path.height > 0 {
        frame.height as f64 / path.height as f64
    } else {
        emu_to_pt(1) as f64
    };
    let map = |x: f64, y: f64| Point::new((x * sx) as f32, (y * sy) as f32);

    let mut commands = Vec::with_capacity(path.commands.len());
    let mut pen = (0.0_f64, 0.0_f64);
    let mut start = pen;
    for cmd in &path.commands {
        match *cmd {
            PathCmd::MoveTo(p) => {
                pen = (p.x, p.y);
                start = pen;
                commands.push(PathCommand::MoveTo(map(p.x, p.y)));
            }
            PathCmd::LineTo(p) => {
                pen = (p.x, p.y);
                commands.push(PathCommand::LineTo(map(p.x, p.y)));
            }
            PathCmd::QuadTo(c, p) => {
                pen = (p.x, p.y);
                commands.push(PathCommand::QuadTo(map(c.x, c.y), map(p.x, p.y)));
            }
            PathCmd::CubicTo(c1, c2, p) => {
                pen = (p.x, p.y);
                commands.push(PathCommand::CubicTo(map(c1.x, c1.y), map(c2.x, c2.y), map(p.x, p.y)));
            }
            PathCmd::ArcTo { wr, hr, start: st, sweep } => {
                let (segments, end) = arc_to_cubics(pen, wr, hr, st, sweep);
                for [c1, c2, p] in segments {
                    commands.push(PathCommand::CubicTo(map(c1.0, c1.1), map(c2.0, c2.1), map(p.0, p.1)));
                }
                pen = end;
            }
            PathCmd::Close => {
                pen = start;
                commands.push(PathCommand::Close);
            }
        }
    }
    FreeformPath {
        commands,
        filled: path.filled,
        stroked: path.stroked,
    }
}

type Pt = (f64, f64);

/// Approximate an `a:arcTo` starting at `pen` with cubic Béziers, one per
/// quarter turn at most. Returns the segments and the end point.
fn arc_to_cubics(pen: Pt, wr: f64, hr: f64, start_deg: f64, sweep_deg: f64) -> (Vec<[Pt; 3]>, Pt) {
    let start = start_deg * PI / 180.0;
    let sweep = sweep_deg * PI / 180.0;
    let center = (pen.0 - wr * start.cos(), pen.1 - hr * start.sin());
    let on_arc = |a: f64| (center.0 + wr * a.cos(), center.1 + hr * a.sin());

    let count = (sweep.abs() / (PI / 2.0)).ceil().max(1.0) as usize;
    let step = sweep / count as f64;
    let k = 4.0 / 3.0 * (step / 4.0).tan();

    let mut segments = Vec::with_capacity(count);
    let mut a0 = start;
    for _ in 0..count {
        let a1 = a0 + step;
        let p0 = on_arc(a0);
        let p3 = on_arc(a1);
        let c1 = (p0.0 - k * wr * a0.sin(), p0.1 + k * hr * a0.cos());
        let c2 = (p3.0 + k * wr * a1.sin(), p3.1 - k * hr * a1.cos());
        segments.push([c1, c2, p3]);
        a0 = a1;
    }
    let end = on_arc(start + sweep);
    (segments, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{self, DeckBuilder};
    use pptx2img_core::{Align, Anchor, AutoFit, Color};

    fn scene(builder: DeckBuilder, index: usize) -> Scene {
        let doc = Document::from_bytes(builder.build()).unwrap();
        SceneBuilder::new(&doc).build(index).unwrap()
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_rect_in_points() {
        let s = scene(DeckBuilder::new().slide(&fixture::rect(2, 127000, 254000, 1270000, 635000, "FF0000")), 1);
        assert_eq!(s.size, Size::new(720.0, 540.0));
        assert_eq!(s.background, Paint::Solid(Color::WHITE));
        assert_eq!(s.shapes.len(), 1);
        let Shape::AutoShape(rect) = &s.shapes[0] else {
            panic!("expected auto shape");
        };
        assert_eq!(rect.frame, Frame::new(10.0, 20.0, 100.0, 50.0));
        assert_eq!(rect.geometry, Geometry::Rect);
        assert_eq!(rect.fill, Paint::Solid(Color::rgb(255, 0, 0)));
        assert!(!rect.outline.is_visible());
        assert!(s.diagnostics.is_empty());
    }

    #[test]
    fn test_paint_order_is_document_order() {
        let shapes = format!(
            "{}{}{}",
            fixture::rect(2, 0, 0, 100, 100, "FF0000"),
            fixture::text_box(3, 0, 0, 100, 100, "", "hi"),
            fixture::rect(4, 0, 0, 100, 100, "0000FF"),
        );
        let s = scene(DeckBuilder::new().slide(&shapes), 1);
        let names: Vec<&str> = s.shapes.iter().map(Shape::name).collect();
        assert_eq!(names, vec!["Rectangle 2", "TextBox 3", "Rectangle 4"]);
        assert!(matches!(s.shapes[1], Shape::TextBox(_)));
    }

    #[test]
    fn test_placeholder_inherits_layout_frame_and_master_text_style() {
        let body = fixture::placeholder(2, r#"idx="1""#, "", "Point");
        let s = scene(DeckBuilder::new().slide(&body), 1);
        let shape = &s.shapes[0];
        // Frame from the layout placeholder, not the master.
        assert_eq!(*shape.frame(), Frame::new(49.5, emu_to_pt(2_000_000), 621.0, emu_to_pt(4_000_000)));
        let para = &shape.text().unwrap().paragraphs[0];
        assert_eq!(para.runs[0].font.size, 28.0);
        assert_eq!(para.runs[0].font.family, "Calibri");
        assert_eq!(para.margin_left, 18.0);
        assert_eq!(para.bullet.as_ref().map(|b| b.ch), Some('\u{2022}'));
    }

    #[test]
    fn test_title_inherits_from_master_through_layout() {
        let title = fixture::placeholder(2, r#"type="ctrTitle""#, "", "Hello");
        let s = scene(DeckBuilder::new().slide(&title), 1);
        let shape = &s.shapes[0];
        // The layout title has no xfrm, so the master's applies.
        assert!(close(shape.frame().y, emu_to_pt(365_125)));
        let body = shape.text().unwrap();
        assert_eq!(body.layout.anchor, Anchor::Middle);
        let run = &body.paragraphs[0].runs[0];
        assert_eq!(run.font.size, 44.0);
        assert_eq!(run.font.family, "Calibri Light");
        assert_eq!(run.color, Color::BLACK);
        assert!(body.paragraphs[0].bullet.is_none());
    }

    #[test]
    fn test_non_placeholder_does_not_leak_layout_geometry() {
        // A plain text box with no xfrm stays at the origin.
        let sp = r#"<p:sp><p:nvSpPr><p:cNvPr id="5" name="Loose"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>x</a:t></a:r></a:p></p:txBody></p:sp>"#;
        let s = scene(DeckBuilder::new().slide(sp), 1);
        assert_eq!(*s.shapes[0].frame(), Frame::default());
        assert_eq!(s.diagnostics.len(), 1);
        assert_eq!(s.diagnostics[0].shape.as_deref(), Some("Loose"));
        // Text still takes the master's other style.
        assert_eq!(s.shapes[0].text().unwrap().paragraphs[0].runs[0].font.size, 18.0);
    }

    #[test]
    fn test_unsupported_kept_in_order() {
        let shapes = format!(
            "{}{}{}",
            fixture::rect(2, 0, 0, 100, 100, "FF0000"),
            fixture::graphic_frame(3, 12700, 12700, 127000, 127000),
            fixture::rect(4, 0, 0, 100, 100, "0000FF"),
        );
        let s = scene(DeckBuilder::new().slide(&shapes), 1);
        assert_eq!(s.shapes.len(), 3);
        let Shape::Unsupported(u) = &s.shapes[1] else {
            panic!("expected unsupported");
        };
        assert_eq!(u.kind, "table");
        assert_eq!(u.frame, Frame::new(1.0, 1.0, 10.0, 10.0));
        assert_eq!(s.diagnostics.len(), 1);
    }

    #[test]
    fn test_missing_slide_part_is_malformed() {
        let bytes = DeckBuilder::new()
            .slide("")
            .slide("")
            .build_without(&["ppt/slides/slide2.xml"]);
        let doc = Document::from_bytes(bytes).unwrap();
        let builder = SceneBuilder::new(&doc);
        assert!(builder.build(1).is_ok());
        let err = builder.build(2).unwrap_err();
        assert!(matches!(err, Error::MalformedSlide { index: 2, .. }));
    }

    #[test]
    fn test_unreadable_slide_rels_fail_only_that_slide() {
        let bytes = DeckBuilder::new()
            .slide("")
            .slide("")
            .replace_part("ppt/slides/_rels/slide2.xml.rels", "<Relationships><broken")
            .build();
        let doc = Document::from_bytes(bytes).unwrap();
        let builder = SceneBuilder::new(&doc);
        assert!(builder.build(1).is_ok());
        let err = builder.build(2).unwrap_err();
        assert!(matches!(err, Error::MalformedSlide { index: 2, .. }));
    }

    #[test]
    fn test_unreadable_layout_rels_skip_the_layout() {
        let bytes = DeckBuilder::new()
            .slide("")
            .replace_part("ppt/slideLayouts/_rels/slideLayout1.xml.rels", "<Relationships><broken")
            .build();
        let doc = Document::from_bytes(bytes).unwrap();
        let s = SceneBuilder::new(&doc).build(1).unwrap();
        assert!(s.diagnostics.iter().any(|d| d.message.contains("no layout")));
    }

    #[test]
    fn test_bad_xml_and_missing_tree_are_malformed() {
        let doc = Document::from_bytes(
            DeckBuilder::new()
                .raw_slide("<p:sld><p:cSld>")
                .raw_slide(r#"<p:sld xmlns:p="p"><p:cSld/></p:sld>"#)
                .build(),
        )
        .unwrap();
        let builder = SceneBuilder::new(&doc);
        for index in [1, 2] {
            let err = builder.build(index).unwrap_err();
            assert!(matches!(err, Error::MalformedSlide { .. }), "slide {}", index);
        }
    }

    #[test]
    fn test_master_shapes_and_background() {
        let master_rect = fixture::rect(9, 0, 0, 127000, 127000, "00FF00");
        let bg = r#"<p:bg><p:bgPr><a:solidFill><a:schemeClr val="accent1"/></a:solidFill></p:bgPr></p:bg>"#;
        let builder = DeckBuilder::new()
            .master_shapes(&master_rect)
            .master_background(bg)
            .slide(&fixture::rect(2, 0, 0, 100, 100, "FF0000"));
        let s = scene(builder, 1);
        assert_eq!(s.background, Paint::Solid(Color::rgb(0x44, 0x72, 0xC4)));
        let names: Vec<&str> = s.shapes.iter().map(Shape::name).collect();
        assert_eq!(names, vec!["Rectangle 9", "Rectangle 2"]);

        let hidden = DeckBuilder::new().master_shapes(&master_rect).raw_slide(&format!(
            r#"<p:sld xmlns:a="a" xmlns:p="p" xmlns:r="r" showMasterSp="0"><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>"#,
            fixture::rect(2, 0, 0, 100, 100, "FF0000")
        ));
        let s = scene(hidden, 1);
        assert_eq!(s.shapes.len(), 1);
    }

    #[test]
    fn test_picture_and_missing_image() {
        let shapes = format!(
            "{}{}",
            fixture::picture(2, "rId5", 0, 0, 127000, 127000),
            fixture::picture(3, "rId9", 0, 0, 127000, 127000)
        );
        let builder = DeckBuilder::new().image("rId5", "a.png", vec![1, 2, 3]).slide(&shapes);
        let s = scene(builder, 1);
        let Shape::Picture(found) = &s.shapes[0] else {
            panic!("expected picture");
        };
        let image = found.image.as_ref().unwrap();
        assert_eq!(image.part, "ppt/media/a.png");
        assert_eq!(&image.bytes[..], &[1, 2, 3]);
        let Shape::Picture(missing) = &s.shapes[1] else {
            panic!("expected picture");
        };
        assert!(missing.image.is_none());
        assert_eq!(s.diagnostics.len(), 1);
    }

    #[test]
    fn test_group_child_space() {
        let group = format!(
            r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="7" name="Group 7"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="127000" y="127000"/><a:ext cx="254000" cy="254000"/><a:chOff x="0" y="0"/><a:chExt cx="127000" cy="127000"/></a:xfrm></p:grpSpPr>{}</p:grpSp>"#,
            fixture::rect(8, 0, 0, 127000, 127000, "FF0000")
        );
        let s = scene(DeckBuilder::new().slide(&group), 1);
        let Shape::Group(g) = &s.shapes[0] else {
            panic!("expected group");
        };
        assert_eq!(g.frame, Frame::new(10.0, 10.0, 20.0, 20.0));
        assert_eq!(g.child_offset, Point::new(0.0, 0.0));
        assert_eq!(g.child_extent, Size::new(10.0, 10.0));
        assert_eq!(g.children.len(), 1);
        assert_eq!(s.shape_count(), 2);
    }

    #[test]
    fn test_alternate_content_prefers_fallback() {
        let alt = format!(
            r#"<mc:AlternateContent xmlns:mc="mc"><mc:Choice Requires="x">{}</mc:Choice><mc:Fallback>{}</mc:Fallback></mc:AlternateContent>"#,
            fixture::rect(2, 0, 0, 100, 100, "FF0000"),
            fixture::rect(3, 0, 0, 100, 100, "0000FF")
        );
        let s = scene(DeckBuilder::new().slide(&alt), 1);
        assert_eq!(s.shapes.len(), 1);
        assert_eq!(s.shapes[0].name(), "Rectangle 3");
    }

    #[test]
    fn test_text_runs_breaks_and_fields() {
        let sp = r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="T"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="1270000" cy="1270000"/></a:xfrm></p:spPr><p:txBody><a:bodyPr wrap="none" anchor="b"><a:normAutofit fontScale="50000"/></a:bodyPr><a:p><a:pPr algn="ctr"/><a:r><a:rPr b="1" u="sng"/><a:t>One</a:t></a:r><a:br/><a:fld type="slidenum"><a:t>‹#›</a:t></a:fld></a:p></p:txBody></p:sp>"#;
        let s = scene(DeckBuilder::new().slide(sp), 1);
        let body = s.shapes[0].text().unwrap();
        assert!(!body.layout.wrap);
        assert_eq!(body.layout.anchor, Anchor::Bottom);
        assert_eq!(
            body.layout.autofit,
            AutoFit::Shrink {
                font_scale: Some(0.5),
                line_reduction: 0.0
            }
        );
        let para = &body.paragraphs[0];
        assert_eq!(para.align, Align::Center);
        assert_eq!(para.text(), "One\n1");
        assert!(para.runs[0].font.bold && para.runs[0].underline);
        assert!(!para.runs[2].font.bold);
    }

    #[test]
    fn test_preset_geometries() {
        let geom = |xml: &str| {
            let sp_pr = XmlElement::parse(xml).unwrap();
            preset_geometry(&GeometrySpec::from_sp_pr(&sp_pr).unwrap())
        };
        assert_eq!(
            geom(r#"<p:spPr><a:prstGeom prst="roundRect"/></p:spPr>"#),
            Some(Geometry::RoundRect { radius: 0.166_67 })
        );
        assert_eq!(
            geom(r#"<p:spPr><a:prstGeom prst="bentConnector3"/></p:spPr>"#),
            Some(Geometry::Line)
        );
        assert!(matches!(
            geom(r#"<p:spPr><a:prstGeom prst="downArrow"/></p:spPr>"#),
            Some(Geometry::Arrow { direction: ArrowDirection::Down, .. })
        ));
        assert_eq!(geom(r#"<p:spPr><a:prstGeom prst="cloud"/></p:spPr>"#), None);
    }

    #[test]
    fn test_arc_to_cubics_quarter_circle() {
        // Pen at (100, 0) on a circle of radius 100 around the origin.
        let (segments, end) = arc_to_cubics((100.0, 0.0), 100.0, 100.0, 0.0, 90.0);
        assert_eq!(segments.len(), 1);
        assert!((end.0 - 0.0).abs() < 1e-9 && (end.1 - 100.0).abs() < 1e-9);
        let [c1, c2, p] = segments[0];
        assert!((c1.0 - 100.0).abs() < 1e-9 && (c1.1 - 55.228).abs() < 1e-2);
        assert!((c2.0 - 55.228).abs() < 1e-2 && (c2.1 - 100.0).abs() < 1e-9);
        assert_eq!(p, end);

        let (segments, _) = arc_to_cubics((0.0, 0.0), 10.0, 5.0, 0.0, -270.0);
        assert_eq!(segments.len(), 3);
    }

    #[test]
    fn test_freeform_scales_path_space_to_frame() {
        let path = PathSpec {
            width: 10,
            height: 20,
            filled: true,
            stroked: false,
            commands: vec![
                PathCmd::MoveTo(crate::props::PathPoint { x: 0.0, y: 0.0 }),
                PathCmd::LineTo(crate::props::PathPoint { x: 10.0, y: 20.0 }),
                PathCmd::Close,
            ],
        };
        let out = freeform_path(&path, &Frame::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(out.commands[1], PathCommand::LineTo(Point::new(100.0, 100.0)));
        assert!(out.filled && !out.stroked);
    }
}
