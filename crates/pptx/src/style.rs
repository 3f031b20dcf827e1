//! Per-attribute style resolution over the placeholder cascade.
//!
//! A chain is ordered nearest first: the shape itself, then the matching
//! layout placeholder, the master placeholder, the master text style and
//! the presentation defaults. Each attribute takes the first layer that
//! sets it; a layer with `inherit == false` ends the walk for shape
//! attributes.

use crate::color::{resolve_color, ColorMap, ColorSpec};
use crate::props::{BulletSpec, FillSpec, GeometrySpec, LevelSpec, LineSpec, RunSpec, StyleLayer, Xfrm, LEVELS};
use crate::theme::Theme;
use pptx2img_core::units::emu_to_pt;
use pptx2img_core::{
    Align, BodyLayout, Color, Dash, FontSpec, Frame, GradientStop, Insets, LineSpacing, Outline, Paint, Spacing,
};

/// Point size of text when nothing in the cascade sets one.
pub const DEFAULT_FONT_SIZE: f32 = 18.0;

/// Outline width when a line has a fill but no width.
pub const DEFAULT_LINE_WIDTH: f32 = 0.75;

/// Concrete paragraph and character defaults for one level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelStyle {
    pub align: Align,
    pub margin_left: f32,
    pub indent: f32,
    pub bullet: Option<char>,
    pub bullet_font: Option<String>,
    pub line_spacing: LineSpacing,
    pub space_before: Spacing,
    pub space_after: Spacing,
    pub font: FontSpec,
    pub color: Color,
    pub underline: bool,
}

/// A shape's style with every attribute concrete.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub frame: Frame,
    /// Raw transform the frame came from, `None` when no layer placed the
    /// shape.
    pub xfrm: Option<Xfrm>,
    pub geometry: GeometrySpec,
    pub fill: Paint,
    pub outline: Outline,
    pub body: BodyLayout,
    pub levels: Vec<LevelStyle>,
}

/// Resolves layer chains against one theme and color map.
pub struct StyleResolver<'a> {
    theme: &'a Theme,
    color_map: &'a ColorMap,
}

/// First value set along the chain for a shape attribute, honoring the
/// inheritance marker.
fn shape_attr<'l, T>(chain: &[&'l StyleLayer], pick: impl Fn(&'l StyleLayer) -> Option<&'l T>) -> Option<&'l T> {
    for layer in chain {
        if let Some(value) = pick(*layer) {
            return Some(value);
        }
        if !layer.inherit {
            break;
        }
    }
    None
}

/// First value set along the chain for a text attribute of `level`.
fn level_attr<'l, T>(
    chain: &[&'l StyleLayer],
    level: usize,
    pick: impl Fn(&'l LevelSpec) -> Option<&'l T>,
) -> Option<&'l T> {
    chain
        .iter()
        .find_map(|layer| (*layer).levels.get(level).and_then(&pick))
}

impl<'a> StyleResolver<'a> {
    pub fn new(theme: &'a Theme, color_map: &'a ColorMap) -> Self {
        Self { theme, color_map }
    }

    pub fn theme(&self) -> &Theme {
        self.theme
    }

    /// Resolve a color; unmappable references become transparent.
    pub fn color(&self, spec: &ColorSpec) -> Color {
        resolve_color(spec, &self.theme.colors, self.color_map).unwrap_or(Color::TRANSPARENT)
    }

    /// A scheme or mapped color by name, e.g. `bg1`.
    pub fn named_color(&self, name: &str) -> Color {
        self.color(&ColorSpec::scheme(name))
    }

    pub fn paint(&self, fill: &FillSpec) -> Paint {
        match fill {
            FillSpec::None => Paint::None,
            FillSpec::Solid(spec) => {
                let color = self.color(spec);
                if color.is_transparent() {
                    Paint::None
                } else {
                    Paint::Solid(color)
                }
            }
            FillSpec::Gradient { angle, stops } => {
                let mut stops: Vec<GradientStop> = stops
                    .iter()
                    .map(|(position, spec)| GradientStop {
                        position: *position,
                        color: self.color(spec),
                    })
                    .collect();
                stops.sort_by(|a, b| a.position.total_cmp(&b.position));
                match stops.len() {
                    0 => Paint::None,
                    1 => Paint::Solid(stops[0].color),
                    _ => Paint::LinearGradient { angle: *angle, stops },
                }
            }
        }
    }

    pub fn outline(&self, line: &LineSpec) -> Outline {
        let paint = line.fill.as_ref().map(|f| self.paint(f)).unwrap_or(Paint::None);
        Outline {
            paint,
            width: line.width.unwrap_or(DEFAULT_LINE_WIDTH),
            dash: line.dash.unwrap_or(Dash::Solid),
        }
    }

    /// Map a typeface reference to a concrete family name.
    pub fn typeface(&self, typeface: Option<&String>) -> String {
        match typeface {
            Some(t) => self.theme.typeface(t).to_string(),
            None => self.theme.minor_font.clone(),
        }
    }

    /// Resolve a full chain.
    pub fn resolve(&self, chain: &[&StyleLayer]) -> ResolvedStyle {
        let xfrm = shape_attr(chain, |l| l.frame.as_ref()).copied();
        let frame = xfrm.map(|x| frame_from_xfrm(&x)).unwrap_or_default();

        let geometry = shape_attr(chain, |l| l.geometry.as_ref())
            .cloned()
            .unwrap_or_else(GeometrySpec::rect);
        let fill = shape_attr(chain, |l| l.fill.as_ref())
            .map(|f| self.paint(f))
            .unwrap_or(Paint::None);

        let line = LineSpec {
            fill: shape_attr(chain, |l| l.line.fill.as_ref()).cloned(),
            width: shape_attr(chain, |l| l.line.width.as_ref()).copied(),
            dash: shape_attr(chain, |l| l.line.dash.as_ref()).copied(),
        };
        let outline = self.outline(&line);

        let defaults = Insets::default();
        let inset = |i: usize, default: f32| {
            shape_attr(chain, |l| l.body.insets[i].as_ref())
                .copied()
                .unwrap_or(default)
        };
        let body = BodyLayout {
            anchor: shape_attr(chain, |l| l.body.anchor.as_ref()).copied().unwrap_or_default(),
            wrap: shape_attr(chain, |l| l.body.wrap.as_ref()).copied().unwrap_or(true),
            autofit: shape_attr(chain, |l| l.body.autofit.as_ref()).copied().unwrap_or_default(),
            insets: Insets {
                left: inset(0, defaults.left),
                top: inset(1, defaults.top),
                right: inset(2, defaults.right),
                bottom: inset(3, defaults.bottom),
            },
        };

        let levels = (0..LEVELS).map(|i| self.resolve_level(chain, i)).collect();

        ResolvedStyle {
            frame,
            xfrm,
            geometry,
            fill,
            outline,
            body,
            levels,
        }
    }

    fn resolve_level(&self, chain: &[&StyleLayer], level: usize) -> LevelStyle {
        let bullet = level_attr(chain, level, |l| l.bullet.as_ref());
        LevelStyle {
            align: level_attr(chain, level, |l| l.align.as_ref()).copied().unwrap_or_default(),
            margin_left: level_attr(chain, level, |l| l.margin_left.as_ref()).copied().unwrap_or(0.0),
            indent: level_attr(chain, level, |l| l.indent.as_ref()).copied().unwrap_or(0.0),
            bullet: match bullet {
                Some(BulletSpec::Char(c)) => Some(*c),
                _ => None,
            },
            bullet_font: level_attr(chain, level, |l| l.bullet_font.as_ref()).cloned(),
            line_spacing: level_attr(chain, level, |l| l.line_spacing.as_ref())
                .copied()
                .unwrap_or_default(),
            space_before: level_attr(chain, level, |l| l.space_before.as_ref())
                .copied()
                .unwrap_or_default(),
            space_after: level_attr(chain, level, |l| l.space_after.as_ref())
                .copied()
                .unwrap_or_default(),
            font: FontSpec {
                family: self.typeface(level_attr(chain, level, |l| l.run.typeface.as_ref())),
                size: level_attr(chain, level, |l| l.run.size.as_ref())
                    .copied()
                    .unwrap_or(DEFAULT_FONT_SIZE),
                bold: level_attr(chain, level, |l| l.run.bold.as_ref()).copied().unwrap_or(false),
                italic: level_attr(chain, level, |l| l.run.italic.as_ref()).copied().unwrap_or(false),
            },
            color: level_attr(chain, level, |l| l.run.color.as_ref())
                .map(|c| self.color(c))
                .unwrap_or_else(|| self.named_color("tx1")),
            underline: level_attr(chain, level, |l| l.run.underline.as_ref())
                .copied()
                .unwrap_or(false),
        }
    }

    /// Apply a paragraph's own `a:pPr` on top of its level defaults.
    pub fn paragraph(&self, local: &LevelSpec, base: &LevelStyle) -> LevelStyle {
        LevelStyle {
            align: local.align.unwrap_or(base.align),
            margin_left: local.margin_left.unwrap_or(base.margin_left),
            indent: local.indent.unwrap_or(base.indent),
            bullet: match &local.bullet {
                Some(BulletSpec::Char(c)) => Some(*c),
                Some(BulletSpec::None) => None,
                None => base.bullet,
            },
            bullet_font: local.bullet_font.clone().or_else(|| base.bullet_font.clone()),
            line_spacing: local.line_spacing.unwrap_or(base.line_spacing),
            space_before: local.space_before.unwrap_or(base.space_before),
            space_after: local.space_after.unwrap_or(base.space_after),
            ..self.run(&local.run, base)
        }
    }

    /// Apply run properties on top of paragraph defaults.
    pub fn run(&self, local: &RunSpec, base: &LevelStyle) -> LevelStyle {
        LevelStyle {
            font: FontSpec {
                family: match &local.typeface {
                    Some(t) => self.theme.typeface(t).to_string(),
                    None => base.font.family.clone(),
                },
                size: local.size.unwrap_or(base.font.size),
                bold: local.bold.unwrap_or(base.font.bold),
                italic: local.italic.unwrap_or(base.font.italic),
            },
            color: local.color.as_ref().map(|c| self.color(c)).unwrap_or(base.color),
            underline: local.underline.unwrap_or(base.underline),
            ..base.clone()
        }
    }
}

/// Convert an `a:xfrm` to a frame in points.
pub fn frame_from_xfrm(xfrm: &Xfrm) -> Frame {
    Frame {
        x: emu_to_pt(xfrm.x),
        y: emu_to_pt(xfrm.y),
        width: emu_to_pt(xfrm.cx),
        height: emu_to_pt(xfrm.cy),
        rotation: xfrm.rotation_deg(),
        flip_h: xfrm.flip_h,
        flip_v: xfrm.flip_v,
    }
}
