//! Style-bearing property layers read from shapes, placeholders and text
//! styles.
//!
//! Every field is optional: `None` means "not set here, ask the parent".
//! The [`crate::style`] resolver walks an ordered chain of these layers.

use crate::color::ColorSpec;
use crate::theme::Theme;
use crate::xml::XmlElement;
use pptx2img_core::units::{angle_to_deg, centipoints_to_pt, emu_to_pt, percent_to_fraction};
use pptx2img_core::{Align, Anchor, AutoFit, Dash, LineSpacing, Spacing};

/// Number of paragraph levels OOXML styles define.
pub const LEVELS: usize = 9;

/// `a:xfrm` in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Xfrm {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
    /// 60,000ths of a degree.
    pub rot: i64,
    pub flip_h: bool,
    pub flip_v: bool,
    /// Child coordinate space, on group transforms only.
    pub child: Option<(i64, i64, i64, i64)>,
}

impl Xfrm {
    pub fn from_element(el: &XmlElement) -> Option<Self> {
        let off = el.child("off")?;
        let ext = el.child("ext")?;
        let child = match (el.child("chOff"), el.child("chExt")) {
            (Some(o), Some(e)) => Some((
                o.attr_i64("x").unwrap_or(0),
                o.attr_i64("y").unwrap_or(0),
                e.attr_i64("cx").unwrap_or(0),
                e.attr_i64("cy").unwrap_or(0),
            )),
            _ => None,
        };
        Some(Self {
            x: off.attr_i64("x").unwrap_or(0),
            y: off.attr_i64("y").unwrap_or(0),
            cx: ext.attr_i64("cx").unwrap_or(0),
            cy: ext.attr_i64("cy").unwrap_or(0),
            rot: el.attr_i64("rot").unwrap_or(0),
            flip_h: el.attr_bool("flipH").unwrap_or(false),
            flip_v: el.attr_bool("flipV").unwrap_or(false),
            child,
        })
    }

    pub fn rotation_deg(&self) -> f32 {
        angle_to_deg(self.rot)
    }
}

/// A path coordinate that may be a literal or a guide name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
}

impl PathPoint {
    fn from_element(el: &XmlElement) -> Option<Self> {
        Some(Self {
            x: el.attr("x")?.trim().parse().ok()?,
            y: el.attr("y")?.trim().parse().ok()?,
        })
    }
}

/// One `a:path` command in path units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCmd {
    MoveTo(PathPoint),
    LineTo(PathPoint),
    QuadTo(PathPoint, PathPoint),
    CubicTo(PathPoint, PathPoint, PathPoint),
    /// Radii in path units, angles in degrees.
    ArcTo {
        wr: f64,
        hr: f64,
        start: f64,
        sweep: f64,
    },
    Close,
}

/// One `a:path` of a custom geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSpec {
    /// Path coordinate space; zero means "same as the shape extent in EMU".
    pub width: i64,
    pub height: i64,
    pub filled: bool,
    pub stroked: bool,
    pub commands: Vec<PathCmd>,
}

/// Shape geometry: a named preset or explicit paths.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometrySpec {
    Preset {
        name: String,
        /// `a:avLst` guides as (name, raw value).
        adjust: Vec<(String, i64)>,
    },
    Custom(Vec<PathSpec>),
}

impl GeometrySpec {
    pub fn rect() -> Self {
        GeometrySpec::Preset {
            name: "rect".into(),
            adjust: Vec::new(),
        }
    }

    /// Read `a:prstGeom` or `a:custGeom` from an `spPr`.
    pub fn from_sp_pr(sp_pr: &XmlElement) -> Option<Self> {
        if let Some(prst) = sp_pr.child("prstGeom") {
            let adjust = prst
                .child("avLst")
                .map(|av| {
                    av.children_named("gd")
                        .filter_map(|gd| {
                            let value = gd.attr("fmla")?.strip_prefix("val ")?.trim().parse().ok()?;
                            Some((gd.attr("name")?.to_string(), value))
                        })
                        .collect()
                })
                .unwrap_or_default();
            return Some(GeometrySpec::Preset {
                name: prst.attr("prst").unwrap_or("rect").to_string(),
                adjust,
            });
        }
        let cust = sp_pr.child("custGeom")?;
        let paths = cust
            .child("pathLst")
            .map(|list| list.children_named("path").map(parse_path).collect())
            .unwrap_or_default();
        Some(GeometrySpec::Custom(paths))
    }

    /// Adjust value by guide name, as a fraction (50000 -> 0.5).
    pub fn adjust(&self, name: &str) -> Option<f32> {
        match self {
            GeometrySpec::Preset { adjust, .. } => adjust
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| percent_to_fraction(*v)),
            GeometrySpec::Custom(_) => None,
        }
    }
}

fn parse_path(path: &XmlElement) -> PathSpec {
    let commands = path
        .children
        .iter()
        .filter_map(|cmd| {
            let pts: Vec<PathPoint> = cmd
                .children_named("pt")
                .filter_map(PathPoint::from_element)
                .collect();
            match (cmd.name.as_str(), pts.as_slice()) {
                ("moveTo", [p]) => Some(PathCmd::MoveTo(*p)),
                ("lnTo", [p]) => Some(PathCmd::LineTo(*p)),
                ("quadBezTo", [c, p]) => Some(PathCmd::QuadTo(*c, *p)),
                ("cubicBezTo", [c1, c2, p]) => Some(PathCmd::CubicTo(*c1, *c2, *p)),
                ("arcTo", _) => {
                    let num = |k| cmd.attr(k).and_then(|v| v.trim().parse::<f64>().ok());
                    Some(PathCmd::ArcTo {
                        wr: num("wR")?,
                        hr: num("hR")?,
                        start: num("stAng")? / 60_000.0,
                        sweep: num("swAng")? / 60_000.0,
                    })
                }
                ("close", _) => Some(PathCmd::Close),
                _ => None,
            }
        })
        .collect();
    PathSpec {
        width: path.attr_i64("w").unwrap_or(0),
        height: path.attr_i64("h").unwrap_or(0),
        filled: path.attr("fill") != Some("none"),
        stroked: path.attr_bool("stroke").unwrap_or(true),
        commands,
    }
}

/// An unresolved fill.
#[derive(Debug, Clone, PartialEq)]
pub enum FillSpec {
    None,
    Solid(ColorSpec),
    Gradient {
        /// Degrees clockwise from the positive x axis.
        angle: f32,
        stops: Vec<(f32, ColorSpec)>,
    },
}

impl FillSpec {
    /// Read the fill child of `parent` (an `spPr`, `bgPr`, `ln` or `rPr`).
    pub fn from_parent(parent: &XmlElement) -> Option<Self> {
        parent.children.iter().find_map(Self::from_element)
    }

    pub fn from_element(el: &XmlElement) -> Option<Self> {
        match el.name.as_str() {
            "noFill" => Some(FillSpec::None),
            "solidFill" => Some(
                ColorSpec::from_parent(el)
                    .map(FillSpec::Solid)
                    .unwrap_or(FillSpec::None),
            ),
            "gradFill" => {
                let stops: Vec<(f32, ColorSpec)> = el
                    .child("gsLst")
                    .map(|list| {
                        list.children_named("gs")
                            .filter_map(|gs| {
                                let pos = percent_to_fraction(gs.attr_i64("pos").unwrap_or(0));
                                Some((pos, ColorSpec::from_parent(gs)?))
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                let angle = el
                    .child("lin")
                    .and_then(|lin| lin.attr_i64("ang"))
                    .map(angle_to_deg)
                    .unwrap_or(90.0);
                Some(FillSpec::Gradient { angle, stops })
            }
            // Patterns render as their foreground color.
            "pattFill" => Some(
                el.child("fgClr")
                    .and_then(ColorSpec::from_parent)
                    .map(FillSpec::Solid)
                    .unwrap_or(FillSpec::None),
            ),
            "blipFill" | "grpFill" => Some(FillSpec::None),
            _ => None,
        }
    }
}

/// An unresolved outline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineSpec {
    pub fill: Option<FillSpec>,
    /// Width in points.
    pub width: Option<f32>,
    pub dash: Option<Dash>,
}

impl LineSpec {
    pub fn from_element(ln: &XmlElement) -> Self {
        let dash = ln
            .child("prstDash")
            .and_then(|d| d.attr("val"))
            .map(|val| match val {
                "solid" => Dash::Solid,
                "dot" | "sysDot" => Dash::Dot,
                "dash" | "sysDash" => Dash::Dash,
                "lgDash" => Dash::LongDash,
                _ => Dash::DashDot,
            });
        Self {
            fill: FillSpec::from_parent(ln),
            width: ln.attr_i64("w").map(emu_to_pt),
            dash,
        }
    }

    fn or(&self, other: &LineSpec) -> LineSpec {
        LineSpec {
            fill: self.fill.clone().or_else(|| other.fill.clone()),
            width: self.width.or(other.width),
            dash: self.dash.or(other.dash),
        }
    }
}

/// `a:bodyPr` properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BodySpec {
    pub anchor: Option<Anchor>,
    pub wrap: Option<bool>,
    /// Left, top, right, bottom in points.
    pub insets: [Option<f32>; 4],
    pub autofit: Option<AutoFit>,
}

impl BodySpec {
    pub fn from_element(body: &XmlElement) -> Self {
        let anchor = body.attr("anchor").map(|a| match a {
            "ctr" => Anchor::Middle,
            "b" => Anchor::Bottom,
            _ => Anchor::Top,
        });
        let wrap = body.attr("wrap").map(|w| w != "none");
        let inset = |key| body.attr_i64(key).map(emu_to_pt);
        let autofit = if body.has_child("noAutofit") {
            Some(AutoFit::Disabled)
        } else if body.has_child("spAutoFit") {
            Some(AutoFit::ResizeShape)
        } else {
            body.child("normAutofit").map(|n| AutoFit::Shrink {
                font_scale: n.attr_i64("fontScale").map(percent_to_fraction),
                line_reduction: n.attr_i64("lnSpcReduction").map(percent_to_fraction).unwrap_or(0.0),
            })
        };
        Self {
            anchor,
            wrap,
            insets: [inset("lIns"), inset("tIns"), inset("rIns"), inset("bIns")],
            autofit,
        }
    }
}

/// Character properties (`a:rPr`, `a:defRPr`, `a:endParaRPr`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunSpec {
    /// Points.
    pub size: Option<f32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub color: Option<ColorSpec>,
    /// Raw typeface, possibly a theme reference such as `+mn-lt`.
    pub typeface: Option<String>,
}

impl RunSpec {
    pub fn from_element(rpr: &XmlElement) -> Self {
        let color = match FillSpec::from_parent(rpr) {
            Some(FillSpec::Solid(c)) => Some(c),
            Some(FillSpec::Gradient { stops, .. }) => stops.into_iter().next().map(|(_, c)| c),
            _ => None,
        };
        Self {
            size: rpr.attr_i64("sz").map(centipoints_to_pt),
            bold: rpr.attr_bool("b"),
            italic: rpr.attr_bool("i"),
            underline: rpr.attr("u").map(|u| u != "none"),
            color,
            typeface: rpr
                .child("latin")
                .and_then(|l| l.attr("typeface"))
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        }
    }
}

/// Bullet setting for a level.
#[derive(Debug, Clone, PartialEq)]
pub enum BulletSpec {
    None,
    Char(char),
}

/// Paragraph properties for one level (`a:lvlNpPr` or `a:pPr`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LevelSpec {
    pub align: Option<Align>,
    /// Points.
    pub margin_left: Option<f32>,
    /// Points.
    pub indent: Option<f32>,
    pub bullet: Option<BulletSpec>,
    pub bullet_font: Option<String>,
    pub line_spacing: Option<LineSpacing>,
    pub space_before: Option<Spacing>,
    pub space_after: Option<Spacing>,
    pub run: RunSpec,
}

impl LevelSpec {
    pub fn from_element(ppr: &XmlElement) -> Self {
        let align = ppr.attr("algn").map(|a| match a {
            "ctr" => Align::Center,
            "r" => Align::Right,
            "just" | "dist" | "justLow" | "thaiDist" => Align::Justify,
            _ => Align::Left,
        });
        let bullet = if ppr.has_child("buNone") {
            Some(BulletSpec::None)
        } else {
            ppr.child("buChar")
                .and_then(|b| b.attr("char"))
                .and_then(|c| c.chars().next())
                .map(BulletSpec::Char)
        };
        let line_spacing = ppr.child("lnSpc").and_then(|l| {
            if let Some(pct) = l.child("spcPct").and_then(|p| p.attr_i64("val")) {
                Some(LineSpacing::Proportional(percent_to_fraction(pct)))
            } else {
                l.child("spcPts")
                    .and_then(|p| p.attr_i64("val"))
                    .map(|v| LineSpacing::Exact(centipoints_to_pt(v)))
            }
        });
        Self {
            align,
            margin_left: ppr.attr_i64("marL").map(emu_to_pt),
            indent: ppr.attr_i64("indent").map(emu_to_pt),
            bullet,
            bullet_font: ppr
                .child("buFont")
                .and_then(|f| f.attr("typeface"))
                .map(str::to_string),
            line_spacing,
            space_before: ppr.child("spcBef").and_then(spacing),
            space_after: ppr.child("spcAft").and_then(spacing),
            run: ppr
                .child("defRPr")
                .map(RunSpec::from_element)
                .unwrap_or_default(),
        }
    }

    /// Read the nine levels of a list style (`a:lstStyle`, `p:bodyStyle`,
    /// `p:defaultTextStyle`). `a:defPPr` fills levels that are not listed.
    pub fn list(list: &XmlElement) -> Vec<LevelSpec> {
        let default = list.child("defPPr").map(LevelSpec::from_element);
        (1..=LEVELS)
            .map(|n| {
                list.child(&format!("lvl{}pPr", n))
                    .map(LevelSpec::from_element)
                    .or_else(|| default.clone())
                    .unwrap_or_default()
            })
            .collect()
    }
}

fn spacing(el: &XmlElement) -> Option<Spacing> {
    if let Some(pct) = el.child("spcPct").and_then(|p| p.attr_i64("val")) {
        return Some(Spacing::Proportional(percent_to_fraction(pct)));
    }
    el.child("spcPts")
        .and_then(|p| p.attr_i64("val"))
        .map(|v| Spacing::Points(centipoints_to_pt(v)))
}

/// One link of the style cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleLayer {
    pub frame: Option<Xfrm>,
    pub geometry: Option<GeometrySpec>,
    pub fill: Option<FillSpec>,
    pub line: LineSpec,
    pub body: BodySpec,
    pub levels: Vec<LevelSpec>,
    /// When false, shape attributes (frame, geometry, fill, outline, body)
    /// stop resolving at this layer. Text levels keep walking to the
    /// master text styles.
    pub inherit: bool,
}

impl Default for StyleLayer {
    fn default() -> Self {
        Self {
            frame: None,
            geometry: None,
            fill: None,
            line: LineSpec::default(),
            body: BodySpec::default(),
            levels: vec![LevelSpec::default(); LEVELS],
            inherit: true,
        }
    }
}

impl StyleLayer {
    /// Layer carrying only text levels, e.g. a master text style.
    pub fn text_only(levels: Vec<LevelSpec>) -> Self {
        Self {
            levels,
            ..Default::default()
        }
    }

    /// Read a shape's own properties: `spPr`, `txBody/bodyPr`,
    /// `txBody/lstStyle`, with `p:style` references filling what the shape
    /// leaves unset.
    pub fn from_shape(shape: &XmlElement, theme: &Theme) -> Self {
        let mut layer = StyleLayer::default();

        if let Some(sp_pr) = shape.child("spPr").or_else(|| shape.child("grpSpPr")) {
            layer.frame = sp_pr.child("xfrm").and_then(Xfrm::from_element);
            layer.geometry = GeometrySpec::from_sp_pr(sp_pr);
            layer.fill = FillSpec::from_parent(sp_pr);
            if let Some(ln) = sp_pr.child("ln") {
                layer.line = LineSpec::from_element(ln);
            }
        }
        // Graphic frames keep their transform outside spPr.
        if layer.frame.is_none() {
            layer.frame = shape.child("xfrm").and_then(Xfrm::from_element);
        }

        if let Some(body) = shape.child("txBody") {
            if let Some(body_pr) = body.child("bodyPr") {
                layer.body = BodySpec::from_element(body_pr);
            }
            if let Some(list) = body.child("lstStyle") {
                layer.levels = LevelSpec::list(list);
            }
        }

        if let Some(style) = shape.child("style") {
            layer.apply_style_refs(style, theme);
        }
        layer
    }

    /// Fill unset properties from `p:style` references.
    fn apply_style_refs(&mut self, style: &XmlElement, theme: &Theme) {
        if self.fill.is_none() {
            if let Some(fill_ref) = style.child("fillRef") {
                self.fill = match fill_ref.attr_i64("idx") {
                    Some(0) | None => Some(FillSpec::None),
                    Some(_) => ColorSpec::from_parent(fill_ref).map(FillSpec::Solid),
                };
            }
        }
        if let Some(ln_ref) = style.child("lnRef") {
            let idx = ln_ref.attr_i64("idx").unwrap_or(0);
            let from_ref = if idx > 0 {
                LineSpec {
                    fill: ColorSpec::from_parent(ln_ref).map(FillSpec::Solid),
                    width: Some(theme.line_width(idx as usize)),
                    dash: None,
                }
            } else {
                LineSpec {
                    fill: Some(FillSpec::None),
                    ..Default::default()
                }
            };
            self.line = self.line.or(&from_ref);
        }
        if let Some(font_ref) = style.child("fontRef") {
            let color = ColorSpec::from_parent(font_ref);
            let typeface = match font_ref.attr("idx") {
                Some("major") => Some("+mj-lt".to_string()),
                Some("minor") => Some("+mn-lt".to_string()),
                _ => None,
            };
            for level in &mut self.levels {
                if level.run.color.is_none() {
                    level.run.color = color.clone();
                }
                if level.run.typeface.is_none() {
                    level.run.typeface = typeface.clone();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::BaseColor;
    use crate::fixture::DEFAULT_THEME;

    fn el(xml: &str) -> XmlElement {
        XmlElement::parse(xml).unwrap()
    }

    fn theme() -> Theme {
        Theme::parse(&el(DEFAULT_THEME)).unwrap()
    }

    #[test]
    fn test_picture_and_group_fills_stay_empty() {
        let blip = el(r#"<a:blipFill><a:blip r:embed="rId2"/><a:stretch/></a:blipFill>"#);
        assert_eq!(FillSpec::from_element(&blip), Some(FillSpec::None));
        assert_eq!(FillSpec::from_element(&el("<a:grpFill/>")), Some(FillSpec::None));
        assert_eq!(FillSpec::from_element(&el("<a:ln/>")), None);
    }

    #[test]
    fn test_xfrm() {
        let x = Xfrm::from_element(&el(
            r#"<a:xfrm rot="5400000" flipH="1"><a:off x="12700" y="25400"/><a:ext cx="127000" cy="254000"/></a:xfrm>"#,
        ))
        .unwrap();
        assert_eq!((x.x, x.y, x.cx, x.cy), (12700, 25400, 127000, 254000));
        assert_eq!(x.rotation_deg(), 90.0);
        assert!(x.flip_h && !x.flip_v);
        assert!(x.child.is_none());
    }

    #[test]
    fn test_preset_geometry_with_adjust() {
        let sp_pr = el(
            r#"<p:spPr><a:prstGeom prst="roundRect"><a:avLst><a:gd name="adj" fmla="val 25000"/></a:avLst></a:prstGeom></p:spPr>"#,
        );
        let geom = GeometrySpec::from_sp_pr(&sp_pr).unwrap();
        assert_eq!(geom.adjust("adj"), Some(0.25));
        assert!(matches!(geom, GeometrySpec::Preset { ref name, .. } if name == "roundRect"));
    }

    #[test]
    fn test_custom_geometry() {
        let sp_pr = el(
            r#"<p:spPr><a:custGeom><a:pathLst><a:path w="100" h="100" fill="none"><a:moveTo><a:pt x="0" y="0"/></a:moveTo><a:lnTo><a:pt x="100" y="0"/></a:lnTo><a:arcTo wR="50" hR="50" stAng="0" swAng="5400000"/><a:close/></a:path></a:pathLst></a:custGeom></p:spPr>"#,
        );
        let GeometrySpec::Custom(paths) = GeometrySpec::from_sp_pr(&sp_pr).unwrap() else {
            panic!("expected custom geometry");
        };
        assert_eq!(paths.len(), 1);
        assert!(!paths[0].filled && paths[0].stroked);
        assert_eq!(paths[0].commands.len(), 4);
        assert!(matches!(paths[0].commands[2], PathCmd::ArcTo { sweep, .. } if sweep == 90.0));
    }

    #[test]
    fn test_fills() {
        let none = FillSpec::from_parent(&el("<p:spPr><a:noFill/></p:spPr>"));
        assert_eq!(none, Some(FillSpec::None));
        let grad = FillSpec::from_parent(&el(
            r#"<p:spPr><a:gradFill><a:gsLst><a:gs pos="0"><a:srgbClr val="FF0000"/></a:gs><a:gs pos="100000"><a:srgbClr val="0000FF"/></a:gs></a:gsLst><a:lin ang="0"/></a:gradFill></p:spPr>"#,
        ));
        let Some(FillSpec::Gradient { angle, stops }) = grad else {
            panic!("expected gradient");
        };
        assert_eq!(angle, 0.0);
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[1].0, 1.0);
        assert_eq!(FillSpec::from_parent(&el("<p:spPr><a:xfrm/></p:spPr>")), None);
    }

    #[test]
    fn test_body_and_autofit() {
        let body = BodySpec::from_element(&el(
            r#"<a:bodyPr wrap="none" anchor="ctr" lIns="0"><a:normAutofit fontScale="62500" lnSpcReduction="20000"/></a:bodyPr>"#,
        ));
        assert_eq!(body.anchor, Some(Anchor::Middle));
        assert_eq!(body.wrap, Some(false));
        assert_eq!(body.insets[0], Some(0.0));
        assert_eq!(body.insets[1], None);
        assert_eq!(
            body.autofit,
            Some(AutoFit::Shrink {
                font_scale: Some(0.625),
                line_reduction: 0.2
            })
        );
        let no = BodySpec::from_element(&el("<a:bodyPr><a:noAutofit/></a:bodyPr>"));
        assert_eq!(no.autofit, Some(AutoFit::Disabled));
    }

    #[test]
    fn test_level_list_uses_def_ppr() {
        let list = LevelSpec::list(&el(
            r#"<a:lstStyle><a:defPPr algn="ctr"/><a:lvl2pPr algn="r" marL="457200"><a:buNone/><a:defRPr sz="2400" b="1"/></a:lvl2pPr></a:lstStyle>"#,
        ));
        assert_eq!(list.len(), LEVELS);
        assert_eq!(list[0].align, Some(Align::Center));
        assert_eq!(list[1].align, Some(Align::Right));
        assert_eq!(list[1].margin_left, Some(36.0));
        assert_eq!(list[1].bullet, Some(BulletSpec::None));
        assert_eq!(list[1].run.size, Some(24.0));
        assert_eq!(list[1].run.bold, Some(true));
    }

    #[test]
    fn test_style_refs_fill_only_unset_properties() {
        let shape = el(
            r#"<p:sp><p:spPr><a:solidFill><a:srgbClr val="00FF00"/></a:solidFill></p:spPr><p:style><a:lnRef idx="2"><a:schemeClr val="accent1"/></a:lnRef><a:fillRef idx="1"><a:schemeClr val="accent2"/></a:fillRef><a:fontRef idx="minor"><a:schemeClr val="lt1"/></a:fontRef></p:style></p:sp>"#,
        );
        let layer = StyleLayer::from_shape(&shape, &theme());
        assert!(matches!(layer.fill, Some(FillSpec::Solid(ref c)) if matches!(c.base, BaseColor::Rgb(_))));
        assert_eq!(layer.line.width, Some(1.0));
        assert_eq!(layer.levels[0].run.typeface.as_deref(), Some("+mn-lt"));
        assert_eq!(layer.levels[0].run.color, Some(ColorSpec::scheme("lt1")));
        assert!(layer.inherit);
    }
}
