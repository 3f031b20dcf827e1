//! DrawingML color elements and their resolution against a theme.

use crate::xml::XmlElement;
use pptx2img_core::units::{angle_to_deg, percent_to_fraction};
use pptx2img_core::Color;
use std::collections::HashMap;

/// The base of a color before modifiers are applied.
#[derive(Debug, Clone, PartialEq)]
pub enum BaseColor {
    Rgb(Color),
    /// A scheme slot such as `accent1` or a mapped name such as `tx1`.
    Scheme(String),
    Preset(String),
}

/// A color modifier from the DrawingML transform list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorMod {
    Alpha(f32),
    LumMod(f32),
    LumOff(f32),
    SatMod(f32),
    Tint(f32),
    Shade(f32),
}

/// An unresolved color reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSpec {
    pub base: BaseColor,
    pub mods: Vec<ColorMod>,
}

impl ColorSpec {
    pub fn rgb(color: Color) -> Self {
        Self {
            base: BaseColor::Rgb(color),
            mods: Vec::new(),
        }
    }

    pub fn scheme(name: &str) -> Self {
        Self {
            base: BaseColor::Scheme(name.to_string()),
            mods: Vec::new(),
        }
    }

    /// Parse the first color child of `parent` (e.g. the inside of
    /// `a:solidFill`).
    pub fn from_parent(parent: &XmlElement) -> Option<Self> {
        parent.children.iter().find_map(Self::from_element)
    }

    /// Parse a color element (`a:srgbClr`, `a:schemeClr`, ...).
    pub fn from_element(el: &XmlElement) -> Option<Self> {
        let base = match el.name.as_str() {
            "srgbClr" => BaseColor::Rgb(Color::from_hex(el.attr("val")?)?),
            "sysClr" => match el.attr("lastClr").and_then(Color::from_hex) {
                Some(c) => BaseColor::Rgb(c),
                None => match el.attr("val")? {
                    "window" => BaseColor::Rgb(Color::WHITE),
                    _ => BaseColor::Rgb(Color::BLACK),
                },
            },
            "schemeClr" => BaseColor::Scheme(el.attr("val")?.to_string()),
            "prstClr" => BaseColor::Preset(el.attr("val")?.to_string()),
            "scrgbClr" => {
                let channel = |key| {
                    let v = percent_to_fraction(el.attr_i64(key).unwrap_or(0));
                    pptx2img_core::color::unit_to_u8(linear_to_srgb(v))
                };
                BaseColor::Rgb(Color::rgb(channel("r"), channel("g"), channel("b")))
            }
            "hslClr" => {
                let hue = angle_to_deg(el.attr_i64("hue").unwrap_or(0));
                let sat = percent_to_fraction(el.attr_i64("sat").unwrap_or(0));
                let lum = percent_to_fraction(el.attr_i64("lum").unwrap_or(0));
                BaseColor::Rgb(Color::from_hsl(hue, sat, lum, 255))
            }
            _ => return None,
        };

        let mods = el
            .children
            .iter()
            .filter_map(|m| {
                let val = percent_to_fraction(m.attr_i64("val")?);
                Some(match m.name.as_str() {
                    "alpha" => ColorMod::Alpha(val),
                    "lumMod" => ColorMod::LumMod(val),
                    "lumOff" => ColorMod::LumOff(val),
                    "satMod" => ColorMod::SatMod(val),
                    "tint" => ColorMod::Tint(val),
                    "shade" => ColorMod::Shade(val),
                    _ => return None,
                })
            })
            .collect();

        Some(Self { base, mods })
    }
}

fn linear_to_srgb(v: f32) -> f32 {
    if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

/// Maps logical names (`bg1`, `tx1`, ...) to theme slots (`lt1`, `dk1`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    entries: HashMap<String, String>,
}

impl Default for ColorMap {
    fn default() -> Self {
        let pairs = [
            ("bg1", "lt1"),
            ("tx1", "dk1"),
            ("bg2", "lt2"),
            ("tx2", "dk2"),
        ];
        Self {
            entries: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl ColorMap {
    /// Read `p:clrMap` or `a:overrideClrMapping` attributes.
    pub fn from_element(el: &XmlElement) -> Self {
        let mut map = Self::default();
        for (key, value) in &el.attrs {
            if !key.contains(':') {
                map.entries.insert(key.clone(), value.clone());
            }
        }
        map
    }

    /// Theme slot for a logical name; slots map to themselves.
    pub fn slot<'a>(&'a self, name: &'a str) -> &'a str {
        self.entries.get(name).map(String::as_str).unwrap_or(name)
    }
}

/// Standard DrawingML preset colors that show up in real decks.
fn preset_color(name: &str) -> Option<Color> {
    Some(match name {
        "black" => Color::rgb(0, 0, 0),
        "white" => Color::rgb(255, 255, 255),
        "red" => Color::rgb(255, 0, 0),
        "green" => Color::rgb(0, 128, 0),
        "lime" => Color::rgb(0, 255, 0),
        "blue" => Color::rgb(0, 0, 255),
        "yellow" => Color::rgb(255, 255, 0),
        "cyan" | "aqua" => Color::rgb(0, 255, 255),
        "magenta" | "fuchsia" => Color::rgb(255, 0, 255),
        "gray" | "grey" => Color::rgb(128, 128, 128),
        "silver" => Color::rgb(192, 192, 192),
        "orange" => Color::rgb(255, 165, 0),
        "purple" => Color::rgb(128, 0, 128),
        "navy" => Color::rgb(0, 0, 128),
        "maroon" => Color::rgb(128, 0, 0),
        "darkGray" | "dkGray" => Color::rgb(169, 169, 169),
        "lightGray" | "ltGray" => Color::rgb(211, 211, 211),
        _ => return None,
    })
}

/// Resolve a color spec against theme colors and a color map.
///
/// Returns `None` when the reference cannot be mapped (for example `phClr`
/// outside a style matrix); callers treat that as transparent.
pub fn resolve_color(
    spec: &ColorSpec,
    scheme: &HashMap<String, Color>,
    map: &ColorMap,
) -> Option<Color> {
    let base = match &spec.base {
        BaseColor::Rgb(c) => *c,
        BaseColor::Scheme(name) => *scheme.get(map.slot(name))?,
        BaseColor::Preset(name) => preset_color(name)?,
    };
    Some(apply_mods(base, &spec.mods))
}

fn apply_mods(color: Color, mods: &[ColorMod]) -> Color {
    let mut color = color;
    for m in mods {
        color = match *m {
            ColorMod::Alpha(a) => color.with_alpha(a),
            ColorMod::LumMod(f) => {
                let (h, s, l) = color.to_hsl();
                Color::from_hsl(h, s, l * f, color.a)
            }
            ColorMod::LumOff(f) => {
                let (h, s, l) = color.to_hsl();
                Color::from_hsl(h, s, l + f, color.a)
            }
            ColorMod::SatMod(f) => {
                let (h, s, l) = color.to_hsl();
                Color::from_hsl(h, s * f, l, color.a)
            }
            ColorMod::Tint(f) => {
                let mix = |c: u8| (c as f32 + (255.0 - c as f32) * (1.0 - f)).round() as u8;
                Color::rgba(mix(color.r), mix(color.g), mix(color.b), color.a)
            }
            ColorMod::Shade(f) => {
                let mix = |c: u8| (c as f32 * f).round() as u8;
                Color::rgba(mix(color.r), mix(color.g), mix(color.b), color.a)
            }
        };
    }
    color
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme() -> HashMap<String, Color> {
        let mut s = HashMap::new();
        s.insert("dk1".to_string(), Color::BLACK);
        s.insert("lt1".to_string(), Color::WHITE);
        s.insert("accent1".to_string(), Color::rgb(68, 114, 196));
        s
    }

    fn parse(xml: &str) -> ColorSpec {
        ColorSpec::from_element(&XmlElement::parse(xml).unwrap()).unwrap()
    }

    #[test]
    fn test_scheme_color_through_map() {
        let map = ColorMap::default();
        let spec = parse(r#"<a:schemeClr val="tx1"/>"#);
        assert_eq!(resolve_color(&spec, &scheme(), &map), Some(Color::BLACK));
        let spec = parse(r#"<a:schemeClr val="bg1"/>"#);
        assert_eq!(resolve_color(&spec, &scheme(), &map), Some(Color::WHITE));
    }

    #[test]
    fn test_hsl_color() {
        let map = ColorMap::default();
        let spec = parse(r#"<a:hslClr hue="14400000" sat="100000" lum="50000"/>"#);
        assert_eq!(resolve_color(&spec, &scheme(), &map), Some(Color::rgb(0, 0, 255)));
        let spec = parse(r#"<a:hslClr hue="0" sat="0" lum="100000"><a:alpha val="50000"/></a:hslClr>"#);
        let c = resolve_color(&spec, &scheme(), &map).unwrap();
        assert_eq!((c.r, c.g, c.b), (255, 255, 255));
        assert!(c.a < 255);
    }

    #[test]
    fn test_override_mapping_swaps_text_and_background() {
        let el = XmlElement::parse(r#"<a:overrideClrMapping bg1="dk1" tx1="lt1"/>"#).unwrap();
        let map = ColorMap::from_element(&el);
        let spec = parse(r#"<a:schemeClr val="tx1"/>"#);
        assert_eq!(resolve_color(&spec, &scheme(), &map), Some(Color::WHITE));
    }

    #[test]
    fn test_unmapped_color_is_none() {
        let spec = parse(r#"<a:schemeClr val="phClr"/>"#);
        assert_eq!(resolve_color(&spec, &scheme(), &ColorMap::default()), None);
    }

    #[test]
    fn test_modifiers() {
        let spec = parse(r#"<a:srgbClr val="FF0000"><a:alpha val="50000"/></a:srgbClr>"#);
        let c = resolve_color(&spec, &scheme(), &ColorMap::default()).unwrap();
        assert_eq!((c.r, c.a), (255, 128));

        let spec = parse(
            r#"<a:schemeClr val="lt1"><a:lumMod val="50000"/></a:schemeClr>"#,
        );
        let c = resolve_color(&spec, &scheme(), &ColorMap::default()).unwrap();
        assert_eq!(c, Color::rgb(128, 128, 128));

        let spec = parse(r#"<a:srgbClr val="000000"><a:tint val="0"/></a:srgbClr>"#);
        let c = resolve_color(&spec, &scheme(), &ColorMap::default()).unwrap();
        assert_eq!(c, Color::WHITE);
    }

    #[test]
    fn test_sys_and_preset_colors() {
        let map = ColorMap::default();
        let spec = parse(r#"<a:sysClr val="windowText" lastClr="112233"/>"#);
        assert_eq!(resolve_color(&spec, &scheme(), &map), Some(Color::rgb(0x11, 0x22, 0x33)));
        let spec = parse(r#"<a:prstClr val="red"/>"#);
        assert_eq!(resolve_color(&spec, &scheme(), &map), Some(Color::rgb(255, 0, 0)));
    }
}
