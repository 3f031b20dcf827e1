//! Theme part: color scheme, font scheme and line widths.

use crate::color::ColorSpec;
use crate::xml::XmlElement;
use pptx2img_core::units::emu_to_pt;
use pptx2img_core::{Color, Error, Result};
use std::collections::HashMap;

const SCHEME_SLOTS: [&str; 12] = [
    "dk1", "lt1", "dk2", "lt2", "accent1", "accent2", "accent3", "accent4", "accent5", "accent6",
    "hlink", "folHlink",
];

/// A parsed `a:theme`.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    /// Scheme slot -> color.
    pub colors: HashMap<String, Color>,
    /// Latin typeface of the major (heading) font.
    pub major_font: String,
    /// Latin typeface of the minor (body) font.
    pub minor_font: String,
    /// Widths of `a:lnStyleLst` entries in points, for `lnRef` lookups.
    pub line_widths: Vec<f32>,
}

impl Default for Theme {
    /// The stock Office theme, used when a master has no theme part.
    fn default() -> Self {
        let colors = [
            ("dk1", 0x000000),
            ("lt1", 0xFFFFFF),
            ("dk2", 0x44546A),
            ("lt2", 0xE7E6E6),
            ("accent1", 0x4472C4),
            ("accent2", 0xED7D31),
            ("accent3", 0xA5A5A5),
            ("accent4", 0xFFC000),
            ("accent5", 0x5B9BD5),
            ("accent6", 0x70AD47),
            ("hlink", 0x0563C1),
            ("folHlink", 0x954F72),
        ]
        .into_iter()
        .map(|(slot, rgb): (&str, u32)| {
            let color = Color::rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8);
            (slot.to_string(), color)
        })
        .collect();
        Self {
            name: "Office Theme".into(),
            colors,
            major_font: "Calibri Light".into(),
            minor_font: "Calibri".into(),
            line_widths: vec![0.5, 1.0, 1.5],
        }
    }
}

impl Theme {
    /// Parse a theme part.
    ///
    /// Fails with `UnresolvedStyle` when the defaults every cascade falls
    /// back to (`dk1`, `lt1`, minor latin font) are missing.
    pub fn parse(root: &XmlElement) -> Result<Self> {
        let elements = root
            .child("themeElements")
            .ok_or_else(|| Error::UnresolvedStyle("theme has no themeElements".into()))?;

        let mut colors = HashMap::new();
        if let Some(scheme) = elements.child("clrScheme") {
            for slot in SCHEME_SLOTS {
                let color = scheme
                    .child(slot)
                    .and_then(ColorSpec::from_parent)
                    .and_then(|spec| match spec.base {
                        crate::color::BaseColor::Rgb(c) => Some(c),
                        _ => None,
                    });
                if let Some(color) = color {
                    colors.insert(slot.to_string(), color);
                }
            }
        }
        for required in ["dk1", "lt1"] {
            if !colors.contains_key(required) {
                return Err(Error::UnresolvedStyle(format!(
                    "theme color scheme is missing '{}'",
                    required
                )));
            }
        }

        let font = |which: &str| {
            elements
                .path(&["fontScheme", which, "latin"])
                .and_then(|l| l.attr("typeface"))
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        };
        let minor_font = font("minorFont")
            .ok_or_else(|| Error::UnresolvedStyle("theme has no minor latin font".into()))?;
        let major_font = font("majorFont").unwrap_or_else(|| minor_font.clone());

        let line_widths = elements
            .path(&["fmtScheme", "lnStyleLst"])
            .map(|list| {
                list.children_named("ln")
                    .map(|ln| emu_to_pt(ln.attr_i64("w").unwrap_or(9525)))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            name: root.attr("name").unwrap_or_default().to_string(),
            colors,
            major_font,
            minor_font,
            line_widths,
        })
    }

    /// Resolve `+mj-lt` / `+mn-lt` style typeface references.
    pub fn typeface<'a>(&'a self, typeface: &'a str) -> &'a str {
        match typeface {
            t if t.starts_with("+mj") => &self.major_font,
            t if t.starts_with("+mn") => &self.minor_font,
            t => t,
        }
    }

    /// Width of the `idx`-th (1-based) theme line style.
    pub fn line_width(&self, idx: usize) -> f32 {
        idx.checked_sub(1)
            .and_then(|i| self.line_widths.get(i))
            .copied()
            .unwrap_or(0.75)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::DEFAULT_THEME;

    #[test]
    fn test_parse_default_theme() {
        let theme = Theme::parse(&XmlElement::parse(DEFAULT_THEME).unwrap()).unwrap();
        assert_eq!(theme.name, "Office Theme");
        assert_eq!(theme.colors["dk1"], Color::BLACK);
        assert_eq!(theme.colors["lt1"], Color::WHITE);
        assert_eq!(theme.colors["accent1"], Color::rgb(0x44, 0x72, 0xC4));
        assert_eq!(theme.major_font, "Calibri Light");
        assert_eq!(theme.minor_font, "Calibri");
        assert_eq!(theme.line_widths, vec![0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_builtin_matches_default_part() {
        let parsed = Theme::parse(&XmlElement::parse(DEFAULT_THEME).unwrap()).unwrap();
        assert_eq!(Theme::default(), parsed);
    }

    #[test]
    fn test_typeface_references() {
        let theme = Theme::parse(&XmlElement::parse(DEFAULT_THEME).unwrap()).unwrap();
        assert_eq!(theme.typeface("+mj-lt"), "Calibri Light");
        assert_eq!(theme.typeface("+mn-ea"), "Calibri");
        assert_eq!(theme.typeface("Arial"), "Arial");
        assert_eq!(theme.line_width(2), 1.0);
        assert_eq!(theme.line_width(0), 0.75);
    }

    #[test]
    fn test_missing_defaults_are_unresolved() {
        let no_dk1 = DEFAULT_THEME.replace(
            r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#,
            "",
        );
        let err = Theme::parse(&XmlElement::parse(&no_dk1).unwrap()).unwrap_err();
        assert!(matches!(err, Error::UnresolvedStyle(_)));

        let no_font = DEFAULT_THEME.replace(r#"<a:latin typeface="Calibri"/>"#, "");
        let err = Theme::parse(&XmlElement::parse(&no_font).unwrap()).unwrap_err();
        assert!(matches!(err, Error::UnresolvedStyle(_)));
    }
}
