//! The loaded presentation: slide order, masters, layouts and themes.

use crate::color::ColorMap;
use crate::package::{rel, Package, Relationships, PRESENTATION_PART};
use crate::props::LevelSpec;
use crate::theme::Theme;
use crate::xml::XmlElement;
use pptx2img_core::units::{emu_to_pt, DEFAULT_SLIDE_HEIGHT_EMU, DEFAULT_SLIDE_WIDTH_EMU};
use pptx2img_core::{Error, Result, Size};
use std::collections::HashMap;
use std::path::Path;

/// A slide master with its parsed text styles.
#[derive(Debug)]
pub(crate) struct MasterPart {
    pub path: String,
    pub rels: Relationships,
    pub root: XmlElement,
    pub theme: usize,
    pub color_map: ColorMap,
    pub title_style: Vec<LevelSpec>,
    pub body_style: Vec<LevelSpec>,
    pub other_style: Vec<LevelSpec>,
}

#[derive(Debug)]
pub(crate) struct LayoutPart {
    pub path: String,
    pub rels: Relationships,
    pub root: XmlElement,
    pub master: Option<usize>,
}

#[derive(Debug)]
pub(crate) struct SlideRef {
    pub path: String,
    pub rels: Relationships,
    /// Why the slide's relationships part could not be read.
    pub rels_error: Option<String>,
    pub layout: Option<usize>,
    /// Master reached through the layout, or the presentation's first.
    pub master: Option<usize>,
}

/// A parsed presentation, immutable after load.
///
/// Slide parts themselves are parsed on demand by the scene builder; the
/// document holds everything slides share.
pub struct Document {
    package: Package,
    size: Size,
    slides: Vec<SlideRef>,
    layouts: Vec<LayoutPart>,
    masters: Vec<MasterPart>,
    themes: Vec<Theme>,
    fallback_theme: Theme,
    default_text: Vec<LevelSpec>,
}

/// Interns parts by path while walking relationships.
#[derive(Default)]
struct Loader {
    layouts: Vec<LayoutPart>,
    layout_index: HashMap<String, Option<usize>>,
    masters: Vec<MasterPart>,
    master_index: HashMap<String, Option<usize>>,
    themes: Vec<Theme>,
    theme_index: HashMap<String, usize>,
}

impl Loader {
    fn layout(&mut self, package: &Package, path: &str) -> Result<Option<usize>> {
        if let Some(idx) = self.layout_index.get(path) {
            return Ok(*idx);
        }
        let idx = match read_part(package, path) {
            Ok((root, rels)) => {
                let master = match rels.first_of_kind(rel::SLIDE_MASTER) {
                    Some(target) => self.master(package, target)?,
                    None => None,
                };
                self.layouts.push(LayoutPart {
                    path: path.to_string(),
                    rels,
                    root,
                    master,
                });
                Some(self.layouts.len() - 1)
            }
            Err(e) => {
                log::warn!("Skipping unreadable layout '{}': {}", path, e);
                None
            }
        };
        self.layout_index.insert(path.to_string(), idx);
        Ok(idx)
    }

    fn master(&mut self, package: &Package, path: &str) -> Result<Option<usize>> {
        if let Some(idx) = self.master_index.get(path) {
            return Ok(*idx);
        }
        let idx = match read_part(package, path) {
            Ok((root, rels)) => {
                let theme = self.theme(package, rels.first_of_kind(rel::THEME))?;
                let color_map = root
                    .child("clrMap")
                    .map(ColorMap::from_element)
                    .unwrap_or_default();
                let style = |name: &str| {
                    root.path(&["txStyles", name])
                        .map(LevelSpec::list)
                        .unwrap_or_else(|| LevelSpec::list(&XmlElement::default()))
                };
                let (title_style, body_style, other_style) =
                    (style("titleStyle"), style("bodyStyle"), style("otherStyle"));
                self.masters.push(MasterPart {
                    path: path.to_string(),
                    rels,
                    root,
                    theme,
                    color_map,
                    title_style,
                    body_style,
                    other_style,
                });
                Some(self.masters.len() - 1)
            }
            Err(e) => {
                log::warn!("Skipping unreadable master '{}': {}", path, e);
                None
            }
        };
        self.master_index.insert(path.to_string(), idx);
        Ok(idx)
    }

    /// Theme index for a master; a missing or unreadable part falls back to
    /// the built-in theme. A theme that parses but lacks its defaults is
    /// fatal.
    fn theme(&mut self, package: &Package, path: Option<&str>) -> Result<usize> {
        let path = path.unwrap_or_default();
        if let Some(idx) = self.theme_index.get(path) {
            return Ok(*idx);
        }
        let theme = match package.xml(path) {
            Ok(root) => Theme::parse(&root)?,
            Err(e) => {
                log::warn!("Using built-in theme in place of '{}': {}", path, e);
                Theme::default()
            }
        };
        self.themes.push(theme);
        let idx = self.themes.len() - 1;
        self.theme_index.insert(path.to_string(), idx);
        Ok(idx)
    }
}

/// A part's XML with its relationships.
fn read_part(package: &Package, path: &str) -> Result<(XmlElement, Relationships)> {
    let root = package.xml(path)?;
    let rels = package.relationships(path)?;
    Ok((root, rels))
}

impl Document {
    /// Open and load a `.pptx` file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_package(Package::open(path)?)
    }

    /// Load a document from raw bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    /// Resolve slide order, layouts, masters and themes.
    pub fn from_package(package: Package) -> Result<Self> {
        let presentation = package
            .xml(PRESENTATION_PART)
            .map_err(|e| Error::CorruptPackage(format!("Unreadable presentation part: {}", e)))?;

        let size = presentation
            .child("sldSz")
            .and_then(|sz| Some((sz.attr_i64("cx")?, sz.attr_i64("cy")?)))
            .filter(|(cx, cy)| *cx > 0 && *cy > 0)
            .unwrap_or((DEFAULT_SLIDE_WIDTH_EMU, DEFAULT_SLIDE_HEIGHT_EMU));
        let size = Size::new(emu_to_pt(size.0), emu_to_pt(size.1));

        let default_text = presentation
            .child("defaultTextStyle")
            .map(LevelSpec::list)
            .unwrap_or_else(|| LevelSpec::list(&XmlElement::default()));

        let mut loader = Loader::default();
        let pres_rels = package.relationships(PRESENTATION_PART)?;
        let first_master = match pres_rels.first_of_kind(rel::SLIDE_MASTER) {
            Some(target) => loader.master(&package, target)?,
            None => None,
        };

        let mut slides = Vec::new();
        for path in package.slide_paths()? {
            let (rels, rels_error) = match package.relationships(&path) {
                Ok(rels) => (rels, None),
                Err(e) => {
                    log::warn!("Unreadable relationships for '{}': {}", path, e);
                    (Relationships::default(), Some(e.to_string()))
                }
            };
            let layout = match rels.first_of_kind(rel::SLIDE_LAYOUT) {
                Some(target) => loader.layout(&package, target)?,
                None => None,
            };
            let master = layout
                .and_then(|l| loader.layouts[l].master)
                .or(first_master);
            slides.push(SlideRef {
                path,
                rels,
                rels_error,
                layout,
                master,
            });
        }

        log::debug!(
            "Loaded {} slides, {} layouts, {} masters, {} themes ({}x{} pt)",
            slides.len(),
            loader.layouts.len(),
            loader.masters.len(),
            loader.themes.len(),
            size.width,
            size.height
        );

        Ok(Self {
            package,
            size,
            slides,
            layouts: loader.layouts,
            masters: loader.masters,
            themes: loader.themes,
            fallback_theme: Theme::default(),
            default_text,
        })
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Slide extent in points.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Part path of the 1-based slide `index`.
    pub fn slide_path(&self, index: usize) -> Option<&str> {
        self.slide(index).map(|s| s.path.as_str())
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub(crate) fn slide(&self, index: usize) -> Option<&SlideRef> {
        index.checked_sub(1).and_then(|i| self.slides.get(i))
    }

    pub(crate) fn layout(&self, idx: Option<usize>) -> Option<&LayoutPart> {
        idx.and_then(|i| self.layouts.get(i))
    }

    pub(crate) fn master(&self, idx: Option<usize>) -> Option<&MasterPart> {
        idx.and_then(|i| self.masters.get(i))
    }

    /// Theme of a master, or the built-in theme.
    pub(crate) fn theme_for(&self, master: Option<&MasterPart>) -> &Theme {
        master
            .and_then(|m| self.themes.get(m.theme))
            .unwrap_or(&self.fallback_theme)
    }

    pub(crate) fn default_text(&self) -> &[LevelSpec] {
        &self.default_text
    }
}
