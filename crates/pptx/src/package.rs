//! Zip container access: named parts, relationships and slide order.

use crate::xml::XmlElement;
use pptx2img_core::{Error, Result};
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use std::sync::Arc;
use zip::ZipArchive;

/// Root part of every presentation package.
pub const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Relationship type suffixes used while walking the cascade.
pub mod rel {
    pub const SLIDE: &str = "/slide";
    pub const SLIDE_LAYOUT: &str = "/slideLayout";
    pub const SLIDE_MASTER: &str = "/slideMaster";
    pub const THEME: &str = "/theme";
    pub const IMAGE: &str = "/image";
}

/// An opened presentation package.
///
/// Every entry is read into memory up front, so the package is immutable
/// and can be shared across slide workers.
pub struct Package {
    parts: HashMap<String, Arc<[u8]>>,
}

impl Package {
    /// Open a package from a file on disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(bytes)
    }

    /// Open a package from raw document bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Open a package from any seekable reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::CorruptPackage(format!("Failed to open ZIP: {}", e)))?;

        let mut parts = HashMap::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::CorruptPackage(format!("Failed to read entry {}: {}", i, e)))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut content = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut content)
                .map_err(|e| Error::CorruptPackage(format!("Failed to read '{}': {}", name, e)))?;
            parts.insert(name, Arc::from(content));
        }

        let package = Self { parts };
        for required in [PRESENTATION_PART, "ppt/_rels/presentation.xml.rels"] {
            if !package.parts.contains_key(required) {
                return Err(Error::CorruptPackage(format!(
                    "required part '{}' is missing",
                    required
                )));
            }
        }
        log::debug!("Opened package with {} parts", package.parts.len());
        Ok(package)
    }

    /// Raw bytes of a part.
    pub fn part(&self, path: &str) -> Option<&[u8]> {
        self.parts.get(path).map(|p| p.as_ref())
    }

    /// Shared handle to a part's bytes, used for embedded images.
    pub fn shared_part(&self, path: &str) -> Option<Arc<[u8]>> {
        self.parts.get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.parts.contains_key(path)
    }

    /// Parse a part as XML.
    pub fn xml(&self, path: &str) -> Result<XmlElement> {
        let bytes = self
            .part(path)
            .ok_or_else(|| Error::CorruptPackage(format!("File not found in archive '{}'", path)))?;
        XmlElement::parse_bytes(bytes)
    }

    /// Relationships of a part. A part without a `.rels` companion has none.
    pub fn relationships(&self, part: &str) -> Result<Relationships> {
        let rels_path = rels_path_for(part);
        match self.part(&rels_path) {
            Some(bytes) => {
                let root = XmlElement::parse_bytes(bytes).map_err(|e| {
                    Error::CorruptPackage(format!("Error parsing relationships '{}': {}", rels_path, e))
                })?;
                Ok(Relationships::from_xml(part, &root))
            }
            None => Ok(Relationships::default()),
        }
    }

    /// Slide part paths in deck order.
    ///
    /// The order comes from `p:sldIdLst`. Decks written without one fall
    /// back to the slide relationships sorted by their trailing number.
    pub fn slide_paths(&self) -> Result<Vec<String>> {
        let presentation = self
            .xml(PRESENTATION_PART)
            .map_err(|e| Error::CorruptPackage(format!("Unreadable presentation part: {}", e)))?;
        let rels = self.relationships(PRESENTATION_PART)?;

        if let Some(list) = presentation.child("sldIdLst") {
            let mut slides = Vec::new();
            for id in list.children_named("sldId") {
                let target = id.attr("r:id").and_then(|rid| rels.target(rid));
                match target {
                    Some(target) => slides.push(target.to_string()),
                    None => {
                        return Err(Error::CorruptPackage(format!(
                            "slide id {} has no relationship target",
                            id.attr("id").unwrap_or("?")
                        )))
                    }
                }
            }
            return Ok(slides);
        }

        let mut slides: Vec<(String, Option<usize>)> = rels
            .of_kind(rel::SLIDE)
            .map(|r| {
                let order = extract_slide_number(&r.id).or_else(|| extract_slide_number(&r.target));
                (r.target.clone(), order)
            })
            .collect();

        // Sort slides by their number
        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });
        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }
}

/// One relationship from a part's `.rels` file.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: String,
    pub kind: String,
    /// Absolute part path inside the package.
    pub target: String,
    pub external: bool,
}

/// The relationships of one part, keyed by relationship ID.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    entries: Vec<Relationship>,
}

impl Relationships {
    fn from_xml(source: &str, root: &XmlElement) -> Self {
        let base = part_dir(source);
        let entries = root
            .children_named("Relationship")
            .filter_map(|e| {
                let id = e.attr("Id")?.to_string();
                let kind = e.attr("Type").unwrap_or_default().to_string();
                let raw = e.attr("Target")?;
                let external = e.attr("TargetMode") == Some("External");
                let target = if external {
                    raw.to_string()
                } else {
                    resolve_target(base, raw)
                };
                Some(Relationship {
                    id,
                    kind,
                    target,
                    external,
                })
            })
            .collect();
        Self { entries }
    }

    /// Resolved target part for a relationship ID.
    pub fn target(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|r| r.id == id && !r.external)
            .map(|r| r.target.as_str())
    }

    /// Relationships whose type ends with `kind` (see [`rel`]).
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Relationship> {
        self.entries
            .iter()
            .filter(move |r| !r.external && r.kind.ends_with(kind))
    }

    /// First target whose type ends with `kind`.
    pub fn first_of_kind<'a>(&'a self, kind: &'a str) -> Option<&'a str> {
        self.of_kind(kind).next().map(|r| r.target.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `ppt/slides/slide1.xml` -> `ppt/slides/_rels/slide1.xml.rels`.
fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

fn part_dir(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolve a relationship target against the source part's directory,
/// normalizing `.` and `..` segments.
fn resolve_target(base: &str, target: &str) -> String {
    let joined = if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_string()
    } else if base.is_empty() {
        target.to_string()
    } else {
        format!("{}/{}", base, target)
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::DeckBuilder;

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("ppt/slides", "../slideLayouts/slideLayout1.xml"),
            "ppt/slideLayouts/slideLayout1.xml"
        );
        assert_eq!(resolve_target("ppt", "slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(resolve_target("ppt/slides", "/ppt/media/a.png"), "ppt/media/a.png");
        assert_eq!(resolve_target("", "ppt/presentation.xml"), "ppt/presentation.xml");
    }

    #[test]
    fn test_rels_path_for() {
        assert_eq!(
            rels_path_for("ppt/slides/slide1.xml"),
            "ppt/slides/_rels/slide1.xml.rels"
        );
        assert_eq!(rels_path_for("ppt/presentation.xml"), "ppt/_rels/presentation.xml.rels");
    }

    #[test]
    fn test_not_a_zip_is_corrupt() {
        let err = Package::from_bytes(b"definitely not a zip".to_vec())
            .err()
            .expect("should fail");
        assert!(matches!(err, Error::CorruptPackage(_)));
    }

    #[test]
    fn test_missing_presentation_part_is_corrupt() {
        let bytes = DeckBuilder::new().build_without(&[PRESENTATION_PART]);
        let err = Package::from_bytes(bytes).err().expect("should fail");
        assert!(matches!(err, Error::CorruptPackage(_)));
    }

    #[test]
    fn test_slide_order_follows_id_list() {
        let bytes = DeckBuilder::new()
            .slide("<p:sp/>")
            .slide("<p:sp/>")
            .slide("<p:sp/>")
            .reverse_slide_order()
            .build();
        let package = Package::from_bytes(bytes).unwrap();
        assert_eq!(
            package.slide_paths().unwrap(),
            vec![
                "ppt/slides/slide3.xml",
                "ppt/slides/slide2.xml",
                "ppt/slides/slide1.xml"
            ]
        );
    }

    #[test]
    fn test_relationship_lookup() {
        let bytes = DeckBuilder::new().slide("").build();
        let package = Package::from_bytes(bytes).unwrap();
        let rels = package.relationships("ppt/slides/slide1.xml").unwrap();
        assert_eq!(
            rels.first_of_kind(rel::SLIDE_LAYOUT),
            Some("ppt/slideLayouts/slideLayout1.xml")
        );
        assert!(rels.first_of_kind(rel::SLIDE_MASTER).is_none());
        assert!(package
            .relationships("ppt/media/none.png")
            .unwrap()
            .is_empty());
    }
}
