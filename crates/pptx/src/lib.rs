//! PPTX (Office Open XML) reader for slide rendering.
//!
//! Opens the zip package, resolves the theme / master / layout / slide style
//! cascade and builds a fully resolved [`pptx2img_core::Scene`] per slide.

pub mod builder;
pub mod color;
pub mod document;
pub mod package;
pub mod props;
pub mod style;
pub mod theme;
pub mod xml;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;

pub use builder::SceneBuilder;
pub use document::Document;
pub use package::{Package, Relationship, Relationships};
pub use style::{ResolvedStyle, StyleResolver};
pub use theme::Theme;
pub use xml::XmlElement;
