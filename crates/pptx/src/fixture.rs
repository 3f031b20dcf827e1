//! In-memory deck builder for tests.
//!
//! Produces small but structurally complete `.pptx` packages: one theme, one
//! master with title/body placeholders and text styles, one layout, and any
//! number of slides whose shape trees the caller supplies as XML.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const TREE_HEAD: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#;

/// Default theme: Office colors, Calibri fonts, three line widths.
pub const DEFAULT_THEME: &str = r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements>
<a:clrScheme name="Office">
<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>
<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>
<a:dk2><a:srgbClr val="44546A"/></a:dk2>
<a:lt2><a:srgbClr val="E7E6E6"/></a:lt2>
<a:accent1><a:srgbClr val="4472C4"/></a:accent1>
<a:accent2><a:srgbClr val="ED7D31"/></a:accent2>
<a:accent3><a:srgbClr val="A5A5A5"/></a:accent3>
<a:accent4><a:srgbClr val="FFC000"/></a:accent4>
<a:accent5><a:srgbClr val="5B9BD5"/></a:accent5>
<a:accent6><a:srgbClr val="70AD47"/></a:accent6>
<a:hlink><a:srgbClr val="0563C1"/></a:hlink>
<a:folHlink><a:srgbClr val="954F72"/></a:folHlink>
</a:clrScheme>
<a:fontScheme name="Office">
<a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>
<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>
</a:fontScheme>
<a:fmtScheme name="Office"><a:fillStyleLst/><a:lnStyleLst>
<a:ln w="6350"/><a:ln w="12700"/><a:ln w="19050"/>
</a:lnStyleLst></a:fmtScheme>
</a:themeElements></a:theme>"#;

const DEFAULT_MASTER_SHAPES: &str = r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title Placeholder 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="628650" y="365125"/><a:ext cx="7886700" cy="1325563"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr><p:txBody><a:bodyPr anchor="ctr"/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Text Placeholder 2"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="628650" y="1825625"/><a:ext cx="7886700" cy="4351338"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp>"#;

const DEFAULT_TX_STYLES: &str = r#"<p:txStyles><p:titleStyle><a:lvl1pPr algn="l"><a:defRPr sz="4400"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mj-lt"/></a:defRPr></a:lvl1pPr></p:titleStyle><p:bodyStyle><a:lvl1pPr marL="228600" indent="-228600"><a:buChar char="&#8226;"/><a:defRPr sz="2800"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl1pPr><a:lvl2pPr marL="685800" indent="-228600"><a:buChar char="&#8226;"/><a:defRPr sz="2400"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl2pPr></p:bodyStyle><p:otherStyle><a:lvl1pPr><a:defRPr sz="1800"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl1pPr></p:otherStyle></p:txStyles>"#;

const DEFAULT_LAYOUT_SHAPES: &str = r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Content Placeholder 2"/><p:cNvSpPr/><p:nvPr><p:ph idx="1"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="628650" y="2000000"/><a:ext cx="7886700" cy="4000000"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp>"#;

enum SlideSource {
    Shapes(String),
    Raw(String),
}

/// Builder for an in-memory `.pptx`.
pub struct DeckBuilder {
    size: (i64, i64),
    theme: String,
    master_shapes: String,
    master_background: String,
    layout_shapes: String,
    slides: Vec<SlideSource>,
    media: Vec<(String, String, Vec<u8>)>,
    reverse_order: bool,
    with_id_list: bool,
    overrides: Vec<(String, String)>,
}

impl Default for DeckBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self {
            size: (9_144_000, 6_858_000),
            theme: DEFAULT_THEME.to_string(),
            master_shapes: DEFAULT_MASTER_SHAPES.to_string(),
            master_background: String::new(),
            layout_shapes: DEFAULT_LAYOUT_SHAPES.to_string(),
            slides: Vec::new(),
            media: Vec::new(),
            reverse_order: false,
            with_id_list: true,
            overrides: Vec::new(),
        }
    }

    /// Slide size in EMU.
    pub fn size(mut self, cx: i64, cy: i64) -> Self {
        self.size = (cx, cy);
        self
    }

    /// Replace the theme part.
    pub fn theme(mut self, xml: &str) -> Self {
        self.theme = xml.to_string();
        self
    }

    /// Replace the master's shape tree content.
    pub fn master_shapes(mut self, xml: &str) -> Self {
        self.master_shapes = xml.to_string();
        self
    }

    /// Set the master's `p:bg` element.
    pub fn master_background(mut self, xml: &str) -> Self {
        self.master_background = xml.to_string();
        self
    }

    /// Replace the layout's shape tree content.
    pub fn layout_shapes(mut self, xml: &str) -> Self {
        self.layout_shapes = xml.to_string();
        self
    }

    /// Add a slide whose `p:spTree` holds `shapes`.
    pub fn slide(mut self, shapes: &str) -> Self {
        self.slides.push(SlideSource::Shapes(shapes.to_string()));
        self
    }

    /// Add a slide from a complete part body.
    pub fn raw_slide(mut self, xml: &str) -> Self {
        self.slides.push(SlideSource::Raw(xml.to_string()));
        self
    }

    /// Add a media part that every slide references as `rid`.
    pub fn image(mut self, rid: &str, name: &str, bytes: Vec<u8>) -> Self {
        self.media.push((rid.to_string(), name.to_string(), bytes));
        self
    }

    /// List slides in `p:sldIdLst` in reverse part order.
    pub fn reverse_slide_order(mut self) -> Self {
        self.reverse_order = true;
        self
    }

    /// Omit `p:sldIdLst` entirely.
    pub fn without_slide_id_list(mut self) -> Self {
        self.with_id_list = false;
        self
    }

    /// Write `body` in place of the generated part `name`.
    pub fn replace_part(mut self, name: &str, body: &str) -> Self {
        self.overrides.push((name.to_string(), body.to_string()));
        self
    }

    /// Build the package bytes.
    pub fn build(&self) -> Vec<u8> {
        self.build_without(&[])
    }

    /// Build the package bytes, leaving out the named parts.
    pub fn build_without(&self, skip: &[&str]) -> Vec<u8> {
        let mut parts: Vec<(String, Vec<u8>)> = Vec::new();
        let mut add = |name: &str, body: Vec<u8>| {
            if skip.contains(&name) {
                return;
            }
            let body = match self.overrides.iter().find(|(part, _)| part == name) {
                Some((_, replacement)) => replacement.clone().into_bytes(),
                None => body,
            };
            parts.push((name.to_string(), body));
        };

        add("[Content_Types].xml", content_types().into_bytes());
        add(
            "_rels/.rels",
            rels(&[("rId1", "officeDocument", "ppt/presentation.xml")]).into_bytes(),
        );

        let mut pres_rels = vec![
            ("rId1".to_string(), "slideMaster", "slideMasters/slideMaster1.xml".to_string()),
            ("rId2".to_string(), "theme", "theme/theme1.xml".to_string()),
        ];
        let mut ids = String::new();
        let order: Vec<usize> = if self.reverse_order {
            (0..self.slides.len()).rev().collect()
        } else {
            (0..self.slides.len()).collect()
        };
        for i in 0..self.slides.len() {
            pres_rels.push((
                format!("rId{}", i + 10),
                "slide",
                format!("slides/slide{}.xml", i + 1),
            ));
        }
        for (n, i) in order.iter().enumerate() {
            ids.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + n, i + 10));
        }
        let id_list = if self.with_id_list {
            format!("<p:sldIdLst>{}</p:sldIdLst>", ids)
        } else {
            String::new()
        };
        add(
            "ppt/presentation.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation {NS}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>{id_list}<p:sldSz cx="{}" cy="{}"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
                self.size.0, self.size.1
            )
            .into_bytes(),
        );
        let pres_rels: Vec<(&str, &str, &str)> = pres_rels
            .iter()
            .map(|(id, kind, target)| (id.as_str(), *kind, target.as_str()))
            .collect();
        add("ppt/_rels/presentation.xml.rels", rels(&pres_rels).into_bytes());

        add("ppt/theme/theme1.xml", self.theme.clone().into_bytes());
        add(
            "ppt/slideMasters/slideMaster1.xml",
            format!(
                r#"<p:sldMaster {NS}><p:cSld>{}<p:spTree>{TREE_HEAD}{}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>{DEFAULT_TX_STYLES}</p:sldMaster>"#,
                self.master_background, self.master_shapes
            )
            .into_bytes(),
        );
        add(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            rels(&[
                ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
                ("rId2", "theme", "../theme/theme1.xml"),
            ])
            .into_bytes(),
        );
        add(
            "ppt/slideLayouts/slideLayout1.xml",
            format!(
                r#"<p:sldLayout {NS} type="obj"><p:cSld name="Title and Content"><p:spTree>{TREE_HEAD}{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#,
                self.layout_shapes
            )
            .into_bytes(),
        );
        add(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            rels(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]).into_bytes(),
        );

        let media_targets: Vec<(String, String)> = self
            .media
            .iter()
            .map(|(rid, name, _)| (rid.clone(), format!("../media/{}", name)))
            .collect();
        for (i, slide) in self.slides.iter().enumerate() {
            let body = match slide {
                SlideSource::Shapes(shapes) => format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld {NS}><p:cSld><p:spTree>{TREE_HEAD}{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
                    shapes
                ),
                SlideSource::Raw(xml) => xml.clone(),
            };
            add(&format!("ppt/slides/slide{}.xml", i + 1), body.into_bytes());

            let mut slide_rels = vec![("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")];
            for (rid, target) in &media_targets {
                slide_rels.push((rid.as_str(), "image", target.as_str()));
            }
            add(
                &format!("ppt/slides/_rels/slide{}.xml.rels", i + 1),
                rels(&slide_rels).into_bytes(),
            );
        }
        for (_, name, bytes) in &self.media {
            add(&format!("ppt/media/{}", name), bytes.clone());
        }

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, body) in parts {
            writer.start_file(name, options).expect("start zip entry");
            writer.write_all(&body).expect("write zip entry");
        }
        writer.finish().expect("finish zip").into_inner()
    }
}

fn rels(entries: &[(&str, &str, &str)]) -> String {
    let mut out = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{}">"#,
        REL_NS
    );
    for (id, kind, target) in entries {
        out.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}/{}" Target="{}"/>"#,
            id, REL_BASE, kind, target
        ));
    }
    out.push_str("</Relationships>");
    out
}

fn content_types() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/></Types>"#
        .to_string()
}

fn xfrm(x: i64, y: i64, cx: i64, cy: i64) -> String {
    format!(
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        x, y, cx, cy
    )
}

/// A filled rectangle with no outline.
pub fn rect(id: u32, x: i64, y: i64, cx: i64, cy: i64, fill: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Rectangle {id}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr>{}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:solidFill><a:srgbClr val="{fill}"/></a:solidFill><a:ln><a:noFill/></a:ln></p:spPr></p:sp>"#,
        xfrm(x, y, cx, cy)
    )
}

/// A text box with one paragraph of one run. `body_pr` is the inner
/// content and attributes of `a:bodyPr`, e.g. `wrap="none"><a:noAutofit/`.
pub fn text_box(id: u32, x: i64, y: i64, cx: i64, cy: i64, body_pr: &str, text: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>{}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr><p:txBody><a:bodyPr {body_pr}></a:bodyPr><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" sz="1800"/><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#,
        xfrm(x, y, cx, cy)
    )
}

/// A placeholder shape. `ph` holds the `p:ph` attributes; `sp_pr` the
/// inner content of `p:spPr`.
pub fn placeholder(id: u32, ph: &str, sp_pr: &str, text: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Placeholder {id}"/><p:cNvSpPr/><p:nvPr><p:ph {ph}/></p:nvPr></p:nvSpPr><p:spPr>{sp_pr}</p:spPr><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#
    )
}

/// A picture referencing relationship `rid`.
pub fn picture(id: u32, rid: &str, x: i64, y: i64, cx: i64, cy: i64) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {id}"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{rid}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr>{}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
        xfrm(x, y, cx, cy)
    )
}

/// A graphic frame (table/chart host), which the renderer does not draw.
pub fn graphic_frame(id: u32, x: i64, y: i64, cx: i64, cy: i64) -> String {
    format!(
        r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{id}" name="Table {id}"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></p:xfrm><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"/></a:graphic></p:graphicFrame>"#
    )
}
