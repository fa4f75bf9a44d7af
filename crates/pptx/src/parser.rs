//! PPTX file parser implementation.

use crate::omml;
use crate::package::{Package, Relationships};
use crate::xml::XmlNode;
use deck_core::types::{
    CropFractions, GroupTransform, Inline, Paragraph, PictureRef, Placeholder, Rect, Run,
    RunColor, SourceCell, TableGrid, ThemeColor, DEFAULT_SLIDE_HEIGHT, DEFAULT_SLIDE_WIDTH,
};
use deck_core::{Deck, Error, Result, Shape, ShapeKind, SourceSlide};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Crop offsets are stored in thousandths of a percent.
const CROP_UNIT: f64 = 100_000.0;

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a `.pptx` file from disk.
    pub fn parse_file(&self, path: &Path) -> Result<Deck> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if extension != "pptx" {
            return Err(Error::UnsupportedFormat(format!(
                "{} (expected a .pptx file)",
                path.display()
            )));
        }
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = File::open(path)?;
        self.parse(BufReader::new(file), &filename)
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<Deck> {
        let mut package = Package::open(reader)?;
        let mut deck = Deck::new(filename);

        let presentation = package.read_xml(PRESENTATION_PART)?;
        if presentation.name != "presentation" {
            return Err(Error::PptxParseError(format!(
                "{} has root <{}>",
                PRESENTATION_PART, presentation.name
            )));
        }
        if let Some(size) = presentation.child("sldSz") {
            deck.slide_width = size.attr_i64("cx").unwrap_or(DEFAULT_SLIDE_WIDTH);
            deck.slide_height = size.attr_i64("cy").unwrap_or(DEFAULT_SLIDE_HEIGHT);
        }

        let rels = package.relationships(PRESENTATION_PART)?;
        let slide_order = slide_order(&presentation, &rels);
        log::debug!("{}: {} slides", filename, slide_order.len());

        let mut layouts: HashMap<String, Inherited> = HashMap::new();
        for (index, slide_path) in slide_order.iter().enumerate() {
            let slide = parse_slide(&mut package, &mut layouts, slide_path, index + 1)?;
            for media in slide.media {
                if deck.media.contains_key(&media) {
                    continue;
                }
                match package.read_bytes(&media) {
                    Ok(bytes) => {
                        deck.media.insert(media, bytes);
                    }
                    Err(e) => log::warn!("Picture data unavailable on slide {}: {}", index + 1, e),
                }
            }
            deck.add_slide(slide.slide);
        }

        Ok(deck)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Slide paths in presentation order.
///
/// `p:sldIdLst` is authoritative; without it, slide relationships are
/// ordered by the number in their id or target.
fn slide_order(presentation: &XmlNode, rels: &Relationships) -> Vec<String> {
    if let Some(list) = presentation.child("sldIdLst") {
        let ordered: Vec<String> = list
            .children_named("sldId")
            .filter_map(|entry| entry.attr("r:id"))
            .filter_map(|id| rels.get(id))
            .filter(|rel| rel.is_type("slide"))
            .map(|rel| rel.target.clone())
            .collect();
        if !ordered.is_empty() {
            return ordered;
        }
    }

    let mut slides: Vec<(String, Option<usize>)> = rels
        .iter()
        .filter(|rel| rel.is_type("slide"))
        .map(|rel| {
            let order = extract_slide_number(&rel.target).or_else(|| extract_slide_number(&rel.id));
            (rel.target.clone(), order)
        })
        .collect();
    slides.sort_by(|a, b| match (a.1, b.1) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });
    slides.into_iter().map(|(path, _)| path).collect()
}

/// A parsed slide and the media parts it references.
struct ParsedSlide {
    slide: SourceSlide,
    media: Vec<String>,
}

fn parse_slide<R: Read + Seek>(
    package: &mut Package<R>,
    layouts: &mut HashMap<String, Inherited>,
    slide_path: &str,
    number: usize,
) -> Result<ParsedSlide> {
    let root = package.read_xml(slide_path)?;
    let rels = package.relationships(slide_path)?;

    let layout_path = rels.first_of_type("slideLayout").map(|rel| rel.target.clone());
    if let Some(path) = &layout_path {
        if !layouts.contains_key(path) {
            let inherited = Inherited::load(package, path);
            layouts.insert(path.clone(), inherited);
        }
    }
    let fallback = Inherited::default();
    let inherited = layout_path
        .as_ref()
        .and_then(|path| layouts.get(path))
        .unwrap_or(&fallback);

    let mut scope = SlideScope {
        rels: &rels,
        inherited,
        media: Vec::new(),
    };
    let mut slide = SourceSlide::new(number);
    if let Some(tree) = root.path(&["cSld", "spTree"]) {
        slide.shapes = scope.shapes(tree);
    } else {
        log::warn!("Slide {} has no shape tree", number);
    }
    log::debug!("Slide {}: {} top-level shapes", number, slide.shapes.len());

    if let Some(notes) = rels.first_of_type("notesSlide") {
        slide.notes = match read_notes(package, &notes.target) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Skipping notes of slide {}: {}", number, e);
                None
            }
        };
    }

    Ok(ParsedSlide {
        slide,
        media: scope.media,
    })
}

/// Text of the body placeholder of a notes slide.
fn read_notes<R: Read + Seek>(package: &mut Package<R>, path: &str) -> Result<Option<String>> {
    let root = package.read_xml(path)?;
    let Some(tree) = root.path(&["cSld", "spTree"]) else {
        return Ok(None);
    };
    let mut lines = Vec::new();
    for shape in tree.children_named("sp") {
        let is_body = non_visual(shape)
            .and_then(|nv| nv.path(&["nvPr", "ph"]))
            .is_some_and(|ph| ph.attr("type") == Some("body"));
        if !is_body {
            continue;
        }
        if let Some(body) = shape.child("txBody") {
            for paragraph in body.children_named("p") {
                lines.push(paragraph.text_of_t());
            }
        }
    }
    let text = lines.join("\n");
    Ok((!text.trim().is_empty()).then_some(text))
}

/// Placeholder identity used for geometry inheritance.
#[derive(Debug, Clone, Default)]
struct PlaceholderKey {
    ph_type: Option<String>,
    idx: Option<String>,
}

impl PlaceholderKey {
    fn from_ph(ph: &XmlNode) -> Self {
        Self {
            ph_type: ph.attr("type").map(str::to_string),
            idx: ph.attr("idx").map(str::to_string),
        }
    }

    /// Types to try on a layout or master, most specific first.
    fn type_candidates(&self) -> Vec<&str> {
        match self.ph_type.as_deref() {
            None | Some("obj") => vec!["obj", "body"],
            Some("ctrTitle") => vec!["ctrTitle", "title"],
            Some("subTitle") => vec!["subTitle", "body"],
            Some(other) => vec![other],
        }
    }
}

/// Placeholder bounds defined by one layout or master.
#[derive(Debug, Default)]
struct PlaceholderGeometry {
    by_idx: HashMap<String, Rect>,
    by_type: HashMap<String, Rect>,
}

impl PlaceholderGeometry {
    fn from_root(root: &XmlNode) -> Self {
        let mut geometry = Self::default();
        let Some(tree) = root.path(&["cSld", "spTree"]) else {
            return geometry;
        };
        for shape in tree.elements() {
            let Some(ph) = non_visual(shape).and_then(|nv| nv.path(&["nvPr", "ph"])) else {
                continue;
            };
            let Some(bounds) = transform(shape).and_then(rect) else {
                continue;
            };
            let key = PlaceholderKey::from_ph(ph);
            if let Some(idx) = key.idx {
                geometry.by_idx.entry(idx).or_insert(bounds);
            }
            let ph_type = key.ph_type.unwrap_or_else(|| "obj".to_string());
            geometry.by_type.entry(ph_type).or_insert(bounds);
        }
        geometry
    }

    fn lookup(&self, key: &PlaceholderKey) -> Option<Rect> {
        if let Some(rect) = key.idx.as_ref().and_then(|idx| self.by_idx.get(idx)) {
            return Some(*rect);
        }
        key.type_candidates()
            .into_iter()
            .find_map(|ph_type| self.by_type.get(ph_type).copied())
    }
}

/// Geometry a slide's placeholders inherit: its layout, then the master.
#[derive(Debug, Default)]
struct Inherited {
    layout: PlaceholderGeometry,
    master: PlaceholderGeometry,
}

impl Inherited {
    fn load<R: Read + Seek>(package: &mut Package<R>, layout_path: &str) -> Self {
        let mut inherited = Self::default();
        match package.read_xml(layout_path) {
            Ok(root) => inherited.layout = PlaceholderGeometry::from_root(&root),
            Err(e) => {
                log::warn!("Layout {} unreadable: {}", layout_path, e);
                return inherited;
            }
        }
        let master_path = package
            .relationships(layout_path)
            .ok()
            .and_then(|rels| rels.first_of_type("slideMaster").map(|rel| rel.target.clone()));
        if let Some(master_path) = master_path {
            match package.read_xml(&master_path) {
                Ok(root) => inherited.master = PlaceholderGeometry::from_root(&root),
                Err(e) => log::warn!("Master {} unreadable: {}", master_path, e),
            }
        }
        inherited
    }

    fn lookup(&self, key: &PlaceholderKey) -> Option<Rect> {
        self.layout.lookup(key).or_else(|| self.master.lookup(key))
    }
}

/// Per-slide state while walking the shape tree.
struct SlideScope<'a> {
    rels: &'a Relationships,
    inherited: &'a Inherited,
    /// Media parts referenced by pictures, in encounter order.
    media: Vec<String>,
}

impl SlideScope<'_> {
    fn shapes(&mut self, tree: &XmlNode) -> Vec<Shape> {
        tree.elements().filter_map(|node| self.shape(node)).collect()
    }

    fn shape(&mut self, node: &XmlNode) -> Option<Shape> {
        match node.name.as_str() {
            "sp" | "pic" | "graphicFrame" | "grpSp" | "cxnSp" => {}
            "AlternateContent" => {
                let branch = node.child("Choice").or_else(|| node.child("Fallback"))?;
                return branch.elements().find_map(|child| self.shape(child));
            }
            _ => return None,
        }

        let nv = non_visual(node);
        let c_nv_pr = nv.and_then(|nv| nv.child("cNvPr"));
        let id = c_nv_pr
            .and_then(|c| c.attr_i64("id"))
            .and_then(|id| u32::try_from(id).ok())
            .unwrap_or(0);
        let name = c_nv_pr.and_then(|c| c.attr("name")).unwrap_or_default();
        let ph = nv.and_then(|nv| nv.path(&["nvPr", "ph"]));

        let bounds = match transform(node).and_then(rect) {
            Some(bounds) => bounds,
            None => ph
                .and_then(|ph| self.inherited.lookup(&PlaceholderKey::from_ph(ph)))
                .unwrap_or_default(),
        };

        let kind = match node.name.as_str() {
            "sp" => match node.child("txBody") {
                Some(body) => ShapeKind::Text(self.paragraphs(body)),
                None => ShapeKind::Other,
            },
            "pic" => self.picture(node, c_nv_pr),
            "graphicFrame" => match node.path(&["graphic", "graphicData", "tbl"]) {
                Some(table) => ShapeKind::Table(self.table(table)),
                None => ShapeKind::Other,
            },
            "grpSp" => ShapeKind::Group {
                transform: node
                    .path(&["grpSpPr", "xfrm"])
                    .and_then(group_transform),
                children: node
                    .elements()
                    .filter(|child| child.name != "nvGrpSpPr" && child.name != "grpSpPr")
                    .filter_map(|child| self.shape(child))
                    .collect(),
            },
            _ => ShapeKind::Other,
        };

        let mut shape = Shape::new(id, kind).with_bounds(bounds).with_name(name);
        if let Some(ph) = ph {
            shape = shape.with_placeholder(Placeholder::from_ooxml(ph.attr("type")));
        }
        Some(shape)
    }

    fn picture(&mut self, node: &XmlNode, c_nv_pr: Option<&XmlNode>) -> ShapeKind {
        let Some(fill) = node.child("blipFill") else {
            return ShapeKind::Other;
        };
        let Some(media) = fill
            .child("blip")
            .and_then(|blip| blip.attr("r:embed"))
            .and_then(|id| self.rels.get(id))
            .filter(|rel| !rel.external)
            .map(|rel| rel.target.clone())
        else {
            return ShapeKind::Other;
        };

        let crop = fill.child("srcRect").map(crop_fractions).unwrap_or_default();
        let alt = c_nv_pr
            .and_then(|c| c.attr("descr"))
            .filter(|descr| !descr.trim().is_empty())
            .or_else(|| c_nv_pr.and_then(|c| c.attr("name")))
            .unwrap_or_default()
            .to_string();

        if !self.media.contains(&media) {
            self.media.push(media.clone());
        }
        ShapeKind::Picture(PictureRef { media, alt, crop })
    }

    fn table(&self, table: &XmlNode) -> TableGrid {
        let rows = table
            .children_named("tr")
            .map(|row| {
                row.children_named("tc")
                    .map(|cell| SourceCell {
                        paragraphs: cell
                            .child("txBody")
                            .map(|body| self.paragraphs(body))
                            .unwrap_or_default(),
                        row_span: span(cell, "rowSpan"),
                        col_span: span(cell, "gridSpan"),
                        h_merge: cell.attr_flag("hMerge"),
                        v_merge: cell.attr_flag("vMerge"),
                    })
                    .collect()
            })
            .collect();
        TableGrid { rows }
    }

    fn paragraphs(&self, body: &XmlNode) -> Vec<Paragraph> {
        body.children_named("p")
            .map(|p| {
                let level = p
                    .child("pPr")
                    .and_then(|ppr| ppr.attr_i64("lvl"))
                    .and_then(|lvl| usize::try_from(lvl).ok())
                    .unwrap_or(0);
                let mut content = Vec::new();
                self.inline_content(p, &mut content);
                Paragraph::new(level, content)
            })
            .collect()
    }

    fn inline_content(&self, parent: &XmlNode, content: &mut Vec<Inline>) {
        for node in parent.elements() {
            match node.name.as_str() {
                "r" | "fld" => content.push(Inline::Run(self.run(node))),
                "br" => match content.last_mut() {
                    Some(Inline::Run(run)) => run.text.push('\n'),
                    _ => content.push(Inline::Run(Run::new("\n"))),
                },
                // a14:m wraps an Office Math paragraph
                "m" => {
                    let math = node
                        .descendant("oMathPara")
                        .or_else(|| node.descendant("oMath"));
                    if let Some(math) = math {
                        content.push(Inline::Math(omml::parse_math(math)));
                    }
                }
                "AlternateContent" => {
                    if let Some(branch) = node.child("Choice").or_else(|| node.child("Fallback")) {
                        self.inline_content(branch, content);
                    }
                }
                _ => {}
            }
        }
    }

    fn run(&self, node: &XmlNode) -> Run {
        let mut run = Run::new(node.child("t").map(XmlNode::text).unwrap_or_default());
        let Some(props) = node.child("rPr") else {
            return run;
        };
        run.bold = props.attr_flag("b");
        run.italic = props.attr_flag("i");
        run.underline = props.attr("u").is_some_and(|u| u != "none");
        run.font = props
            .child("latin")
            .and_then(|latin| latin.attr("typeface"))
            .map(str::to_string);
        run.color = props.child("solidFill").and_then(run_color);
        run.hyperlink = props
            .child("hlinkClick")
            .and_then(|link| link.attr("r:id"))
            .and_then(|id| self.rels.target(id))
            .map(str::to_string);
        run
    }
}

/// The `nv*Pr` element holding `cNvPr` and `nvPr`.
fn non_visual(shape: &XmlNode) -> Option<&XmlNode> {
    shape
        .elements()
        .find(|child| child.name.starts_with("nv") && child.name.ends_with("Pr"))
}

/// The `xfrm` of a shape, wherever its kind keeps it.
fn transform(shape: &XmlNode) -> Option<&XmlNode> {
    shape
        .path(&["spPr", "xfrm"])
        .or_else(|| shape.path(&["grpSpPr", "xfrm"]))
        .or_else(|| shape.child("xfrm"))
}

fn point(node: Option<&XmlNode>, x: &str, y: &str) -> Option<(i64, i64)> {
    let node = node?;
    Some((node.attr_i64(x)?, node.attr_i64(y)?))
}

fn rect(xfrm: &XmlNode) -> Option<Rect> {
    let (left, top) = point(xfrm.child("off"), "x", "y")?;
    let (width, height) = point(xfrm.child("ext"), "cx", "cy")?;
    Some(Rect::new(left, top, width, height))
}

fn group_transform(xfrm: &XmlNode) -> Option<GroupTransform> {
    let bounds = rect(xfrm)?;
    Some(GroupTransform {
        bounds,
        child_offset: point(xfrm.child("chOff"), "x", "y").unwrap_or((bounds.left, bounds.top)),
        child_extent: point(xfrm.child("chExt"), "cx", "cy")
            .unwrap_or((bounds.width, bounds.height)),
    })
}

fn crop_fractions(src_rect: &XmlNode) -> CropFractions {
    let edge = |name: &str| {
        src_rect
            .attr_i64(name)
            .map(|v| (v as f64 / CROP_UNIT).clamp(0.0, 1.0))
            .unwrap_or(0.0)
    };
    CropFractions::new(edge("l"), edge("r"), edge("t"), edge("b"))
}

fn span(cell: &XmlNode, name: &str) -> usize {
    cell.attr_i64(name)
        .and_then(|n| usize::try_from(n).ok())
        .filter(|n| *n > 0)
        .unwrap_or(1)
}

fn run_color(fill: &XmlNode) -> Option<RunColor> {
    if let Some(scheme) = fill.child("schemeClr") {
        return scheme
            .attr("val")
            .and_then(ThemeColor::from_ooxml)
            .map(RunColor::Theme);
    }
    let hex = fill.child("srgbClr")?.attr("val")?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    Some(RunColor::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
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
    use deck_core::MathNode;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const NS: &str = r#"xmlns:a="a" xmlns:p="p" xmlns:r="r" xmlns:m="m" xmlns:mc="mc" xmlns:a14="a14""#;

    fn build_pptx(parts: &[(&str, String)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn rels(entries: &[(&str, &str, &str)]) -> String {
        let body: String = entries
            .iter()
            .map(|(id, kind, target)| {
                format!(
                    r#"<Relationship Id="{}" Type="http://schemas/relationships/{}" Target="{}"/>"#,
                    id, kind, target
                )
            })
            .collect();
        format!("<Relationships>{}</Relationships>", body)
    }

    fn presentation(slide_ids: &[&str]) -> String {
        let ids: String = slide_ids
            .iter()
            .enumerate()
            .map(|(i, rid)| format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 256 + i, rid))
            .collect();
        format!(
            r#"<p:presentation {}><p:sldIdLst>{}</p:sldIdLst><p:sldSz cx="9144000" cy="6858000"/></p:presentation>"#,
            NS, ids
        )
    }

    fn slide(shapes: &str) -> String {
        format!(
            r#"<p:sld {}><p:cSld><p:spTree><p:nvGrpSpPr/><p:grpSpPr/>{}</p:spTree></p:cSld></p:sld>"#,
            NS, shapes
        )
    }

    fn text_shape(id: u32, ph: &str, xfrm: &str, paragraphs: &str) -> String {
        format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="Shape {}"/><p:cNvSpPr/><p:nvPr>{}</p:nvPr></p:nvSpPr><p:spPr>{}</p:spPr><p:txBody><a:bodyPr/>{}</p:txBody></p:sp>"#,
            id, id, ph, xfrm, paragraphs
        )
    }

    fn xfrm(x: i64, y: i64, cx: i64, cy: i64) -> String {
        format!(
            r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
            x, y, cx, cy
        )
    }

    fn parse(parts: &[(&str, String)]) -> Deck {
        PptxParser::new()
            .parse(Cursor::new(build_pptx(parts)), "deck.pptx")
            .unwrap()
    }

    fn one_slide(shapes: &str, slide_rels: &[(&str, &str, &str)]) -> Vec<(&'static str, String)> {
        vec![
            ("ppt/presentation.xml", presentation(&["rId1"])),
            (
                "ppt/_rels/presentation.xml.rels",
                rels(&[("rId1", "slide", "slides/slide1.xml")]),
            ),
            ("ppt/slides/slide1.xml", slide(shapes)),
            ("ppt/slides/_rels/slide1.xml.rels", rels(slide_rels)),
        ]
    }

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_slide_order_follows_id_list() {
        let parts = vec![
            ("ppt/presentation.xml", presentation(&["rId3", "rId2"])),
            (
                "ppt/_rels/presentation.xml.rels",
                rels(&[
                    ("rId2", "slide", "slides/slide1.xml"),
                    ("rId3", "slide", "slides/slide2.xml"),
                ]),
            ),
            (
                "ppt/slides/slide1.xml",
                slide(&text_shape(2, "", &xfrm(0, 0, 10, 10), "<a:p><a:r><a:t>first part</a:t></a:r></a:p>")),
            ),
            (
                "ppt/slides/slide2.xml",
                slide(&text_shape(2, "", &xfrm(0, 0, 10, 10), "<a:p><a:r><a:t>second part</a:t></a:r></a:p>")),
            ),
        ];
        let deck = parse(&parts);
        assert_eq!(deck.slide_width, 9_144_000);
        assert_eq!(deck.slides.len(), 2);
        assert_eq!(deck.slides[0].number, 1);
        let ShapeKind::Text(paragraphs) = &deck.slides[0].shapes[0].kind else {
            panic!("expected text");
        };
        assert_eq!(paragraphs[0].text(), "second part");
    }

    #[test]
    fn test_runs_levels_breaks_and_links() {
        let paragraphs = r#"<a:p><a:pPr lvl="1"/><a:r><a:rPr b="1" u="sng"><a:solidFill><a:schemeClr val="accent2"/></a:solidFill><a:latin typeface="Consolas"/><a:hlinkClick r:id="rId5"/></a:rPr><a:t>bold</a:t></a:r><a:br/><a:r><a:rPr i="1"><a:solidFill><a:srgbClr val="FF0010"/></a:solidFill></a:rPr><a:t>next</a:t></a:r></a:p>"#;
        let parts = one_slide(
            &text_shape(4, "", &xfrm(100, 200, 300, 400), paragraphs),
            &[("rId5", "hyperlink\" TargetMode=\"External", "https://example.com")],
        );
        let deck = parse(&parts);
        let shape = &deck.slides[0].shapes[0];
        assert_eq!(shape.id, 4);
        assert_eq!(shape.bounds, Rect::new(100, 200, 300, 400));
        let ShapeKind::Text(paragraphs) = &shape.kind else {
            panic!("expected text");
        };
        assert_eq!(paragraphs[0].level, 1);
        let Inline::Run(first) = &paragraphs[0].content[0] else {
            panic!("expected run");
        };
        assert_eq!(first.text, "bold\n");
        assert!(first.bold && first.underline && !first.italic);
        assert_eq!(first.font.as_deref(), Some("Consolas"));
        assert_eq!(first.color, Some(RunColor::Theme(ThemeColor::Accent(2))));
        assert_eq!(first.hyperlink.as_deref(), Some("https://example.com"));
        let Inline::Run(second) = &paragraphs[0].content[1] else {
            panic!("expected run");
        };
        assert!(second.italic);
        assert_eq!(second.color, Some(RunColor::Rgb(255, 0, 16)));
    }

    #[test]
    fn test_placeholder_inherits_layout_geometry() {
        let layout_shape = text_shape(
            3,
            r#"<p:ph type="body" idx="1"/>"#,
            &xfrm(500, 600, 700, 800),
            "",
        );
        let master_shape = text_shape(2, r#"<p:ph type="title"/>"#, &xfrm(1, 2, 3, 4), "");
        let shapes = format!(
            "{}{}",
            text_shape(5, r#"<p:ph idx="1"/>"#, "", "<a:p><a:r><a:t>body</a:t></a:r></a:p>"),
            text_shape(6, r#"<p:ph type="title"/>"#, "", "<a:p><a:r><a:t>Title</a:t></a:r></a:p>")
        );
        let mut parts = one_slide(
            &shapes,
            &[("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")],
        );
        parts.push(("ppt/slideLayouts/slideLayout1.xml", slide(&layout_shape)));
        parts.push((
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            rels(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]),
        ));
        parts.push(("ppt/slideMasters/slideMaster1.xml", slide(&master_shape)));

        let deck = parse(&parts);
        let shapes = &deck.slides[0].shapes;
        assert_eq!(shapes[0].bounds, Rect::new(500, 600, 700, 800));
        assert_eq!(shapes[0].placeholder, Some(Placeholder::Object));
        assert_eq!(shapes[1].bounds, Rect::new(1, 2, 3, 4));
        assert!(shapes[1].is_title());
    }

    #[test]
    fn test_picture_crop_alt_and_media() {
        let pic = r#"<p:pic><p:nvPicPr><p:cNvPr id="7" name="Picture 6" descr="A chart"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"/><a:srcRect l="10000" t="0" r="25000" b="5000"/></p:blipFill><p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="100" cy="100"/></a:xfrm></p:spPr></p:pic>"#;
        let mut parts = one_slide(pic, &[("rId2", "image", "../media/image1.png")]);
        parts.push(("ppt/media/image1.png", "PNGDATA".to_string()));
        let deck = parse(&parts);
        let ShapeKind::Picture(picture) = &deck.slides[0].shapes[0].kind else {
            panic!("expected picture");
        };
        assert_eq!(picture.media, "ppt/media/image1.png");
        assert_eq!(picture.alt, "A chart");
        assert_eq!(picture.crop, CropFractions::new(0.1, 0.25, 0.0, 0.05));
        assert_eq!(deck.media.get("ppt/media/image1.png"), Some(&b"PNGDATA".to_vec()));
    }

    #[test]
    fn test_missing_media_is_not_fatal() {
        let pic = r#"<p:pic><p:nvPicPr><p:cNvPr id="7" name="Picture"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"/></p:blipFill><p:spPr/></p:pic>"#;
        let parts = one_slide(pic, &[("rId2", "image", "../media/gone.emf")]);
        let deck = parse(&parts);
        assert!(matches!(deck.slides[0].shapes[0].kind, ShapeKind::Picture(_)));
        assert!(deck.media.is_empty());
    }

    #[test]
    fn test_table_spans_and_merges() {
        let table = r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="9" name="Table"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm><a:off x="0" y="0"/><a:ext cx="10" cy="10"/></p:xfrm><a:graphic><a:graphicData><a:tbl><a:tblGrid/><a:tr><a:tc gridSpan="2"><a:txBody><a:p><a:r><a:t>wide</a:t></a:r></a:p></a:txBody></a:tc><a:tc hMerge="1"/></a:tr><a:tr><a:tc><a:txBody><a:p><a:r><a:t>a</a:t></a:r></a:p></a:txBody></a:tc><a:tc><a:txBody><a:p><a:r><a:t>b</a:t></a:r></a:p></a:txBody></a:tc></a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#;
        let deck = parse(&one_slide(table, &[]));
        let ShapeKind::Table(grid) = &deck.slides[0].shapes[0].kind else {
            panic!("expected table");
        };
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[0][0].col_span, 2);
        assert!(grid.rows[0][1].is_covered());
        assert_eq!(grid.rows[1][1].paragraphs[0].text(), "b");
    }

    #[test]
    fn test_group_transform_and_children() {
        let group = format!(
            r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="10" name="Group"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="1000" y="1000"/><a:ext cx="500" cy="500"/><a:chOff x="0" y="0"/><a:chExt cx="1000" cy="1000"/></a:xfrm></p:grpSpPr>{}</p:grpSp>"#,
            text_shape(11, "", &xfrm(0, 0, 100, 100), "<a:p><a:r><a:t>inner</a:t></a:r></a:p>")
        );
        let deck = parse(&one_slide(&group, &[]));
        let ShapeKind::Group { transform, children } = &deck.slides[0].shapes[0].kind else {
            panic!("expected group");
        };
        let transform = transform.unwrap();
        assert_eq!(transform.child_extent, (1000, 1000));
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, 11);
    }

    #[test]
    fn test_inline_formula() {
        let paragraphs = r#"<a:p><a:r><a:t>where </a:t></a:r><mc:AlternateContent><mc:Choice Requires="a14"><a14:m><m:oMathPara><m:oMath><m:r><m:t>x</m:t></m:r></m:oMath></m:oMathPara></a14:m></mc:Choice><mc:Fallback><a:r><a:t>x</a:t></a:r></mc:Fallback></mc:AlternateContent></a:p>"#;
        let deck = parse(&one_slide(&text_shape(2, "", &xfrm(0, 0, 1, 1), paragraphs), &[]));
        let ShapeKind::Text(paragraphs) = &deck.slides[0].shapes[0].kind else {
            panic!("expected text");
        };
        assert_eq!(paragraphs[0].content.len(), 2);
        assert_eq!(
            paragraphs[0].content[1],
            Inline::Math(MathNode::Run("x".into()))
        );
    }

    #[test]
    fn test_notes_body_text() {
        let notes = format!(
            r#"<p:notes {}><p:cSld><p:spTree>{}{}</p:spTree></p:cSld></p:notes>"#,
            NS,
            text_shape(2, r#"<p:ph type="sldImg"/>"#, "", ""),
            text_shape(3, r#"<p:ph type="body" idx="1"/>"#, "", "<a:p><a:r><a:t>Remember</a:t></a:r></a:p><a:p><a:r><a:t>this</a:t></a:r></a:p>")
        );
        let mut parts = one_slide("", &[("rId3", "notesSlide", "../notesSlides/notesSlide1.xml")]);
        parts.push(("ppt/notesSlides/notesSlide1.xml", notes));
        let deck = parse(&parts);
        assert_eq!(deck.slides[0].notes.as_deref(), Some("Remember\nthis"));
    }

    #[test]
    fn test_not_a_zip() {
        let err = PptxParser::new()
            .parse(Cursor::new(b"plain text".to_vec()), "deck.pptx")
            .unwrap_err();
        assert!(matches!(err, Error::ZipError(_)));
    }

    #[test]
    fn test_missing_presentation_part() {
        let bytes = build_pptx(&[("docProps/app.xml", "<Properties/>".to_string())]);
        let err = PptxParser::new()
            .parse(Cursor::new(bytes), "deck.pptx")
            .unwrap_err();
        assert!(matches!(err, Error::MissingPart(_)));
    }

    #[test]
    fn test_parse_file_rejects_other_extensions() {
        let err = PptxParser::new()
            .parse_file(Path::new("slides.key"))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }
}
