//! Source model: the shape tree produced by a container reader.
//!
//! Coordinates are in EMU (English Metric Units, 914400 per inch) and are
//! relative to the slide's top-left corner.

use crate::formula::MathNode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// EMU per CSS pixel at 96 DPI.
pub const EMU_PER_PX: i64 = 9525;

/// Default 16:9 slide width in EMU.
pub const DEFAULT_SLIDE_WIDTH: i64 = 12_192_000;

/// Default 16:9 slide height in EMU.
pub const DEFAULT_SLIDE_HEIGHT: i64 = 6_858_000;

/// Convert EMU to whole pixels, rounding to nearest.
pub fn emu_to_px(emu: i64) -> i64 {
    (emu as f64 / EMU_PER_PX as f64).round() as i64
}

/// Represents an entire parsed deck before conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    /// Original filename (without path).
    pub filename: String,

    /// Slide width in EMU.
    pub slide_width: i64,

    /// Slide height in EMU.
    pub slide_height: i64,

    /// Slides in presentation order.
    pub slides: Vec<SourceSlide>,

    /// Media parts referenced by pictures, keyed by archive path.
    #[serde(skip)]
    pub media: BTreeMap<String, Vec<u8>>,
}

impl Deck {
    /// Create an empty deck with the default slide size.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            slide_width: DEFAULT_SLIDE_WIDTH,
            slide_height: DEFAULT_SLIDE_HEIGHT,
            slides: Vec::new(),
            media: BTreeMap::new(),
        }
    }

    /// Add a slide to the deck.
    pub fn add_slide(&mut self, slide: SourceSlide) {
        self.slides.push(slide);
    }

    /// Filename without its extension, used to prefix extracted images.
    pub fn stem(&self) -> &str {
        self.filename
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&self.filename)
    }
}

/// A single slide as read from the container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceSlide {
    /// 1-based slide number.
    pub number: usize,

    /// Top-level shapes in stored (z) order. Groups are not yet expanded.
    pub shapes: Vec<Shape>,

    /// Presenter notes text, if the slide has any.
    pub notes: Option<String>,
}

impl SourceSlide {
    /// Create a new slide with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }
}

/// Axis-aligned bounding box in EMU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    pub fn new(left: i64, top: i64, width: i64, height: i64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> i64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> i64 {
        self.top + self.height
    }

    /// Horizontal center.
    pub fn center_x(&self) -> f64 {
        self.left as f64 + self.width as f64 / 2.0
    }

    /// Length of the overlap of the two vertical spans (0 if disjoint).
    pub fn vertical_overlap(&self, other: &Rect) -> i64 {
        (self.bottom().min(other.bottom()) - self.top.max(other.top)).max(0)
    }

    /// Length of the overlap of the two horizontal spans (0 if disjoint).
    pub fn horizontal_overlap(&self, other: &Rect) -> i64 {
        (self.right().min(other.right()) - self.left.max(other.left)).max(0)
    }
}

/// Child coordinate mapping of a group shape.
///
/// Children of a group are positioned in the group's own coordinate space
/// (`child_offset`/`child_extent`), which is mapped onto `bounds`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupTransform {
    pub bounds: Rect,
    pub child_offset: (i64, i64),
    pub child_extent: (i64, i64),
}

impl GroupTransform {
    /// Map a rectangle from child space to the group's parent space.
    pub fn apply(&self, rect: &Rect) -> Rect {
        let sx = if self.child_extent.0 > 0 {
            self.bounds.width as f64 / self.child_extent.0 as f64
        } else {
            1.0
        };
        let sy = if self.child_extent.1 > 0 {
            self.bounds.height as f64 / self.child_extent.1 as f64
        } else {
            1.0
        };
        Rect {
            left: self.bounds.left + ((rect.left - self.child_offset.0) as f64 * sx).round() as i64,
            top: self.bounds.top + ((rect.top - self.child_offset.1) as f64 * sy).round() as i64,
            width: (rect.width as f64 * sx).round() as i64,
            height: (rect.height as f64 * sy).round() as i64,
        }
    }
}

/// Semantic role of a placeholder shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placeholder {
    Title,
    CenterTitle,
    VerticalTitle,
    Subtitle,
    Body,
    /// Untyped content placeholder (`obj`), the default type.
    Object,
    Picture,
    Table,
    Other(String),
}

impl Placeholder {
    /// Map an OOXML `p:ph@type` value. `None` means the attribute was absent.
    pub fn from_ooxml(value: Option<&str>) -> Self {
        match value {
            None | Some("obj") => Self::Object,
            Some("title") => Self::Title,
            Some("ctrTitle") => Self::CenterTitle,
            Some("vertTitle") => Self::VerticalTitle,
            Some("subTitle") => Self::Subtitle,
            Some("body") => Self::Body,
            Some("pic") => Self::Picture,
            Some("tbl") => Self::Table,
            Some(other) => Self::Other(other.to_string()),
        }
    }

    /// Whether this placeholder holds the slide title.
    pub fn is_title(&self) -> bool {
        matches!(self, Self::Title | Self::CenterTitle | Self::VerticalTitle)
    }

    /// Whether this placeholder holds body content and bypasses the
    /// minimum block size.
    pub fn is_body(&self) -> bool {
        matches!(self, Self::Body | Self::Object | Self::Subtitle)
    }
}

/// A positioned visual element on a slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
    /// Shape id from the container, unique within a slide.
    pub id: u32,

    /// Display name of the shape.
    pub name: String,

    /// Bounding box in the parent's coordinate space.
    pub bounds: Rect,

    /// Placeholder role, if the shape is a placeholder.
    pub placeholder: Option<Placeholder>,

    pub kind: ShapeKind,
}

impl Shape {
    pub fn new(id: u32, kind: ShapeKind) -> Self {
        Self {
            id,
            name: String::new(),
            bounds: Rect::default(),
            placeholder: None,
            kind,
        }
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn is_title(&self) -> bool {
        self.placeholder.as_ref().is_some_and(Placeholder::is_title)
    }

    pub fn is_body_placeholder(&self) -> bool {
        self.placeholder.as_ref().is_some_and(Placeholder::is_body)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ShapeKind {
    /// A shape with a text frame.
    Text(Vec<Paragraph>),
    Picture(PictureRef),
    Table(TableGrid),
    Group {
        transform: Option<GroupTransform>,
        children: Vec<Shape>,
    },
    /// Connectors, charts and anything else without convertible content.
    Other,
}

/// Reference to a picture's media part and its stored crop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PictureRef {
    /// Archive path of the media part, e.g. `ppt/media/image1.png`.
    pub media: String,

    /// Alternative text (description, falling back to the shape name).
    pub alt: String,

    /// Fractions of the original bitmap hidden at each edge.
    pub crop: CropFractions,
}

/// Per-edge crop fractions, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CropFractions {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl CropFractions {
    pub fn new(left: f64, right: f64, top: f64, bottom: f64) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }
}

/// A table's cell grid in source form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableGrid {
    pub rows: Vec<Vec<SourceCell>>,
}

/// One grid position of a source table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceCell {
    pub paragraphs: Vec<Paragraph>,
    pub row_span: usize,
    pub col_span: usize,
    /// Covered by a horizontal merge from the left.
    pub h_merge: bool,
    /// Covered by a vertical merge from above.
    pub v_merge: bool,
}

impl SourceCell {
    /// Whether this cell is hidden under another cell's span.
    pub fn is_covered(&self) -> bool {
        self.h_merge || self.v_merge
    }
}

/// Ordered sequence of inline content at one indentation level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Indentation level, 0-based.
    pub level: usize,
    pub content: Vec<Inline>,
}

impl Paragraph {
    pub fn new(level: usize, content: Vec<Inline>) -> Self {
        Self { level, content }
    }

    /// Plain text of all text runs (formulas excluded).
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|inline| match inline {
                Inline::Run(run) => Some(run.text.as_str()),
                Inline::Math(_) => None,
            })
            .collect()
    }

    /// Whether the paragraph holds a single formula and nothing but whitespace.
    pub fn is_formula_only(&self) -> bool {
        let mut formulas = 0;
        for inline in &self.content {
            match inline {
                Inline::Math(_) => formulas += 1,
                Inline::Run(run) if run.text.trim().is_empty() => {}
                Inline::Run(_) => return false,
            }
        }
        formulas == 1
    }
}

/// Inline content of a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Inline {
    Run(Run),
    /// An embedded equation.
    Math(MathNode),
}

/// A styled text fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Latin typeface name, if set on the run.
    pub font: Option<String>,
    pub color: Option<RunColor>,
    pub hyperlink: Option<String>,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into());
        self
    }

    pub fn with_color(mut self, color: RunColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_hyperlink(mut self, url: impl Into<String>) -> Self {
        self.hyperlink = Some(url.into());
        self
    }

    /// Whether the run's typeface is monospaced.
    pub fn is_monospace(&self) -> bool {
        self.font.as_deref().is_some_and(is_monospace_font)
    }
}

/// Fill color of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunColor {
    Theme(ThemeColor),
    Rgb(u8, u8, u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThemeColor {
    Dark1,
    Dark2,
    Light1,
    Light2,
    /// Accent 1 through 6.
    Accent(u8),
    Hyperlink,
    FollowedHyperlink,
}

impl ThemeColor {
    /// Map an OOXML `a:schemeClr@val` value.
    pub fn from_ooxml(value: &str) -> Option<Self> {
        match value {
            "dk1" | "tx1" => Some(Self::Dark1),
            "dk2" | "tx2" => Some(Self::Dark2),
            "lt1" | "bg1" => Some(Self::Light1),
            "lt2" | "bg2" => Some(Self::Light2),
            "hlink" => Some(Self::Hyperlink),
            "folHlink" => Some(Self::FollowedHyperlink),
            _ => value
                .strip_prefix("accent")
                .and_then(|n| n.parse::<u8>().ok())
                .filter(|n| (1..=6).contains(n))
                .map(Self::Accent),
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, Self::Dark1 | Self::Dark2)
    }
}

/// Typefaces treated as monospaced in addition to any name containing "mono".
const MONOSPACE_FONTS: &[&str] = &[
    "consolas",
    "courier",
    "courier new",
    "menlo",
    "monaco",
    "lucida console",
    "lucida sans typewriter",
    "andale mono",
    "source code pro",
    "fira code",
    "jetbrains mono",
    "inconsolata",
    "cascadia code",
    "ibm plex mono",
    "sf mono",
    "ocr a extended",
];

/// Whether a typeface name denotes a monospaced font.
pub fn is_monospace_font(name: &str) -> bool {
    let name = name.trim().to_lowercase();
    if name.is_empty() || name.starts_with('+') {
        // Theme font references like "+mn-lt" are never monospace.
        return false;
    }
    name.contains("mono") || MONOSPACE_FONTS.contains(&name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emu_to_px() {
        assert_eq!(emu_to_px(9525), 1);
        assert_eq!(emu_to_px(DEFAULT_SLIDE_WIDTH), 1280);
        assert_eq!(emu_to_px(DEFAULT_SLIDE_HEIGHT), 720);
    }

    #[test]
    fn test_monospace_fonts() {
        assert!(is_monospace_font("Consolas"));
        assert!(is_monospace_font("Courier New"));
        assert!(is_monospace_font("DejaVu Sans Mono"));
        assert!(!is_monospace_font("Calibri"));
        assert!(!is_monospace_font("+mn-lt"));
    }

    #[test]
    fn test_theme_color_mapping() {
        assert_eq!(ThemeColor::from_ooxml("accent3"), Some(ThemeColor::Accent(3)));
        assert_eq!(ThemeColor::from_ooxml("tx1"), Some(ThemeColor::Dark1));
        assert_eq!(ThemeColor::from_ooxml("accent7"), None);
        assert!(ThemeColor::Dark2.is_dark());
    }

    #[test]
    fn test_placeholder_roles() {
        assert!(Placeholder::from_ooxml(Some("ctrTitle")).is_title());
        assert!(Placeholder::from_ooxml(None).is_body());
        assert!(!Placeholder::from_ooxml(Some("dt")).is_body());
    }

    #[test]
    fn test_group_transform_scales_children() {
        let transform = GroupTransform {
            bounds: Rect::new(1000, 2000, 500, 500),
            child_offset: (0, 0),
            child_extent: (1000, 1000),
        };
        let mapped = transform.apply(&Rect::new(200, 400, 100, 100));
        assert_eq!(mapped, Rect::new(1100, 2200, 50, 50));
    }

    #[test]
    fn test_formula_only_paragraph() {
        let para = Paragraph::new(
            0,
            vec![
                Inline::Run(Run::new(" ")),
                Inline::Math(MathNode::Run("x".into())),
            ],
        );
        assert!(para.is_formula_only());

        let mixed = Paragraph::new(
            0,
            vec![
                Inline::Run(Run::new("where ")),
                Inline::Math(MathNode::Run("x".into())),
            ],
        );
        assert!(!mixed.is_formula_only());
    }
}
