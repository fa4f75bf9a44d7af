//! Semantic block model emitted to renderers.

use serde::{Deserialize, Serialize};

/// A fully converted deck, ready for rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvertedDeck {
    /// Original filename (without path).
    pub filename: String,

    /// Source slide width in pixels.
    pub slide_width_px: u32,

    /// Source slide height in pixels.
    pub slide_height_px: u32,

    pub slides: Vec<Slide>,
}

/// One converted slide.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Slide {
    /// 1-based slide number in the source deck.
    pub number: usize,

    /// Blocks in reading order. For multi-column slides this is the
    /// full-width preface.
    pub blocks: Vec<Block>,

    /// Column contents of a slide laid out in columns at the source.
    /// Empty for ordinary slides.
    pub columns: Vec<Vec<Block>>,

    pub hints: SlideLayoutHints,
}

impl Slide {
    pub fn new(number: usize) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    /// Whether the source laid this slide out in columns.
    pub fn is_multi_column(&self) -> bool {
        !self.columns.is_empty()
    }

    /// The heading block, if the slide kept one.
    pub fn heading(&self) -> Option<&Heading> {
        self.blocks.iter().find_map(|block| match block {
            Block::Heading(heading) => Some(heading),
            _ => None,
        })
    }

    /// All blocks, preface first, then columns left to right.
    pub fn all_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().chain(self.columns.iter().flatten())
    }

    /// Presenter notes blocks.
    pub fn notes(&self) -> impl Iterator<Item = &str> {
        self.all_blocks().filter_map(|block| match block {
            Block::Note(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

/// The semantic unit emitted to renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    Heading(Heading),
    Paragraph(Vec<Span>),
    List(Vec<ListItem>),
    Table(Table),
    Picture(Picture),
    Formula(Formula),
    Code(CodeBlock),
    Note(String),
}

impl Block {
    /// Short kind name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Heading(_) => "heading",
            Block::Paragraph(_) => "paragraph",
            Block::List(_) => "list",
            Block::Table(_) => "table",
            Block::Picture(_) => "picture",
            Block::Formula(_) => "formula",
            Block::Code(_) => "code",
            Block::Note(_) => "note",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// 1-based heading depth.
    pub level: usize,
    pub text: String,
}

impl Heading {
    pub fn new(level: usize, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    /// 0-based nesting depth.
    pub depth: usize,
    pub spans: Vec<Span>,
}

/// A styled text fragment of a block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: SpanStyle::default(),
        }
    }

    pub fn styled(text: impl Into<String>, style: SpanStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// Concatenated text of a span sequence.
pub fn spans_text(spans: &[Span]) -> String {
    spans.iter().map(|span| span.text.as_str()).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanStyle {
    pub strong: bool,
    pub accent: bool,
    /// Inline code span.
    pub code: bool,
    /// Inline formula; `text` holds formula markup.
    pub math: bool,
    pub color: Option<SpanColor>,
    pub hyperlink: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanColor {
    /// Theme accent 1 through 6.
    Accent(u8),
    Rgb(u8, u8, u8),
}

/// Default Office theme accent palette, accent 1 through 6.
pub const ACCENT_PALETTE: [(u8, u8, u8); 6] = [
    (0x44, 0x72, 0xC4),
    (0xED, 0x7D, 0x31),
    (0xA5, 0xA5, 0xA5),
    (0xFF, 0xC0, 0x00),
    (0x5B, 0x9B, 0xD5),
    (0x70, 0xAD, 0x47),
];

impl SpanColor {
    /// RGB components; theme accents resolve through [`ACCENT_PALETTE`].
    pub fn rgb(&self) -> (u8, u8, u8) {
        match *self {
            SpanColor::Rgb(r, g, b) => (r, g, b),
            SpanColor::Accent(n) => {
                let index = usize::from(n.clamp(1, 6)) - 1;
                ACCENT_PALETTE[index]
            }
        }
    }

    /// `#RRGGBB` form.
    pub fn hex(&self) -> String {
        let (r, g, b) = self.rgb();
        format!("#{:02X}{:02X}{:02X}", r, g, b)
    }
}

/// A table. Merged cells appear once, at their origin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Number of grid columns, including positions covered by spans.
    pub columns: usize,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Expand one row to a full grid row, padding covered positions with
    /// `None`. Positions covered from a previous row are `None` as well.
    pub fn grid_row<'a>(&self, row: &'a [Cell]) -> Vec<Option<&'a Cell>> {
        let mut out = vec![None; self.columns];
        for cell in row {
            if let Some(slot) = out.get_mut(cell.column) {
                *slot = Some(cell);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Grid column of the cell's origin.
    pub column: usize,
    pub row_span: usize,
    pub col_span: usize,
    pub spans: Vec<Span>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Picture {
    pub source: PictureSource,
    pub alt: String,
    /// Applied (or, when not applied, pending) crop.
    pub crop: crate::image_hints::CropBox,
    /// Pixel size of the stored bitmap after cropping, when known.
    pub natural_size: Option<(u32, u32)>,
    /// Size of the picture frame on the slide in pixels.
    pub display_size: (u32, u32),
    /// Left edge of the frame in pixels.
    pub left_px: i64,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PictureSource {
    /// Written to the image directory; path is relative to the document.
    Extracted(String),
    /// Not written; carries the media name for a placeholder reference.
    Placeholder(String),
}

/// Horizontal placement class of a picture, by thirds of slide width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    Left,
    Center,
    Right,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Left => "left",
            Position::Center => "center",
            Position::Right => "right",
        }
    }

    pub fn is_floated(&self) -> bool {
        !matches!(self, Position::Center)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    pub markup: String,
    pub display: FormulaDisplay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormulaDisplay {
    Inline,
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub lines: Vec<String>,
    pub language: Option<String>,
}

/// Per-slide layout annotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlideLayoutHints {
    pub density: f64,
    pub scaling: ScalingClass,
    pub column_split: bool,
    /// 1, or 2 when `column_split` is set.
    pub column_count: usize,
}

impl Default for SlideLayoutHints {
    fn default() -> Self {
        Self {
            density: 0.0,
            scaling: ScalingClass::Normal,
            column_split: false,
            column_count: 1,
        }
    }
}

/// Ordinal font-scaling class derived from density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScalingClass {
    Normal,
    Reduced,
    Minimal,
}

impl ScalingClass {
    /// One step toward `Normal`.
    pub fn relaxed(self) -> Self {
        match self {
            ScalingClass::Minimal => ScalingClass::Reduced,
            ScalingClass::Reduced | ScalingClass::Normal => ScalingClass::Normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_row_pads_covered_positions() {
        let table = Table {
            columns: 3,
            rows: vec![vec![
                Cell {
                    column: 0,
                    row_span: 1,
                    col_span: 2,
                    spans: vec![Span::plain("wide")],
                },
                Cell {
                    column: 2,
                    row_span: 1,
                    col_span: 1,
                    spans: vec![Span::plain("c")],
                },
            ]],
        };
        let grid = table.grid_row(&table.rows[0]);
        assert_eq!(grid.len(), 3);
        assert!(grid[0].is_some());
        assert!(grid[1].is_none());
        assert_eq!(grid[2].map(|c| c.column), Some(2));
    }

    #[test]
    fn test_grid_row_borrows_from_row() {
        let row = vec![Cell {
            column: 1,
            row_span: 1,
            col_span: 1,
            spans: vec![Span::plain("b")],
        }];
        let grid = {
            let table = Table {
                columns: 2,
                rows: Vec::new(),
            };
            table.grid_row(&row)
        };
        assert!(grid[0].is_none());
        assert_eq!(grid[1].map(|c| spans_text(&c.spans)), Some("b".to_string()));
    }

    #[test]
    fn test_scaling_relaxes_one_step() {
        assert_eq!(ScalingClass::Minimal.relaxed(), ScalingClass::Reduced);
        assert_eq!(ScalingClass::Reduced.relaxed(), ScalingClass::Normal);
        assert_eq!(ScalingClass::Normal.relaxed(), ScalingClass::Normal);
    }

    #[test]
    fn test_span_color_hex() {
        assert_eq!(SpanColor::Rgb(255, 0, 16).hex(), "#FF0010");
        assert_eq!(SpanColor::Accent(2).hex(), "#ED7D31");
        assert_eq!(SpanColor::Accent(9).rgb(), ACCENT_PALETTE[5]);
    }

    #[test]
    fn test_notes_are_collected_from_all_blocks() {
        let mut slide = Slide::new(1);
        slide.blocks.push(Block::Heading(Heading::new(1, "T")));
        slide.blocks.push(Block::Note("remember".into()));
        assert_eq!(slide.notes().collect::<Vec<_>>(), vec!["remember"]);
        assert_eq!(slide.heading().map(|h| h.text.as_str()), Some("T"));
    }
}
