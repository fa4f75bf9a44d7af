//! Block classification: turns ordered leaf shapes into typed blocks.
//!
//! Per shape:
//! - Title placeholders are split off first (see [`take_title`])
//! - Text shapes become paragraphs, lists, code blocks or block formulas
//! - Tables keep merged cells once, at their origin
//! - Pictures go through an [`ImageStore`]; failures degrade to placeholders

use crate::block::{
    Block, Cell, CodeBlock, Formula, FormulaDisplay, ListItem, Picture, PictureSource, Span,
    SpanColor, SpanStyle, Table,
};
use crate::config::ConversionConfig;
use crate::formula::to_latex;
use crate::image_hints::derive_hints;
use crate::media::{ImageStore, PictureRequest};
use crate::normalize::{flatten_whitespace, normalize_run_text, visible_len};
use crate::types::{
    Deck, Inline, Paragraph, PictureRef, Run, RunColor, Shape, ShapeKind, TableGrid, ThemeColor,
};

/// Split the slide title off a reading-ordered shape list.
///
/// The first title placeholder with non-empty text supplies the title. Any
/// further title placeholders stay in the list and are treated as content.
pub fn take_title(shapes: Vec<Shape>) -> (Option<String>, Vec<Shape>) {
    let position = shapes.iter().position(|shape| {
        shape.is_title()
            && matches!(&shape.kind, ShapeKind::Text(paragraphs) if !shape_text(paragraphs).trim().is_empty())
    });

    match position {
        Some(index) => {
            let mut shapes = shapes;
            let title = shapes.remove(index);
            let text = match &title.kind {
                ShapeKind::Text(paragraphs) => shape_text(paragraphs),
                _ => String::new(),
            };
            (Some(flatten_whitespace(text.trim())), shapes)
        }
        None => (None, shapes),
    }
}

/// Text of all paragraphs, one line per paragraph.
fn shape_text(paragraphs: &[Paragraph]) -> String {
    paragraphs
        .iter()
        .map(|p| normalize_run_text(&p.text()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Classifies the shapes of one slide.
pub struct SlideClassifier<'a> {
    config: &'a ConversionConfig,
    deck: &'a Deck,
    images: &'a mut dyn ImageStore,
    slide: usize,
}

impl<'a> SlideClassifier<'a> {
    pub fn new(
        config: &'a ConversionConfig,
        deck: &'a Deck,
        images: &'a mut dyn ImageStore,
        slide: usize,
    ) -> Self {
        Self {
            config,
            deck,
            images,
            slide,
        }
    }

    /// Classify reading-ordered leaf shapes into blocks.
    pub fn classify(&mut self, shapes: &[Shape]) -> Vec<Block> {
        let mut blocks = Vec::new();
        for shape in shapes {
            match &shape.kind {
                ShapeKind::Text(paragraphs) => {
                    if self.admits(shape, paragraphs) {
                        blocks.extend(self.text_blocks(paragraphs));
                    } else {
                        log::debug!(
                            "Slide {}: dropping text shape {} below minimum block size",
                            self.slide,
                            shape.id
                        );
                    }
                }
                ShapeKind::Table(grid) => {
                    if let Some(table) = self.table_block(grid) {
                        blocks.push(Block::Table(table));
                    }
                }
                ShapeKind::Picture(picture) => blocks.push(self.picture_block(shape, picture)),
                ShapeKind::Group { .. } => {
                    log::debug!("Slide {}: unexpanded group {} skipped", self.slide, shape.id)
                }
                ShapeKind::Other => {}
            }
        }
        blocks
    }

    /// Body placeholders are always admitted; other text shapes need at
    /// least `min_block_size` characters.
    fn admits(&self, shape: &Shape, paragraphs: &[Paragraph]) -> bool {
        if shape.is_body_placeholder() {
            return true;
        }
        let chars: usize = paragraphs
            .iter()
            .map(|p| normalize_run_text(&p.text()).trim().chars().count())
            .sum();
        chars >= self.config.min_block_size
    }

    fn text_blocks(&self, paragraphs: &[Paragraph]) -> Vec<Block> {
        if is_code_shape(paragraphs) {
            return code_block(paragraphs).into_iter().map(Block::Code).collect();
        }

        let paragraphs: Vec<&Paragraph> = paragraphs
            .iter()
            .filter(|p| {
                !p.text().trim().is_empty()
                    || p.content.iter().any(|i| matches!(i, Inline::Math(_)))
            })
            .collect();
        let Some(min_level) = paragraphs.iter().map(|p| p.level).min() else {
            return Vec::new();
        };
        let uniform = paragraphs.iter().all(|p| p.level == min_level);

        let mut blocks = Vec::new();
        let mut items: Vec<ListItem> = Vec::new();
        for paragraph in paragraphs {
            if paragraph.is_formula_only() {
                flush_list(&mut items, &mut blocks);
                blocks.push(Block::Formula(block_formula(paragraph)));
                continue;
            }
            let spans = inline_spans(paragraph, self.config.color);
            if uniform {
                blocks.push(Block::Paragraph(spans));
            } else {
                let wanted = paragraph.level - min_level;
                let depth = match items.last() {
                    None => 0,
                    Some(previous) => wanted.clamp(previous.depth.saturating_sub(1), previous.depth + 1),
                };
                items.push(ListItem { depth, spans });
            }
        }
        flush_list(&mut items, &mut blocks);
        blocks
    }

    fn table_block(&self, grid: &TableGrid) -> Option<Table> {
        let columns = grid.rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return None;
        }
        let rows = grid
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(_, cell)| !cell.is_covered())
                    .map(|(column, cell)| {
                        let mut spans = Vec::new();
                        for (i, paragraph) in cell.paragraphs.iter().enumerate() {
                            if i > 0 {
                                spans.push(Span::plain("\n"));
                            }
                            spans.extend(inline_spans(paragraph, self.config.color));
                        }
                        Cell {
                            column,
                            row_span: cell.row_span.max(1),
                            col_span: cell.col_span.max(1),
                            spans,
                        }
                    })
                    .collect()
            })
            .collect();
        Some(Table { columns, rows })
    }

    fn picture_block(&mut self, shape: &Shape, picture: &PictureRef) -> Block {
        let hints = derive_hints(&shape.bounds, &picture.crop, self.deck.slide_width);
        let placeholder_name = picture
            .media
            .rsplit('/')
            .next()
            .unwrap_or(&picture.media)
            .to_string();

        let mut block = Picture {
            source: PictureSource::Placeholder(placeholder_name),
            alt: picture.alt.trim().to_string(),
            crop: hints.crop,
            natural_size: None,
            display_size: hints.display_size,
            left_px: hints.left_px,
            position: hints.position,
        };

        if !self.config.extract_images {
            return Block::Picture(block);
        }

        let Some(data) = self.deck.media.get(&picture.media) else {
            log::warn!(
                "Picture {} in slide {} has no image data ({}), using a placeholder",
                shape.id,
                self.slide,
                picture.media
            );
            return Block::Picture(block);
        };

        let request = PictureRequest {
            stem: self.deck.stem(),
            slide: self.slide,
            shape_id: shape.id,
            media: &picture.media,
            data,
            crop: hints.crop,
        };
        match self.images.store(&request) {
            Ok(stored) => {
                block.source = PictureSource::Extracted(stored.path);
                block.natural_size = stored.pixel_size;
            }
            Err(e) => log::warn!(
                "Failed to store picture {} in slide {}: {}",
                shape.id,
                self.slide,
                e
            ),
        }
        Block::Picture(block)
    }
}

fn flush_list(items: &mut Vec<ListItem>, blocks: &mut Vec<Block>) {
    if !items.is_empty() {
        blocks.push(Block::List(std::mem::take(items)));
    }
}

fn block_formula(paragraph: &Paragraph) -> Formula {
    let markup = paragraph
        .content
        .iter()
        .find_map(|inline| match inline {
            Inline::Math(node) => Some(to_latex(node)),
            Inline::Run(_) => None,
        })
        .unwrap_or_default();
    Formula {
        markup,
        display: FormulaDisplay::Block,
    }
}

/// Whether more than half of the shape's non-whitespace run characters use a
/// monospace typeface.
pub fn is_code_shape(paragraphs: &[Paragraph]) -> bool {
    let mut total = 0;
    let mut monospace = 0;
    for run in paragraphs.iter().flat_map(runs) {
        let visible = visible_len(&run.text);
        total += visible;
        if run.is_monospace() {
            monospace += visible;
        }
    }
    total > 0 && monospace * 2 > total
}

fn runs(paragraph: &Paragraph) -> impl Iterator<Item = &Run> {
    paragraph.content.iter().filter_map(|inline| match inline {
        Inline::Run(run) => Some(run),
        Inline::Math(_) => None,
    })
}

/// Code lines, one or more per paragraph, with outer blank lines trimmed.
fn code_block(paragraphs: &[Paragraph]) -> Option<CodeBlock> {
    let mut lines: Vec<String> = paragraphs
        .iter()
        .flat_map(|p| {
            normalize_run_text(&p.text())
                .split('\n')
                .map(|line| line.trim_end().to_string())
                .collect::<Vec<_>>()
        })
        .collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    let first = lines.iter().position(|l| !l.trim().is_empty())?;
    lines.drain(..first);
    Some(CodeBlock {
        lines,
        language: None,
    })
}

/// Styled spans of one paragraph.
pub fn inline_spans(paragraph: &Paragraph, color: bool) -> Vec<Span> {
    paragraph
        .content
        .iter()
        .filter_map(|inline| match inline {
            Inline::Run(run) if run.text.is_empty() => None,
            Inline::Run(run) => Some(Span::styled(normalize_run_text(&run.text), run_style(run, color))),
            Inline::Math(node) => Some(Span::styled(
                to_latex(node),
                SpanStyle {
                    math: true,
                    ..SpanStyle::default()
                },
            )),
        })
        .collect()
}

fn run_style(run: &Run, color: bool) -> SpanStyle {
    let mut style = SpanStyle {
        strong: run.bold,
        accent: run.italic || run.underline,
        code: run.is_monospace(),
        hyperlink: run.hyperlink.clone(),
        ..SpanStyle::default()
    };
    if color {
        match run.color {
            Some(RunColor::Theme(theme)) if theme.is_dark() => style.strong = true,
            Some(RunColor::Theme(ThemeColor::Accent(n))) => style.color = Some(SpanColor::Accent(n)),
            Some(RunColor::Rgb(r, g, b)) => style.color = Some(SpanColor::Rgb(r, g, b)),
            Some(RunColor::Theme(_)) | None => {}
        }
    }
    style
}
