//! Per-file pipeline: flatten, classify, resolve titles, compute hints.

use crate::block::{Block, ConvertedDeck, Slide};
use crate::classify::{take_title, SlideClassifier};
use crate::columns::detect_columns;
use crate::context::ConversionContext;
use crate::flatten::flatten_shapes;
use crate::layout::compute_hints;
use crate::media::ImageStore;
use crate::types::{emu_to_px, Deck, SourceSlide};

/// Convert a parsed deck into the block model.
///
/// Content-level problems are logged and degraded; this never fails.
pub fn convert_deck(
    deck: &Deck,
    ctx: &mut ConversionContext<'_>,
    images: &mut dyn ImageStore,
) -> ConvertedDeck {
    let mut converted = ConvertedDeck {
        filename: deck.filename.clone(),
        slide_width_px: emu_to_px(deck.slide_width).max(0) as u32,
        slide_height_px: emu_to_px(deck.slide_height).max(0) as u32,
        slides: Vec::new(),
    };

    for source in &deck.slides {
        if ctx.config.page.is_some_and(|page| page != source.number) {
            continue;
        }
        converted.slides.push(convert_slide(deck, source, ctx, images));
    }

    if let Some(page) = ctx.config.page {
        if converted.slides.is_empty() {
            log::warn!(
                "Page {} not found in {} ({} slides)",
                page,
                deck.filename,
                deck.slides.len()
            );
        }
    }
    log::info!("Converted {} slides from {}", converted.slides.len(), deck.filename);
    converted
}

/// Convert one slide.
pub fn convert_slide(
    deck: &Deck,
    source: &SourceSlide,
    ctx: &mut ConversionContext<'_>,
    images: &mut dyn ImageStore,
) -> Slide {
    log::debug!("Converting slide {}", source.number);
    let config = ctx.config;
    let (title, shapes) = take_title(flatten_shapes(&source.shapes));

    let mut slide = Slide::new(source.number);
    if let Some(heading) = ctx.resolve_title(source.number, title.as_deref()) {
        slide.blocks.push(Block::Heading(heading));
    }

    let mut classifier = SlideClassifier::new(config, deck, images, source.number);
    let layout = if config.detect_columns {
        detect_columns(&shapes, deck.slide_width)
    } else {
        None
    };
    match layout {
        Some(layout) => {
            slide.blocks.extend(classifier.classify(&layout.preface));
            slide.columns = layout
                .columns
                .iter()
                .map(|column| classifier.classify(column))
                .filter(|blocks| !blocks.is_empty())
                .collect();
        }
        None => slide.blocks.extend(classifier.classify(&shapes)),
    }

    if config.notes {
        if let Some(notes) = source.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            slide.blocks.push(Block::Note(notes.to_string()));
        }
    }

    slide.hints = compute_hints(&slide);
    slide
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Heading;
    use crate::config::ConversionConfig;
    use crate::media::NoImages;
    use crate::titles::TitleOutline;
    use crate::types::{Inline, Paragraph, Placeholder, Rect, Run, Shape, ShapeKind};

    fn text(id: u32, top: i64, value: &str) -> Shape {
        Shape::new(id, ShapeKind::Text(vec![Paragraph::new(0, vec![Inline::Run(Run::new(value))])]))
            .with_bounds(Rect::new(0, top, 1000, 100))
    }

    fn titled_slide(number: usize, title: &str, body: &str) -> SourceSlide {
        let mut slide = SourceSlide::new(number);
        slide.shapes.push(text(1, 0, title).with_placeholder(Placeholder::Title));
        slide.shapes.push(text(2, 500, body));
        slide
    }

    fn headings(deck: &ConvertedDeck) -> Vec<Heading> {
        deck.slides
            .iter()
            .flat_map(|s| s.blocks.iter())
            .filter_map(|b| match b {
                Block::Heading(h) => Some(h.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_converted_deck_serializes_to_json() {
        let mut deck = Deck::new("talk.pptx");
        deck.add_slide(titled_slide(1, "Intro", "hello"));
        let config = ConversionConfig::default();
        let mut ctx = ConversionContext::new(&config, None);
        let converted = convert_deck(&deck, &mut ctx, &mut NoImages);

        let value = serde_json::to_value(&converted).unwrap();
        assert_eq!(value["filename"], "talk.pptx");
        assert_eq!(value["slide_width_px"], 1280);
        assert_eq!(value["slides"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_repeated_results_yield_one_heading() {
        let mut deck = Deck::new("talk.pptx");
        deck.add_slide(titled_slide(1, "Results", "first"));
        deck.add_slide(titled_slide(2, "Results", "second"));

        let config = ConversionConfig::default();
        let mut ctx = ConversionContext::new(&config, None);
        let converted = convert_deck(&deck, &mut ctx, &mut NoImages);
        assert_eq!(headings(&converted), vec![Heading::new(1, "Results")]);
        assert_eq!(converted.slides.len(), 2);
    }

    #[test]
    fn test_outline_assigns_depths() {
        let mut deck = Deck::new("talk.pptx");
        deck.add_slide(titled_slide(1, "Heading 1", "a"));
        deck.add_slide(titled_slide(2, "Heading 1.1", "b"));
        deck.add_slide(titled_slide(3, "Heading 1.1.1", "c"));

        let outline = TitleOutline::parse("Heading 1\n  Heading 1.1\n    Heading 1.1.1");
        let config = ConversionConfig::default();
        let mut ctx = ConversionContext::new(&config, Some(&outline));
        let converted = convert_deck(&deck, &mut ctx, &mut NoImages);
        let levels: Vec<usize> = headings(&converted).iter().map(|h| h.level).collect();
        assert_eq!(levels, vec![1, 2, 3]);
    }

    #[test]
    fn test_page_filter_keeps_one_slide() {
        let mut deck = Deck::new("talk.pptx");
        deck.add_slide(titled_slide(1, "One", "a"));
        deck.add_slide(titled_slide(2, "Two", "b"));

        let config = ConversionConfig::default().with_page(Some(2));
        let mut ctx = ConversionContext::new(&config, None);
        let converted = convert_deck(&deck, &mut ctx, &mut NoImages);
        assert_eq!(converted.slides.len(), 1);
        assert_eq!(converted.slides[0].number, 2);
    }

    #[test]
    fn test_notes_appended_last_and_toggle() {
        let mut source = titled_slide(1, "T", "body");
        source.notes = Some("  say this  ".into());
        let mut deck = Deck::new("talk.pptx");
        deck.add_slide(source);

        let config = ConversionConfig::default();
        let mut ctx = ConversionContext::new(&config, None);
        let converted = convert_deck(&deck, &mut ctx, &mut NoImages);
        assert_eq!(
            converted.slides[0].blocks.last(),
            Some(&Block::Note("say this".into()))
        );

        let config = ConversionConfig::default().with_notes(false);
        let mut ctx = ConversionContext::new(&config, None);
        let converted = convert_deck(&deck, &mut ctx, &mut NoImages);
        assert_eq!(converted.slides[0].notes().count(), 0);
    }

    #[test]
    fn test_monospace_slide_becomes_single_code_block() {
        let code = "let total = items.iter().sum::<u32>();";
        let shape = Shape::new(
            1,
            ShapeKind::Text(vec![Paragraph::new(
                0,
                vec![
                    Inline::Run(Run::new(code).with_font("Consolas")),
                    Inline::Run(Run::new(" ok")),
                ],
            )]),
        );
        let mut source = SourceSlide::new(1);
        source.shapes.push(shape);
        let mut deck = Deck::new("talk.pptx");
        deck.add_slide(source);

        let config = ConversionConfig::default();
        let mut ctx = ConversionContext::new(&config, None);
        let converted = convert_deck(&deck, &mut ctx, &mut NoImages);
        let blocks = &converted.slides[0].blocks;
        assert_eq!(blocks.len(), 1);
        assert!(matches!(blocks[0], Block::Code(_)));
    }

    #[test]
    fn test_source_columns_when_enabled() {
        let mut source = SourceSlide::new(1);
        source.shapes.push(text(1, 0, "Title").with_placeholder(Placeholder::Title));
        source.shapes.push(
            text(2, 1000, "left column").with_bounds(Rect::new(0, 1000, 4_000_000, 2_000_000)),
        );
        source.shapes.push(
            text(3, 1000, "right column")
                .with_bounds(Rect::new(6_000_000, 1000, 4_000_000, 2_000_000)),
        );
        let mut deck = Deck::new("talk.pptx");
        deck.add_slide(source);

        let config = ConversionConfig::default().with_detect_columns(true);
        let mut ctx = ConversionContext::new(&config, None);
        let converted = convert_deck(&deck, &mut ctx, &mut NoImages);
        let slide = &converted.slides[0];
        assert_eq!(slide.columns.len(), 2);
        assert!(!slide.hints.column_split);
        assert!(matches!(slide.blocks[0], Block::Heading(_)));
    }
}
