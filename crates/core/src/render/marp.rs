//! Marp slide decks: markdown slides on a CSS grid.

use regex::Regex;
use std::sync::LazyLock;

use super::markdown::HTML_TAG;
use super::{
    fenced_code, grid_cells, pipe_table, quoted_picture_path, wrap_core, InlineMarkup, Renderer,
    SlideParts,
};
use crate::block::{
    Block, ConvertedDeck, FormulaDisplay, Picture, ScalingClass, Slide, SpanColor, ACCENT_PALETTE,
};
use crate::config::ConversionConfig;

/// Width pictures are scaled to.
pub const MARP_TARGET_WIDTH: u32 = 1280;

/// Source width assumed when the deck does not report one.
const FALLBACK_SLIDE_WIDTH: u32 = 1600;

static MARP_RESERVED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([|*`])").unwrap());

const FRONT_MATTER: &str = "---\nmarp: true\ntheme: default\npaginate: true\nhtml: true\n---\n\n";

const BASE_CSS: &str = r#"section.small { font-size: 24px; }
section.smaller { font-size: 20px; }
section.smallest { font-size: 18px; }
img[alt~="center"] { display: block; margin: 0 auto; }
img[alt~="left"] { float: left; margin-right: 1em; margin-bottom: 0.5em; }
img[alt~="right"] { float: right; margin-left: 1em; margin-bottom: 0.5em; }
.columns { display: grid; grid-template-columns: repeat(2, 1fr); gap: 2em; }
.columns > div { overflow: hidden; }"#;

pub fn escape_marp(text: &str) -> String {
    let escaped = MARP_RESERVED.replace_all(text, r"\$1");
    HTML_TAG.replace_all(&escaped, r"\$1").into_owned()
}

/// Note text that cannot close the surrounding HTML comment: consecutive
/// hyphens are separated by a space.
fn comment_safe(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous = None;
    for ch in text.chars() {
        if ch == '-' && previous == Some('-') {
            out.push(' ');
        }
        out.push(ch);
        previous = Some(ch);
    }
    out
}

/// Slide class directive for a scaling class.
pub fn scaling_class(scaling: ScalingClass) -> Option<&'static str> {
    match scaling {
        ScalingClass::Normal => None,
        ScalingClass::Reduced => Some("small"),
        ScalingClass::Minimal => Some("smaller"),
    }
}

fn header() -> String {
    let mut css = String::from(BASE_CSS);
    for (index, (r, g, b)) in ACCENT_PALETTE.iter().enumerate() {
        css.push_str(&format!(
            "\n.accent{} {{ color: #{:02X}{:02X}{:02X}; }}",
            index + 1,
            r,
            g,
            b
        ));
    }
    format!("{}<style>\n{}\n</style>\n\n", FRONT_MATTER, css)
}

pub struct MarpRenderer<'a> {
    config: &'a ConversionConfig,
}

impl<'a> MarpRenderer<'a> {
    pub fn new(config: &'a ConversionConfig) -> Self {
        Self { config }
    }

    fn slide(&self, out: &mut String, slide: &Slide, scale: f64) {
        let parts = SlideParts::new(slide);
        if let Some(class) = scaling_class(slide.hints.scaling) {
            out.push_str(&format!("<!-- _class: {} -->\n\n", class));
        }
        if let Some(heading) = parts.heading {
            out.push_str(&format!(
                "{} {}\n\n",
                "#".repeat(heading.level.max(1)),
                self.escape(&heading.text)
            ));
        }
        for picture in &parts.floated {
            out.push_str(&self.picture(picture, scale));
        }
        self.blocks(out, &parts.body, scale);

        if !parts.columns.is_empty() {
            match parts.columns.len() {
                2 => out.push_str("<div class=\"columns\">\n"),
                n => out.push_str(&format!(
                    "<div class=\"columns\" style=\"grid-template-columns: repeat({}, 1fr);\">\n",
                    n
                )),
            }
            for column in &parts.columns {
                out.push_str("<div>\n\n");
                self.blocks(out, column, scale);
                out.push_str("</div>\n");
            }
            out.push_str("</div>\n\n");
        }

        if !parts.notes.is_empty() {
            out.push_str("<!--\n");
            for line in &parts.notes {
                out.push_str(&comment_safe(line));
                out.push('\n');
            }
            out.push_str("-->\n\n");
        }
    }

    fn blocks(&self, out: &mut String, blocks: &[Block], scale: f64) {
        for block in blocks {
            self.block(out, block, scale);
        }
    }

    fn block(&self, out: &mut String, block: &Block, scale: f64) {
        match block {
            Block::Heading(heading) => out.push_str(&format!(
                "{} {}\n\n",
                "#".repeat(heading.level.max(1)),
                self.escape(&heading.text)
            )),
            Block::Paragraph(spans) => {
                let text = self.spans(spans);
                if !text.is_empty() {
                    out.push_str(&text);
                    out.push_str("\n\n");
                }
            }
            Block::List(items) => {
                for item in items {
                    out.push_str(&"  ".repeat(item.depth));
                    out.push_str("* ");
                    out.push_str(&self.spans(&item.spans));
                    out.push('\n');
                }
                out.push('\n');
            }
            Block::Table(table) => {
                let rows = grid_cells(table, |spans| self.spans(spans));
                out.push_str(&pipe_table(&rows, ":-:"));
            }
            Block::Picture(picture) => out.push_str(&self.picture(picture, scale)),
            Block::Formula(formula) => {
                let markup = match formula.display {
                    FormulaDisplay::Block => wrap_core(&formula.markup, "$$", "$$"),
                    FormulaDisplay::Inline => self.math(&formula.markup),
                };
                out.push_str(&markup);
                out.push_str("\n\n");
            }
            Block::Code(code) => out.push_str(&fenced_code(code)),
            Block::Note(_) => {}
        }
    }

    /// Image with position, alt text and `w:` sizing keywords in its alt.
    fn picture(&self, picture: &Picture, scale: f64) -> String {
        let mut width = (f64::from(picture.display_size.0) * scale).round() as u32;
        if let Some(cap) = self.config.image_width {
            width = if width == 0 { cap } else { width.min(cap) };
        }

        let mut keywords = vec![picture.position.as_str().to_string()];
        if !picture.alt.is_empty() {
            keywords.push(self.escape(&picture.alt).replace(['[', ']'], ""));
        }
        if width > 0 {
            keywords.push(format!("w:{}px", width));
        }
        format!("![{}]({})\n\n", keywords.join(" "), quoted_picture_path(picture))
    }
}

impl InlineMarkup for MarpRenderer<'_> {
    fn config(&self) -> &ConversionConfig {
        self.config
    }

    fn escape_reserved(&self, text: &str) -> String {
        escape_marp(text)
    }

    fn strong(&self, text: &str) -> String {
        wrap_core(text, "**", "**")
    }

    fn accent(&self, text: &str) -> String {
        wrap_core(text, "*", "*")
    }

    fn color(&self, text: &str, color: SpanColor) -> String {
        match color {
            SpanColor::Accent(n) => format!("<span class=\"accent{}\">{}</span>", n, text),
            SpanColor::Rgb(..) => format!("<span style=\"color:{}\">{}</span>", color.hex(), text),
        }
    }

    fn link(&self, text: &str, url: &str) -> String {
        format!("[{}]({})", text, url)
    }
}

impl Renderer for MarpRenderer<'_> {
    fn render(&self, deck: &ConvertedDeck) -> String {
        let source_width = match deck.slide_width_px {
            0 => FALLBACK_SLIDE_WIDTH,
            width => width,
        };
        let scale = f64::from(MARP_TARGET_WIDTH) / f64::from(source_width);

        let mut out = header();
        for (index, slide) in deck.slides.iter().enumerate() {
            if index > 0 {
                out.push_str("\n---\n\n");
            }
            self.slide(&mut out, slide, scale);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Heading, Position, SlideLayoutHints, Span, SpanStyle};
    use crate::render::tests::{deck, item, picture};

    fn render(config: &ConversionConfig, slides: Vec<Slide>) -> String {
        MarpRenderer::new(config).render(&deck(slides))
    }

    fn body(out: &str) -> &str {
        out.split("</style>\n\n").nth(1).unwrap_or("")
    }

    #[test]
    fn test_header_defines_classes_and_grid() {
        let out = render(&ConversionConfig::default(), Vec::new());
        assert!(out.starts_with("---\nmarp: true\n"));
        assert!(out.contains("section.smaller"));
        assert!(out.contains(".accent1 { color: #4472C4; }"));
        assert!(out.contains(".columns { display: grid;"));
    }

    #[test]
    fn test_title_then_floats_then_content() {
        let mut slide = Slide::new(1);
        slide.blocks = vec![
            Block::Heading(Heading::new(1, "Chart")),
            Block::Paragraph(vec![Span::plain("text")]),
            Block::Picture(picture("img/c.png", Position::Right, 400)),
        ];
        let out = render(&ConversionConfig::default(), vec![slide]);
        assert_eq!(
            body(&out),
            "# Chart\n\n![right chart w:400px](img/c.png)\n\ntext\n\n"
        );
    }

    #[test]
    fn test_dense_slide_gets_class_and_columns() {
        let mut slide = Slide::new(1);
        slide.blocks = vec![Block::List(vec![item(0, "a"), item(0, "b"), item(0, "c")])];
        slide.hints = SlideLayoutHints {
            density: 1.6,
            scaling: ScalingClass::Reduced,
            column_split: true,
            column_count: 2,
        };
        let out = render(&ConversionConfig::default(), vec![slide]);
        assert_eq!(
            body(&out),
            "<!-- _class: small -->\n\n<div class=\"columns\">\n<div>\n\n* a\n* b\n\n</div>\n<div>\n\n* c\n\n</div>\n</div>\n\n"
        );
    }

    #[test]
    fn test_notes_comment_and_separator() {
        let mut first = Slide::new(1);
        first.blocks = vec![Block::Note("say it".into())];
        let second = Slide::new(2);
        let out = render(&ConversionConfig::default(), vec![first, second]);
        assert_eq!(body(&out), "<!--\nsay it\n-->\n\n\n---\n\n");
    }

    #[test]
    fn test_note_cannot_close_comment() {
        let mut slide = Slide::new(1);
        slide.blocks = vec![Block::Note("a --> b\n--- c".into())];
        let out = render(&ConversionConfig::default(), vec![slide]);
        let body = body(&out);
        assert_eq!(body.matches("-->").count(), 1);
        assert_eq!(body, "<!--\na - -> b\n- - - c\n-->\n\n");
    }

    #[test]
    fn test_picture_width_scales_to_target() {
        let mut converted = deck(Vec::new());
        converted.slide_width_px = 2560;
        let mut slide = Slide::new(1);
        slide.blocks = vec![Block::Picture(picture("p.png", Position::Center, 1000))];
        converted.slides.push(slide);
        let out = MarpRenderer::new(&ConversionConfig::default()).render(&converted);
        assert!(out.contains("![center chart w:500px](p.png)"));
    }

    #[test]
    fn test_accent_color_uses_class() {
        let style = SpanStyle {
            color: Some(SpanColor::Accent(3)),
            ..SpanStyle::default()
        };
        let config = ConversionConfig::default();
        let renderer = MarpRenderer::new(&config);
        assert_eq!(
            renderer.spans(&[Span::styled("hi", style)]),
            "<span class=\"accent3\">hi</span>"
        );
    }
}
