//! Markdown-family dialects: plain markdown, madoko and quarto reveal.js.

use regex::Regex;
use std::sync::LazyLock;

use super::{
    capped_width, fenced_code, grid_cells, note_lines, pipe_table, quoted_picture_path,
    wrap_core, InlineMarkup, Renderer,
};
use crate::block::{Block, ConvertedDeck, FormulaDisplay, Picture, Slide, SpanColor, Table};
use crate::config::ConversionConfig;

/// Characters with markdown meaning.
static MARKDOWN_RESERVED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\\*`!_{}\[\]()#+\-.|])").unwrap());

/// Anything that looks like an HTML tag.
pub(crate) static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(<[^>]+>)").unwrap());

/// Deepest heading Markdown recognizes.
const MAX_HEADING_LEVEL: usize = 6;

const QUARTO_HEADER: &str = r#"---
title: "Presentation Title"
author: "Author"
format:
  revealjs:
    slide-number: c/t
    width: 1600
    height: 900
    incremental: true
    theme: [simple]
---

"#;

/// Backslash-escape markdown syntax characters and HTML-looking tags.
pub fn escape_markdown(text: &str) -> String {
    let escaped = MARKDOWN_RESERVED.replace_all(text, r"\$1");
    HTML_TAG.replace_all(&escaped, r"\$1").into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Plain,
    Madoko,
    Quarto,
}

pub struct MarkdownRenderer<'a> {
    flavor: Flavor,
    config: &'a ConversionConfig,
}

impl<'a> MarkdownRenderer<'a> {
    pub fn new(flavor: Flavor, config: &'a ConversionConfig) -> Self {
        Self { flavor, config }
    }

    fn slide(&self, out: &mut String, slide: &Slide) {
        self.blocks(out, &slide.blocks);

        if slide.is_multi_column() {
            if self.flavor == Flavor::Quarto {
                let width = match slide.columns.len() {
                    2 => 50,
                    3 => 33,
                    n => (100.0 / n as f64).round() as u32,
                };
                out.push_str(":::: {.columns}\n\n");
                for column in &slide.columns {
                    out.push_str(&format!("::: {{.column width=\"{}%\"}}\n\n", width));
                    self.blocks(out, column);
                    out.push_str(":::\n\n");
                }
                out.push_str("::::\n\n");
            } else {
                for column in &slide.columns {
                    self.blocks(out, column);
                }
            }
        }

        let notes = note_lines(slide);
        if notes.is_empty() {
            return;
        }
        match self.flavor {
            Flavor::Quarto => {
                out.push_str("::: {.notes}\n\n");
                for line in notes {
                    out.push_str(&self.escape(line));
                    out.push_str("\n\n");
                }
                out.push_str(":::\n\n");
            }
            Flavor::Plain | Flavor::Madoko => {
                out.push_str("---\n\n");
                for line in notes {
                    out.push_str(&self.escape(line));
                    out.push_str("\n\n");
                }
            }
        }
    }

    fn blocks(&self, out: &mut String, blocks: &[Block]) {
        for block in blocks {
            self.block(out, block);
        }
    }

    fn block(&self, out: &mut String, block: &Block) {
        match block {
            Block::Heading(heading) => {
                out.push_str(&"#".repeat(heading.level.clamp(1, MAX_HEADING_LEVEL)));
                out.push(' ');
                out.push_str(&self.escape(&heading.text));
                out.push_str("\n\n");
            }
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
            Block::Table(table) => out.push_str(&self.table(table)),
            Block::Picture(picture) => out.push_str(&self.picture(picture)),
            Block::Formula(formula) => {
                let markup = match formula.display {
                    FormulaDisplay::Block => wrap_core(&formula.markup, "$$", "$$"),
                    FormulaDisplay::Inline => self.math(&formula.markup),
                };
                out.push_str(&markup);
                out.push_str("\n\n");
            }
            Block::Code(code) => out.push_str(&fenced_code(code)),
            // Notes follow the slide content.
            Block::Note(_) => {}
        }
    }

    fn table(&self, table: &Table) -> String {
        let rows = grid_cells(table, |spans| self.spans(spans));
        let alignment = match self.flavor {
            Flavor::Madoko => ":-",
            Flavor::Plain | Flavor::Quarto => ":-:",
        };
        pipe_table(&rows, alignment)
    }

    fn picture(&self, picture: &Picture) -> String {
        let path = quoted_picture_path(picture);
        let width = capped_width(picture, self.config);
        let alt = match (self.flavor, picture.alt.is_empty()) {
            (Flavor::Madoko, _) | (_, false) => self.escape(&picture.alt),
            (_, true) => "Image".to_string(),
        };
        match (self.flavor, width) {
            (_, None) => format!("![{}]({})\n\n", alt, path),
            (Flavor::Plain, Some(width)) => format!(
                "<img src=\"{}\" alt=\"{}\" style=\"max-width:{}px;\" />\n\n",
                path, alt, width
            ),
            (Flavor::Madoko | Flavor::Quarto, Some(width)) => {
                format!("![{}]({}){{width=\"{}px\"}}\n\n", alt, path, width)
            }
        }
    }
}

impl InlineMarkup for MarkdownRenderer<'_> {
    fn config(&self) -> &ConversionConfig {
        self.config
    }

    fn escape_reserved(&self, text: &str) -> String {
        escape_markdown(text)
    }

    fn strong(&self, text: &str) -> String {
        match self.flavor {
            Flavor::Quarto => wrap_core(text, "**", "**"),
            Flavor::Plain | Flavor::Madoko => wrap_core(text, "__", "__"),
        }
    }

    fn accent(&self, text: &str) -> String {
        wrap_core(text, "_", "_")
    }

    fn color(&self, text: &str, color: SpanColor) -> String {
        format!(" <span style=\"color:{}\">{}</span> ", color.hex(), text)
    }

    fn link(&self, text: &str, url: &str) -> String {
        format!("[{}]({})", text, url)
    }
}

impl Renderer for MarkdownRenderer<'_> {
    fn render(&self, deck: &ConvertedDeck) -> String {
        let mut out = String::new();
        match self.flavor {
            Flavor::Madoko => out.push_str("[TOC]\n\n"),
            Flavor::Quarto => out.push_str(QUARTO_HEADER),
            Flavor::Plain => {}
        }
        for (index, slide) in deck.slides.iter().enumerate() {
            if index > 0 && self.config.slide_delimiters {
                out.push_str("---\n\n");
            }
            self.slide(&mut out, slide);
        }
        out
    }
}
