//! Multi-dialect rendering of the block model.
//!
//! Every dialect walks the same [`Block`] variants with an exhaustive match.
//! Inline markup shared by all dialects lives in [`InlineMarkup`]; the two
//! presentation dialects lay slides out through [`SlideParts`].

mod beamer;
mod markdown;
mod marp;
mod wiki;

pub use beamer::BeamerRenderer;
pub use markdown::{Flavor, MarkdownRenderer};
pub use marp::MarpRenderer;
pub use wiki::WikiRenderer;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::block::{
    Block, CodeBlock, ConvertedDeck, Heading, Picture, PictureSource, Slide, Span, SpanColor,
    SpanStyle, Table,
};
use crate::config::{ConversionConfig, Dialect};
use crate::layout::{split_in_two, split_units};

/// Characters kept verbatim when quoting an image path.
const PATH_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Serializes a converted deck into one dialect.
pub trait Renderer {
    fn render(&self, deck: &ConvertedDeck) -> String;
}

/// Render a converted deck in one dialect.
pub fn render(deck: &ConvertedDeck, dialect: Dialect, config: &ConversionConfig) -> String {
    log::debug!("Rendering {} as {:?}", deck.filename, dialect);
    match dialect {
        Dialect::Markdown => MarkdownRenderer::new(Flavor::Plain, config).render(deck),
        Dialect::Madoko => MarkdownRenderer::new(Flavor::Madoko, config).render(deck),
        Dialect::Quarto => MarkdownRenderer::new(Flavor::Quarto, config).render(deck),
        Dialect::Wiki => WikiRenderer::new(config).render(deck),
        Dialect::Marp => MarpRenderer::new(config).render(deck),
        Dialect::Beamer => BeamerRenderer::new(config).render(deck),
    }
}

/// Render every dialect the configuration asks for, in order.
pub fn render_all(deck: &ConvertedDeck, config: &ConversionConfig) -> Vec<(Dialect, String)> {
    config
        .dialects
        .iter()
        .map(|&dialect| (dialect, render(deck, dialect, config)))
        .collect()
}

/// Inline markup of one dialect.
///
/// Dialects supply the primitive wrappers; span merging, escaping and the
/// order in which styles nest are shared.
pub trait InlineMarkup {
    fn config(&self) -> &ConversionConfig;

    /// Escape every character the dialect reserves.
    fn escape_reserved(&self, text: &str) -> String;

    fn strong(&self, text: &str) -> String;

    fn accent(&self, text: &str) -> String;

    fn color(&self, text: &str, color: SpanColor) -> String;

    fn link(&self, text: &str, url: &str) -> String;

    fn code(&self, text: &str) -> String {
        code_span(text)
    }

    fn math(&self, text: &str) -> String {
        wrap_core(text, "$", "$")
    }

    /// Escape unless escaping is switched off.
    fn escape(&self, text: &str) -> String {
        if self.config().escaping {
            self.escape_reserved(text)
        } else {
            text.to_string()
        }
    }

    /// Markup of one span. Code and math spans take no other styling.
    fn span(&self, text: &str, style: &SpanStyle) -> String {
        if style.code {
            return self.code(text);
        }
        if style.math {
            return self.math(text);
        }
        let mut out = self.escape(text);
        if style.strong {
            out = self.strong(&out);
        }
        if style.accent {
            out = self.accent(&out);
        }
        if let Some(color) = style.color {
            out = self.color(&out, color);
        }
        if let Some(url) = &style.hyperlink {
            out = self.link(&out, url);
        }
        out
    }

    /// Markup of a span sequence, with compatible neighbours merged first.
    fn spans(&self, spans: &[Span]) -> String {
        merge_spans(spans)
            .iter()
            .map(|span| self.span(&span.text, &span.style))
            .collect::<String>()
            .trim()
            .to_string()
    }
}

/// Merge neighbouring spans that carry the same style.
pub fn merge_spans(spans: &[Span]) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if last.style == span.style => last.text.push_str(&span.text),
            _ => merged.push(span.clone()),
        }
    }
    merged
}

/// Wrap the trimmed core of `text`, keeping outer whitespace outside the
/// delimiters. Whitespace-only text is returned unchanged.
pub fn wrap_core(text: &str, open: &str, close: &str) -> String {
    let without_lead = text.trim_start();
    let core = without_lead.trim_end();
    if core.is_empty() {
        return text.to_string();
    }
    let lead = &text[..text.len() - without_lead.len()];
    let trail = &without_lead[core.len()..];
    format!("{}{}{}{}{}", lead, open, core, close, trail)
}

/// Longest run of `ch` in `text`.
pub fn longest_run(text: &str, ch: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == ch {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Backtick code span with a fence one longer than the longest backtick run
/// in the content.
pub fn code_span(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let fence = "`".repeat(longest_run(text, '`') + 1);
    if text.starts_with('`') || text.ends_with('`') || text.trim().is_empty() {
        format!("{} {} {}", fence, text, fence)
    } else {
        format!("{}{}{}", fence, text, fence)
    }
}

/// Fenced code block shared by the markdown-like dialects.
pub fn fenced_code(code: &CodeBlock) -> String {
    let body = code.lines.join("\n");
    let fence = "`".repeat(longest_run(&body, '`').max(2) + 1);
    format!(
        "{}{}\n{}\n{}\n\n",
        fence,
        code.language.as_deref().unwrap_or(""),
        body,
        fence
    )
}

/// Picture path with forward slashes.
pub fn picture_path(picture: &Picture) -> String {
    match &picture.source {
        PictureSource::Extracted(path) | PictureSource::Placeholder(path) => path.replace('\\', "/"),
    }
}

/// Picture path percent-encoded for use as a link target.
pub fn quoted_picture_path(picture: &Picture) -> String {
    utf8_percent_encode(&picture_path(picture), PATH_SAFE).to_string()
}

/// Width for a sizing tag: the configured cap, lowered to the on-slide width.
/// `None` means a plain reference.
pub fn capped_width(picture: &Picture, config: &ConversionConfig) -> Option<u32> {
    config.image_width.map(|cap| match picture.display_size.0 {
        0 => cap,
        display => cap.min(display),
    })
}

/// Table cells laid out on the grid, covered positions empty.
pub fn grid_cells(table: &Table, mut format: impl FnMut(&[Span]) -> String) -> Vec<Vec<String>> {
    table
        .rows
        .iter()
        .map(|row| {
            table
                .grid_row(row)
                .into_iter()
                .map(|cell| cell.map(|c| format(&c.spans)).unwrap_or_default())
                .collect()
        })
        .collect()
}

/// Pipe table with the first row as header.
pub fn pipe_table(rows: &[Vec<String>], alignment: &str) -> String {
    let Some(header) = rows.first() else {
        return String::new();
    };
    let mut out = pipe_row(header);
    out.push_str(&pipe_row(&vec![alignment.to_string(); header.len()]));
    for row in &rows[1..] {
        out.push_str(&pipe_row(row));
    }
    out.push('\n');
    out
}

fn pipe_row(cells: &[String]) -> String {
    let cells: Vec<String> = cells
        .iter()
        .map(|cell| {
            if cell.contains('`') {
                cell.replace('\n', " ")
            } else {
                cell.replace('\n', "<br />")
            }
        })
        .collect();
    format!("| {} |\n", cells.join(" | "))
}

/// Non-empty lines of a slide's notes.
pub fn note_lines(slide: &Slide) -> Vec<&str> {
    slide
        .notes()
        .flat_map(str::lines)
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// A slide arranged for the presentation dialects: title, floated
/// pictures, then content, either whole or in columns.
#[derive(Debug, Clone)]
pub struct SlideParts<'a> {
    pub heading: Option<&'a Heading>,
    /// Left or right pictures, hoisted above the content.
    pub floated: Vec<&'a Picture>,
    /// Content outside any columns.
    pub body: Vec<Block>,
    /// Column contents, left to right. Empty for single-column slides.
    pub columns: Vec<Vec<Block>>,
    /// Whether `columns` came from the density split rather than the source.
    pub split: bool,
    pub notes: Vec<&'a str>,
}

impl<'a> SlideParts<'a> {
    pub fn new(slide: &'a Slide) -> Self {
        let mut floated = Vec::new();
        let mut body = Vec::new();
        for block in &slide.blocks {
            match block {
                Block::Heading(_) | Block::Note(_) => {}
                Block::Picture(picture) if picture.position.is_floated() => floated.push(picture),
                other => body.push(other.clone()),
            }
        }

        let mut columns = Vec::new();
        let mut split = false;
        if slide.is_multi_column() {
            columns = slide
                .columns
                .iter()
                .map(|column| {
                    column
                        .iter()
                        .filter(|block| !matches!(block, Block::Note(_)))
                        .cloned()
                        .collect()
                })
                .collect();
        } else if slide.hints.column_split && split_units(&body) >= 2 {
            let (first, second) = split_in_two(&body);
            columns = vec![first, second];
            body.clear();
            split = true;
        }

        Self {
            heading: slide.heading(),
            floated,
            body,
            columns,
            split,
            notes: note_lines(slide),
        }
    }
}
