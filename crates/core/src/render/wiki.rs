//! MediaWiki-style wikitext.

use super::{capped_width, note_lines, picture_path, InlineMarkup, Renderer};
use crate::block::{Block, ConvertedDeck, FormulaDisplay, Picture, Slide, SpanColor, Table};
use crate::config::ConversionConfig;

/// Replace wiki-significant characters with HTML entities.
pub fn escape_wiki(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '[' => out.push_str("&#91;"),
            ']' => out.push_str("&#93;"),
            '|' => out.push_str("&#124;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            '=' => out.push_str("&#61;"),
            '*' => out.push_str("&#42;"),
            '#' => out.push_str("&#35;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            c => out.push(c),
        }
    }
    out
}

pub struct WikiRenderer<'a> {
    config: &'a ConversionConfig,
}

impl<'a> WikiRenderer<'a> {
    pub fn new(config: &'a ConversionConfig) -> Self {
        Self { config }
    }

    fn slide(&self, out: &mut String, slide: &Slide) {
        for block in slide.all_blocks() {
            self.block(out, block);
        }
        let notes = note_lines(slide);
        if !notes.is_empty() {
            out.push_str("----\n\n");
            for line in notes {
                out.push_str(&self.escape(line));
                out.push_str("\n\n");
            }
        }
    }

    fn block(&self, out: &mut String, block: &Block) {
        match block {
            Block::Heading(heading) => {
                let marker = "=".repeat(heading.level.max(1) + 1);
                out.push_str(&format!(
                    "{} {} {}\n\n",
                    marker,
                    self.escape(&heading.text),
                    marker
                ));
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
                    out.push_str(&"*".repeat(item.depth + 1));
                    out.push(' ');
                    out.push_str(&self.spans(&item.spans));
                    out.push('\n');
                }
                out.push('\n');
            }
            Block::Table(table) => out.push_str(&self.table(table)),
            Block::Picture(picture) => out.push_str(&self.picture(picture)),
            Block::Formula(formula) => {
                let markup = match formula.display {
                    FormulaDisplay::Block => {
                        format!("<math display=\"block\">{}</math>", formula.markup.trim())
                    }
                    FormulaDisplay::Inline => self.math(&formula.markup),
                };
                out.push_str(&markup);
                out.push_str("\n\n");
            }
            Block::Code(code) => {
                let language = code
                    .language
                    .as_deref()
                    .map(|lang| format!(" lang=\"{}\"", lang))
                    .unwrap_or_default();
                out.push_str(&format!(
                    "<syntaxhighlight{}>\n{}\n</syntaxhighlight>\n\n",
                    language,
                    self.escape(&code.lines.join("\n"))
                ));
            }
            Block::Note(_) => {}
        }
    }

    /// Wikitable with merged cells expressed as `colspan`/`rowspan`.
    fn table(&self, table: &Table) -> String {
        if table.rows.is_empty() {
            return String::new();
        }
        let mut out = String::from("{| class=\"wikitable\"\n");
        for (index, row) in table.rows.iter().enumerate() {
            if index > 0 {
                out.push_str("|-\n");
            }
            let marker = if index == 0 { '!' } else { '|' };
            for cell in row {
                let mut attributes = String::new();
                if cell.col_span > 1 {
                    attributes.push_str(&format!("colspan=\"{}\" ", cell.col_span));
                }
                if cell.row_span > 1 {
                    attributes.push_str(&format!("rowspan=\"{}\" ", cell.row_span));
                }
                let text = self.spans(&cell.spans).replace('\n', "<br />");
                if attributes.is_empty() {
                    out.push_str(&format!("{} {}\n", marker, text));
                } else {
                    out.push_str(&format!("{} {}| {}\n", marker, attributes, text));
                }
            }
        }
        out.push_str("|}\n\n");
        out
    }

    fn picture(&self, picture: &Picture) -> String {
        let path = self.escape(&picture_path(picture));
        match capped_width(picture, self.config) {
            Some(width) => format!("[[File:{}|{}px]]\n\n", path, width),
            None => format!("[[File:{}]]\n\n", path),
        }
    }
}

impl InlineMarkup for WikiRenderer<'_> {
    fn config(&self) -> &ConversionConfig {
        self.config
    }

    fn escape_reserved(&self, text: &str) -> String {
        escape_wiki(text)
    }

    fn strong(&self, text: &str) -> String {
        super::wrap_core(text, "'''", "'''")
    }

    fn accent(&self, text: &str) -> String {
        super::wrap_core(text, "''", "''")
    }

    fn code(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        format!("<code>{}</code>", self.escape(text))
    }

    fn math(&self, text: &str) -> String {
        super::wrap_core(text, "<math>", "</math>")
    }

    fn color(&self, text: &str, color: SpanColor) -> String {
        format!(" <span style=\"color:{}\">{}</span> ", color.hex(), text)
    }

    fn link(&self, text: &str, url: &str) -> String {
        format!("[{} {}]", url, text)
    }
}

impl Renderer for WikiRenderer<'_> {
    fn render(&self, deck: &ConvertedDeck) -> String {
        let mut out = String::new();
        for (index, slide) in deck.slides.iter().enumerate() {
            if index > 0 && self.config.slide_delimiters {
                out.push_str("----\n\n");
            }
            self.slide(&mut out, slide);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Cell, Heading, Position, Span, SpanStyle};
    use crate::render::tests::{deck, item, picture};

    fn render(config: &ConversionConfig, blocks: Vec<Block>) -> String {
        let mut slide = Slide::new(1);
        slide.blocks = blocks;
        WikiRenderer::new(config).render(&deck(vec![slide]))
    }

    #[test]
    fn test_escape_wiki_entities() {
        assert_eq!(escape_wiki("[a|b]"), "&#91;a&#124;b&#93;");
        assert_eq!(escape_wiki("x & y"), "x &amp; y");
    }

    #[test]
    fn test_heading_and_nested_list() {
        let out = render(
            &ConversionConfig::default(),
            vec![
                Block::Heading(Heading::new(1, "Intro")),
                Block::List(vec![item(0, "a"), item(1, "b")]),
            ],
        );
        assert_eq!(out, "== Intro ==\n\n* a\n** b\n\n");
    }

    #[test]
    fn test_bold_italic_and_link() {
        let style = SpanStyle {
            strong: true,
            hyperlink: Some("https://example.com".into()),
            ..SpanStyle::default()
        };
        let out = render(
            &ConversionConfig::default(),
            vec![Block::Paragraph(vec![Span::styled("site", style)])],
        );
        assert_eq!(out, "[https://example.com '''site''']\n\n");
    }

    #[test]
    fn test_table_with_colspan() {
        let cell = |column: usize, col_span: usize, text: &str| Cell {
            column,
            row_span: 1,
            col_span,
            spans: vec![Span::plain(text)],
        };
        let table = Table {
            columns: 2,
            rows: vec![vec![cell(0, 1, "h1"), cell(1, 1, "h2")], vec![cell(0, 2, "wide")]],
        };
        let out = render(&ConversionConfig::default(), vec![Block::Table(table)]);
        assert_eq!(
            out,
            "{| class=\"wikitable\"\n! h1\n! h2\n|-\n| colspan=\"2\" | wide\n|}\n\n"
        );
    }

    #[test]
    fn test_picture_sizing() {
        let blocks = vec![Block::Picture(picture("img/p.png", Position::Center, 400))];
        let out = render(&ConversionConfig::default(), blocks.clone());
        assert_eq!(out, "[[File:img/p.png]]\n\n");
        let config = ConversionConfig::default().with_image_width(Some(300));
        let out = render(&config, blocks);
        assert_eq!(out, "[[File:img/p.png|300px]]\n\n");
    }
}
