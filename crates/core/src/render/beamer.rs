//! LaTeX beamer frames.

use super::{picture_path, wrap_core, InlineMarkup, Renderer, SlideParts};
use crate::block::{
    Block, ConvertedDeck, FormulaDisplay, ListItem, Picture, PictureSource, Position, ScalingClass,
    Slide, SpanColor, Table,
};
use crate::config::ConversionConfig;

/// Deepest itemize nesting LaTeX supports.
const MAX_LIST_DEPTH: usize = 4;

const PREAMBLE: &str = r"\documentclass[aspectratio=169]{beamer}
\usetheme{default}

\usepackage[utf8]{inputenc}
\usepackage{graphicx}
\usepackage{booktabs}
\usepackage{xcolor}
\usepackage{hyperref}
\usepackage{amsmath}
\usepackage{amssymb}
\usepackage{wrapfig}
\usepackage{listings}

\beamertemplatenavigationsymbolsempty

\begin{document}

";

/// Escape LaTeX special characters and typographic punctuation.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            '&' => out.push_str(r"\&"),
            '%' => out.push_str(r"\%"),
            '$' => out.push_str(r"\$"),
            '#' => out.push_str(r"\#"),
            '_' => out.push_str(r"\_"),
            '^' => out.push_str(r"\textasciicircum{}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            '<' => out.push_str(r"\textless{}"),
            '>' => out.push_str(r"\textgreater{}"),
            '|' => out.push_str(r"\textbar{}"),
            '"' => out.push_str("''"),
            '\u{2019}' => out.push('\''),
            '\u{2018}' => out.push('`'),
            '\u{201C}' => out.push_str("``"),
            '\u{201D}' => out.push_str("''"),
            '\u{2013}' => out.push_str("--"),
            '\u{2014}' => out.push_str("---"),
            '\u{00A0}' => out.push('~'),
            '\u{000B}' | '\u{000C}' => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// Escape the characters `\href` does not accept raw.
fn escape_url(url: &str) -> String {
    url.replace('\\', "/").replace('%', r"\%").replace('#', r"\#")
}

/// Font-size switch for a scaling class.
pub fn size_command(scaling: ScalingClass) -> Option<&'static str> {
    match scaling {
        ScalingClass::Normal => None,
        ScalingClass::Reduced => Some(r"\small"),
        ScalingClass::Minimal => Some(r"\footnotesize"),
    }
}

pub struct BeamerRenderer<'a> {
    config: &'a ConversionConfig,
}

impl<'a> BeamerRenderer<'a> {
    pub fn new(config: &'a ConversionConfig) -> Self {
        Self { config }
    }

    fn frame(&self, out: &mut String, slide: &Slide, slide_width: u32) {
        let parts = SlideParts::new(slide);
        let fragile = slide
            .all_blocks()
            .any(|block| matches!(block, Block::Code(_)));
        out.push_str(if fragile {
            "\\begin{frame}[fragile]\n"
        } else {
            "\\begin{frame}\n"
        });
        if let Some(heading) = parts.heading {
            out.push_str(&format!("\\frametitle{{{}}}\n", self.escape(&heading.text)));
        }

        let size = size_command(slide.hints.scaling);
        if let Some(size) = size {
            out.push('{');
            out.push_str(size);
            out.push('\n');
        }

        for picture in &parts.floated {
            out.push_str(&self.picture(picture, slide_width));
        }
        self.blocks(out, &parts.body, slide_width);

        if !parts.columns.is_empty() {
            let width = if parts.split {
                "0.48".to_string()
            } else {
                format!("{:.2}", 1.0 / parts.columns.len() as f64)
            };
            out.push_str("\\begin{columns}[T]\n");
            for column in &parts.columns {
                out.push_str(&format!("  \\column{{{}\\textwidth}}\n", width));
                self.blocks(out, column, slide_width);
            }
            out.push_str("\\end{columns}\n");
        }

        if !parts.notes.is_empty() {
            let notes: Vec<String> = parts.notes.iter().map(|line| self.escape(line)).collect();
            out.push_str(&format!("\\note{{{}}}\n", notes.join("\n")));
        }

        if size.is_some() {
            out.push_str("}\n");
        }
        out.push_str("\\end{frame}\n\n");
    }

    fn blocks(&self, out: &mut String, blocks: &[Block], slide_width: u32) {
        for block in blocks {
            self.block(out, block, slide_width);
        }
    }

    fn block(&self, out: &mut String, block: &Block, slide_width: u32) {
        match block {
            Block::Heading(heading) => {
                out.push_str(&format!("\\textbf{{{}}}\\par\n\n", self.escape(&heading.text)))
            }
            Block::Paragraph(spans) => {
                let text = self.spans(spans);
                if !text.is_empty() {
                    out.push_str(&text);
                    out.push_str("\n\n");
                }
            }
            Block::List(items) => out.push_str(&self.list(items)),
            Block::Table(table) => out.push_str(&self.table(table)),
            Block::Picture(picture) => out.push_str(&self.picture(picture, slide_width)),
            Block::Formula(formula) => match formula.display {
                FormulaDisplay::Block => {
                    out.push_str(&format!("\\[\n{}\n\\]\n\n", formula.markup.trim()))
                }
                FormulaDisplay::Inline => {
                    out.push_str(&self.math(&formula.markup));
                    out.push_str("\n\n");
                }
            },
            Block::Code(code) => {
                out.push_str(&format!(
                    "\\begin{{verbatim}}\n{}\n\\end{{verbatim}}\n\n",
                    code.lines.join("\n")
                ));
            }
            Block::Note(_) => {}
        }
    }

    /// Nested itemize environments, clamped to the depth LaTeX supports.
    fn list(&self, items: &[ListItem]) -> String {
        let mut out = String::new();
        let mut open = 0;
        for item in items {
            let target = item.depth.min(MAX_LIST_DEPTH - 1) + 1;
            while open < target {
                out.push_str(&"  ".repeat(open));
                out.push_str("\\begin{itemize}\n");
                open += 1;
            }
            while open > target {
                open -= 1;
                out.push_str(&"  ".repeat(open));
                out.push_str("\\end{itemize}\n");
            }
            out.push_str(&"  ".repeat(target));
            out.push_str("\\item ");
            out.push_str(&self.spans(&item.spans));
            out.push('\n');
        }
        while open > 0 {
            open -= 1;
            out.push_str(&"  ".repeat(open));
            out.push_str("\\end{itemize}\n");
        }
        out.push('\n');
        out
    }

    /// booktabs tabular; column spans become `\multicolumn`.
    fn table(&self, table: &Table) -> String {
        if table.rows.is_empty() || table.columns == 0 {
            return String::new();
        }
        let mut out = String::from("\\begin{table}\n  \\centering\n");
        out.push_str(&format!("  \\begin{{tabular}}{{{}}}\n", "l".repeat(table.columns)));
        out.push_str("    \\toprule\n");
        for (index, row) in table.rows.iter().enumerate() {
            if index == 1 {
                out.push_str("    \\midrule\n");
            }
            let mut cells = Vec::new();
            let mut column = 0;
            while column < table.columns {
                match row.iter().find(|cell| cell.column == column) {
                    Some(cell) => {
                        let text = self.spans(&cell.spans).replace('\n', " ");
                        let span = cell.col_span.clamp(1, table.columns - column);
                        if span > 1 {
                            cells.push(format!("\\multicolumn{{{}}}{{l}}{{{}}}", span, text));
                        } else {
                            cells.push(text);
                        }
                        column += span;
                    }
                    None => {
                        cells.push(String::new());
                        column += 1;
                    }
                }
            }
            out.push_str(&format!("    {} \\\\\n", cells.join(" & ")));
        }
        out.push_str("    \\bottomrule\n  \\end{tabular}\n\\end{table}\n\n");
        out
    }

    /// `wrapfigure` for left/right pictures when wrapping is on, else a
    /// centered `figure`. Widths follow the picture's share of the slide.
    fn picture(&self, picture: &Picture, slide_width: u32) -> String {
        let share = (slide_width > 0)
            .then(|| f64::from(picture.display_size.0) / f64::from(slide_width));

        let graphic = match &picture.source {
            PictureSource::Extracted(_) => None,
            PictureSource::Placeholder(name) => {
                Some(format!("\\fbox{{\\texttt{{{}}}}}", self.escape(name)))
            }
        };

        if picture.position.is_floated() && self.config.image_wrapping {
            let side = match picture.position {
                Position::Left => 'l',
                _ => 'r',
            };
            let fraction = share.map(|s| s.clamp(0.25, 0.6)).unwrap_or(0.4);
            let graphic = graphic.unwrap_or_else(|| {
                format!(
                    "\\includegraphics[width=\\linewidth,keepaspectratio]{{{}}}",
                    picture_path(picture)
                )
            });
            format!(
                "\\begin{{wrapfigure}}{{{}}}{{{:.2}\\linewidth}}\n  \\centering\n  {}\n\\end{{wrapfigure}}\n",
                side, fraction, graphic
            )
        } else {
            let fraction = share.map(|s| s.clamp(0.2, 0.85)).unwrap_or(0.7);
            let graphic = graphic.unwrap_or_else(|| {
                format!(
                    "\\includegraphics[width={:.2}\\textwidth,keepaspectratio]{{{}}}",
                    fraction,
                    picture_path(picture)
                )
            });
            format!(
                "\\begin{{figure}}\n  \\centering\n  {}\n\\end{{figure}}\n\n",
                graphic
            )
        }
    }
}

impl InlineMarkup for BeamerRenderer<'_> {
    fn config(&self) -> &ConversionConfig {
        self.config
    }

    fn escape_reserved(&self, text: &str) -> String {
        escape_latex(text)
    }

    fn strong(&self, text: &str) -> String {
        wrap_core(text, "\\textbf{", "}")
    }

    fn accent(&self, text: &str) -> String {
        wrap_core(text, "\\textit{", "}")
    }

    fn code(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        format!("\\texttt{{{}}}", escape_latex(text))
    }

    fn color(&self, text: &str, color: SpanColor) -> String {
        let (r, g, b) = color.rgb();
        format!("\\textcolor[RGB]{{{},{},{}}}{{{}}}", r, g, b, text)
    }

    fn link(&self, text: &str, url: &str) -> String {
        format!("\\href{{{}}}{{{}}}", escape_url(url), text)
    }
}

impl Renderer for BeamerRenderer<'_> {
    fn render(&self, deck: &ConvertedDeck) -> String {
        let mut out = String::from(PREAMBLE);
        for slide in &deck.slides {
            self.frame(&mut out, slide, deck.slide_width_px);
        }
        out.push_str("\\end{document}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Cell, CodeBlock, Formula, Heading, SlideLayoutHints, Span, SpanStyle};
    use crate::render::tests::{deck, item, picture};

    fn frame(config: &ConversionConfig, slide: &Slide) -> String {
        let mut out = String::new();
        BeamerRenderer::new(config).frame(&mut out, slide, 1280);
        out
    }

    #[test]
    fn test_escape_latex() {
        assert_eq!(escape_latex("50% & $5_x"), r"50\% \& \$5\_x");
        assert_eq!(escape_latex("a\\b"), r"a\textbackslash{}b");
        assert_eq!(escape_latex("\u{201C}q\u{201D}"), "``q''");
    }

    #[test]
    fn test_document_wrapper() {
        let out = BeamerRenderer::new(&ConversionConfig::default()).render(&deck(Vec::new()));
        assert!(out.starts_with("\\documentclass[aspectratio=169]{beamer}"));
        assert!(out.contains("\\usepackage{wrapfig}"));
        assert!(out.ends_with("\\begin{document}\n\n\\end{document}\n"));
    }

    #[test]
    fn test_frame_with_title_and_nested_list() {
        let mut slide = Slide::new(1);
        slide.blocks = vec![
            Block::Heading(Heading::new(1, "Plan")),
            Block::List(vec![item(0, "a"), item(1, "b"), item(0, "c")]),
        ];
        let out = frame(&ConversionConfig::default(), &slide);
        assert_eq!(
            out,
            "\\begin{frame}\n\\frametitle{Plan}\n\\begin{itemize}\n  \\item a\n  \\begin{itemize}\n    \\item b\n  \\end{itemize}\n  \\item c\n\\end{itemize}\n\n\\end{frame}\n\n"
        );
    }

    #[test]
    fn test_list_depth_clamped_to_four_levels() {
        let renderer_config = ConversionConfig::default();
        let renderer = BeamerRenderer::new(&renderer_config);
        let items: Vec<ListItem> = (0..6).map(|d| item(d, "x")).collect();
        let out = renderer.list(&items);
        assert_eq!(out.matches("\\begin{itemize}").count(), 4);
        assert_eq!(out.matches("\\end{itemize}").count(), 4);
    }

    #[test]
    fn test_scaling_and_split_columns() {
        let mut slide = Slide::new(1);
        slide.blocks = vec![
            Block::Paragraph(vec![Span::plain("one")]),
            Block::Paragraph(vec![Span::plain("two")]),
        ];
        slide.hints = SlideLayoutHints {
            density: 1.6,
            scaling: ScalingClass::Reduced,
            column_split: true,
            column_count: 2,
        };
        let out = frame(&ConversionConfig::default(), &slide);
        assert_eq!(
            out,
            "\\begin{frame}\n{\\small\n\\begin{columns}[T]\n  \\column{0.48\\textwidth}\none\n\n  \\column{0.48\\textwidth}\ntwo\n\n\\end{columns}\n}\n\\end{frame}\n\n"
        );
    }

    #[test]
    fn test_floated_picture_wraps_unless_disabled() {
        let mut slide = Slide::new(1);
        slide.blocks = vec![Block::Picture(picture("img/p_1_2.png", Position::Left, 320))];
        let out = frame(&ConversionConfig::default(), &slide);
        assert!(out.contains("\\begin{wrapfigure}{l}{0.25\\linewidth}"));
        assert!(out.contains("{img/p_1_2.png}"));

        let config = ConversionConfig::default().with_image_wrapping(false);
        let out = frame(&config, &slide);
        assert!(out.contains("\\begin{figure}"));
        assert!(out.contains("width=0.25\\textwidth"));
    }

    #[test]
    fn test_code_makes_frame_fragile() {
        let mut slide = Slide::new(1);
        slide.blocks = vec![Block::Code(CodeBlock {
            lines: vec!["x = {1}".into()],
            language: None,
        })];
        let out = frame(&ConversionConfig::default(), &slide);
        assert!(out.starts_with("\\begin{frame}[fragile]\n"));
        assert!(out.contains("\\begin{verbatim}\nx = {1}\n\\end{verbatim}"));
    }

    #[test]
    fn test_table_multicolumn_and_rules() {
        let cell = |column: usize, col_span: usize, text: &str| Cell {
            column,
            row_span: 1,
            col_span,
            spans: vec![Span::plain(text)],
        };
        let table = Table {
            columns: 2,
            rows: vec![vec![cell(0, 2, "wide")], vec![cell(0, 1, "a"), cell(1, 1, "b")]],
        };
        let config = ConversionConfig::default();
        let out = BeamerRenderer::new(&config).table(&table);
        assert!(out.contains("\\begin{tabular}{ll}"));
        assert!(out.contains("    \\multicolumn{2}{l}{wide} \\\\\n    \\midrule\n    a & b \\\\\n"));
        assert!(out.contains("\\bottomrule"));
    }

    #[test]
    fn test_inline_styles_and_formula() {
        let config = ConversionConfig::default();
        let renderer = BeamerRenderer::new(&config);
        let style = SpanStyle {
            strong: true,
            color: Some(SpanColor::Rgb(255, 0, 0)),
            ..SpanStyle::default()
        };
        assert_eq!(
            renderer.spans(&[Span::styled("hot", style)]),
            "\\textcolor[RGB]{255,0,0}{\\textbf{hot}}"
        );

        let mut out = String::new();
        renderer.block(
            &mut out,
            &Block::Formula(Formula {
                markup: "x^2".into(),
                display: FormulaDisplay::Block,
            }),
            1280,
        );
        assert_eq!(out, "\\[\nx^2\n\\]\n\n");
    }

    #[test]
    fn test_notes_inside_frame() {
        let mut slide = Slide::new(1);
        slide.blocks = vec![Block::Note("50% done".into())];
        let out = frame(&ConversionConfig::default(), &slide);
        assert!(out.contains("\\note{50\\% done}\n\\end{frame}"));
    }
}
