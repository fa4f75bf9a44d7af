//! Conversion configuration.

use serde::{Deserialize, Serialize};

/// Target markup dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// Markdown with inline HTML for colors and sized images.
    Markdown,
    /// TiddlyWiki/MediaWiki-style wiki markup.
    Wiki,
    /// Madoko (Markdown with attribute blocks).
    Madoko,
    /// Quarto reveal.js presentation.
    Quarto,
    /// Marp presentation with a CSS grid for columns.
    Marp,
    /// LaTeX Beamer.
    Beamer,
}

impl Dialect {
    pub const ALL: [Dialect; 6] = [
        Dialect::Markdown,
        Dialect::Wiki,
        Dialect::Madoko,
        Dialect::Quarto,
        Dialect::Marp,
        Dialect::Beamer,
    ];

    /// Suffix appended to the output file stem.
    pub fn suffix(&self) -> &'static str {
        match self {
            Dialect::Markdown => "md",
            Dialect::Wiki => "wiki",
            Dialect::Madoko => "mdk",
            Dialect::Quarto => "qmd",
            Dialect::Marp => "marp",
            Dialect::Beamer => "beamer",
        }
    }

    /// Output file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Dialect::Markdown | Dialect::Madoko | Dialect::Marp => "md",
            Dialect::Wiki => "tid",
            Dialect::Quarto => "qmd",
            Dialect::Beamer => "tex",
        }
    }

    /// Output file name for a deck stem, e.g. `talk_md.md`.
    pub fn output_file_name(&self, stem: &str) -> String {
        format!("{}_{}.{}", stem, self.suffix(), self.extension())
    }

    /// Whether the dialect is a slide presentation format.
    pub fn is_presentation(&self) -> bool {
        matches!(self, Dialect::Quarto | Dialect::Marp | Dialect::Beamer)
    }
}

/// Options controlling conversion and rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Maximum image width in pixels. When set, images are embedded with an
    /// explicit sizing tag.
    pub image_width: Option<u32>,

    /// Write picture files. When off, pictures become placeholder references.
    pub extract_images: bool,

    /// Escape dialect-reserved characters.
    pub escaping: bool,

    /// Keep presenter notes.
    pub notes: bool,

    /// Convert image encodings the target cannot display (WMF/EMF).
    pub convert_unsupported_images: bool,

    /// Emit color markup.
    pub color: bool,

    /// Separate slides explicitly in non-presentation dialects.
    pub slide_delimiters: bool,

    /// Detect multi-column layouts from shape positions.
    pub detect_columns: bool,

    /// Minimum character count for a non-placeholder text shape to be kept.
    pub min_block_size: usize,

    /// Only convert this 1-based slide.
    pub page: Option<usize>,

    /// Keep repeated titles, marked as continued, instead of dropping them.
    pub keep_similar_titles: bool,

    /// Float left/right pictures in the Beamer dialect.
    pub image_wrapping: bool,

    /// Dialects to render.
    pub dialects: Vec<Dialect>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            image_width: None,
            extract_images: true,
            escaping: true,
            notes: true,
            convert_unsupported_images: true,
            color: true,
            slide_delimiters: false,
            detect_columns: false,
            min_block_size: 0,
            page: None,
            keep_similar_titles: false,
            image_wrapping: true,
            dialects: vec![Dialect::Markdown],
        }
    }
}

impl ConversionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image_width(mut self, width: Option<u32>) -> Self {
        self.image_width = width;
        self
    }

    pub fn with_extract_images(mut self, enabled: bool) -> Self {
        self.extract_images = enabled;
        self
    }

    pub fn with_escaping(mut self, enabled: bool) -> Self {
        self.escaping = enabled;
        self
    }

    pub fn with_notes(mut self, enabled: bool) -> Self {
        self.notes = enabled;
        self
    }

    pub fn with_convert_unsupported_images(mut self, enabled: bool) -> Self {
        self.convert_unsupported_images = enabled;
        self
    }

    pub fn with_color(mut self, enabled: bool) -> Self {
        self.color = enabled;
        self
    }

    pub fn with_slide_delimiters(mut self, enabled: bool) -> Self {
        self.slide_delimiters = enabled;
        self
    }

    pub fn with_detect_columns(mut self, enabled: bool) -> Self {
        self.detect_columns = enabled;
        self
    }

    pub fn with_min_block_size(mut self, size: usize) -> Self {
        self.min_block_size = size;
        self
    }

    pub fn with_page(mut self, page: Option<usize>) -> Self {
        self.page = page;
        self
    }

    pub fn with_keep_similar_titles(mut self, keep: bool) -> Self {
        self.keep_similar_titles = keep;
        self
    }

    pub fn with_image_wrapping(mut self, enabled: bool) -> Self {
        self.image_wrapping = enabled;
        self
    }

    /// Set the dialects to render. An empty list falls back to Markdown.
    pub fn with_dialects(mut self, dialects: Vec<Dialect>) -> Self {
        self.dialects = if dialects.is_empty() {
            vec![Dialect::Markdown]
        } else {
            dialects
        };
        self
    }
}
