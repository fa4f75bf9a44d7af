//! Per-file conversion state.

use crate::block::Heading;
use crate::config::ConversionConfig;
use crate::titles::{TitleOutline, TitleResolver};

/// State for converting one deck.
///
/// Created once per input file and dropped after that file is rendered.
/// Never shared between files, so batch conversion can run in parallel.
#[derive(Debug)]
pub struct ConversionContext<'a> {
    pub config: &'a ConversionConfig,
    titles: TitleResolver<'a>,
}

impl<'a> ConversionContext<'a> {
    pub fn new(config: &'a ConversionConfig, outline: Option<&'a TitleOutline>) -> Self {
        Self {
            config,
            titles: TitleResolver::new(outline, config.keep_similar_titles),
        }
    }

    /// Resolve a slide's raw title, advancing the outline cursor and the
    /// repeat-suppression state.
    pub fn resolve_title(&mut self, slide: usize, raw: Option<&str>) -> Option<Heading> {
        self.titles.resolve(slide, raw)
    }
}
