//! Title hierarchy resolution against an optional user outline.
//!
//! The outline is plain text with one title per line. Leading spaces set the
//! depth; the first indented line fixes the indentation unit.

use crate::block::Heading;
use crate::error::{Error, Result};
use crate::normalize::normalize_for_matching;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A match must score strictly above this value to be accepted. A score of
/// exactly 92 is rejected.
pub const TITLE_MATCH_THRESHOLD: u8 = 92;

/// Marker appended to repeated titles when they are kept.
pub const CONTINUATION_SUFFIX: &str = " (cont.)";

/// Node of the user-supplied outline tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleNode {
    pub text: String,
    /// 1-based depth.
    pub depth: usize,
    pub children: Vec<TitleNode>,
}

/// A parsed outline: the tree plus a pre-order index used for matching.
#[derive(Debug, Clone, Default)]
pub struct TitleOutline {
    pub roots: Vec<TitleNode>,
    /// Pre-order `(text, normalized text, depth)` entries.
    entries: Vec<(String, String, usize)>,
}

impl TitleOutline {
    /// Parse outline text. Never fails: indentation that is not a multiple
    /// of the unit rounds down, blank lines are skipped.
    pub fn parse(text: &str) -> Self {
        let mut unit: Option<usize> = None;
        let mut flat: Vec<(String, usize)> = Vec::new();

        for line in text.lines() {
            let title = line.trim();
            if title.is_empty() {
                continue;
            }
            let spaces = line.chars().take_while(|c| *c == ' ').count();
            let depth = if spaces == 0 {
                1
            } else {
                let unit = *unit.get_or_insert(spaces);
                1 + spaces / unit
            };
            flat.push((title.to_string(), depth));
        }

        let entries = flat
            .iter()
            .map(|(text, depth)| (text.clone(), normalize_for_matching(text), *depth))
            .collect();

        Self {
            roots: build_tree(flat),
            entries,
        }
    }

    /// Read and parse an outline file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::OutlineError(format!("{}: {}", path.display(), e)))?;
        Ok(Self::parse(&text))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of titles in the outline.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Deepest depth present in the outline.
    pub fn max_depth(&self) -> usize {
        self.entries.iter().map(|(_, _, depth)| *depth).max().unwrap_or(1)
    }

    /// Best match for `title`, preferring the first tied node at or after
    /// `cursor` (a pre-order index), then the first tied node overall.
    pub fn best_match(&self, title: &str, cursor: usize) -> Option<OutlineMatch> {
        let needle = normalize_for_matching(title);
        let scores: Vec<u8> = self
            .entries
            .iter()
            .map(|(_, normalized, _)| normalized_score(&needle, normalized))
            .collect();

        let best = scores.iter().copied().max()?;
        if best <= TITLE_MATCH_THRESHOLD {
            return None;
        }

        let index = (cursor..scores.len())
            .find(|&i| scores[i] == best)
            .or_else(|| scores.iter().position(|&s| s == best))?;
        let (text, _, depth) = &self.entries[index];
        Some(OutlineMatch {
            index,
            text: text.clone(),
            depth: *depth,
            score: best,
        })
    }
}

/// An accepted outline match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineMatch {
    /// Pre-order index of the matched node.
    pub index: usize,
    pub text: String,
    pub depth: usize,
    pub score: u8,
}

fn build_tree(flat: Vec<(String, usize)>) -> Vec<TitleNode> {
    let mut roots: Vec<TitleNode> = Vec::new();
    // Open ancestors, innermost last.
    let mut stack: Vec<TitleNode> = Vec::new();

    for (text, depth) in flat {
        while stack.last().is_some_and(|open| open.depth >= depth) {
            close_node(&mut stack, &mut roots);
        }
        stack.push(TitleNode {
            text,
            depth,
            children: Vec::new(),
        });
    }
    while !stack.is_empty() {
        close_node(&mut stack, &mut roots);
    }
    roots
}

fn close_node(stack: &mut Vec<TitleNode>, roots: &mut Vec<TitleNode>) {
    if let Some(node) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }
}

/// Similarity of two strings in 0..=100, after normalization.
pub fn match_score(a: &str, b: &str) -> u8 {
    normalized_score(&normalize_for_matching(a), &normalize_for_matching(b))
}

fn normalized_score(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 100;
    }
    let distance = levenshtein(&a, &b);
    (100.0 * (1.0 - distance as f64 / longest as f64)).round() as u8
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Per-deck title resolution state.
#[derive(Debug, Default)]
pub struct TitleResolver<'a> {
    outline: Option<&'a TitleOutline>,
    keep_similar: bool,
    /// Pre-order index just after the last matched node.
    cursor: usize,
    /// Final title of the immediately previous slide, before any suffix.
    last_title: Option<String>,
}

impl<'a> TitleResolver<'a> {
    pub fn new(outline: Option<&'a TitleOutline>, keep_similar: bool) -> Self {
        Self {
            outline: outline.filter(|o| !o.is_empty()),
            keep_similar,
            cursor: 0,
            last_title: None,
        }
    }

    /// Resolve one slide's raw title into a heading.
    ///
    /// Returns `None` when the slide has no title or the title repeats the
    /// previous slide's and repeated titles are dropped.
    pub fn resolve(&mut self, slide: usize, raw: Option<&str>) -> Option<Heading> {
        let raw = match raw.map(str::trim).filter(|t| !t.is_empty()) {
            Some(raw) => raw,
            None => {
                self.last_title = None;
                return None;
            }
        };

        let (level, text) = match self.outline {
            None => (1, raw.to_string()),
            Some(outline) => match outline.best_match(raw, self.cursor) {
                Some(found) => {
                    if found.text != raw {
                        log::info!(
                            "Title in slide {} \"{}\" is converted to \"{}\" as specified in title file",
                            slide,
                            raw,
                            found.text
                        );
                    }
                    self.cursor = found.index + 1;
                    (found.depth, found.text)
                }
                None => {
                    log::debug!("Title in slide {} \"{}\" is not in the title file", slide, raw);
                    (outline.max_depth(), raw.to_string())
                }
            },
        };

        let repeated = self
            .last_title
            .as_deref()
            .is_some_and(|last| match_score(last, &text) > TITLE_MATCH_THRESHOLD);
        self.last_title = Some(text.clone());

        if !repeated {
            return Some(Heading::new(level, text));
        }
        if self.keep_similar {
            Some(Heading::new(level, format!("{}{}", text, CONTINUATION_SUFFIX)))
        } else {
            log::debug!("Dropping repeated title \"{}\" on slide {}", text, slide);
            None
        }
    }
}
