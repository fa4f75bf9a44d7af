//! Layout heuristics: content density, font scaling and automatic
//! two-column splitting.

use crate::block::{spans_text, Block, ListItem, ScalingClass, Slide, SlideLayoutHints};
use crate::normalize::visible_len;

/// Non-whitespace characters that fit comfortably on one slide.
pub const DENSITY_NORMALIZER: f64 = 400.0;

/// Density above which the scaling class becomes `Reduced`.
pub const REDUCED_DENSITY: f64 = 1.0;

/// Density above which the scaling class becomes `Minimal`.
pub const MINIMAL_DENSITY: f64 = 1.5;

/// Average line length (characters) below which lines count as short.
pub const SHORT_LINE_THRESHOLD: f64 = 40.0;

/// Density of a block sequence: visible characters of paragraphs and list
/// items over [`DENSITY_NORMALIZER`].
pub fn density<'a>(blocks: impl IntoIterator<Item = &'a Block>) -> f64 {
    let chars: usize = text_lines(blocks).iter().map(|line| visible_len(line)).sum();
    chars as f64 / DENSITY_NORMALIZER
}

pub fn scaling_for(density: f64) -> ScalingClass {
    if density > MINIMAL_DENSITY {
        ScalingClass::Minimal
    } else if density > REDUCED_DENSITY {
        ScalingClass::Reduced
    } else {
        ScalingClass::Normal
    }
}

/// Average characters per paragraph or list item; 0 without any.
pub fn average_line_length<'a>(blocks: impl IntoIterator<Item = &'a Block>) -> f64 {
    let lines = text_lines(blocks);
    if lines.is_empty() {
        return 0.0;
    }
    let chars: usize = lines.iter().map(|line| line.trim().chars().count()).sum();
    chars as f64 / lines.len() as f64
}

fn text_lines<'a>(blocks: impl IntoIterator<Item = &'a Block>) -> Vec<String> {
    let mut lines = Vec::new();
    for block in blocks {
        match block {
            Block::Paragraph(spans) => lines.push(spans_text(spans)),
            Block::List(items) => lines.extend(items.iter().map(|item| spans_text(&item.spans))),
            _ => {}
        }
    }
    lines
}

/// Two-column decision. Returns whether to split and the resulting
/// scaling class, which relaxes one step when splitting.
pub fn decide_columns(
    scaling: ScalingClass,
    average_line_length: f64,
    source_multi_column: bool,
) -> (bool, ScalingClass) {
    let split = !source_multi_column
        && scaling >= ScalingClass::Reduced
        && average_line_length < SHORT_LINE_THRESHOLD;
    if split {
        (true, scaling.relaxed())
    } else {
        (false, scaling)
    }
}

/// Number of units a column split distributes: list items count one each.
pub fn split_units(blocks: &[Block]) -> usize {
    blocks
        .iter()
        .map(|block| match block {
            Block::List(items) => items.len(),
            _ => 1,
        })
        .sum()
}

/// Blocks that take part in a column split: everything but the heading and
/// notes.
pub fn splittable(blocks: &[Block]) -> Vec<&Block> {
    blocks
        .iter()
        .filter(|block| !matches!(block, Block::Heading(_) | Block::Note(_)))
        .collect()
}

/// Compute the layout hints of a finished slide.
pub fn compute_hints(slide: &Slide) -> SlideLayoutHints {
    let density = density(slide.all_blocks());
    let scaling = scaling_for(density);

    let content: Vec<Block> = splittable(&slide.blocks).into_iter().cloned().collect();
    let (mut column_split, mut effective) = decide_columns(
        scaling,
        average_line_length(&content),
        slide.is_multi_column(),
    );
    let has_table = content.iter().any(|block| matches!(block, Block::Table(_)));
    if column_split && (split_units(&content) < 2 || has_table) {
        column_split = false;
        effective = scaling;
    }

    SlideLayoutHints {
        density,
        scaling: effective,
        column_split,
        column_count: if column_split { 2 } else { 1 },
    }
}

/// Split content into two halves by unit, the first half taking the extra
/// unit. Lists cut across the boundary become two lists.
pub fn split_in_two(blocks: &[Block]) -> (Vec<Block>, Vec<Block>) {
    let total = split_units(blocks);
    let first_len = total.div_ceil(2);
    let mut first = Vec::new();
    let mut second = Vec::new();
    let mut taken = 0;

    for block in blocks {
        match block {
            Block::List(items) if taken < first_len && taken + items.len() > first_len => {
                let cut = first_len - taken;
                first.push(Block::List(items[..cut].to_vec()));
                second.push(Block::List(rebase(&items[cut..])));
                taken += items.len();
            }
            _ => {
                let units = split_units(std::slice::from_ref(block));
                if taken < first_len {
                    first.push(block.clone());
                } else {
                    second.push(block.clone());
                }
                taken += units;
            }
        }
    }
    (first, second)
}

/// Shift a list tail so it starts at depth 0, keeping relative nesting and
/// the adjacent-depth invariant.
fn rebase(items: &[ListItem]) -> Vec<ListItem> {
    let base = items.first().map(|item| item.depth).unwrap_or(0);
    let mut out: Vec<ListItem> = Vec::with_capacity(items.len());
    for item in items {
        let wanted = item.depth.saturating_sub(base);
        let depth = match out.last() {
            None => 0,
            Some(previous) => wanted.clamp(previous.depth.saturating_sub(1), previous.depth + 1),
        };
        out.push(ListItem {
            depth,
            spans: item.spans.clone(),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Heading, Span, Table};

    fn item(depth: usize, text: &str) -> ListItem {
        ListItem {
            depth,
            spans: vec![Span::plain(text)],
        }
    }

    #[test]
    fn test_scaling_thresholds() {
        assert_eq!(scaling_for(0.5), ScalingClass::Normal);
        assert_eq!(scaling_for(1.0), ScalingClass::Normal);
        assert_eq!(scaling_for(1.2), ScalingClass::Reduced);
        assert_eq!(scaling_for(1.5), ScalingClass::Reduced);
        assert_eq!(scaling_for(2.0), ScalingClass::Minimal);
    }

    #[test]
    fn test_minimal_short_lines_split() {
        let (split, scaling) = decide_columns(ScalingClass::Minimal, 35.0, false);
        assert!(split);
        assert_eq!(scaling, ScalingClass::Reduced);

        let (split, scaling) = decide_columns(ScalingClass::Minimal, 45.0, false);
        assert!(!split);
        assert_eq!(scaling, ScalingClass::Minimal);
    }

    #[test]
    fn test_no_split_for_source_columns_or_normal() {
        assert!(!decide_columns(ScalingClass::Minimal, 10.0, true).0);
        assert!(!decide_columns(ScalingClass::Normal, 10.0, false).0);
        assert!(decide_columns(ScalingClass::Reduced, 10.0, false).0);
    }

    #[test]
    fn test_density_counts_text_blocks_only() {
        let blocks = vec![
            Block::Heading(Heading::new(1, "x".repeat(100))),
            Block::Paragraph(vec![Span::plain("a b c d")]),
            Block::List(vec![item(0, "ef"), item(1, "g")]),
        ];
        assert_eq!(density(&blocks), 7.0 / DENSITY_NORMALIZER);
        assert_eq!(average_line_length(&blocks), (7.0 + 2.0 + 1.0) / 3.0);
    }

    #[test]
    fn test_compute_hints_splits_dense_short_list() {
        let items: Vec<ListItem> = (0..40)
            .map(|i| item(0, &format!("short item number {:02}", i)))
            .collect();
        let mut slide = Slide::new(1);
        slide.blocks.push(Block::Heading(Heading::new(1, "Title")));
        slide.blocks.push(Block::List(items));
        let hints = compute_hints(&slide);
        assert_eq!(hints.scaling, ScalingClass::Reduced);
        assert!(hints.column_split);
        assert_eq!(hints.column_count, 2);
    }

    #[test]
    fn test_compute_hints_table_prevents_split() {
        let items: Vec<ListItem> = (0..40)
            .map(|i| item(0, &format!("short item number {:02}", i)))
            .collect();
        let mut slide = Slide::new(1);
        slide.blocks.push(Block::List(items));
        slide.blocks.push(Block::Table(Table::default()));
        let hints = compute_hints(&slide);
        assert!(!hints.column_split);
        assert_eq!(hints.scaling, ScalingClass::Minimal);
    }

    #[test]
    fn test_split_in_two_cuts_lists() {
        let blocks = vec![
            Block::Paragraph(vec![Span::plain("p")]),
            Block::List(vec![item(0, "a"), item(1, "b"), item(2, "c"), item(1, "d")]),
        ];
        let (first, second) = split_in_two(&blocks);
        assert_eq!(split_units(&first), 3);
        assert_eq!(split_units(&second), 2);
        let Block::List(tail) = &second[0] else {
            panic!("expected a list");
        };
        assert_eq!(tail.iter().map(|i| i.depth).collect::<Vec<_>>(), vec![0, 0]);
    }
}
