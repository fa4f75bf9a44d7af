//! Image hint derivation: crop box, display size and position class.

use crate::block::Position;
use crate::types::{emu_to_px, CropFractions, Rect};
use serde::{Deserialize, Serialize};

/// Per-edge crop fractions, clamped so that something always remains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CropBox {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl CropBox {
    /// Build from stored fractions. Negative values (padding) clamp to 0;
    /// a pair of opposite edges covering the whole image disables that axis.
    pub fn from_fractions(fractions: &CropFractions) -> Self {
        let clamp = |v: f64| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        let (mut left, mut right) = (clamp(fractions.left), clamp(fractions.right));
        let (mut top, mut bottom) = (clamp(fractions.top), clamp(fractions.bottom));
        if left + right >= 1.0 {
            log::warn!("Horizontal crop {:.3}+{:.3} leaves nothing, ignoring", left, right);
            left = 0.0;
            right = 0.0;
        }
        if top + bottom >= 1.0 {
            log::warn!("Vertical crop {:.3}+{:.3} leaves nothing, ignoring", top, bottom);
            top = 0.0;
            bottom = 0.0;
        }
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left == 0.0 && self.right == 0.0 && self.top == 0.0 && self.bottom == 0.0
    }

    /// Pixel rectangle `(x, y, width, height)` kept from a `width` x `height`
    /// bitmap, or `None` when it would be empty.
    pub fn pixel_rect(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let (w, h) = (width as f64, height as f64);
        let x0 = (w * self.left).round() as u32;
        let x1 = (w * (1.0 - self.right)).round() as u32;
        let y0 = (h * self.top).round() as u32;
        let y1 = (h * (1.0 - self.bottom)).round() as u32;
        if x1 <= x0 || y1 <= y0 || x1 > width || y1 > height {
            return None;
        }
        Some((x0, y0, x1 - x0, y1 - y0))
    }
}

/// Hints derived for one picture shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageHints {
    pub crop: CropBox,
    /// Frame size on the slide, in pixels.
    pub display_size: (u32, u32),
    /// Left edge of the frame, in pixels.
    pub left_px: i64,
    pub position: Position,
}

/// Derive crop, size and position hints for a picture.
pub fn derive_hints(bounds: &Rect, crop: &CropFractions, slide_width: i64) -> ImageHints {
    ImageHints {
        crop: CropBox::from_fractions(crop),
        display_size: (
            emu_to_px(bounds.width).max(0) as u32,
            emu_to_px(bounds.height).max(0) as u32,
        ),
        left_px: emu_to_px(bounds.left),
        position: position_class(bounds, slide_width),
    }
}

/// Position by thirds of slide width, using the shape's center. Centers
/// exactly on a third boundary count as `Center`.
pub fn position_class(bounds: &Rect, slide_width: i64) -> Position {
    if slide_width <= 0 {
        return Position::Center;
    }
    let center = bounds.center_x();
    let third = slide_width as f64 / 3.0;
    if center < third {
        Position::Left
    } else if center > 2.0 * third {
        Position::Right
    } else {
        Position::Center
    }
}
