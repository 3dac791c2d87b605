//! Tooltip placement relative to an anchor rectangle.
//!
//! Placement is a pure function of the anchor, the viewport and the fixed
//! tooltip box. Nothing is carried between calls.

use serde::{Deserialize, Serialize};

/// Viewport-relative rectangle, as returned by `getBoundingClientRect`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Fixed dimensions used for placement.
///
/// `height` is an estimate; the rendered tooltip may differ slightly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TooltipGeometry {
    pub width: f64,
    pub height: f64,
    /// Space between anchor and tooltip.
    pub gap: f64,
    /// Minimum distance from the viewport edges.
    pub margin: f64,
}

impl Default for TooltipGeometry {
    fn default() -> Self {
        Self {
            width: 280.0,
            height: 100.0,
            gap: 8.0,
            margin: 10.0,
        }
    }
}

/// Compute the top-left corner of the tooltip box.
///
/// The box is centered above the anchor. Horizontally it is clamped into the
/// viewport with `margin` on each side; the left clamp is applied last so the
/// result is never left of `margin`, even when the viewport is narrower than
/// the box. If there is no room above, it flips below the anchor.
pub fn place_tooltip(anchor: Rect, viewport: Size, geometry: &TooltipGeometry) -> Point {
    let mut left = anchor.center_x() - geometry.width / 2.0;
    let mut top = anchor.top() - geometry.height - geometry.gap;

    if left + geometry.width > viewport.width - geometry.margin {
        left = viewport.width - geometry.width - geometry.margin;
    }
    if left < geometry.margin {
        left = geometry.margin;
    }

    if top < geometry.margin {
        top = anchor.bottom() + geometry.gap;
    }

    Point { x: left, y: top }
}
