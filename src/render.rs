//! What the overlay paints, independent of any drawing backend.
//!
//! The overlay draws three things, bottom to top: the selection highlight,
//! a translucent background wash, and the cell lines.  This module only
//! computes *where*; [`overlay::gtk`](crate::overlay) turns it into cairo
//! calls.

use crate::config::{Rgba, Settings};
use crate::geometry::{Geometry, GridLayout};
use crate::rect::Rect;

/// Colors and line thickness for the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridStyle {
    pub grid_color: Rgba,
    pub background_color: Rgba,
    pub highlight_color: Rgba,
    pub thickness: f64,
}

impl From<&Settings> for GridStyle {
    fn from(s: &Settings) -> Self {
        Self {
            grid_color: s.grid_color,
            background_color: s.background_color,
            highlight_color: s.highlight_color,
            thickness: f64::from(s.grid_thickness),
        }
    }
}

/// A straight line segment in overlay-local pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub from: (f64, f64),
    pub to: (f64, f64),
}

/// Inner cell boundaries.  The outer border is left to the screen edge.
///
/// Line positions use integer division so they land on whole pixels.
pub fn grid_lines(layout: &GridLayout) -> Vec<Line> {
    let (w, h) = (i64::from(layout.width), i64::from(layout.height));
    let cols = i64::from(layout.spec.columns);
    let rows = i64::from(layout.spec.rows);

    let verticals = (1..cols).map(|i| {
        let x = (i * w / cols) as f64;
        Line {
            from: (x, 0.0),
            to: (x, (h - 1) as f64),
        }
    });
    let horizontals = (1..rows).map(|i| {
        let y = (i * h / rows) as f64;
        Line {
            from: (0.0, y),
            to: ((w - 1) as f64, y),
        }
    });
    verticals.chain(horizontals).collect()
}

/// Pixel box of the selection highlight, `None` when there is nothing to
/// highlight or the grid has no size yet.
pub fn highlight_box(rect: &Rect, layout: &GridLayout) -> Option<Geometry> {
    let cell = layout.cell_size().ok()?;
    rect.normalized_pixel_box(cell)
}
