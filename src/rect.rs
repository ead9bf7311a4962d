//! Cell-space selection rectangle.
//!
//! A [`Rect`] is spanned by two grid cells: the *anchor* where the drag
//! started and the *cursor* that follows the pointer.  The corners are
//! stored exactly as the user produced them; ordering into min/max happens
//! only when the rectangle is consumed by [`Rect::normalized_pixel_box`].

use crate::geometry::{CellSize, Geometry};

/// A single grid cell, `(column, row)`, 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

impl Cell {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }
}

impl From<(i32, i32)> for Cell {
    fn from((col, row): (i32, i32)) -> Self {
        Self { col, row }
    }
}

/// A rectangle of grid cells.
///
/// `Empty` until the pointer has been seen over the grid for the first
/// time.  A single-cell rectangle is a `Span` whose two corners coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rect {
    #[default]
    Empty,
    Span { anchor: Cell, cursor: Cell },
}

impl Rect {
    /// A one-cell rectangle at `cell`.
    pub fn cell(cell: Cell) -> Self {
        Rect::Span {
            anchor: cell,
            cursor: cell,
        }
    }

    /// Rectangle spanned by two corners, in any order.
    pub fn span(anchor: Cell, cursor: Cell) -> Self {
        Rect::Span { anchor, cursor }
    }

    /// `true` once both corners are known.
    pub fn is_valid(&self) -> bool {
        matches!(self, Rect::Span { .. })
    }

    /// Move the cursor corner, keeping the anchor.
    ///
    /// An empty rectangle becomes a single cell at `cursor`.
    pub fn with_cursor(self, cursor: Cell) -> Self {
        match self {
            Rect::Empty => Rect::cell(cursor),
            Rect::Span { anchor, .. } => Rect::Span { anchor, cursor },
        }
    }

    /// Top-left and bottom-right cells, inclusive.
    pub fn normalized(&self) -> Option<(Cell, Cell)> {
        match *self {
            Rect::Empty => None,
            Rect::Span { anchor, cursor } => Some((
                Cell::new(anchor.col.min(cursor.col), anchor.row.min(cursor.row)),
                Cell::new(anchor.col.max(cursor.col), anchor.row.max(cursor.row)),
            )),
        }
    }

    /// Scale the rectangle to pixels.
    ///
    /// The bottom-right cell is included in full, so a single-cell
    /// selection is exactly one cell wide and high.  Every component is
    /// truncated towards zero.
    pub fn normalized_pixel_box(&self, cell: CellSize) -> Option<Geometry> {
        let (min, max) = self.normalized()?;
        Some(Geometry {
            x: (f64::from(min.col) * cell.width) as i32,
            y: (f64::from(min.row) * cell.height) as i32,
            width: (f64::from(1 + max.col - min.col) * cell.width) as i32,
            height: (f64::from(1 + max.row - min.row) * cell.height) as i32,
        })
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_size(width: f64, height: f64) -> CellSize {
        CellSize { width, height }
    }

    #[test]
    fn empty_is_invalid() {
        assert!(!Rect::Empty.is_valid());
        assert_eq!(Rect::Empty.normalized_pixel_box(cell_size(10.0, 10.0)), None);
    }

    #[test]
    fn single_cell_is_one_cell_large() {
        let r = Rect::cell(Cell::new(3, 2));
        let b = r.normalized_pixel_box(cell_size(200.0, 100.0)).unwrap();
        assert_eq!(b, Geometry::new(600, 200, 200, 100));
    }

    #[test]
    fn corner_order_does_not_matter() {
        let size = cell_size(123.4, 77.7);
        let pairs = [
            ((0, 0), (3, 2)),
            ((5, 1), (2, 4)),
            ((1, 7), (1, 0)),
            ((9, 9), (9, 9)),
        ];
        for (a, b) in pairs {
            let fwd = Rect::span(a.into(), b.into()).normalized_pixel_box(size);
            let rev = Rect::span(b.into(), a.into()).normalized_pixel_box(size);
            assert_eq!(fwd, rev, "{:?} vs {:?}", a, b);
        }
    }

    #[test]
    fn normalization_does_not_reorder_stored_corners() {
        let r = Rect::span(Cell::new(4, 3), Cell::new(1, 0));
        let _ = r.normalized_pixel_box(cell_size(1.0, 1.0));
        assert_eq!(
            r,
            Rect::Span {
                anchor: Cell::new(4, 3),
                cursor: Cell::new(1, 0)
            }
        );
    }

    #[test]
    fn fractional_cells_truncate() {
        // 1000 / 3 columns
        let size = cell_size(1000.0 / 3.0, 50.0);
        let b = Rect::span(Cell::new(1, 0), Cell::new(2, 0))
            .normalized_pixel_box(size)
            .unwrap();
        assert_eq!(b, Geometry::new(333, 0, 666, 50));
    }

    #[test]
    fn with_cursor_keeps_anchor() {
        let r = Rect::cell(Cell::new(1, 1)).with_cursor(Cell::new(3, 0));
        assert_eq!(r.normalized(), Some((Cell::new(1, 0), Cell::new(3, 1))));
        assert_eq!(Rect::Empty.with_cursor(Cell::new(2, 2)), Rect::cell(Cell::new(2, 2)));
    }

    #[test]
    fn copies_are_independent() {
        let a = Rect::cell(Cell::new(0, 0));
        let b = a.with_cursor(Cell::new(1, 1));
        assert_ne!(a, b);
        assert_eq!(a, Rect::cell(Cell::new(0, 0)));
    }
}
