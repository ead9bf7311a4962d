//! Screen geometry and the cell-to-screen coordinate mapper.
//!
//! Turning a cell selection into a window geometry request happens in
//! independent additive stages:
//!
//! 1. scale the selection to local pixels ([`Rect::normalized_pixel_box`]),
//! 2. translate by the overlay window's on-screen origin,
//! 3. add the user [`Offset`],
//! 4. add the [`FrameExtents`] correction.
//!
//! Each stage is its own function and is logged on its own, so a
//! misbehaving correction can be spotted in `--debug` output.

use crate::rect::{Cell, Rect};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// An integer screen rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Top-left corner.
    pub fn origin(&self) -> Point {
        Point {
            x: self.x,
            y: self.y,
        }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x, self.y, self.width, self.height)
    }
}

/// A screen position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Component-wise correction added to a geometry request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Offset {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Offset {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x, self.y, self.width, self.height)
    }
}

impl Add<Offset> for Geometry {
    type Output = Geometry;

    fn add(self, o: Offset) -> Geometry {
        Geometry {
            x: self.x + o.x,
            y: self.y + o.y,
            width: self.width + o.width,
            height: self.height + o.height,
        }
    }
}

impl Add<Point> for Geometry {
    type Output = Geometry;

    fn add(self, p: Point) -> Geometry {
        Geometry {
            x: self.x + p.x,
            y: self.y + p.y,
            ..self
        }
    }
}

/// Decoration padding around a window's drawable area, as advertised in
/// `_GTK_FRAME_EXTENTS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameExtents {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl FrameExtents {
    pub fn new(left: u32, right: u32, top: u32, bottom: u32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// Offset that grows a client-area request by the decoration padding.
    pub fn as_offset(&self) -> Offset {
        let (left, right, top, bottom) = (
            self.left as i32,
            self.right as i32,
            self.top as i32,
            self.bottom as i32,
        );
        Offset::new(-left, -top, left + right, top + bottom)
    }
}

/// Number of grid columns and rows.  Both are at least one; the parser in
/// [`config`](crate::config) rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GridSpec {
    pub columns: u32,
    pub rows: u32,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            columns: 16,
            rows: 10,
        }
    }
}

impl From<GridSpec> for String {
    fn from(g: GridSpec) -> String {
        format!("{},{}", g.columns, g.rows)
    }
}

/// Pixel size of one grid cell.  Fractional, the content area rarely
/// divides evenly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSize {
    pub width: f64,
    pub height: f64,
}

/// Errors from the coordinate mapper.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    /// The selection has no corners yet.
    #[error("cannot map an empty selection")]
    EmptySelection,
    /// The overlay's content area has no pixels to divide into cells.
    #[error("grid content area is {width}x{height}, cannot derive cell size")]
    EmptyGrid { width: i32, height: i32 },
}

/// The grid as laid out in the overlay's content area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub spec: GridSpec,
    /// Content area width in pixels.
    pub width: i32,
    /// Content area height in pixels.
    pub height: i32,
}

impl GridLayout {
    pub fn new(spec: GridSpec, width: i32, height: i32) -> Self {
        Self {
            spec,
            width,
            height,
        }
    }

    pub fn cell_size(&self) -> Result<CellSize, MapError> {
        if self.width <= 0 || self.height <= 0 || self.spec.columns == 0 || self.spec.rows == 0 {
            return Err(MapError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        Ok(CellSize {
            width: f64::from(self.width) / f64::from(self.spec.columns),
            height: f64::from(self.height) / f64::from(self.spec.rows),
        })
    }

    /// Cell under the local pointer position `(px, py)`, clamped to the grid.
    pub fn cell_at(&self, px: f64, py: f64) -> Result<Cell, MapError> {
        let size = self.cell_size()?;
        let col = ((px / size.width).floor() as i32).clamp(0, self.spec.columns as i32 - 1);
        let row = ((py / size.height).floor() as i32).clamp(0, self.spec.rows as i32 - 1);
        Ok(Cell::new(col, row))
    }
}

//  Mapper stages

/// Stage 1: selection in overlay-local pixels.
pub fn local_box(rect: &Rect, cell: CellSize) -> Result<Geometry, MapError> {
    rect.normalized_pixel_box(cell)
        .ok_or(MapError::EmptySelection)
}

/// Stage 2: overlay-local pixels to root-window coordinates.
pub fn to_global(local: Geometry, grid_origin: Point) -> Geometry {
    local + grid_origin
}

/// Stage 3: user-configured correction.
pub fn apply_user_offset(geometry: Geometry, offset: Offset) -> Geometry {
    geometry + offset
}

/// Stage 4: client-side decoration correction.
pub fn apply_frame_extents(geometry: Geometry, extents: FrameExtents) -> Geometry {
    geometry + extents.as_offset()
}

/// Map a cell selection to the geometry to request for the target window.
pub fn compute_target_geometry(
    rect: &Rect,
    cell: CellSize,
    grid_origin: Point,
    user_offset: Offset,
    frame_extents: FrameExtents,
) -> Result<Geometry, MapError> {
    let local = local_box(rect, cell)?;
    let global = to_global(local, grid_origin);
    let offset = apply_user_offset(global, user_offset);
    let target = apply_frame_extents(offset, frame_extents);

    debug!("compute new target geometry");
    debug!("  local target geometry = {}", local);
    debug!("  grid origin = ({}, {})", grid_origin.x, grid_origin.y);
    debug!("  translated geometry = {}", global);
    debug!("  offset = {} -> {}", user_offset, offset);
    debug!("  frame extents = {:?} -> {}", frame_extents, target);

    Ok(target)
}

//  Tests
