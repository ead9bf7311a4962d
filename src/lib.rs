//! **gridlock**: move and resize the active X11 window on a static grid.
//!
//! A transparent overlay covering the work area shows a `columns × rows`
//! grid.  Press the primary button over one cell and release it over
//! another: the target window is snapped to the rectangle spanned by the
//! two cells.  Escape, `q` or any other mouse button aborts.
//!
//! # Architecture
//!
//! The session logic is pure and testable without a display:
//!
//! * [`rect`] and [`drag`] track the selection through press, motion and
//!   release and decide what should happen next.
//! * [`geometry`] maps a cell selection to the window geometry to request.
//! * [`snapper::Snapper`] ties both to a [`traits::WindowManager`], which
//!   abstracts every window query and mutation so the core is not coupled
//!   to a particular window system.
//!
//! Concrete implementations live in [`x11`] (EWMH over `x11rb`) and
//! [`overlay`] (the GTK4 grid window).

pub mod cli;
pub mod config;
pub mod drag;
pub mod geometry;
pub mod overlay;
pub mod rect;
pub mod render;
pub mod snapper;
pub mod traits;
pub mod x11;
