//! The on-screen grid overlay.
//!
//! When the `overlay-gtk` feature is enabled, [`gtk::run_overlay`] takes
//! over the main thread, shows the grid and feeds pointer and key input to
//! a [`Snapper`](crate::snapper::Snapper) until the session ends.

#[cfg(feature = "overlay-gtk")]
pub mod gtk;
