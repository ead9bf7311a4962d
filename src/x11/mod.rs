//! X11-specific implementations.
//!
//! This module provides the concrete backend for the
//! [`WindowManager`](crate::traits::WindowManager) trait, talking EWMH to
//! whatever window manager runs on the display through x11rb.
//!
//! Nothing outside this module should reference X11 directly.

pub mod wm;
