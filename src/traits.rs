//! The window-manager seam.
//!
//! Everything gridlock needs from the desktop (which window is active, its
//! geometry and maximize state, its decoration extents, and how to move it)
//! goes through [`WindowManager`].  The [`Snapper`](crate::snapper::Snapper)
//! only depends on this trait, so the drag logic can be driven against a
//! recording mock in tests and against [`X11Wm`](crate::x11::wm::X11Wm) in
//! the binary.

use crate::geometry::{FrameExtents, Geometry};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An X11 window id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Reference point the window manager keeps fixed when applying a
/// move/resize.  Values follow the X11 `win_gravity` numbering, with
/// `Current` meaning "whatever the window already uses".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Gravity {
    #[default]
    Current,
    NorthWest,
    North,
    NorthEast,
    West,
    Center,
    East,
    SouthWest,
    South,
    SouthEast,
    Static,
}

impl Gravity {
    /// Numeric value used in `_NET_MOVERESIZE_WINDOW`.
    pub fn to_x11(self) -> u32 {
        match self {
            Gravity::Current => 0,
            Gravity::NorthWest => 1,
            Gravity::North => 2,
            Gravity::NorthEast => 3,
            Gravity::West => 4,
            Gravity::Center => 5,
            Gravity::East => 6,
            Gravity::SouthWest => 7,
            Gravity::South => 8,
            Gravity::SouthEast => 9,
            Gravity::Static => 10,
        }
    }
}

impl FromStr for Gravity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(|c| c.to_lowercase())
            .collect();
        match normalized.as_str() {
            "current" => Ok(Gravity::Current),
            "northwest" => Ok(Gravity::NorthWest),
            "north" => Ok(Gravity::North),
            "northeast" => Ok(Gravity::NorthEast),
            "west" => Ok(Gravity::West),
            "center" => Ok(Gravity::Center),
            "east" => Ok(Gravity::East),
            "southwest" => Ok(Gravity::SouthWest),
            "south" => Ok(Gravity::South),
            "southeast" => Ok(Gravity::SouthEast),
            "static" => Ok(Gravity::Static),
            _ => Err(format!("invalid gravity {:?}", s)),
        }
    }
}

impl TryFrom<String> for Gravity {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Gravity> for String {
    fn from(g: Gravity) -> String {
        let name = match g {
            Gravity::Current => "current",
            Gravity::NorthWest => "northwest",
            Gravity::North => "north",
            Gravity::NorthEast => "northeast",
            Gravity::West => "west",
            Gravity::Center => "center",
            Gravity::East => "east",
            Gravity::SouthWest => "southwest",
            Gravity::South => "south",
            Gravity::SouthEast => "southeast",
            Gravity::Static => "static",
        };
        name.to_string()
    }
}

/// EWMH window type.  Only [`WindowType::Normal`] windows are snapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowType {
    Normal,
    Desktop,
    Dock,
    Dialog,
    Toolbar,
    Menu,
    Utility,
    Splash,
    Other,
}

/// Abstraction over the window manager that owns the target window.
///
/// Geometry is always *frame-inclusive*: it describes the window together
/// with the decoration the window manager draws around it.  Requests are
/// fire-and-forget; implementations must not wait for the window manager
/// to acknowledge them.
pub trait WindowManager {
    /// The error type produced by this window manager.
    type Error: std::error::Error + Send + 'static;

    //  Target resolution

    /// The currently active window, if any.
    fn active_window(&self) -> Result<Option<WindowId>, Self::Error>;

    /// Whether `id` refers to a window managed by the window manager.
    fn window_exists(&self, id: WindowId) -> Result<bool, Self::Error>;

    /// Give focus to `id`.
    fn activate(&self, id: WindowId) -> Result<(), Self::Error>;

    //  Geometry

    /// Frame-inclusive geometry in root coordinates.
    fn geometry(&self, id: WindowId) -> Result<Geometry, Self::Error>;

    /// Geometry of the client window alone.  Equal to
    /// [`geometry`](WindowManager::geometry) for windows the window manager
    /// does not decorate.
    fn client_geometry(&self, id: WindowId) -> Result<Geometry, Self::Error>;

    fn is_maximized(&self, id: WindowId) -> Result<bool, Self::Error>;
    fn is_maximized_vertically(&self, id: WindowId) -> Result<bool, Self::Error>;
    fn is_maximized_horizontally(&self, id: WindowId) -> Result<bool, Self::Error>;

    /// Move and resize `id` to the frame-inclusive `geometry`.
    fn set_geometry(&self, id: WindowId, gravity: Gravity, geometry: Geometry) -> Result<(), Self::Error>;

    fn maximize(&self, id: WindowId) -> Result<(), Self::Error>;
    fn maximize_vertically(&self, id: WindowId) -> Result<(), Self::Error>;
    fn maximize_horizontally(&self, id: WindowId) -> Result<(), Self::Error>;
    fn unmaximize(&self, id: WindowId) -> Result<(), Self::Error>;

    /// Client-side decoration padding, all zero when the window does not
    /// advertise any.
    fn frame_extents(&self, id: WindowId) -> Result<FrameExtents, Self::Error>;

    //  Metadata

    fn window_type(&self, id: WindowId) -> Result<WindowType, Self::Error>;

    /// Window title and class group, for diagnostics.
    fn describe(&self, id: WindowId) -> Result<WindowDescription, Self::Error>;

    /// Mark `id` as gridlock's own overlay: a utility window kept above
    /// everything else.
    fn prepare_overlay(&self, id: WindowId) -> Result<(), Self::Error>;
}

/// Human-readable details about a window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowDescription {
    pub name: String,
    pub class_group: String,
}
