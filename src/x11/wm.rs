//! [`WindowManager`] implementation backed by EWMH over X11.
//!
//! Queries read window properties (`_NET_ACTIVE_WINDOW`, `_NET_WM_STATE`,
//! `_NET_FRAME_EXTENTS`, …) directly.  Requests are sent as client
//! messages to the root window, the way pagers ask the window manager to
//! act on a client, and are never waited on.
//!
//! Geometry handed to and returned from this backend is frame-inclusive.
//! The window manager's own frame (`_NET_FRAME_EXTENTS`) is added on reads
//! and removed again before `_NET_MOVERESIZE_WINDOW`, which expects client
//! coordinates.

use crate::geometry::{FrameExtents, Geometry};
use crate::traits::{Gravity, WindowDescription, WindowId, WindowManager, WindowType};
use log::debug;
use std::rc::Rc;
use x11rb::connection::Connection;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError};
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ClientMessageEvent, ConnectionExt, EventMask, PropMode, Window,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

x11rb::atom_manager! {
    /// Atoms gridlock reads or sends.
    pub Atoms: AtomsCookie {
        _NET_ACTIVE_WINDOW,
        _NET_CLIENT_LIST,
        _NET_FRAME_EXTENTS,
        _GTK_FRAME_EXTENTS,
        _NET_MOVERESIZE_WINDOW,
        _NET_WM_STATE,
        _NET_WM_STATE_MAXIMIZED_VERT,
        _NET_WM_STATE_MAXIMIZED_HORZ,
        _NET_WM_STATE_ABOVE,
        _NET_WM_WINDOW_TYPE,
        _NET_WM_WINDOW_TYPE_NORMAL,
        _NET_WM_WINDOW_TYPE_DESKTOP,
        _NET_WM_WINDOW_TYPE_DOCK,
        _NET_WM_WINDOW_TYPE_DIALOG,
        _NET_WM_WINDOW_TYPE_TOOLBAR,
        _NET_WM_WINDOW_TYPE_MENU,
        _NET_WM_WINDOW_TYPE_UTILITY,
        _NET_WM_WINDOW_TYPE_SPLASH,
        _NET_WM_NAME,
        UTF8_STRING,
    }
}

/// Errors that can occur when talking to the X server.
#[derive(Debug, thiserror::Error)]
#[error("X11 error: {0}")]
pub struct X11WmError(String);

impl From<ConnectError> for X11WmError {
    fn from(e: ConnectError) -> Self {
        X11WmError(format!("connect: {}", e))
    }
}

impl From<ConnectionError> for X11WmError {
    fn from(e: ConnectionError) -> Self {
        X11WmError(format!("connection: {}", e))
    }
}

impl From<ReplyError> for X11WmError {
    fn from(e: ReplyError) -> Self {
        X11WmError(format!("reply: {}", e))
    }
}

//  _NET_WM_STATE / _NET_MOVERESIZE_WINDOW encoding

const STATE_REMOVE: u32 = 0;
const STATE_ADD: u32 = 1;

/// Source indication for requests: 2 = pager / direct user action.
const SOURCE_PAGER: u32 = 2;

/// `data.l[0]` of `_NET_MOVERESIZE_WINDOW`: gravity in bits 0–7, the
/// x/y/width/height presence flags in bits 8–11, source in bits 12–13.
fn moveresize_flags(gravity: Gravity) -> u32 {
    gravity.to_x11() | (0b1111 << 8) | (SOURCE_PAGER << 12)
}

/// Shrink a frame-inclusive geometry to the client area inside `frame`.
fn strip_frame(g: Geometry, frame: FrameExtents) -> Geometry {
    let (l, r, t, b) = (frame.left as i32, frame.right as i32, frame.top as i32, frame.bottom as i32);
    Geometry::new(g.x + l, g.y + t, g.width - l - r, g.height - t - b)
}

/// Grow a client geometry by its window-manager `frame`.
fn add_frame(g: Geometry, frame: FrameExtents) -> Geometry {
    let (l, r, t, b) = (frame.left as i32, frame.right as i32, frame.top as i32, frame.bottom as i32);
    Geometry::new(g.x - l, g.y - t, g.width + l + r, g.height + t + b)
}

fn extents_from(values: &[u32]) -> FrameExtents {
    match values {
        [left, right, top, bottom, ..] => FrameExtents::new(*left, *right, *top, *bottom),
        _ => FrameExtents::default(),
    }
}

/// X11 window manager handle.
///
/// Cloning is cheap; clones share the connection.
#[derive(Clone)]
pub struct X11Wm {
    conn: Rc<RustConnection>,
    screen: usize,
    root: Window,
    atoms: Atoms,
}

impl X11Wm {
    /// Connect to `$DISPLAY` and intern the atoms.
    pub fn connect() -> Result<Self, X11WmError> {
        let (conn, screen) = x11rb::connect(None)?;
        let root = conn
            .setup()
            .roots
            .get(screen)
            .map(|s| s.root)
            .ok_or_else(|| X11WmError(format!("no screen {}", screen)))?;
        let atoms = Atoms::new(&conn)?.reply()?;
        debug!("connected to X11 screen {} (root 0x{:x})", screen, root);
        Ok(Self {
            conn: Rc::new(conn),
            screen,
            root,
            atoms,
        })
    }

    /// Whether a compositing manager owns `_NET_WM_CM_S<screen>`.
    pub fn is_composited(&self) -> Result<bool, X11WmError> {
        let name = format!("_NET_WM_CM_S{}", self.screen);
        let atom = self.conn.intern_atom(false, name.as_bytes())?.reply()?.atom;
        let owner = self.conn.get_selection_owner(atom)?.reply()?.owner;
        Ok(owner != x11rb::NONE)
    }

    //  Property helpers

    fn property32(&self, window: Window, property: Atom, type_: impl Into<Atom>) -> Result<Option<Vec<u32>>, X11WmError> {
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, u32::MAX)?
            .reply()?;
        Ok(reply.value32().map(|v| v.collect()))
    }

    fn property_string(&self, window: Window, property: impl Into<Atom>, type_: impl Into<Atom>) -> Result<Option<Vec<u8>>, X11WmError> {
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, u32::MAX)?
            .reply()?;
        if reply.format == 8 && reply.value_len > 0 {
            Ok(Some(reply.value))
        } else {
            Ok(None)
        }
    }

    fn wm_states(&self, id: WindowId) -> Result<Vec<Atom>, X11WmError> {
        Ok(self
            .property32(id.0, self.atoms._NET_WM_STATE, AtomEnum::ATOM)?
            .unwrap_or_default())
    }

    /// Decoration the window manager draws around `id`.
    fn wm_frame(&self, id: WindowId) -> Result<FrameExtents, X11WmError> {
        let values = self
            .property32(id.0, self.atoms._NET_FRAME_EXTENTS, AtomEnum::CARDINAL)?
            .unwrap_or_default();
        Ok(extents_from(&values))
    }

    //  Requests

    fn send_root_message(&self, window: Window, message_type: Atom, data: [u32; 5]) -> Result<(), X11WmError> {
        let event = ClientMessageEvent::new(32, window, message_type, data);
        self.conn.send_event(
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            event,
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn change_state(&self, id: WindowId, action: u32, first: Atom, second: Atom) -> Result<(), X11WmError> {
        self.send_root_message(
            id.0,
            self.atoms._NET_WM_STATE,
            [action, first, second, SOURCE_PAGER, 0],
        )
    }
}

//  WindowManager implementation

impl WindowManager for X11Wm {
    type Error = X11WmError;

    fn active_window(&self) -> Result<Option<WindowId>, Self::Error> {
        let active = self
            .property32(self.root, self.atoms._NET_ACTIVE_WINDOW, AtomEnum::WINDOW)?
            .and_then(|v| v.first().copied())
            .filter(|&w| w != x11rb::NONE);
        Ok(active.map(WindowId))
    }

    fn window_exists(&self, id: WindowId) -> Result<bool, Self::Error> {
        let clients = self
            .property32(self.root, self.atoms._NET_CLIENT_LIST, AtomEnum::WINDOW)?
            .unwrap_or_default();
        Ok(clients.contains(&id.0))
    }

    fn activate(&self, id: WindowId) -> Result<(), Self::Error> {
        self.send_root_message(
            id.0,
            self.atoms._NET_ACTIVE_WINDOW,
            [SOURCE_PAGER, x11rb::CURRENT_TIME, 0, 0, 0],
        )
    }

    fn geometry(&self, id: WindowId) -> Result<Geometry, Self::Error> {
        let client = self.client_geometry(id)?;
        Ok(add_frame(client, self.wm_frame(id)?))
    }

    fn client_geometry(&self, id: WindowId) -> Result<Geometry, Self::Error> {
        let geo = self.conn.get_geometry(id.0)?.reply()?;
        let pos = self
            .conn
            .translate_coordinates(id.0, self.root, 0, 0)?
            .reply()?;
        Ok(Geometry::new(
            i32::from(pos.dst_x),
            i32::from(pos.dst_y),
            i32::from(geo.width),
            i32::from(geo.height),
        ))
    }

    fn is_maximized(&self, id: WindowId) -> Result<bool, Self::Error> {
        let states = self.wm_states(id)?;
        Ok(states.contains(&self.atoms._NET_WM_STATE_MAXIMIZED_VERT)
            && states.contains(&self.atoms._NET_WM_STATE_MAXIMIZED_HORZ))
    }

    fn is_maximized_vertically(&self, id: WindowId) -> Result<bool, Self::Error> {
        Ok(self.wm_states(id)?.contains(&self.atoms._NET_WM_STATE_MAXIMIZED_VERT))
    }

    fn is_maximized_horizontally(&self, id: WindowId) -> Result<bool, Self::Error> {
        Ok(self.wm_states(id)?.contains(&self.atoms._NET_WM_STATE_MAXIMIZED_HORZ))
    }

    fn set_geometry(&self, id: WindowId, gravity: Gravity, geometry: Geometry) -> Result<(), Self::Error> {
        let client = strip_frame(geometry, self.wm_frame(id)?);
        self.send_root_message(
            id.0,
            self.atoms._NET_MOVERESIZE_WINDOW,
            [
                moveresize_flags(gravity),
                client.x as u32,
                client.y as u32,
                client.width.max(1) as u32,
                client.height.max(1) as u32,
            ],
        )
    }

    fn maximize(&self, id: WindowId) -> Result<(), Self::Error> {
        self.change_state(
            id,
            STATE_ADD,
            self.atoms._NET_WM_STATE_MAXIMIZED_VERT,
            self.atoms._NET_WM_STATE_MAXIMIZED_HORZ,
        )
    }

    fn maximize_vertically(&self, id: WindowId) -> Result<(), Self::Error> {
        self.change_state(id, STATE_ADD, self.atoms._NET_WM_STATE_MAXIMIZED_VERT, 0)
    }

    fn maximize_horizontally(&self, id: WindowId) -> Result<(), Self::Error> {
        self.change_state(id, STATE_ADD, self.atoms._NET_WM_STATE_MAXIMIZED_HORZ, 0)
    }

    fn unmaximize(&self, id: WindowId) -> Result<(), Self::Error> {
        self.change_state(
            id,
            STATE_REMOVE,
            self.atoms._NET_WM_STATE_MAXIMIZED_VERT,
            self.atoms._NET_WM_STATE_MAXIMIZED_HORZ,
        )
    }

    fn frame_extents(&self, id: WindowId) -> Result<FrameExtents, Self::Error> {
        let values = self
            .property32(id.0, self.atoms._GTK_FRAME_EXTENTS, AtomEnum::CARDINAL)?
            .unwrap_or_default();
        Ok(extents_from(&values))
    }

    fn window_type(&self, id: WindowId) -> Result<WindowType, Self::Error> {
        let a = &self.atoms;
        let types = self
            .property32(id.0, a._NET_WM_WINDOW_TYPE, AtomEnum::ATOM)?
            .unwrap_or_default();
        let Some(&first) = types.first() else {
            return Ok(WindowType::Normal);
        };
        let ty = match first {
            t if t == a._NET_WM_WINDOW_TYPE_NORMAL => WindowType::Normal,
            t if t == a._NET_WM_WINDOW_TYPE_DESKTOP => WindowType::Desktop,
            t if t == a._NET_WM_WINDOW_TYPE_DOCK => WindowType::Dock,
            t if t == a._NET_WM_WINDOW_TYPE_DIALOG => WindowType::Dialog,
            t if t == a._NET_WM_WINDOW_TYPE_TOOLBAR => WindowType::Toolbar,
            t if t == a._NET_WM_WINDOW_TYPE_MENU => WindowType::Menu,
            t if t == a._NET_WM_WINDOW_TYPE_UTILITY => WindowType::Utility,
            t if t == a._NET_WM_WINDOW_TYPE_SPLASH => WindowType::Splash,
            _ => WindowType::Other,
        };
        Ok(ty)
    }

    fn describe(&self, id: WindowId) -> Result<WindowDescription, Self::Error> {
        let name = match self.property_string(id.0, self.atoms._NET_WM_NAME, self.atoms.UTF8_STRING)? {
            Some(bytes) => bytes,
            None => self
                .property_string(id.0, AtomEnum::WM_NAME, AtomEnum::STRING)?
                .unwrap_or_default(),
        };
        // WM_CLASS is "instance\0class\0"
        let class = self
            .property_string(id.0, AtomEnum::WM_CLASS, AtomEnum::STRING)?
            .unwrap_or_default();
        let class_group = class
            .split(|b| *b == 0)
            .nth(1)
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .unwrap_or_default();
        Ok(WindowDescription {
            name: String::from_utf8_lossy(&name).into_owned(),
            class_group,
        })
    }

    fn prepare_overlay(&self, id: WindowId) -> Result<(), Self::Error> {
        self.conn.change_property32(
            PropMode::REPLACE,
            id.0,
            self.atoms._NET_WM_WINDOW_TYPE,
            AtomEnum::ATOM,
            &[self.atoms._NET_WM_WINDOW_TYPE_UTILITY],
        )?;
        self.change_state(id, STATE_ADD, self.atoms._NET_WM_STATE_ABOVE, 0)
    }
}
