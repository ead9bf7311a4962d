//! The session orchestrator that ties the drag state, the coordinate mapper
//! and the window manager together.
//!
//! [`Snapper`] owns a [`DragState`] and reacts to [`Input`] by advancing it
//! and carrying out the resulting [`Effect`] through the [`WindowManager`]
//! trait: live previews and the final commit become `set_geometry` calls,
//! a cancel after a live preview restores the [`OriginalGeometry`].

use crate::config::Settings;
use crate::drag::{DragState, Effect, Phase};
use crate::geometry::{compute_target_geometry, Geometry, GridLayout, MapError, Offset};
use crate::rect::Rect;
use crate::traits::{Gravity, WindowId, WindowManager};
use log::{debug, info};

/// Possible errors from a snapping session.
#[derive(Debug, thiserror::Error)]
pub enum SnapError {
    /// The window manager returned an error.
    #[error("window manager error: {0}")]
    WindowManager(String),
    /// The selection could not be mapped to screen coordinates.
    #[error(transparent)]
    Map(#[from] MapError),
    /// A geometry was requested before the overlay window could be found
    /// on screen, so the grid origin is unknown.
    #[error("overlay window is not mapped, grid origin unknown")]
    OverlayNotMapped,
}

fn wm_err<E: std::error::Error>(e: E) -> SnapError {
    SnapError::WindowManager(e.to_string())
}

/// The target's placement before gridlock touched it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginalGeometry {
    pub geometry: Geometry,
    pub maximized_vertically: bool,
    pub maximized_horizontally: bool,
    pub maximized: bool,
}

impl OriginalGeometry {
    /// Snapshot `id`'s current placement.
    pub fn capture<W: WindowManager>(wm: &W, id: WindowId) -> Result<Self, W::Error> {
        Ok(Self {
            geometry: wm.geometry(id)?,
            maximized_vertically: wm.is_maximized_vertically(id)?,
            maximized_horizontally: wm.is_maximized_horizontally(id)?,
            maximized: wm.is_maximized(id)?,
        })
    }
}

/// A discrete input event in overlay-local pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    Press { button: u32, x: f64, y: f64 },
    Motion { x: f64, y: f64 },
    Release { button: u32 },
    /// Escape or `q`.
    Cancel,
}

/// Drives one snapping session for one target window.
///
/// ```ignore
/// let mut snapper = Snapper::new(wm, target, &settings)?;
/// snapper.attach_overlay(overlay_id)?;
/// snapper.handle(Input::Press { button: 1, x: 210.0, y: 5.0 }, &layout)?;
/// ```
pub struct Snapper<W: WindowManager> {
    wm: W,
    target: WindowId,
    original: OriginalGeometry,
    offset: Offset,
    gravity: Gravity,
    hide_cursor: bool,
    overlay: Option<WindowId>,
    drag: DragState,
}

impl<W: WindowManager> Snapper<W> {
    /// Start a session for `target`, snapshotting its current placement.
    pub fn new(wm: W, target: WindowId, settings: &Settings) -> Result<Self, SnapError> {
        let original = OriginalGeometry::capture(&wm, target).map_err(wm_err)?;
        let client = wm.client_geometry(target).map_err(wm_err)?;
        let undecorated = original.geometry == client;
        let offset = settings.offset_for(undecorated);

        debug!("original window geometry:");
        debug!("  geometry = {}", original.geometry);
        debug!("  maximized_vert = {}", original.maximized_vertically);
        debug!("  maximized_horiz = {}", original.maximized_horizontally);
        debug!("  maximized = {}", original.maximized);
        debug!("  undecorated = {}, using offset {}", undecorated, offset);

        Ok(Self {
            wm,
            target,
            original,
            offset,
            gravity: settings.gravity,
            hide_cursor: settings.hide_cursor,
            overlay: None,
            drag: DragState::new(settings.live_preview),
        })
    }

    pub fn wm(&self) -> &W {
        &self.wm
    }

    pub fn original(&self) -> &OriginalGeometry {
        &self.original
    }

    /// The current selection, for drawing.
    pub fn cursor_rect(&self) -> Rect {
        self.drag.cursor_rect()
    }

    /// Whether the selection highlight should be painted.  With
    /// `hide_cursor` the live-previewed window itself is the feedback.
    pub fn highlight_visible(&self) -> bool {
        !(self.hide_cursor && self.drag.live_preview() && self.drag.phase() == Phase::Dragging)
    }

    pub fn overlay(&self) -> Option<WindowId> {
        self.overlay
    }

    /// Register the overlay window once it is on screen.  Later calls are
    /// no-ops.
    pub fn attach_overlay(&mut self, id: WindowId) -> Result<(), SnapError> {
        if self.overlay.is_some() {
            return Ok(());
        }
        debug!("grid window {} is on screen, setting window type", id);
        self.wm.prepare_overlay(id).map_err(wm_err)?;
        self.overlay = Some(id);
        Ok(())
    }

    /// Process one input event and return the resulting phase.
    pub fn handle(&mut self, input: Input, layout: &GridLayout) -> Result<Phase, SnapError> {
        let effect = match input {
            Input::Press { button, x, y } => {
                let cell = layout.cell_at(x, y)?;
                self.drag.press(button, cell)
            }
            Input::Motion { x, y } => {
                let cell = layout.cell_at(x, y)?;
                self.drag.motion(cell)
            }
            Input::Release { button } => self.drag.release(button),
            Input::Cancel => self.drag.cancel(),
        };
        self.execute(effect, layout)?;
        Ok(self.drag.phase())
    }

    fn execute(&mut self, effect: Effect, layout: &GridLayout) -> Result<(), SnapError> {
        match effect {
            Effect::None | Effect::Redraw => Ok(()),
            Effect::Preview(rect) => {
                debug!("live preview redraw triggered");
                self.apply(&rect, layout)
            }
            Effect::Commit(rect) => {
                info!("placing {} at selection {:?}", self.target, rect);
                self.apply(&rect, layout)
            }
            Effect::Rollback => {
                debug!("move-resize aborted, restoring original geometry");
                self.restore()
            }
            Effect::Quit => {
                debug!("move-resize aborted");
                Ok(())
            }
        }
    }

    /// Map `rect` and send it to the target.
    fn apply(&self, rect: &Rect, layout: &GridLayout) -> Result<(), SnapError> {
        let cell = layout.cell_size()?;
        let overlay = self.overlay.ok_or(SnapError::OverlayNotMapped)?;
        let origin = self.wm.geometry(overlay).map_err(wm_err)?.origin();
        let extents = self.wm.frame_extents(self.target).map_err(wm_err)?;
        if !extents.is_zero() {
            debug!("  _GTK_FRAME_EXTENTS detected: {:?}", extents);
        }
        let geometry = compute_target_geometry(rect, cell, origin, self.offset, extents)?;

        if self.wm.is_maximized(self.target).map_err(wm_err)? {
            self.wm.unmaximize(self.target).map_err(wm_err)?;
        }
        self.set_raw_geometry(geometry)
    }

    /// Put the target back exactly where it was, maximize state included.
    fn restore(&self) -> Result<(), SnapError> {
        self.set_raw_geometry(self.original.geometry)?;
        if self.original.maximized_vertically {
            self.wm.maximize_vertically(self.target).map_err(wm_err)?;
        }
        if self.original.maximized_horizontally {
            self.wm.maximize_horizontally(self.target).map_err(wm_err)?;
        }
        if self.original.maximized {
            self.wm.maximize(self.target).map_err(wm_err)?;
        }
        Ok(())
    }

    fn set_raw_geometry(&self, geometry: Geometry) -> Result<(), SnapError> {
        debug!("set_geometry {} on {}", geometry, self.target);
        self.wm
            .set_geometry(self.target, self.gravity, geometry)
            .map_err(wm_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::PRIMARY_BUTTON;
    use crate::geometry::{FrameExtents, GridSpec};
    use crate::traits::{WindowDescription, WindowType};
    use std::cell::{Cell as StdCell, RefCell};

    const TARGET: WindowId = WindowId(0x400001);
    const OVERLAY: WindowId = WindowId(0x600001);

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        SetGeometry(WindowId, Gravity, Geometry),
        Maximize,
        MaximizeVertically,
        MaximizeHorizontally,
        Unmaximize,
    }

    /// Record-keeping mock window manager.
    #[derive(Debug, Default)]
    struct RecorderWm {
        calls: RefCell<Vec<Call>>,
        target_geometry: Geometry,
        target_client_geometry: Geometry,
        overlay_geometry: Geometry,
        extents: FrameExtents,
        max_vert: bool,
        max_horiz: bool,
        maximized: StdCell<bool>,
        prepared: RefCell<Vec<WindowId>>,
    }

    impl RecorderWm {
        fn decorated() -> Self {
            Self {
                target_geometry: Geometry::new(100, 100, 640, 480),
                target_client_geometry: Geometry::new(104, 128, 632, 448),
                ..Self::default()
            }
        }

        fn set_geometry_calls(&self) -> Vec<Geometry> {
            self.calls
                .borrow()
                .iter()
                .filter_map(|c| match c {
                    Call::SetGeometry(_, _, g) => Some(*g),
                    _ => None,
                })
                .collect()
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("recorder error")]
    struct RecorderErr;

    impl WindowManager for RecorderWm {
        type Error = RecorderErr;

        fn active_window(&self) -> Result<Option<WindowId>, RecorderErr> {
            Ok(Some(TARGET))
        }

        fn window_exists(&self, id: WindowId) -> Result<bool, RecorderErr> {
            Ok(id == TARGET)
        }

        fn activate(&self, _: WindowId) -> Result<(), RecorderErr> {
            Ok(())
        }

        fn geometry(&self, id: WindowId) -> Result<Geometry, RecorderErr> {
            match id {
                OVERLAY => Ok(self.overlay_geometry),
                TARGET => Ok(self.target_geometry),
                _ => Err(RecorderErr),
            }
        }

        fn client_geometry(&self, _: WindowId) -> Result<Geometry, RecorderErr> {
            Ok(self.target_client_geometry)
        }

        fn is_maximized(&self, _: WindowId) -> Result<bool, RecorderErr> {
            Ok(self.maximized.get())
        }

        fn is_maximized_vertically(&self, _: WindowId) -> Result<bool, RecorderErr> {
            Ok(self.max_vert)
        }

        fn is_maximized_horizontally(&self, _: WindowId) -> Result<bool, RecorderErr> {
            Ok(self.max_horiz)
        }

        fn set_geometry(&self, id: WindowId, gravity: Gravity, g: Geometry) -> Result<(), RecorderErr> {
            self.calls.borrow_mut().push(Call::SetGeometry(id, gravity, g));
            Ok(())
        }

        fn maximize(&self, _: WindowId) -> Result<(), RecorderErr> {
            self.calls.borrow_mut().push(Call::Maximize);
            self.maximized.set(true);
            Ok(())
        }

        fn maximize_vertically(&self, _: WindowId) -> Result<(), RecorderErr> {
            self.calls.borrow_mut().push(Call::MaximizeVertically);
            Ok(())
        }

        fn maximize_horizontally(&self, _: WindowId) -> Result<(), RecorderErr> {
            self.calls.borrow_mut().push(Call::MaximizeHorizontally);
            Ok(())
        }

        fn unmaximize(&self, _: WindowId) -> Result<(), RecorderErr> {
            self.calls.borrow_mut().push(Call::Unmaximize);
            self.maximized.set(false);
            Ok(())
        }

        fn frame_extents(&self, _: WindowId) -> Result<FrameExtents, RecorderErr> {
            Ok(self.extents)
        }

        fn window_type(&self, _: WindowId) -> Result<WindowType, RecorderErr> {
            Ok(WindowType::Normal)
        }

        fn describe(&self, _: WindowId) -> Result<WindowDescription, RecorderErr> {
            Ok(WindowDescription::default())
        }

        fn prepare_overlay(&self, id: WindowId) -> Result<(), RecorderErr> {
            self.prepared.borrow_mut().push(id);
            Ok(())
        }
    }

    fn layout_4x2() -> GridLayout {
        GridLayout::new(GridSpec { columns: 4, rows: 2 }, 800, 200)
    }

    fn snapper(wm: RecorderWm, settings: &Settings) -> Snapper<RecorderWm> {
        let mut s = Snapper::new(wm, TARGET, settings).unwrap();
        s.attach_overlay(OVERLAY).unwrap();
        s
    }

    /// Hover (1,0), press, drag to (2,1), release.
    fn drag_1_0_to_2_1(s: &mut Snapper<RecorderWm>) -> Phase {
        let l = layout_4x2();
        s.handle(Input::Motion { x: 250.0, y: 50.0 }, &l).unwrap();
        s.handle(Input::Press { button: PRIMARY_BUTTON, x: 250.0, y: 50.0 }, &l).unwrap();
        s.handle(Input::Motion { x: 450.0, y: 150.0 }, &l).unwrap();
        s.handle(Input::Release { button: PRIMARY_BUTTON }, &l).unwrap()
    }

    #[test]
    fn commit_places_window_on_selection() {
        let mut s = snapper(RecorderWm::decorated(), &Settings::default());
        assert_eq!(drag_1_0_to_2_1(&mut s), Phase::Done);
        assert_eq!(
            *s.wm().calls.borrow(),
            vec![Call::SetGeometry(TARGET, Gravity::Current, Geometry::new(200, 0, 400, 200))]
        );
    }

    #[test]
    fn commit_adds_user_offset_for_decorated_windows() {
        let settings = Settings {
            offset: Offset::new(5, -3, 0, 10),
            offset_csd: Offset::new(100, 100, 100, 100),
            gravity: Gravity::Static,
            ..Settings::default()
        };
        let mut s = snapper(RecorderWm::decorated(), &settings);
        drag_1_0_to_2_1(&mut s);
        assert_eq!(
            *s.wm().calls.borrow(),
            vec![Call::SetGeometry(TARGET, Gravity::Static, Geometry::new(205, -3, 400, 210))]
        );
    }

    #[test]
    fn undecorated_windows_use_csd_offset() {
        let wm = RecorderWm {
            target_geometry: Geometry::new(0, 0, 300, 300),
            target_client_geometry: Geometry::new(0, 0, 300, 300),
            ..RecorderWm::default()
        };
        let settings = Settings {
            offset: Offset::new(100, 100, 100, 100),
            offset_csd: Offset::new(1, 2, 3, 4),
            ..Settings::default()
        };
        let mut s = snapper(wm, &settings);
        drag_1_0_to_2_1(&mut s);
        assert_eq!(s.wm().set_geometry_calls(), vec![Geometry::new(201, 2, 403, 204)]);
    }

    #[test]
    fn overlay_origin_and_frame_extents_are_applied() {
        let wm = RecorderWm {
            overlay_geometry: Geometry::new(0, 32, 800, 400),
            extents: FrameExtents::new(10, 10, 5, 15),
            ..RecorderWm::decorated()
        };
        let mut s = snapper(wm, &Settings::default());
        drag_1_0_to_2_1(&mut s);
        assert_eq!(s.wm().set_geometry_calls(), vec![Geometry::new(190, 27, 420, 220)]);
    }

    #[test]
    fn maximized_target_is_unmaximized_first() {
        let wm = RecorderWm::decorated();
        wm.maximized.set(true);
        let mut s = snapper(wm, &Settings::default());
        drag_1_0_to_2_1(&mut s);
        let calls = s.wm().calls.borrow();
        assert_eq!(calls[0], Call::Unmaximize);
        assert!(matches!(calls[1], Call::SetGeometry(..)));
    }

    #[test]
    fn live_preview_reissues_geometry_on_change() {
        let settings = Settings {
            live_preview: true,
            ..Settings::default()
        };
        let mut s = snapper(RecorderWm::decorated(), &settings);
        let l = layout_4x2();
        s.handle(Input::Press { button: PRIMARY_BUTTON, x: 10.0, y: 10.0 }, &l).unwrap();
        s.handle(Input::Motion { x: 20.0, y: 20.0 }, &l).unwrap();
        assert!(s.wm().set_geometry_calls().is_empty());
        s.handle(Input::Motion { x: 210.0, y: 20.0 }, &l).unwrap();
        s.handle(Input::Motion { x: 220.0, y: 30.0 }, &l).unwrap();
        s.handle(Input::Motion { x: 410.0, y: 120.0 }, &l).unwrap();
        s.handle(Input::Release { button: PRIMARY_BUTTON }, &l).unwrap();
        assert_eq!(
            s.wm().set_geometry_calls(),
            vec![
                Geometry::new(0, 0, 400, 100),
                Geometry::new(0, 0, 600, 200),
                Geometry::new(0, 0, 600, 200),
            ]
        );
    }

    #[test]
    fn cancel_after_live_preview_restores_original() {
        let wm = RecorderWm {
            max_vert: true,
            max_horiz: true,
            ..RecorderWm::decorated()
        };
        wm.maximized.set(true);
        let original = wm.target_geometry;
        let settings = Settings {
            live_preview: true,
            ..Settings::default()
        };
        let mut s = snapper(wm, &settings);
        let l = layout_4x2();
        s.handle(Input::Press { button: PRIMARY_BUTTON, x: 10.0, y: 10.0 }, &l).unwrap();
        s.handle(Input::Motion { x: 610.0, y: 310.0 }, &l).unwrap();
        s.wm().calls.borrow_mut().clear();

        assert_eq!(s.handle(Input::Cancel, &l).unwrap(), Phase::Done);
        assert_eq!(
            *s.wm().calls.borrow(),
            vec![
                Call::SetGeometry(TARGET, Gravity::Current, original),
                Call::MaximizeVertically,
                Call::MaximizeHorizontally,
                Call::Maximize,
            ]
        );
        assert_eq!(*s.original(), OriginalGeometry {
            geometry: original,
            maximized_vertically: true,
            maximized_horizontally: true,
            maximized: true,
        });
    }

    #[test]
    fn cancel_restores_only_flags_that_were_set() {
        let wm = RecorderWm {
            max_vert: true,
            ..RecorderWm::decorated()
        };
        let settings = Settings {
            live_preview: true,
            ..Settings::default()
        };
        let mut s = snapper(wm, &settings);
        let l = layout_4x2();
        s.handle(Input::Press { button: PRIMARY_BUTTON, x: 10.0, y: 10.0 }, &l).unwrap();
        s.handle(Input::Motion { x: 610.0, y: 10.0 }, &l).unwrap();
        s.wm().calls.borrow_mut().clear();
        s.handle(Input::Press { button: 3, x: 610.0, y: 10.0 }, &l).unwrap();
        assert_eq!(
            *s.wm().calls.borrow(),
            vec![
                Call::SetGeometry(TARGET, Gravity::Current, Geometry::new(100, 100, 640, 480)),
                Call::MaximizeVertically,
            ]
        );
    }

    #[test]
    fn secondary_press_mid_drag_rolls_back_and_ignores_later_release() {
        let settings = Settings {
            live_preview: true,
            ..Settings::default()
        };
        let mut s = snapper(RecorderWm::decorated(), &settings);
        let original = s.original().geometry;
        let l = layout_4x2();
        s.handle(Input::Press { button: PRIMARY_BUTTON, x: 250.0, y: 50.0 }, &l).unwrap();
        s.handle(Input::Motion { x: 450.0, y: 150.0 }, &l).unwrap();
        assert_eq!(s.wm().set_geometry_calls(), vec![Geometry::new(200, 0, 400, 200)]);
        s.wm().calls.borrow_mut().clear();

        // the primary button is still held when the middle button goes down
        let phase = s.handle(Input::Press { button: 2, x: 450.0, y: 150.0 }, &l).unwrap();
        assert_eq!(phase, Phase::Done);
        assert_eq!(s.wm().set_geometry_calls(), vec![original]);

        s.wm().calls.borrow_mut().clear();
        s.handle(Input::Release { button: PRIMARY_BUTTON }, &l).unwrap();
        assert!(s.wm().calls.borrow().is_empty());
    }

    #[test]
    fn non_primary_press_while_idle_never_touches_target() {
        let settings = Settings {
            live_preview: true,
            ..Settings::default()
        };
        let mut s = snapper(RecorderWm::decorated(), &settings);
        let l = layout_4x2();
        s.handle(Input::Motion { x: 10.0, y: 10.0 }, &l).unwrap();
        assert_eq!(s.handle(Input::Press { button: 3, x: 10.0, y: 10.0 }, &l).unwrap(), Phase::Done);
        assert!(s.wm().calls.borrow().is_empty());
    }

    #[test]
    fn escape_without_preview_does_nothing() {
        let mut s = snapper(RecorderWm::decorated(), &Settings::default());
        let l = layout_4x2();
        s.handle(Input::Press { button: PRIMARY_BUTTON, x: 10.0, y: 10.0 }, &l).unwrap();
        s.handle(Input::Motion { x: 610.0, y: 310.0 }, &l).unwrap();
        assert_eq!(s.handle(Input::Cancel, &l).unwrap(), Phase::Done);
        assert!(s.wm().calls.borrow().is_empty());
    }

    #[test]
    fn commit_before_overlay_is_mapped_fails() {
        let mut s = Snapper::new(RecorderWm::decorated(), TARGET, &Settings::default()).unwrap();
        let l = layout_4x2();
        s.handle(Input::Press { button: PRIMARY_BUTTON, x: 10.0, y: 10.0 }, &l).unwrap();
        let err = s.handle(Input::Release { button: PRIMARY_BUTTON }, &l).unwrap_err();
        assert!(matches!(err, SnapError::OverlayNotMapped));
    }

    #[test]
    fn zero_sized_grid_fails_fast() {
        let mut s = snapper(RecorderWm::decorated(), &Settings::default());
        let l = GridLayout::new(GridSpec { columns: 4, rows: 2 }, 0, 0);
        let err = s.handle(Input::Motion { x: 1.0, y: 1.0 }, &l).unwrap_err();
        assert!(matches!(err, SnapError::Map(MapError::EmptyGrid { .. })));
    }

    #[test]
    fn overlay_is_prepared_once() {
        let mut s = snapper(RecorderWm::decorated(), &Settings::default());
        s.attach_overlay(WindowId(0x999)).unwrap();
        assert_eq!(*s.wm().prepared.borrow(), vec![OVERLAY]);
        assert_eq!(s.overlay(), Some(OVERLAY));
    }

    #[test]
    fn hide_cursor_hides_highlight_only_while_previewing() {
        let settings = Settings {
            live_preview: true,
            hide_cursor: true,
            ..Settings::default()
        };
        let mut s = snapper(RecorderWm::decorated(), &settings);
        let l = layout_4x2();
        assert!(s.highlight_visible());
        s.handle(Input::Press { button: PRIMARY_BUTTON, x: 10.0, y: 10.0 }, &l).unwrap();
        assert!(!s.highlight_visible());

        let mut plain = snapper(RecorderWm::decorated(), &Settings { hide_cursor: true, ..Settings::default() });
        plain.handle(Input::Press { button: PRIMARY_BUTTON, x: 10.0, y: 10.0 }, &l).unwrap();
        assert!(plain.highlight_visible());
    }
}
