//! The drag gesture as a pure state machine.
//!
//! [`DragState`] consumes input in cell coordinates and answers with an
//! [`Effect`] describing what must happen to the target window.  It never
//! talks to the window manager itself; the
//! [`Snapper`](crate::snapper::Snapper) executes the effects.
//!
//! ```text
//!   Idle ──press(primary)──▶ Dragging ──release(primary)──▶ Done  (Commit)
//!    │  ◀──move──┘             │  ◀──move──┘
//!    └──cancel──▶ Done         └──cancel──▶ Done  (Rollback | Quit)
//! ```

use crate::rect::{Cell, Rect};

/// Pointer button that starts and commits a drag.
pub const PRIMARY_BUTTON: u32 = 1;

/// Where the gesture currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Pointer hovers over the grid; the highlight follows it.
    Idle,
    /// Primary button is held; the cursor corner follows the pointer.
    Dragging,
    /// Session over, either committed or cancelled.
    Done,
}

/// What the caller must do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Nothing changed.
    None,
    /// Only the highlight changed; repaint it.
    Redraw,
    /// Apply `Rect` to the target as an intermediate live preview.
    Preview(Rect),
    /// Apply `Rect` to the target as the final placement, then quit.
    Commit(Rect),
    /// Restore the target's original geometry, then quit.
    Rollback,
    /// Quit without touching the target.
    Quit,
}

/// Per-gesture state.
#[derive(Debug, Clone)]
pub struct DragState {
    phase: Phase,
    cursor_rect: Rect,
    last_committed: Rect,
    live_preview: bool,
    /// Set once a preview geometry has actually been sent to the target.
    previewed: bool,
}

impl DragState {
    pub fn new(live_preview: bool) -> Self {
        Self {
            phase: Phase::Idle,
            cursor_rect: Rect::Empty,
            last_committed: Rect::Empty,
            live_preview,
            previewed: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The highlighted selection.
    pub fn cursor_rect(&self) -> Rect {
        self.cursor_rect
    }

    pub fn last_committed(&self) -> Rect {
        self.last_committed
    }

    pub fn live_preview(&self) -> bool {
        self.live_preview
    }

    /// Whether the target has been moved by a live preview.
    pub fn previewed(&self) -> bool {
        self.previewed
    }

    /// A pointer button went down over `cell`.
    pub fn press(&mut self, button: u32, cell: Cell) -> Effect {
        if self.phase == Phase::Done {
            return Effect::None;
        }
        if button != PRIMARY_BUTTON {
            return self.cancel();
        }
        self.phase = Phase::Dragging;
        self.cursor_rect = Rect::cell(cell);
        self.last_committed = self.cursor_rect;
        Effect::Redraw
    }

    /// The pointer moved over `cell`.
    pub fn motion(&mut self, cell: Cell) -> Effect {
        match self.phase {
            Phase::Done => Effect::None,
            Phase::Idle => {
                let next = Rect::cell(cell);
                if next == self.cursor_rect {
                    return Effect::None;
                }
                self.cursor_rect = next;
                Effect::Redraw
            }
            Phase::Dragging => {
                self.cursor_rect = self.cursor_rect.with_cursor(cell);
                if self.live_preview && self.cursor_rect != self.last_committed {
                    self.last_committed = self.cursor_rect;
                    self.previewed = true;
                    Effect::Preview(self.cursor_rect)
                } else {
                    Effect::Redraw
                }
            }
        }
    }

    /// A pointer button went up.  Only the primary button ends a drag.
    pub fn release(&mut self, button: u32) -> Effect {
        if self.phase != Phase::Dragging || button != PRIMARY_BUTTON {
            return Effect::None;
        }
        self.phase = Phase::Done;
        self.last_committed = self.cursor_rect;
        Effect::Commit(self.cursor_rect)
    }

    /// Abort the session.
    ///
    /// The target only needs restoring when a live preview already moved
    /// it.
    pub fn cancel(&mut self) -> Effect {
        if self.phase == Phase::Done {
            return Effect::None;
        }
        self.phase = Phase::Done;
        if self.previewed {
            Effect::Rollback
        } else {
            Effect::Quit
        }
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;

    fn c(col: i32, row: i32) -> Cell {
        Cell::new(col, row)
    }

    #[test]
    fn idle_motion_tracks_single_cell() {
        let mut s = DragState::new(false);
        assert_eq!(s.motion(c(2, 3)), Effect::Redraw);
        assert_eq!(s.cursor_rect(), Rect::cell(c(2, 3)));
        assert_eq!(s.motion(c(2, 3)), Effect::None);
        assert_eq!(s.motion(c(0, 1)), Effect::Redraw);
        assert_eq!(s.cursor_rect(), Rect::cell(c(0, 1)));
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn press_anchors_and_motion_moves_cursor_corner() {
        let mut s = DragState::new(false);
        s.press(PRIMARY_BUTTON, c(1, 0));
        assert_eq!(s.phase(), Phase::Dragging);
        s.motion(c(2, 1));
        assert_eq!(s.cursor_rect(), Rect::span(c(1, 0), c(2, 1)));
        s.motion(c(0, 0));
        assert_eq!(s.cursor_rect(), Rect::span(c(1, 0), c(0, 0)));
    }

    #[test]
    fn release_commits_final_rect() {
        let mut s = DragState::new(false);
        s.motion(c(1, 0));
        s.press(PRIMARY_BUTTON, c(1, 0));
        s.motion(c(2, 1));
        assert_eq!(s.release(PRIMARY_BUTTON), Effect::Commit(Rect::span(c(1, 0), c(2, 1))));
        assert_eq!(s.phase(), Phase::Done);
    }

    #[test]
    fn release_commits_even_after_identical_preview() {
        let mut s = DragState::new(true);
        s.press(PRIMARY_BUTTON, c(0, 0));
        let r = Rect::span(c(0, 0), c(1, 1));
        assert_eq!(s.motion(c(1, 1)), Effect::Preview(r));
        assert_eq!(s.release(PRIMARY_BUTTON), Effect::Commit(r));
    }

    #[test]
    fn non_primary_release_is_ignored() {
        let mut s = DragState::new(false);
        s.press(PRIMARY_BUTTON, c(0, 0));
        assert_eq!(s.release(3), Effect::None);
        assert_eq!(s.phase(), Phase::Dragging);
    }

    #[test]
    fn non_primary_press_while_idle_quits() {
        let mut s = DragState::new(true);
        s.motion(c(4, 4));
        assert_eq!(s.press(3, c(4, 4)), Effect::Quit);
        assert_eq!(s.phase(), Phase::Done);
    }

    #[test]
    fn live_preview_only_fires_on_change() {
        let mut s = DragState::new(true);
        s.press(PRIMARY_BUTTON, c(1, 1));
        // still on the anchor cell
        assert_eq!(s.motion(c(1, 1)), Effect::Redraw);
        assert!(!s.previewed());
        let r = Rect::span(c(1, 1), c(2, 1));
        assert_eq!(s.motion(c(2, 1)), Effect::Preview(r));
        assert_eq!(s.motion(c(2, 1)), Effect::Redraw);
        assert_eq!(s.last_committed(), r);
        assert!(s.previewed());
    }

    #[test]
    fn without_live_preview_motion_never_previews() {
        let mut s = DragState::new(false);
        s.press(PRIMARY_BUTTON, c(0, 0));
        for col in 0..5 {
            assert_eq!(s.motion(c(col, 2)), Effect::Redraw);
        }
        assert_eq!(s.cancel(), Effect::Quit);
    }

    #[test]
    fn cancel_after_preview_rolls_back() {
        let mut s = DragState::new(true);
        s.press(PRIMARY_BUTTON, c(0, 0));
        s.motion(c(3, 3));
        assert_eq!(s.press(2, c(3, 3)), Effect::Rollback);
        assert_eq!(s.phase(), Phase::Done);
    }

    #[test]
    fn done_is_terminal() {
        let mut s = DragState::new(true);
        s.cancel();
        assert_eq!(s.press(PRIMARY_BUTTON, c(0, 0)), Effect::None);
        assert_eq!(s.motion(c(1, 1)), Effect::None);
        assert_eq!(s.release(PRIMARY_BUTTON), Effect::None);
        assert_eq!(s.cancel(), Effect::None);
        assert_eq!(s.phase(), Phase::Done);
    }
}
