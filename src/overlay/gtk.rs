//! GTK4 grid overlay on the X11 backend, run on the **main thread**.
//!
//! # Widget tree
//!
//! ```text
//! window                 (maximized + undecorated, or fullscreen; transparent)
//! └ gtk4::Overlay
//!     ├ cursor area      (DrawingArea, main child: selection highlight)
//!     └ grid area        (DrawingArea, overlay child: wash + cell lines,
//!                         receives pointer input)
//! ```
//!
//! Input is delivered serially by the GLib main loop; each event goes
//! straight into [`Snapper::handle`] and the loop is quit as soon as the
//! session reaches [`Phase::Done`].

use crate::config::{Rgba, Settings};
use crate::drag::{Phase, PRIMARY_BUTTON};
use crate::geometry::{Geometry, GridLayout, GridSpec};
use crate::render::{grid_lines, highlight_box, GridStyle};
use crate::snapper::{Input, SnapError, Snapper};
use crate::traits::{WindowId, WindowManager};
use gtk4::prelude::*;
use gtk4::{cairo, gdk, glib};
use log::{debug, error, info, warn};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

//  Default CSS

const DEFAULT_CSS: &str = r#"
window,
window.background {
    background-color: transparent;
    background: none;
}
"#;

/// Errors from running the overlay.
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("failed to initialise GTK4: {0}")]
    Init(String),
    #[error(transparent)]
    Snap(#[from] SnapError),
}

//  Shared session state

/// Everything the signal handlers need, cheaply cloneable into each
/// closure.
struct Shared<W: WindowManager> {
    snapper: Rc<RefCell<Snapper<W>>>,
    failure: Rc<RefCell<Option<SnapError>>>,
    main_loop: glib::MainLoop,
    grid_area: gtk4::DrawingArea,
    cursor_area: gtk4::DrawingArea,
    spec: GridSpec,
}

impl<W: WindowManager> Clone for Shared<W> {
    fn clone(&self) -> Self {
        Self {
            snapper: Rc::clone(&self.snapper),
            failure: Rc::clone(&self.failure),
            main_loop: self.main_loop.clone(),
            grid_area: self.grid_area.clone(),
            cursor_area: self.cursor_area.clone(),
            spec: self.spec,
        }
    }
}

impl<W: WindowManager> Shared<W> {
    fn layout(&self) -> GridLayout {
        GridLayout::new(self.spec, self.grid_area.width(), self.grid_area.height())
    }

    fn dispatch(&self, input: Input) {
        let layout = self.layout();
        let result = self.snapper.borrow_mut().handle(input, &layout);
        match result {
            Ok(Phase::Done) => self.main_loop.quit(),
            Ok(_) => self.cursor_area.queue_draw(),
            Err(e) => self.fail(e),
        }
    }

    fn fail(&self, e: SnapError) {
        error!("{}", e);
        *self.failure.borrow_mut() = Some(e);
        self.main_loop.quit();
    }

    /// Hand the overlay's X11 id to the snapper.  The surface may not be
    /// there yet on the first draw, so this is retried on every draw until
    /// it succeeds.
    fn attach_overlay(&self) {
        if self.snapper.borrow().overlay().is_some() {
            return;
        }
        match overlay_xid(&self.grid_area) {
            Some(xid) => {
                let attached = self.snapper.borrow_mut().attach_overlay(WindowId(xid));
                if let Err(e) = attached {
                    self.fail(e);
                }
            }
            None => debug!("could not get X11 id of the grid window, retrying..."),
        }
    }
}

fn overlay_xid(widget: &impl IsA<gtk4::Widget>) -> Option<u32> {
    let native = widget.native()?;
    let surface = native.surface()?;
    let x11 = surface.downcast_ref::<gdk4_x11::X11Surface>()?;
    Some(x11.xid() as u32)
}

//  Public API

/// Show the grid and run the GLib main loop until the session is over.
pub fn run_overlay<W: WindowManager + 'static>(
    snapper: Snapper<W>,
    settings: &Settings,
    css_path: Option<PathBuf>,
) -> Result<(), OverlayError> {
    // the snapper talks X11, so must the overlay
    gdk::set_allowed_backends("x11");
    gtk4::init().map_err(|e| OverlayError::Init(e.to_string()))?;
    info!("GTK4 initialised on main thread");

    load_css(&css_path);

    let style = GridStyle::from(settings);
    let main_loop = glib::MainLoop::new(None, false);

    //  Overlay window
    let window = gtk4::Window::new();
    window.set_title(Some("Gridlock"));
    if settings.fullscreen {
        window.fullscreen();
    } else {
        // Maximized rather than fullscreen so docks and panels keep their
        // reserved space; target coordinates are translated by this
        // window's origin.
        window.maximize();
        window.set_decorated(false);
    }

    let overlay = gtk4::Overlay::new();
    let cursor_area = gtk4::DrawingArea::new();
    let grid_area = gtk4::DrawingArea::new();
    grid_area.set_hexpand(true);
    grid_area.set_vexpand(true);
    overlay.set_child(Some(&cursor_area));
    overlay.add_overlay(&grid_area);
    window.set_child(Some(&overlay));

    let shared = Shared {
        snapper: Rc::new(RefCell::new(snapper)),
        failure: Rc::default(),
        main_loop: main_loop.clone(),
        grid_area: grid_area.clone(),
        cursor_area: cursor_area.clone(),
        spec: settings.grid,
    };

    //  Drawing
    {
        let shared = shared.clone();
        cursor_area.set_draw_func(move |_, cr, width, height| {
            let (rect, visible) = {
                let s = shared.snapper.borrow();
                (s.cursor_rect(), s.highlight_visible())
            };
            if !visible {
                return;
            }
            let layout = GridLayout::new(shared.spec, width, height);
            if let Some(b) = highlight_box(&rect, &layout) {
                if let Err(e) = paint_highlight(cr, style.highlight_color, b) {
                    warn!("highlight draw failed: {}", e);
                }
            }
        });
    }
    {
        let shared = shared.clone();
        grid_area.set_draw_func(move |_, cr, width, height| {
            shared.attach_overlay();
            let layout = GridLayout::new(shared.spec, width, height);
            if let Err(e) = paint_grid(cr, &style, &layout) {
                warn!("grid draw failed: {}", e);
            }
        });
    }

    //  Input
    //
    // The click gesture owns the primary button.  While it tracks a held
    // primary button, further presses only update its sequence and never
    // emit `pressed`, so every other button goes through a legacy
    // controller.
    let click = gtk4::GestureClick::new();
    click.set_button(PRIMARY_BUTTON);
    {
        let shared = shared.clone();
        click.connect_pressed(move |gesture, _, x, y| {
            let button = gesture.current_button();
            debug!("button {} pressed at ({:.0}, {:.0})", button, x, y);
            shared.dispatch(Input::Press { button, x, y });
        });
    }
    {
        let shared = shared.clone();
        click.connect_released(move |gesture, _, _, _| {
            shared.dispatch(Input::Release {
                button: gesture.current_button(),
            });
        });
    }
    grid_area.add_controller(click);

    let buttons = gtk4::EventControllerLegacy::new();
    {
        let shared = shared.clone();
        buttons.connect_event(move |_, event| {
            if event.event_type() != gdk::EventType::ButtonPress {
                return glib::Propagation::Proceed;
            }
            let Some(button) = event.downcast_ref::<gdk::ButtonEvent>().map(|b| b.button()) else {
                return glib::Propagation::Proceed;
            };
            if button == PRIMARY_BUTTON {
                return glib::Propagation::Proceed;
            }
            let (x, y) = event.position().unwrap_or_default();
            debug!("button {} pressed at ({:.0}, {:.0})", button, x, y);
            shared.dispatch(Input::Press { button, x, y });
            glib::Propagation::Stop
        });
    }
    grid_area.add_controller(buttons);

    let motion = gtk4::EventControllerMotion::new();
    {
        let shared = shared.clone();
        motion.connect_motion(move |_, x, y| shared.dispatch(Input::Motion { x, y }));
    }
    grid_area.add_controller(motion);

    let keys = gtk4::EventControllerKey::new();
    {
        let shared = shared.clone();
        keys.connect_key_pressed(move |_, key, _, _| {
            if key == gdk::Key::Escape || key == gdk::Key::q {
                debug!("move-resize aborted by key {:?}", key.name());
                shared.dispatch(Input::Cancel);
                glib::Propagation::Stop
            } else {
                glib::Propagation::Proceed
            }
        });
    }
    window.add_controller(keys);

    {
        let main_loop = main_loop.clone();
        window.connect_close_request(move |_| {
            main_loop.quit();
            glib::Propagation::Proceed
        });
    }

    window.present();
    info!(
        "grid {}x{} shown ({})",
        settings.grid.columns,
        settings.grid.rows,
        if settings.fullscreen { "fullscreen" } else { "maximized" }
    );

    main_loop.run();
    window.destroy();
    debug!("GLib main loop exited");

    let failure = shared.failure.borrow_mut().take();
    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

//  Painting

fn set_color(cr: &cairo::Context, c: Rgba) {
    cr.set_source_rgba(c.red, c.green, c.blue, c.alpha);
}

fn paint_highlight(cr: &cairo::Context, color: Rgba, b: Geometry) -> Result<(), cairo::Error> {
    set_color(cr, color);
    cr.rectangle(
        f64::from(b.x),
        f64::from(b.y),
        f64::from(b.width),
        f64::from(b.height),
    );
    cr.fill()
}

fn paint_grid(cr: &cairo::Context, style: &GridStyle, layout: &GridLayout) -> Result<(), cairo::Error> {
    set_color(cr, style.background_color);
    cr.rectangle(0.0, 0.0, f64::from(layout.width), f64::from(layout.height));
    cr.fill()?;

    set_color(cr, style.grid_color);
    cr.set_line_width(style.thickness);
    cr.set_line_join(cairo::LineJoin::Round);
    for line in grid_lines(layout) {
        cr.move_to(line.from.0, line.from.1);
        cr.line_to(line.to.0, line.to.1);
        cr.stroke()?;
    }
    Ok(())
}

//  CSS loading

/// Install the built-in transparent-window rule, then the user stylesheet
/// on top of it at user priority when one exists.
fn load_css(css_path: &Option<PathBuf>) {
    let Some(display) = gdk::Display::default() else {
        warn!("no GDK display, CSS will not be applied");
        return;
    };

    let builtin = gtk4::CssProvider::new();
    #[allow(deprecated)]
    builtin.load_from_data(DEFAULT_CSS);
    gtk4::style_context_add_provider_for_display(
        &display,
        &builtin,
        gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );

    let Some(path) = css_path.as_ref().filter(|p| p.is_file()) else {
        return;
    };
    let user = gtk4::CssProvider::new();
    user.connect_parsing_error(|_, _, e| warn!("user CSS: {}", e));
    user.load_from_path(path);
    gtk4::style_context_add_provider_for_display(&display, &user, gtk4::STYLE_PROVIDER_PRIORITY_USER);
    debug!("user CSS loaded from {}", path.display());
}
