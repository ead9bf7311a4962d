//! Entry point for the **gridlock** command.
//!
//! Resolves the target window, checks that it is a normal window and that
//! a compositor is running, then shows the grid overlay on the main thread
//! until the user commits or aborts a selection.  Afterwards the window
//! that was active at startup is activated again.

use clap::Parser;
use gridlock::cli::Cli;
use gridlock::config::{config_dir, Config, ConfigError, Settings};
use gridlock::snapper::{SnapError, Snapper};
use gridlock::traits::{WindowId, WindowManager, WindowType};
use gridlock::x11::wm::{X11Wm, X11WmError};
use log::{debug, error, info, warn};
use std::path::Path;
use std::process::ExitCode;

/// Fatal errors that end the program with a non-zero status.
#[derive(Debug, thiserror::Error)]
enum Fatal {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    X11(#[from] X11WmError),
    #[error("no active window")]
    NoActiveWindow,
    #[error("no such window: {0}")]
    UnknownWindow(WindowId),
    #[error("no compositor running, RGBA visuals are unavailable")]
    NoCompositor,
    #[error(transparent)]
    Snap(#[from] SnapError),
    #[cfg(feature = "overlay-gtk")]
    #[error(transparent)]
    Overlay(#[from] gridlock::overlay::gtk::OverlayError),
    #[cfg(not(feature = "overlay-gtk"))]
    #[error("gridlock was built without the `overlay-gtk` feature")]
    NoOverlay,
}

/// Load the config file.  An explicit `--config` path must be readable;
/// the default location falls back to compiled-in defaults.
fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        let cfg = Config::load(path)?;
        info!("loaded config from {}", path.display());
        return Ok(cfg);
    }
    let path = config_dir().join("config.json");
    if !path.exists() {
        debug!("no config file at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    let cfg = Config::load(&path)?;
    info!("loaded config from {}", path.display());
    Ok(cfg)
}

fn init_logging(debug: bool) {
    let filter = if debug { "gridlock=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();
}

//  Main

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Fatal> {
    let settings = load_config(cli.config.as_deref())?.into_settings(&cli.overrides());
    debug!("settings: {:?}", settings);

    let wm = X11Wm::connect()?;
    let active = wm.active_window()?;

    let target = match cli.window_id {
        Some(id) if wm.window_exists(id)? => id,
        Some(id) => return Err(Fatal::UnknownWindow(id)),
        None => active.ok_or(Fatal::NoActiveWindow)?,
    };

    let description = wm.describe(target)?;
    let window_type = wm.window_type(target)?;
    debug!("target window:");
    debug!("  id = {}", target);
    debug!("  name = {:?}", description.name);
    debug!("  class_group = {:?}", description.class_group);
    debug!("  type = {:?}", window_type);

    if window_type != WindowType::Normal {
        debug!("window type is not normal, terminating...");
        return Ok(());
    }

    if !wm.is_composited()? {
        return Err(Fatal::NoCompositor);
    }

    let snapper = Snapper::new(wm.clone(), target, &settings)?;
    show_overlay(snapper, &settings)?;

    if let Some(previous) = active {
        if let Err(e) = wm.activate(previous) {
            warn!("could not re-activate window {}: {}", previous, e);
        }
    }
    Ok(())
}

//  Overlay

#[cfg(feature = "overlay-gtk")]
fn show_overlay(snapper: Snapper<X11Wm>, settings: &Settings) -> Result<(), Fatal> {
    let css = config_dir().join("style.css");
    gridlock::overlay::gtk::run_overlay(snapper, settings, Some(css))?;
    Ok(())
}

#[cfg(not(feature = "overlay-gtk"))]
fn show_overlay(_snapper: Snapper<X11Wm>, _settings: &Settings) -> Result<(), Fatal> {
    Err(Fatal::NoOverlay)
}
