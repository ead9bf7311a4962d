//! Command-line interface.

use crate::config::{Overrides, Rgba};
use crate::geometry::{GridSpec, Offset};
use crate::traits::{Gravity, WindowId};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

const AFTER_HELP: &str = "\
Specify color components as floats [0.0, 1.0], e.g. \"0.5,0.8,1.0,0.8\" for
light sky blue with 80% opacity.

Caveat: This tool uses RGBA visuals. Compositor needed.";

/// Command-line interface for the `gridlock` binary.
#[derive(Parser, Debug)]
#[command(
    name = "gridlock",
    about = "Move and resize the active window on a static grid",
    version,
    disable_version_flag = true,
    after_help = AFTER_HELP
)]
pub struct Cli {
    /// X11 window id of the target window, defaulting to the active window
    #[arg(value_name = "WINDOW_ID", value_parser = parse_window_id)]
    pub window_id: Option<WindowId>,

    /// Generate debug output, lots of
    #[arg(short, long)]
    pub debug: bool,

    /// Print version information and terminate
    #[arg(short = 'v', long, action = ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,

    /// Gravity for window geometry changes: "current", "northwest", "static", …
    #[arg(short = 'w', long = "window-gravity", visible_alias = "gravity", value_name = "GRAVITY")]
    pub gravity: Option<Gravity>,

    /// Show a live preview of the window while resizing; may cause trouble
    /// if the X11 client does not respond well to rapid geometry changes
    #[arg(short = 'p', long)]
    pub live_preview: bool,

    /// Hide the cursor rectangle in live preview mode
    #[arg(short = 'H', long)]
    pub hide_cursor: bool,

    /// Use fullscreen mode instead of a maximized undecorated window
    #[arg(short = 'f', long)]
    pub fullscreen: bool,

    /// Offset added to the target geometry of WM-decorated windows:
    /// "x,y[,width,height]", can be negative
    #[arg(short = 'o', long, value_name = "OFFSET", allow_hyphen_values = true)]
    pub offset: Option<Offset>,

    /// Like --offset, for windows with client-side decorations
    #[arg(short = 'O', long, value_name = "OFFSET", allow_hyphen_values = true)]
    pub offset_csd: Option<Offset>,

    /// Grid as "columns,rows"
    #[arg(short = 'g', long, value_name = "COLUMNS,ROWS")]
    pub grid: Option<GridSpec>,

    /// Grid color as "red,green,blue[,opacity]"
    #[arg(short = 'c', long, value_name = "COLOR")]
    pub grid_color: Option<Rgba>,

    /// Background color as "red,green,blue[,opacity]"
    #[arg(short = 'b', long = "background-color", visible_alias = "bg-color", value_name = "COLOR")]
    pub background_color: Option<Rgba>,

    /// Highlight color as "red,green,blue[,opacity]"
    #[arg(
        short = 'l',
        long = "hilight-color",
        visible_aliases = ["hi-color", "highlight-color"],
        value_name = "COLOR"
    )]
    pub highlight_color: Option<Rgba>,

    /// Thickness of the grid lines in pixels
    #[arg(short = 't', long, value_name = "PIXELS")]
    pub grid_thickness: Option<u32>,

    /// Configuration file, defaults to $XDG_CONFIG_HOME/gridlock/config.json
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Settings given on the command line, to be merged over the file.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            grid: self.grid,
            offset: self.offset,
            offset_csd: self.offset_csd,
            gravity: self.gravity,
            grid_color: self.grid_color,
            background_color: self.background_color,
            highlight_color: self.highlight_color,
            grid_thickness: self.grid_thickness,
            live_preview: self.live_preview,
            hide_cursor: self.hide_cursor,
            fullscreen: self.fullscreen,
        }
    }
}

/// Parse a window id with an optional `0x`, `0o` or `0b` radix prefix.
pub fn parse_window_id(s: &str) -> Result<WindowId, String> {
    let t = s.trim();
    let lower = t.to_ascii_lowercase();
    let (digits, radix) = match lower.get(..2) {
        Some("0x") => (&t[2..], 16),
        Some("0o") => (&t[2..], 8),
        Some("0b") => (&t[2..], 2),
        _ => (t, 10),
    };
    u32::from_str_radix(digits, radix)
        .map(WindowId)
        .map_err(|e| format!("invalid window id {:?}: {}", s, e))
}
