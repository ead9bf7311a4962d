//! Application configuration.
//!
//! Settings come from two places: an optional JSON file
//! (`$XDG_CONFIG_HOME/gridlock/config.json`, or `--config <path>`) and the
//! command line.  Command-line values win.  The merged result is a
//! [`Settings`] value that is built once at startup and only ever read
//! afterwards.
//!
//! # Example
//!
//! ```json
//! {
//!   "grid": "12,8",
//!   "offset": { "x": 0, "y": -4 },
//!   "offset_csd": { "width": 2, "height": 2 },
//!   "gravity": "static",
//!   "grid_color": "0.0,0.4,1.0,0.8",
//!   "background_color": "0,0,0,0.2",
//!   "highlight_color": "1,1,1,0.3",
//!   "grid_thickness": 5,
//!   "live_preview": true
//! }
//! ```
//!
//! Value strings use the same syntax as the command line:
//!
//! | Value   | Syntax                          |
//! |---------|---------------------------------|
//! | grid    | `columns,rows`, both ≥ 1        |
//! | offset  | `x[,y[,width[,height]]]`        |
//! | color   | `red,green,blue[,alpha]` in 0–1 |

use crate::geometry::{GridSpec, Offset};
use crate::traits::Gravity;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Errors from parsing values or loading the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid color specification {0:?}")]
    Color(String),
    #[error("invalid offset specification {0:?}")]
    Offset(String),
    #[error("invalid grid specification {0:?}, expected \"columns,rows\" with both at least 1")]
    Grid(String),
}

//  Value types

/// An RGBA color, every component in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Rgba {
    pub const fn new(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }
}

impl FromStr for Rgba {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::Color(s.to_string());
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;
        let [red, green, blue, alpha] = match parts.as_slice() {
            [r, g, b] => [*r, *g, *b, 1.0],
            [r, g, b, a] => [*r, *g, *b, *a],
            _ => return Err(invalid()),
        };
        if [red, green, blue, alpha]
            .iter()
            .any(|c| !(0.0..=1.0).contains(c))
        {
            return Err(invalid());
        }
        Ok(Self::new(red, green, blue, alpha))
    }
}

impl TryFrom<String> for Rgba {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Rgba> for String {
    fn from(c: Rgba) -> String {
        format!("{},{},{},{}", c.red, c.green, c.blue, c.alpha)
    }
}

impl FromStr for GridSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::Grid(s.to_string());
        let (cols, rows) = s.split_once(',').ok_or_else(invalid)?;
        let columns: u32 = cols.trim().parse().map_err(|_| invalid())?;
        let rows: u32 = rows.trim().parse().map_err(|_| invalid())?;
        if columns == 0 || rows == 0 {
            return Err(invalid());
        }
        Ok(GridSpec { columns, rows })
    }
}

impl TryFrom<String> for GridSpec {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl FromStr for Offset {
    type Err = ConfigError;

    /// Missing trailing components are zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::Offset(s.to_string());
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<i32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;
        if parts.len() > 4 {
            return Err(invalid());
        }
        let mut padded = [0; 4];
        padded[..parts.len()].copy_from_slice(&parts);
        Ok(Offset::new(padded[0], padded[1], padded[2], padded[3]))
    }
}

//  File schema

/// Contents of the JSON configuration file.
///
/// Every field is optional; a minimal `{}` file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grid: Option<GridSpec>,
    /// Offset for windows decorated by the window manager.
    pub offset: Option<Offset>,
    /// Offset for windows with client-side decorations.
    pub offset_csd: Option<Offset>,
    pub gravity: Option<Gravity>,
    pub grid_color: Option<Rgba>,
    pub background_color: Option<Rgba>,
    pub highlight_color: Option<Rgba>,
    pub grid_thickness: Option<u32>,
    pub live_preview: bool,
    pub hide_cursor: bool,
    pub fullscreen: bool,
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

//  Resolved settings

pub const DEFAULT_GRID_COLOR: Rgba = Rgba::new(0.0, 0.4, 1.0, 0.8);
pub const DEFAULT_BACKGROUND_COLOR: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.2);
pub const DEFAULT_HIGHLIGHT_COLOR: Rgba = Rgba::new(1.0, 1.0, 1.0, 0.3);
pub const DEFAULT_GRID_THICKNESS: u32 = 7;

/// Everything a session needs to know, fixed at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub grid: GridSpec,
    pub offset: Offset,
    pub offset_csd: Offset,
    pub gravity: Gravity,
    pub grid_color: Rgba,
    pub background_color: Rgba,
    pub highlight_color: Rgba,
    pub grid_thickness: u32,
    pub live_preview: bool,
    pub hide_cursor: bool,
    pub fullscreen: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Config::default().into_settings(&Overrides::default())
    }
}

/// Values given on the command line.  `None` / `false` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub grid: Option<GridSpec>,
    pub offset: Option<Offset>,
    pub offset_csd: Option<Offset>,
    pub gravity: Option<Gravity>,
    pub grid_color: Option<Rgba>,
    pub background_color: Option<Rgba>,
    pub highlight_color: Option<Rgba>,
    pub grid_thickness: Option<u32>,
    pub live_preview: bool,
    pub hide_cursor: bool,
    pub fullscreen: bool,
}

impl Config {
    /// Merge command-line overrides on top of the file values.
    pub fn into_settings(self, cli: &Overrides) -> Settings {
        Settings {
            grid: cli.grid.or(self.grid).unwrap_or_default(),
            offset: cli.offset.or(self.offset).unwrap_or_default(),
            offset_csd: cli.offset_csd.or(self.offset_csd).unwrap_or_default(),
            gravity: cli.gravity.or(self.gravity).unwrap_or_default(),
            grid_color: cli.grid_color.or(self.grid_color).unwrap_or(DEFAULT_GRID_COLOR),
            background_color: cli
                .background_color
                .or(self.background_color)
                .unwrap_or(DEFAULT_BACKGROUND_COLOR),
            highlight_color: cli
                .highlight_color
                .or(self.highlight_color)
                .unwrap_or(DEFAULT_HIGHLIGHT_COLOR),
            grid_thickness: cli
                .grid_thickness
                .or(self.grid_thickness)
                .unwrap_or(DEFAULT_GRID_THICKNESS),
            live_preview: cli.live_preview || self.live_preview,
            hide_cursor: cli.hide_cursor || self.hide_cursor,
            fullscreen: cli.fullscreen || self.fullscreen,
        }
    }
}

impl Settings {
    /// The offset matching the target's decoration style.
    ///
    /// Windows that draw their own decorations have identical frame and
    /// client geometry and get `offset_csd`; everything else gets `offset`.
    pub fn offset_for(&self, undecorated: bool) -> Offset {
        if undecorated {
            self.offset_csd
        } else {
            self.offset
        }
    }
}

//  Locations

/// `$XDG_CONFIG_HOME/gridlock`, or `~/.config/gridlock`.
pub fn config_dir() -> PathBuf {
    config_dir_from(std::env::var_os("XDG_CONFIG_HOME"), std::env::var_os("HOME"))
}

fn config_dir_from(xdg_config_home: Option<OsString>, home: Option<OsString>) -> PathBuf {
    xdg_config_home
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| home.map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("gridlock")
}
