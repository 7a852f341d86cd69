//! Command-line arguments for the overlay and `dimmerctl`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::constants::{HOLD_SECS, SOCKET_DIR, SOCKET_NAME};
use crate::level::{parse_level_arg, Level, Scale};

/// Darken the screen with a click-through black overlay.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct OverlayArgs {
    /// Darkness level. Out-of-range values are clamped; anything that is not
    /// a number counts as 0.
    #[arg(allow_hyphen_values = true)]
    pub level: Option<String>,

    // Extra arguments are ignored, like the level parser ignores trailing junk
    #[arg(hide = true)]
    pub ignored: Vec<String>,

    /// X display to connect to (defaults to $DISPLAY)
    #[arg(long)]
    pub display: Option<String>,

    /// Seconds to keep the overlay mapped
    #[arg(long, env = "DIMMER_HOLD_SECS", default_value_t = HOLD_SECS)]
    pub hold_secs: u64,

    /// Accept level changes on a local control socket
    #[arg(long)]
    pub listen: bool,

    /// Path of the control socket
    #[arg(long, env = "DIMMER_SOCKET")]
    pub socket: Option<PathBuf>,
}

impl OverlayArgs {
    pub fn level(&self, scale: Scale) -> Level {
        match &self.level {
            Some(arg) => scale.clamp(parse_level_arg(arg)),
            None => scale.default_level(),
        }
    }

    pub fn socket_path(&self) -> PathBuf {
        self.socket.clone().unwrap_or_else(default_socket_path)
    }
}

/// Control a running screen dimmer.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct CtlArgs {
    /// Use the 20-level scale instead of the 5-level one
    #[arg(long, global = true)]
    pub fine: bool,

    /// Overlay binary to launch (defaults to the one next to dimmerctl)
    #[arg(long, global = true, env = "DIMMER_OVERLAY_BIN")]
    pub overlay_bin: Option<PathBuf>,

    /// Path of the control socket
    #[arg(long, global = true, env = "DIMMER_SOCKET")]
    pub socket: Option<PathBuf>,

    /// X display for the hotkey grabs (defaults to $DISPLAY)
    #[arg(long, global = true)]
    pub display: Option<String>,

    #[command(subcommand)]
    pub command: CtlCommand,
}

#[derive(Subcommand, Debug)]
pub enum CtlCommand {
    /// Dim to LEVEL; 0 or below turns the dimmer off
    Set {
        #[arg(allow_hyphen_values = true)]
        level: String,
    },
    /// Remove the overlay
    Off,
    /// Show the level of the running overlay
    Status,
    /// Grab F3 (darkest), F4 (lightest) and Escape (off and exit)
    Hotkeys,
}

impl CtlArgs {
    pub fn scale(&self) -> Scale {
        if self.fine {
            Scale::Fine
        } else {
            Scale::Coarse
        }
    }

    pub fn socket_path(&self) -> PathBuf {
        self.socket.clone().unwrap_or_else(default_socket_path)
    }
}

/// `$XDG_RUNTIME_DIR/dimmer/control.sock`, falling back to the temp dir.
pub fn default_socket_path() -> PathBuf {
    let base = std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);
    base.join(SOCKET_DIR).join(SOCKET_NAME)
}
