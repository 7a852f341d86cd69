// Constants shared across multiple modules

// How long an overlay stays mapped before it tears itself down
pub const HOLD_SECS: u64 = 3600;

// Window manager hints
pub const NET_WM_WINDOW_TYPE: &str = "_NET_WM_WINDOW_TYPE";
pub const NET_WM_WINDOW_TYPE_DESKTOP: &str = "_NET_WM_WINDOW_TYPE_DESKTOP";
pub const NET_WM_WINDOW_OPACITY: &str = "_NET_WM_WINDOW_OPACITY";
pub const WINDOW_NAME: &str = "dimmer";

// Fully opaque value of the opacity property
pub const FULL_OPACITY: u32 = 0xFF00_0000;

// Overlay binaries. The kernel truncates process names to 15 bytes, so the
// kill pattern is the common prefix of both variants.
pub const OVERLAY_BIN_COARSE: &str = "dimmer_passthrough";
pub const OVERLAY_BIN_FINE: &str = "dimmer_passthrough_20lvl";
pub const OVERLAY_KILL_PATTERN: &str = "^dimmer_passthro";

// Control channel
pub const SOCKET_DIR: &str = "dimmer";
pub const SOCKET_NAME: &str = "control.sock";
pub const CONTROL_TIMEOUT_MS: u64 = 500;

// X11 keysym constants for the global hotkeys
pub mod keysym {
    pub const F3: u32 = 0xffc0;
    pub const F4: u32 = 0xffc1;
    pub const ESCAPE: u32 = 0xff1b;
}
