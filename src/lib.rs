//! Screen dimmer for X11: a full-screen, click-through black overlay whose
//! opacity encodes a darkness level, plus the pieces needed to start,
//! replace and stop it.

pub mod cli;
pub mod constants;
pub mod control;
pub mod error;
pub mod hotkeys;
pub mod launcher;
pub mod level;
pub mod overlay;
pub mod window;

pub use error::DimmerError;
pub use level::{Level, Opacity, Scale};

/// Installs the logger used by every binary. `RUST_LOG` overrides the
/// default `info` filter.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
