//! The overlay process: one full-screen, black, click-through window whose
//! opacity encodes the darkness level.

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use crate::cli::OverlayArgs;
use crate::constants::WINDOW_NAME;
use crate::control::{self, LevelSink};
use crate::error::DimmerError;
use crate::level::{Level, Opacity, Scale};
use crate::window::{make_click_through, opacity_atom, set_desktop_type, set_opacity, sync};

/// A mapped overlay window and the display connection that owns it.
#[derive(Debug)]
pub struct OverlaySession {
    conn: RustConnection,
    win: Window,
    opacity_atom: Atom,
    scale: Scale,
    level: AtomicU32,
    click_through: bool,
}

impl OverlaySession {
    /// Connects to `display` (or `$DISPLAY`), creates the overlay at `level`
    /// and maps it. Returns once the server has processed everything.
    pub fn open(display: Option<&str>, scale: Scale, level: Level) -> Result<Self, DimmerError> {
        let (conn, screen_num) =
            x11rb::connect(display).map_err(DimmerError::DisplayUnavailable)?;
        let screen = &conn.setup().roots[screen_num];
        let (width, height) = (screen.width_in_pixels, screen.height_in_pixels);

        let win = conn.generate_id()?;
        let values = CreateWindowAux::new()
            .background_pixel(screen.black_pixel)
            .override_redirect(1);

        conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            win,
            screen.root,
            0, 0,
            width, height,
            0,
            WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &values,
        )?;

        conn.change_property8(
            PropMode::REPLACE,
            win,
            AtomEnum::WM_NAME,
            AtomEnum::STRING,
            WINDOW_NAME.as_bytes(),
        )?;
        set_desktop_type(&conn, win)?;

        let opacity_atom = opacity_atom(&conn)?;
        let opacity = scale.opacity(level);
        set_opacity(&conn, win, opacity_atom, opacity)?;

        let click_through = make_click_through(&conn, win)?;
        if !click_through {
            debug!("SHAPE extension unavailable, overlay will block input");
        }

        conn.map_window(win)?;
        sync(&conn)?;

        debug!("overlay window {win:#x} mapped at {width}x{height}");

        Ok(OverlaySession {
            conn,
            win,
            opacity_atom,
            scale,
            level: AtomicU32::new(level.get()),
            click_through,
        })
    }

    pub fn opacity(&self) -> Opacity {
        self.scale.opacity(self.level())
    }

    pub fn is_click_through(&self) -> bool {
        self.click_through
    }

    /// Destroys the window. The connection closes when the session drops.
    pub fn close(&self) -> Result<(), DimmerError> {
        self.conn.destroy_window(self.win)?;
        self.conn.flush()?;
        Ok(())
    }
}

impl LevelSink for OverlaySession {
    fn scale(&self) -> Scale {
        self.scale
    }

    fn level(&self) -> Level {
        self.scale.clamp(i64::from(self.level.load(Ordering::Acquire)))
    }

    fn set_level(&self, level: Level) -> Result<(), DimmerError> {
        set_opacity(&self.conn, self.win, self.opacity_atom, self.scale.opacity(level))?;
        sync(&self.conn)?;
        self.level.store(level.get(), Ordering::Release);
        Ok(())
    }
}

/// Process entry point shared by both overlay binaries.
pub async fn run(scale: Scale, args: OverlayArgs) -> Result<()> {
    let level = args.level(scale);
    let session = Arc::new(
        OverlaySession::open(args.display.as_deref(), scale, level)
            .context("failed to create overlay")?,
    );

    info!(
        "dimming at level {level}/{} (opacity {}), click-through: {}",
        scale.max_level(),
        session.opacity(),
        session.is_click_through()
    );

    let hold = tokio::time::sleep(Duration::from_secs(args.hold_secs));

    let listener = if args.listen {
        let path = args.socket_path();
        match control::bind(&path) {
            Ok(listener) => Some((listener, path)),
            Err(e) => {
                warn!("running without control channel: {e:#}");
                None
            }
        }
    } else {
        None
    };

    match listener {
        Some((listener, path)) => {
            info!("listening for level changes on {}", path.display());
            tokio::select! {
                _ = hold => info!("hold time elapsed"),
                res = control::serve(listener, Arc::clone(&session)) => match res {
                    Ok(()) => info!("quit requested"),
                    Err(e) => error!("control channel failed, shutting down: {e:#}"),
                },
            }
            control::unbind(&path);
        }
        None => {
            hold.await;
            info!("hold time elapsed");
        }
    }

    session.close().context("failed to tear down overlay")?;
    Ok(())
}
