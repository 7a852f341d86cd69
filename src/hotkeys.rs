//! Global hotkeys: F3 for the darkest level, F4 for the lightest, Escape to
//! switch the dimmer off and stop listening.

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use tokio::sync::mpsc;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::protocol::Event;

use crate::constants::keysym;
use crate::launcher::Launcher;
use crate::window::keycode_for;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hotkey {
    Darkest,
    Lightest,
    Quit,
}

impl Hotkey {
    const ALL: [Hotkey; 3] = [Hotkey::Darkest, Hotkey::Lightest, Hotkey::Quit];

    pub fn keysym(self) -> u32 {
        match self {
            Hotkey::Darkest => keysym::F3,
            Hotkey::Lightest => keysym::F4,
            Hotkey::Quit => keysym::ESCAPE,
        }
    }

    pub fn from_keysym(sym: u32) -> Option<Hotkey> {
        Hotkey::ALL.into_iter().find(|key| key.keysym() == sym)
    }

    /// Raw level handed to the launcher; 0 means off.
    pub fn level(self, max_level: u32) -> i64 {
        match self {
            Hotkey::Darkest => i64::from(max_level),
            Hotkey::Lightest => 1,
            Hotkey::Quit => 0,
        }
    }
}

/// Grabs the hotkeys and drives `launcher` until Escape is pressed.
pub async fn run(launcher: Launcher, display: Option<String>) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(8);

    let grabber = tokio::task::spawn_blocking(move || grab_loop(display.as_deref(), tx));

    info!("F3 = darkest, F4 = lightest, Escape = off and exit");

    while let Some(key) = rx.recv().await {
        let level = key.level(launcher.scale().max_level());
        match launcher.apply(level).await {
            Ok(outcome) => info!("{key:?}: {outcome:?}"),
            Err(e) => warn!("{key:?} failed: {e:#}"),
        }
        if key == Hotkey::Quit {
            return Ok(());
        }
    }

    // The grab loop only hangs up on its own when something went wrong
    grabber.await.context("hotkey thread panicked")?
}

fn grab_loop(display: Option<&str>, tx: mpsc::Sender<Hotkey>) -> Result<()> {
    let (conn, screen_num) = x11rb::connect(display).context("Failed to connect to X server")?;
    let root = conn.setup().roots[screen_num].root;

    let mut grabbed = 0;
    for key in Hotkey::ALL {
        let Some(code) = keycode_for(&conn, key.keysym())? else {
            warn!("no keycode produces {:#x}, {key:?} unavailable", key.keysym());
            continue;
        };
        conn.grab_key(
            true,
            root,
            ModMask::from(0u16),
            code,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
        )?;
        grabbed += 1;
    }
    conn.flush()?;

    if grabbed == 0 {
        return Err(anyhow!("none of the hotkeys could be grabbed"));
    }

    while let Ok(event) = conn.wait_for_event() {
        if let Event::KeyPress(press) = event {
            let reply = conn.get_keyboard_mapping(press.detail, 1)?.reply()?;
            let key = reply.keysyms.first().copied().and_then(Hotkey::from_keysym);
            if let Some(key) = key {
                if tx.blocking_send(key).is_err() || key == Hotkey::Quit {
                    return Ok(());
                }
            }
        }
    }

    Err(anyhow!("X11 event loop terminated unexpectedly"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keysym_lookup() {
        assert_eq!(Hotkey::from_keysym(0xffc0), Some(Hotkey::Darkest));
        assert_eq!(Hotkey::from_keysym(0xffc1), Some(Hotkey::Lightest));
        assert_eq!(Hotkey::from_keysym(0xff1b), Some(Hotkey::Quit));
        assert_eq!(Hotkey::from_keysym(0x61), None);
    }

    #[test]
    fn levels_follow_scale() {
        assert_eq!(Hotkey::Darkest.level(5), 5);
        assert_eq!(Hotkey::Darkest.level(20), 20);
        assert_eq!(Hotkey::Lightest.level(20), 1);
        assert_eq!(Hotkey::Quit.level(5), 0);
    }
}
