// Shared X11 window utilities

use x11rb::connection::Connection;
use x11rb::protocol::shape::{self, ConnectionExt as _};
use x11rb::protocol::xproto::*;
use x11rb::wrapper::ConnectionExt as _;

use crate::constants::{NET_WM_WINDOW_OPACITY, NET_WM_WINDOW_TYPE, NET_WM_WINDOW_TYPE_DESKTOP};
use crate::error::DimmerError;
use crate::level::Opacity;

pub fn intern_atom(conn: &impl Connection, name: &str) -> Result<Atom, DimmerError> {
    Ok(conn.intern_atom(false, name.as_bytes())?.reply()?.atom)
}

// Mark the window as a desktop layer so the WM leaves it alone
pub fn set_desktop_type(conn: &impl Connection, win: Window) -> Result<(), DimmerError> {
    let window_type = intern_atom(conn, NET_WM_WINDOW_TYPE)?;
    let desktop = intern_atom(conn, NET_WM_WINDOW_TYPE_DESKTOP)?;
    conn.change_property32(PropMode::REPLACE, win, window_type, AtomEnum::ATOM, &[desktop])?;
    Ok(())
}

pub fn set_opacity(
    conn: &impl Connection,
    win: Window,
    opacity_atom: Atom,
    opacity: Opacity,
) -> Result<(), DimmerError> {
    conn.change_property32(
        PropMode::REPLACE,
        win,
        opacity_atom,
        AtomEnum::CARDINAL,
        &[opacity.value()],
    )?;
    Ok(())
}

pub fn opacity_atom(conn: &impl Connection) -> Result<Atom, DimmerError> {
    intern_atom(conn, NET_WM_WINDOW_OPACITY)
}

// Install an empty input shape so pointer and keyboard go to whatever is
// underneath. Returns false when the server has no SHAPE extension.
pub fn make_click_through(conn: &impl Connection, win: Window) -> Result<bool, DimmerError> {
    if conn.extension_information(shape::X11_EXTENSION_NAME)?.is_none() {
        return Ok(false);
    }

    conn.shape_rectangles(
        shape::SO::SET,
        shape::SK::INPUT,
        ClipOrdering::UNSORTED,
        win,
        0,
        0,
        &[],
    )?;

    Ok(true)
}

// Round-trip to the server so every queued request has been processed
pub fn sync(conn: &impl Connection) -> Result<(), DimmerError> {
    conn.flush()?;
    conn.get_input_focus()?.reply()?;
    Ok(())
}

// Look up the keycode that produces `keysym` without modifiers
pub fn keycode_for(conn: &impl Connection, keysym: u32) -> Result<Option<Keycode>, DimmerError> {
    let setup = conn.setup();
    let min = setup.min_keycode;
    let count = setup.max_keycode - min + 1;

    let reply = conn.get_keyboard_mapping(min, count)?.reply()?;
    let per = usize::from(reply.keysyms_per_keycode);
    if per == 0 {
        return Ok(None);
    }

    let found = reply
        .keysyms
        .chunks(per)
        .position(|syms| syms.first() == Some(&keysym))
        .and_then(|i| u8::try_from(i).ok())
        .map(|i| min + i);

    Ok(found)
}
