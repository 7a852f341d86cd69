use thiserror::Error;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};

/// Failures the overlay and its controllers can run into.
///
/// Only `DisplayUnavailable` is expected in practice; the X11 variants cover
/// a connection dying underneath us. A missing SHAPE extension and
/// out-of-range levels are deliberately absent: neither is an error.
#[derive(Debug, Error)]
pub enum DimmerError {
    #[error("cannot open display")]
    DisplayUnavailable(#[source] ConnectError),

    #[error("X11 connection failed")]
    Connection(#[from] ConnectionError),

    #[error("X11 request failed")]
    Reply(#[from] ReplyError),

    #[error("X11 request or id allocation failed")]
    ReplyOrId(#[from] ReplyOrIdError),

    #[error("control channel I/O failed")]
    ControlIo(#[from] std::io::Error),

    #[error("malformed control message")]
    ControlProtocol(#[from] serde_json::Error),

    #[error("control channel closed before a response arrived")]
    ControlClosed,
}
