//! Local control channel for a long-lived overlay.
//!
//! Newline-delimited JSON over a Unix socket. A controller can change the
//! level of a running overlay in place instead of killing it and starting
//! another one, which avoids the moment where zero or two overlays are
//! mapped.

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::os::unix::fs::FileTypeExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

use crate::constants::CONTROL_TIMEOUT_MS;
use crate::error::DimmerError;
use crate::level::{Level, Opacity, Scale};

/// Something whose darkness level can be changed at runtime.
pub trait LevelSink {
    fn scale(&self) -> Scale;
    fn level(&self) -> Level;
    fn set_level(&self, level: Level) -> Result<(), DimmerError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Raw level; clamped by the receiver.
    SetLevel { level: i64 },
    Status,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Response {
    Ok {
        level: Level,
        max_level: u32,
        opacity: Opacity,
    },
    Error {
        message: String,
    },
}

impl Response {
    fn from_sink(sink: &impl LevelSink) -> Self {
        let scale = sink.scale();
        let level = sink.level();
        Response::Ok {
            level,
            max_level: scale.max_level(),
            opacity: scale.opacity(level),
        }
    }
}

/// Binds the control socket at `path`.
///
/// Fails if another process already answers there or if the path is taken by
/// something other than a socket. A stale socket file left behind by a killed
/// overlay is removed.
pub fn bind(path: &Path) -> Result<UnixListener> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    if std::os::unix::net::UnixStream::connect(path).is_ok() {
        bail!("another overlay is already listening on {}", path.display());
    }

    // Only ever clear away a dead socket, never some unrelated file
    if let Ok(meta) = std::fs::symlink_metadata(path) {
        if !meta.file_type().is_socket() {
            bail!("{} exists and is not a socket", path.display());
        }
        std::fs::remove_file(path)
            .with_context(|| format!("failed to remove stale socket {}", path.display()))?;
    }

    UnixListener::bind(path).with_context(|| format!("failed to bind {}", path.display()))
}

pub fn unbind(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        debug!("could not remove {}: {e}", path.display());
    }
}

/// Accepts controllers until one of them sends `quit`.
pub async fn serve<S>(listener: UnixListener, sink: Arc<S>) -> Result<()>
where
    S: LevelSink + Send + Sync + 'static,
{
    let (quit_tx, mut quit_rx) = mpsc::channel::<()>(1);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, _) = accepted.context("failed to accept controller")?;
                let sink = Arc::clone(&sink);
                let quit_tx = quit_tx.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, sink.as_ref(), quit_tx).await {
                        warn!("controller connection failed: {e}");
                    }
                });
            }
            _ = quit_rx.recv() => return Ok(()),
        }
    }
}

async fn handle_client(
    stream: UnixStream,
    sink: &impl LevelSink,
    quit_tx: mpsc::Sender<()>,
) -> Result<(), DimmerError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let (response, quit) = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                debug!("control request: {request:?}");
                dispatch(sink, &request)
            }
            Err(e) => (
                Response::Error {
                    message: format!("bad request: {e}"),
                },
                false,
            ),
        };

        let written = write_response(&mut writer, &response).await;

        // A controller may hang up without waiting for the answer; the quit
        // still has to go through.
        if quit {
            if let Err(e) = written {
                debug!("quit acknowledgement not delivered: {e}");
            }
            let _ = quit_tx.send(()).await;
            break;
        }
        written?;
    }

    Ok(())
}

async fn write_response(
    writer: &mut (impl AsyncWrite + Unpin),
    response: &Response,
) -> Result<(), DimmerError> {
    let mut out = serde_json::to_vec(response)?;
    out.push(b'\n');
    writer.write_all(&out).await?;
    writer.flush().await?;
    Ok(())
}

/// Applies one request. The flag says whether the server should stop.
pub fn dispatch(sink: &impl LevelSink, request: &Request) -> (Response, bool) {
    match request {
        Request::SetLevel { level } => {
            let level = sink.scale().clamp(*level);
            match sink.set_level(level) {
                Ok(()) => (Response::from_sink(sink), false),
                Err(e) => (
                    Response::Error {
                        message: format!("{e}"),
                    },
                    false,
                ),
            }
        }
        Request::Status => (Response::from_sink(sink), false),
        Request::Quit => (Response::from_sink(sink), true),
    }
}

/// Sends one request to the overlay listening on `path`.
pub async fn request(path: &Path, request: &Request) -> Result<Response, DimmerError> {
    let stream = UnixStream::connect(path).await?;
    let (reader, mut writer) = stream.into_split();

    let mut out = serde_json::to_vec(request)?;
    out.push(b'\n');
    writer.write_all(&out).await?;
    writer.flush().await?;

    let mut lines = BufReader::new(reader).lines();
    let line = lines.next_line().await?.ok_or(DimmerError::ControlClosed)?;
    Ok(serde_json::from_str(&line)?)
}

/// Like [`request`], but gives up quickly and treats any failure as "nobody
/// is listening".
pub async fn try_request(path: &Path, req: &Request) -> Option<Response> {
    let timeout = Duration::from_millis(CONTROL_TIMEOUT_MS);
    match tokio::time::timeout(timeout, request(path, req)).await {
        Ok(Ok(response)) => Some(response),
        Ok(Err(e)) => {
            debug!("no overlay on {}: {e}", path.display());
            None
        }
        Err(_) => {
            debug!("overlay on {} did not answer in time", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format() {
        let req = serde_json::to_string(&Request::SetLevel { level: 4 }).unwrap();
        assert_eq!(req, r#"{"op":"set_level","level":4}"#);
        assert_eq!(serde_json::to_string(&Request::Quit).unwrap(), r#"{"op":"quit"}"#);

        let resp: Response =
            serde_json::from_str(r#"{"result":"ok","level":2,"max_level":5,"opacity":1711276032}"#)
                .unwrap();
        let level = Scale::Coarse.clamp(2);
        assert_eq!(
            resp,
            Response::Ok {
                level,
                max_level: 5,
                opacity: Scale::Coarse.opacity(level),
            }
        );
    }

    #[test]
    fn unknown_op_is_rejected() {
        assert!(serde_json::from_str::<Request>(r#"{"op":"explode"}"#).is_err());
    }
}
