//! Starting, replacing and stopping overlay processes.
//!
//! The baseline discipline is "kill by name, then spawn": the overlay has no
//! state worth keeping, so a level change is a new process. When the running
//! overlay listens on the control socket the change is applied in place
//! instead.

use anyhow::{Context, Result};
use log::{debug, info};
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::constants::{OVERLAY_BIN_COARSE, OVERLAY_BIN_FINE, OVERLAY_KILL_PATTERN};
use crate::control::{self, Request, Response};
use crate::level::{Level, Scale};

/// What [`Launcher::apply`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Off,
    Updated(Level),
    Respawned(Level),
}

#[derive(Debug, Clone)]
pub struct Launcher {
    scale: Scale,
    binary: PathBuf,
    socket: PathBuf,
    pkill: PathBuf,
}

impl Launcher {
    pub fn new(scale: Scale, binary: Option<PathBuf>, socket: PathBuf) -> Self {
        let binary = binary.unwrap_or_else(|| default_overlay_binary(scale));
        Launcher {
            scale,
            binary,
            socket,
            pkill: PathBuf::from("pkill"),
        }
    }

    /// Runs `program` instead of `pkill` to get rid of running overlays. It
    /// receives the process name pattern as its only argument.
    pub fn with_kill_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.pkill = program.into();
        self
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// Dims to `raw_level`, or turns the dimmer off when it is 0 or below.
    pub async fn apply(&self, raw_level: i64) -> Result<Outcome> {
        if raw_level <= 0 {
            self.off().await?;
            return Ok(Outcome::Off);
        }

        let level = self.scale.clamp(raw_level);

        if let Some(Response::Ok { max_level, .. }) =
            control::try_request(&self.socket, &Request::Status).await
        {
            match Scale::from_max_level(max_level) {
                Some(running) if running == self.scale => {
                    let req = Request::SetLevel {
                        level: i64::from(level.get()),
                    };
                    if let Some(Response::Ok { level, .. }) =
                        control::try_request(&self.socket, &req).await
                    {
                        info!("updated running overlay to level {level}");
                        return Ok(Outcome::Updated(level));
                    }
                }
                Some(running) => debug!("running overlay uses the {running} scale, replacing it"),
                None => debug!("running overlay reports {max_level} levels, replacing it"),
            }
        }

        self.kill_overlays()?;
        self.spawn(level)?;
        Ok(Outcome::Respawned(level))
    }

    /// Removes any overlay, politely first.
    pub async fn off(&self) -> Result<()> {
        if control::try_request(&self.socket, &Request::Quit).await.is_some() {
            debug!("running overlay acknowledged quit");
        }
        self.kill_overlays()?;
        info!("dimmer off");
        Ok(())
    }

    /// Level of the running overlay, if one answers on the control socket.
    pub async fn status(&self) -> Option<Response> {
        control::try_request(&self.socket, &Request::Status).await
    }

    fn spawn(&self, level: Level) -> Result<()> {
        let mut child = Command::new(&self.binary)
            .arg(level.to_string())
            .arg("--listen")
            .arg("--socket")
            .arg(&self.socket)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0)
            .spawn()
            .with_context(|| format!("failed to start {}", self.binary.display()))?;

        info!(
            "started overlay with PID {}, level {level}/{}",
            child.id(),
            self.scale.max_level()
        );

        // Reap it once it gets killed, in case we outlive it
        std::thread::spawn(move || child.wait());
        Ok(())
    }

    /// Terminates every overlay process by name. Returns whether any matched.
    fn kill_overlays(&self) -> Result<bool> {
        let status = Command::new(&self.pkill)
            .arg(OVERLAY_KILL_PATTERN)
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("failed to run {}. Is it installed?", self.pkill.display()))?;

        // pkill exits with 1 when nothing matched
        match status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => anyhow::bail!("{} failed: {status}", self.pkill.display()),
        }
    }
}

/// Overlay binary next to the running executable, or on `$PATH`.
pub fn default_overlay_binary(scale: Scale) -> PathBuf {
    let name = match scale {
        Scale::Coarse => OVERLAY_BIN_COARSE,
        Scale::Fine => OVERLAY_BIN_FINE,
    };

    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(name)))
        .filter(|path| path.is_file())
        .unwrap_or_else(|| PathBuf::from(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_binary_matches_scale() {
        let coarse = default_overlay_binary(Scale::Coarse);
        let fine = default_overlay_binary(Scale::Fine);
        assert_eq!(coarse.file_name().unwrap(), OVERLAY_BIN_COARSE);
        assert_eq!(fine.file_name().unwrap(), OVERLAY_BIN_FINE);
    }

    #[test]
    fn kill_pattern_covers_both_variants() {
        let prefix = OVERLAY_KILL_PATTERN.trim_start_matches('^');
        assert!(prefix.len() <= 15);
        assert!(OVERLAY_BIN_COARSE.starts_with(prefix));
        assert!(OVERLAY_BIN_FINE.starts_with(prefix));
    }

    #[test]
    fn explicit_binary_is_kept() {
        let launcher = Launcher::new(
            Scale::Fine,
            Some(PathBuf::from("/opt/dimmer/overlay")),
            PathBuf::from("/tmp/dimmer.sock"),
        );
        assert_eq!(launcher.binary, PathBuf::from("/opt/dimmer/overlay"));
        assert_eq!(launcher.pkill, PathBuf::from("pkill"));
        assert_eq!(launcher.scale(), Scale::Fine);
    }
}
