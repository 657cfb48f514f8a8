//! FrameGrabber - single-frame capture from the camera device
//!
//! ## Responsibilities
//!
//! - Probe the capture device at startup (fatal if absent)
//! - Grab one JPEG frame per call via ffmpeg
//!
//! Frame failures after startup are transient: the scan loop backs off and
//! retries on the next iteration.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Per-frame ffmpeg deadline.
const FRAME_TIMEOUT_SECS: u64 = 5;

/// FrameGrabber instance
#[derive(Clone)]
pub struct FrameGrabber {
    device: PathBuf,
}

impl FrameGrabber {
    /// Create a grabber for the given V4L2 device node.
    pub fn new(device: PathBuf) -> Self {
        Self { device }
    }

    /// Probe the capture device.
    ///
    /// Called once at startup; a missing device means the controller cannot
    /// operate and the process must not enter the scan loop.
    pub async fn open(&self) -> Result<()> {
        tokio::fs::metadata(&self.device).await.map_err(|e| {
            Error::Capture(format!(
                "capture device {} unavailable: {}",
                self.device.display(),
                e
            ))
        })?;

        tracing::info!(device = %self.device.display(), "Capture device ready");
        Ok(())
    }

    /// Grab one JPEG frame from the device.
    ///
    /// Spawns ffmpeg with kill_on_drop(true) so a timeout drops the Child and
    /// SIGKILLs the process rather than leaving it behind.
    pub async fn grab(&self) -> Result<Vec<u8>> {
        let child = Command::new("ffmpeg")
            .args(["-f", "v4l2", "-i"])
            .arg(&self.device)
            .args([
                "-frames:v", "1",
                "-f", "image2pipe",
                "-vcodec", "mjpeg",
                "-loglevel", "error",
                "-y",
                "-",
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Capture(format!("ffmpeg spawn failed: {e}")))?;

        let deadline = Duration::from_secs(FRAME_TIMEOUT_SECS);

        match tokio::time::timeout(deadline, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    return Err(Error::Capture(format!("ffmpeg failed: {}", stderr.trim())));
                }

                if output.stdout.is_empty() {
                    return Err(Error::Capture("ffmpeg returned empty frame".to_string()));
                }

                Ok(output.stdout)
            }
            Ok(Err(e)) => Err(Error::Capture(format!("ffmpeg execution failed: {e}"))),
            Err(_) => {
                tracing::warn!(
                    timeout_sec = FRAME_TIMEOUT_SECS,
                    device = %self.device.display(),
                    "ffmpeg timeout, process killed via kill_on_drop"
                );
                Err(Error::Capture(format!(
                    "frame capture timeout ({FRAME_TIMEOUT_SECS}s)"
                )))
            }
        }
    }

    /// Device node this grabber reads from.
    pub fn device(&self) -> &PathBuf {
        &self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_fails_for_missing_device() {
        let grabber = FrameGrabber::new(PathBuf::from("/dev/video-does-not-exist"));
        let err = grabber.open().await.unwrap_err();
        assert!(matches!(err, Error::Capture(_)));
    }
}
