//! Output line drivers
//!
//! The electrical level itself is driven outside the process: the real
//! driver shells out to `gpioset`, and the simulated driver only logs, for
//! hosts without the gate hardware attached.

use crate::error::{Error, Result};
use tokio::process::Command;

/// A binary output line, selected at startup from configuration.
pub enum OutputLine {
    Gpioset(GpiosetLine),
    Simulated(SimulatedLine),
    #[cfg(test)]
    Recording(RecordingLine),
}

impl OutputLine {
    /// Driver invoking the `gpioset` utility for `line` on `chip`.
    pub fn gpioset(chip: impl Into<String>, line: u32) -> Self {
        Self::Gpioset(GpiosetLine {
            chip: chip.into(),
            line,
        })
    }

    /// Log-only driver for hosts without gate hardware.
    pub fn simulated() -> Self {
        Self::Simulated(SimulatedLine)
    }

    /// Test driver recording every level transition.
    #[cfg(test)]
    pub(crate) fn recording() -> (Self, std::sync::Arc<std::sync::Mutex<Vec<bool>>>) {
        let levels = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        (
            Self::Recording(RecordingLine {
                levels: levels.clone(),
            }),
            levels,
        )
    }

    /// Drive the line high.
    pub async fn set_high(&self) -> Result<()> {
        self.set(true).await
    }

    /// Drive the line low.
    pub async fn set_low(&self) -> Result<()> {
        self.set(false).await
    }

    async fn set(&self, high: bool) -> Result<()> {
        match self {
            Self::Gpioset(line) => line.set(high).await,
            Self::Simulated(_) => {
                tracing::info!(level = high as u8, "Simulated output set");
                Ok(())
            }
            #[cfg(test)]
            Self::Recording(line) => {
                line.levels
                    .lock()
                    .expect("recording line lock poisoned")
                    .push(high);
                Ok(())
            }
        }
    }
}

/// Drives one GPIO line through the `gpioset` CLI.
pub struct GpiosetLine {
    chip: String,
    line: u32,
}

impl GpiosetLine {
    async fn set(&self, high: bool) -> Result<()> {
        let output = Command::new("gpioset")
            .arg(&self.chip)
            .arg(format!("{}={}", self.line, u8::from(high)))
            .output()
            .await
            .map_err(|e| Error::Gpio(format!("failed to run gpioset: {e}")))?;

        if !output.status.success() {
            return Err(Error::Gpio(format!(
                "gpioset {} {}={} exited with {}: {}",
                self.chip,
                self.line,
                u8::from(high),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

/// Log-only stand-in for the physical line.
pub struct SimulatedLine;

/// Records transitions for assertions.
#[cfg(test)]
pub struct RecordingLine {
    levels: std::sync::Arc<std::sync::Mutex<Vec<bool>>>,
}
