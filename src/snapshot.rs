use std::process::Command;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Local};
use tracing::debug;

/// One encoded still frame, carried as a data-URL payload the way the
/// submission contract expects it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub data: String,
    pub captured_at: DateTime<Local>,
}

impl Snapshot {
    pub fn from_jpeg_bytes(bytes: &[u8]) -> Self {
        Self {
            data: format!("data:image/jpeg;base64,{}", BASE64.encode(bytes)),
            captured_at: Local::now(),
        }
    }
}

/// Source of biometric evidence. Capture is best-effort: an unavailable or
/// failing camera yields `None`, never an error, and the session proceeds
/// without evidence.
pub trait SnapshotSource {
    fn capture(&self) -> Option<Snapshot>;

    /// Whether any camera source is configured. Drives the proctoring
    /// status line only; capture stays best-effort either way.
    fn is_available(&self) -> bool {
        true
    }
}

impl SnapshotSource for Box<dyn SnapshotSource> {
    fn capture(&self) -> Option<Snapshot> {
        (**self).capture()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

/// Captures a frame by running an external capture command (for example
/// `fswebcam --no-banner -`) and reading one JPEG from its stdout.
pub struct CommandSnapshotSource {
    command: String,
}

impl CommandSnapshotSource {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl SnapshotSource for CommandSnapshotSource {
    fn capture(&self) -> Option<Snapshot> {
        let output = match Command::new("sh").arg("-c").arg(&self.command).output() {
            Ok(output) => output,
            Err(err) => {
                debug!(command = %self.command, %err, "snapshot capture failed to spawn");
                return None;
            }
        };

        if !output.status.success() || output.stdout.is_empty() {
            debug!(
                command = %self.command,
                status = %output.status,
                "snapshot capture produced no frame"
            );
            return None;
        }

        Some(Snapshot::from_jpeg_bytes(&output.stdout))
    }
}

/// No camera configured. Every capture yields nothing.
pub struct NoCameraSource;

impl SnapshotSource for NoCameraSource {
    fn capture(&self) -> Option<Snapshot> {
        None
    }

    fn is_available(&self) -> bool {
        false
    }
}
