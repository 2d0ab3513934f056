pub mod cpal_backend;
pub mod wav;

use crate::errors::Result;

/// Recordings shorter than this are treated as silence and never uploaded.
pub const MIN_DURATION_SECS: f32 = 0.1;

/// Sample rate requested from the input device when it supports it.
pub const PREFERRED_SAMPLE_RATE: u32 = 16_000;

/// Captured audio, mono f32 PCM.
#[derive(Debug, Clone, Default)]
pub struct AudioData {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioData {
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    pub fn is_too_short(&self) -> bool {
        self.duration_secs() < MIN_DURATION_SECS
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DeviceInfo {
    pub name: String,
    pub is_default: bool,
}

/// An open microphone. Dropping the session releases the device, whether or
/// not `finish` was called.
pub trait CaptureSession: Send {
    /// Stop capturing and hand back everything recorded so far.
    fn finish(self: Box<Self>) -> Result<AudioData>;
}

pub trait AudioBackend: Send + Sync {
    fn list_devices(&self) -> Result<Vec<DeviceInfo>>;

    /// Open the named device (or the default one) and start capturing.
    fn start(&self, device_name: Option<&str>) -> Result<Box<dyn CaptureSession>>;
}
