use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::audio::{AudioBackend, AudioData, CaptureSession, DeviceInfo, PREFERRED_SAMPLE_RATE};
use crate::errors::{FieldError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Microphone capture through the platform's default cpal host.
///
/// `cpal::Stream` is not `Send` on every platform, so each session owns a
/// dedicated thread that builds the stream, keeps it alive until told to stop,
/// and then drops it.
#[derive(Debug, Clone, Copy)]
pub struct CpalBackend {
    sample_rate: u32,
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new(PREFERRED_SAMPLE_RATE)
    }
}

impl CpalBackend {
    /// `sample_rate` is requested when the device supports it in f32.
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl AudioBackend for CpalBackend {
    fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        let host = cpal::default_host();
        let default_name = host
            .default_input_device()
            .and_then(|d| d.name().ok())
            .unwrap_or_default();

        let devices = host
            .input_devices()
            .map_err(|e| FieldError::Capture(format!("Failed to enumerate devices: {e}")))?
            .filter_map(|d| {
                d.name().ok().map(|name| DeviceInfo {
                    is_default: name == default_name,
                    name,
                })
            })
            .collect();

        Ok(devices)
    }

    fn start(&self, device_name: Option<&str>) -> Result<Box<dyn CaptureSession>> {
        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();
        let device_name = device_name.map(str::to_owned);
        let thread_stop = Arc::clone(&stop);
        let sample_rate = self.sample_rate;

        let handle = std::thread::Builder::new()
            .name("dictation-capture".into())
            .spawn(move || capture_thread(device_name, sample_rate, thread_stop, ready_tx))?;

        // The thread reports once the stream is playing (or why it could not start).
        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(CpalSession {
                stop,
                handle: Some(handle),
            })),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(FieldError::Capture("Capture thread exited before starting".into()))
            }
        }
    }
}

struct CpalSession {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<Result<AudioData>>>,
}

impl CpalSession {
    fn stop_and_join(&mut self) -> Option<Result<AudioData>> {
        self.stop.store(true, Ordering::SeqCst);
        let handle = self.handle.take()?;
        Some(handle.join().unwrap_or_else(|_| {
            Err(FieldError::Capture("Capture thread panicked".into()))
        }))
    }
}

impl CaptureSession for CpalSession {
    fn finish(mut self: Box<Self>) -> Result<AudioData> {
        self.stop_and_join()
            .unwrap_or_else(|| Err(FieldError::Capture("Capture already finished".into())))
    }
}

impl Drop for CpalSession {
    fn drop(&mut self) {
        if self.stop_and_join().is_some() {
            tracing::debug!("capture session dropped; device released");
        }
    }
}

fn capture_thread(
    device_name: Option<String>,
    preferred_rate: u32,
    stop: Arc<AtomicBool>,
    ready: mpsc::Sender<Result<()>>,
) -> Result<AudioData> {
    let opened = open_stream(device_name.as_deref(), preferred_rate);
    let (stream, samples, stream_error, sample_rate) = match opened {
        Ok(parts) => {
            let _ = ready.send(Ok(()));
            parts
        }
        Err(e) => {
            let message = e.to_string();
            let _ = ready.send(Err(e));
            return Err(FieldError::Capture(message));
        }
    };

    while !stop.load(Ordering::SeqCst) {
        std::thread::sleep(POLL_INTERVAL);
    }
    drop(stream);

    if let Some(err) = lock(&stream_error).take() {
        return Err(FieldError::Capture(format!(
            "Stream error during recording: {err}"
        )));
    }

    let samples = std::mem::take(&mut *lock(&samples));
    tracing::debug!(samples = samples.len(), sample_rate, "capture finished");
    Ok(AudioData {
        samples,
        sample_rate,
    })
}

type SharedSamples = Arc<Mutex<Vec<f32>>>;
type SharedError = Arc<Mutex<Option<String>>>;

fn open_stream(
    device_name: Option<&str>,
    preferred_rate: u32,
) -> Result<(cpal::Stream, SharedSamples, SharedError, u32)> {
    let host = cpal::default_host();

    let device = match device_name {
        Some(name) => host
            .input_devices()
            .map_err(|e| FieldError::Capture(format!("Failed to enumerate devices: {e}")))?
            .find(|d| d.name().ok().as_deref() == Some(name))
            .ok_or_else(|| FieldError::Capture(format!("Device '{name}' not found")))?,
        None => host.default_input_device().ok_or(FieldError::NoDevice)?,
    };

    let config = select_config(&device, preferred_rate)?;
    let sample_rate = config.sample_rate().0;
    let channels = config.channels() as usize;

    let samples: SharedSamples = Arc::new(Mutex::new(Vec::new()));
    let writer = Arc::clone(&samples);
    let stream_error: SharedError = Arc::new(Mutex::new(None));
    let error_writer = Arc::clone(&stream_error);

    let stream = device
        .build_input_stream(
            &config.into(),
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mut buf = lock(&writer);
                if channels <= 1 {
                    buf.extend_from_slice(data);
                } else {
                    buf.extend(
                        data.chunks_exact(channels)
                            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
                    );
                }
            },
            move |e| {
                *lock(&error_writer) = Some(e.to_string());
            },
            None,
        )
        .map_err(|e| FieldError::Capture(format!("Failed to open input stream: {e}")))?;

    stream
        .play()
        .map_err(|e| FieldError::Capture(format!("Failed to start stream: {e}")))?;

    Ok((stream, samples, stream_error, sample_rate))
}

/// Prefer the requested rate in f32; otherwise take the device default.
fn select_config(device: &cpal::Device, rate: u32) -> Result<cpal::SupportedStreamConfig> {
    let supported = device
        .supported_input_configs()
        .map_err(|e| FieldError::Capture(format!("Failed to query configs: {e}")))?;

    for range in supported {
        if range.sample_format() == cpal::SampleFormat::F32
            && range.min_sample_rate().0 <= rate
            && range.max_sample_rate().0 >= rate
        {
            return Ok(range.with_sample_rate(cpal::SampleRate(rate)));
        }
    }

    let fallback = device
        .default_input_config()
        .map_err(|e| FieldError::Capture(format!("Failed to get default config: {e}")))?;
    tracing::debug!(
        requested = rate,
        fallback = fallback.sample_rate().0,
        "requested sample rate unsupported; using device default"
    );
    if fallback.sample_format() != cpal::SampleFormat::F32 {
        return Err(FieldError::Capture(format!(
            "Unsupported sample format {:?}",
            fallback.sample_format()
        )));
    }
    Ok(fallback)
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
