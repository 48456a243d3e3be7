// Live microphone capture via cpal
//
// The cpal stream is not Send, so it lives on a dedicated thread for the
// duration of a recording; frames cross back over a tokio channel.

use super::error::CaptureError;
use super::pcm::FrameSource;
use super::recorder::{AudioFrame, RecorderConfig};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BuildStreamError, SampleFormat};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Default input device of the default host
pub struct MicrophoneSource {
    name: String,
    stop_tx: Option<std_mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl MicrophoneSource {
    pub fn new() -> Self {
        Self {
            name: "microphone".to_string(),
            stop_tx: None,
            thread: None,
        }
    }
}

impl Default for MicrophoneSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl FrameSource for MicrophoneSource {
    async fn open(
        &mut self,
        config: &RecorderConfig,
    ) -> Result<mpsc::Receiver<AudioFrame>, CaptureError> {
        if self.thread.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }

        let (frame_tx, frame_rx) = mpsc::channel(config.frame_buffer);
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<String, CaptureError>>();

        let thread = std::thread::spawn(move || {
            let stream = match build_stream(frame_tx) {
                Ok((stream, device_name)) => {
                    if let Err(e) = stream.play() {
                        let _ = ready_tx.send(Err(CaptureError::Device(e.to_string())));
                        return;
                    }
                    let _ = ready_tx.send(Ok(device_name));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            // Park until close() or the source is dropped
            let _ = stop_rx.recv();
            drop(stream);
        });

        let ready = tokio::task::spawn_blocking(move || ready_rx.recv())
            .await
            .map_err(|e| CaptureError::Device(e.to_string()))?
            .map_err(|_| CaptureError::Device("capture thread exited".to_string()))?;

        match ready {
            Ok(device_name) => {
                info!("Microphone capture started on {}", device_name);
                self.stop_tx = Some(stop_tx);
                self.thread = Some(thread);
                Ok(frame_rx)
            }
            Err(e) => {
                let _ = thread.join();
                Err(e)
            }
        }
    }

    async fn close(&mut self) -> Result<(), CaptureError> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            tokio::task::spawn_blocking(move || thread.join())
                .await
                .map_err(|e| CaptureError::Device(e.to_string()))?
                .map_err(|_| CaptureError::Device("capture thread panicked".to_string()))?;
            info!("Microphone capture stopped");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for MicrophoneSource {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
    }
}

fn build_stream(
    frame_tx: mpsc::Sender<AudioFrame>,
) -> Result<(cpal::Stream, String), CaptureError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| CaptureError::DeviceUnavailable("no default input device".to_string()))?;
    let device_name = device.name().unwrap_or_else(|_| "default input".to_string());

    let supported = device
        .default_input_config()
        .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;
    let sample_format = supported.sample_format();
    let stream_config = supported.config();
    let sample_rate = stream_config.sample_rate.0;
    let channels = stream_config.channels;

    let samples_seen = Arc::new(AtomicU64::new(0));
    let error_callback = |e: cpal::StreamError| error!("Microphone stream error: {}", e);

    let stream = match sample_format {
        SampleFormat::I16 => {
            let emit = frame_emitter(frame_tx, sample_rate, channels, samples_seen);
            device.build_input_stream(
                &stream_config,
                move |data: &[i16], _| emit(data.to_vec()),
                error_callback,
                None,
            )
        }
        SampleFormat::F32 => {
            let emit = frame_emitter(frame_tx, sample_rate, channels, samples_seen);
            device.build_input_stream(
                &stream_config,
                move |data: &[f32], _| {
                    emit(data
                        .iter()
                        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                        .collect())
                },
                error_callback,
                None,
            )
        }
        SampleFormat::U16 => {
            let emit = frame_emitter(frame_tx, sample_rate, channels, samples_seen);
            device.build_input_stream(
                &stream_config,
                move |data: &[u16], _| {
                    emit(data.iter().map(|&s| (i32::from(s) - 32768) as i16).collect())
                },
                error_callback,
                None,
            )
        }
        other => {
            return Err(CaptureError::DeviceUnavailable(format!(
                "unsupported sample format {:?}",
                other
            )))
        }
    };

    let stream = stream.map_err(|e| match e {
        BuildStreamError::DeviceNotAvailable => {
            CaptureError::DeviceUnavailable(device_name.clone())
        }
        BuildStreamError::BackendSpecific { err } => {
            CaptureError::PermissionDenied(err.description)
        }
        other => CaptureError::Device(other.to_string()),
    })?;

    Ok((stream, device_name))
}

fn frame_emitter(
    frame_tx: mpsc::Sender<AudioFrame>,
    sample_rate: u32,
    channels: u16,
    samples_seen: Arc<AtomicU64>,
) -> impl Fn(Vec<i16>) + Send + 'static {
    move |samples: Vec<i16>| {
        let per_second = u64::from(sample_rate) * u64::from(channels.max(1));
        let seen = samples_seen.fetch_add(samples.len() as u64, Ordering::Relaxed);
        let frame = AudioFrame {
            samples,
            sample_rate,
            channels,
            timestamp_ms: seen * 1000 / per_second.max(1),
        };
        if frame_tx.try_send(frame).is_err() {
            warn!("Dropping microphone frame: recorder is not keeping up");
        }
    }
}
