use super::error::CaptureError;
use super::format::AudioFormat;
use tokio::sync::mpsc;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since recording started
    pub timestamp_ms: u64,
}

/// Configuration for PCM recorders
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Target sample rate (will downsample if needed)
    pub target_sample_rate: u32,
    /// Target channel count (1 = mono, 2 = stereo)
    pub target_channels: u16,
    /// Capacity of the frame channel between device and recorder
    pub frame_buffer: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16000, // Speech models expect 16kHz
            target_channels: 1,        // Mono
            frame_buffer: 256,
        }
    }
}

/// Encoded audio chunk emitted by a recorder
pub type RecordedChunk = Vec<u8>;

/// Recording device trait
///
/// Implementations:
/// - `PcmRecorder`: PCM frames from a `FrameSource`, encoded as one WAV chunk
/// - test recorders that replay scripted chunks
///
/// Chunks sent on the returned channel must concatenate into a valid stream
/// of the format passed to `start`. The recorder drops its sender once
/// `stop` has returned so the receiver can be drained to completion.
#[async_trait::async_trait]
pub trait AudioRecorder: Send {
    /// Formats this recorder can produce
    fn supported_formats(&self) -> Vec<AudioFormat>;

    /// Format used when none of the preferred formats is supported
    fn default_format(&self) -> AudioFormat;

    /// Start recording in `format`
    async fn start(
        &mut self,
        format: &AudioFormat,
    ) -> Result<mpsc::UnboundedReceiver<RecordedChunk>, CaptureError>;

    /// Stop recording and flush any pending chunks
    async fn stop(&mut self) -> Result<(), CaptureError>;

    /// Get recorder name for logging
    fn name(&self) -> &str;
}
