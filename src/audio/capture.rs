use super::error::CaptureError;
use super::format::{negotiate, AudioFormat, FormatSupport, StaticFormatSupport, PREFERRED_FORMATS};
use super::recorder::{AudioRecorder, RecordedChunk};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Single binary payload ready to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoicePayload {
    data: Vec<u8>,
    format: AudioFormat,
    file_name: String,
}

impl VoicePayload {
    /// Payload named `recording.<ext>` after its format
    pub fn new(data: Vec<u8>, format: AudioFormat) -> Self {
        let file_name = format.file_name();
        Self {
            data,
            format,
            file_name,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Recording => f.write_str("recording"),
        }
    }
}

/// Turns a start/stop gesture pair into one `VoicePayload`.
///
/// Idle -> Recording -> Idle. At most one recording at a time; there is no
/// timeout, only an explicit `stop` ends a recording.
pub struct VoiceCapture {
    recorder: Box<dyn AudioRecorder>,
    format: AudioFormat,
    state: CaptureState,
    chunk_rx: Option<mpsc::UnboundedReceiver<RecordedChunk>>,
    buffer: Vec<RecordedChunk>,
    started_at: Option<Instant>,
}

impl VoiceCapture {
    /// Negotiate against the formats the recorder itself reports.
    pub fn new(recorder: Box<dyn AudioRecorder>) -> Self {
        let support = StaticFormatSupport::new(recorder.supported_formats());
        Self::with_format_support(recorder, &support)
    }

    /// Negotiate against an injected capability instead of the recorder's list.
    pub fn with_format_support(recorder: Box<dyn AudioRecorder>, support: &dyn FormatSupport) -> Self {
        let format = negotiate(support, &PREFERRED_FORMATS, recorder.default_format());

        info!(
            "Voice capture ready on {} (format: {})",
            recorder.name(),
            format
        );

        Self {
            recorder,
            format,
            state: CaptureState::Idle,
            chunk_rx: None,
            buffer: Vec::new(),
            started_at: None,
        }
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == CaptureState::Recording
    }

    /// Time since `start`, while recording
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|started| started.elapsed())
    }

    /// Begin recording. Device and permission failures leave the adapter idle.
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        if self.is_recording() {
            warn!("Recording already started");
            return Err(CaptureError::AlreadyRecording);
        }

        self.buffer.clear();

        let rx = self.recorder.start(&self.format).await.map_err(|e| {
            warn!("Failed to start {}: {}", self.recorder.name(), e);
            e
        })?;

        self.chunk_rx = Some(rx);
        self.state = CaptureState::Recording;
        self.started_at = Some(Instant::now());

        info!("Recording started ({})", self.format);
        Ok(())
    }

    /// Stop recording and assemble the buffered chunks into one payload.
    pub async fn stop(&mut self) -> Result<VoicePayload, CaptureError> {
        if !self.is_recording() {
            warn!("Recording not active");
            return Err(CaptureError::NotRecording);
        }

        self.state = CaptureState::Idle;
        let elapsed = self.started_at.take().map(|started| started.elapsed());
        let stop_result = self.recorder.stop().await;

        if let Some(mut rx) = self.chunk_rx.take() {
            if stop_result.is_ok() {
                while let Some(chunk) = rx.recv().await {
                    if !chunk.is_empty() {
                        self.buffer.push(chunk);
                    }
                }
            }
        }

        if let Err(e) = stop_result {
            self.buffer.clear();
            return Err(e);
        }

        let chunks = std::mem::take(&mut self.buffer);
        if chunks.is_empty() {
            warn!("Recording produced no audio data");
            return Err(CaptureError::EmptyRecording);
        }

        let chunk_count = chunks.len();
        let data = chunks.concat();
        let payload = VoicePayload::new(data, self.format.clone());

        info!(
            "Recording stopped: {} chunks, {} bytes, {:.1}s -> {}",
            chunk_count,
            payload.len(),
            elapsed.unwrap_or_default().as_secs_f64(),
            payload.file_name()
        );

        Ok(payload)
    }
}
