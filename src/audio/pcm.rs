use super::error::CaptureError;
use super::format::AudioFormat;
use super::recorder::{AudioFrame, AudioRecorder, RecordedChunk, RecorderConfig};
use std::io::Cursor;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Producer of raw PCM frames (microphone, test feed)
///
/// `close` must drop every frame sender so the frame channel ends.
#[async_trait::async_trait]
pub trait FrameSource: Send {
    async fn open(
        &mut self,
        config: &RecorderConfig,
    ) -> Result<mpsc::Receiver<AudioFrame>, CaptureError>;

    async fn close(&mut self) -> Result<(), CaptureError>;

    fn name(&self) -> &str;
}

/// Records PCM frames from a `FrameSource` and emits them as a single WAV
/// chunk when the source closes.
pub struct PcmRecorder<S: FrameSource> {
    source: S,
    config: RecorderConfig,
    name: String,
    task: Option<JoinHandle<()>>,
}

impl<S: FrameSource> PcmRecorder<S> {
    pub fn new(source: S, config: RecorderConfig) -> Self {
        let name = format!("pcm:{}", source.name());
        Self {
            source,
            config,
            name,
            task: None,
        }
    }
}

#[async_trait::async_trait]
impl<S: FrameSource> AudioRecorder for PcmRecorder<S> {
    fn supported_formats(&self) -> Vec<AudioFormat> {
        vec![AudioFormat::wav()]
    }

    fn default_format(&self) -> AudioFormat {
        AudioFormat::wav()
    }

    async fn start(
        &mut self,
        format: &AudioFormat,
    ) -> Result<mpsc::UnboundedReceiver<RecordedChunk>, CaptureError> {
        if self.task.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }
        if format.essence() != AudioFormat::wav().essence() {
            return Err(CaptureError::Device(format!(
                "{} cannot produce {}",
                self.name, format
            )));
        }

        let mut frame_rx = self.source.open(&self.config).await?;
        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        let target_rate = self.config.target_sample_rate;
        let target_channels = self.config.target_channels;

        let task = tokio::spawn(async move {
            let mut samples: Vec<i16> = Vec::new();
            let mut spec: Option<(u32, u16)> = None;

            while let Some(frame) = frame_rx.recv().await {
                let frame = process_frame(frame, target_rate, target_channels);
                spec.get_or_insert((frame.sample_rate, frame.channels));
                samples.extend_from_slice(&frame.samples);
            }

            let Some((sample_rate, channels)) = spec else {
                return;
            };
            if samples.is_empty() {
                return;
            }

            match encode_wav(&samples, sample_rate, channels) {
                Ok(wav) => {
                    info!(
                        "Encoded {} samples at {}Hz/{}ch into {} bytes of WAV",
                        samples.len(),
                        sample_rate,
                        channels,
                        wav.len()
                    );
                    let _ = chunk_tx.send(wav);
                }
                Err(e) => error!("Failed to encode recording: {}", e),
            }
        });

        self.task = Some(task);
        Ok(chunk_rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };

        let closed = self.source.close().await;
        if let Err(e) = task.await {
            error!("Recording task panicked: {}", e);
            return Err(CaptureError::Device(format!("recording task failed: {}", e)));
        }
        closed
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Encode interleaved 16-bit samples as a complete WAV file.
pub fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Result<Vec<u8>, CaptureError> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
        for &sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| CaptureError::Encode(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

/// Process audio frame: downsample and convert to target format
pub fn process_frame(frame: AudioFrame, target_sample_rate: u32, target_channels: u16) -> AudioFrame {
    let mut processed = frame;

    if processed.sample_rate != target_sample_rate {
        processed = downsample_frame(processed, target_sample_rate);
    }

    if processed.channels != target_channels && target_channels == 1 {
        processed = to_mono(processed);
    }

    processed
}

/// Downsample by decimation; whole-frame steps keep channels interleaved.
fn downsample_frame(frame: AudioFrame, target_rate: u32) -> AudioFrame {
    let ratio = frame.sample_rate / target_rate.max(1);
    if ratio <= 1 {
        return frame; // Can't upsample
    }

    let channels = usize::from(frame.channels.max(1));
    let downsampled: Vec<i16> = frame
        .samples
        .chunks_exact(channels)
        .step_by(ratio as usize)
        .flatten()
        .copied()
        .collect();

    AudioFrame {
        samples: downsampled,
        sample_rate: frame.sample_rate / ratio,
        channels: frame.channels,
        timestamp_ms: frame.timestamp_ms,
    }
}

/// Average interleaved channels into one
fn to_mono(frame: AudioFrame) -> AudioFrame {
    if frame.channels <= 1 {
        return frame;
    }

    let channels = usize::from(frame.channels);
    let mono_samples = frame
        .samples
        .chunks_exact(channels)
        .map(|chunk| {
            let sum: i32 = chunk.iter().map(|&s| i32::from(s)).sum();
            (sum / channels as i32) as i16
        })
        .collect();

    AudioFrame {
        samples: mono_samples,
        sample_rate: frame.sample_rate,
        channels: 1,
        timestamp_ms: frame.timestamp_ms,
    }
}
