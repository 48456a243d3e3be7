use super::capture::VoicePayload;
use super::error::CaptureError;
use super::format::AudioFormat;
use std::io::Cursor;
use std::path::Path;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::info;

/// Audio file picked for upload instead of a live recording
pub struct AudioFile {
    pub path: String,
    pub duration_seconds: Option<f64>,
    pub sample_rate: Option<u32>,
    pub channels: Option<usize>,
    pub payload: VoicePayload,
}

impl AudioFile {
    /// Read and probe an audio file; anything symphonia cannot demux is rejected.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let data = std::fs::read(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        let mut hint = Hint::new();
        if let Some(ext) = &extension {
            hint.with_extension(ext);
        }

        let stream = MediaSourceStream::new(Box::new(Cursor::new(data.clone())), Default::default());
        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                stream,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| CaptureError::InvalidAudioFile(format!("{}: {}", path.display(), e)))?;

        let track = probed
            .format
            .tracks()
            .iter()
            .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| {
                CaptureError::InvalidAudioFile(format!("{}: no audio track", path.display()))
            })?;

        let params = &track.codec_params;
        let sample_rate = params.sample_rate;
        let channels = params.channels.map(|channels| channels.count());
        let duration_seconds = match (params.n_frames, sample_rate) {
            (Some(frames), Some(rate)) if rate > 0 => Some(frames as f64 / rate as f64),
            _ => None,
        };

        let format = AudioFormat::new(mime_for_extension(extension.as_deref()));
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| format.file_name());

        info!(
            "Audio file loaded: {} ({}), {:.1}s",
            file_name,
            format,
            duration_seconds.unwrap_or_default()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate,
            channels,
            payload: VoicePayload::new(data, format).with_file_name(file_name),
        })
    }

    pub fn into_payload(self) -> VoicePayload {
        self.payload
    }
}

fn mime_for_extension(extension: Option<&str>) -> &'static str {
    match extension {
        Some("wav") | Some("wave") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg") | Some("oga") | Some("opus") => "audio/ogg",
        Some("webm") | Some("mka") | Some("mkv") => "audio/webm",
        Some("m4a") | Some("mp4") | Some("aac") => "audio/aac",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}
