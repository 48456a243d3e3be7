//! Voice capture
//!
//! - `VoiceCapture`: Idle/Recording state machine that assembles one payload per recording
//! - `format`: preference-ordered container negotiation and file extensions
//! - `PcmRecorder`: PCM frames to a WAV payload
//! - `AudioFile`: probed audio files uploaded in place of a recording
//! - `MicrophoneSource`: default input device (`microphone` feature)

pub mod capture;
pub mod error;
pub mod file;
pub mod format;
pub mod pcm;
pub mod recorder;

#[cfg(feature = "microphone")]
pub mod microphone;

pub use capture::{CaptureState, VoiceCapture, VoicePayload};
pub use error::CaptureError;
pub use file::AudioFile;
pub use format::{AudioFormat, FormatSupport, StaticFormatSupport, PREFERRED_FORMATS};
pub use pcm::{encode_wav, FrameSource, PcmRecorder};
pub use recorder::{AudioFrame, AudioRecorder, RecordedChunk, RecorderConfig};

#[cfg(feature = "microphone")]
pub use microphone::MicrophoneSource;
