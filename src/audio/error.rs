use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Audio input device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Microphone access denied: {0}")]
    PermissionDenied(String),

    #[error("Already recording")]
    AlreadyRecording,

    #[error("Not recording")]
    NotRecording,

    #[error("No audio was captured. Please try again.")]
    EmptyRecording,

    #[error("Recorder failure: {0}")]
    Device(String),

    #[error("Failed to encode recording: {0}")]
    Encode(String),

    #[error("Not a supported audio file: {0}")]
    InvalidAudioFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
