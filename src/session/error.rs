use crate::api::ApiError;
use crate::audio::CaptureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("A message is already being sent")]
    SendInFlight,

    #[error("This session has ended")]
    SessionEnded,

    #[error("Session is already ended")]
    AlreadyEnded,

    #[error("No audio was captured. Please try again.")]
    EmptyRecording,

    #[error("Text input is disabled while recording")]
    RecordingInProgress,

    #[error("Voice messages are disabled for this user")]
    VoiceDisabled,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Capture(#[from] CaptureError),
}
