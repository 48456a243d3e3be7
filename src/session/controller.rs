use super::error::ChatError;
use super::timeline::{ConversationTimeline, Exchange};
use crate::audio::{AudioFile, CaptureError, VoiceCapture};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Chat view of one session: typed input, voice capture and uploads all
/// funnel into the same timeline.
pub struct ChatController {
    timeline: Arc<ConversationTimeline>,
    capture: Option<VoiceCapture>,
}

impl ChatController {
    /// `capture` is `None` when the user has voice input disabled.
    pub fn new(timeline: Arc<ConversationTimeline>, capture: Option<VoiceCapture>) -> Self {
        Self { timeline, capture }
    }

    pub fn timeline(&self) -> &Arc<ConversationTimeline> {
        &self.timeline
    }

    pub fn voice_enabled(&self) -> bool {
        self.capture.is_some()
    }

    pub fn is_recording(&self) -> bool {
        self.capture
            .as_ref()
            .map(VoiceCapture::is_recording)
            .unwrap_or(false)
    }

    /// Typed input is refused while a recording is running.
    pub async fn send_text(&self, content: &str) -> Result<Exchange, ChatError> {
        if self.is_recording() {
            return Err(ChatError::RecordingInProgress);
        }
        self.timeline.send_text(content).await
    }

    pub async fn start_recording(&mut self) -> Result<(), ChatError> {
        if self.timeline.is_ended().await {
            return Err(ChatError::SessionEnded);
        }
        let capture = self.capture.as_mut().ok_or(ChatError::VoiceDisabled)?;
        capture.start().await?;
        Ok(())
    }

    /// Stop the recording and send it. An empty recording never reaches
    /// the network.
    pub async fn stop_recording(&mut self) -> Result<Exchange, ChatError> {
        let capture = self.capture.as_mut().ok_or(ChatError::VoiceDisabled)?;
        let payload = capture.stop().await.map_err(|e| match e {
            CaptureError::EmptyRecording => ChatError::EmptyRecording,
            other => ChatError::Capture(other),
        })?;

        self.timeline.send_voice(&payload).await
    }

    /// Send an audio file from disk as a voice message.
    pub async fn upload_audio(&self, path: impl AsRef<Path>) -> Result<Exchange, ChatError> {
        if self.is_recording() {
            return Err(ChatError::RecordingInProgress);
        }
        let file = AudioFile::open(path)?;
        info!("Uploading {} as a voice message", file.path);
        self.timeline.send_voice(&file.into_payload()).await
    }
}
