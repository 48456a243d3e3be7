use super::error::ApiError;
use super::models::{ChatReply, Session, VoiceReply};
use crate::audio::VoicePayload;
use crate::session::Language;

/// Backend operations the chat timeline depends on
///
/// Implementations:
/// - `ApiClient`: REST calls against the therapy backend
/// - test doubles that script replies without a network
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// POST /chat/send
    async fn send_message(
        &self,
        session_id: &str,
        message: &str,
        is_voice: bool,
    ) -> Result<ChatReply, ApiError>;

    /// POST /voice/send
    async fn send_voice(
        &self,
        session_id: &str,
        payload: &VoicePayload,
        language: Language,
    ) -> Result<VoiceReply, ApiError>;

    /// GET /sessions/{id}
    async fn get_session(&self, session_id: &str) -> Result<Session, ApiError>;

    /// PUT /sessions/{id}/end
    async fn end_session(&self, session_id: &str) -> Result<Session, ApiError>;
}
