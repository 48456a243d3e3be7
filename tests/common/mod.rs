// Scripted backend shared by the timeline and voice tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use therapy_chat::api::{ApiError, ChatBackend, ChatReply, Session, VoiceReply};
use therapy_chat::session::{Language, TherapyApproach};
use therapy_chat::VoicePayload;
use tokio::sync::Notify;

/// Replies are consumed in order; an exhausted script answers with a
/// plain "ok" reply.
#[derive(Default)]
pub struct ScriptedBackend {
    pub chat_replies: Mutex<VecDeque<Result<ChatReply, ApiError>>>,
    pub voice_replies: Mutex<VecDeque<Result<VoiceReply, ApiError>>>,
    pub sent_text: Mutex<Vec<String>>,
    pub sent_voice: Mutex<Vec<(usize, String, Language)>>,
    pub end_calls: AtomicUsize,
    /// When set, every send waits for a permit before answering
    pub gate: Option<Arc<Notify>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn push_chat(&self, reply: Result<ChatReply, ApiError>) {
        self.chat_replies.lock().unwrap().push_back(reply);
    }

    pub fn push_voice(&self, reply: Result<VoiceReply, ApiError>) {
        self.voice_replies.lock().unwrap().push_back(reply);
    }

    pub fn text_calls(&self) -> usize {
        self.sent_text.lock().unwrap().len()
    }

    pub fn voice_calls(&self) -> usize {
        self.sent_voice.lock().unwrap().len()
    }

    async fn wait_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn send_message(
        &self,
        _session_id: &str,
        message: &str,
        _is_voice: bool,
    ) -> Result<ChatReply, ApiError> {
        self.sent_text.lock().unwrap().push(message.to_string());
        self.wait_gate().await;
        let next = self.chat_replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(reply("ok")))
    }

    async fn send_voice(
        &self,
        _session_id: &str,
        payload: &VoicePayload,
        language: Language,
    ) -> Result<VoiceReply, ApiError> {
        self.sent_voice.lock().unwrap().push((
            payload.len(),
            payload.file_name().to_string(),
            language,
        ));
        self.wait_gate().await;
        let next = self.voice_replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            Ok(VoiceReply {
                response: "ok".to_string(),
                ..VoiceReply::default()
            })
        })
    }

    async fn get_session(&self, session_id: &str) -> Result<Session, ApiError> {
        let mut session = open_session();
        session.id = session_id.to_string();
        Ok(session)
    }

    async fn end_session(&self, session_id: &str) -> Result<Session, ApiError> {
        self.end_calls.fetch_add(1, Ordering::SeqCst);
        let mut session = open_session();
        session.id = session_id.to_string();
        session.ended_at = Some(Utc.with_ymd_and_hms(2025, 3, 5, 10, 0, 0).unwrap());
        Ok(session)
    }
}

pub fn reply(text: &str) -> ChatReply {
    ChatReply {
        response: text.to_string(),
        ..ChatReply::default()
    }
}

pub fn server_error(message: &str) -> ApiError {
    ApiError::Status {
        status: 500,
        detail: Some(message.to_string()),
    }
}

pub fn open_session() -> Session {
    Session {
        id: "42".to_string(),
        user_id: Some("7".to_string()),
        title: "CBT Session - 05.03.2025 09:07".to_string(),
        therapy_approach: TherapyApproach::Cbt,
        created_at: Some(Utc.with_ymd_and_hms(2025, 3, 5, 9, 7, 0).unwrap()),
        ended_at: None,
        messages: Vec::new(),
    }
}

pub mod server;
