use super::approach::Language;
use super::crisis::{CrisisAlert, CrisisSignal};
use super::error::ChatError;
use super::message::{Message, MessageId, MessageIdGenerator, Role};
use crate::api::{ChatBackend, Session};
use crate::audio::VoicePayload;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Result of one successful send: the user turn and the assistant reply
#[derive(Debug, Clone)]
pub struct Exchange {
    pub user: Message,
    pub assistant: Message,
    pub crisis: Option<CrisisSignal>,
}

struct TimelineState {
    /// Session metadata; its `messages` history is moved into `messages`
    session: Session,
    messages: Vec<Message>,
    /// Optimistic user entries whose request failed
    failed: HashSet<MessageId>,
    ids: MessageIdGenerator,
    crisis: CrisisAlert,
}

impl TimelineState {
    fn append(&mut self, role: Role, content: String, is_voice: bool) -> Message {
        let message = Message {
            id: self.ids.next_id(),
            role,
            content,
            is_voice,
            created_at: Utc::now(),
        };
        self.messages.push(message.clone());
        message
    }
}

/// Clears the single-flight flag when the send finishes, however it ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Ordered message list of one session plus its outbound send path.
///
/// At most one send is in flight; a concurrent send is rejected without
/// touching the timeline. Messages are only ever appended, and nothing is
/// appended once the session has ended.
pub struct ConversationTimeline {
    backend: Arc<dyn ChatBackend>,
    language: Language,
    session_id: String,
    state: Mutex<TimelineState>,
    sending: AtomicBool,
}

impl ConversationTimeline {
    /// Build a timeline from a session and the history it carries.
    pub fn new(backend: Arc<dyn ChatBackend>, mut session: Session, language: Language) -> Self {
        let mut ids = MessageIdGenerator::default();
        let history = std::mem::take(&mut session.messages);
        let messages: Vec<Message> = history
            .into_iter()
            .map(|remote| Message {
                id: ids.next_id(),
                role: remote.role,
                content: remote.content,
                is_voice: remote.is_voice,
                created_at: remote.created_at.unwrap_or_else(Utc::now),
            })
            .collect();

        info!(
            "Timeline for session {} ({} messages, {})",
            session.id,
            messages.len(),
            if session.is_ended() { "ended" } else { "open" }
        );

        Self {
            backend,
            language,
            session_id: session.id.clone(),
            state: Mutex::new(TimelineState {
                session,
                messages,
                failed: HashSet::new(),
                ids,
                crisis: CrisisAlert::default(),
            }),
            sending: AtomicBool::new(false),
        }
    }

    /// Fetch a session with its history and build its timeline.
    pub async fn load(
        backend: Arc<dyn ChatBackend>,
        session_id: &str,
        language: Language,
    ) -> Result<Self, ChatError> {
        let session = backend.get_session(session_id).await?;
        Ok(Self::new(backend, session, language))
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::SeqCst)
    }

    pub async fn session(&self) -> Session {
        self.state.lock().await.session.clone()
    }

    pub async fn is_ended(&self) -> bool {
        self.state.lock().await.session.is_ended()
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.state.lock().await.messages.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.messages.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.messages.is_empty()
    }

    /// Whether `id` is a user entry whose send failed
    pub async fn is_failed(&self, id: MessageId) -> bool {
        self.state.lock().await.failed.contains(&id)
    }

    pub async fn crisis(&self) -> Option<CrisisSignal> {
        self.state.lock().await.crisis.active().cloned()
    }

    pub async fn dismiss_crisis(&self) -> Option<CrisisSignal> {
        self.state.lock().await.crisis.dismiss()
    }

    fn begin_send(&self) -> Result<InFlight<'_>, ChatError> {
        self.sending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| InFlight(&self.sending))
            .map_err(|_| {
                warn!("Send rejected: another send is in flight");
                ChatError::SendInFlight
            })
    }

    /// Send a typed message.
    ///
    /// The user entry is appended before the request goes out. If the
    /// request fails the entry stays and is reported by `is_failed`.
    pub async fn send_text(&self, content: &str) -> Result<Exchange, ChatError> {
        if content.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let _in_flight = self.begin_send()?;

        let user = {
            let mut state = self.state.lock().await;
            if state.session.is_ended() {
                return Err(ChatError::SessionEnded);
            }
            state.crisis.dismiss();
            state.append(Role::User, content.to_string(), false)
        };

        info!("Sending text message {} to session {}", user.id, self.session_id);

        let reply = match self
            .backend
            .send_message(&self.session_id, content, false)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                error!("Failed to send message {}: {}", user.id, e);
                self.state.lock().await.failed.insert(user.id);
                return Err(e.into());
            }
        };

        let crisis = CrisisSignal::from_reply(reply.crisis_detected, reply.emergency_info.as_ref());
        let mut state = self.state.lock().await;
        let assistant = state.append(Role::Assistant, reply.response, false);
        if let Some(signal) = &crisis {
            state.crisis.raise(signal.clone());
        }

        Ok(Exchange {
            user,
            assistant,
            crisis,
        })
    }

    /// Send a recorded or uploaded audio payload.
    ///
    /// Nothing is appended until the server answers; the user entry then
    /// carries the server's transcription.
    pub async fn send_voice(&self, payload: &VoicePayload) -> Result<Exchange, ChatError> {
        if payload.is_empty() {
            return Err(ChatError::EmptyRecording);
        }
        let _in_flight = self.begin_send()?;

        {
            let mut state = self.state.lock().await;
            if state.session.is_ended() {
                return Err(ChatError::SessionEnded);
            }
            state.crisis.dismiss();
        }

        info!(
            "Sending voice message to session {} ({} bytes)",
            self.session_id,
            payload.len()
        );

        let reply = self
            .backend
            .send_voice(&self.session_id, payload, self.language)
            .await
            .map_err(|e| {
                error!("Failed to send voice message: {}", e);
                e
            })?;

        let transcript = reply
            .transcription()
            .unwrap_or_else(|| self.language.voice_message_placeholder())
            .to_string();
        let crisis = CrisisSignal::from_reply(reply.crisis_detected, reply.emergency_info.as_ref());

        let mut state = self.state.lock().await;
        let user = state.append(Role::User, transcript, true);
        let assistant = state.append(Role::Assistant, reply.response, false);
        if let Some(signal) = &crisis {
            state.crisis.raise(signal.clone());
        }

        Ok(Exchange {
            user,
            assistant,
            crisis,
        })
    }

    /// Close the session. One-way: a second call fails without side effects.
    ///
    /// Refused while a send is in flight so no reply lands after `ended_at`.
    pub async fn end_session(&self) -> Result<Session, ChatError> {
        // Held across the request so concurrent calls observe the outcome
        let mut state = self.state.lock().await;
        if state.session.is_ended() {
            warn!("Session {} already ended", self.session_id);
            return Err(ChatError::AlreadyEnded);
        }
        // Senders set the flag before taking the lock, so a send that starts
        // after this check finds the session ended
        if self.is_sending() {
            warn!(
                "Cannot end session {} while a message is being sent",
                self.session_id
            );
            return Err(ChatError::SendInFlight);
        }

        let remote = self.backend.end_session(&self.session_id).await?;
        let ended_at = remote.ended_at.unwrap_or_else(Utc::now);
        state.session.ended_at = Some(ended_at);

        info!("Session {} ended at {}", self.session_id, ended_at);
        Ok(state.session.clone())
    }
}
