use crate::session::{default_session_title, Language, Role, TherapyApproach};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub preferred_therapy_approach: TherapyApproach,
    #[serde(default)]
    pub voice_enabled: bool,
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of POST /users
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub language: Language,
    pub preferred_therapy_approach: TherapyApproach,
    pub voice_enabled: bool,
    pub dark_mode: bool,
}

impl NewUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            language: Language::Tr,
            preferred_therapy_approach: TherapyApproach::Cbt,
            voice_enabled: false,
            dark_mode: false,
        }
    }
}

/// Body of PUT /users/{id}; only the set fields are sent
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_therapy_approach: Option<TherapyApproach>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<bool>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.language.is_none()
            && self.preferred_therapy_approach.is_none()
            && self.voice_enabled.is_none()
            && self.dark_mode.is_none()
    }
}

// ============================================================================
// Sessions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "optional_id_string")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub therapy_approach: TherapyApproach,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub messages: Vec<RemoteMessage>,
}

impl Session {
    pub fn is_ended(&self) -> bool {
        self.ended_at.is_some()
    }
}

/// A message as stored by the backend in a session's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteMessage {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub is_voice: bool,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of POST /sessions
#[derive(Debug, Clone, Serialize)]
pub struct NewSessionRequest {
    pub user_id: String,
    pub title: String,
    pub therapy_approach: TherapyApproach,
}

impl NewSessionRequest {
    pub fn new(
        user_id: impl Into<String>,
        title: Option<String>,
        therapy_approach: TherapyApproach,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            title: title.unwrap_or_default(),
            therapy_approach,
        }
    }

    /// Replace a blank title with the approach label and a timestamp.
    pub fn with_default_title(mut self, language: Language, now: NaiveDateTime) -> Self {
        if self.title.trim().is_empty() {
            self.title = default_session_title(self.therapy_approach, language, now);
        }
        self
    }
}

/// Body of PUT /sessions/{id}
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub therapy_approach: Option<TherapyApproach>,
}

/// One page of a user's sessions
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPage {
    pub sessions: Vec<Session>,
    /// Total count when the server reports it
    pub total: Option<u64>,
}

/// GET /sessions answers either with a bare list or a wrapped page
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SessionListResponse {
    List(Vec<Session>),
    Page {
        #[serde(alias = "sessions")]
        items: Vec<Session>,
        #[serde(default)]
        total: Option<u64>,
    },
}

impl From<SessionListResponse> for SessionPage {
    fn from(response: SessionListResponse) -> Self {
        match response {
            SessionListResponse::List(sessions) => Self {
                total: None,
                sessions,
            },
            SessionListResponse::Page { items, total } => Self {
                sessions: items,
                total,
            },
        }
    }
}

// ============================================================================
// Chat & voice
// ============================================================================

/// Body of POST /chat/send
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub session_id: &'a str,
    pub message: &'a str,
    pub is_voice: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub crisis_detected: bool,
    #[serde(default)]
    pub emergency_info: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VoiceReply {
    #[serde(default)]
    pub transcribed_text: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    pub response: String,
    #[serde(default)]
    pub crisis_detected: bool,
    #[serde(default)]
    pub emergency_info: Option<BTreeMap<String, serde_json::Value>>,
}

impl VoiceReply {
    /// Server transcription, preferring `transcribed_text` over `text`
    pub fn transcription(&self) -> Option<&str> {
        let non_blank = |text: &&str| !text.trim().is_empty();
        self.transcribed_text
            .as_deref()
            .filter(non_blank)
            .or_else(|| self.text.as_deref().filter(non_blank))
    }
}

/// POST /voice/transcribe
#[derive(Debug, Clone, Deserialize)]
pub struct Transcription {
    #[serde(alias = "transcribed_text")]
    pub text: String,
}

// ============================================================================
// Lenient field decoding
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Number(i64),
}

impl From<IdRepr> for String {
    fn from(id: IdRepr) -> Self {
        match id {
            IdRepr::Text(text) => text,
            IdRepr::Number(number) => number.to_string(),
        }
    }
}

/// Ids arrive as integers or strings depending on the backend store.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    IdRepr::deserialize(deserializer).map(String::from)
}

fn optional_id_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<IdRepr>::deserialize(deserializer).map(|id| id.map(String::from))
}

pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    /// Accepts RFC 3339 and the naive ISO form (`2025-01-02T10:00:00.123456`)
    /// the backend emits for UTC columns.
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn optional<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_session_with_numeric_ids_and_naive_timestamps() {
        let json = r#"{
            "id": 42,
            "user_id": 7,
            "title": "Evening check-in",
            "therapy_approach": "dbt",
            "created_at": "2025-01-02T10:00:00.123456",
            "ended_at": null
        }"#;

        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.id, "42");
        assert_eq!(session.user_id.as_deref(), Some("7"));
        assert_eq!(session.therapy_approach, TherapyApproach::Dbt);
        assert!(!session.is_ended());
        assert!(session.messages.is_empty());

        let created = session.created_at.unwrap();
        assert_eq!(created.year(), 2025);
        assert_eq!(created.hour(), 10);
    }

    #[test]
    fn test_session_list_shapes() {
        let bare = r#"[{"id": "a", "title": "One", "therapy_approach": "cbt"}]"#;
        let page: SessionPage = serde_json::from_str::<SessionListResponse>(bare)
            .unwrap()
            .into();
        assert_eq!(page.sessions.len(), 1);
        assert_eq!(page.total, None);

        let wrapped = r#"{"items": [{"id": "a"}, {"id": "b"}], "total": 9}"#;
        let page: SessionPage = serde_json::from_str::<SessionListResponse>(wrapped)
            .unwrap()
            .into();
        assert_eq!(page.sessions.len(), 2);
        assert_eq!(page.total, Some(9));

        let aliased = r#"{"sessions": [{"id": "c"}]}"#;
        let page: SessionPage = serde_json::from_str::<SessionListResponse>(aliased)
            .unwrap()
            .into();
        assert_eq!(page.sessions[0].id, "c");
        assert_eq!(page.total, None);
    }

    #[test]
    fn test_voice_reply_transcription_fallbacks() {
        let reply: VoiceReply =
            serde_json::from_str(r#"{"text": "merhaba", "response": "ok"}"#).unwrap();
        assert_eq!(reply.transcription(), Some("merhaba"));

        let reply: VoiceReply = serde_json::from_str(
            r#"{"transcribed_text": "first", "text": "second", "response": "ok"}"#,
        )
        .unwrap();
        assert_eq!(reply.transcription(), Some("first"));

        let reply: VoiceReply = serde_json::from_str(
            r#"{"transcribed_text": "", "text": "merhaba", "response": "ok"}"#,
        )
        .unwrap();
        assert_eq!(reply.transcription(), Some("merhaba"));

        let reply: VoiceReply =
            serde_json::from_str(r#"{"transcribed_text": "  ", "text": "", "response": "ok"}"#)
                .unwrap();
        assert_eq!(reply.transcription(), None);

        let reply: VoiceReply = serde_json::from_str(r#"{"response": "ok"}"#).unwrap();
        assert_eq!(reply.transcription(), None);
    }

    #[test]
    fn test_rfc3339_timestamp() {
        let parsed = timestamp::parse("2025-10-27T14:30:05Z").unwrap();
        assert_eq!(parsed.minute(), 30);
        assert!(timestamp::parse("yesterday").is_none());
    }

    #[test]
    fn test_user_update_skips_unset_fields() {
        let update = UserUpdate {
            dark_mode: Some(true),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"dark_mode": true}));
    }
}
