use super::backend::ChatBackend;
use super::error::ApiError;
use super::models::{
    ChatReply, ChatRequest, NewSessionRequest, NewUser, Session, SessionListResponse,
    SessionPage, SessionUpdate, Transcription, User, UserUpdate, VoiceReply,
};
use crate::audio::VoicePayload;
use crate::config::ApiConfig;
use crate::session::Language;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info};

/// REST client for the therapy backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        info!("API client targeting {}", base_url);

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(config.base_url.clone(), config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------

    /// POST /users
    pub async fn create_user(&self, user: &NewUser) -> Result<User, ApiError> {
        self.execute(self.client.post(self.url("/users")).json(user))
            .await
    }

    /// GET /users/{id}
    pub async fn get_user(&self, user_id: &str) -> Result<User, ApiError> {
        self.execute(self.client.get(self.url(&format!("/users/{}", user_id))))
            .await
    }

    /// PUT /users/{id}
    pub async fn update_user(&self, user_id: &str, update: &UserUpdate) -> Result<User, ApiError> {
        self.execute(
            self.client
                .put(self.url(&format!("/users/{}", user_id)))
                .json(update),
        )
        .await
    }

    /// GET /users?skip&limit
    pub async fn list_users(&self, skip: u32, limit: u32) -> Result<Vec<User>, ApiError> {
        self.execute(
            self.client
                .get(self.url("/users"))
                .query(&[("skip", skip), ("limit", limit)]),
        )
        .await
    }

    // ------------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------------

    /// POST /sessions
    pub async fn create_session(&self, request: &NewSessionRequest) -> Result<Session, ApiError> {
        self.execute(self.client.post(self.url("/sessions")).json(request))
            .await
    }

    /// GET /sessions?user_id&skip&limit
    pub async fn list_sessions(
        &self,
        user_id: &str,
        skip: u32,
        limit: u32,
    ) -> Result<SessionPage, ApiError> {
        let response: SessionListResponse = self
            .execute(self.client.get(self.url("/sessions")).query(&[
                ("user_id", user_id.to_string()),
                ("skip", skip.to_string()),
                ("limit", limit.to_string()),
            ]))
            .await?;

        Ok(response.into())
    }

    /// PUT /sessions/{id}
    pub async fn update_session(
        &self,
        session_id: &str,
        update: &SessionUpdate,
    ) -> Result<Session, ApiError> {
        self.execute(
            self.client
                .put(self.url(&format!("/sessions/{}", session_id)))
                .json(update),
        )
        .await
    }

    /// DELETE /sessions/{id}
    pub async fn delete_session(&self, session_id: &str) -> Result<(), ApiError> {
        let response = self
            .send(
                self.client
                    .delete(self.url(&format!("/sessions/{}", session_id))),
            )
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Voice
    // ------------------------------------------------------------------------

    /// POST /voice/transcribe
    pub async fn transcribe(
        &self,
        payload: &VoicePayload,
        language: Language,
    ) -> Result<Transcription, ApiError> {
        let form = Form::new()
            .part("file", Self::file_part(payload)?)
            .text("language", language.code());

        self.execute(
            self.client
                .post(self.url("/voice/transcribe"))
                .multipart(form),
        )
        .await
    }

    fn file_part(payload: &VoicePayload) -> Result<Part, ApiError> {
        let part = Part::bytes(payload.data().to_vec()).file_name(payload.file_name().to_string());
        match payload.format().mime() {
            "" => Ok(part),
            mime => Ok(part.mime_str(mime)?),
        }
    }

    // ------------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------------

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        request.send().await.map_err(|e| {
            error!("API request failed: {}", e);
            ApiError::Transport(e)
        })
    }

    async fn check_status(response: Response) -> Result<String, ApiError> {
        let status = response.status();
        let url = response.url().clone();
        let body = response.text().await?;

        if !status.is_success() {
            let err = ApiError::from_response_body(status.as_u16(), &body);
            error!("API error from {}: {}", url, err);
            return Err(err);
        }

        debug!("{} -> {} ({} bytes)", url, status, body.len());
        Ok(body)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        let body = Self::check_status(response).await?;

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl ChatBackend for ApiClient {
    async fn send_message(
        &self,
        session_id: &str,
        message: &str,
        is_voice: bool,
    ) -> Result<ChatReply, ApiError> {
        let body = ChatRequest {
            session_id,
            message,
            is_voice,
        };
        self.execute(self.client.post(self.url("/chat/send")).json(&body))
            .await
    }

    async fn send_voice(
        &self,
        session_id: &str,
        payload: &VoicePayload,
        language: Language,
    ) -> Result<VoiceReply, ApiError> {
        info!(
            "Uploading voice message: {} ({} bytes, {})",
            payload.file_name(),
            payload.len(),
            payload.format()
        );

        let form = Form::new()
            .part("file", Self::file_part(payload)?)
            .text("session_id", session_id.to_string())
            .text("language", language.code());

        // The backend reads session_id and language from the query string;
        // they are repeated as form fields for form-based handlers.
        self.execute(
            self.client
                .post(self.url("/voice/send"))
                .query(&[("session_id", session_id), ("language", language.code())])
                .multipart(form),
        )
        .await
    }

    async fn get_session(&self, session_id: &str) -> Result<Session, ApiError> {
        self.execute(
            self.client
                .get(self.url(&format!("/sessions/{}", session_id))),
        )
        .await
    }

    async fn end_session(&self, session_id: &str) -> Result<Session, ApiError> {
        self.execute(
            self.client
                .put(self.url(&format!("/sessions/{}/end", session_id))),
        )
        .await
    }
}
