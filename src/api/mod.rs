//! REST client for the therapy backend
//!
//! All calls go to a configurable base URL (default `http://localhost:8000/api/v1`):
//! - /users - create, fetch, update and list users
//! - /sessions - create, list, fetch, update, end and delete sessions
//! - /chat/send - text turn
//! - /voice/send, /voice/transcribe - recorded audio upload

mod backend;
mod client;
mod error;
mod models;

pub use backend::ChatBackend;
pub use client::ApiClient;
pub use error::{ApiError, GENERIC_ERROR_MESSAGE};
pub use models::{
    ChatReply, ChatRequest, NewSessionRequest, NewUser, RemoteMessage, Session, SessionPage,
    SessionUpdate, Transcription, User, UserUpdate, VoiceReply,
};
