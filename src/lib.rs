pub mod api;
pub mod app;
pub mod audio;
pub mod cli;
pub mod config;
pub mod session;

pub use api::{ApiClient, ApiError, ChatBackend};
pub use app::{AppContext, AuthState, LocalStore, Preferences};
pub use audio::{AudioFile, AudioFormat, AudioRecorder, CaptureError, VoiceCapture, VoicePayload};
pub use config::Config;
pub use session::{
    ChatController, ChatError, ConversationTimeline, CrisisSignal, Language, Message,
    TherapyApproach,
};
