//! Conversation timeline of one therapy session
//!
//! This module provides:
//! - `ConversationTimeline`: ordered turns, single-flight text/voice sends, session end
//! - `ChatController`: wires voice capture and file uploads into the timeline
//! - `CrisisAlert`: the one active crisis signal surfaced from replies
//! - `TherapyApproach` / `Language`: session style and interface language

mod approach;
mod controller;
mod crisis;
mod error;
mod message;
mod timeline;

pub use approach::{default_session_title, Language, TherapyApproach};
pub use controller::ChatController;
pub use crisis::{CrisisAlert, CrisisSignal};
pub use error::ChatError;
pub use message::{Message, MessageId, Role};
pub use timeline::{ConversationTimeline, Exchange};
