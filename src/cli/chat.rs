use super::commands::local_time;
use crate::api::ChatBackend;
use crate::app::AppContext;
use crate::audio::VoiceCapture;
use crate::config::Config;
use crate::session::{
    ChatController, ChatError, ConversationTimeline, CrisisSignal, Exchange, Language, Message,
    Role,
};
use anyhow::Result;
use chrono::Local;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

/// One line typed into the chat view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Text(String),
    Record,
    Stop,
    Upload(PathBuf),
    Dismiss,
    End,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_input(line: &str) -> ChatInput {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ChatInput::Empty;
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return ChatInput::Text(line.trim_end_matches(['\r', '\n']).to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match name {
        "record" | "rec" => ChatInput::Record,
        "stop" => ChatInput::Stop,
        "upload" if !arg.is_empty() => ChatInput::Upload(PathBuf::from(arg)),
        "dismiss" => ChatInput::Dismiss,
        "end" => ChatInput::End,
        "help" | "?" => ChatInput::Help,
        "quit" | "exit" | "q" => ChatInput::Quit,
        _ => ChatInput::Unknown(trimmed.to_string()),
    }
}

/// Which path produced a send outcome; only text sends leave an entry
/// behind when they fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SendKind {
    Text,
    Voice,
}

pub(super) async fn run_chat(ctx: &mut AppContext, session_id: &str) -> Result<()> {
    let user = ctx.auth.require_user()?.clone();
    let language = ctx.prefs.language();
    let backend: Arc<dyn ChatBackend> = Arc::new(ctx.api.clone());

    let timeline = Arc::new(ConversationTimeline::load(backend, session_id, language).await?);
    let session = timeline.session().await;

    println!(
        "== {} [{}]",
        session.title,
        session.therapy_approach.label(language)
    );
    let history = timeline.messages().await;
    if history.is_empty() {
        println!("Start the conversation by typing a message.");
    }
    for message in &history {
        print_message(message, false);
    }

    let capture = if user.voice_enabled {
        build_capture(&ctx.config)
    } else {
        None
    };
    let voice_enabled = user.voice_enabled;
    let mut controller = ChatController::new(timeline.clone(), capture);

    print_help(voice_enabled);
    if let Some(ended) = session.ended_at {
        println!("This session was completed on {}.", local_time(ended));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(controller.is_recording());
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            ChatInput::Empty => {}
            ChatInput::Text(text) => {
                let outcome = controller.send_text(&text).await;
                report(&timeline, outcome, SendKind::Text).await;
            }
            ChatInput::Record => match controller.start_recording().await {
                Ok(()) => println!("* Recording... type /stop to send"),
                Err(e) => notice(&e, language),
            },
            ChatInput::Stop => {
                if let Some(line) = stop_status_line(controller.is_recording()) {
                    println!("{}", line);
                }
                let outcome = controller.stop_recording().await;
                report(&timeline, outcome, SendKind::Voice).await;
            }
            ChatInput::Upload(path) => {
                if !voice_enabled {
                    notice(&ChatError::VoiceDisabled, language);
                    continue;
                }
                let outcome = controller.upload_audio(&path).await;
                report(&timeline, outcome, SendKind::Voice).await;
            }
            ChatInput::Dismiss => {
                if timeline.dismiss_crisis().await.is_none() {
                    println!("* Nothing to dismiss");
                }
            }
            ChatInput::End => {
                if !confirm(&mut lines, "End this session?").await? {
                    continue;
                }
                match timeline.end_session().await {
                    Ok(session) => {
                        if let Some(ended) = session.ended_at {
                            println!("This session was completed on {}.", local_time(ended));
                        }
                    }
                    Err(e) => notice(&e, language),
                }
            }
            ChatInput::Help => print_help(voice_enabled),
            ChatInput::Quit => break,
            ChatInput::Unknown(command) => println!("! Unknown command: {}", command),
        }
    }

    if controller.is_recording() {
        warn!("Leaving chat with an unsent recording");
    }
    Ok(())
}

#[cfg(feature = "microphone")]
fn build_capture(config: &Config) -> Option<VoiceCapture> {
    use crate::audio::{MicrophoneSource, PcmRecorder, RecorderConfig};

    let recorder = PcmRecorder::new(
        MicrophoneSource::new(),
        RecorderConfig {
            target_sample_rate: config.voice.sample_rate,
            target_channels: config.voice.channels,
            ..RecorderConfig::default()
        },
    );
    Some(VoiceCapture::new(Box::new(recorder)))
}

#[cfg(not(feature = "microphone"))]
fn build_capture(_config: &Config) -> Option<VoiceCapture> {
    warn!("Built without the `microphone` feature; only /upload is available");
    None
}

async fn report(
    timeline: &ConversationTimeline,
    outcome: Result<Exchange, ChatError>,
    kind: SendKind,
) {
    match outcome {
        Ok(exchange) => {
            if exchange.user.is_voice {
                print_message(&exchange.user, false);
            }
            print_message(&exchange.assistant, false);
            if let Some(signal) = &exchange.crisis {
                print_crisis(signal);
            }
        }
        Err(e) => {
            notice(&e, timeline.language());
            if let Some(entry) = undelivered_entry(timeline, kind).await {
                print_message(&entry, true);
            }
        }
    }
}

/// The optimistic user entry a failed text send left at the end of the timeline
async fn undelivered_entry(timeline: &ConversationTimeline, kind: SendKind) -> Option<Message> {
    if kind != SendKind::Text {
        return None;
    }
    let last = timeline.messages().await.pop()?;
    if last.role == Role::User && timeline.is_failed(last.id).await {
        Some(last)
    } else {
        None
    }
}

fn stop_status_line(recording: bool) -> Option<&'static str> {
    recording.then_some("* Sending voice message...")
}

fn print_message(message: &Message, failed: bool) {
    let who = match message.role {
        Role::User => "you",
        Role::Assistant => "therapist",
    };
    let voice = if message.is_voice { " (voice)" } else { "" };
    let failed = if failed { "  [not delivered]" } else { "" };
    println!(
        "[{}] {}{}: {}{}",
        message.created_at.with_timezone(&Local).format("%H:%M"),
        who,
        voice,
        message.content,
        failed
    );
}

fn print_crisis(signal: &CrisisSignal) {
    println!("!! It sounds like you may be going through a very hard time.");
    println!("!! Please reach out for immediate support:");
    for (label, value) in signal.contacts() {
        println!("!!   {}: {}", label, value);
    }
    println!("!! (/dismiss to hide)");
}

fn notice(error: &ChatError, language: Language) {
    match error {
        ChatError::Api(api) => println!("! {}", api.user_message(language)),
        other => println!("! {}", other),
    }
}

fn prompt(recording: bool) {
    if recording {
        print!("(recording) > ");
    } else {
        print!("> ");
    }
    let _ = std::io::stdout().flush();
}

fn print_help(voice_enabled: bool) {
    println!("Type a message and press enter to send.");
    if voice_enabled {
        println!("  /record, /stop   record and send a voice message");
        println!("  /upload <file>   send an audio file");
    }
    println!("  /dismiss         hide the crisis notice");
    println!("  /end             end this session");
    println!("  /quit            leave the chat");
}

async fn confirm<R>(lines: &mut tokio::io::Lines<R>, question: &str) -> Result<bool>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    print!("{} [y/N] ", question);
    let _ = std::io::stdout().flush();
    let answer = lines.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes" | "e" | "evet"))
}
