use super::chat::run_chat;
use super::{Command, SessionsCommand, SettingsCommand};
use crate::api::{ChatBackend, NewSessionRequest, NewUser, Session, UserUpdate};
use crate::app::{export_user_data, AppContext};
use crate::session::{Language, TherapyApproach};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, Utc};

pub async fn run(ctx: &mut AppContext, command: Command) -> Result<()> {
    if let Some(notice) = ctx.auth.last_error() {
        println!("! {}", notice);
    }

    match command {
        Command::Register {
            username,
            language,
            approach,
            voice,
            dark_mode,
        } => {
            let new_user = NewUser {
                username,
                language,
                preferred_therapy_approach: approach,
                voice_enabled: voice,
                dark_mode,
            };
            let user = ctx
                .auth
                .register(&ctx.api, &mut ctx.store, &new_user)
                .await?;
            println!("Welcome, {}!", user.username);
        }
        Command::Login { username } => {
            let user = ctx.auth.login(&ctx.api, &mut ctx.store, &username).await?;
            println!("Signed in as {}", user.username);
        }
        Command::Logout => {
            ctx.auth.logout(&mut ctx.store)?;
            println!("Signed out");
        }
        Command::Whoami => match ctx.auth.current_user() {
            Some(user) => {
                let language = ctx.prefs.language();
                println!("{} (id {})", user.username, user.id);
                println!("  language:  {}", user.language);
                println!(
                    "  approach:  {}",
                    user.preferred_therapy_approach.label(language)
                );
                println!("  voice:     {}", on_off(user.voice_enabled));
                println!("  dark mode: {}", on_off(user.dark_mode));
            }
            None => println!("Not signed in"),
        },
        Command::Profile {
            language,
            approach,
            voice,
            dark_mode,
        } => {
            let update = UserUpdate {
                language,
                preferred_therapy_approach: approach,
                voice_enabled: voice,
                dark_mode,
            };
            if update.is_empty() {
                bail!("Nothing to update");
            }

            // Local preferences follow the profile
            if let Some(dark_mode) = dark_mode {
                ctx.prefs.set_dark_mode(&mut ctx.store, dark_mode)?;
            }
            if let Some(language) = language {
                ctx.prefs.change_language(&mut ctx.store, language)?;
            }

            ctx.auth.update_settings(&ctx.api, &update).await?;
            println!("Profile updated");
        }
        Command::Settings { command } => run_settings(ctx, command)?,
        Command::Sessions { command } => run_sessions(ctx, command).await?,
        Command::Chat { session_id } => run_chat(ctx, &session_id).await?,
        Command::Approaches => {
            let language = ctx.prefs.language();
            for approach in TherapyApproach::ALL {
                println!("{:<18} {}", approach.as_str(), approach.label(language));
            }
        }
    }

    Ok(())
}

fn run_settings(ctx: &mut AppContext, command: SettingsCommand) -> Result<()> {
    match command {
        SettingsCommand::Show => {
            println!(
                "theme:    {}",
                if ctx.prefs.dark_mode() { "dark" } else { "light" }
            );
            println!("language: {}", ctx.prefs.language());
            println!("api:      {}", ctx.api.base_url());
            println!("store:    {}", ctx.store.path().display());
        }
        SettingsCommand::ToggleTheme => {
            let dark = ctx.prefs.toggle_theme(&mut ctx.store)?;
            println!("Theme: {}", if dark { "dark" } else { "light" });
        }
        SettingsCommand::Language { language } => {
            ctx.prefs.change_language(&mut ctx.store, language)?;
            println!("Language: {}", language);
        }
        SettingsCommand::Export { dir } => {
            let user = ctx.auth.require_user()?;
            let path = export_user_data(user, &ctx.prefs, &dir, Utc::now())?;
            println!("Data exported to {}", path.display());
        }
    }
    Ok(())
}

async fn run_sessions(ctx: &mut AppContext, command: SessionsCommand) -> Result<()> {
    let language = ctx.prefs.language();

    match command {
        SessionsCommand::List { skip, limit } => {
            let user = ctx.auth.require_user()?;
            let page = ctx.api.list_sessions(&user.id, skip, limit).await?;
            if page.sessions.is_empty() {
                println!("No sessions yet");
            }
            for session in &page.sessions {
                print_session_line(session, language);
            }
            if let Some(total) = page.total {
                println!("({} of {} sessions)", page.sessions.len(), total);
            }
        }
        SessionsCommand::New { title, approach } => {
            let user = ctx.auth.require_user()?;
            let approach = approach.unwrap_or(user.preferred_therapy_approach);
            let request = NewSessionRequest::new(user.id.clone(), title, approach)
                .with_default_title(language, Local::now().naive_local());

            let session = ctx.api.create_session(&request).await?;
            println!("Session created: {} ({})", session.title, session.id);
        }
        SessionsCommand::Show { session_id } => {
            let session = ctx.api.get_session(&session_id).await?;
            print_session_line(&session, language);
            println!("{} messages", session.messages.len());
        }
        SessionsCommand::End { session_id } => {
            let session = ctx.api.get_session(&session_id).await?;
            if session.is_ended() {
                bail!("Session {} is already ended", session_id);
            }
            let session = ctx.api.end_session(&session_id).await?;
            println!("Session ended: {}", session.title);
        }
        SessionsCommand::Delete { session_id } => {
            ctx.api
                .delete_session(&session_id)
                .await
                .with_context(|| format!("Failed to delete session {}", session_id))?;
            println!("Session {} deleted", session_id);
        }
    }

    Ok(())
}

fn print_session_line(session: &Session, language: Language) {
    let status = match session.ended_at {
        Some(ended) => format!("ended {}", local_time(ended)),
        None => "open".to_string(),
    };
    println!(
        "{:<10} {}  [{}]  {}  ({})",
        session.id,
        session.title,
        session.therapy_approach.label(language),
        session.created_at.map(local_time).unwrap_or_default(),
        status
    );
}

pub(super) fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%d.%m.%Y %H:%M").to_string()
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}
