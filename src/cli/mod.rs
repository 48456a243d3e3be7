//! Terminal front-end

mod chat;
mod commands;

pub use chat::{parse_input, ChatInput};

use crate::config::DEFAULT_CONFIG_PATH;
use crate::session::{Language, TherapyApproach};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::run;

#[derive(Parser, Debug)]
#[command(name = "therapy-chat")]
#[command(about = "Terminal client for the AI therapy chat service")]
pub struct Cli {
    /// Configuration file (without extension)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Override the backend base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account and sign in
    Register {
        username: String,
        #[arg(long, value_enum, default_value_t = Language::Tr)]
        language: Language,
        #[arg(long, value_enum, default_value_t = TherapyApproach::Cbt)]
        approach: TherapyApproach,
        /// Enable voice messages
        #[arg(long)]
        voice: bool,
        #[arg(long)]
        dark_mode: bool,
    },
    /// Sign in with an existing username
    Login { username: String },
    /// Forget the signed-in user
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Update profile settings stored on the server
    Profile {
        #[arg(long, value_enum)]
        language: Option<Language>,
        #[arg(long, value_enum)]
        approach: Option<TherapyApproach>,
        #[arg(long)]
        voice: Option<bool>,
        #[arg(long)]
        dark_mode: Option<bool>,
    },
    /// Local settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    /// Manage therapy sessions
    Sessions {
        #[command(subcommand)]
        command: SessionsCommand,
    },
    /// Open the chat view of a session
    Chat { session_id: String },
    /// List the available therapy approaches
    Approaches,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    Show,
    /// Switch between light and dark theme
    ToggleTheme,
    Language {
        #[arg(value_enum)]
        language: Language,
    },
    /// Write profile and settings to a JSON file
    Export {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum SessionsCommand {
    List {
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Start a new session; without a title one is generated
    New {
        #[arg(long)]
        title: Option<String>,
        /// Defaults to the profile's preferred approach
        #[arg(long, value_enum)]
        approach: Option<TherapyApproach>,
    },
    Show { session_id: String },
    End { session_id: String },
    Delete { session_id: String },
}
