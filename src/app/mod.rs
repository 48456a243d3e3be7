//! Application state
//!
//! Explicit, caller-owned replacements for the ambient contexts of a web
//! client: the local store, the signed-in user and the preferences. An
//! `AppContext` is built once at startup and passed by reference.

mod auth;
mod export;
mod prefs;
mod store;

pub use auth::{validate_username, AuthError, AuthState, MIN_USERNAME_LEN, SESSION_EXPIRED_MESSAGE};
pub use export::{export_file_name, export_user_data};
pub use prefs::Preferences;
pub use store::{LocalStore, StoreError, DARK_MODE_KEY, LANGUAGE_KEY, USER_ID_KEY};

use crate::api::ApiClient;
use crate::config::Config;
use anyhow::{Context, Result};

pub struct AppContext {
    pub config: Config,
    pub api: ApiClient,
    pub store: LocalStore,
    pub auth: AuthState,
    pub prefs: Preferences,
}

impl AppContext {
    pub async fn init(config: Config) -> Result<Self> {
        let api = ApiClient::from_config(&config.api).context("Failed to build API client")?;
        let mut store = LocalStore::open(config.storage.resolved_path())
            .context("Failed to open local store")?;
        let prefs = Preferences::load(&store);
        let auth = AuthState::init(&api, &mut store)
            .await
            .context("Failed to restore user")?;

        Ok(Self {
            config,
            api,
            store,
            auth,
            prefs,
        })
    }
}
