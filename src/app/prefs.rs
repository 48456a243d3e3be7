use super::store::{LocalStore, StoreError, DARK_MODE_KEY, LANGUAGE_KEY};
use crate::session::Language;
use tracing::{info, warn};

/// Theme and language, restored from and written back to the local store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preferences {
    dark_mode: bool,
    language: Language,
}

impl Preferences {
    /// Missing or unreadable values fall back to light theme and Turkish.
    pub fn load(store: &LocalStore) -> Self {
        let dark_mode = store.get(DARK_MODE_KEY).as_deref() == Some("true");
        let language = match store.get(LANGUAGE_KEY) {
            Some(code) => code.parse().unwrap_or_else(|e| {
                warn!("Ignoring stored language: {}", e);
                Language::default()
            }),
            None => Language::default(),
        };

        Self {
            dark_mode,
            language,
        }
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn toggle_theme(&mut self, store: &mut LocalStore) -> Result<bool, StoreError> {
        self.set_dark_mode(store, !self.dark_mode)?;
        Ok(self.dark_mode)
    }

    pub fn set_dark_mode(&mut self, store: &mut LocalStore, dark_mode: bool) -> Result<(), StoreError> {
        self.dark_mode = dark_mode;
        store.set(DARK_MODE_KEY, dark_mode.to_string())?;
        info!("Theme set to {}", if dark_mode { "dark" } else { "light" });
        Ok(())
    }

    pub fn change_language(&mut self, store: &mut LocalStore, language: Language) -> Result<(), StoreError> {
        self.language = language;
        store.set(LANGUAGE_KEY, language.code())?;
        info!("Language set to {}", language);
        Ok(())
    }
}
