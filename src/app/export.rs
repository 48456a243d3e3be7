use super::prefs::Preferences;
use super::store::StoreError;
use crate::api::User;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn export_file_name(username: &str) -> String {
    format!("therapy-chat-{}-data.json", username)
}

/// Write the user's profile and local settings as pretty JSON into `dir`.
pub fn export_user_data(
    user: &User,
    prefs: &Preferences,
    dir: &Path,
    now: DateTime<Utc>,
) -> Result<PathBuf, StoreError> {
    let document = serde_json::json!({
        "user": user,
        "settings": {
            "darkMode": prefs.dark_mode(),
            "language": prefs.language(),
        },
        "exportDate": now.to_rfc3339(),
    });

    let path = dir.join(export_file_name(&user.username));
    fs::write(&path, serde_json::to_string_pretty(&document)?).map_err(|source| {
        StoreError::Io {
            path: path.clone(),
            source,
        }
    })?;

    info!("Exported data for {} to {}", user.username, path.display());
    Ok(path)
}
