use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const USER_ID_KEY: &str = "userId";
pub const DARK_MODE_KEY: &str = "darkMode";
pub const LANGUAGE_KEY: &str = "language";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access local store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Local store {path} is not a JSON object: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("Failed to serialize local data: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Flat key-value file holding the few values that survive restarts
/// (user id, theme flag, language). No schema, no versioning.
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl LocalStore {
    /// Open the store at `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let values = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => Map::new(),
            Ok(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(values)) => values,
                Ok(_) => {
                    return Err(StoreError::Corrupt {
                        path,
                        message: "expected an object".to_string(),
                    })
                }
                Err(e) => {
                    return Err(StoreError::Corrupt {
                        path,
                        message: e.to_string(),
                    })
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        info!("Local store {} ({} keys)", path.display(), values.len());
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Values are opaque strings; non-string JSON is returned rendered.
    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<(), StoreError> {
        self.values
            .insert(key.to_string(), Value::String(value.into()));
        self.persist()
    }

    pub fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.values.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let raw = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, raw).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!("Local store saved to {}", self.path.display());
        Ok(())
    }
}
