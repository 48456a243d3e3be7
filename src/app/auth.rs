use super::store::{LocalStore, StoreError, USER_ID_KEY};
use crate::api::{ApiClient, ApiError, NewUser, User, UserUpdate};
use thiserror::Error;
use tracing::{info, warn};

pub const MIN_USERNAME_LEN: usize = 3;
/// Page size of the user lookup done at login
const LOGIN_LOOKUP_LIMIT: u32 = 100;
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Username is required")]
    UsernameRequired,

    #[error("Username must be at least {} characters", MIN_USERNAME_LEN)]
    UsernameTooShort,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The signed-in user. Login is a username lookup, not a credential check.
#[derive(Debug, Default)]
pub struct AuthState {
    current_user: Option<User>,
    last_error: Option<String>,
}

impl AuthState {
    /// Restore the user remembered in the store. A stale id is forgotten.
    pub async fn init(api: &ApiClient, store: &mut LocalStore) -> Result<Self, AuthError> {
        let mut state = Self::default();

        let Some(user_id) = store.get(USER_ID_KEY) else {
            return Ok(state);
        };

        match api.get_user(&user_id).await {
            Ok(user) => {
                info!("Restored user {} ({})", user.username, user.id);
                state.current_user = Some(user);
            }
            Err(e) => {
                warn!("Could not restore user {}: {}", user_id, e);
                store.remove(USER_ID_KEY)?;
                state.last_error = Some(SESSION_EXPIRED_MESSAGE.to_string());
            }
        }

        Ok(state)
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn require_user(&self) -> Result<&User, AuthError> {
        self.current_user.as_ref().ok_or(AuthError::NotLoggedIn)
    }

    /// Notice left by the last failed operation
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub async fn register(
        &mut self,
        api: &ApiClient,
        store: &mut LocalStore,
        new_user: &NewUser,
    ) -> Result<&User, AuthError> {
        validate_username(&new_user.username)?;

        let user = self.record(api.create_user(new_user).await)?;
        store.set(USER_ID_KEY, user.id.clone())?;
        info!("Registered user {} ({})", user.username, user.id);

        self.last_error = None;
        Ok(self.current_user.insert(user))
    }

    pub async fn login(
        &mut self,
        api: &ApiClient,
        store: &mut LocalStore,
        username: &str,
    ) -> Result<&User, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::UsernameRequired);
        }

        let users = self.record(api.list_users(0, LOGIN_LOOKUP_LIMIT).await)?;
        let Some(user) = users.into_iter().find(|user| user.username == username) else {
            let err = AuthError::UserNotFound(username.to_string());
            self.last_error = Some(err.to_string());
            return Err(err);
        };

        store.set(USER_ID_KEY, user.id.clone())?;
        info!("Logged in as {} ({})", user.username, user.id);

        self.last_error = None;
        Ok(self.current_user.insert(user))
    }

    pub fn logout(&mut self, store: &mut LocalStore) -> Result<(), AuthError> {
        store.remove(USER_ID_KEY)?;
        if let Some(user) = self.current_user.take() {
            info!("Logged out {}", user.username);
        }
        Ok(())
    }

    pub async fn update_settings(
        &mut self,
        api: &ApiClient,
        update: &UserUpdate,
    ) -> Result<&User, AuthError> {
        let user_id = self.require_user()?.id.clone();
        let user = self.record(api.update_user(&user_id, update).await)?;
        Ok(self.current_user.insert(user))
    }

    fn record<T>(&mut self, result: Result<T, ApiError>) -> Result<T, AuthError> {
        result.map_err(|e| {
            self.last_error = Some(e.to_string());
            AuthError::Api(e)
        })
    }
}

pub fn validate_username(username: &str) -> Result<(), AuthError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AuthError::UsernameRequired);
    }
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AuthError::UsernameTooShort);
    }
    Ok(())
}
